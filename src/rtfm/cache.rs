use super::inventory::{parse_object_inv, Inventory};
use super::source::{InventorySource, Notifier};
use super::DocumentationSet;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Inventories for every documentation set that built successfully.
pub type LookupTable = HashMap<&'static str, Inventory>;

/// Process-wide RTFM lookup table, built lazily for all sets at once.
///
/// The table is either absent or complete; readers get an `Arc` snapshot so a
/// rebuild never exposes a half-filled table.
pub struct LookupCache {
    sets: &'static [DocumentationSet],
    source: Arc<dyn InventorySource>,
    notifier: Arc<dyn Notifier>,
    table: RwLock<Option<Arc<LookupTable>>>,
    build_lock: Mutex<()>,
}

impl LookupCache {
    pub fn new(
        sets: &'static [DocumentationSet],
        source: Arc<dyn InventorySource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sets,
            source,
            notifier,
            table: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    pub async fn is_built(&self) -> bool {
        self.table.read().await.is_some()
    }

    /// Returns the table, building it first if absent. Concurrent callers
    /// during the first build wait for the single in-flight build.
    pub async fn get_or_build(&self) -> Arc<LookupTable> {
        if let Some(table) = self.table.read().await.as_ref() {
            return table.clone();
        }

        let _guard = self.build_lock.lock().await;
        if let Some(table) = self.table.read().await.as_ref() {
            return table.clone();
        }

        let table = Arc::new(self.build().await);
        *self.table.write().await = Some(table.clone());
        table
    }

    /// Drops the table; the next lookup rebuilds every set.
    pub async fn invalidate(&self) {
        let _guard = self.build_lock.lock().await;
        *self.table.write().await = None;
        info!("RTFM: lookup table invalidated");
    }

    async fn build(&self) -> LookupTable {
        let mut table = LookupTable::new();

        for set in self.sets {
            let buffer = match self.source.fetch(set.base_url).await {
                Ok(buffer) => buffer,
                Err(e) => {
                    warn!("RTFM: fetch for '{}' failed: {}", set.key, e);
                    self.notifier
                        .notify(&format!(
                            "Could not create RTFM lookup table for {}",
                            set.base_url
                        ))
                        .await;
                    continue;
                }
            };

            match parse_object_inv(&buffer, set.base_url) {
                Ok(inventory) => {
                    info!(
                        "RTFM: indexed {} entries for '{}'",
                        inventory.len(),
                        set.key
                    );
                    table.insert(set.key, inventory);
                }
                Err(e) => {
                    warn!("RTFM: inventory for '{}' is invalid: {}", set.key, e);
                    self.notifier
                        .notify(&format!(
                            "Invalid objects.inv for {}: {}",
                            set.base_url, e
                        ))
                        .await;
                }
            }
        }

        table
    }
}
