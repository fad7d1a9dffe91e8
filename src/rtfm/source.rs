use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("timed out fetching {0}")]
    Timeout(String),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Where raw `objects.inv` bytes come from.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch(&self, base_url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpInventorySource {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpInventorySource {
    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl InventorySource for HttpInventorySource {
    async fn fetch(&self, base_url: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/objects.inv", base_url.trim_end_matches('/'));
        debug!("RTFM: fetching {}", url);

        let transport = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout(url.clone())
            } else {
                FetchError::Transport {
                    url: url.clone(),
                    source,
                }
            }
        };

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

/// Operator-facing alerts about documentation sets that failed to build.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}

/// Posts alerts into a Discord channel as a code block.
pub struct ChannelNotifier {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl ChannelNotifier {
    pub fn new(http: Arc<serenity::Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: serenity::ChannelId::new(channel_id),
        }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, text: &str) {
        let content = format!("```py\n{}\n```", text);
        if let Err(e) = self.channel_id.say(&self.http, content).await {
            warn!("Failed to deliver operator notification to {}: {}", self.channel_id, e);
        }
    }
}

/// Fallback when no log channel is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        info!("Operator notice: {}", text);
    }
}
