use crate::db::{Database, InviterRecord};

/// Async facade over the inviter and whitelist tables.
pub struct InviterService {
    db: Database,
}

impl InviterService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn set_inviter(
        &self,
        guild_id: u64,
        category_id: u64,
        text_channel_id: u64,
    ) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        let category_id = category_id.to_string();
        let text_channel_id = text_channel_id.to_string();
        self.db
            .run_blocking(move |db| db.set_inviter(&guild_id, &category_id, &text_channel_id))
            .await
    }

    pub async fn unset_inviter(&self, guild_id: u64) -> anyhow::Result<usize> {
        let guild_id = guild_id.to_string();
        self.db
            .run_blocking(move |db| db.unset_inviter(&guild_id))
            .await
    }

    pub async fn get_inviter(&self, guild_id: u64) -> anyhow::Result<Option<InviterRecord>> {
        let guild_id = guild_id.to_string();
        self.db
            .run_blocking(move |db| db.get_inviter(&guild_id))
            .await
    }

    /// Returns the text channel for invites when `category_id` is the
    /// guild's watched category.
    pub async fn invite_channel_for(
        &self,
        guild_id: u64,
        category_id: Option<u64>,
    ) -> anyhow::Result<Option<u64>> {
        let Some(category_id) = category_id else {
            return Ok(None);
        };
        let Some(record) = self.get_inviter(guild_id).await? else {
            return Ok(None);
        };
        if record.category_id != category_id.to_string() {
            return Ok(None);
        }
        Ok(record.text_channel_id.parse().ok())
    }

    pub async fn record_invite(&self, channel_id: u64, message_id: u64) -> anyhow::Result<()> {
        let channel_id = channel_id.to_string();
        let message_id = message_id.to_string();
        self.db
            .run_blocking(move |db| db.save_voice_invite(&channel_id, &message_id))
            .await
    }

    /// Removes and returns the invite message recorded for a voice channel.
    pub async fn take_invite(&self, channel_id: u64) -> anyhow::Result<Option<u64>> {
        let channel_id = channel_id.to_string();
        self.db
            .run_blocking(move |db| {
                let message_id = db.get_voice_invite(&channel_id)?;
                db.delete_voice_invite(&channel_id)?;
                Ok(message_id.and_then(|id| id.parse().ok()))
            })
            .await
    }

    pub async fn is_whitelisted(&self, user_id: u64) -> anyhow::Result<bool> {
        let user_id = user_id.to_string();
        self.db
            .run_blocking(move |db| db.is_whitelisted(&user_id))
            .await
    }

    pub async fn whitelist(&self, user_id: u64) -> anyhow::Result<()> {
        let user_id = user_id.to_string();
        self.db
            .run_blocking(move |db| db.add_to_whitelist(&user_id))
            .await
    }

    pub async fn unwhitelist(&self, user_id: u64) -> anyhow::Result<usize> {
        let user_id = user_id.to_string();
        self.db
            .run_blocking(move |db| db.remove_from_whitelist(&user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InviterService {
        let db = Database::open(":memory:").unwrap();
        db.execute_init().unwrap();
        InviterService::new(db)
    }

    #[test]
    fn invite_channel_only_for_watched_category() {
        let service = service();
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(service.set_inviter(1, 10, 100)).unwrap();

        assert_eq!(rt.block_on(service.invite_channel_for(1, Some(10))).unwrap(), Some(100));
        assert_eq!(rt.block_on(service.invite_channel_for(1, Some(11))).unwrap(), None);
        assert_eq!(rt.block_on(service.invite_channel_for(1, None)).unwrap(), None);
        assert_eq!(rt.block_on(service.invite_channel_for(2, Some(10))).unwrap(), None);
    }

    #[test]
    fn take_invite_forgets_record() {
        let service = service();
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(service.record_invite(5, 55)).unwrap();
        assert_eq!(rt.block_on(service.take_invite(5)).unwrap(), Some(55));
        assert_eq!(rt.block_on(service.take_invite(5)).unwrap(), None);
    }

    #[test]
    fn whitelist_round_trip() {
        let service = service();
        let rt = tokio::runtime::Runtime::new().unwrap();

        assert!(!rt.block_on(service.is_whitelisted(42)).unwrap());
        rt.block_on(service.whitelist(42)).unwrap();
        assert!(rt.block_on(service.is_whitelisted(42)).unwrap());
        assert_eq!(rt.block_on(service.unwhitelist(42)).unwrap(), 1);
        assert!(!rt.block_on(service.is_whitelisted(42)).unwrap());
    }
}
