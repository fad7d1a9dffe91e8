pub mod commands;
pub mod config;
pub mod db;
pub mod events;
pub mod ratelimit;
pub mod rtfm;
pub mod services;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub db: db::Database,
    pub rtfm: std::sync::Arc<rtfm::Rtfm>,
    pub qr: services::qr::QrClient,
    /// `decode-qr-code`: 2 uses per 30 seconds per user
    pub qr_limiter: ratelimit::RateLimiter,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
