pub mod inviter;
pub mod qr;
