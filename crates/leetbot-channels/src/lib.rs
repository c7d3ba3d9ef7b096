//! # leetbot-channels
//!
//! Delivery transports for leetbot.

pub mod telegram;

pub use telegram::TelegramTransport;
