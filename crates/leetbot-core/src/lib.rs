//! # leetbot-core
//!
//! Core types, traits, configuration, and error handling for leetbot.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod model;
pub mod sanitize;
pub mod traits;

pub use config::shellexpand;
