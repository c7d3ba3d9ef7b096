use thiserror::Error;

/// Top-level error type for leetbot.
#[derive(Debug, Error)]
pub enum LeetbotError {
    /// The task is in neither storage tier.
    #[error("no such task")]
    NoSuchTask,

    /// The user has never been stored.
    #[error("no such user")]
    NoSuchUser,

    /// Subscribe was a no-op: the user is already subscribed at that hour.
    #[error("the user is already subscribed for receiving daily tasks at the same time, nothing to do")]
    AlreadySubscribed,

    /// Unsubscribe was a no-op: the user is not subscribed.
    #[error("already unsubscribed, nothing to do")]
    AlreadyUnsubscribed,

    /// User operations need the durable store; there is nowhere else users live.
    #[error("users storage isn't configured")]
    NoUserStorage,

    /// Sending hour outside `0..=23`.
    #[error("invalid sending hour {0}, expected 0..=23")]
    InvalidHour(u8),

    /// The execution context was cancelled or ran past its deadline.
    #[error("context closed during execution")]
    Cancelled,

    /// Error from the durable store.
    #[error("storage error: {0}")]
    Storage(String),

    /// Error from the fast cache.
    #[error("cache error: {0}")]
    Cache(String),

    /// Error from the external task provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from the delivery transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport answered with a client or server error status.
    #[error("delivery rejected with status {0}")]
    DeliveryStatus(u16),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LeetbotError {
    /// Task or user absent. Expected, not an anomaly.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchTask | Self::NoSuchUser)
    }

    /// Subscribe/unsubscribe had nothing to do.
    pub fn is_already_in_state(&self) -> bool {
        matches!(self, Self::AlreadySubscribed | Self::AlreadyUnsubscribed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
