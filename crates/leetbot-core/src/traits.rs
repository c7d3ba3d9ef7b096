use crate::{
    context::Context,
    error::LeetbotError,
    message::OutgoingMessage,
    model::{DayKey, Task, User},
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Task keeper: anything that can hold daily tasks.
///
/// Both the fast cache and the durable store implement this. A missing
/// task is reported as [`LeetbotError::NoSuchTask`], never as an empty task.
#[async_trait]
pub trait TaskKeeper: Send + Sync {
    /// Human-readable backend name, for logs.
    fn name(&self) -> &str;

    async fn get_task(&self, ctx: &Context, day_key: DayKey) -> Result<Task, LeetbotError>;

    /// Store `task`, replacing any previous record for its day key.
    async fn save_task(&self, ctx: &Context, task: &Task) -> Result<(), LeetbotError>;
}

/// User keeper: the only home of user records.
#[async_trait]
pub trait UserKeeper: Send + Sync {
    /// [`LeetbotError::NoSuchUser`] if the id was never stored.
    async fn get_user(&self, ctx: &Context, id: i64) -> Result<User, LeetbotError>;

    /// Insert or fully replace a user.
    async fn save_user(&self, ctx: &Context, user: &User) -> Result<(), LeetbotError>;

    async fn set_subscribed(&self, ctx: &Context, id: i64, hour: u8) -> Result<(), LeetbotError>;

    /// Flip `subscribed` off. The sending hour is left as it was.
    async fn set_unsubscribed(&self, ctx: &Context, id: i64) -> Result<(), LeetbotError>;

    /// Users subscribed at `hour`. Empty when nobody is.
    async fn list_subscribed(&self, ctx: &Context, hour: u8) -> Result<Vec<User>, LeetbotError>;
}

/// External source of truth for daily tasks.
#[async_trait]
pub trait TaskProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the canonical task for `date`.
    async fn fetch_daily_task(&self, ctx: &Context, date: NaiveDate)
        -> Result<Task, LeetbotError>;
}

/// Delivery transport: sends one message to one recipient.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Send `message` and return the platform's status code.
    ///
    /// `Err` means the call itself failed; a status `>= 400` is returned as
    /// `Ok` and judged by the caller.
    async fn send(&self, ctx: &Context, message: &OutgoingMessage) -> Result<u16, LeetbotError>;
}
