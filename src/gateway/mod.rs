//! Gateway: connects storage, the task provider, and the delivery transport.
//!
//! Hosts the two pipelines everything else is built on: resolving today's
//! task (storage first, provider as fallback) and the hourly fan-out that
//! delivers it to subscribers.

mod fanout;
mod resolve;
mod scheduler;


pub use resolve::Origin;

use leetbot_core::{
    clock::Clock,
    context::Context,
    error::LeetbotError,
    model::{DayKey, Difficulty, User},
    traits::{TaskProvider, Transport},
};
use leetbot_storage::StorageController;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for one hourly sweep.
const DEFAULT_SWEEP_TIMEOUT: Duration = Duration::from_secs(300);

/// The central gateway shared by the interactive and scheduled paths.
pub struct Gateway {
    pub(super) storage: Arc<StorageController>,
    pub(super) provider: Arc<dyn TaskProvider>,
    /// Only the fan-out needs a transport; lookups and subscriptions work without one.
    pub(super) transport: Option<Arc<dyn Transport>>,
    pub(super) clock: Arc<dyn Clock>,
    /// Markup dialect of delivered task text (e.g. "HTML").
    pub(super) parse_mode: Option<String>,
    pub(super) sweep_timeout: Duration,
}

impl Gateway {
    /// Create a new gateway without a delivery transport.
    pub fn new(
        storage: Arc<StorageController>,
        provider: Arc<dyn TaskProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            provider,
            transport: None,
            clock,
            parse_mode: None,
            sweep_timeout: DEFAULT_SWEEP_TIMEOUT,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_parse_mode(mut self, parse_mode: impl Into<String>) -> Self {
        let parse_mode = parse_mode.into();
        self.parse_mode = (!parse_mode.is_empty()).then_some(parse_mode);
        self
    }

    pub fn with_sweep_timeout(mut self, timeout: Duration) -> Self {
        self.sweep_timeout = timeout;
        self
    }

    /// Subscribe `user` for daily delivery at `hour` UTC.
    pub async fn subscribe(&self, ctx: &Context, user: &User, hour: u8) -> Result<(), LeetbotError> {
        self.storage.subscribe_user(ctx, user, hour).await
    }

    pub async fn unsubscribe(&self, ctx: &Context, user_id: i64) -> Result<(), LeetbotError> {
        self.storage.unsubscribe_user(ctx, user_id).await
    }

    /// Hint `index` (zero-based) of the stored task for `day_key`.
    ///
    /// Storage only: a lookup for an arbitrary day must never reach the
    /// provider. `None` when the task has fewer hints.
    pub async fn hint(
        &self,
        ctx: &Context,
        day_key: DayKey,
        index: usize,
    ) -> Result<Option<String>, LeetbotError> {
        let task = self.storage.get_task(ctx, day_key).await?;
        Ok(task.hint(index).map(str::to_string))
    }

    /// Difficulty of the stored task for `day_key`. Storage only.
    pub async fn difficulty(
        &self,
        ctx: &Context,
        day_key: DayKey,
    ) -> Result<Difficulty, LeetbotError> {
        Ok(self.storage.get_task(ctx, day_key).await?.difficulty)
    }
}
