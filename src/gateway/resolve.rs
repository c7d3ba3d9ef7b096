//! Resolution of today's task: storage first, provider as fallback.

use super::Gateway;
use leetbot_core::{
    context::Context, error::LeetbotError, model::DayKey, model::Task, sanitize::normalize_task,
};
use tracing::{debug, info, warn};

/// Where a resolved task came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Cache or durable store.
    Storage,
    /// Freshly fetched from the provider.
    Provider,
}

/// A resolved task, plus whether it could be persisted.
///
/// A provider fetch is kept even when saving it failed, so an interactive
/// caller can still show it. The fan-out treats `persist_error` as a failed
/// resolution. `persist_error` is always `None` for tasks that came from
/// storage.
#[derive(Debug)]
pub struct Resolution {
    pub task: Task,
    pub origin: Origin,
    pub persist_error: Option<LeetbotError>,
}

impl Gateway {
    /// Resolve the task for the current UTC day.
    ///
    /// Storage errors other than cancellation fall back to the provider just
    /// like a miss does. Provider errors are returned as-is.
    pub async fn resolve_todays_task(&self, ctx: &Context) -> Result<Resolution, LeetbotError> {
        let today = self.clock.now().date_naive();
        let day_key = DayKey::from_date(today);

        match self.storage.get_task(ctx, day_key).await {
            Ok(task) => {
                return Ok(Resolution {
                    task,
                    origin: Origin::Storage,
                    persist_error: None,
                })
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) if e.is_not_found() => debug!("task {day_key} not stored yet"),
            Err(e) => warn!("storage lookup for {day_key} failed, falling back to provider: {e}"),
        }

        let mut task = self.provider.fetch_daily_task(ctx, today).await?;
        task.day_key = day_key;
        normalize_task(&mut task);

        let persist_error = self.storage.save_task(ctx, &task).await.err();
        match &persist_error {
            None => info!(
                "task {day_key} fetched from {} and stored: {}",
                self.provider.name(),
                task.title
            ),
            Some(e) => warn!("task {day_key} fetched but not persisted: {e}"),
        }

        Ok(Resolution {
            task,
            origin: Origin::Provider,
            persist_error,
        })
    }
}
