//! Storage controller: the tiering policy over the fast cache and the
//! durable store.
//!
//! Tasks are read cache-first and written to both tiers. Users live only in
//! the durable store; without one every user operation fails with
//! [`LeetbotError::NoUserStorage`].

mod locks;

use leetbot_core::{
    context::Context,
    error::LeetbotError,
    model::{DayKey, Task, User},
    traits::{TaskKeeper, UserKeeper},
};
use locks::UserLocks;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which task tier an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Fast,
    Durable,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => f.write_str("cache"),
            Self::Durable => f.write_str("store"),
        }
    }
}

/// Routes task and user operations to the configured tiers.
///
/// Every tier is optional. Collaborators are built once at startup and
/// handed in; the controller never opens connections itself.
#[derive(Default)]
pub struct StorageController {
    fast: Option<Arc<dyn TaskKeeper>>,
    durable: Option<Arc<dyn TaskKeeper>>,
    users: Option<Arc<dyn UserKeeper>>,
    locks: UserLocks,
}

impl StorageController {
    /// A controller with no tiers configured.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<dyn TaskKeeper>) -> Self {
        self.fast = Some(cache);
        self
    }

    pub fn with_task_store(mut self, store: Arc<dyn TaskKeeper>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn with_user_store(mut self, store: Arc<dyn UserKeeper>) -> Self {
        self.users = Some(store);
        self
    }

    pub fn has_cache(&self) -> bool {
        self.fast.is_some()
    }

    pub fn has_task_store(&self) -> bool {
        self.durable.is_some()
    }

    pub fn has_user_store(&self) -> bool {
        self.users.is_some()
    }

    fn keeper(&self, tier: Tier) -> Option<&Arc<dyn TaskKeeper>> {
        match tier {
            Tier::Fast => self.fast.as_ref(),
            Tier::Durable => self.durable.as_ref(),
        }
    }

    async fn get_from(
        &self,
        ctx: &Context,
        tier: Tier,
        day_key: DayKey,
    ) -> Result<Task, LeetbotError> {
        match self.keeper(tier) {
            Some(keeper) => keeper.get_task(ctx, day_key).await,
            None => Err(LeetbotError::NoSuchTask),
        }
    }

    async fn save_to(&self, ctx: &Context, tier: Tier, task: &Task) -> Result<(), LeetbotError> {
        match self.keeper(tier) {
            Some(keeper) => keeper.save_task(ctx, task).await,
            None => Ok(()),
        }
    }

    /// Look up the task for `day_key`, cache first.
    ///
    /// A cache hit is returned without consulting the store. A cache miss or
    /// cache failure falls through to the store; only a genuine miss triggers
    /// the best-effort write-back of the store's record into the cache.
    pub async fn get_task(&self, ctx: &Context, day_key: DayKey) -> Result<Task, LeetbotError> {
        let write_back = match self.get_from(ctx, Tier::Fast, day_key).await {
            Ok(task) => return Ok(task),
            Err(LeetbotError::Cancelled) => return Err(LeetbotError::Cancelled),
            Err(LeetbotError::NoSuchTask) => self.fast.is_some(),
            Err(e) => {
                warn!("{} read for {day_key} failed, falling back to {}: {e}", Tier::Fast, Tier::Durable);
                false
            }
        };

        let task = self.get_from(ctx, Tier::Durable, day_key).await?;

        if write_back {
            if let Err(e) = self.save_to(ctx, Tier::Fast, &task).await {
                warn!("{} write-back for {day_key} failed: {e}", Tier::Fast);
            } else {
                debug!("{day_key} copied from {} into {}", Tier::Durable, Tier::Fast);
            }
        }
        Ok(task)
    }

    /// Write `task` to both tiers.
    ///
    /// A cache failure is logged and ignored; the store's outcome is the
    /// result, even though the cache may already hold the new record.
    pub async fn save_task(&self, ctx: &Context, task: &Task) -> Result<(), LeetbotError> {
        if let Err(e) = self.save_to(ctx, Tier::Fast, task).await {
            if e.is_cancelled() {
                return Err(e);
            }
            warn!("{} write for {} failed: {e}", Tier::Fast, task.day_key);
        }
        self.save_to(ctx, Tier::Durable, task).await
    }

    fn user_store(&self) -> Result<&Arc<dyn UserKeeper>, LeetbotError> {
        self.users.as_ref().ok_or(LeetbotError::NoUserStorage)
    }

    /// Subscribe `user` for delivery at `hour` (UTC, `0..=23`).
    ///
    /// Unknown users are created from `user`. Re-subscribing at a different
    /// hour moves the subscription; the same hour is
    /// [`LeetbotError::AlreadySubscribed`].
    pub async fn subscribe_user(
        &self,
        ctx: &Context,
        user: &User,
        hour: u8,
    ) -> Result<(), LeetbotError> {
        let store = self.user_store()?;
        if hour > 23 {
            return Err(LeetbotError::InvalidHour(hour));
        }

        let _guard = ctx.run(async { Ok(self.locks.acquire(user.id).await) }).await?;

        match store.get_user(ctx, user.id).await {
            Ok(existing) if existing.subscribed && existing.sending_hour == hour => {
                debug!("user {} already subscribed at {hour}:00", user.id);
                Err(LeetbotError::AlreadySubscribed)
            }
            Ok(_) => store.set_subscribed(ctx, user.id, hour).await,
            Err(LeetbotError::NoSuchUser) => {
                let created = User {
                    subscribed: true,
                    sending_hour: hour,
                    ..user.clone()
                };
                store.save_user(ctx, &created).await
            }
            Err(e) => Err(e),
        }
    }

    /// Stop deliveries for `id`. Unknown or inactive users are
    /// [`LeetbotError::AlreadyUnsubscribed`].
    pub async fn unsubscribe_user(&self, ctx: &Context, id: i64) -> Result<(), LeetbotError> {
        let store = self.user_store()?;
        let _guard = ctx.run(async { Ok(self.locks.acquire(id).await) }).await?;

        match store.get_user(ctx, id).await {
            Ok(existing) if existing.subscribed => store.set_unsubscribed(ctx, id).await,
            Ok(_) | Err(LeetbotError::NoSuchUser) => {
                debug!("user {id} has no active subscription");
                Err(LeetbotError::AlreadyUnsubscribed)
            }
            Err(e) => Err(e),
        }
    }

    /// Everyone subscribed at `hour`. Empty when nobody is.
    pub async fn get_subscribed_users(
        &self,
        ctx: &Context,
        hour: u8,
    ) -> Result<Vec<User>, LeetbotError> {
        self.user_store()?.list_subscribed(ctx, hour).await
    }

    pub async fn get_user(&self, ctx: &Context, id: i64) -> Result<User, LeetbotError> {
        self.user_store()?.get_user(ctx, id).await
    }
}

#[cfg(test)]
mod tests;
