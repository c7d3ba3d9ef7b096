//! In-process keepers.
//!
//! Hold everything in maps and journal every call, so callers can check
//! exactly which tiers were touched and in what order. Failures and latency
//! can be injected per operation.

use async_trait::async_trait;
use leetbot_core::{
    context::Context,
    error::LeetbotError,
    model::{DayKey, Task, User},
    traits::{TaskKeeper, UserKeeper},
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Produces the error an injected failure returns.
pub type FailWith = fn() -> LeetbotError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Task keeper over a `HashMap`.
#[derive(Debug)]
pub struct MemoryTaskKeeper {
    name: String,
    tasks: Mutex<HashMap<DayKey, Task>>,
    calls: Mutex<Vec<String>>,
    get_failure: Mutex<Option<FailWith>>,
    save_failure: Mutex<Option<FailWith>>,
    delay: Option<Duration>,
}

impl MemoryTaskKeeper {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            get_failure: Mutex::new(None),
            save_failure: Mutex::new(None),
            delay: None,
        }
    }

    /// Seed a task without journaling a call.
    pub fn with_task(self, task: Task) -> Self {
        lock(&self.tasks).insert(task.day_key, task);
        self
    }

    /// Sleep this long inside every call, under the caller's context.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_gets_with(&self, fail: FailWith) {
        *lock(&self.get_failure) = Some(fail);
    }

    pub fn fail_saves_with(&self, fail: FailWith) {
        *lock(&self.save_failure) = Some(fail);
    }

    /// Every call so far, e.g. `"get_task 20230615"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Number of calls to `op` (`"get_task"` or `"save_task"`).
    pub fn count(&self, op: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(op))
            .count()
    }

    pub fn stored(&self, day_key: DayKey) -> Option<Task> {
        lock(&self.tasks).get(&day_key).cloned()
    }

    async fn pause(&self) {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
}

#[async_trait]
impl TaskKeeper for MemoryTaskKeeper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_task(&self, ctx: &Context, day_key: DayKey) -> Result<Task, LeetbotError> {
        lock(&self.calls).push(format!("get_task {day_key}"));
        ctx.run(async {
            self.pause().await;
            if let Some(fail) = *lock(&self.get_failure) {
                return Err(fail());
            }
            self.stored(day_key).ok_or(LeetbotError::NoSuchTask)
        })
        .await
    }

    async fn save_task(&self, ctx: &Context, task: &Task) -> Result<(), LeetbotError> {
        lock(&self.calls).push(format!("save_task {}", task.day_key));
        ctx.run(async {
            self.pause().await;
            if let Some(fail) = *lock(&self.save_failure) {
                return Err(fail());
            }
            lock(&self.tasks).insert(task.day_key, task.clone());
            Ok(())
        })
        .await
    }
}

/// User keeper over a `HashMap`.
///
/// Yields to the scheduler between reading and writing, which widens the
/// window for racing read-modify-write callers.
#[derive(Debug, Default)]
pub struct MemoryUserKeeper {
    users: Mutex<HashMap<i64, User>>,
    calls: Mutex<Vec<String>>,
    failure: Mutex<Option<FailWith>>,
}

impl MemoryUserKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        lock(&self.users).insert(user.id, user);
        self
    }

    /// Make every subsequent call fail.
    pub fn fail_with(&self, fail: FailWith) {
        *lock(&self.failure) = Some(fail);
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, op: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(op))
            .count()
    }

    pub fn stored(&self, id: i64) -> Option<User> {
        lock(&self.users).get(&id).cloned()
    }

    async fn enter(&self, call: String) -> Result<(), LeetbotError> {
        lock(&self.calls).push(call);
        tokio::task::yield_now().await;
        match *lock(&self.failure) {
            Some(fail) => Err(fail()),
            None => Ok(()),
        }
    }

    fn update(&self, id: i64, apply: impl FnOnce(&mut User)) -> Result<(), LeetbotError> {
        let mut users = lock(&self.users);
        let user = users.get_mut(&id).ok_or(LeetbotError::NoSuchUser)?;
        apply(user);
        Ok(())
    }
}

#[async_trait]
impl UserKeeper for MemoryUserKeeper {
    async fn get_user(&self, ctx: &Context, id: i64) -> Result<User, LeetbotError> {
        ctx.run(async {
            self.enter(format!("get_user {id}")).await?;
            self.stored(id).ok_or(LeetbotError::NoSuchUser)
        })
        .await
    }

    async fn save_user(&self, ctx: &Context, user: &User) -> Result<(), LeetbotError> {
        ctx.run(async {
            self.enter(format!("save_user {}", user.id)).await?;
            lock(&self.users).insert(user.id, user.clone());
            Ok(())
        })
        .await
    }

    async fn set_subscribed(&self, ctx: &Context, id: i64, hour: u8) -> Result<(), LeetbotError> {
        ctx.run(async {
            self.enter(format!("set_subscribed {id} {hour}")).await?;
            self.update(id, |u| {
                u.subscribed = true;
                u.sending_hour = hour;
            })
        })
        .await
    }

    async fn set_unsubscribed(&self, ctx: &Context, id: i64) -> Result<(), LeetbotError> {
        ctx.run(async {
            self.enter(format!("set_unsubscribed {id}")).await?;
            self.update(id, |u| u.subscribed = false)
        })
        .await
    }

    async fn list_subscribed(&self, ctx: &Context, hour: u8) -> Result<Vec<User>, LeetbotError> {
        ctx.run(async {
            self.enter(format!("list_subscribed {hour}")).await?;
            let mut users: Vec<User> = lock(&self.users)
                .values()
                .filter(|u| u.subscribed && u.sending_hour == hour)
                .cloned()
                .collect();
            users.sort_by_key(|u| u.id);
            Ok(users)
        })
        .await
    }
}
