use super::StorageController;
use crate::memory::{MemoryTaskKeeper, MemoryUserKeeper};
use leetbot_core::context::Context;
use leetbot_core::error::LeetbotError;
use leetbot_core::model::{DayKey, Difficulty, Task, User};
use std::sync::Arc;
use std::time::Duration;

const KEY: u32 = 20230615;

fn key() -> DayKey {
    DayKey::from_raw(KEY).unwrap()
}

fn task(title: &str) -> Task {
    Task {
        day_key: key(),
        question_id: 1,
        title: title.to_string(),
        content: "content".to_string(),
        hints: vec!["a".to_string(), "b".to_string()],
        difficulty: Difficulty::Easy,
        title_slug: "x".to_string(),
    }
}

fn user(id: i64) -> User {
    User {
        id,
        chat_id: id + 1000,
        first_name: "Grace".to_string(),
        ..User::default()
    }
}

struct Tiers {
    cache: Arc<MemoryTaskKeeper>,
    store: Arc<MemoryTaskKeeper>,
    controller: StorageController,
}

fn tiers(cache: MemoryTaskKeeper, store: MemoryTaskKeeper) -> Tiers {
    let cache = Arc::new(cache);
    let store = Arc::new(store);
    let controller = StorageController::new()
        .with_cache(cache.clone())
        .with_task_store(store.clone());
    Tiers {
        cache,
        store,
        controller,
    }
}

fn with_users(users: MemoryUserKeeper) -> (Arc<MemoryUserKeeper>, StorageController) {
    let users = Arc::new(users);
    let controller = StorageController::new().with_user_store(users.clone());
    (users, controller)
}

// --- GetTask ---

#[tokio::test]
async fn test_cache_miss_then_backfill() {
    let t = tiers(
        MemoryTaskKeeper::new("cache"),
        MemoryTaskKeeper::new("store").with_task(task("from store")),
    );
    let ctx = Context::new();

    let first = t.controller.get_task(&ctx, key()).await.unwrap();
    assert_eq!(first.title, "from store");
    assert_eq!(t.cache.stored(key()), Some(first.clone()), "write-back must happen");

    let second = t.controller.get_task(&ctx, key()).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(t.store.count("get_task"), 1, "second read must be served by the cache");
}

#[tokio::test]
async fn test_cache_short_circuit() {
    let t = tiers(
        MemoryTaskKeeper::new("cache").with_task(task("cached")),
        MemoryTaskKeeper::new("store").with_task(task("stored")),
    );
    let got = t.controller.get_task(&Context::new(), key()).await.unwrap();
    assert_eq!(got.title, "cached");
    assert_eq!(t.store.count("get_task"), 0);
    assert!(t.store.calls().is_empty());
}

#[tokio::test]
async fn test_cache_consulted_strictly_before_store() {
    let t = tiers(MemoryTaskKeeper::new("cache"), MemoryTaskKeeper::new("store"));
    let err = t.controller.get_task(&Context::new(), key()).await.unwrap_err();
    assert!(matches!(err, LeetbotError::NoSuchTask));
    assert_eq!(t.cache.calls(), vec![format!("get_task {KEY}")]);
    assert_eq!(t.store.calls(), vec![format!("get_task {KEY}")]);
    assert_eq!(t.cache.count("save_task"), 0, "nothing to write back");
}

#[tokio::test]
async fn test_cache_error_falls_through_without_write_back() {
    let t = tiers(
        MemoryTaskKeeper::new("cache"),
        MemoryTaskKeeper::new("store").with_task(task("stored")),
    );
    t.cache
        .fail_gets_with(|| LeetbotError::Cache("disk on fire".into()));

    let got = t.controller.get_task(&Context::new(), key()).await.unwrap();
    assert_eq!(got.title, "stored");
    assert_eq!(t.cache.count("save_task"), 0);
}

#[tokio::test]
async fn test_write_back_failure_is_swallowed() {
    let t = tiers(
        MemoryTaskKeeper::new("cache"),
        MemoryTaskKeeper::new("store").with_task(task("stored")),
    );
    t.cache
        .fail_saves_with(|| LeetbotError::Cache("read-only".into()));

    let got = t.controller.get_task(&Context::new(), key()).await.unwrap();
    assert_eq!(got.title, "stored");
    assert_eq!(t.cache.count("save_task"), 1);
}

#[tokio::test]
async fn test_store_error_propagates_on_read() {
    let t = tiers(MemoryTaskKeeper::new("cache"), MemoryTaskKeeper::new("store"));
    t.store
        .fail_gets_with(|| LeetbotError::Storage("locked".into()));
    let err = t.controller.get_task(&Context::new(), key()).await.unwrap_err();
    assert!(matches!(err, LeetbotError::Storage(_)));
}

#[tokio::test]
async fn test_unconfigured_tiers() {
    let store = Arc::new(MemoryTaskKeeper::new("store").with_task(task("stored")));
    let no_cache = StorageController::new().with_task_store(store.clone());
    let got = no_cache.get_task(&Context::new(), key()).await.unwrap();
    assert_eq!(got.title, "stored");

    let nothing = StorageController::new();
    assert!(matches!(
        nothing.get_task(&Context::new(), key()).await.unwrap_err(),
        LeetbotError::NoSuchTask
    ));
    nothing.save_task(&Context::new(), &task("dropped")).await.unwrap();
}

#[tokio::test]
async fn test_cancelled_cache_read_is_not_a_miss() {
    let t = tiers(
        MemoryTaskKeeper::new("cache").with_delay(Duration::from_secs(30)),
        MemoryTaskKeeper::new("store").with_task(task("stored")),
    );
    let ctx = Context::with_timeout(Duration::from_millis(50));
    let err = t.controller.get_task(&ctx, key()).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(t.store.count("get_task"), 0);
}

// --- SaveTask ---

#[tokio::test]
async fn test_save_writes_both_tiers() {
    let t = tiers(MemoryTaskKeeper::new("cache"), MemoryTaskKeeper::new("store"));
    let saved = task("both");
    t.controller.save_task(&Context::new(), &saved).await.unwrap();
    assert_eq!(t.cache.stored(key()), Some(saved.clone()));
    assert_eq!(t.store.stored(key()), Some(saved));
}

#[tokio::test]
async fn test_save_tolerates_cache_failure() {
    let t = tiers(MemoryTaskKeeper::new("cache"), MemoryTaskKeeper::new("store"));
    t.cache
        .fail_saves_with(|| LeetbotError::Cache("full".into()));
    t.controller
        .save_task(&Context::new(), &task("durable"))
        .await
        .unwrap();
    assert!(t.store.stored(key()).is_some());
}

#[tokio::test]
async fn test_save_returns_store_failure_after_cache_write() {
    let t = tiers(MemoryTaskKeeper::new("cache"), MemoryTaskKeeper::new("store"));
    t.store
        .fail_saves_with(|| LeetbotError::Storage("disk full".into()));
    let err = t
        .controller
        .save_task(&Context::new(), &task("half"))
        .await
        .unwrap_err();
    assert!(matches!(err, LeetbotError::Storage(_)));
    assert!(t.cache.stored(key()).is_some(), "cache keeps the unpersisted value");
}

// --- Users ---

#[tokio::test]
async fn test_user_operations_need_a_store() {
    let controller = StorageController::new();
    let ctx = Context::new();
    assert!(matches!(
        controller.subscribe_user(&ctx, &user(1), 9).await.unwrap_err(),
        LeetbotError::NoUserStorage
    ));
    assert!(matches!(
        controller.unsubscribe_user(&ctx, 1).await.unwrap_err(),
        LeetbotError::NoUserStorage
    ));
    assert!(matches!(
        controller.get_subscribed_users(&ctx, 9).await.unwrap_err(),
        LeetbotError::NoUserStorage
    ));
}

#[tokio::test]
async fn test_subscribe_creates_new_user() {
    let (users, controller) = with_users(MemoryUserKeeper::new());
    controller
        .subscribe_user(&Context::new(), &user(1), 9)
        .await
        .unwrap();
    let stored = users.stored(1).unwrap();
    assert!(stored.subscribed);
    assert_eq!(stored.sending_hour, 9);
    assert_eq!(stored.chat_id, 1001);
    assert_eq!(stored.first_name, "Grace");
}

#[tokio::test]
async fn test_subscribe_same_hour_is_already_subscribed() {
    let existing = User {
        subscribed: true,
        sending_hour: 9,
        ..user(1)
    };
    let (users, controller) = with_users(MemoryUserKeeper::new().with_user(existing.clone()));
    let err = controller
        .subscribe_user(&Context::new(), &user(1), 9)
        .await
        .unwrap_err();
    assert!(matches!(err, LeetbotError::AlreadySubscribed));
    assert_eq!(users.stored(1), Some(existing));
    assert_eq!(users.count("set_subscribed"), 0);
    assert_eq!(users.count("save_user"), 0);
}

#[tokio::test]
async fn test_subscribe_different_hour_moves_subscription() {
    let existing = User {
        subscribed: true,
        sending_hour: 9,
        ..user(1)
    };
    let (users, controller) = with_users(MemoryUserKeeper::new().with_user(existing));
    controller
        .subscribe_user(&Context::new(), &user(1), 17)
        .await
        .unwrap();
    assert_eq!(users.stored(1).unwrap().sending_hour, 17);
}

#[tokio::test]
async fn test_resubscribe_after_unsubscribe() {
    let existing = User {
        subscribed: false,
        sending_hour: 9,
        ..user(1)
    };
    let (users, controller) = with_users(MemoryUserKeeper::new().with_user(existing));
    controller
        .subscribe_user(&Context::new(), &user(1), 9)
        .await
        .unwrap();
    assert!(users.stored(1).unwrap().subscribed);
}

#[tokio::test]
async fn test_subscribe_rejects_bad_hour() {
    let (users, controller) = with_users(MemoryUserKeeper::new());
    let err = controller
        .subscribe_user(&Context::new(), &user(1), 24)
        .await
        .unwrap_err();
    assert!(matches!(err, LeetbotError::InvalidHour(24)));
    assert!(users.calls().is_empty());
}

#[tokio::test]
async fn test_subscribe_propagates_store_failure() {
    let (users, controller) = with_users(MemoryUserKeeper::new());
    users.fail_with(|| LeetbotError::Storage("gone".into()));
    let err = controller
        .subscribe_user(&Context::new(), &user(1), 9)
        .await
        .unwrap_err();
    assert!(matches!(err, LeetbotError::Storage(_)));
}

#[tokio::test]
async fn test_unsubscribe_idempotence() {
    let inactive = User {
        subscribed: false,
        sending_hour: 5,
        ..user(2)
    };
    let (users, controller) = with_users(MemoryUserKeeper::new().with_user(inactive.clone()));
    let ctx = Context::new();

    let never = controller.unsubscribe_user(&ctx, 1).await.unwrap_err();
    assert!(matches!(never, LeetbotError::AlreadyUnsubscribed));
    let again = controller.unsubscribe_user(&ctx, 2).await.unwrap_err();
    assert!(matches!(again, LeetbotError::AlreadyUnsubscribed));

    assert_eq!(users.stored(1), None);
    assert_eq!(users.stored(2), Some(inactive));
    assert_eq!(users.count("set_unsubscribed"), 0);
}

#[tokio::test]
async fn test_unsubscribe_keeps_hour() {
    let active = User {
        subscribed: true,
        sending_hour: 7,
        ..user(3)
    };
    let (users, controller) = with_users(MemoryUserKeeper::new().with_user(active));
    controller.unsubscribe_user(&Context::new(), 3).await.unwrap();
    let stored = users.stored(3).unwrap();
    assert!(!stored.subscribed);
    assert_eq!(stored.sending_hour, 7);
}

#[tokio::test]
async fn test_get_subscribed_users_empty_hour() {
    let (_, controller) = with_users(MemoryUserKeeper::new());
    let users = controller
        .get_subscribed_users(&Context::new(), 3)
        .await
        .unwrap();
    assert!(users.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribes_for_one_user_do_not_race() {
    let (users, controller) = with_users(MemoryUserKeeper::new());
    let controller = Arc::new(controller);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .subscribe_user(&Context::new(), &user(1), 9)
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => created += 1,
            Err(LeetbotError::AlreadySubscribed) => already += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(created, 1, "exactly one subscribe may create the user");
    assert_eq!(already, 7);
    assert_eq!(users.count("save_user"), 1);

    // Idle locks are pruned the next time any lock is taken.
    let _ = controller.unsubscribe_user(&Context::new(), 2).await;
    assert_eq!(controller.locks.tracked(), 1);
}
