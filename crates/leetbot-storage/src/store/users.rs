//! Recipients and subscription state.

use super::SqliteStore;
use async_trait::async_trait;
use leetbot_core::{context::Context, error::LeetbotError, model::User, traits::UserKeeper};

type UserRow = (i64, i64, String, String, String, bool, i64);

fn user_from_row(row: UserRow) -> User {
    let (id, chat_id, first_name, last_name, username, subscribed, sending_hour) = row;
    User {
        id,
        chat_id,
        username,
        first_name,
        last_name,
        subscribed,
        sending_hour: u8::try_from(sending_hour).unwrap_or_default(),
    }
}

#[async_trait]
impl UserKeeper for SqliteStore {
    async fn get_user(&self, ctx: &Context, id: i64) -> Result<User, LeetbotError> {
        ctx.run(async {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, chat_id, first_name, last_name, username, subscribed, sending_hour \
                 FROM users WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("get user failed: {e}")))?;

            row.map(user_from_row).ok_or(LeetbotError::NoSuchUser)
        })
        .await
    }

    async fn save_user(&self, ctx: &Context, user: &User) -> Result<(), LeetbotError> {
        ctx.run(async {
            sqlx::query(
                "INSERT OR REPLACE INTO users \
                 (id, chat_id, first_name, last_name, username, subscribed, sending_hour) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(user.id)
            .bind(user.chat_id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.username)
            .bind(user.subscribed)
            .bind(i64::from(user.sending_hour))
            .execute(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("save user failed: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn set_subscribed(&self, ctx: &Context, id: i64, hour: u8) -> Result<(), LeetbotError> {
        ctx.run(async {
            let result = sqlx::query(
                "UPDATE users SET subscribed = 1, sending_hour = ?, updated_at = datetime('now') \
                 WHERE id = ?",
            )
            .bind(i64::from(hour))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("subscribe user failed: {e}")))?;

            if result.rows_affected() == 0 {
                return Err(LeetbotError::NoSuchUser);
            }
            Ok(())
        })
        .await
    }

    async fn set_unsubscribed(&self, ctx: &Context, id: i64) -> Result<(), LeetbotError> {
        ctx.run(async {
            let result = sqlx::query(
                "UPDATE users SET subscribed = 0, updated_at = datetime('now') WHERE id = ?",
            )
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("unsubscribe user failed: {e}")))?;

            if result.rows_affected() == 0 {
                return Err(LeetbotError::NoSuchUser);
            }
            Ok(())
        })
        .await
    }

    async fn list_subscribed(&self, ctx: &Context, hour: u8) -> Result<Vec<User>, LeetbotError> {
        ctx.run(async {
            let rows: Vec<UserRow> = sqlx::query_as(
                "SELECT id, chat_id, first_name, last_name, username, subscribed, sending_hour \
                 FROM users WHERE subscribed = 1 AND sending_hour = ? ORDER BY id",
            )
            .bind(i64::from(hour))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("list subscribed users failed: {e}")))?;

            Ok(rows.into_iter().map(user_from_row).collect())
        })
        .await
    }
}
