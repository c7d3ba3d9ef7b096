//! Daily task records.

use super::SqliteStore;
use async_trait::async_trait;
use leetbot_core::{
    context::Context,
    error::LeetbotError,
    model::{DayKey, Difficulty, Task},
    traits::TaskKeeper,
};

#[async_trait]
impl TaskKeeper for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get_task(&self, ctx: &Context, day_key: DayKey) -> Result<Task, LeetbotError> {
        ctx.run(async {
            let row: Option<(i64, String, String, String, String, i64)> = sqlx::query_as(
                "SELECT question_id, title_slug, title, content, hints, difficulty \
                 FROM daily_tasks WHERE day_key = ?",
            )
            .bind(i64::from(day_key.get()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("get task failed: {e}")))?;

            let Some((question_id, title_slug, title, content, hints, difficulty)) = row else {
                return Err(LeetbotError::NoSuchTask);
            };

            Ok(Task {
                day_key,
                question_id: u64::try_from(question_id).unwrap_or_default(),
                title,
                content,
                hints: serde_json::from_str(&hints)?,
                difficulty: Difficulty::from_code(u8::try_from(difficulty).unwrap_or(u8::MAX)),
                title_slug,
            })
        })
        .await
    }

    async fn save_task(&self, ctx: &Context, task: &Task) -> Result<(), LeetbotError> {
        let hints = serde_json::to_string(&task.hints)?;
        ctx.run(async {
            sqlx::query(
                "INSERT OR REPLACE INTO daily_tasks \
                 (day_key, question_id, title_slug, title, content, hints, difficulty) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(i64::from(task.day_key.get()))
            .bind(i64::try_from(task.question_id).unwrap_or(i64::MAX))
            .bind(&task.title_slug)
            .bind(&task.title)
            .bind(&task.content)
            .bind(&hints)
            .bind(i64::from(task.difficulty.code()))
            .execute(&self.pool)
            .await
            .map_err(|e| LeetbotError::Storage(format!("save task failed: {e}")))?;
            Ok(())
        })
        .await
    }
}
