//! File-backed fast tier.
//!
//! Each task lives in its own JSON file under `dir`, named by `file_mask`
//! with `{day_key}` substituted. Writes go to a temp file first and are
//! renamed into place, so a reader never sees half a task.

use async_trait::async_trait;
use leetbot_core::{
    config::CacheConfig,
    context::Context,
    error::LeetbotError,
    model::{DayKey, Task},
    shellexpand,
    traits::TaskKeeper,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const DAY_KEY_PLACEHOLDER: &str = "{day_key}";

/// One-file-per-task JSON cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    mask: String,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>, mask: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            mask: mask.into(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(shellexpand(&config.dir), config.file_mask.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the task for `day_key` is kept.
    pub fn path_for(&self, day_key: DayKey) -> PathBuf {
        let name = if self.mask.contains(DAY_KEY_PLACEHOLDER) {
            self.mask.replace(DAY_KEY_PLACEHOLDER, &day_key.to_string())
        } else {
            format!("{}_{day_key}", self.mask)
        };
        self.dir.join(name)
    }
}

#[async_trait]
impl TaskKeeper for FileCache {
    fn name(&self) -> &str {
        "file-cache"
    }

    async fn get_task(&self, ctx: &Context, day_key: DayKey) -> Result<Task, LeetbotError> {
        let path = self.path_for(day_key);
        ctx.run(async {
            let raw = match tokio::fs::read(&path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::NotFound => return Err(LeetbotError::NoSuchTask),
                Err(e) => {
                    return Err(LeetbotError::Cache(format!(
                        "failed to read {}: {e}",
                        path.display()
                    )))
                }
            };

            let task: Task = serde_json::from_slice(&raw).map_err(|e| {
                LeetbotError::Cache(format!("corrupt cache file {}: {e}", path.display()))
            })?;
            if task.day_key != day_key {
                return Err(LeetbotError::Cache(format!(
                    "cache file {} holds task {} instead of {day_key}",
                    path.display(),
                    task.day_key
                )));
            }
            Ok(task)
        })
        .await
    }

    async fn save_task(&self, ctx: &Context, task: &Task) -> Result<(), LeetbotError> {
        let path = self.path_for(task.day_key);
        let body = serde_json::to_vec(task)?;
        ctx.run(async {
            tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
                LeetbotError::Cache(format!(
                    "failed to create cache dir {}: {e}",
                    self.dir.display()
                ))
            })?;

            let tmp = self
                .dir
                .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
            tokio::fs::write(&tmp, &body)
                .await
                .map_err(|e| LeetbotError::Cache(format!("failed to write {}: {e}", tmp.display())))?;
            if let Err(e) = tokio::fs::rename(&tmp, &path).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(LeetbotError::Cache(format!(
                    "failed to move cache file into {}: {e}",
                    path.display()
                )));
            }

            debug!("cached task {} at {}", task.day_key, path.display());
            Ok(())
        })
        .await
    }
}
