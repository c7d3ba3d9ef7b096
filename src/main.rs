mod gateway;

use clap::{Parser, Subcommand};
use gateway::Gateway;
use leetbot_channels::TelegramTransport;
use leetbot_core::{
    clock::SystemClock,
    config::{self, Config},
    context::Context,
    error::LeetbotError,
    model::{DayKey, User},
};
use leetbot_providers::LeetCodeClient;
use leetbot_storage::{FileCache, SqliteStore, StorageController};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "leetbot",
    version,
    about = "Daily LeetCode challenge bot for Telegram"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hourly delivery loop until interrupted.
    Start,
    /// Run one delivery sweep for the current UTC hour.
    Notify,
    /// Print today's task.
    Today,
    /// Print a hint of a stored task.
    Hint {
        /// Day key, e.g. 20230615.
        day_key: u32,
        /// Hint number, starting at 1.
        n: usize,
    },
    /// Print the difficulty of a stored task.
    Difficulty {
        /// Day key, e.g. 20230615.
        day_key: u32,
    },
    /// Subscribe a user for daily delivery.
    Subscribe {
        user_id: i64,
        /// UTC hour, 0-23.
        hour: u8,
        /// Chat to deliver to. Defaults to the user id.
        #[arg(long)]
        chat_id: Option<i64>,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Stop daily delivery for a user.
    Unsubscribe { user_id: i64 },
    /// Show configuration and storage tiers.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg);

    match cli.command {
        Commands::Start => {
            if !cfg.scheduler.enabled {
                anyhow::bail!("Scheduler is disabled. Set scheduler.enabled = true in config.toml.");
            }
            let gw = Arc::new(build_gateway(&cfg, true).await?);
            info!("{} starting", cfg.bot.name);

            let ctx = Context::new();
            let loop_handle = {
                let gw = gw.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move { gw.hourly_loop(&ctx).await })
            };

            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal");
            ctx.cancel();
            if let Err(e) = loop_handle.await {
                error!("delivery loop ended abnormally: {e}");
            }
        }
        Commands::Notify => {
            let gw = build_gateway(&cfg, true).await?;
            let ctx = Context::with_timeout(Duration::from_secs(cfg.scheduler.sweep_timeout_secs));
            let report = gw.notify_subscribers(&ctx).await?;
            println!(
                "{}:00 UTC: {} recipients, {} delivered, {} failed",
                report.hour, report.recipients, report.delivered, report.failed
            );
        }
        Commands::Today => {
            let gw = build_gateway(&cfg, false).await?;
            let resolution = gw.resolve_todays_task(&request_ctx(&cfg)).await?;
            if resolution.origin == gateway::Origin::Provider {
                info!("task {} fetched from the provider", resolution.task.day_key);
            }
            if let Some(e) = &resolution.persist_error {
                eprintln!("warning: task could not be stored: {e}");
            }
            let task = resolution.task;
            println!("{}\n", task.text());
            println!("{}", task.url(&cfg.provider.problems_url));
        }
        Commands::Hint { day_key, n } => {
            let gw = build_gateway(&cfg, false).await?;
            let key = parse_day_key(day_key)?;
            let hint = match n.checked_sub(1) {
                Some(index) => gw.hint(&request_ctx(&cfg), key, index).await,
                None => Ok(None),
            };
            match hint {
                Ok(Some(text)) => println!("Hint #{n}: {text}"),
                Ok(None) => println!("There is no such hint for task {key}"),
                Err(e) if e.is_not_found() => println!("There is no such daily task: {key}"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Difficulty { day_key } => {
            let gw = build_gateway(&cfg, false).await?;
            let key = parse_day_key(day_key)?;
            match gw.difficulty(&request_ctx(&cfg), key).await {
                Ok(difficulty) => println!("Task difficulty: {difficulty}"),
                Err(e) if e.is_not_found() => println!("There is no such daily task: {key}"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Subscribe {
            user_id,
            hour,
            chat_id,
            username,
            first_name,
            last_name,
        } => {
            let gw = build_gateway(&cfg, false).await?;
            let user = User {
                id: user_id,
                chat_id: chat_id.unwrap_or(user_id),
                username,
                first_name,
                last_name,
                ..User::default()
            };
            match gw.subscribe(&request_ctx(&cfg), &user, hour).await {
                Ok(()) => println!("User {user_id} will receive daily tasks at {hour}:00 UTC"),
                Err(e @ LeetbotError::AlreadySubscribed) => println!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Unsubscribe { user_id } => {
            let gw = build_gateway(&cfg, false).await?;
            match gw.unsubscribe(&request_ctx(&cfg), user_id).await {
                Ok(()) => println!("User {user_id} unsubscribed"),
                Err(e) if e.is_already_in_state() => println!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Status => {
            println!("leetbot status\n");
            println!("Config: {}", cli.config);
            println!("Data dir: {}", config::shellexpand(&cfg.bot.data_dir));
            println!("Today: {}", DayKey::today(&SystemClock));
            println!();
            println!(
                "  cache: {}",
                if cfg.cache.enabled {
                    FileCache::from_config(&cfg.cache).dir().display().to_string()
                } else {
                    "disabled".to_string()
                }
            );
            println!(
                "  store: {}",
                if cfg.store.enabled {
                    config::shellexpand(&cfg.store.db_path)
                } else {
                    "disabled (subscriptions unavailable)".to_string()
                }
            );
            println!("  provider: {}", cfg.provider.graphql_url);
            println!(
                "  telegram: {}",
                if cfg.telegram.bot_token.is_empty() {
                    "missing bot_token"
                } else {
                    "configured"
                }
            );
            println!(
                "  scheduler: {}",
                if cfg.scheduler.enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
    }

    Ok(())
}

/// Stdout logging, plus a daily-rolling file when `bot.log_dir` is set.
///
/// `RUST_LOG` wins over `bot.log_level`. The returned guard flushes the
/// file writer and must live as long as the process.
fn init_logging(cfg: &Config) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.bot.log_level))
    };
    let stdout = fmt::layer().with_filter(filter());

    match &cfg.bot.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(
                config::shellexpand(dir),
                format!("{}.log", cfg.bot.name),
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            tracing_subscriber::registry().with(stdout).with(file).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stdout).init();
            None
        }
    }
}

/// Build the storage tiers, provider, and (optionally) the transport.
async fn build_gateway(cfg: &Config, deliver: bool) -> anyhow::Result<Gateway> {
    let mut storage = StorageController::new();
    if cfg.cache.enabled {
        storage = storage.with_cache(Arc::new(FileCache::from_config(&cfg.cache)));
    }
    if cfg.store.enabled {
        let store = Arc::new(SqliteStore::new(&cfg.store).await?);
        storage = storage
            .with_task_store(store.clone())
            .with_user_store(store);
    }

    let provider = Arc::new(LeetCodeClient::from_config(&cfg.provider)?);
    let mut gw = Gateway::new(Arc::new(storage), provider, Arc::new(SystemClock))
        .with_parse_mode(cfg.telegram.parse_mode.clone())
        .with_sweep_timeout(Duration::from_secs(cfg.scheduler.sweep_timeout_secs));

    if deliver {
        if cfg.telegram.bot_token.is_empty() {
            anyhow::bail!(
                "Telegram bot_token is empty. \
                 Set it in config.toml or the {} env var.",
                config::BOT_TOKEN_ENV
            );
        }
        gw = gw.with_transport(Arc::new(TelegramTransport::new(&cfg.telegram)?));
    }
    Ok(gw)
}

fn request_ctx(cfg: &Config) -> Context {
    Context::with_timeout(Duration::from_secs(cfg.scheduler.request_timeout_secs))
}

fn parse_day_key(raw: u32) -> anyhow::Result<DayKey> {
    DayKey::from_raw(raw)
        .ok_or_else(|| anyhow::anyhow!("{raw} is not a day key (expected YYYYMMDD)"))
}
