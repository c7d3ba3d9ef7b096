use super::*;
use std::collections::HashMap;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg = parse("").unwrap();
    assert_eq!(cfg.bot.name, "leetbot");
    assert_eq!(cfg.bot.log_level, "info");
    assert!(cfg.cache.enabled);
    assert_eq!(cfg.cache.dir, "/tmp");
    assert_eq!(cfg.cache.file_mask, "task_{day_key}.cache");
    assert!(cfg.store.enabled);
    assert_eq!(cfg.provider.graphql_url, "https://leetcode.com/graphql");
    assert_eq!(cfg.telegram.parse_mode, "HTML");
    assert_eq!(cfg.scheduler.sweep_timeout_secs, 300);
    assert_eq!(cfg.scheduler.request_timeout_secs, 5);
}

#[test]
fn test_partial_sections_from_toml() {
    let toml_str = r#"
        [cache]
        enabled = false

        [store]
        db_path = "/var/lib/leetbot/bot.db"

        [telegram]
        bot_token = "123:abc"
        timeout_secs = 3
    "#;
    let cfg = parse(toml_str).unwrap();
    assert!(!cfg.cache.enabled);
    assert_eq!(cfg.cache.dir, "/tmp", "unset keys keep their defaults");
    assert_eq!(cfg.store.db_path, "/var/lib/leetbot/bot.db");
    assert_eq!(cfg.telegram.bot_token, "123:abc");
    assert_eq!(cfg.telegram.timeout_secs, 3);
    assert_eq!(cfg.telegram.api_url, "https://api.telegram.org");
}

#[test]
fn test_parse_error_is_config_error() {
    let err = parse("[store\nenabled = ").unwrap_err();
    assert!(matches!(err, LeetbotError::Config(_)));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        (BOT_TOKEN_ENV, "from-env"),
        (LEGACY_BOT_TOKEN_ENV, "legacy"),
        (DB_PATH_ENV, "/tmp/x.db"),
    ]
    .into_iter()
    .collect();
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.telegram.bot_token, "from-env");
    assert_eq!(cfg.store.db_path, "/tmp/x.db");
}

#[test]
fn test_legacy_token_env_used_as_fallback() {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg, |k| {
        (k == LEGACY_BOT_TOKEN_ENV).then(|| "legacy".to_string())
    });
    assert_eq!(cfg.telegram.bot_token, "legacy");
    assert_eq!(cfg.store.db_path, "~/.leetbot/data/leetbot.db");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__leetbot_test__/config.toml").unwrap();
    assert!(cfg.scheduler.enabled);
}

#[test]
fn test_shellexpand_home() {
    if let Some(home) = std::env::var_os("HOME") {
        assert_eq!(
            shellexpand("~/x/y"),
            format!("{}/x/y", home.to_string_lossy())
        );
    }
    assert_eq!(shellexpand("/abs/path"), "/abs/path");
}
