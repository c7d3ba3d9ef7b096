// --- Default value functions ---

pub(super) fn default_name() -> String {
    "leetbot".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.leetbot".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_cache_dir() -> String {
    "/tmp".to_string()
}
pub(super) fn default_cache_mask() -> String {
    "task_{day_key}.cache".to_string()
}
pub(super) fn default_db_path() -> String {
    "~/.leetbot/data/leetbot.db".to_string()
}
pub(super) fn default_graphql_url() -> String {
    "https://leetcode.com/graphql".to_string()
}
pub(super) fn default_problems_url() -> String {
    "https://leetcode.com/problems".to_string()
}
pub(super) fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}
pub(super) fn default_parse_mode() -> String {
    "HTML".to_string()
}
pub(super) fn default_timeout_secs() -> u64 {
    10
}
pub(super) fn default_sweep_timeout() -> u64 {
    300
}
pub(super) fn default_request_timeout() -> u64 {
    5
}
