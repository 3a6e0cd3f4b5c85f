//! Bot configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_WORKER_IDLE_SECS: u64 = 300;
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_CHAT_API_BASE_URL: &str = "https://open-api.divar.ir";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub worker_idle_timeout: Duration,
    /// Public URL of this service; only feeds `redirect_uri`
    pub base_url: String,
    pub api_key: Option<String>,
    /// Platform registration details, logged at startup
    pub app_slug: Option<String>,
    pub oauth_secret: Option<String>,
    pub chat_api_base_url: String,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = non_empty("TODO_BOT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let db_path = non_empty("TODO_BOT_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.todo-bot/todo.db"))
            },
            PathBuf::from,
        );

        let idle_secs = non_empty("TODO_BOT_WORKER_IDLE_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|&s: &u64| s > 0)
            .unwrap_or(DEFAULT_WORKER_IDLE_SECS);

        let base_url = non_empty("BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let chat_api_base_url = non_empty("CHAT_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            port,
            db_path,
            worker_idle_timeout: Duration::from_secs(idle_secs),
            base_url,
            api_key: non_empty("DIVAR_API_KEY"),
            app_slug: non_empty("DIVAR_APP_SLUG"),
            oauth_secret: non_empty("DIVAR_OAUTH_SECRET"),
            chat_api_base_url,
        }
    }

    /// OAuth callback registered with the chat platform
    pub fn redirect_uri(&self) -> String {
        format!("{}/divar/oauth/callback", self.base_url)
    }
}
