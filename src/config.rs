use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub session_secret: String,
    pub notify_webhook_url: Option<String>,
    pub check_in_base_url: String,
    pub store_timeout: Duration,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "deskbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| "development-session-secret".to_string()),
            notify_webhook_url: non_empty("NOTIFY_WEBHOOK_URL"),
            check_in_base_url: env::var("CHECK_IN_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            store_timeout: Duration::from_millis(
                env::var("STORE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2000),
            ),
            cors_origin: non_empty("CORS_ORIGIN"),
        }
    }
}
