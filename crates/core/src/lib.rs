pub mod client;
pub mod dashboard;
pub mod domain;
pub mod theme;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    use crate::theme::Theme;

    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
    pub const DEFAULT_TRENDING_LIMIT: i32 = 5;
    pub const DEFAULT_DELIVERY_DELAY_MS: u64 = 2000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: Option<String>,
        pub api_timeout_secs: Option<u64>,
        pub trending_limit: i32,
        pub theme: Theme,
        pub delivery_delay_ms: u64,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let theme = match std::env::var("THEME").ok().filter(|s| !s.trim().is_empty()) {
                Some(s) => s.parse::<Theme>().context("THEME must be `dark` or `light`")?,
                None => Theme::default(),
            };

            Ok(Self {
                api_base_url: std::env::var("API_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                api_timeout_secs: std::env::var("API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                trending_limit: std::env::var("TRENDING_LIMIT")
                    .ok()
                    .and_then(|s| s.parse::<i32>().ok())
                    .unwrap_or(DEFAULT_TRENDING_LIMIT),
                theme,
                delivery_delay_ms: std::env::var("DELIVERY_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_DELIVERY_DELAY_MS),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn api_base_url(&self) -> &str {
            self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
        }

        /// `None` leaves the transport default in place.
        pub fn api_timeout(&self) -> Option<Duration> {
            self.api_timeout_secs.map(Duration::from_secs)
        }

        pub fn delivery_delay(&self) -> Duration {
            Duration::from_millis(self.delivery_delay_ms)
        }
    }
}
