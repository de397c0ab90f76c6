use crate::presentation::config::{Environment, LoggingSettings};

const DEFAULT_LEVEL: &str = "info";

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: Environment,
    pub level: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn from_settings(environment: Environment, logging: &LoggingSettings) -> Self {
        Self {
            environment,
            level: logging.level.clone(),
            json_format: logging.enable_json,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        let level = match self.level.trim() {
            "" => DEFAULT_LEVEL,
            level => level,
        };
        format!("{level},forkchat={level},tower_http=debug,sqlx=warn")
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::from_env().unwrap_or(Environment::Local),
            level: DEFAULT_LEVEL.to_string(),
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }
}
