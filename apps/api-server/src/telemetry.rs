//! Log output for the blog server.
//!
//! Denied mutations and rejected forms are logged by `blog_core` at `debug`,
//! so the default filter keeps the blog crates one level chattier than
//! everything else.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVES: &str = "info,api_server=debug,blog_core=debug,blog_infra=debug";

/// Shape of each log line, picked with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human oriented. Default for local runs.
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub directives: String,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            directives: DEFAULT_DIRECTIVES.to_string(),
            service_name: "blog-api".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read `LOG_FORMAT`, `LOG_LEVEL` and `SERVICE_NAME`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            format: std::env::var("LOG_FORMAT")
                .ok()
                .and_then(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            directives: std::env::var("LOG_LEVEL").unwrap_or(defaults.directives),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.directives))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

/// Install the global tracing subscriber.
pub fn init_telemetry(config: &TelemetryConfig) {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        "Telemetry initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" JSON "), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_default_directives_cover_blog_crates() {
        let config = TelemetryConfig::default();

        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.directives.contains("blog_core=debug"));
        assert!(config.directives.contains("blog_infra=debug"));
        assert!(EnvFilter::try_new(&config.directives).is_ok());
    }
}
