//! Telemetry Initialization
//!
//! Sets up the tracing subscriber: an environment-driven filter plus a
//! plain or JSON fmt layer. Called once at application startup before
//! any tracing occurs.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for log context
    pub service_name: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("TAGSTATS_SERVICE_NAME")
                .unwrap_or_else(|_| "tagstats-api".to_string()),
            environment: std::env::var("TAGSTATS_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            json_logs: std::env::var("TAGSTATS_LOG_JSON")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(false),
        }
    }
}

/// Initialize the tracing subscriber.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tagstats_api=debug,tower_http=debug,info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::debug!(
        service = %config.service_name,
        environment = %config.environment,
        "Telemetry initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_without_env() {
        // Whatever the ambient env holds, the struct always carries a
        // non-empty service name.
        let config = TelemetryConfig::default();
        assert!(!config.service_name.is_empty());
        assert!(!config.environment.is_empty());
    }
}
