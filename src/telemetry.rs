use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging for processes that drive action chains
///
/// RUST_LOG takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }

    tracing::info!("action chain telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping a single build pass
pub fn create_build_span(pass_id: &str, actions: usize) -> tracing::Span {
    tracing::info_span!(
        "build_pass",
        pass.id = %pass_id,
        actions = actions,
        otel.kind = "internal"
    )
}
