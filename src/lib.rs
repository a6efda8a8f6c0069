// Action Chain Library - keyed actions driven by a fail-fast build pass
// This exposes the registry, its configuration and logging setup

pub mod chain;
pub mod config;
pub mod telemetry;

// Re-export key types for easy access
pub use crate::chain::{
    invoked_key, option, Aborted, ActionChain, ActionFn, ActionOption, BuildOutcome, BuildReport,
    ExecutionOrder, Registry, StatusPolicy,
};
pub use crate::config::{ChainConfig, ExecutionConfig, ObservabilityConfig, config, init_config};
pub use crate::telemetry::{init_telemetry, generate_correlation_id, create_build_span};
