//! Tests for configuration layered from ACTION_CHAIN_ environment variables.
//! Kept in its own test binary: the variables are process-wide.

use action_chain::{ChainConfig, ExecutionOrder, Registry, StatusPolicy};

const VARS: [(&str, &str); 3] = [
    ("ACTION_CHAIN_EXECUTION__ORDER", "lexicographic"),
    ("ACTION_CHAIN_EXECUTION__STATUS_POLICY", "advance"),
    ("ACTION_CHAIN_EXECUTION__FORWARD_OPTIONS", "true"),
];

#[test]
fn environment_overrides_execution_defaults() {
    for (name, value) in VARS {
        std::env::set_var(name, value);
    }
    let loaded = ChainConfig::load();
    for (name, _) in VARS {
        std::env::remove_var(name);
    }

    let config = loaded.unwrap();
    assert_eq!(config.execution.order, ExecutionOrder::Lexicographic);
    assert_eq!(config.execution.status_policy, StatusPolicy::Advance);
    assert!(config.execution.forward_options);
    assert_eq!(config.observability.log_level, "info");

    let registry: Registry<u8, String> = Registry::from_config(0, &config);
    registry.register("b", |_| Ok(2));
    registry.register("a", |_| Ok(1));
    assert_eq!(registry.build().unwrap(), 2);
    assert_eq!(registry.current_status(), 2);
}
