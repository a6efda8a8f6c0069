// Trait seam for anything that chains actions - lets callers depend on behavior, not the registry type

use crate::chain::types::{Aborted, ActionFn, ActionOption};

/// Register actions and run them in one fail-fast pass.
pub trait ActionChain<S, E> {
    /// Add or replace the action under `key`, appending `options` to its list.
    fn add_action(&self, key: &str, callable: ActionFn<S, E>, options: Vec<ActionOption>);

    /// Run every registered action once, stopping at the first failure.
    fn build(&self) -> Result<S, Aborted<S, E>>;
}
