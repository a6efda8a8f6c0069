// Action registry - keyed actions and their options behind one reader/writer lock
// Mutations take the write side; build passes snapshot under the read side

use indexmap::map::Entry;
use indexmap::IndexMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::chain::builder::BuildPass;
use crate::chain::traits::ActionChain;
use crate::chain::types::{
    Aborted, ActionEntry, ActionFn, ActionOption, BuildReport, ExecutionOrder, StatusPolicy,
};
use crate::config::{ChainConfig, ExecutionConfig};

struct RegistryState<S, E> {
    /// Created on first registration.
    entries: Option<IndexMap<String, ActionEntry<S, E>>>,
    current_status: S,
}

/// Thread-safe collection of named actions.
///
/// Keys are unique: registering an existing key replaces its callable in place,
/// keeps its position in registration order and keeps the options accumulated so
/// far. Entries are never removed.
///
/// ```
/// use action_chain::Registry;
///
/// let registry: Registry<u32, String> = Registry::with_status(0);
/// registry.register("fetch", |_| Ok(1));
/// registry.register("verify", |_| Ok(2));
/// assert_eq!(registry.build().unwrap(), 2);
/// ```
pub struct Registry<S, E> {
    state: RwLock<RegistryState<S, E>>,
    settings: ExecutionConfig,
}

impl<S, E> Registry<S, E> {
    /// Empty registry seeded with `status`, using default execution settings.
    pub fn with_status(status: S) -> Self {
        Self::with_settings(status, ExecutionConfig::default())
    }

    /// Empty registry seeded with `status`, using explicit execution settings.
    pub fn with_settings(status: S, settings: ExecutionConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                entries: None,
                current_status: status,
            }),
            settings,
        }
    }

    /// Empty registry using the execution section of a loaded configuration.
    pub fn from_config(status: S, config: &ChainConfig) -> Self {
        Self::with_settings(status, config.execution.clone())
    }

    /// Empty registry using the process-wide configuration from [`crate::config::config`].
    pub fn from_global_config(status: S) -> anyhow::Result<Self> {
        Ok(Self::from_config(status, crate::config::config()?))
    }

    /// Execution settings this registry was built with.
    pub fn settings(&self) -> &ExecutionConfig {
        &self.settings
    }

    // A panicking writer can only poison the lock between complete mutations,
    // so the state behind a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState<S, E>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState<S, E>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace the action under `key`.
    pub fn register<F>(&self, key: impl Into<String>, callable: F)
    where
        F: Fn(&[ActionOption]) -> Result<S, E> + Send + Sync + 'static,
    {
        self.insert(key.into(), Arc::new(callable), Vec::new());
    }

    /// Add or replace the action under `key` and append `options` to its list.
    pub fn register_with_options<F, I>(&self, key: impl Into<String>, callable: F, options: I)
    where
        F: Fn(&[ActionOption]) -> Result<S, E> + Send + Sync + 'static,
        I: IntoIterator<Item = ActionOption>,
    {
        self.insert(key.into(), Arc::new(callable), options.into_iter().collect());
    }

    fn insert(&self, key: String, callable: ActionFn<S, E>, options: Vec<ActionOption>) {
        let mut state = self.write();
        let entries = state.entries.get_or_insert_with(IndexMap::new);

        match entries.entry(key) {
            Entry::Occupied(mut slot) => {
                debug!(action = %slot.key(), appended = options.len(), "replacing action");
                let entry = slot.get_mut();
                entry.callable = callable;
                entry.options.extend(options);
            }
            Entry::Vacant(slot) => {
                debug!(action = %slot.key(), options = options.len(), "registering action");
                let key = slot.key().clone();
                slot.insert(ActionEntry {
                    key,
                    callable,
                    options,
                });
            }
        }
    }

    /// Append options to an already registered key. Returns `false` for an unknown key.
    pub fn add_options<I>(&self, key: &str, options: I) -> bool
    where
        I: IntoIterator<Item = ActionOption>,
    {
        let mut state = self.write();
        match state.entries.as_mut().and_then(|entries| entries.get_mut(key)) {
            Some(entry) => {
                entry.options.extend(options);
                true
            }
            None => false,
        }
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.read().entries.as_ref().map_or(0, IndexMap::len)
    }

    /// True until the first registration.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` has ever been registered.
    pub fn contains(&self, key: &str) -> bool {
        self.read()
            .entries
            .as_ref()
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// Registered keys in the order a build pass would run them.
    pub fn keys(&self) -> Vec<String> {
        let state = self.read();
        let mut keys: Vec<String> = state
            .entries
            .iter()
            .flat_map(|entries| entries.keys().cloned())
            .collect();
        if self.settings.order == ExecutionOrder::Lexicographic {
            keys.sort();
        }
        keys
    }

    /// Options accumulated for `key`, or `None` when the key was never registered.
    pub fn options(&self, key: &str) -> Option<Vec<ActionOption>> {
        self.read()
            .entries
            .as_ref()?
            .get(key)
            .map(|entry| entry.options.clone())
    }

    /// Replace the status that seeds the next build pass.
    pub fn set_current_status(&self, status: S) {
        self.write().current_status = status;
    }
}

impl<S: Clone, E> Registry<S, E> {
    /// Status that seeds the next build pass.
    pub fn current_status(&self) -> S {
        self.read().current_status.clone()
    }

    /// Seed and ordered entries, copied under the read lock.
    fn snapshot(&self) -> (S, Vec<ActionEntry<S, E>>) {
        let state = self.read();
        let mut entries: Vec<ActionEntry<S, E>> = state
            .entries
            .iter()
            .flat_map(|entries| entries.values().cloned())
            .collect();
        if self.settings.order == ExecutionOrder::Lexicographic {
            entries.sort_by(|a, b| a.key.cmp(&b.key));
        }
        (state.current_status.clone(), entries)
    }

    /// Run one build pass and return its full report.
    ///
    /// Actions run without any registry lock held; an action may register
    /// further actions, which take effect from the next pass.
    pub fn build_report(&self) -> BuildReport<S, E> {
        let (seed, entries) = self.snapshot();
        let report = BuildPass::new(seed, entries, self.settings.forward_options).run();

        if self.settings.status_policy == StatusPolicy::Advance && report.is_completed() {
            self.set_current_status(report.status().clone());
        }
        report
    }

    /// Run one build pass: the last status on success, or the status before the
    /// failing action together with its error.
    pub fn build(&self) -> Result<S, Aborted<S, E>> {
        self.build_report().into_result()
    }
}

impl<S: Default, E> Default for Registry<S, E> {
    fn default() -> Self {
        Self::with_status(S::default())
    }
}

impl<S: Clone, E> ActionChain<S, E> for Registry<S, E> {
    fn add_action(&self, key: &str, callable: ActionFn<S, E>, options: Vec<ActionOption>) {
        self.insert(key.to_string(), callable, options);
    }

    fn build(&self) -> Result<S, Aborted<S, E>> {
        Registry::build(self)
    }
}
