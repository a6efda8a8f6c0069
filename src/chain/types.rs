// Core data types for the action chain
// Statuses and errors belong to the caller; options are opaque shared values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Opaque extra argument handed to an action. Never inspected by the chain.
pub type ActionOption = Arc<dyn Any + Send + Sync>;

/// A registered unit of work: receives its option list, yields a status or fails.
pub type ActionFn<S, E> = Arc<dyn Fn(&[ActionOption]) -> Result<S, E> + Send + Sync>;

/// Wrap any value as an [`ActionOption`].
pub fn option<T: Any + Send + Sync>(value: T) -> ActionOption {
    Arc::new(value)
}

/// The key a build pass passes as the first option of every invocation.
pub fn invoked_key(options: &[ActionOption]) -> Option<&str> {
    options
        .first()?
        .downcast_ref::<String>()
        .map(String::as_str)
}

/// Order in which a build pass walks the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrder {
    /// First registration of a key fixes its position.
    #[default]
    Registration,
    /// Keys sorted by byte order.
    Lexicographic,
}

/// Whether a successful build pass becomes the seed of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Every pass starts from the registry's current status, which builds never touch.
    #[default]
    Reseed,
    /// A completed pass writes its final status back. Aborted passes never do.
    Advance,
}

/// One registered action.
pub struct ActionEntry<S, E> {
    pub key: String,
    pub callable: ActionFn<S, E>,
    /// Append-only; survives re-registration of the key.
    pub options: Vec<ActionOption>,
}

impl<S, E> Clone for ActionEntry<S, E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            callable: Arc::clone(&self.callable),
            options: self.options.clone(),
        }
    }
}

impl<S, E> fmt::Debug for ActionEntry<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEntry")
            .field("key", &self.key)
            .field("options", &self.options.len())
            .finish_non_exhaustive()
    }
}

/// A build pass stopped at a failing action.
///
/// `status` is the last status produced before the failure (the seed when the
/// first action failed). `error` is exactly what the action returned.
#[derive(Debug, Error)]
#[error("action `{key}` aborted the build pass")]
pub struct Aborted<S, E> {
    pub key: String,
    pub status: S,
    #[source]
    pub error: E,
}

impl<S, E> Aborted<S, E> {
    /// The `(status, error)` pair of the failed pass.
    pub fn into_parts(self) -> (S, E) {
        (self.status, self.error)
    }

    pub fn into_error(self) -> E {
        self.error
    }
}

/// How a build pass ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildOutcome<E> {
    Completed,
    Aborted { key: String, error: E },
}

/// Full record of one build pass. Serializable when the status and error types are.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport<S, E> {
    /// Correlation id shared with the pass's tracing span.
    pub pass_id: String,
    pub seed: S,
    /// Statuses produced by successful actions, in invocation order.
    pub statuses: Vec<S>,
    /// Keys invoked in order, including the one that failed.
    pub invoked: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: BuildOutcome<E>,
}

impl<S, E> BuildReport<S, E> {
    /// Most recently accumulated status.
    pub fn status(&self) -> &S {
        self.statuses.last().unwrap_or(&self.seed)
    }

    /// Seed followed by every produced status.
    pub fn trail(&self) -> impl Iterator<Item = &S> {
        std::iter::once(&self.seed).chain(self.statuses.iter())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, BuildOutcome::Completed)
    }

    /// Reduce the report to the `(status, error)` contract of a build.
    pub fn into_result(self) -> Result<S, Aborted<S, E>> {
        let mut statuses = self.statuses;
        let status = statuses.pop().unwrap_or(self.seed);
        match self.outcome {
            BuildOutcome::Completed => Ok(status),
            BuildOutcome::Aborted { key, error } => Err(Aborted { key, status, error }),
        }
    }
}
