// Build pass - invokes a snapshot of the registry in order and stops at the first failure

use chrono::Utc;
use tracing::{debug, info, warn};
use crate::chain::types::{option, ActionEntry, ActionOption, BuildOutcome, BuildReport};
use crate::telemetry::{create_build_span, generate_correlation_id};

/// One pass over a fixed list of entries.
///
/// The entries are a snapshot taken under the registry's read lock, so the
/// pass itself holds no lock while actions run.
pub(crate) struct BuildPass<S, E> {
    pass_id: String,
    seed: S,
    entries: Vec<ActionEntry<S, E>>,
    forward_options: bool,
}

impl<S, E> BuildPass<S, E> {
    pub(crate) fn new(seed: S, entries: Vec<ActionEntry<S, E>>, forward_options: bool) -> Self {
        Self {
            pass_id: generate_correlation_id(),
            seed,
            entries,
            forward_options,
        }
    }

    pub(crate) fn run(self) -> BuildReport<S, E> {
        let BuildPass {
            pass_id,
            seed,
            entries,
            forward_options,
        } = self;

        let span = create_build_span(&pass_id, entries.len());
        let _guard = span.enter();

        let started_at = Utc::now();
        let mut statuses = Vec::with_capacity(entries.len());
        let mut invoked = Vec::with_capacity(entries.len());

        for entry in entries {
            let args = arguments(&entry, forward_options);
            debug!(action = %entry.key, options = args.len(), "invoking action");
            invoked.push(entry.key.clone());

            match (entry.callable)(&args) {
                Ok(status) => statuses.push(status),
                Err(error) => {
                    warn!(
                        action = %entry.key,
                        succeeded = statuses.len(),
                        "action failed, aborting build pass"
                    );
                    return BuildReport {
                        pass_id,
                        seed,
                        statuses,
                        invoked,
                        started_at,
                        finished_at: Utc::now(),
                        outcome: BuildOutcome::Aborted {
                            key: entry.key,
                            error,
                        },
                    };
                }
            }
        }

        info!(actions = invoked.len(), "build pass completed");
        BuildReport {
            pass_id,
            seed,
            statuses,
            invoked,
            started_at,
            finished_at: Utc::now(),
            outcome: BuildOutcome::Completed,
        }
    }
}

/// The key always comes first; registered options follow only when forwarding is on.
fn arguments<S, E>(entry: &ActionEntry<S, E>, forward_options: bool) -> Vec<ActionOption> {
    let mut args: Vec<ActionOption> = Vec::with_capacity(1 + entry.options.len());
    args.push(option(entry.key.clone()));
    if forward_options {
        args.extend(entry.options.iter().cloned());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::{invoked_key, ActionFn};
    use std::sync::{Arc, Mutex};

    fn entry(key: &str, result: Result<i32, String>) -> ActionEntry<i32, String> {
        ActionEntry {
            key: key.to_string(),
            callable: Arc::new(move |_: &[ActionOption]| result.clone()),
            options: Vec::new(),
        }
    }

    #[test]
    fn test_empty_pass_returns_seed() {
        let report = BuildPass::<i32, String>::new(7, Vec::new(), false).run();

        assert!(report.is_completed());
        assert!(report.invoked.is_empty());
        assert_eq!(*report.status(), 7);
        assert_eq!(report.into_result().unwrap(), 7);
    }

    #[test]
    fn test_statuses_accumulate_after_seed() {
        let report = BuildPass::new(0, vec![entry("a", Ok(1)), entry("b", Ok(2))], false).run();

        assert_eq!(report.trail().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(report.invoked, vec!["a", "b"]);
        assert!(report.finished_at >= report.started_at);
        assert!(uuid::Uuid::parse_str(&report.pass_id).is_ok());
    }

    #[test]
    fn test_failure_stops_the_pass() {
        let report = BuildPass::new(
            0,
            vec![
                entry("a", Ok(1)),
                entry("b", Err("boom".to_string())),
                entry("c", Ok(3)),
            ],
            false,
        )
        .run();

        assert_eq!(report.invoked, vec!["a", "b"]);
        assert_eq!(
            report.outcome,
            BuildOutcome::Aborted {
                key: "b".to_string(),
                error: "boom".to_string()
            }
        );

        let (status, error) = report.into_result().unwrap_err().into_parts();
        assert_eq!(status, 1);
        assert_eq!(error, "boom");
    }

    #[test]
    fn test_report_serializes_with_tagged_outcome() {
        let report = BuildPass::new(
            0,
            vec![entry("a", Ok(1)), entry("b", Err("boom".to_string()))],
            false,
        )
        .run();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pass_id"], report.pass_id.as_str());
        assert_eq!(json["statuses"], serde_json::json!([1]));
        assert_eq!(json["invoked"], serde_json::json!(["a", "b"]));
        assert_eq!(
            json["outcome"],
            serde_json::json!({ "type": "aborted", "key": "b", "error": "boom" })
        );
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn test_key_is_sole_argument_unless_forwarding() {
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let callable: ActionFn<i32, String> = Arc::new(move |opts: &[ActionOption]| {
            assert_eq!(invoked_key(opts), Some("with-opts"));
            recorder.lock().unwrap().push(opts.len());
            Ok(1)
        });
        let make = || ActionEntry {
            key: "with-opts".to_string(),
            callable: Arc::clone(&callable),
            options: vec![option(10u8), option("extra")],
        };

        BuildPass::new(0, vec![make()], false).run();
        BuildPass::new(0, vec![make()], true).run();

        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }
}
