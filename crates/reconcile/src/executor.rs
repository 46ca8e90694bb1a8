//! Execution engine - applies a plan through a reconciler
//!
//! Entries run one at a time, in plan order, against a single channel.
//! A failed entry is reported and the remaining entries still run. The
//! record map is updated as each entry succeeds so that the caller can
//! persist exactly what reached the world.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::model::{Record, ResourceSpec};
use crate::plan::{Action, Plan, PlannedChange};
use crate::reconciler::Reconciler;
use crate::types::{ApplyResult, ExecuteSummary};
use anyhow::Result;
use std::collections::BTreeMap;

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `reconciler` - Reconciler bound to a provider config and channel
/// * `plan` - The plan to run
/// * `records` - Recorded state, updated in place as entries are applied
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
///
/// # Returns
/// Summary of execution results
pub fn execute<P, C>(
    reconciler: &Reconciler<'_>,
    plan: &Plan,
    records: &mut BTreeMap<String, Record>,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let pending: Vec<&PlannedChange> = plan.pending().collect();
    let mut summary = ExecuteSummary {
        no_change: plan.changes.len() - pending.len(),
        ..Default::default()
    };

    if pending.is_empty() {
        return Ok(summary);
    }

    let prompt = format!("Apply {} change(s)?", pending.len());
    if !confirm.confirm(&prompt)? {
        summary.skipped += pending.len();
        return Ok(summary);
    }

    progress.on_start(pending.len());
    for change in pending {
        progress.on_change_start(&change.address, &change.action);
        let result = apply_change(reconciler, change, records);
        if let ApplyResult::Failed { error } = &result {
            log::error!("{}: {}", change.address, error);
        }
        progress.on_change_complete(&change.address, &result);
        summary.add_result(&result);
    }
    progress.on_finish();

    Ok(summary)
}

/// Apply one planned change, keeping `records` in step with the world
fn apply_change(
    reconciler: &Reconciler<'_>,
    change: &PlannedChange,
    records: &mut BTreeMap<String, Record>,
) -> ApplyResult {
    let address = change.address.as_str();

    let outcome = match (&change.action, &change.desired) {
        (Action::Create, Some(spec)) => reconciler
            .create(spec.clone(), None)
            .map(|record| {
                records.insert(address.to_string(), record);
                ApplyResult::Created
            }),
        (Action::Update, Some(spec)) => match records.get(address).cloned() {
            Some(prior) => match reconciler.update(&prior, spec.clone()) {
                Ok(record) => {
                    records.insert(address.to_string(), record);
                    Ok(ApplyResult::Updated)
                }
                Err(e) if e.is_replacement_required() => {
                    log::info!("{address}: {e}, replacing");
                    replace(reconciler, address, spec, records)
                }
                Err(e) => Err(e),
            },
            None => reconciler.create(spec.clone(), None).map(|record| {
                records.insert(address.to_string(), record);
                ApplyResult::Created
            }),
        },
        (Action::Replace { .. }, Some(spec)) => replace(reconciler, address, spec, records),
        (Action::Delete, _) => match records.remove(address) {
            Some(record) => reconciler.delete(record).map(|()| ApplyResult::Deleted),
            None => Ok(ApplyResult::NoChange),
        },
        (Action::NoChange, _) => Ok(ApplyResult::NoChange),
        (_, None) => Ok(ApplyResult::Skipped {
            reason: "no desired spec".into(),
        }),
    };

    outcome.unwrap_or_else(|e| ApplyResult::Failed {
        error: e.to_string(),
    })
}

/// Delete the recorded instance, then create the desired one.
///
/// The record is dropped even if the delete fails; the create is not
/// attempted in that case.
fn replace(
    reconciler: &Reconciler<'_>,
    address: &str,
    spec: &ResourceSpec,
    records: &mut BTreeMap<String, Record>,
) -> crate::error::Result<ApplyResult> {
    if let Some(prior) = records.remove(address) {
        reconciler.delete(prior)?;
    }
    let record = reconciler.create(spec.clone(), None)?;
    records.insert(address.to_string(), record);
    Ok(ApplyResult::Replaced)
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(
    reconciler: &Reconciler<'_>,
    plan: &Plan,
    records: &mut BTreeMap<String, Record>,
) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(reconciler, plan, records, &mut NoProgress, &mut AutoConfirm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::RecordingChannel;
    use crate::config::ProviderConfig;
    use crate::context::{AutoDecline, NoProgress};
    use crate::error::ChannelError;
    use crate::model::{Position, ResourceKind};

    fn config() -> ProviderConfig {
        ProviderConfig::new("localhost:25575", "secret")
    }

    fn stone(x: i64) -> ResourceSpec {
        ResourceSpec::block("minecraft:stone", Position::new(x, 64, 0))
    }

    fn manifest(entries: &[(&str, ResourceSpec)]) -> BTreeMap<String, ResourceSpec> {
        entries
            .iter()
            .map(|(address, spec)| (address.to_string(), spec.clone()))
            .collect()
    }

    #[test]
    fn test_execute_empty_plan() {
        let config = config();
        let channel = RecordingChannel::new();
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();

        let summary = execute_simple(&reconciler, &Plan::default(), &mut records).unwrap();

        assert_eq!(summary.total(), 0);
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_execute_creates_and_records() {
        let config = config();
        let channel = RecordingChannel::new();
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();
        let plan = Plan::build(&records, &manifest(&[("block.a", stone(0))]));

        let summary = execute_simple(&reconciler, &plan, &mut records).unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(records["block.a"].id.as_str(), "block-0-64-0");

        // Second run against the recorded state has nothing to do
        let plan = Plan::build(&records, &manifest(&[("block.a", stone(0))]));
        let summary = execute_simple(&reconciler, &plan, &mut records).unwrap();
        assert_eq!(summary.total_changes(), 0);
        assert_eq!(summary.no_change, 1);
        assert_eq!(channel.sent().len(), 1);
    }

    #[test]
    fn test_execute_replace_clears_then_creates() {
        let config = config();
        let channel = RecordingChannel::new();
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();
        records.insert(
            "block.a".to_string(),
            Record::new(stone(1).compute_id(), stone(1)),
        );

        let plan = Plan::build(&records, &manifest(&[("block.a", stone(2))]));
        let summary = execute_simple(&reconciler, &plan, &mut records).unwrap();

        assert_eq!(summary.replaced, 1);
        assert_eq!(records["block.a"].id.as_str(), "block-2-64-0");
        assert_eq!(
            channel.sent(),
            vec![
                "setblock 1 64 0 minecraft:air replace",
                "setblock 2 64 0 minecraft:stone replace",
            ]
        );
    }

    #[test]
    fn test_failure_does_not_stop_remaining_entries() {
        let config = config();
        let channel = RecordingChannel::failing_at(1, ChannelError::Transport("reset".into()));
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();
        let plan = Plan::build(
            &records,
            &manifest(&[("block.a", stone(0)), ("block.b", stone(1))]),
        );

        let summary = execute_simple(&reconciler, &plan, &mut records).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert!(!records.contains_key("block.a"));
        assert!(records.contains_key("block.b"));
    }

    #[test]
    fn test_failed_delete_still_drops_record() {
        let config = config();
        let channel = RecordingChannel::failing_at(1, ChannelError::Transport("reset".into()));
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();
        records.insert(
            "block.a".to_string(),
            Record::new(stone(0).compute_id(), stone(0)),
        );

        let plan = Plan::destroy(&records);
        let summary = execute_simple(&reconciler, &plan, &mut records).unwrap();

        assert_eq!(summary.failed, 1);
        assert!(records.is_empty());
    }

    #[test]
    fn test_imported_record_adopted_by_update() {
        let config = config();
        let channel = RecordingChannel::new();
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();
        records.insert(
            "block.a".to_string(),
            Reconciler::import(ResourceKind::Block, "block-0-64-0").unwrap(),
        );

        let plan = Plan::build(&records, &manifest(&[("block.a", stone(0))]));
        let summary = execute_simple(&reconciler, &plan, &mut records).unwrap();

        assert_eq!(summary.updated, 1);
        assert!(!records["block.a"].is_imported());
    }

    #[test]
    fn test_declined_confirmation_skips_everything() {
        let config = config();
        let channel = RecordingChannel::new();
        let reconciler = Reconciler::new(&config, &channel);
        let mut records = BTreeMap::new();
        let plan = Plan::build(&records, &manifest(&[("block.a", stone(0))]));

        let summary = execute(
            &reconciler,
            &plan,
            &mut records,
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(channel.sent().is_empty());
    }
}
