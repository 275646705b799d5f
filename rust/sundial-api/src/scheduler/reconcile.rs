//! Trigger reconciliation.
//!
//! The store and the trigger service share no transaction, so trigger
//! updates after creation are best-effort and can drift. This pass walks
//! the active-schedule index, re-derives the expected trigger definition
//! from each Schedule record, and repairs whatever diverged: a missing
//! trigger is recreated, a stale one rewritten. The store is never
//! written; it is the authority being projected.

use serde::Serialize;

use super::cadence::build_trigger_expression;
use super::manager::ScheduleManager;
use crate::error::ApiError;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Active schedules examined.
    pub examined: usize,
    /// Missing triggers recreated.
    pub recreated: usize,
    /// Drifted triggers rewritten.
    pub repaired: usize,
    /// Schedules skipped because the trigger service failed.
    pub failed: usize,
}

/// Re-derive trigger state from the Schedule Store and repair drift.
///
/// Per-schedule failures are logged and counted rather than aborting the
/// pass; the next run picks them up again.
pub async fn reconcile_triggers(manager: &ScheduleManager) -> Result<ReconcileReport, ApiError> {
    let mut report = ReconcileReport::default();

    for schedule in manager.active_schedules().await? {
        report.examined += 1;

        let expression =
            match build_trigger_expression(schedule.frequency, &schedule.time, &schedule.days) {
                Ok(expression) => expression,
                Err(err) => {
                    // A stored record that no longer translates is operator
                    // territory; nothing safe to project.
                    tracing::error!(
                        schedule_id = %schedule.schedule_id,
                        error = %err,
                        "Stored schedule has an untranslatable cadence"
                    );
                    report.failed += 1;
                    continue;
                }
            };
        let expected = manager.trigger_definition(&schedule, expression);

        let outcome = match manager.triggers().get(&expected.name).await {
            Ok(None) => {
                tracing::warn!(
                    schedule_id = %schedule.schedule_id,
                    trigger = %expected.name,
                    "Trigger missing; recreating"
                );
                manager
                    .triggers()
                    .create(&expected)
                    .await
                    .map(|()| report.recreated += 1)
            }
            Ok(Some(actual)) if actual != expected => {
                tracing::info!(
                    schedule_id = %schedule.schedule_id,
                    trigger = %expected.name,
                    "Trigger drifted; rewriting"
                );
                manager
                    .triggers()
                    .update(&expected)
                    .await
                    .map(|()| report.repaired += 1)
            }
            Ok(Some(_)) => Ok(()),
            Err(err) => Err(err),
        };

        if let Err(err) = outcome {
            tracing::warn!(
                schedule_id = %schedule.schedule_id,
                error = %err,
                "Trigger repair failed"
            );
            report.failed += 1;
        }
    }

    tracing::info!(
        examined = report.examined,
        recreated = report.recreated,
        repaired = report.repaired,
        failed = report.failed,
        "Reconciliation pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::manager::NewSchedule;
    use crate::scheduler::Frequency;
    use crate::store::{InMemoryScheduleStore, ScheduleStore};
    use crate::trigger::{trigger_name, InMemoryTriggerService, TriggerService};
    use std::sync::Arc;

    fn new_daily() -> NewSchedule {
        NewSchedule {
            prompt: "digest".to_string(),
            frequency: Frequency::Daily,
            time: "07:30".to_string(),
            days: Vec::new(),
            end_date: None,
            notify_by_email: false,
        }
    }

    fn fixture() -> (
        ScheduleManager,
        Arc<InMemoryScheduleStore>,
        Arc<InMemoryTriggerService>,
    ) {
        let store = Arc::new(InMemoryScheduleStore::new());
        let triggers = Arc::new(InMemoryTriggerService::new());
        let manager = ScheduleManager::new(
            Arc::clone(&store) as Arc<dyn ScheduleStore>,
            Arc::clone(&triggers) as Arc<dyn TriggerService>,
            "UTC",
        );
        (manager, store, triggers)
    }

    #[tokio::test]
    async fn a_clean_projection_changes_nothing() {
        let (manager, _store, _triggers) = fixture();
        manager.create("alice", None, new_daily()).await.unwrap();

        let report = reconcile_triggers(&manager).await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.recreated, 0);
        assert_eq!(report.repaired, 0);
    }

    #[tokio::test]
    async fn a_missing_trigger_is_recreated() {
        let (manager, _store, triggers) = fixture();
        let schedule = manager.create("alice", None, new_daily()).await.unwrap();
        triggers
            .delete(&trigger_name(&schedule.schedule_id))
            .await
            .unwrap();

        let report = reconcile_triggers(&manager).await.unwrap();
        assert_eq!(report.recreated, 1);
        assert!(triggers
            .get(&trigger_name(&schedule.schedule_id))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn a_drifted_trigger_is_rewritten() {
        let (manager, _store, triggers) = fixture();
        let schedule = manager.create("alice", None, new_daily()).await.unwrap();

        // Drift: the trigger service lost the enabled flag.
        triggers
            .set_enabled(&trigger_name(&schedule.schedule_id), false)
            .await
            .unwrap();

        let report = reconcile_triggers(&manager).await.unwrap();
        assert_eq!(report.repaired, 1);
        assert!(triggers
            .get(&trigger_name(&schedule.schedule_id))
            .await
            .unwrap()
            .unwrap()
            .enabled);
    }

    #[tokio::test]
    async fn paused_schedules_are_not_examined() {
        let (manager, _store, _triggers) = fixture();
        let schedule = manager.create("alice", None, new_daily()).await.unwrap();
        manager.toggle("alice", &schedule.schedule_id).await.unwrap();

        let report = reconcile_triggers(&manager).await.unwrap();
        assert_eq!(report.examined, 0);
    }
}
