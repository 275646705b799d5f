//! Execution engine.
//!
//! Runs once per trigger fire: call the generation backend, attempt the
//! best-effort notification, persist one immutable result, and update the
//! schedule's run statistics through a single atomic increment.
//!
//! The invoking trigger is a timer, not a caller awaiting a response, so
//! the engine is fire-and-forget: persistence failures are logged, never
//! propagated, and nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{ExecutionInput, ExecutionResult, RunStatus};
use crate::llm::GenerationClient;
use crate::mailer::Notifier;
use crate::store::ScheduleStore;

/// Summary returned to the invoker after a run completes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    /// ID of the persisted result.
    pub result_id: String,
    /// Success/failure of the generation step.
    pub status: RunStatus,
    /// Whether the notification was delivered.
    pub email_sent: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Runs scheduled prompt executions.
pub struct ExecutionEngine {
    store: Arc<dyn ScheduleStore>,
    generator: Arc<dyn GenerationClient>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine").finish()
    }
}

impl ExecutionEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        generator: Arc<dyn GenerationClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            generator,
            notifier,
        }
    }

    /// Execute one trigger fire.
    ///
    /// The generation outcome alone determines the run's status. A
    /// notification failure only clears `emailSent`. Failures writing the
    /// result or updating counters are logged and swallowed.
    pub async fn execute(&self, input: ExecutionInput) -> ExecutionReport {
        let started = Instant::now();
        let executed_at = Utc::now();
        let result_id = Uuid::new_v4().to_string();

        tracing::info!(
            schedule_id = %input.schedule_id,
            result_id = %result_id,
            "Executing scheduled prompt"
        );

        let (status, response, error) = match self.generator.generate(&input.prompt).await {
            Ok(text) => (RunStatus::Success, text, None),
            Err(err) => {
                tracing::error!(
                    schedule_id = %input.schedule_id,
                    error = %err,
                    "Generation failed"
                );
                (RunStatus::Failed, String::new(), Some(err.to_string()))
            }
        };

        // No notification for a failed run; for a successful one a delivery
        // failure must not change the run's status.
        let mut email_sent = false;
        if status == RunStatus::Success && input.notify_by_email {
            if let Some(ref recipient) = input.recipient_email {
                match self.notifier.send(recipient, &input.prompt, &response).await {
                    Ok(()) => email_sent = true,
                    Err(err) => {
                        tracing::warn!(
                            schedule_id = %input.schedule_id,
                            recipient = %recipient,
                            error = %err,
                            "Notification delivery failed"
                        );
                    }
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let result = ExecutionResult {
            result_id: result_id.clone(),
            schedule_id: input.schedule_id.clone(),
            prompt: input.prompt.clone(),
            response,
            status,
            error,
            email_sent,
            executed_at,
            duration_ms,
        };

        if let Err(err) = self.store.put_result(&result).await {
            tracing::error!(
                schedule_id = %input.schedule_id,
                result_id = %result_id,
                error = %err,
                "Failed to persist execution result"
            );
        }

        match self
            .store
            .record_run(&input.owner_id, &input.schedule_id, executed_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    schedule_id = %input.schedule_id,
                    "Schedule vanished before run accounting"
                );
            }
            Err(err) => {
                tracing::error!(
                    schedule_id = %input.schedule_id,
                    error = %err,
                    "Failed to update run statistics"
                );
            }
        }

        ExecutionReport {
            result_id,
            status,
            email_sent,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryScheduleStore;
    use crate::scheduler::{Frequency, Schedule};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct StaticGenerator {
        reply: Result<String, String>,
    }

    #[async_trait]
    impl GenerationClient for StaticGenerator {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(
            &self,
            recipient: &str,
            _prompt: &str,
            _response: &str,
        ) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("relay down");
            }
            self.sent.lock().push(recipient.to_string());
            Ok(())
        }
    }

    fn stored_schedule() -> Schedule {
        let now = Utc::now();
        Schedule {
            schedule_id: "s-1".to_string(),
            owner_id: "alice".to_string(),
            recipient_email: Some("alice@example.com".to_string()),
            prompt: "morning brief".to_string(),
            frequency: Frequency::Daily,
            time: "09:00".to_string(),
            days: Vec::new(),
            end_date: None,
            notify_by_email: true,
            is_active: true,
            run_count: 0,
            last_run_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn input() -> ExecutionInput {
        ExecutionInput {
            schedule_id: "s-1".to_string(),
            owner_id: "alice".to_string(),
            recipient_email: Some("alice@example.com".to_string()),
            prompt: "morning brief".to_string(),
            notify_by_email: true,
        }
    }

    async fn engine_with(
        reply: Result<String, String>,
        fail_notify: bool,
    ) -> (ExecutionEngine, Arc<InMemoryScheduleStore>) {
        let store = Arc::new(InMemoryScheduleStore::new());
        store.put_schedule(&stored_schedule()).await.unwrap();
        let engine = ExecutionEngine::new(
            Arc::clone(&store) as Arc<dyn ScheduleStore>,
            Arc::new(StaticGenerator { reply }),
            Arc::new(RecordingNotifier {
                fail: fail_notify,
                ..RecordingNotifier::default()
            }),
        );
        (engine, store)
    }

    #[tokio::test]
    async fn success_persists_result_and_increments_run_count() {
        let (engine, store) = engine_with(Ok("4% up".to_string()), false).await;

        let report = engine.execute(input()).await;
        assert_eq!(report.status, RunStatus::Success);
        assert!(report.email_sent);

        let batch = store.query_results("s-1", 10, None).await.unwrap();
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].response, "4% up");
        assert_eq!(batch.items[0].prompt, "morning brief");
        assert!(batch.items[0].error.is_none());

        let schedule = store.get_schedule("alice", "s-1").await.unwrap().unwrap();
        assert_eq!(schedule.run_count, 1);
        assert!(schedule.last_run_at.is_some());
    }

    #[tokio::test]
    async fn generation_failure_is_captured_not_thrown() {
        let (engine, store) = engine_with(Err("backend 500".to_string()), false).await;

        let report = engine.execute(input()).await;
        assert_eq!(report.status, RunStatus::Failed);
        assert!(!report.email_sent);

        let batch = store.query_results("s-1", 10, None).await.unwrap();
        assert_eq!(batch.items[0].status, RunStatus::Failed);
        assert_eq!(batch.items[0].response, "");
        assert!(batch.items[0].error.as_deref().unwrap().contains("backend 500"));

        // The counter moves regardless of the run's outcome.
        let schedule = store.get_schedule("alice", "s-1").await.unwrap().unwrap();
        assert_eq!(schedule.run_count, 1);
    }

    #[tokio::test]
    async fn notification_failure_never_changes_the_status() {
        let (engine, store) = engine_with(Ok("all clear".to_string()), true).await;

        let report = engine.execute(input()).await;
        assert_eq!(report.status, RunStatus::Success);
        assert!(!report.email_sent);

        let batch = store.query_results("s-1", 10, None).await.unwrap();
        assert_eq!(batch.items[0].status, RunStatus::Success);
        assert_eq!(batch.items[0].response, "all clear");
        assert!(!batch.items[0].email_sent);
    }

    #[tokio::test]
    async fn notification_is_skipped_when_disabled_or_unaddressed() {
        let (engine, _store) = engine_with(Ok("text".to_string()), false).await;

        let mut muted = input();
        muted.notify_by_email = false;
        assert!(!engine.execute(muted).await.email_sent);

        let mut anonymous = input();
        anonymous.recipient_email = None;
        assert!(!engine.execute(anonymous).await.email_sent);
    }

    #[tokio::test]
    async fn concurrent_executions_do_not_lose_counter_updates() {
        let (engine, store) = engine_with(Ok("text".to_string()), false).await;
        let engine = Arc::new(engine);

        let a = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.execute(input()).await })
        };
        let b = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.execute(input()).await })
        };
        a.await.unwrap();
        b.await.unwrap();

        let schedule = store.get_schedule("alice", "s-1").await.unwrap().unwrap();
        assert_eq!(schedule.run_count, 2);
    }

    #[tokio::test]
    async fn a_vanished_schedule_does_not_fail_the_execution() {
        let store = Arc::new(InMemoryScheduleStore::new());
        let engine = ExecutionEngine::new(
            Arc::clone(&store) as Arc<dyn ScheduleStore>,
            Arc::new(StaticGenerator {
                reply: Ok("text".to_string()),
            }),
            Arc::new(RecordingNotifier::default()),
        );

        // No schedule record exists; the result is still persisted.
        let report = engine.execute(input()).await;
        assert_eq!(report.status, RunStatus::Success);
        let batch = store.query_results("s-1", 10, None).await.unwrap();
        assert_eq!(batch.items.len(), 1);
    }
}
