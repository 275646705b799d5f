//! In-memory store backend.
//!
//! Backs embedded deployments and tests. Interior mutability through a
//! single `parking_lot::RwLock` per table makes `record_run` an atomic
//! read-modify-write, matching the conditional-update semantics the
//! durable backend provides.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{ResultBatch, ResultKey, ScheduleStore, StoreError, MAX_BATCH_WRITE};
use crate::scheduler::{ExecutionResult, Schedule};

type ScheduleKey = (String, String);
type ResultSortKey = (DateTime<Utc>, String);

/// In-memory [`ScheduleStore`] implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduleStore {
    schedules: Arc<RwLock<HashMap<ScheduleKey, Schedule>>>,
    results: Arc<RwLock<HashMap<String, BTreeMap<ResultSortKey, ExecutionResult>>>>,
}

impl InMemoryScheduleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn put_schedule(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let mut schedules = self.schedules.write();
        schedules.insert(
            (schedule.owner_id.clone(), schedule.schedule_id.clone()),
            schedule.clone(),
        );
        Ok(())
    }

    async fn get_schedule(
        &self,
        owner_id: &str,
        schedule_id: &str,
    ) -> Result<Option<Schedule>, StoreError> {
        let schedules = self.schedules.read();
        Ok(schedules
            .get(&(owner_id.to_string(), schedule_id.to_string()))
            .cloned())
    }

    async fn list_schedules(&self, owner_id: &str) -> Result<Vec<Schedule>, StoreError> {
        let schedules = self.schedules.read();
        let mut owned: Vec<Schedule> = schedules
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn delete_schedule(
        &self,
        owner_id: &str,
        schedule_id: &str,
    ) -> Result<bool, StoreError> {
        let mut schedules = self.schedules.write();
        Ok(schedules
            .remove(&(owner_id.to_string(), schedule_id.to_string()))
            .is_some())
    }

    async fn list_active(&self) -> Result<Vec<Schedule>, StoreError> {
        let schedules = self.schedules.read();
        Ok(schedules.values().filter(|s| s.is_active).cloned().collect())
    }

    async fn put_result(&self, result: &ExecutionResult) -> Result<(), StoreError> {
        let mut results = self.results.write();
        results
            .entry(result.schedule_id.clone())
            .or_default()
            .insert(
                (result.executed_at, result.result_id.clone()),
                result.clone(),
            );
        Ok(())
    }

    async fn query_results(
        &self,
        schedule_id: &str,
        limit: usize,
        start_after: Option<&ResultKey>,
    ) -> Result<ResultBatch, StoreError> {
        let results = self.results.read();
        let Some(history) = results.get(schedule_id) else {
            return Ok(ResultBatch {
                items: Vec::new(),
                last_key: None,
            });
        };

        // Keys ascend chronologically; walk them backwards for
        // most-recent-first. An exclusive start key bounds the range so a
        // resumed page picks up with the next-older result.
        let mut iter: Box<dyn Iterator<Item = (&ResultSortKey, &ExecutionResult)> + '_> =
            match start_after {
                Some(key) => Box::new(
                    history
                        .range(..(key.executed_at, key.result_id.clone()))
                        .rev(),
                ),
                None => Box::new(history.iter().rev()),
            };

        let mut items = Vec::new();
        for (_, result) in iter.by_ref() {
            items.push(result.clone());
            if items.len() == limit {
                break;
            }
        }

        let last_key = if iter.next().is_some() {
            items.last().map(ResultKey::of)
        } else {
            None
        };

        Ok(ResultBatch { items, last_key })
    }

    async fn list_result_keys(&self, schedule_id: &str) -> Result<Vec<ResultKey>, StoreError> {
        let results = self.results.read();
        Ok(results
            .get(schedule_id)
            .map(|history| history.values().map(ResultKey::of).collect())
            .unwrap_or_default())
    }

    async fn delete_results(
        &self,
        schedule_id: &str,
        keys: &[ResultKey],
    ) -> Result<(), StoreError> {
        if keys.len() > MAX_BATCH_WRITE {
            return Err(StoreError::BatchTooLarge(keys.len()));
        }

        let mut results = self.results.write();
        if let Some(history) = results.get_mut(schedule_id) {
            for key in keys {
                history.remove(&(key.executed_at, key.result_id.clone()));
            }
            if history.is_empty() {
                results.remove(schedule_id);
            }
        }
        Ok(())
    }

    async fn record_run(
        &self,
        owner_id: &str,
        schedule_id: &str,
        executed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut schedules = self.schedules.write();
        match schedules.get_mut(&(owner_id.to_string(), schedule_id.to_string())) {
            Some(schedule) => {
                schedule.last_run_at = Some(executed_at);
                schedule.run_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{Frequency, RunStatus};

    fn schedule(owner: &str, id: &str) -> Schedule {
        let now = Utc::now();
        Schedule {
            schedule_id: id.to_string(),
            owner_id: owner.to_string(),
            recipient_email: None,
            prompt: "p".to_string(),
            frequency: Frequency::Daily,
            time: "09:00".to_string(),
            days: Vec::new(),
            end_date: None,
            notify_by_email: false,
            is_active: true,
            run_count: 0,
            last_run_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn result(schedule_id: &str, id: &str, at: DateTime<Utc>) -> ExecutionResult {
        ExecutionResult {
            result_id: id.to_string(),
            schedule_id: schedule_id.to_string(),
            prompt: "p".to_string(),
            response: "r".to_string(),
            status: RunStatus::Success,
            error: None,
            email_sent: false,
            executed_at: at,
            duration_ms: 1,
        }
    }

    #[tokio::test]
    async fn schedules_are_scoped_to_their_owner() {
        let store = InMemoryScheduleStore::new();
        store.put_schedule(&schedule("alice", "s-1")).await.unwrap();

        assert!(store.get_schedule("alice", "s-1").await.unwrap().is_some());
        assert!(store.get_schedule("bob", "s-1").await.unwrap().is_none());
        assert_eq!(store.list_schedules("bob").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn query_results_pages_without_gaps_or_duplicates() {
        let store = InMemoryScheduleStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let at = base + chrono::Duration::seconds(i);
            store.put_result(&result("s-1", &format!("r-{i}"), at)).await.unwrap();
        }

        let first = store.query_results("s-1", 2, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].result_id, "r-4");
        let key = first.last_key.expect("more pages remain");

        let second = store.query_results("s-1", 3, Some(&key)).await.unwrap();
        assert_eq!(second.items.len(), 3);
        assert_eq!(second.items[0].result_id, "r-2");
        assert!(second.last_key.is_none());

        let mut seen: Vec<String> = first
            .items
            .iter()
            .chain(second.items.iter())
            .map(|r| r.result_id.clone())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn record_run_is_safe_under_concurrent_executions() {
        let store = Arc::new(InMemoryScheduleStore::new());
        store.put_schedule(&schedule("alice", "s-1")).await.unwrap();

        let now = Utc::now();
        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.record_run("alice", "s-1", now).await })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.record_run("alice", "s-1", now).await })
        };
        assert!(a.await.unwrap().unwrap());
        assert!(b.await.unwrap().unwrap());

        let stored = store.get_schedule("alice", "s-1").await.unwrap().unwrap();
        assert_eq!(stored.run_count, 2);
        assert_eq!(stored.last_run_at, Some(now));
    }

    #[tokio::test]
    async fn record_run_tolerates_a_deleted_schedule() {
        let store = InMemoryScheduleStore::new();
        let updated = store.record_run("alice", "gone", Utc::now()).await.unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn delete_results_enforces_the_batch_limit() {
        let store = InMemoryScheduleStore::new();
        let keys: Vec<ResultKey> = (0..26)
            .map(|i| ResultKey {
                executed_at: Utc::now(),
                result_id: format!("r-{i}"),
            })
            .collect();

        let err = store.delete_results("s-1", &keys).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge(26)));
    }
}
