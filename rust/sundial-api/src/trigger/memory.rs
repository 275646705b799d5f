//! In-memory trigger service backend.
//!
//! Records trigger definitions without firing them; embedded deployments
//! and tests drive the Execution Engine through its HTTP entry point
//! instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{TriggerDefinition, TriggerError, TriggerService};

/// In-memory [`TriggerService`] implementation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTriggerService {
    triggers: Arc<RwLock<HashMap<String, TriggerDefinition>>>,
}

impl InMemoryTriggerService {
    /// Create an empty trigger service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.read().len()
    }

    /// Whether no triggers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.read().is_empty()
    }
}

#[async_trait]
impl TriggerService for InMemoryTriggerService {
    async fn create(&self, definition: &TriggerDefinition) -> Result<(), TriggerError> {
        let mut triggers = self.triggers.write();
        triggers.insert(definition.name.clone(), definition.clone());
        Ok(())
    }

    async fn update(&self, definition: &TriggerDefinition) -> Result<(), TriggerError> {
        let mut triggers = self.triggers.write();
        match triggers.get_mut(&definition.name) {
            Some(existing) => {
                *existing = definition.clone();
                Ok(())
            }
            None => Err(TriggerError::NotFound(definition.name.clone())),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), TriggerError> {
        let mut triggers = self.triggers.write();
        match triggers.remove(name) {
            Some(_) => Ok(()),
            None => Err(TriggerError::NotFound(name.to_string())),
        }
    }

    async fn get(&self, name: &str) -> Result<Option<TriggerDefinition>, TriggerError> {
        let triggers = self.triggers.read();
        Ok(triggers.get(name).cloned())
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), TriggerError> {
        let mut triggers = self.triggers.write();
        match triggers.get_mut(name) {
            Some(definition) => {
                definition.enabled = enabled;
                Ok(())
            }
            None => Err(TriggerError::NotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ExecutionInput;

    fn definition(name: &str) -> TriggerDefinition {
        TriggerDefinition {
            name: name.to_string(),
            expression: "cron(0 9 * * ? *)".to_string(),
            timezone: "UTC".to_string(),
            enabled: true,
            end_date: None,
            payload: ExecutionInput {
                schedule_id: "s-1".to_string(),
                owner_id: "u-1".to_string(),
                recipient_email: None,
                prompt: "p".to_string(),
                notify_by_email: false,
            },
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let service = InMemoryTriggerService::new();
        let def = definition("sundial-s-1");
        service.create(&def).await.unwrap();

        let fetched = service.get("sundial-s-1").await.unwrap().unwrap();
        assert_eq!(fetched, def);
    }

    #[tokio::test]
    async fn updating_a_missing_trigger_fails() {
        let service = InMemoryTriggerService::new();
        let err = service.update(&definition("ghost")).await.unwrap_err();
        assert!(matches!(err, TriggerError::NotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn set_enabled_flips_only_the_flag() {
        let service = InMemoryTriggerService::new();
        service.create(&definition("sundial-s-1")).await.unwrap();

        service.set_enabled("sundial-s-1", false).await.unwrap();
        let fetched = service.get("sundial-s-1").await.unwrap().unwrap();
        assert!(!fetched.enabled);
        assert_eq!(fetched.expression, "cron(0 9 * * ? *)");
    }

    #[tokio::test]
    async fn deleting_a_missing_trigger_reports_not_found() {
        let service = InMemoryTriggerService::new();
        let err = service.delete("ghost").await.unwrap_err();
        assert!(matches!(err, TriggerError::NotFound(_)));
    }
}
