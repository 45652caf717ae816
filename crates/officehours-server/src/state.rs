//! Application state for the API server.

use std::sync::Arc;

use officehours_core::{HolidayOracle, NoHolidays, Resolver, RuleStore};
use officehours_storage::{Database, StorageError};
use officehours_watcher::Trigger;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Rule store.
    pub store: Arc<dyn RuleStore>,
    /// Resolver over the same store.
    pub resolver: Resolver,
    /// Watcher trigger, fired after every rule mutation.
    pub trigger: Option<Trigger>,
}

impl AppState {
    /// Creates application state over a store and holiday oracle.
    pub fn new(store: Arc<dyn RuleStore>, holidays: Arc<dyn HolidayOracle>) -> Self {
        Self {
            resolver: Resolver::new(store.clone(), holidays),
            store,
            trigger: None,
        }
    }

    /// Creates application state with an in-memory database and no holidays.
    pub fn in_memory() -> Result<Self, StorageError> {
        let db = Database::in_memory()?;
        Ok(Self::new(Arc::new(db), Arc::new(NoHolidays)))
    }

    /// Wires a watcher trigger.
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Asks the watcher to re-evaluate.
    pub fn rules_changed(&self) {
        if let Some(trigger) = &self.trigger {
            trigger.fire();
        }
    }
}
