//! Process-wide supervisor slots keyed by deployment instance.
//!
//! Application code that is torn down and rebuilt inside one OS process
//! (tests, embedded reloads) reattaches to the same supervisor, child and
//! log buffer instead of spawning a second server.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use tracing::{debug, info};

use super::launch::LaunchSpec;
use super::supervisor::ProcessSupervisor;

static GLOBAL: LazyLock<SupervisorRegistry> = LazyLock::new(SupervisorRegistry::new);

#[derive(Default)]
pub struct SupervisorRegistry {
    supervisors: Mutex<HashMap<String, Arc<ProcessSupervisor>>>,
}

impl SupervisorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by everything in this OS process
    pub fn global() -> &'static SupervisorRegistry {
        &GLOBAL
    }

    /// Existing supervisor for `instance`, or a new one built from `launch`.
    /// The launch spec is ignored when the instance already exists.
    pub fn get_or_create(
        &self,
        instance: &str,
        launch: LaunchSpec,
        log_capacity: usize,
    ) -> Arc<ProcessSupervisor> {
        let mut supervisors = self.lock();
        if let Some(existing) = supervisors.get(instance) {
            debug!("Reattaching to supervisor for instance '{}'", instance);
            return existing.clone();
        }

        info!("Creating supervisor for instance '{}'", instance);
        let supervisor = Arc::new(ProcessSupervisor::new(launch, log_capacity));
        supervisors.insert(instance.to_string(), supervisor.clone());
        supervisor
    }

    pub fn get(&self, instance: &str) -> Option<Arc<ProcessSupervisor>> {
        self.lock().get(instance).cloned()
    }

    /// Forget an instance. A running child keeps running until the last handle is dropped.
    pub fn remove(&self, instance: &str) -> Option<Arc<ProcessSupervisor>> {
        self.lock().remove(instance)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<ProcessSupervisor>>> {
        self.supervisors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
