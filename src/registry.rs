//! In-memory task registry shared by request handlers, download tasks and the sweeper.
//!
//! All access goes through a single `std::sync::Mutex`. The lock is only held
//! for the duration of a map operation and never across an `.await`, so a
//! blocking mutex is the right tool here. Reads hand out clones; callers never
//! observe a record while another thread is halfway through updating it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{Task, TaskId, TaskStatus, TaskUpdate};

/// Outcome of an atomic admission attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The task was inserted
    Admitted,
    /// The ceiling was reached; nothing was inserted
    Busy {
        /// Active tasks at the time of the check
        active: usize,
        /// Configured ceiling
        limit: usize,
    },
}

/// Map of task id to task record
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself intact (every
    // mutation is a single insert/merge/remove), so the guard is recovered.
    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new record. Returns `false` and leaves the registry untouched
    /// if the id is already present.
    pub fn create(&self, id: TaskId, task: Task) -> bool {
        let mut tasks = self.lock();
        if tasks.contains_key(&id) {
            return false;
        }
        tasks.insert(id, task);
        true
    }

    /// Count active tasks and insert under the same lock acquisition
    pub fn admit(&self, id: TaskId, task: Task, limit: usize) -> Admission {
        let mut tasks = self.lock();
        let active = tasks.values().filter(|t| t.status.is_active()).count();
        if active >= limit {
            return Admission::Busy { active, limit };
        }
        tasks.insert(id, task);
        Admission::Admitted
    }

    /// Snapshot of a single record
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.lock().get(id).cloned()
    }

    /// Merge an update into an existing, non-terminal record.
    ///
    /// Returns whether the update was applied. Absent ids are never
    /// resurrected, and records that already reached `ready`, `error` or
    /// `cancelled` keep their final state.
    pub fn update(&self, id: &TaskId, update: TaskUpdate) -> bool {
        let mut tasks = self.lock();
        match tasks.get_mut(id) {
            Some(task) if task.status.is_active() => {
                task.merge(update);
                true
            }
            _ => false,
        }
    }

    /// Remove a record, returning it if present
    pub fn remove(&self, id: &TaskId) -> Option<Task> {
        self.lock().remove(id)
    }

    /// Number of records in `starting`, `downloading` or `processing`
    pub fn count_active(&self) -> usize {
        self.lock()
            .values()
            .filter(|t| t.status.is_active())
            .count()
    }

    /// Move an active task to `cancelled`.
    ///
    /// Returns the status the task had before the call, or `None` if the id
    /// is unknown. A terminal status is returned unchanged.
    pub fn cancel(&self, id: &TaskId) -> Option<TaskStatus> {
        let mut tasks = self.lock();
        let task = tasks.get_mut(id)?;
        let previous = task.status;
        if previous.is_active() {
            task.status = TaskStatus::Cancelled;
            task.speed.clear();
            task.eta.clear();
            task.message = "cancelled".to_string();
        }
        Some(previous)
    }

    /// Clone of every record, for the sweeper
    pub fn snapshot(&self) -> Vec<(TaskId, Task)> {
        self.lock()
            .iter()
            .map(|(id, task)| (id.clone(), task.clone()))
            .collect()
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry holds no records
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
