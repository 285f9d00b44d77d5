use crate::error::AppError;
use crate::model::Todo;
use std::sync::{Arc, Mutex, PoisonError};

pub mod json_store;

pub use json_store::{JsonFileStorage, store_path};

/// Durable slot holding the whole to-do collection.
///
/// Implementations replace the slot wholesale on every `save`; there is no
/// partial update.
pub trait TodoStorage: Send {
    /// Returns the persisted collection, or an empty one when nothing was saved yet.
    fn load(&self) -> Result<Vec<Todo>, AppError>;

    fn save(&self, todos: &[Todo]) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    todos: Option<Vec<Todo>>,
    saves: usize,
    fail_loads: bool,
    fail_saves: bool,
}

/// In-process storage. Clones share the same slot, so a test can keep one
/// handle while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        let storage = Self::default();
        storage.lock().todos = Some(todos);
        storage
    }

    /// Makes subsequent loads fail as if the slot were unreadable.
    pub fn fail_loads(&self, fail: bool) {
        self.lock().fail_loads = fail;
    }

    /// Makes subsequent saves fail as if the device were full.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    pub fn saved(&self) -> Option<Vec<Todo>> {
        self.lock().todos.clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TodoStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<Todo>, AppError> {
        let state = self.lock();
        if state.fail_loads {
            return Err(AppError::io("memory storage is unreadable"));
        }
        Ok(state.todos.clone().unwrap_or_default())
    }

    fn save(&self, todos: &[Todo]) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.fail_saves {
            return Err(AppError::io("memory storage rejected the write"));
        }
        state.todos = Some(todos.to_vec());
        state.saves += 1;
        Ok(())
    }
}
