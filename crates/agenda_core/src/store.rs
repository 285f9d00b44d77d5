//! The to-do collection and its write-through persistence.
//!
//! [`TodoStore`] is the only owner of the collection. Every mutating call
//! updates memory first, then saves the whole collection before returning.
//! A failed save never fails the call: the in-memory state stays
//! authoritative and the outcome is marked [`Durability::MemoryOnly`].

use crate::config::Config;
use crate::error::AppError;
use crate::model::{Filter, Schedule, Todo, normalize_date, normalize_text};
use crate::notify::NotificationPort;
use crate::reminder::ReminderScheduler;
use crate::storage::TodoStorage;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;

/// Whether the save that followed a mutation reached storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    Durable,
    /// Applied in memory only; the save failed with the carried error.
    MemoryOnly(AppError),
}

impl Durability {
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable)
    }
}

/// Result of a mutating store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub durability: Durability,
}

impl<T> Outcome<T> {
    fn durable(value: T) -> Self {
        Self {
            value,
            durability: Durability::Durable,
        }
    }
}

pub struct TodoStore {
    todos: Vec<Todo>,
    storage: Box<dyn TodoStorage>,
    reminders: ReminderScheduler,
    require_schedule: bool,
    last_id: u64,
    load_error: Option<AppError>,
}

impl TodoStore {
    /// An empty store; call [`TodoStore::load`] once before use.
    pub fn new(
        storage: Box<dyn TodoStorage>,
        reminders: ReminderScheduler,
        require_schedule: bool,
    ) -> Self {
        Self {
            todos: Vec::new(),
            storage,
            reminders,
            require_schedule,
            last_id: 0,
            load_error: None,
        }
    }

    /// Builds and loads a store the way the application does at startup.
    pub fn open(
        config: &Config,
        storage: Box<dyn TodoStorage>,
        port: Box<dyn NotificationPort>,
    ) -> Self {
        let reminders = if config.reminders_enabled {
            ReminderScheduler::new(port, config.reminder_delay())
        } else {
            ReminderScheduler::disabled()
        };
        let mut store = Self::new(storage, reminders, config.require_schedule);
        store.load();
        store
    }

    /// Replaces the in-memory collection with the persisted one.
    ///
    /// An unreadable slot leaves the store empty; the error is logged and kept
    /// for [`TodoStore::load_error`]. Returns the number of loaded records.
    pub fn load(&mut self) -> usize {
        match self.storage.load() {
            Ok(todos) => {
                self.todos = todos;
                self.load_error = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load todos, starting empty");
                self.todos = Vec::new();
                self.load_error = Some(err);
            }
        }

        self.last_id = self
            .todos
            .iter()
            .filter_map(|todo| todo.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.todos.len()
    }

    pub fn load_error(&self) -> Option<&AppError> {
        self.load_error.as_ref()
    }

    pub fn requires_schedule(&self) -> bool {
        self.require_schedule
    }

    pub fn reminders(&self) -> &ReminderScheduler {
        &self.reminders
    }

    /// The collection, newest first.
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        let id = id.trim();
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn create(
        &mut self,
        text: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Outcome<Todo>, AppError> {
        let text = normalize_text(text)?;
        let schedule = Schedule::from_input(date, time, self.require_schedule)?;

        let todo = Todo {
            id: self.next_id(),
            text,
            completed: false,
            date: schedule.date,
            time: schedule.time,
        };
        self.todos.insert(0, todo.clone());
        tracing::debug!(todo_id = %todo.id, "created todo");

        let durability = self.persist();
        self.reminders.schedule_reminder(&todo.text);

        Ok(Outcome {
            value: todo,
            durability,
        })
    }

    /// Rewrites text and schedule of an existing to-do.
    ///
    /// `date`/`time` left as `None` keep their current values. An unknown id
    /// yields `None` and nothing is saved.
    pub fn update(
        &mut self,
        id: &str,
        text: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Outcome<Option<Todo>>, AppError> {
        let text = normalize_text(text)?;
        let Some(index) = self.position(id) else {
            return Ok(Outcome::durable(None));
        };

        let current = &self.todos[index];
        let schedule = Schedule::from_input(
            date.or(current.date.as_deref()),
            time.or(current.time.as_deref()),
            self.require_schedule,
        )?;

        let todo = &mut self.todos[index];
        todo.text = text;
        todo.date = schedule.date;
        todo.time = schedule.time;
        let updated = todo.clone();
        tracing::debug!(todo_id = %updated.id, "updated todo");

        Ok(Outcome {
            value: Some(updated),
            durability: self.persist(),
        })
    }

    pub fn toggle_complete(&mut self, id: &str) -> Outcome<Option<Todo>> {
        let Some(index) = self.position(id) else {
            return Outcome::durable(None);
        };

        let todo = &mut self.todos[index];
        todo.completed = !todo.completed;
        let toggled = todo.clone();
        tracing::debug!(todo_id = %toggled.id, completed = toggled.completed, "toggled todo");

        Outcome {
            value: Some(toggled),
            durability: self.persist(),
        }
    }

    pub fn delete(&mut self, id: &str) -> Outcome<Option<Todo>> {
        let Some(index) = self.position(id) else {
            return Outcome::durable(None);
        };

        let removed = self.todos.remove(index);
        tracing::debug!(todo_id = %removed.id, "deleted todo");

        Outcome {
            value: Some(removed),
            durability: self.persist(),
        }
    }

    pub fn filter(&self, filter: Filter) -> Vec<Todo> {
        self.todos
            .iter()
            .filter(|todo| filter.matches(todo))
            .cloned()
            .collect()
    }

    /// Every date carrying at least one to-do, with its count, ascending.
    pub fn marked_dates(&self) -> BTreeMap<String, usize> {
        let mut marked = BTreeMap::new();
        for date in self.todos.iter().filter_map(|todo| todo.date.as_ref()) {
            *marked.entry(date.clone()).or_insert(0) += 1;
        }
        marked
    }

    /// To-dos due on `date`, in collection order.
    pub fn on_date(&self, date: &str) -> Result<Vec<Todo>, AppError> {
        let date = normalize_date(date)?;
        Ok(self
            .todos
            .iter()
            .filter(|todo| todo.date.as_deref() == Some(date.as_str()))
            .cloned()
            .collect())
    }

    fn position(&self, id: &str) -> Option<usize> {
        let id = id.trim();
        self.todos.iter().position(|todo| todo.id == id)
    }

    /// Clock milliseconds, bumped past every id seen so far.
    ///
    /// Once a loaded id sits at `u64::MAX` there is nothing left to bump to;
    /// ids then come from the clock and only stay unique.
    fn next_id(&mut self) -> String {
        let now_millis = u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000)
            .unwrap_or_default();
        let mut candidate = match self.last_id.checked_add(1) {
            Some(bumped) => now_millis.max(bumped),
            None => now_millis,
        };
        while self.position(&candidate.to_string()).is_some() {
            candidate = candidate.wrapping_add(1);
        }
        self.last_id = self.last_id.max(candidate);
        candidate.to_string()
    }

    fn persist(&self) -> Durability {
        match self.storage.save(&self.todos) {
            Ok(()) => Durability::Durable,
            Err(err) => {
                tracing::error!(error = %err, "failed to save todos, change kept in memory");
                Durability::MemoryOnly(err)
            }
        }
    }
}

/// Cloneable handle for callers that may run concurrently.
///
/// Each call holds the lock across its mutation and save, so saves land in
/// the same order as the mutations they follow.
#[derive(Clone)]
pub struct SharedTodoStore {
    inner: Arc<Mutex<TodoStore>>,
}

impl SharedTodoStore {
    pub fn new(store: TodoStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn create(
        &self,
        text: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Outcome<Todo>, AppError> {
        self.lock().create(text, date, time)
    }

    pub fn update(
        &self,
        id: &str,
        text: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Outcome<Option<Todo>>, AppError> {
        self.lock().update(id, text, date, time)
    }

    pub fn toggle_complete(&self, id: &str) -> Outcome<Option<Todo>> {
        self.lock().toggle_complete(id)
    }

    pub fn delete(&self, id: &str) -> Outcome<Option<Todo>> {
        self.lock().delete(id)
    }

    pub fn filter(&self, filter: Filter) -> Vec<Todo> {
        self.lock().filter(filter)
    }

    pub fn snapshot(&self) -> Vec<Todo> {
        self.lock().todos().to_vec()
    }

    fn lock(&self) -> MutexGuard<'_, TodoStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
