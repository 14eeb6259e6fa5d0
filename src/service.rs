//! The task service: sole owner of the in-memory task collection.
//!
//! Every mutation is validated before it touches the collection, and with
//! auto-save enabled each successful `create`, `update` or `delete` rewrites
//! the whole collection through the storage adapter. Storage failures are
//! logged and tracked via [`TaskService::is_dirty`]; they never fail the
//! mutation itself.
//!
//! Mutating methods take `&mut self`, so at most one mutation can be in
//! flight. Callers that share a service across threads must wrap it in a
//! mutex that covers the mutation and its auto-save together.
//!
//! The owner must call [`TaskService::close`] (or [`TaskService::save`])
//! before dropping the service; nothing is written on drop.

use chrono::{DateTime, FixedOffset, Local};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::TaskError;
use crate::fields::{Priority, Status};
use crate::stats::TaskStatistics;
use crate::storage::{JsonFileStorage, TaskStorage};
use crate::task::Task;

pub struct TaskService<S: TaskStorage = JsonFileStorage> {
    tasks: Vec<Task>,
    storage: S,
    config: ServiceConfig,
    dirty: bool,
    last_load_skipped: usize,
}

impl TaskService<JsonFileStorage> {
    /// Build a service backed by a JSON file at `config.path` and load it.
    ///
    /// Returns `None` when an existing file cannot be read, so the caller
    /// never auto-saves an empty collection over data it failed to load.
    pub fn open(config: ServiceConfig) -> Option<Self> {
        let storage = JsonFileStorage::new(&config.path);
        let mut service = TaskService::new(storage, config);
        service.load().then_some(service)
    }
}

impl<S: TaskStorage> TaskService<S> {
    /// Build a service with an empty collection. Nothing is loaded.
    pub fn new(storage: S, config: ServiceConfig) -> Self {
        TaskService {
            tasks: Vec::new(),
            storage,
            config,
            dirty: false,
            last_load_skipped: 0,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True when in-memory state has changes that are not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records dropped by the most recent successful `load`.
    pub fn last_load_skipped(&self) -> usize {
        self.last_load_skipped
    }

    /// Add a new task.
    pub fn create(&mut self, task: Task) -> Result<(), TaskError> {
        task.validate()?;
        if self.tasks.len() >= self.config.max_tasks {
            return Err(TaskError::Capacity { max: self.config.max_tasks });
        }
        if self.position(task.id).is_some() {
            return Err(TaskError::Duplicate(task.id));
        }
        tracing::debug!(id = %task.id, title = %task.title, "creating task");
        self.tasks.push(task);
        self.after_mutation();
        Ok(())
    }

    /// Replace the stored task that has `task.id` with `task`.
    ///
    /// The update is whole-record: every field is taken from `task` except
    /// `created_at`, which keeps its stored value, and `updated_at`, which is
    /// stamped with the current time. Returns `Ok(false)` when no task has
    /// that id.
    pub fn update(&mut self, mut task: Task) -> Result<bool, TaskError> {
        let Some(idx) = self.position(task.id) else {
            return Ok(false);
        };
        let stored = &self.tasks[idx];
        task.created_at = stored.created_at;
        task.updated_at = Local::now().fixed_offset().max(stored.updated_at);
        task.validate()?;

        tracing::debug!(id = %task.id, "updating task");
        self.tasks[idx] = task;
        self.after_mutation();
        Ok(true)
    }

    /// Remove the task with `id`. Returns false when no such task exists.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.tasks.remove(idx);
        tracing::debug!(%id, "deleted task");
        self.after_mutation();
        true
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<Task> {
        self.tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Independent copy of every task, in collection order.
    pub fn get_all(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn get_by_status(&self, status: Status) -> Vec<Task> {
        self.filtered(|t| t.status == status)
    }

    pub fn get_by_priority(&self, priority: Priority) -> Vec<Task> {
        self.filtered(|t| t.priority == priority)
    }

    pub fn get_overdue(&self) -> Vec<Task> {
        self.overdue_at(Local::now().fixed_offset())
    }

    pub fn overdue_at(&self, now: DateTime<FixedOffset>) -> Vec<Task> {
        self.filtered(|t| t.is_overdue_at(now))
    }

    /// Tasks assigned to `name`, compared case-insensitively.
    pub fn get_by_assignee(&self, name: &str) -> Result<Vec<Task>, TaskError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TaskError::Validation("assignee name is required".into()));
        }
        let name = name.to_lowercase();
        Ok(self.filtered(|t| t.assigned_to.trim().to_lowercase() == name))
    }

    /// Tasks whose title, description, tags or assignee contain `query`,
    /// case-insensitively.
    pub fn search(&self, query: &str) -> Result<Vec<Task>, TaskError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TaskError::Validation("search text is required".into()));
        }
        let q = query.to_lowercase();
        Ok(self.filtered(|t| {
            [&t.title, &t.description, &t.tags, &t.assigned_to]
                .iter()
                .any(|field| field.to_lowercase().contains(&q))
        }))
    }

    pub fn statistics(&self) -> TaskStatistics {
        self.statistics_at(Local::now().fixed_offset())
    }

    pub fn statistics_at(&self, now: DateTime<FixedOffset>) -> TaskStatistics {
        TaskStatistics::compute(&self.tasks, now)
    }

    /// Persist the full collection. Returns whether the write succeeded.
    pub fn save(&mut self) -> bool {
        let ok = self.storage.save_all(&self.tasks);
        if ok {
            self.dirty = false;
        }
        ok
    }

    /// Replace the collection with what storage holds.
    ///
    /// On failure the current collection is left exactly as it was.
    pub fn load(&mut self) -> bool {
        let Some(loaded) = self.storage.load_all() else {
            return false;
        };
        if loaded.tasks.len() > self.config.max_tasks {
            tracing::warn!(
                count = loaded.tasks.len(),
                max = self.config.max_tasks,
                "stored tasks exceed the configured limit"
            );
        }
        self.tasks = loaded.tasks;
        self.last_load_skipped = loaded.skipped;
        self.dirty = false;
        true
    }

    /// Flush pending changes and release the service.
    ///
    /// Returns true when persisted state matches the in-memory collection on
    /// return, either because nothing was pending or because the final save
    /// succeeded.
    pub fn close(mut self) -> bool {
        if self.dirty {
            self.save()
        } else {
            true
        }
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn filtered(&self, pred: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.tasks.iter().filter(|t| pred(t)).cloned().collect()
    }

    fn after_mutation(&mut self) {
        self.dirty = true;
        if self.config.auto_save && !self.save() {
            tracing::warn!("auto-save failed; changes are held in memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use chrono::Duration;
    use tempfile::TempDir;

    use crate::error::StorageError;
    use crate::storage::LoadedTasks;

    /// In-memory storage that can be told to fail.
    #[derive(Default)]
    struct MemoryStorage {
        saved: RefCell<Vec<Task>>,
        saves: Cell<usize>,
        fail: Cell<bool>,
    }

    impl TaskStorage for MemoryStorage {
        fn write_all(&self, tasks: &[Task]) -> Result<(), StorageError> {
            if self.fail.get() {
                return Err(StorageError::Format("disk full".into()));
            }
            self.saves.set(self.saves.get() + 1);
            *self.saved.borrow_mut() = tasks.to_vec();
            Ok(())
        }

        fn read_all(&self) -> Result<LoadedTasks, StorageError> {
            if self.fail.get() {
                return Err(StorageError::Format("corrupt".into()));
            }
            Ok(LoadedTasks { tasks: self.saved.borrow().clone(), skipped: 0 })
        }

        fn location(&self) -> String {
            "memory".into()
        }
    }

    fn service() -> TaskService<MemoryStorage> {
        TaskService::new(MemoryStorage::default(), ServiceConfig::default())
    }

    fn now() -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    #[test]
    fn test_create_then_get_returns_equal_task() {
        let mut svc = service();
        let mut t = Task::new("Write tests");
        t.assigned_to = "Sam".into();
        t.estimated_hours = Some(2.5);
        svc.create(t.clone()).unwrap();

        assert_eq!(svc.get_by_id(t.id), Some(t));
        assert_eq!(svc.len(), 1);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut svc = service();
        let err = svc.create(Task::new("  ")).unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert!(svc.is_empty());
        assert_eq!(svc.storage.saves.get(), 0);
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let mut svc = service();
        let t = Task::new("Once");
        svc.create(t.clone()).unwrap();
        let err = svc.create(t.clone()).unwrap_err();
        assert!(matches!(err, TaskError::Duplicate(id) if id == t.id));
        assert_eq!(svc.len(), 1);
    }

    #[test]
    fn test_create_rejects_when_full() {
        let config = ServiceConfig { max_tasks: 2, ..Default::default() };
        let mut svc = TaskService::new(MemoryStorage::default(), config);
        svc.create(Task::new("a")).unwrap();
        svc.create(Task::new("b")).unwrap();
        let err = svc.create(Task::new("c")).unwrap_err();
        assert!(matches!(err, TaskError::Capacity { max: 2 }));
        assert_eq!(svc.len(), 2);
    }

    #[test]
    fn test_every_mutation_auto_saves() {
        let mut svc = service();
        let mut t = Task::new("Track");
        svc.create(t.clone()).unwrap();
        assert_eq!(svc.storage.saves.get(), 1);

        t.status = Status::InProgress;
        assert!(svc.update(t.clone()).unwrap());
        assert_eq!(svc.storage.saves.get(), 2);

        assert!(svc.delete(t.id));
        assert_eq!(svc.storage.saves.get(), 3);
        assert!(svc.storage.saved.borrow().is_empty());
        assert!(!svc.is_dirty());
    }

    #[test]
    fn test_update_missing_task_is_not_found() {
        let mut svc = service();
        svc.create(Task::new("Existing")).unwrap();
        let before = svc.get_all();

        assert!(!svc.update(Task::new("Stranger")).unwrap());
        assert_eq!(svc.get_all(), before);
        assert_eq!(svc.storage.saves.get(), 1);
    }

    #[test]
    fn test_update_replaces_fields_and_refreshes_timestamp() {
        let mut svc = service();
        let original = Task::new("Old title");
        svc.create(original.clone()).unwrap();

        let mut changed = original.clone();
        changed.title = "New title".into();
        changed.priority = Priority::High;
        changed.due_date = Some(now() + Duration::days(2));
        changed.estimated_hours = Some(4.0);
        changed.created_at = original.created_at - Duration::days(30);
        assert!(svc.update(changed.clone()).unwrap());

        let stored = svc.get_by_id(original.id).unwrap();
        assert_eq!(stored.title, "New title");
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.due_date, changed.due_date);
        assert_eq!(stored.estimated_hours, Some(4.0));
        assert_eq!(stored.created_at, original.created_at);
        assert!(stored.updated_at >= original.updated_at);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[test]
    fn test_update_validates_before_mutating() {
        let mut svc = service();
        let t = Task::new("Keep me");
        svc.create(t.clone()).unwrap();

        let mut blank = t.clone();
        blank.title = String::new();
        assert!(svc.update(blank).is_err());
        assert_eq!(svc.get_by_id(t.id).unwrap().title, "Keep me");
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut svc = service();
        let a = Task::new("a");
        let b = Task::new("b");
        svc.create(a.clone()).unwrap();
        svc.create(b.clone()).unwrap();

        assert!(svc.delete(a.id));
        assert_eq!(svc.len(), 1);
        assert!(svc.get_by_id(a.id).is_none());
        assert!(!svc.delete(a.id));
        assert_eq!(svc.len(), 1);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut svc = service();
        svc.create(Task::new("original")).unwrap();
        let mut snap = svc.get_all();
        snap[0].title = "mutated".into();
        snap.clear();
        assert_eq!(svc.get_all()[0].title, "original");
    }

    #[test]
    fn test_filter_by_status_preserves_order() {
        let mut svc = service();
        let mut ids = Vec::new();
        for (title, status) in [
            ("one", Status::InProgress),
            ("two", Status::Completed),
            ("three", Status::InProgress),
        ] {
            let mut t = Task::new(title);
            t.status = status;
            ids.push(t.id);
            svc.create(t).unwrap();
        }
        let got = svc.get_by_status(Status::InProgress);
        assert_eq!(got.iter().map(|t| t.id).collect::<Vec<_>>(), vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_filter_by_priority_and_overdue() {
        let mut svc = service();
        let mut late = Task::new("late");
        late.priority = Priority::Critical;
        late.status = Status::InProgress;
        late.due_date = Some(now() - Duration::days(1));
        let mut done_late = late.clone();
        done_late.id = Uuid::new_v4();
        done_late.status = Status::Completed;
        svc.create(late.clone()).unwrap();
        svc.create(done_late).unwrap();
        svc.create(Task::new("no deadline")).unwrap();

        assert_eq!(svc.get_by_priority(Priority::Critical).len(), 2);
        let overdue = svc.get_overdue();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, late.id);
    }

    #[test]
    fn test_assignee_filter_is_case_insensitive() {
        let mut svc = service();
        let mut t = Task::new("x");
        t.assigned_to = "Alice Smith".into();
        svc.create(t).unwrap();
        svc.create(Task::new("unassigned")).unwrap();

        assert_eq!(svc.get_by_assignee("alice smith").unwrap().len(), 1);
        assert!(svc.get_by_assignee("alice").unwrap().is_empty());
        assert!(matches!(svc.get_by_assignee("  "), Err(TaskError::Validation(_))));
    }

    #[test]
    fn test_search_matches_any_text_field() {
        let mut svc = service();
        let mut a = Task::new("Fix login bug");
        a.tags = "backend,auth".into();
        let mut b = Task::new("Update docs");
        b.description = "Mention the LOGIN flow".into();
        svc.create(a).unwrap();
        svc.create(b).unwrap();
        svc.create(Task::new("Unrelated")).unwrap();

        assert_eq!(svc.search("login").unwrap().len(), 2);
        assert_eq!(svc.search("AUTH").unwrap().len(), 1);
        assert!(svc.search("").is_err());
    }

    #[test]
    fn test_statistics_example() {
        let mut svc = service();
        let at = now();
        let mut done = Task::new("done");
        done.status = Status::Completed;
        let mut late = Task::new("late");
        late.status = Status::InProgress;
        late.due_date = Some(at - Duration::days(1));
        let mut busy = Task::new("busy");
        busy.status = Status::InProgress;
        for t in [done, late, busy] {
            svc.create(t).unwrap();
        }

        let stats = svc.statistics_at(at);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed(), 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(format!("{:.1}", stats.completion_rate().unwrap() * 100.0), "33.3");
    }

    #[test]
    fn test_failed_auto_save_keeps_mutation_and_marks_dirty() {
        let mut svc = service();
        svc.storage.fail.set(true);
        svc.create(Task::new("held in memory")).unwrap();
        assert_eq!(svc.len(), 1);
        assert!(svc.is_dirty());

        svc.storage.fail.set(false);
        assert!(svc.save());
        assert!(!svc.is_dirty());
        assert_eq!(svc.storage.saved.borrow().len(), 1);
    }

    #[test]
    fn test_failed_load_leaves_state_untouched() {
        let mut svc = service();
        svc.create(Task::new("keep")).unwrap();
        let before = svc.get_all();

        svc.storage.fail.set(true);
        assert!(!svc.load());
        assert_eq!(svc.get_all(), before);
    }

    #[test]
    fn test_auto_save_off_defers_to_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let config = ServiceConfig { path: path.clone(), auto_save: false, ..Default::default() };

        let mut svc = TaskService::open(config.clone()).unwrap();
        svc.create(Task::new("later")).unwrap();
        assert!(svc.is_dirty());
        assert!(!path.exists());
        assert!(svc.close());

        let reopened = TaskService::open(config).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_open_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig::with_path(dir.path().join("tasks.json"));

        let mut svc = TaskService::open(config.clone()).unwrap();
        assert!(svc.is_empty());
        let mut t = Task::new("persisted");
        t.estimated_hours = Some(0.0);
        t.due_date = Some(DateTime::parse_from_rfc3339("2030-01-01T09:00:00-03:00").unwrap());
        svc.create(t.clone()).unwrap();
        assert!(svc.close());

        let reopened = TaskService::open(config).unwrap();
        assert_eq!(reopened.get_by_id(t.id), Some(t));
        assert_eq!(reopened.last_load_skipped(), 0);
    }

    #[test]
    fn test_load_reports_skipped_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let good = Task::new("good");
        let doc = serde_json::json!([good, { "title": "broken" }]);
        std::fs::write(&path, doc.to_string()).unwrap();

        let svc = TaskService::open(ServiceConfig::with_path(&path)).unwrap();
        assert_eq!(svc.len(), 1);
        assert_eq!(svc.last_load_skipped(), 1);
    }

    #[test]
    fn test_open_refuses_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "not json at all").unwrap();
        assert!(TaskService::open(ServiceConfig::with_path(&path)).is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json at all");
    }
}
