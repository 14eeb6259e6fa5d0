//! Persistence of the full task collection.
//!
//! The `TaskStorage` trait is the boundary between the service and the file
//! system. Implementations report failures as `StorageError`; the provided
//! `save_all` / `load_all` methods log those failures and collapse them into
//! a plain success flag so storage trouble never propagates as a crash.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StorageError;
use crate::task::Task;

/// Result of a successful load.
#[derive(Debug, Default)]
pub struct LoadedTasks {
    pub tasks: Vec<Task>,
    /// Records present in the file but dropped because they were malformed,
    /// invalid, or repeated an id already seen.
    pub skipped: usize,
}

/// Whole-collection persistence.
pub trait TaskStorage {
    /// Persist every task, replacing whatever was stored before.
    fn write_all(&self, tasks: &[Task]) -> Result<(), StorageError>;

    /// Read back the stored collection. A missing backing store is an empty
    /// collection, not an error.
    fn read_all(&self) -> Result<LoadedTasks, StorageError>;

    /// Human-readable location for log messages.
    fn location(&self) -> String;

    /// Persist the snapshot, logging any failure. Returns whether it succeeded.
    fn save_all(&self, tasks: &[Task]) -> bool {
        match self.write_all(tasks) {
            Ok(()) => {
                tracing::debug!(path = %self.location(), count = tasks.len(), "saved tasks");
                true
            }
            Err(e) => {
                tracing::error!(path = %self.location(), error = %e, "failed to save tasks");
                false
            }
        }
    }

    /// Load the stored collection, logging any failure. `None` means the
    /// load failed and the caller should keep its current state.
    fn load_all(&self) -> Option<LoadedTasks> {
        match self.read_all() {
            Ok(loaded) => {
                if loaded.skipped > 0 {
                    tracing::warn!(
                        path = %self.location(),
                        skipped = loaded.skipped,
                        "dropped unreadable task records"
                    );
                }
                tracing::info!(path = %self.location(), count = loaded.tasks.len(), "loaded tasks");
                Some(loaded)
            }
            Err(e) => {
                tracing::error!(path = %self.location(), error = %e, "failed to load tasks");
                None
            }
        }
    }
}

/// Stores tasks as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl TaskStorage for JsonFileStorage {
    fn write_all(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(tasks)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        // Atomic-ish write via temp + rename.
        let tmp = self.temp_path();
        let result = write_then_rename(&tmp, &self.path, data.as_bytes());
        if result.is_err() {
            // The target is untouched; don't leave a half-written temp file behind.
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn read_all(&self) -> Result<LoadedTasks, StorageError> {
        let buf = match fs::read_to_string(&self.path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadedTasks::default()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        decode_tasks(&buf)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn write_then_rename(tmp: &Path, target: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut f = File::create(tmp).map_err(|e| StorageError::io(tmp, e))?;
    f.write_all(data)
        .and_then(|_| f.sync_all())
        .map_err(|e| StorageError::io(tmp, e))?;
    drop(f);
    fs::rename(tmp, target).map_err(|e| StorageError::io(target, e))
}

/// Decode a JSON document into tasks, one record at a time.
///
/// The document itself must be a JSON array. Each element that fails to
/// decode, fails validation, or repeats an earlier id is skipped and counted.
pub fn decode_tasks(buf: &str) -> Result<LoadedTasks, StorageError> {
    let doc: serde_json::Value = serde_json::from_str(buf)?;
    let serde_json::Value::Array(records) = doc else {
        return Err(StorageError::Format("expected a JSON array of tasks".into()));
    };

    let mut loaded = LoadedTasks::default();
    let mut seen = HashSet::new();
    for (index, record) in records.into_iter().enumerate() {
        let task = match Task::deserialize(record) {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed task record");
                loaded.skipped += 1;
                continue;
            }
        };
        if let Err(e) = task.validate() {
            tracing::warn!(index, id = %task.id, error = %e, "skipping invalid task record");
            loaded.skipped += 1;
            continue;
        }
        if !seen.insert(task.id) {
            tracing::warn!(index, id = %task.id, "skipping duplicate task id");
            loaded.skipped += 1;
            continue;
        }
        loaded.tasks.push(task);
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};
    use chrono::{DateTime, Duration};
    use tempfile::TempDir;

    fn sample_tasks() -> Vec<Task> {
        let base = DateTime::parse_from_rfc3339("2024-03-10T08:30:15.123456789-05:00").unwrap();
        let mut a = Task::new("Draft proposal");
        a.description = "First pass".into();
        a.assigned_to = "Dana".into();
        a.tags = "writing,q2".into();
        a.priority = Priority::Critical;
        a.status = Status::OnHold;
        a.created_at = base;
        a.updated_at = base + Duration::minutes(5);
        a.due_date = Some(DateTime::parse_from_rfc3339("2024-04-01T17:00:00+09:30").unwrap());
        a.estimated_hours = Some(0.0);
        a.actual_hours = 1.25;

        let mut b = Task::new("Review budget");
        b.created_at = base;
        b.updated_at = base;
        vec![a, b]
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nope.json"));
        let loaded = storage.load_all().expect("missing file is a successful load");
        assert!(loaded.tasks.is_empty());
        assert_eq!(loaded.skipped, 0);
    }

    #[test]
    fn test_save_then_load_preserves_every_field() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("tasks.json"));
        let tasks = sample_tasks();

        assert!(storage.save_all(&tasks));
        let loaded = storage.load_all().unwrap();

        assert_eq!(loaded.tasks, tasks);
        assert_eq!(loaded.tasks[0].estimated_hours, Some(0.0));
        assert_eq!(loaded.tasks[1].estimated_hours, None);
        assert_eq!(loaded.tasks[0].due_date.unwrap().offset().local_minus_utc(), 9 * 3600 + 1800);
        assert!(!dir.path().join("tasks.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested/deeper/tasks.json"));
        assert!(storage.save_all(&sample_tasks()));
        assert!(storage.path().exists());
    }

    #[test]
    fn test_corrupt_file_fails_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileStorage::new(&path).load_all().is_none());

        fs::write(&path, r#"{"tasks": []}"#).unwrap();
        assert!(matches!(
            JsonFileStorage::new(&path).read_all(),
            Err(StorageError::Format(_))
        ));
    }

    #[test]
    fn test_malformed_records_are_skipped_individually() {
        let tasks = sample_tasks();
        let mut doc = serde_json::to_value(&tasks).unwrap();
        let records = doc.as_array_mut().unwrap();
        records.push(serde_json::json!({ "title": "no id or timestamps" }));
        let mut bad_status = serde_json::to_value(&tasks[1]).unwrap();
        bad_status["id"] = serde_json::json!(uuid::Uuid::new_v4());
        bad_status["status"] = serde_json::json!(42);
        records.push(bad_status);
        let mut blank_title = serde_json::to_value(&tasks[1]).unwrap();
        blank_title["id"] = serde_json::json!(uuid::Uuid::new_v4());
        blank_title["title"] = serde_json::json!("");
        records.push(blank_title);
        records.push(serde_json::to_value(&tasks[0]).unwrap());

        let loaded = decode_tasks(&doc.to_string()).unwrap();
        assert_eq!(loaded.tasks, tasks);
        assert_eq!(loaded.skipped, 4);
    }

    #[test]
    fn test_save_to_unwritable_location_reports_false() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // A regular file cannot act as a parent directory.
        let storage = JsonFileStorage::new(blocker.join("tasks.json"));
        assert!(!storage.save_all(&sample_tasks()));
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        // A non-empty directory at the target makes the final rename fail.
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(!storage.save_all(&sample_tasks()));
        assert!(!dir.path().join("tasks.json.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_long_fractional_hours_survive_save() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("tasks.json"));

        // Values with 16-17 significant digits, as produced by arithmetic.
        let mut tasks = Vec::new();
        let mut x = 0.1_f64;
        for i in 0..500 {
            x = (x * 7.123456789 + 0.987654321) % 1000.0;
            let mut t = Task::new(format!("task {i}"));
            t.actual_hours = x;
            t.estimated_hours = Some(x / 3.0);
            tasks.push(t);
        }
        let mut known = Task::new("known");
        known.actual_hours = 985.6906946328695;
        tasks.push(known);

        assert!(storage.save_all(&tasks));
        assert_eq!(storage.load_all().unwrap().tasks, tasks);
    }
}
