//! Aggregate counts over a task collection.

use chrono::{DateTime, FixedOffset};

use crate::fields::{Priority, Status};
use crate::task::Task;

/// Snapshot of collection-wide counts. Recomputed on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatistics {
    pub total: usize,
    pub by_status: [usize; 5],
    pub by_priority: [usize; 4],
    pub overdue: usize,
    /// Tasks with priority High or Critical.
    pub high_priority: usize,
}

impl TaskStatistics {
    /// Count `tasks` as of `now`.
    pub fn compute(tasks: &[Task], now: DateTime<FixedOffset>) -> Self {
        let mut stats = TaskStatistics {
            total: tasks.len(),
            ..Default::default()
        };
        for t in tasks {
            stats.by_status[t.status as usize] += 1;
            stats.by_priority[t.priority as usize] += 1;
            if t.is_overdue_at(now) {
                stats.overdue += 1;
            }
            if t.priority.is_high() {
                stats.high_priority += 1;
            }
        }
        stats
    }

    pub fn count_status(&self, status: Status) -> usize {
        self.by_status[status as usize]
    }

    pub fn count_priority(&self, priority: Priority) -> usize {
        self.by_priority[priority as usize]
    }

    pub fn completed(&self) -> usize {
        self.count_status(Status::Completed)
    }

    /// Completed tasks as a fraction of all tasks; `None` for an empty collection.
    pub fn completion_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.completed() as f64 / self.total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z").unwrap()
    }

    #[test]
    fn test_empty_collection_has_no_rate() {
        let stats = TaskStatistics::compute(&[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate(), None);
    }

    #[test]
    fn test_counts_and_rate() {
        let mut done = Task::new("done");
        done.status = Status::Completed;
        done.priority = Priority::High;

        let mut late = Task::new("late");
        late.status = Status::InProgress;
        late.due_date = Some(now() - Duration::days(1));
        late.priority = Priority::Critical;

        let mut busy = Task::new("busy");
        busy.status = Status::InProgress;
        busy.due_date = Some(now() + Duration::days(3));

        let stats = TaskStatistics::compute(&[done, late, busy], now());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed(), 1);
        assert_eq!(stats.count_status(Status::InProgress), 2);
        assert_eq!(stats.count_status(Status::OnHold), 0);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.high_priority, 2);
        assert_eq!(stats.count_priority(Priority::Normal), 1);

        let rate = stats.completion_rate().unwrap();
        assert!((rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(format!("{:.1}%", rate * 100.0), "33.3%");
    }
}
