//! Task data structure and derived properties.
//!
//! This module defines the `Task` record: identity, descriptive fields,
//! classification, timestamps, an optional deadline and time tracking.
//! Overdue state and days-until-due are computed on read, never stored.

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TaskError;
use crate::fields::*;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A unit of trackable work.
///
/// `id` is assigned at construction and never changes. Timestamps keep the
/// offset they were recorded with so they round-trip through storage intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub actual_hours: f64,
}

impl Task {
    /// Create a task with a fresh id, both timestamps set to now and every
    /// other field at its default.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Local::now().fixed_offset();
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            assigned_to: String::new(),
            tags: String::new(),
            priority: Priority::default(),
            status: Status::default(),
            created_at: now,
            updated_at: now,
            due_date: None,
            estimated_hours: None,
            actual_hours: 0.0,
        }
    }

    /// Check the record-level invariants a stored task must satisfy.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.title.trim().is_empty() {
            return Err(TaskError::Validation("title is required".into()));
        }
        if let Some(est) = self.estimated_hours {
            if !valid_hours(est) {
                return Err(TaskError::Validation(format!(
                    "estimated hours must be finite and non-negative, got {est}"
                )));
            }
        }
        if !valid_hours(self.actual_hours) {
            return Err(TaskError::Validation(format!(
                "actual hours must be finite and non-negative, got {}",
                self.actual_hours
            )));
        }
        if self.updated_at < self.created_at {
            return Err(TaskError::Validation(
                "updated_at precedes created_at".into(),
            ));
        }
        Ok(())
    }

    /// Whether the task is overdue as of `now`.
    ///
    /// Requires a due date strictly in the past and a non-terminal status.
    pub fn is_overdue_at(&self, now: DateTime<FixedOffset>) -> bool {
        match self.due_date {
            Some(due) => now > due && !self.status.is_terminal(),
            None => false,
        }
    }

    /// Whether the task is overdue right now.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Local::now().fixed_offset())
    }

    /// Ceiling of the days between `now` and the due date. Negative once the
    /// deadline has passed by at least a whole day; `None` without a due date.
    pub fn days_until_due_at(&self, now: DateTime<FixedOffset>) -> Option<i64> {
        let due = self.due_date?;
        let millis = (due - now).num_milliseconds() as f64;
        Some((millis / MILLIS_PER_DAY).ceil() as i64)
    }

    /// Days until due as of right now.
    pub fn days_until_due(&self) -> Option<i64> {
        self.days_until_due_at(Local::now().fixed_offset())
    }

    /// First eight hex digits of the id, for compact display.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

// Non-finite values have no JSON encoding and would not survive a save.
fn valid_hours(h: f64) -> bool {
    h.is_finite() && h >= 0.0
}
