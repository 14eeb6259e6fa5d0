//! Enumerations used to classify tasks.
//!
//! Both enums persist as their ordinal (`u8`) and render through static label
//! tables, so presentation code never special-cases individual variants.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How important a task is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Status {
    #[default]
    NotStarted = 0,
    InProgress = 1,
    Completed = 2,
    Cancelled = 3,
    OnHold = 4,
}

const PRIORITY_LABELS: [&str; 4] = ["Low", "Normal", "High", "Critical"];

const STATUS_LABELS: [&str; 5] = ["Not Started", "In Progress", "Completed", "Cancelled", "On Hold"];

impl Priority {
    /// All variants in ordinal order.
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Normal, Priority::High, Priority::Critical];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        PRIORITY_LABELS[self as usize]
    }

    /// High and Critical both count as "high priority" in statistics.
    pub fn is_high(self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

impl Status {
    /// All variants in ordinal order.
    pub const ALL: [Status; 5] = [
        Status::NotStarted,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
        Status::OnHold,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        STATUS_LABELS[self as usize]
    }

    /// Completed and cancelled tasks are finished and can never be overdue.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    /// Next status in ordinal order, wrapping around.
    pub fn next(self) -> Status {
        Status::ALL[(self as usize + 1) % Status::ALL.len()]
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p as u8
    }
}

impl From<Status> for u8 {
    fn from(s: Status) -> u8 {
        s as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Priority::ALL
            .get(v as usize)
            .copied()
            .ok_or_else(|| format!("invalid priority ordinal {v}"))
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Status::ALL
            .get(v as usize)
            .copied()
            .ok_or_else(|| format!("invalid status ordinal {v}"))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
