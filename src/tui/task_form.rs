//! Task form handling for the terminal user interface.
//!
//! The form holds text inputs and enum selectors for every editable task
//! field, and converts itself back into a [`Task`] on submit.

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::{
    fields::{Priority, Status},
    format::parse_due_input,
    task::Task,
    tui::input::InputField,
};

/// Field order used for navigation and rendering.
pub const TITLE_FIELD: usize = 0;
pub const DESCRIPTION_FIELD: usize = 1;
pub const ASSIGNEE_FIELD: usize = 2;
pub const TAGS_FIELD: usize = 3;
pub const DUE_FIELD: usize = 4;
pub const ESTIMATE_FIELD: usize = 5;
pub const ACTUAL_FIELD: usize = 6;
pub const PRIORITY_FIELD: usize = 7;
pub const STATUS_FIELD: usize = 8;

const FIELD_COUNT: usize = 9;

/// Task form for editing fields
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub assigned_to: InputField,
    pub tags: InputField,
    pub due: InputField,
    pub estimated: InputField,
    pub actual: InputField,
    pub priority: usize,
    pub status: usize,
    pub current_field: usize,
    // Shown text and value of the due date the form was opened with, so an
    // untouched due field round-trips exactly.
    original_due: Option<(String, DateTime<FixedOffset>)>,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    /// Create an empty form with default priority and status.
    pub fn new() -> Self {
        let mut form = Self {
            title: InputField::new(),
            description: InputField::new(),
            assigned_to: InputField::new(),
            tags: InputField::new(),
            due: InputField::new(),
            estimated: InputField::new(),
            actual: InputField::new(),
            priority: index_of(&Priority::ALL, Priority::default()),
            status: index_of(&Status::ALL, Status::default()),
            current_field: TITLE_FIELD,
            original_due: None,
        };
        form.update_active_field();
        form
    }

    /// Create a task form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self::new();
        form.title = InputField::with_value(&task.title);
        form.description = InputField::with_value(&task.description);
        form.assigned_to = InputField::with_value(&task.assigned_to);
        form.tags = InputField::with_value(&task.tags);
        if let Some(due) = task.due_date {
            let shown = due.to_rfc3339_opts(SecondsFormat::Secs, false);
            form.due = InputField::with_value(&shown);
            form.original_due = Some((shown, due));
        }
        form.estimated = InputField::with_value(
            &task.estimated_hours.map(|h| h.to_string()).unwrap_or_default());
        form.actual = InputField::with_value(&task.actual_hours.to_string());
        form.priority = index_of(&Priority::ALL, task.priority);
        form.status = index_of(&Status::ALL, task.status);
        form.update_active_field();
        form
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    pub fn selected_status(&self) -> Status {
        Status::ALL[self.status % Status::ALL.len()]
    }

    /// Text input for `field`, or `None` for selectors.
    pub fn input(&self, field: usize) -> Option<&InputField> {
        match field {
            TITLE_FIELD => Some(&self.title),
            DESCRIPTION_FIELD => Some(&self.description),
            ASSIGNEE_FIELD => Some(&self.assigned_to),
            TAGS_FIELD => Some(&self.tags),
            DUE_FIELD => Some(&self.due),
            ESTIMATE_FIELD => Some(&self.estimated),
            ACTUAL_FIELD => Some(&self.actual),
            _ => None,
        }
    }

    fn input_mut(&mut self, field: usize) -> Option<&mut InputField> {
        match field {
            TITLE_FIELD => Some(&mut self.title),
            DESCRIPTION_FIELD => Some(&mut self.description),
            ASSIGNEE_FIELD => Some(&mut self.assigned_to),
            TAGS_FIELD => Some(&mut self.tags),
            DUE_FIELD => Some(&mut self.due),
            ESTIMATE_FIELD => Some(&mut self.estimated),
            ACTUAL_FIELD => Some(&mut self.actual),
            _ => None,
        }
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        let current = self.current_field;
        for field in 0..FIELD_COUNT {
            if let Some(input) = self.input_mut(field) {
                input.active = field == current;
            }
        }
    }

    /// Handle character input for the currently active field.
    pub fn handle_char(&mut self, c: char) {
        if let Some(input) = self.input_mut(self.current_field) {
            input.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(input) = self.input_mut(self.current_field) {
            input.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(input) = self.input_mut(self.current_field) {
            input.handle_delete();
        }
    }

    /// Left/right moves the cursor in text fields and cycles selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            PRIORITY_FIELD => self.priority = cycle(self.priority, Priority::ALL.len(), right),
            STATUS_FIELD => self.status = cycle(self.status, Status::ALL.len(), right),
            field => {
                if let Some(input) = self.input_mut(field) {
                    if right { input.move_cursor_right() } else { input.move_cursor_left() }
                }
            }
        }
    }

    /// Build a new task from the form.
    pub fn to_new_task(&self) -> Result<Task, String> {
        let mut task = Task::new(self.title.text());
        self.apply_to(&mut task)?;
        Ok(task)
    }

    /// Copy every form field onto `task`. Identity and timestamps are left alone.
    pub fn apply_to(&self, task: &mut Task) -> Result<(), String> {
        let due_date = self.parse_due()?;
        let estimated_hours = match self.estimated.text() {
            "" => None,
            s => Some(parse_hours(s, "Estimated hours")?),
        };
        let actual_hours = match self.actual.text() {
            "" => 0.0,
            s => parse_hours(s, "Actual hours")?,
        };

        task.title = self.title.text().to_string();
        task.description = self.description.text().to_string();
        task.assigned_to = self.assigned_to.text().to_string();
        task.tags = self.tags.text().to_string();
        task.priority = self.selected_priority();
        task.status = self.selected_status();
        task.due_date = due_date;
        task.estimated_hours = estimated_hours;
        task.actual_hours = actual_hours;
        Ok(())
    }

    fn parse_due(&self) -> Result<Option<DateTime<FixedOffset>>, String> {
        let text = self.due.text();
        if text.is_empty() {
            return Ok(None);
        }
        if let Some((shown, original)) = &self.original_due {
            if shown == text {
                return Ok(Some(*original));
            }
        }
        parse_due_input(text)
            .map(Some)
            .ok_or_else(|| format!("Unrecognised due date '{text}'"))
    }
}

fn parse_hours(s: &str, label: &str) -> Result<f64, String> {
    s.parse::<f64>().map_err(|_| format!("{label} must be a number, got '{s}'"))
}

fn cycle(index: usize, len: usize, forward: bool) -> usize {
    if forward { (index + 1) % len } else { (index + len - 1) % len }
}

fn index_of<T: PartialEq + Copy>(all: &[T], value: T) -> usize {
    all.iter().position(|&v| v == value).unwrap_or(0)
}
