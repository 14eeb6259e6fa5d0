//! Parsing and display helpers shared by the CLI and the TUI.
//!
//! Covers due-date input (natural language and explicit timestamps),
//! relative due formatting, tabular output, and resolving a user-supplied
//! task identifier to an id.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone,
};
use uuid::Uuid;

use crate::fields::{Priority, Status};
use crate::stats::TaskStatistics;
use crate::task::Task;

/// Parse a due date typed by the user.
///
/// Supports:
/// - RFC 3339 timestamps (`2024-12-25T17:00:00+01:00`)
/// - `YYYY-MM-DD HH:MM` in local time
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "friday", "this friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - `YYYY-MM-DD`
///
/// Date-only inputs resolve to the end of that day in local time.
pub fn parse_due_input(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return local_fixed(naive);
    }
    let date = parse_due_date(s, Local::now().date_naive())?;
    end_of_day(date)
}

/// Resolve the date part of due input relative to `today`.
pub fn parse_due_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let weekday = today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(6 - weekday));
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (num, unit_days) = if let Some(n) = rest.strip_suffix('d') {
            (n, 1)
        } else if let Some(n) = rest.strip_suffix('w') {
            (n, 7)
        } else if let Some(n) = rest.strip_suffix('m') {
            // Approximate: 30 days per month
            (n, 30)
        } else {
            return None;
        };
        let n: i64 = num.trim().parse().ok()?;
        let offset = Duration::try_days(n.checked_mul(unit_days)?)?;
        return today.checked_add_signed(offset);
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (name, target) in weekdays {
        let ahead = (target + 7 - current) % 7;
        if s == name || s == format!("this {name}") {
            return Some(today + Duration::days(ahead));
        }
        if s == format!("next {name}") {
            let days = if ahead == 0 { 7 } else { ahead + 7 };
            return Some(today + Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn local_fixed(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    let time = NaiveTime::from_hms_opt(23, 59, 59)?;
    local_fixed(date.and_time(time))
}

/// Format a due date relative to `now` ("in 3d", "2d late", "overdue", "passed").
pub fn format_due_relative(task: &Task, now: DateTime<FixedOffset>) -> String {
    let Some(days) = task.days_until_due_at(now) else {
        return "-".into();
    };
    if task.is_overdue_at(now) {
        let late = (-days).max(0);
        return if late == 0 { "overdue".into() } else { format!("{late}d late") };
    }
    if days <= 0 {
        "passed".into()
    } else {
        format!("in {days}d")
    }
}

/// Format a timestamp for detail views.
pub fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Y-%m-%d %H:%M %:z").to_string()
}

/// Format optional hours, keeping absent distinct from zero.
pub fn format_hours(h: Option<f64>) -> String {
    match h {
        Some(h) => format!("{h:.1}h"),
        None => "-".into(),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks as a table.
pub fn print_table(tasks: &[Task]) {
    println!(
        "{:<8} {:<12} {:<9} {:<10} {:<14} {}",
        "ID", "Status", "Priority", "Due", "Assignee", "Title [tags]"
    );
    let now = Local::now().fixed_offset();
    for t in tasks {
        let tags = if t.tags.trim().is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.trim())
        };
        let assignee = if t.assigned_to.is_empty() { "-" } else { t.assigned_to.as_str() };
        println!(
            "{:<8} {:<12} {:<9} {:<10} {:<14} {}{}",
            t.short_id(),
            t.status.label(),
            t.priority.label(),
            format_due_relative(t, now),
            truncate(assignee, 14),
            t.title,
            tags
        );
    }
}

/// Print every field of one task.
pub fn print_task(t: &Task) {
    let now = Local::now().fixed_offset();
    println!("ID:          {}", t.id);
    println!("Title:       {}", t.title);
    if !t.description.is_empty() {
        println!("Description: {}", t.description);
    }
    println!("Status:      {}", t.status);
    println!("Priority:    {}", t.priority);
    println!("Assigned to: {}", if t.assigned_to.is_empty() { "-" } else { &t.assigned_to });
    println!("Tags:        {}", if t.tags.is_empty() { "-" } else { &t.tags });
    match &t.due_date {
        Some(due) => println!(
            "Due:         {} ({}){}",
            format_timestamp(due),
            format_due_relative(t, now),
            if t.is_overdue_at(now) { " OVERDUE" } else { "" }
        ),
        None => println!("Due:         -"),
    }
    println!("Estimated:   {}", format_hours(t.estimated_hours));
    println!("Actual:      {}", format_hours(Some(t.actual_hours)));
    println!("Created:     {}", format_timestamp(&t.created_at));
    println!("Updated:     {}", format_timestamp(&t.updated_at));
}

/// Render statistics as lines of text, shared by the CLI and TUI.
pub fn statistics_lines(stats: &TaskStatistics) -> Vec<String> {
    let mut lines = vec![format!("Total tasks:    {}", stats.total)];
    for s in Status::ALL {
        lines.push(format!("  {:<13} {}", s.label(), stats.count_status(s)));
    }
    lines.push(format!("Overdue:        {}", stats.overdue));
    lines.push(format!("High priority:  {}", stats.high_priority));
    for p in Priority::ALL {
        lines.push(format!("  {:<13} {}", p.label(), stats.count_priority(p)));
    }
    lines.push(match stats.completion_rate() {
        Some(rate) => format!("Completion:     {:.1}%", rate * 100.0),
        None => "Completion:     -".to_string(),
    });
    lines
}

/// Resolve a task identifier (full id, unique id prefix, or exact title) to an id.
/// Returns an error if nothing matches or the identifier is ambiguous.
pub fn resolve_task_identifier(identifier: &str, tasks: &[Task]) -> Result<Uuid, String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err("Task identifier is empty".into());
    }

    if let Ok(id) = Uuid::parse_str(identifier) {
        return if tasks.iter().any(|t| t.id == id) {
            Ok(id)
        } else {
            Err(format!("Task with ID {id} not found"))
        };
    }

    let lower = identifier.to_lowercase();
    let by_prefix: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.to_string().starts_with(&lower))
        .collect();
    let matches = if by_prefix.is_empty() {
        tasks
            .iter()
            .filter(|t| t.title.to_lowercase() == lower)
            .collect()
    } else {
        by_prefix
    };

    match matches.len() {
        0 => Err(format!("No task found matching '{identifier}'")),
        1 => Ok(matches[0].id),
        _ => {
            let mut msg = format!("Multiple tasks match '{identifier}':\n");
            for t in matches {
                msg.push_str(&format!("  {}: {} ({})\n", t.id, t.title, t.status));
            }
            msg.push_str("Please use a longer ID instead.");
            Err(msg)
        }
    }
}
