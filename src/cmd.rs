//! Command implementations for the CLI interface.
//!
//! Each handler takes the task service by reference, performs one operation
//! and prints the outcome. Handlers never exit the process themselves; errors
//! are returned to `main`, which reports them once the service is closed.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::fields::*;
use crate::format::*;
use crate::service::TaskService;
use crate::task::Task;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI interface.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Person the task is assigned to.
        #[arg(long)]
        assignee: Option<String>,
        /// Free-form tags, e.g. "backend,urgent".
        #[arg(long)]
        tags: Option<String>,
        /// Priority: low | normal | high | critical.
        #[arg(long, value_enum, default_value_t = Priority::Normal)]
        priority: Priority,
        /// Status: not-started | in-progress | completed | cancelled | on-hold.
        #[arg(long, value_enum, default_value_t = Status::NotStarted)]
        status: Status,
        /// Due date: RFC 3339, "YYYY-MM-DD [HH:MM]", "today", "tomorrow", "in Nd", ...
        #[arg(long)]
        due: Option<String>,
        /// Estimated effort in hours.
        #[arg(long)]
        estimate: Option<f64>,
        /// Hours already spent.
        #[arg(long, default_value_t = 0.0)]
        actual: f64,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by priority.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by assignee (case-insensitive).
        #[arg(long)]
        assignee: Option<String>,
        /// Only show overdue tasks.
        #[arg(long)]
        overdue: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID, ID prefix or title.
    View {
        /// Task ID, ID prefix or title
        id: String,
    },

    /// Update fields on a task. Unspecified fields keep their current values.
    Update {
        /// Task ID, ID prefix or title
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        #[arg(long, conflicts_with = "clear_estimate")]
        estimate: Option<f64>,
        /// Remove the estimate.
        #[arg(long)]
        clear_estimate: bool,
        #[arg(long)]
        actual: Option<f64>,
    },

    /// Delete a task.
    Delete {
        /// Task ID, ID prefix or title
        id: String,
    },

    /// Search title, description, tags and assignee.
    Search {
        query: String,
    },

    /// Show task statistics.
    Stats,

    /// Write the task file now.
    Save,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Field values shared by `add` and `update`.
#[derive(Default)]
pub struct TaskEdits {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub assignee: Option<String>,
    pub tags: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub estimate: Option<f64>,
    pub clear_estimate: bool,
    pub actual: Option<f64>,
}

impl TaskEdits {
    /// Apply the edits to `task`, parsing the due date input.
    pub fn apply(self, task: &mut Task) -> Result<(), String> {
        if let Some(s) = self.title { task.title = s.trim().to_string(); }
        if let Some(d) = self.desc { task.description = d.trim().to_string(); }
        if let Some(a) = self.assignee { task.assigned_to = a.trim().to_string(); }
        if let Some(t) = self.tags { task.tags = t.trim().to_string(); }
        if let Some(p) = self.priority { task.priority = p; }
        if let Some(s) = self.status { task.status = s; }
        if self.clear_due { task.due_date = None; }
        if let Some(ds) = self.due {
            task.due_date = Some(parse_due_input(&ds).ok_or_else(|| {
                format!("Unrecognised due date '{ds}'. Use YYYY-MM-DD, 'today', 'tomorrow', or 'in Nd'.")
            })?);
        }
        if self.clear_estimate { task.estimated_hours = None; }
        if let Some(e) = self.estimate { task.estimated_hours = Some(e); }
        if let Some(a) = self.actual { task.actual_hours = a; }
        Ok(())
    }
}

/// Add a new task.
pub fn cmd_add(service: &mut TaskService, title: String, edits: TaskEdits) -> CmdResult {
    let mut task = Task::new(title.trim());
    edits.apply(&mut task)?;
    let short = task.short_id();
    service.create(task)?;
    println!("Added task {short}");
    warn_if_unsaved(service);
    Ok(())
}

/// List tasks with optional filtering.
pub fn cmd_list(
    service: &TaskService,
    status: Option<Status>,
    priority: Option<Priority>,
    assignee: Option<String>,
    overdue: bool,
    limit: Option<usize>,
) -> CmdResult {
    let mut tasks = match (assignee.as_deref(), status, priority) {
        (Some(name), _, _) => service.get_by_assignee(name)?,
        (None, Some(s), _) => service.get_by_status(s),
        (None, None, Some(p)) => service.get_by_priority(p),
        (None, None, None) if overdue => service.get_overdue(),
        _ => service.get_all(),
    };
    if let Some(s) = status {
        tasks.retain(|t| t.status == s);
    }
    if let Some(p) = priority {
        tasks.retain(|t| t.priority == p);
    }
    if overdue {
        tasks.retain(|t| t.is_overdue());
    }
    if let Some(n) = limit {
        tasks.truncate(n);
    }

    if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        print_table(&tasks);
    }
    Ok(())
}

/// Show every field of a single task.
pub fn cmd_view(service: &TaskService, id: String) -> CmdResult {
    let task_id = resolve_task_identifier(&id, &service.get_all())?;
    match service.get_by_id(task_id) {
        Some(task) => {
            print_task(&task);
            Ok(())
        }
        None => Err(format!("Task {task_id} not found.").into()),
    }
}

/// Update an existing task. The current record is read, the requested
/// fields replaced, and the whole record submitted back to the service.
pub fn cmd_update(service: &mut TaskService, id: String, edits: TaskEdits) -> CmdResult {
    let task_id = resolve_task_identifier(&id, &service.get_all())?;
    let Some(mut task) = service.get_by_id(task_id) else {
        return Err(format!("Task {task_id} not found.").into());
    };
    edits.apply(&mut task)?;

    if !service.update(task)? {
        return Err(format!("Task {task_id} not found.").into());
    }
    println!("Updated task {task_id}");
    warn_if_unsaved(service);
    Ok(())
}

/// Delete a task.
pub fn cmd_delete(service: &mut TaskService, id: String) -> CmdResult {
    let task_id = resolve_task_identifier(&id, &service.get_all())?;
    let title = service.get_by_id(task_id).map(|t| t.title).unwrap_or_default();
    if !service.delete(task_id) {
        return Err(format!("Task {task_id} not found.").into());
    }
    println!("Deleted task {task_id} - {title}");
    warn_if_unsaved(service);
    Ok(())
}

/// Search tasks by free text.
pub fn cmd_search(service: &TaskService, query: String) -> CmdResult {
    let tasks = service.search(&query)?;
    if tasks.is_empty() {
        println!("No tasks match '{}'.", query.trim());
    } else {
        print_table(&tasks);
    }
    Ok(())
}

/// Print aggregate statistics.
pub fn cmd_stats(service: &TaskService) -> CmdResult {
    for line in statistics_lines(&service.statistics()) {
        println!("{line}");
    }
    Ok(())
}

/// Persist the collection immediately.
pub fn cmd_save(service: &mut TaskService) -> CmdResult {
    if service.save() {
        println!("Saved {} task(s) to {}", service.len(), service.config().path.display());
        Ok(())
    } else {
        Err(format!("Failed to save tasks to {}", service.config().path.display()).into())
    }
}

/// Launch the interactive terminal interface.
pub fn cmd_ui(service: &mut TaskService) -> CmdResult {
    crate::tui::run::run_tui(service)?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn warn_if_unsaved(service: &TaskService) {
    if service.is_dirty() && service.config().auto_save {
        eprintln!("Warning: change kept in memory but could not be saved to {}", service.config().path.display());
    }
}
