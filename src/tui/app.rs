//! Main application logic for the terminal user interface.
//!
//! `App` borrows the task service for the lifetime of the UI, keeps a
//! filtered snapshot of the tasks for display, and routes every change
//! through the service so validation and auto-save behave exactly as on
//! the command line.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use uuid::Uuid;

use crate::format::{format_due_relative, format_hours, format_timestamp, statistics_lines, truncate};
use crate::service::TaskService;
use crate::task::Task;
use crate::tui::{
    colors::{priority_color, status_color, DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD},
    enums::{AppState, InputMode, StatusFilter},
    task_form::*,
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App<'a> {
    service: &'a mut TaskService,
    state: AppState,
    task_list_state: TableState,
    visible: Vec<Task>,
    selected_task: Option<Uuid>,
    task_form: TaskForm,
    input_mode: InputMode,
    status_message: String,
    status_filter: StatusFilter,
    overdue_only: bool,
    search_text: String,
    search_active: bool,
    confirm_action: Option<String>,
    reload_armed: bool,
}

impl<'a> App<'a> {
    pub fn new(service: &'a mut TaskService) -> Self {
        let mut app = App {
            service,
            state: AppState::TaskList,
            task_list_state: TableState::default(),
            visible: Vec::new(),
            selected_task: None,
            task_form: TaskForm::new(),
            input_mode: InputMode::None,
            status_message: String::new(),
            status_filter: StatusFilter::All,
            overdue_only: false,
            search_text: String::new(),
            search_active: false,
            confirm_action: None,
            reload_armed: false,
        };
        let skipped = app.service.last_load_skipped();
        if skipped > 0 {
            app.set_status_message(format!("{skipped} unreadable record(s) were skipped on load"));
        }
        app.update_visible_tasks();
        app
    }

    /// Rebuild the visible snapshot from the service and current filters,
    /// keeping the selected task selected when it is still visible.
    fn update_visible_tasks(&mut self) {
        let old_selected_id = self
            .task_list_state
            .selected()
            .and_then(|idx| self.visible.get(idx))
            .map(|t| t.id);

        let mut tasks = if self.search_text.trim().is_empty() {
            self.service.get_all()
        } else {
            self.service.search(&self.search_text).unwrap_or_default()
        };
        let now = Local::now().fixed_offset();
        tasks.retain(|t| self.status_filter.matches(t.status));
        if self.overdue_only {
            tasks.retain(|t| t.is_overdue_at(now));
        }
        self.visible = tasks;

        let restored = old_selected_id.and_then(|id| self.visible.iter().position(|t| t.id == id));
        self.task_list_state.select(match restored {
            Some(idx) => Some(idx),
            None if self.visible.is_empty() => None,
            None => Some(0),
        });
    }

    fn highlighted_task(&self) -> Option<&Task> {
        self.task_list_state.selected().and_then(|idx| self.visible.get(idx))
    }

    fn get_selected_task(&self) -> Option<Task> {
        self.selected_task.and_then(|id| self.service.get_by_id(id))
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Suffix appended to change messages when auto-save did not persist them.
    fn unsaved_suffix(&self) -> &'static str {
        if self.service.is_dirty() && self.service.config().auto_save {
            " (not saved to disk)"
        } else {
            ""
        }
    }

    fn open_form(&mut self, form: TaskForm, state: AppState) {
        self.task_form = form;
        self.state = state;
        self.input_mode = InputMode::Text;
    }

    fn close_form(&mut self) {
        self.state = AppState::TaskList;
        self.input_mode = InputMode::None;
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.search_active = false;
                self.search_text.clear();
                self.input_mode = InputMode::None;
                self.update_visible_tasks();
                self.clear_status_message();
            }
            KeyCode::Enter => {
                self.search_active = false;
                self.input_mode = InputMode::None;
                if self.search_text.trim().is_empty() {
                    self.search_text.clear();
                    self.set_status_message("Search cleared".to_string());
                } else {
                    self.set_status_message(format!(
                        "Search '{}' ({} tasks)",
                        self.search_text,
                        self.visible.len()
                    ));
                }
            }
            KeyCode::Backspace => {
                if self.search_text.pop().is_some() {
                    self.update_visible_tasks();
                }
            }
            KeyCode::Char(c) => {
                self.search_text.push(c);
                self.update_visible_tasks();
            }
            _ => {}
        }
    }

    /// Handle a key in the task list. Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers, reload_armed: bool) -> bool {
        if self.search_active {
            self.handle_search_input(key);
            return false;
        }

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.search_text.is_empty() {
                    return true;
                }
                self.search_text.clear();
                self.update_visible_tasks();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    self.task_list_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.visible.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.highlighted_task().map(|t| t.id) {
                    self.selected_task = Some(id);
                    self.state = AppState::TaskDetail;
                }
            }
            KeyCode::Char('a') => {
                self.selected_task = None;
                self.open_form(TaskForm::new(), AppState::AddTask);
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.highlighted_task().cloned() {
                    self.selected_task = Some(task.id);
                    self.open_form(TaskForm::from_task(&task), AppState::EditTask);
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.highlighted_task().cloned() {
                    self.selected_task = Some(task.id);
                    self.confirm_action = Some(format!("Delete task {} - {}", task.short_id(), task.title));
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.highlighted_task().map(|t| t.id) {
                    self.cycle_status(id);
                }
            }
            KeyCode::Char('f') => {
                self.status_filter = self.status_filter.next();
                self.update_visible_tasks();
                self.set_status_message(format!(
                    "Status filter: {} ({} tasks)",
                    self.status_filter.label(),
                    self.visible.len()
                ));
            }
            KeyCode::Char('o') => {
                self.overdue_only = !self.overdue_only;
                self.update_visible_tasks();
                self.set_status_message(if self.overdue_only {
                    format!("Showing overdue tasks ({})", self.visible.len())
                } else {
                    "Showing all due dates".to_string()
                });
            }
            KeyCode::Char('/') => {
                self.search_active = true;
                self.input_mode = InputMode::Text;
            }
            KeyCode::Char('i') => {
                self.state = AppState::Statistics;
            }
            KeyCode::Char('S') => self.save_now(),
            KeyCode::Char('r') => self.reload(reload_armed),
            KeyCode::Char('h') | KeyCode::F(1) => {
                self.state = AppState::Help;
            }
            _ => {}
        }
        false
    }

    fn cycle_status(&mut self, id: Uuid) {
        let Some(mut task) = self.service.get_by_id(id) else {
            return;
        };
        task.status = task.status.next();
        let status = task.status;
        match self.service.update(task) {
            Ok(true) => {
                self.update_visible_tasks();
                let msg = format!("Status set to {}{}", status.label(), self.unsaved_suffix());
                self.set_status_message(msg);
            }
            Ok(false) => self.set_status_message("Task no longer exists".to_string()),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn save_now(&mut self) {
        let msg = if self.service.save() {
            format!("Saved {} task(s) to {}", self.service.len(), self.service.config().path.display())
        } else {
            "Save failed; changes are still in memory".to_string()
        };
        self.set_status_message(msg);
    }

    /// Reload from disk. Unsaved changes need a second `r` to discard.
    fn reload(&mut self, armed: bool) {
        if self.service.is_dirty() && !armed {
            self.reload_armed = true;
            self.set_status_message("Unsaved changes: press 'r' again to discard them, 'S' to save".to_string());
            return;
        }
        let msg = if self.service.load() {
            self.update_visible_tasks();
            match self.service.last_load_skipped() {
                0 => format!("Reloaded {} task(s)", self.service.len()),
                n => format!("Reloaded {} task(s), skipped {n} unreadable record(s)", self.service.len()),
            }
        } else {
            "Reload failed; keeping current tasks".to_string()
        };
        self.set_status_message(msg);
    }

    fn handle_detail_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.state = AppState::TaskList;
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.get_selected_task() {
                    self.open_form(TaskForm::from_task(&task), AppState::EditTask);
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.get_selected_task() {
                    self.confirm_action = Some(format!("Delete task {} - {}", task.short_id(), task.title));
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = self.selected_task {
                    self.cycle_status(id);
                }
            }
            _ => {}
        }
    }

    fn handle_form_input(&mut self, key: KeyCode, is_edit: bool) {
        match key {
            KeyCode::Esc => self.close_form(),
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => {
                let result = if is_edit { self.update_task() } else { self.create_task() };
                match result {
                    Ok(msg) => {
                        self.close_form();
                        self.update_visible_tasks();
                        let msg = format!("{msg}{}", self.unsaved_suffix());
                        self.set_status_message(msg);
                    }
                    Err(e) => self.set_status_message(format!("Error: {e}")),
                }
            }
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn create_task(&mut self) -> Result<String, String> {
        let task = self.task_form.to_new_task()?;
        let id = task.id;
        let short = task.short_id();
        self.service.create(task).map_err(|e| e.to_string())?;
        self.selected_task = Some(id);
        Ok(format!("Task {short} created"))
    }

    fn update_task(&mut self) -> Result<String, String> {
        let id = self.selected_task.ok_or("No task selected")?;
        let mut task = self.service.get_by_id(id).ok_or("Task no longer exists")?;
        self.task_form.apply_to(&mut task)?;
        match self.service.update(task) {
            Ok(true) => Ok("Task updated".to_string()),
            Ok(false) => Err("Task no longer exists".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn delete_selected_task(&mut self) {
        let Some(id) = self.selected_task.take() else {
            return;
        };
        if self.service.delete(id) {
            self.update_visible_tasks();
            let msg = format!("Task deleted{}", self.unsaved_suffix());
            self.set_status_message(msg);
        } else {
            self.set_status_message("Task no longer exists".to_string());
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if self.confirm_action.take().is_some() {
                    self.delete_selected_task();
                }
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.confirm_action = None;
            }
            _ => {}
        }
    }

    /// Dispatch one key press. Returns true if the application should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let reload_armed = std::mem::take(&mut self.reload_armed);
        if !matches!(self.state, AppState::AddTask | AppState::EditTask) {
            self.clear_status_message();
        }

        match self.state {
            AppState::TaskList => return self.handle_task_list_input(key.code, key.modifiers, reload_armed),
            AppState::TaskDetail => self.handle_detail_input(key.code),
            AppState::AddTask => self.handle_form_input(key.code, false),
            AppState::EditTask => self.handle_form_input(key.code, true),
            AppState::Statistics | AppState::Help => self.state = AppState::TaskList,
            AppState::Confirm => self.handle_confirm_input(key.code),
        }
        false
    }

    /// Poll for a key event. Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.handle_key(key));
            }
        }
        Ok(false)
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let now = Local::now().fixed_offset();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let mut context = format!("Status: {}", self.status_filter.label());
        if self.overdue_only {
            context.push_str("  Overdue only");
        }
        if !self.search_text.is_empty() {
            context.push_str(&format!("  Search: '{}'", self.search_text));
        }
        let header_text = Line::from(vec![
            Span::styled("TASK TRACKER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(context, Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
        ]);
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        let header_cells = ["ID", "Status", "Priority", "Due", "Assignee", "Title"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(GOLD).fg(Color::Rgb(20, 20, 20)))
            .height(1);

        let rows: Vec<Row> = self
            .visible
            .iter()
            .map(|task| {
                let due_style = if task.is_overdue_at(now) {
                    Style::default().fg(Color::White).bg(DARK_RED)
                } else {
                    Style::default()
                };
                let title = if task.tags.is_empty() {
                    task.title.clone()
                } else {
                    format!("{} [{}]", task.title, task.tags)
                };
                let row_style = if task.status.is_terminal() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(task.short_id()),
                    Cell::from(task.status.label()).style(Style::default().fg(status_color(task.status))),
                    Cell::from(task.priority.label()).style(Style::default().fg(priority_color(task.priority))),
                    Cell::from(format_due_relative(task, now)).style(due_style),
                    Cell::from(truncate(&task.assigned_to, 14)),
                    Cell::from(title),
                ])
                .style(row_style)
            })
            .collect();

        let widths = [
            Constraint::Length(8),  // ID
            Constraint::Length(12), // Status
            Constraint::Length(9),  // Priority
            Constraint::Length(10), // Due
            Constraint::Length(14), // Assignee
            Constraint::Min(20),    // Title
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.visible.len(),
                self.service.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    fn render_task_detail(&mut self, f: &mut Frame, area: Rect) {
        let Some(task) = self.get_selected_task() else {
            let missing = Paragraph::new("Task no longer exists. Press Esc to go back.")
                .block(Block::default().borders(Borders::ALL).title("Task Details"));
            f.render_widget(missing, area);
            return;
        };
        let now = Local::now().fixed_offset();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let field = |label: &'static str, value: String| {
            Line::from(vec![Span::styled(label, bold), Span::raw(value)])
        };

        let due = match task.due_date {
            Some(d) => format!("{} ({})", format_timestamp(&d), format_due_relative(&task, now)),
            None => "-".to_string(),
        };
        let mut text = vec![
            field("ID: ", task.id.to_string()),
            field("Title: ", task.title.clone()),
            Line::from(vec![
                Span::styled("Status: ", bold),
                Span::styled(task.status.label(), Style::default().fg(status_color(task.status))),
            ]),
            Line::from(vec![
                Span::styled("Priority: ", bold),
                Span::styled(task.priority.label(), Style::default().fg(priority_color(task.priority))),
            ]),
            field("Assigned to: ", or_dash(&task.assigned_to)),
            field("Tags: ", or_dash(&task.tags)),
            field("Due: ", due),
            field("Estimated: ", format_hours(task.estimated_hours)),
            field("Actual: ", format_hours(Some(task.actual_hours))),
            field("Created: ", format_timestamp(&task.created_at)),
            field("Updated: ", format_timestamp(&task.updated_at)),
            Line::from(""),
            Line::from(Span::styled("Description:", bold)),
        ];
        text.push(Line::from(or_dash(&task.description)));

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Details - [e]dit, [d]elete, [s]tatus, [Esc] back"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Assigned To
                Constraint::Length(3), // Tags
                Constraint::Length(3), // Due
                Constraint::Length(3), // Estimated
                Constraint::Length(3), // Actual
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Status
                Constraint::Min(1),    // Instructions
            ])
            .split(area);

        let labels = [
            (TITLE_FIELD, "Title *"),
            (DESCRIPTION_FIELD, "Description"),
            (ASSIGNEE_FIELD, "Assigned To"),
            (TAGS_FIELD, "Tags"),
            (DUE_FIELD, "Due (YYYY-MM-DD [HH:MM], today, tomorrow, in Nd)"),
            (ESTIMATE_FIELD, "Estimated hours"),
            (ACTUAL_FIELD, "Actual hours"),
        ];
        for (field, label) in labels {
            let Some(input) = self.task_form.input(field) else {
                continue;
            };
            let widget = Paragraph::new(input.value.as_str())
                .block(self.form_block(field, label));
            f.render_widget(widget, chunks[field]);
        }

        let priority = Paragraph::new(format!("< {} >", self.task_form.selected_priority().label()))
            .block(self.form_block(PRIORITY_FIELD, "Priority"));
        f.render_widget(priority, chunks[PRIORITY_FIELD]);
        let status = Paragraph::new(format!("< {} >", self.task_form.selected_status().label()))
            .block(self.form_block(STATUS_FIELD, "Status"));
        f.render_widget(status, chunks[STATUS_FIELD]);

        let help_text = if is_edit {
            "Tab/Up/Down: Navigate  Left/Right: Change selectors  Enter: Save  Esc: Cancel"
        } else {
            "Tab/Up/Down: Navigate  Left/Right: Change selectors  Enter: Create  Esc: Cancel"
        };
        let instructions = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Instructions"))
            .wrap(Wrap { trim: true });
        f.render_widget(instructions, chunks[9]);

        if self.input_mode != InputMode::Text {
            return;
        }
        if let Some(input) = self.task_form.input(self.task_form.current_field) {
            let chunk = chunks[self.task_form.current_field];
            f.set_cursor_position((chunk.x + input.cursor as u16 + 1, chunk.y + 1));
        }
    }

    fn form_block(&self, field: usize, title: &'static str) -> Block<'static> {
        let style = if self.task_form.current_field == field {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        };
        Block::default().borders(Borders::ALL).title(title).border_style(style)
    }

    fn render_statistics(&mut self, f: &mut Frame, area: Rect) {
        let stats = self.service.statistics();
        let text: Vec<Line> = statistics_lines(&stats).into_iter().map(Line::from).collect();

        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Statistics - Press any key to return")
                .border_style(Style::default().fg(DARK_GREEN)),
        );
        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let heading = |s: &'static str| {
            Line::from(Span::styled(s, Style::default().add_modifier(Modifier::BOLD)))
        };
        let help_text = vec![
            heading("Task List:"),
            Line::from("  Up/Down, k/j   Navigate tasks"),
            Line::from("  Enter/Space    View task details"),
            Line::from("  a              Add new task"),
            Line::from("  e              Edit selected task"),
            Line::from("  d              Delete selected task"),
            Line::from("  s              Cycle status (Not Started, In Progress, Completed, Cancelled, On Hold)"),
            Line::from("  f              Cycle status filter"),
            Line::from("  o              Toggle overdue-only view"),
            Line::from("  /              Search title, description, tags and assignee"),
            Line::from("  i              Show statistics"),
            Line::from("  S              Save now"),
            Line::from("  r              Reload from disk"),
            Line::from("  h/F1           Show this help"),
            Line::from("  q/Esc/Ctrl+C   Quit"),
            Line::from(""),
            heading("Task Detail:"),
            Line::from("  e/d/s          Edit, delete, cycle status"),
            Line::from("  Esc/q          Back to task list"),
            Line::from(""),
            heading("Form:"),
            Line::from("  Tab/Up/Down    Move between fields"),
            Line::from("  Left/Right     Move cursor or change selector"),
            Line::from("  Enter          Save"),
            Line::from("  Esc            Cancel"),
            Line::from(""),
            heading("Due Date Formats:"),
            Line::from("  2030-12-25          End of that day"),
            Line::from("  2030-12-25 14:30    Local time"),
            Line::from("  today, tomorrow     End of day"),
            Line::from("  in 3d, next monday  Relative dates"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return")
                    .border_style(Style::default().fg(DARK_PURPLE)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to:",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(self.confirm_action.as_deref().unwrap_or("")),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.search_active {
            format!("Search: {} (Esc to clear, Enter to confirm)", self.search_text)
        } else {
            let dirty = if self.service.is_dirty() { " | unsaved changes" } else { "" };
            match self.state {
                AppState::TaskList => format!("Tasks: {}{dirty} | Press 'h' for help", self.visible.len()),
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Statistics => "Statistics".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(GOLD).fg(Color::Rgb(20, 20, 20)))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
            AppState::AddTask => self.render_task_form(f, chunks[0], false),
            AppState::EditTask => self.render_task_form(f, chunks[0], true),
            AppState::Statistics => {
                self.render_task_list(f, chunks[0]);
                self.render_statistics(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop. Runs until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn or_dash(s: &str) -> String {
    if s.is_empty() { "-".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::fields::Status;
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn service_in(dir: &TempDir) -> TaskService {
        TaskService::open(ServiceConfig::with_path(dir.path().join("tasks.json"))).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_add_task_through_form() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        {
            let mut app = App::new(&mut service);
            press(&mut app, KeyCode::Char('a'));
            assert_eq!(app.state, AppState::AddTask);
            type_text(&mut app, "Plan sprint");
            press(&mut app, KeyCode::Enter);
            assert_eq!(app.state, AppState::TaskList);
            assert_eq!(app.visible.len(), 1);
        }
        assert_eq!(service.len(), 1);
        assert!(!service.is_dirty());
        assert_eq!(service_in(&dir).get_all()[0].title, "Plan sprint");
    }

    #[test]
    fn test_blank_title_keeps_form_open() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        let mut app = App::new(&mut service);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert!(app.status_message.starts_with("Error"));
    }

    #[test]
    fn test_status_cycle_filter_and_delete() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        service.create(Task::new("one")).unwrap();
        service.create(Task::new("two")).unwrap();

        let mut app = App::new(&mut service);
        press(&mut app, KeyCode::Char('s'));
        let changed = app.visible[0].id;
        assert_eq!(app.service.get_by_id(changed).unwrap().status, Status::InProgress);

        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.status_filter, StatusFilter::Only(Status::InProgress));
        assert_eq!(app.visible.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('y'));
        assert!(app.service.get_by_id(changed).is_none());
        assert!(app.visible.is_empty());
    }

    #[test]
    fn test_search_narrows_list() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        service.create(Task::new("Fix login bug")).unwrap();
        service.create(Task::new("Write release notes")).unwrap();

        let mut app = App::new(&mut service);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "LOGIN");
        assert_eq!(app.visible.len(), 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible.len(), 2);
        assert!(!app.search_active);
    }

    #[test]
    fn test_reload_with_unsaved_changes_needs_confirmation() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            auto_save: false,
            ..ServiceConfig::with_path(dir.path().join("tasks.json"))
        };
        let mut service = TaskService::open(config).unwrap();
        service.create(Task::new("draft")).unwrap();

        let mut app = App::new(&mut service);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.service.len(), 1);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.service.len(), 0);
    }

    #[test]
    fn test_quit_keys() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        let mut app = App::new(&mut service);
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.state, AppState::Help);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::TaskList);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_render_every_screen() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        let mut task = Task::new("Render me");
        task.due_date = crate::format::parse_due_input("2001-01-01");
        service.create(task).unwrap();

        let mut app = App::new(&mut service);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for state in [
            AppState::TaskList,
            AppState::Statistics,
            AppState::Help,
            AppState::Confirm,
        ] {
            app.state = state;
            terminal.draw(|f| app.render(f)).unwrap();
        }
        app.state = AppState::TaskList;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::TaskDetail);
        terminal.draw(|f| app.render(f)).unwrap();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditTask);
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
