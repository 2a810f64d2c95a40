//! Pure rendering from tasks to a view tree. Nothing here touches the terminal, so a
//! re-render from the same input always produces the same tree.

use crate::models::{Task, TaskId, TaskStatus};
use crate::state::ListStatus;

pub const EMPTY_PLACEHOLDER: &str = "No tasks yet.";
pub const LOADING_TEXT: &str = "Loading tasks...";
pub const META_SEPARATOR: &str = " • ";

const DUE_DATE_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    MarkDone(TaskId),
    Delete(TaskId),
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::MarkDone(_) => "Mark done",
            RowAction::Delete(_) => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    /// Raw status value, used to pick the badge style.
    pub class: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub meta: String,
    pub status: TaskStatus,
    pub badge: Badge,
    pub actions: Vec<RowAction>,
}

impl TaskRow {
    pub fn can_mark_done(&self) -> bool {
        self.actions
            .iter()
            .any(|action| matches!(action, RowAction::MarkDone(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskListView {
    Placeholder(&'static str),
    Rows(Vec<TaskRow>),
}

impl TaskListView {
    pub fn rows(&self) -> &[TaskRow] {
        match self {
            TaskListView::Placeholder(_) => &[],
            TaskListView::Rows(rows) => rows,
        }
    }
}

/// The list area for any list status.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    Loading,
    Failed(String),
    Tasks(TaskListView),
}

impl ListView {
    pub fn rows(&self) -> &[TaskRow] {
        match self {
            ListView::Tasks(view) => view.rows(),
            _ => &[],
        }
    }
}

pub fn render_list(list: &ListStatus) -> ListView {
    match list {
        ListStatus::Loading => ListView::Loading,
        ListStatus::Failed(reason) => ListView::Failed(reason.clone()),
        ListStatus::Loaded(tasks) => ListView::Tasks(render_tasks(tasks)),
    }
}

pub fn render_tasks(tasks: &[Task]) -> TaskListView {
    if tasks.is_empty() {
        return TaskListView::Placeholder(EMPTY_PLACEHOLDER);
    }
    TaskListView::Rows(tasks.iter().map(render_row).collect())
}

pub fn render_row(task: &Task) -> TaskRow {
    let mut actions = Vec::with_capacity(2);
    if !task.status.is_done() {
        actions.push(RowAction::MarkDone(task.id));
    }
    actions.push(RowAction::Delete(task.id));

    TaskRow {
        id: task.id,
        title: task.title.clone(),
        meta: meta_line(task),
        status: task.status.clone(),
        badge: Badge {
            label: task.status.label(),
            class: task.status.as_str().to_string(),
        },
        actions,
    }
}

fn meta_line(task: &Task) -> String {
    let due = task
        .due_date
        .as_deref()
        .filter(|due| !due.trim().is_empty())
        .map(|due| format!("Due: {}", due.chars().take(DUE_DATE_CHARS).collect::<String>()))
        .unwrap_or_default();

    [task.description.as_str(), due.as_str()]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(META_SEPARATOR)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub label: &'static str,
    pub value: Option<TaskStatus>,
    pub active: bool,
}

pub fn filter_options() -> [(&'static str, Option<TaskStatus>); 4] {
    [
        ("All", None),
        ("Pending", Some(TaskStatus::Pending)),
        ("In progress", Some(TaskStatus::InProgress)),
        ("Done", Some(TaskStatus::Done)),
    ]
}

/// Parses a filter control value; blank means "all".
pub fn parse_filter(value: &str) -> Option<TaskStatus> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(TaskStatus::from(value))
    }
}

/// Exactly one control is active. A filter outside the fixed set gets an extra active
/// `Custom` control.
pub fn filter_controls(active: &Option<TaskStatus>) -> Vec<FilterControl> {
    let mut controls: Vec<FilterControl> = filter_options()
        .into_iter()
        .map(|(label, value)| FilterControl {
            active: &value == active,
            label,
            value,
        })
        .collect();
    if !controls.iter().any(|control| control.active) {
        controls.push(FilterControl {
            label: "Custom",
            value: active.clone(),
            active: true,
        });
    }
    controls
}
