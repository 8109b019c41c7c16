use serde::Serialize;

use crate::model::task::TaskNode;
use crate::ops::search::SearchHit;
use crate::util::date::{DueClass, format_date_value};
use crate::view::calendar::AgendaGroup;
use crate::view::{DueCell, ListRow, TaskDetail};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct RowJson {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub done: bool,
    pub has_children: bool,
    pub collapsed: bool,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_class: Option<DueClass>,
}

#[derive(Serialize)]
pub struct DetailJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_class: Option<DueClass>,
    pub done: bool,
    pub has_parent: bool,
    pub children: usize,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub task_id: String,
    pub title: String,
    pub field: String,
}

#[derive(Serialize)]
pub struct AgendaGroupJson {
    pub class: DueClass,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct DisplayJson {
    pub due_display: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// A task with its whole subtree
pub fn task_to_json(task: &TaskNode) -> TaskJson {
    TaskJson {
        children: task.children().iter().map(task_to_json).collect(),
        ..task_summary_json(task)
    }
}

/// A task without its children
pub fn task_summary_json(task: &TaskNode) -> TaskJson {
    TaskJson {
        id: task.id().to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        done: task.done,
        parent_id: task.parent_id().map(ToString::to_string),
        created: format_date_value(Some(&task.creation_date())),
        due: task.due_date.as_ref().map(|d| format_date_value(Some(d))),
        children: Vec::new(),
    }
}

pub fn row_to_json(row: &ListRow) -> RowJson {
    let due = match &row.due {
        DueCell::Date(text) | DueCell::Badge { text, .. } => Some(text.clone()),
        DueCell::Hidden | DueCell::Colour(_) => None,
    };
    RowJson {
        id: row.id.to_string(),
        title: row.title.clone(),
        depth: row.depth,
        done: row.done,
        has_children: row.has_children,
        collapsed: row.collapsed,
        selected: row.selected,
        due,
        due_class: row.due.class(),
    }
}

pub fn detail_to_json(detail: &TaskDetail) -> DetailJson {
    DetailJson {
        id: detail.id.to_string(),
        title: detail.title.clone(),
        description: detail
            .has_description
            .then(|| detail.description.clone()),
        created: detail.creation_date.clone(),
        due: detail.due_class.map(|_| detail.due_date.clone()),
        due_class: detail.due_class,
        done: detail.done,
        has_parent: detail.has_parent,
        children: detail.child_count,
    }
}

pub fn agenda_to_json(groups: &[AgendaGroup<'_>]) -> Vec<AgendaGroupJson> {
    groups
        .iter()
        .map(|g| AgendaGroupJson {
            class: g.class,
            tasks: g.tasks.iter().map(|t| task_summary_json(t)).collect(),
        })
        .collect()
}

pub fn hit_to_json(hit: &SearchHit, title: &str) -> SearchHitJson {
    SearchHitJson {
        task_id: hit.task_id.to_string(),
        title: title.to_string(),
        field: hit.field.as_str().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn check_char(done: bool) -> char {
    if done { 'x' } else { ' ' }
}

fn ansi_code(class: DueClass) -> &'static str {
    match class {
        DueClass::Overdue => "31",
        DueClass::DueToday => "33",
        DueClass::DueSoon => "36",
        DueClass::Later => "32",
    }
}

fn paint(text: &str, class: DueClass) -> String {
    format!("\x1b[{}m{}\x1b[0m", ansi_code(class), text)
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &TaskNode) -> String {
    let due = task
        .due_date
        .as_ref()
        .map(|d| format!("  due {}", format_date_value(Some(d))))
        .unwrap_or_default();
    format!(
        "[{}] {} {}{}",
        check_char(task.done),
        task.id().short(),
        task.title,
        due
    )
}

/// Format one list row, indented by depth
pub fn format_row(row: &ListRow) -> String {
    let cursor = if row.selected { '>' } else { ' ' };
    let fold = match (row.has_children, row.collapsed) {
        (false, _) => ' ',
        (true, false) => '▾',
        (true, true) => '▸',
    };
    let title = match &row.due {
        DueCell::Colour(class) => paint(&row.title, *class),
        _ => row.title.clone(),
    };
    let due = match &row.due {
        DueCell::Date(text) => format!("  {}", text),
        DueCell::Badge { text, .. } => format!("  [{}]", text),
        DueCell::Hidden | DueCell::Colour(_) => String::new(),
    };
    format!(
        "{}{}{} [{}] {} {}{}",
        cursor,
        "  ".repeat(row.depth),
        fold,
        check_char(row.done),
        row.id.short(),
        title,
        due
    )
}

/// Format the detail panel
pub fn format_task_detail(detail: &TaskDetail) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "[{}] {} {}",
        check_char(detail.done),
        detail.id,
        detail.title
    ));
    lines.push(format!("created: {}", detail.creation_date));
    match detail.due_class {
        Some(class) => lines.push(format!("due: {} ({})", detail.due_date, class)),
        None => lines.push(format!("due: {}", detail.due_date)),
    }
    if detail.has_parent {
        lines.push("subtask: yes".to_string());
    }
    if detail.child_count > 0 {
        lines.push(format!("subtasks: {}", detail.child_count));
    }
    lines.push(String::new());
    if detail.has_description {
        lines.extend(detail.description.lines().map(str::to_string));
    } else {
        lines.push(format!("({})", detail.description));
    }
    lines
}

/// Format agenda groups under headers
pub fn format_agenda(groups: &[AgendaGroup<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("== {} ==", group.class));
        for task in &group.tasks {
            lines.push(format_task_line(task));
        }
    }
    lines
}
