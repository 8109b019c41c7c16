use chrono::NaiveDate;

use crate::model::task::{TaskId, TaskNode};
use crate::model::tree::TaskTree;
use crate::util::date::{DueClass, classify_on, format_date_display};

pub const NO_DESCRIPTION: &str = "no description";

/// Contents of the detail panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    NoSelection,
    Task(TaskDetail),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub id: TaskId,
    pub title: String,
    /// The description, or the placeholder when there is none
    pub description: String,
    pub has_description: bool,
    pub creation_date: String,
    pub due_date: String,
    pub due_class: Option<DueClass>,
    pub done: bool,
    pub has_parent: bool,
    pub child_count: usize,
}

impl TaskDetail {
    pub fn of(task: &TaskNode, today: NaiveDate) -> TaskDetail {
        let (description, has_description) = match &task.description {
            Some(text) => (text.clone(), true),
            None => (NO_DESCRIPTION.to_string(), false),
        };
        TaskDetail {
            id: task.id().clone(),
            title: task.title.clone(),
            description,
            has_description,
            creation_date: format_date_display(Some(&task.creation_date())),
            due_date: format_date_display(task.due_date.as_ref()),
            due_class: task.due_date.as_ref().map(|due| classify_on(due, today)),
            done: task.done,
            has_parent: task.has_parent(),
            child_count: task.children().len(),
        }
    }
}

/// Detail of the focused task
pub fn detail_view(tree: &TaskTree, today: NaiveDate) -> DetailView {
    match tree.active_node() {
        Some(task) => DetailView::Task(TaskDetail::of(task, today)),
        None => DetailView::NoSelection,
    }
}
