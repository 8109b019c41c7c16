use chrono::NaiveDate;

use crate::model::settings::DueDisplay;
use crate::model::task::{TaskId, TaskNode};
use crate::model::tree::TaskTree;
use crate::util::date::{DueClass, classify_on, format_date_display, relative_days_on};

use super::fold::FoldMap;

/// How a row shows its due date under the current display mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueCell {
    /// Mode is `none`, or the task has no due date
    Hidden,
    /// Plain `DD.MM.YYYY` date
    Date(String),
    /// Short label: `overdue`, `today`, `3d`, or the date for later tasks
    Badge { class: DueClass, text: String },
    /// No text; the title is coloured by class
    Colour(DueClass),
}

impl DueCell {
    pub fn for_task(task: &TaskNode, mode: DueDisplay, today: NaiveDate) -> DueCell {
        let Some(due) = task.due_date.as_ref() else {
            return DueCell::Hidden;
        };
        match mode {
            DueDisplay::None => DueCell::Hidden,
            DueDisplay::Dates => DueCell::Date(format_date_display(Some(due))),
            DueDisplay::Badges => {
                let class = classify_on(due, today);
                let text = match class {
                    DueClass::Overdue => "overdue".to_string(),
                    DueClass::DueToday => "today".to_string(),
                    DueClass::DueSoon => format!("{}d", relative_days_on(due, today)),
                    DueClass::Later => format_date_display(Some(due)),
                };
                DueCell::Badge { class, text }
            }
            DueDisplay::Colours => DueCell::Colour(classify_on(due, today)),
        }
    }

    pub fn class(&self) -> Option<DueClass> {
        match self {
            DueCell::Badge { class, .. } | DueCell::Colour(class) => Some(*class),
            DueCell::Hidden | DueCell::Date(_) => None,
        }
    }
}

/// One visible line of the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: TaskId,
    pub title: String,
    pub depth: usize,
    pub done: bool,
    pub has_children: bool,
    pub collapsed: bool,
    /// The row is the focused task
    pub selected: bool,
    pub is_last_sibling: bool,
    /// For each ancestor level, whether that ancestor was the last sibling
    pub ancestor_last: Vec<bool>,
    pub due: DueCell,
}

/// Flatten the tree into visible rows in pre-order.
///
/// Children of collapsed tasks are skipped. Every rendered task with
/// children is recorded in `fold` so later collapse-all calls see it.
pub fn build_rows(tree: &TaskTree, fold: &mut FoldMap, today: NaiveDate) -> Vec<ListRow> {
    let ctx = RowContext {
        mode: tree.settings().due_display(),
        active: tree.active_id(),
        today,
    };
    let mut rows = Vec::new();
    flatten(tree.roots(), 0, &[], &ctx, fold, &mut rows);
    rows
}

struct RowContext<'a> {
    mode: DueDisplay,
    active: Option<&'a TaskId>,
    today: NaiveDate,
}

fn flatten(
    tasks: &[TaskNode],
    depth: usize,
    ancestor_last: &[bool],
    ctx: &RowContext<'_>,
    fold: &mut FoldMap,
    rows: &mut Vec<ListRow>,
) {
    let count = tasks.len();
    for (i, task) in tasks.iter().enumerate() {
        let is_last = i + 1 == count;
        fold.observe(task);
        let collapsed = fold.is_collapsed(task.id());

        rows.push(ListRow {
            id: task.id().clone(),
            title: task.title.clone(),
            depth,
            done: task.done,
            has_children: task.has_children(),
            collapsed,
            selected: ctx.active == Some(task.id()),
            is_last_sibling: is_last,
            ancestor_last: ancestor_last.to_vec(),
            due: DueCell::for_task(task, ctx.mode, ctx.today),
        });

        if task.has_children() && !collapsed {
            let mut next = ancestor_last.to_vec();
            next.push(is_last);
            flatten(task.children(), depth + 1, &next, ctx, fold, rows);
        }
    }
}
