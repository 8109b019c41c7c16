use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::task::{NewTask, TaskId, TaskNode};
use crate::model::tree::{TaskTree, TreeError};

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

/// Create a task with a validated title. Returns the new id.
pub fn add_task(
    tree: &mut TaskTree,
    title: &str,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    parent: Option<&TaskId>,
) -> Result<TaskId, TreeError> {
    let title = clean_title(title)?;
    let new = NewTask {
        title,
        description: clean_description(description),
        due_date,
        ..Default::default()
    };
    tree.create_task(new, parent)
}

pub fn set_title(tree: &mut TaskTree, id: &TaskId, title: &str) -> Result<(), TreeError> {
    let title = clean_title(title)?;
    find_mut(tree, id)?.title = title;
    Ok(())
}

pub fn set_description(
    tree: &mut TaskTree,
    id: &TaskId,
    description: Option<String>,
) -> Result<(), TreeError> {
    find_mut(tree, id)?.description = clean_description(description);
    Ok(())
}

pub fn set_due_date(
    tree: &mut TaskTree,
    id: &TaskId,
    due_date: Option<DateTime<Utc>>,
) -> Result<(), TreeError> {
    find_mut(tree, id)?.due_date = due_date;
    Ok(())
}

/// Flip the done flag. Returns the new value.
pub fn toggle_done(tree: &mut TaskTree, id: &TaskId) -> Result<bool, TreeError> {
    let task = find_mut(tree, id)?;
    task.toggle_done();
    debug!(task = %id, done = task.done, "toggled done");
    Ok(task.done)
}

pub fn set_done(tree: &mut TaskTree, id: &TaskId, done: bool) -> Result<(), TreeError> {
    find_mut(tree, id)?.done = done;
    Ok(())
}

// ---------------------------------------------------------------------------
// Edit session
// ---------------------------------------------------------------------------

/// An open edit of the focused task.
///
/// While a session is open the tree's focus is locked, so the task being
/// edited cannot change underneath it.
#[derive(Debug, Clone)]
pub struct EditSession {
    task_id: TaskId,
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

impl EditSession {
    /// Open an edit of the focused task. `None` when nothing is focused or
    /// another edit already holds the focus lock.
    pub fn begin(tree: &mut TaskTree) -> Option<EditSession> {
        if tree.is_focus_locked() {
            debug!("edit refused: another edit is open");
            return None;
        }
        let task = tree.active_node()?;
        let session = EditSession {
            task_id: task.id().clone(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date,
        };
        tree.lock_focus();
        debug!(task = %session.task_id, "edit started");
        Some(session)
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Apply the draft and release the focus lock.
    ///
    /// On error nothing is applied and the session stays open.
    pub fn commit(&self, tree: &mut TaskTree) -> Result<(), TreeError> {
        let title = clean_title(&self.title)?;
        let task = find_mut(tree, &self.task_id)?;
        task.title = title;
        task.description = clean_description(Some(self.description.clone()));
        task.due_date = self.due_date;
        tree.unlock_focus();
        debug!(task = %self.task_id, "edit committed");
        Ok(())
    }

    /// Discard the draft and release the focus lock.
    pub fn cancel(self, tree: &mut TaskTree) {
        tree.unlock_focus();
        debug!(task = %self.task_id, "edit cancelled");
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_mut<'a>(
    tree: &'a mut TaskTree,
    id: &TaskId,
) -> Result<&'a mut TaskNode, TreeError> {
    tree.find_by_id_mut(id)
        .ok_or_else(|| TreeError::NotFound(id.to_string()))
}

fn clean_title(title: &str) -> Result<String, TreeError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TreeError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Blank descriptions are stored as absent
fn clean_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::date::parse_date_input;

    fn sample_tree() -> (TaskTree, TaskId, TaskId) {
        let mut tree = TaskTree::new();
        let a = add_task(&mut tree, "Plan trip", None, None, None).unwrap();
        let b = add_task(&mut tree, "Book hotel", Some("near the station".into()), None, Some(&a))
            .unwrap();
        (tree, a, b)
    }

    #[test]
    fn add_task_trims_and_validates_title() {
        let mut tree = TaskTree::new();
        let id = add_task(&mut tree, "  Pack bags ", None, None, None).unwrap();
        assert_eq!(tree.find_by_id(&id).unwrap().title, "Pack bags");

        assert_eq!(
            add_task(&mut tree, "   ", None, None, None),
            Err(TreeError::EmptyTitle)
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn blank_description_is_absent() {
        let mut tree = TaskTree::new();
        let id = add_task(&mut tree, "x", Some("  ".into()), None, None).unwrap();
        assert!(tree.find_by_id(&id).unwrap().description.is_none());
    }

    #[test]
    fn setters() {
        let (mut tree, a, b) = sample_tree();
        set_title(&mut tree, &a, "Plan holiday").unwrap();
        set_description(&mut tree, &b, None).unwrap();
        let due = parse_date_input("2025-06-01").unwrap();
        set_due_date(&mut tree, &b, Some(due)).unwrap();

        assert_eq!(tree.find_by_id(&a).unwrap().title, "Plan holiday");
        let b_node = tree.find_by_id(&b).unwrap();
        assert!(b_node.description.is_none());
        assert_eq!(b_node.due_date, Some(due));

        assert_eq!(set_title(&mut tree, &a, ""), Err(TreeError::EmptyTitle));
        assert!(matches!(
            set_done(&mut tree, &TaskId::from("missing"), true),
            Err(TreeError::NotFound(_))
        ));
    }

    #[test]
    fn toggle_done_flips() {
        let (mut tree, a, _) = sample_tree();
        assert_eq!(toggle_done(&mut tree, &a), Ok(true));
        assert_eq!(toggle_done(&mut tree, &a), Ok(false));
        set_done(&mut tree, &a, true).unwrap();
        assert!(tree.find_by_id(&a).unwrap().done);
    }

    #[test]
    fn edit_session_requires_focus() {
        let (mut tree, _, _) = sample_tree();
        assert!(EditSession::begin(&mut tree).is_none());
        assert!(!tree.is_focus_locked());
    }

    #[test]
    fn edit_session_locks_focus_until_commit() {
        let (mut tree, a, b) = sample_tree();
        tree.set_focus(&b).unwrap();

        let mut edit = EditSession::begin(&mut tree).unwrap();
        assert_eq!(edit.task_id(), &b);
        assert_eq!(edit.description, "near the station");
        assert!(tree.is_focus_locked());
        assert_eq!(tree.set_focus(&a), Ok(false));

        edit.title = "Book hostel".into();
        edit.description = String::new();
        edit.commit(&mut tree).unwrap();

        assert!(!tree.is_focus_locked());
        let node = tree.find_by_id(&b).unwrap();
        assert_eq!(node.title, "Book hostel");
        assert!(node.description.is_none());
    }

    #[test]
    fn only_one_edit_session_at_a_time() {
        let (mut tree, _, b) = sample_tree();
        tree.set_focus(&b).unwrap();
        let first = EditSession::begin(&mut tree).unwrap();

        assert!(EditSession::begin(&mut tree).is_none());
        assert!(tree.is_focus_locked());

        first.cancel(&mut tree);
        assert!(EditSession::begin(&mut tree).is_some());
    }

    #[test]
    fn failed_commit_keeps_session_open() {
        let (mut tree, _, b) = sample_tree();
        tree.set_focus(&b).unwrap();
        let mut edit = EditSession::begin(&mut tree).unwrap();
        edit.title = " ".into();

        assert_eq!(edit.commit(&mut tree), Err(TreeError::EmptyTitle));
        assert!(tree.is_focus_locked());
        assert_eq!(tree.find_by_id(&b).unwrap().title, "Book hotel");

        edit.cancel(&mut tree);
        assert!(!tree.is_focus_locked());
    }
}
