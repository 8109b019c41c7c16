use std::collections::HashSet;

use tracing::debug;

use super::record::{DecodeError, TaskRecord, TreeRecord};
use super::settings::Settings;
use super::task::{NewTask, TaskId, TaskNode};

/// Error type for tree mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id already in use: {0}")]
    DuplicateId(TaskId),
    #[error("task id {prefix} is ambiguous: {count} tasks match")]
    Ambiguous { prefix: String, count: usize },
    #[error("cannot move {0} below itself")]
    WouldCycle(TaskId),
    #[error("task title must not be empty")]
    EmptyTitle,
}

/// The whole task forest, plus focus and display settings.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    roots: Vec<TaskNode>,
    active: Option<TaskId>,
    focus_locked: bool,
    settings: Settings,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roots(&self) -> &[TaskNode] {
        &self.roots
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of tasks at every depth
    pub fn len(&self) -> usize {
        self.roots.iter().map(TaskNode::subtree_len).sum()
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Append a root. Fails if any id in `node`'s subtree is already used.
    pub fn add_root(&mut self, mut node: TaskNode) -> Result<(), TreeError> {
        self.check_ids_free(&node)?;
        node.set_parent(None);
        debug!(task = %node.id(), "added root task");
        self.roots.push(node);
        Ok(())
    }

    /// Attach `node` as the last child of `parent`.
    ///
    /// Returns `Ok(false)` when `node` is already a child of `parent`.
    pub fn add_child(&mut self, parent: &TaskId, node: TaskNode) -> Result<bool, TreeError> {
        let already_child = self
            .find_by_id(parent)
            .ok_or_else(|| TreeError::NotFound(parent.to_string()))?
            .is_descendant(node.id(), false);
        if already_child {
            return Ok(false);
        }
        self.check_ids_free(&node)?;
        let parent_node = self
            .find_by_id_mut(parent)
            .ok_or_else(|| TreeError::NotFound(parent.to_string()))?;
        debug!(task = %node.id(), parent = %parent, "added child task");
        Ok(parent_node.add_child(node))
    }

    /// Create a task as the last child of `parent`, or as the last root.
    pub fn create_task(
        &mut self,
        new: NewTask,
        parent: Option<&TaskId>,
    ) -> Result<TaskId, TreeError> {
        let node = new.into_node();
        let id = node.id().clone();
        match parent {
            Some(parent) => {
                self.add_child(parent, node)?;
            }
            None => self.add_root(node)?,
        }
        Ok(id)
    }

    fn check_ids_free(&self, node: &TaskNode) -> Result<(), TreeError> {
        let mut clash = None;
        node.for_each(&mut |n| {
            if clash.is_none() && self.contains_node(n.id()) {
                clash = Some(n.id().clone());
            }
        });
        match clash {
            Some(id) => Err(TreeError::DuplicateId(id)),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn contains_node(&self, id: &TaskId) -> bool {
        self.roots
            .iter()
            .any(|r| r.id() == id || r.is_descendant(id, true))
    }

    /// Depth-first pre-order search: roots in order, then their subtrees.
    pub fn find_by_id(&self, id: &TaskId) -> Option<&TaskNode> {
        self.roots.iter().find_map(|r| r.find(id))
    }

    /// Mutable lookup for attribute edits inside the crate. Not public, so
    /// nodes can only be attached through the id-checked `add_root` and
    /// `add_child`.
    pub(crate) fn find_by_id_mut(&mut self, id: &TaskId) -> Option<&mut TaskNode> {
        self.roots.iter_mut().find_map(|r| r.find_mut(id))
    }

    /// The direct parent of `id`, if it is not a root.
    pub fn parent_of(&self, id: &TaskId) -> Option<&TaskNode> {
        let parent_id = self.find_by_id(id)?.parent_id()?;
        self.find_by_id(parent_id)
    }

    /// Resolve a full id or a unique id prefix.
    pub fn resolve_id(&self, prefix: &str) -> Result<TaskId, TreeError> {
        let exact = TaskId::from(prefix);
        if self.contains_node(&exact) {
            return Ok(exact);
        }
        let mut matches = Vec::new();
        self.for_each(&mut |n| {
            if !prefix.is_empty() && n.id().as_str().starts_with(prefix) {
                matches.push(n.id().clone());
            }
        });
        match matches.len() {
            0 => Err(TreeError::NotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(TreeError::Ambiguous {
                prefix: prefix.to_string(),
                count,
            }),
        }
    }

    /// Visit every task in pre-order.
    pub fn for_each(&self, f: &mut dyn FnMut(&TaskNode)) {
        for root in &self.roots {
            root.for_each(f);
        }
    }

    /// Every task in pre-order, paired with its depth (roots are 0).
    pub fn walk(&self) -> Vec<(usize, &TaskNode)> {
        fn visit<'a>(node: &'a TaskNode, depth: usize, out: &mut Vec<(usize, &'a TaskNode)>) {
            out.push((depth, node));
            for child in node.children() {
                visit(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        for root in &self.roots {
            visit(root, 0, &mut out);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Removal and reparenting
    // -----------------------------------------------------------------------

    /// Remove a task together with its subtree.
    ///
    /// Returns `None` if the task is not in this tree. Clears the focus when
    /// the focused task was removed, even while focus is locked.
    pub fn remove_node(&mut self, id: &TaskId) -> Option<TaskNode> {
        let removed = self.detach(id)?;
        let lost_focus = self
            .active
            .as_ref()
            .is_some_and(|a| a == removed.id() || removed.is_descendant(a, true));
        if lost_focus {
            self.active = None;
        }
        debug!(task = %id, removed = removed.subtree_len(), "removed task");
        Some(removed)
    }

    /// Move a task (with its subtree) below `new_parent`, or to the end of
    /// the root list when `new_parent` is `None`.
    pub fn move_node(&mut self, id: &TaskId, new_parent: Option<&TaskId>) -> Result<(), TreeError> {
        let node = self
            .find_by_id(id)
            .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
        if let Some(target) = new_parent {
            if target == id || node.is_descendant(target, true) {
                return Err(TreeError::WouldCycle(id.clone()));
            }
            if !self.contains_node(target) {
                return Err(TreeError::NotFound(target.to_string()));
            }
        }

        let node = self
            .detach(id)
            .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
        match new_parent {
            Some(target) => {
                let parent = self
                    .find_by_id_mut(target)
                    .ok_or_else(|| TreeError::NotFound(target.to_string()))?;
                parent.add_child(node);
            }
            None => {
                let mut node = node;
                node.set_parent(None);
                self.roots.push(node);
            }
        }
        debug!(task = %id, parent = ?new_parent.map(TaskId::as_str), "moved task");
        Ok(())
    }

    /// Structural removal without touching focus
    fn detach(&mut self, id: &TaskId) -> Option<TaskNode> {
        if let Some(pos) = self.roots.iter().position(|r| r.id() == id) {
            return Some(self.roots.remove(pos));
        }
        self.roots
            .iter_mut()
            .find(|r| r.is_descendant(id, true))
            .and_then(|r| remove_below(r, id))
    }

    // -----------------------------------------------------------------------
    // Focus
    // -----------------------------------------------------------------------

    pub fn active_id(&self) -> Option<&TaskId> {
        self.active.as_ref()
    }

    pub fn active_node(&self) -> Option<&TaskNode> {
        self.find_by_id(self.active.as_ref()?)
    }

    pub fn is_focus_locked(&self) -> bool {
        self.focus_locked
    }

    pub fn lock_focus(&mut self) {
        self.focus_locked = true;
    }

    pub fn unlock_focus(&mut self) {
        self.focus_locked = false;
    }

    /// Focus a task. Unknown ids are an error; a locked focus is reported
    /// as `Ok(false)` and leaves the focus unchanged.
    pub fn set_focus(&mut self, id: &TaskId) -> Result<bool, TreeError> {
        if !self.contains_node(id) {
            return Err(TreeError::NotFound(id.to_string()));
        }
        if self.focus_locked {
            debug!(task = %id, "focus change refused: focus is locked");
            return Ok(false);
        }
        self.active = Some(id.clone());
        Ok(true)
    }

    /// Drop the focus. Returns `false` when refused because focus is locked.
    pub fn clear_focus(&mut self) -> bool {
        if self.focus_locked {
            debug!("focus clear refused: focus is locked");
            return false;
        }
        self.active = None;
        true
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn serialize(&self) -> TreeRecord {
        TreeRecord {
            roots: Some(self.roots.iter().map(TaskNode::serialize).collect()),
            settings: Some(self.settings.to_pairs()),
        }
    }

    /// Rebuild a tree. A record missing `roots` or `settings`, or repeating
    /// an id, is rejected as a whole. The result is unfocused and unlocked.
    pub fn deserialize(record: &TreeRecord) -> Result<TaskTree, DecodeError> {
        let roots = record
            .roots
            .as_ref()
            .ok_or(DecodeError::MissingField("roots"))?;
        let settings = record
            .settings
            .as_ref()
            .ok_or(DecodeError::MissingField("settings"))?;

        let mut seen = HashSet::new();
        for root in roots {
            check_unique(root, &mut seen)?;
        }

        let mut tree = TaskTree {
            settings: Settings::from_pairs(settings.iter().cloned()),
            ..Default::default()
        };
        tree.roots = roots
            .iter()
            .filter_map(|r| TaskNode::deserialize(Some(r), None))
            .collect();
        debug!(tasks = tree.len(), "deserialized task tree");
        Ok(tree)
    }
}

fn remove_below(node: &mut TaskNode, id: &TaskId) -> Option<TaskNode> {
    if node.is_descendant(id, false) {
        return node.remove_child(id);
    }
    node.children_mut()
        .iter_mut()
        .find(|c| c.is_descendant(id, true))
        .and_then(|c| remove_below(c, id))
}

fn check_unique(record: &TaskRecord, seen: &mut HashSet<TaskId>) -> Result<(), DecodeError> {
    if !seen.insert(record.id.clone()) {
        return Err(DecodeError::DuplicateId(record.id.clone()));
    }
    for child in &record.children {
        check_unique(child, seen)?;
    }
    Ok(())
}
