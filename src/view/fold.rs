use std::collections::HashMap;

use crate::model::task::{TaskId, TaskNode};
use crate::model::tree::TaskTree;

/// Per-task collapsed flags for the list view. Never persisted.
///
/// A missing entry means expanded. Only tasks with children get entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldMap {
    collapsed: HashMap<TaskId, bool>,
}

impl FoldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &TaskId) -> bool {
        self.collapsed.get(id).copied().unwrap_or(false)
    }

    /// Number of tasks with an entry
    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }

    /// Record a rendered task: tasks with children default to expanded.
    pub fn observe(&mut self, node: &TaskNode) {
        if node.has_children() {
            self.collapsed.entry(node.id().clone()).or_insert(false);
        }
    }

    /// Flip a task's collapsed flag. Leaves are ignored.
    /// Returns the new collapsed state.
    pub fn toggle(&mut self, node: &TaskNode) -> bool {
        if !node.has_children() {
            return false;
        }
        let flag = self.collapsed.entry(node.id().clone()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn set_collapsed(&mut self, node: &TaskNode, collapsed: bool) {
        if node.has_children() {
            self.collapsed.insert(node.id().clone(), collapsed);
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    /// Collapse every task that already has an entry.
    ///
    /// Tasks that were never rendered or toggled are left alone and show up
    /// expanded when first rendered.
    pub fn collapse_all(&mut self) {
        for flag in self.collapsed.values_mut() {
            *flag = true;
        }
    }

    /// Drop entries for tasks that are no longer in `tree`.
    pub fn retain_present(&mut self, tree: &TaskTree) {
        self.collapsed.retain(|id, _| tree.contains_node(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::NewTask;

    fn tree_with_parent() -> (TaskTree, TaskId, TaskId, TaskId) {
        let mut tree = TaskTree::new();
        let a = tree.create_task(NewTask::titled("A"), None).unwrap();
        let b = tree.create_task(NewTask::titled("B"), Some(&a)).unwrap();
        let c = tree.create_task(NewTask::titled("C"), Some(&b)).unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn absent_means_expanded() {
        let fold = FoldMap::new();
        assert!(!fold.is_collapsed(&TaskId::from("x")));
    }

    #[test]
    fn toggle_flips_parent() {
        let (tree, a, ..) = tree_with_parent();
        let mut fold = FoldMap::new();
        let node = tree.find_by_id(&a).unwrap();
        assert!(fold.toggle(node));
        assert!(fold.is_collapsed(&a));
        assert!(!fold.toggle(node));
        assert!(!fold.is_collapsed(&a));
    }

    #[test]
    fn leaves_never_get_entries() {
        let (tree, _, _, c) = tree_with_parent();
        let mut fold = FoldMap::new();
        let leaf = tree.find_by_id(&c).unwrap();
        assert!(!fold.toggle(leaf));
        fold.observe(leaf);
        fold.set_collapsed(leaf, true);
        assert!(fold.is_empty());
    }

    #[test]
    fn expand_all_clears() {
        let (tree, a, b, _) = tree_with_parent();
        let mut fold = FoldMap::new();
        fold.toggle(tree.find_by_id(&a).unwrap());
        fold.toggle(tree.find_by_id(&b).unwrap());
        fold.expand_all();
        assert!(fold.is_empty());
        assert!(!fold.is_collapsed(&a));
    }

    #[test]
    fn collapse_all_is_shallow() {
        let (tree, a, b, _) = tree_with_parent();
        let mut fold = FoldMap::new();
        fold.observe(tree.find_by_id(&a).unwrap());

        fold.collapse_all();
        assert!(fold.is_collapsed(&a));
        // B was never observed, so it is unaffected
        assert!(!fold.is_collapsed(&b));
        assert_eq!(fold.len(), 1);
    }

    #[test]
    fn retain_present_prunes_removed() {
        let (mut tree, a, b, _) = tree_with_parent();
        let mut fold = FoldMap::new();
        fold.observe(tree.find_by_id(&a).unwrap());
        fold.observe(tree.find_by_id(&b).unwrap());
        tree.remove_node(&b);
        fold.retain_present(&tree);
        assert_eq!(fold.len(), 1);
    }
}
