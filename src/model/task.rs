use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::record::TaskRecord;

/// Opaque task identifier (a UUID v4 string for tasks created here)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        TaskId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, used as the display handle in listings
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// Attributes for a task that has not been created yet
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub done: bool,
    /// Defaults to now
    pub creation_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build a detached node with a fresh id
    pub fn into_node(self) -> TaskNode {
        TaskNode::new(
            self.title,
            self.description,
            self.creation_date.unwrap_or_else(Utc::now),
            self.due_date,
            self.done,
        )
    }
}

/// A task in the tree. Owns its children; refers to its parent by id.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    id: TaskId,
    /// Title as shown in the task list
    pub title: String,
    /// Free text details
    pub description: Option<String>,
    creation_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub done: bool,
    parent: Option<TaskId>,
    children: Vec<TaskNode>,
}

impl TaskNode {
    /// Create a detached node with a fresh id and no children
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        creation_date: DateTime<Utc>,
        due_date: Option<DateTime<Utc>>,
        done: bool,
    ) -> Self {
        TaskNode {
            id: TaskId::generate(),
            title: title.into(),
            description,
            creation_date,
            due_date,
            done,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn parent_id(&self) -> Option<&TaskId> {
        self.parent.as_ref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn children(&self) -> &[TaskNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub(crate) fn children_mut(&mut self) -> &mut [TaskNode] {
        &mut self.children
    }

    pub(crate) fn set_parent(&mut self, parent: Option<TaskId>) {
        self.parent = parent;
    }

    pub fn toggle_done(&mut self) {
        self.done = !self.done;
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Append `child` unless a child with the same id is already present.
    /// Returns whether the child was appended.
    pub fn add_child(&mut self, mut child: TaskNode) -> bool {
        if self.is_descendant(&child.id, false) {
            return false;
        }
        child.parent = Some(self.id.clone());
        self.children.push(child);
        true
    }

    /// Detach a direct child. Descendants further down are not searched.
    pub fn remove_child(&mut self, id: &TaskId) -> Option<TaskNode> {
        let pos = self.children.iter().position(|c| &c.id == id)?;
        let mut child = self.children.remove(pos);
        child.parent = None;
        Some(child)
    }

    /// Direct-child test, or any-depth test when `deep` is set.
    pub fn is_descendant(&self, id: &TaskId, deep: bool) -> bool {
        self.children
            .iter()
            .any(|c| &c.id == id || (deep && c.is_descendant(id, true)))
    }

    /// Pre-order search of this subtree, this node included
    pub fn find(&self, id: &TaskId) -> Option<&TaskNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: &TaskId) -> Option<&mut TaskNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Number of nodes in this subtree, this node included
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TaskNode::subtree_len).sum::<usize>()
    }

    /// Visit this node and every descendant in pre-order.
    pub fn for_each(&self, f: &mut dyn FnMut(&TaskNode)) {
        f(self);
        for child in &self.children {
            child.for_each(f);
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Lossless, order-preserving record of this subtree
    pub fn serialize(&self) -> TaskRecord {
        TaskRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            parent_id: self.parent.clone(),
            creation_date: self.creation_date,
            due_date: self.due_date,
            done: self.done,
            children: self.children.iter().map(TaskNode::serialize).collect(),
        }
    }

    /// Rebuild a subtree from its record. An absent record yields nothing.
    ///
    /// The structural `parent` wins over the record's `parentId`. The record
    /// is expected to use every id once, which `TaskTree::deserialize`
    /// checks up front. A child repeating a sibling's id is skipped with a
    /// warning, so the result is only a lossless inverse for such records.
    pub fn deserialize(record: Option<&TaskRecord>, parent: Option<&TaskId>) -> Option<TaskNode> {
        let record = record?;
        let mut node = TaskNode {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            creation_date: record.creation_date,
            due_date: record.due_date,
            done: record.done,
            parent: parent.cloned(),
            children: Vec::with_capacity(record.children.len()),
        };
        for child_record in &record.children {
            if let Some(child) = TaskNode::deserialize(Some(child_record), Some(&record.id))
                && !node.add_child(child)
            {
                warn!(task = %record.id, child = %child_record.id, "skipped duplicate child id");
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(title: &str) -> TaskNode {
        NewTask::titled(title).into_node()
    }

    #[test]
    fn new_node_is_detached_leaf() {
        let n = node("Write report");
        assert!(!n.has_parent());
        assert!(n.children().is_empty());
        assert!(!n.done);
        assert_eq!(n.id().as_str().len(), 36);
    }

    #[test]
    fn ids_are_unique() {
        let a = node("a");
        let b = node("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn add_child_sets_parent() {
        let mut parent = node("parent");
        let child = node("child");
        let child_id = child.id().clone();

        assert!(parent.add_child(child));
        let child = &parent.children()[0];
        assert_eq!(child.id(), &child_id);
        assert_eq!(child.parent_id(), Some(parent.id()));
    }

    #[test]
    fn add_child_is_idempotent() {
        let mut parent = node("parent");
        let child = node("child");
        let again = child.clone();

        assert!(parent.add_child(child));
        assert!(!parent.add_child(again.clone()));
        assert!(!parent.add_child(again));
        assert_eq!(parent.children().len(), 1);
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut parent = node("parent");
        for title in ["one", "two", "three"] {
            parent.add_child(node(title));
        }
        let titles: Vec<&str> = parent.children().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[test]
    fn remove_child_only_direct() {
        let mut root = node("root");
        let mut mid = node("mid");
        let leaf = node("leaf");
        let leaf_id = leaf.id().clone();
        let mid_id = mid.id().clone();
        mid.add_child(leaf);
        root.add_child(mid);

        assert!(root.remove_child(&leaf_id).is_none());
        assert!(root.is_descendant(&leaf_id, true));

        let removed = root.remove_child(&mid_id).unwrap();
        assert!(!removed.has_parent());
        assert!(root.children().is_empty());
        // subtree travels with the detached node
        assert!(removed.is_descendant(&leaf_id, false));
    }

    #[test]
    fn is_descendant_shallow_and_deep() {
        let mut root = node("root");
        let mut mid = node("mid");
        let leaf = node("leaf");
        let leaf_id = leaf.id().clone();
        let mid_id = mid.id().clone();
        mid.add_child(leaf);
        root.add_child(mid);

        assert!(root.is_descendant(&mid_id, false));
        assert!(!root.is_descendant(&leaf_id, false));
        assert!(root.is_descendant(&leaf_id, true));
        assert!(!root.is_descendant(root.id(), true));
        assert!(!root.is_descendant(&TaskId::from("missing"), true));
    }

    #[test]
    fn find_is_preorder() {
        let mut root = node("root");
        let mut mid = node("mid");
        mid.add_child(node("leaf"));
        root.add_child(mid);
        root.add_child(node("sibling"));

        let mut order = Vec::new();
        root.for_each(&mut |n| order.push(n.title.clone()));
        assert_eq!(order, vec!["root", "mid", "leaf", "sibling"]);
        assert_eq!(root.subtree_len(), 4);

        let sibling_id = root.children()[1].id().clone();
        assert_eq!(root.find(&sibling_id).unwrap().title, "sibling");
    }

    #[test]
    fn serialize_round_trip_keeps_shape() {
        let mut root = NewTask::titled("root").described("details").into_node();
        let mut mid = node("mid");
        mid.done = true;
        mid.add_child(node("leaf"));
        root.add_child(mid);

        let record = root.serialize();
        assert!(record.parent_id.is_none());
        assert_eq!(record.children[0].parent_id.as_ref(), Some(root.id()));

        let back = TaskNode::deserialize(Some(&record), None).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn deserialize_absent_record_yields_nothing() {
        assert!(TaskNode::deserialize(None, None).is_none());
    }

    #[test]
    fn deserialize_uses_structural_parent() {
        let mut record = node("orphan").serialize();
        record.parent_id = Some(TaskId::from("stale"));
        let parent = TaskId::from("real-parent");
        let n = TaskNode::deserialize(Some(&record), Some(&parent)).unwrap();
        assert_eq!(n.parent_id(), Some(&parent));
    }

    #[test]
    fn deserialize_skips_repeated_sibling_id() {
        let mut parent = node("parent");
        parent.add_child(node("kid"));
        let mut record = parent.serialize();
        let mut twin = record.children[0].clone();
        twin.title = "twin".into();
        record.children.push(twin);

        let back = TaskNode::deserialize(Some(&record), None).unwrap();
        assert_eq!(back.children().len(), 1);
        assert_eq!(back.children()[0].title, "kid");
    }

    #[test]
    fn short_id() {
        let id = TaskId::from("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(TaskId::from("abc").short(), "abc");
    }
}
