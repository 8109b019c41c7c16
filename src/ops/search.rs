use std::ops::Range;

use regex::Regex;

use crate::model::task::{TaskId, TaskNode};
use crate::model::tree::TaskTree;

/// Which field of a task matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Id,
    Title,
    Description,
}

impl MatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchField::Id => "id",
            MatchField::Title => "title",
            MatchField::Description => "description",
        }
    }
}

/// A search hit for a task field
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub task_id: TaskId,
    pub field: MatchField,
    pub spans: Vec<Range<usize>>,
}

/// Compile a case-insensitive pattern, falling back to a literal match when
/// the pattern is not a valid regex.
pub fn build_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
        .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search every task in pre-order.
pub fn search_tasks(tree: &TaskTree, re: &Regex) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for root in tree.roots() {
        search_task(re, root, &mut hits);
    }
    hits
}

/// Search a single task (and its children recursively).
fn search_task(re: &Regex, task: &TaskNode, hits: &mut Vec<SearchHit>) {
    let mut push = |field: MatchField, text: &str| {
        let spans = find_matches(re, text);
        if !spans.is_empty() {
            hits.push(SearchHit {
                task_id: task.id().clone(),
                field,
                spans,
            });
        }
    };

    push(MatchField::Id, task.id().as_str());
    push(MatchField::Title, &task.title);
    if let Some(description) = &task.description {
        push(MatchField::Description, description);
    }

    for child in task.children() {
        search_task(re, child, hits);
    }
}
