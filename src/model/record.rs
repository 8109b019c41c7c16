use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::TaskId;
use crate::util::date::{optional_timestamp, timestamp};

/// Serialized form of one task and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Absent for roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    #[serde(with = "timestamp")]
    pub creation_date: DateTime<Utc>,
    #[serde(default, with = "optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub children: Vec<TaskRecord>,
}

/// Serialized form of a whole tree.
///
/// Both keys are optional on the wire so that a record missing either one
/// can be told apart from a JSON syntax error; `TaskTree::deserialize`
/// rejects it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeRecord {
    #[serde(default)]
    pub roots: Option<Vec<TaskRecord>>,
    #[serde(default)]
    pub settings: Option<Vec<(String, String)>>,
}

impl TreeRecord {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Error type for rebuilding a tree from a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed task tree: missing \"{0}\"")]
    MissingField(&'static str),
    #[error("malformed task tree: duplicate task id {0}")]
    DuplicateId(TaskId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_parse_as_none() {
        let rec = TreeRecord::from_json("{}").unwrap();
        assert!(rec.roots.is_none());
        assert!(rec.settings.is_none());
    }

    #[test]
    fn settings_are_pairs() {
        let rec =
            TreeRecord::from_json(r#"{"roots":[],"settings":[["due-display","dates"]]}"#).unwrap();
        assert_eq!(
            rec.settings,
            Some(vec![("due-display".to_string(), "dates".to_string())])
        );
    }

    #[test]
    fn task_record_wire_names() {
        let text = r#"{
            "id": "a1",
            "title": "Root",
            "description": null,
            "creationDate": "2024-05-29T10:00:00.000Z",
            "dueDate": null,
            "done": false,
            "children": [{
                "id": "b2",
                "title": "Child",
                "description": "text",
                "parentId": "a1",
                "creationDate": "2024-05-29T10:00:00.000Z",
                "dueDate": "2024-06-01T00:00:00.000Z",
                "done": true,
                "children": []
            }]
        }"#;
        let rec: TaskRecord = serde_json::from_str(text).unwrap();
        assert_eq!(rec.id, TaskId::from("a1"));
        assert!(rec.parent_id.is_none());
        let child = &rec.children[0];
        assert_eq!(child.parent_id, Some(TaskId::from("a1")));
        assert!(child.done);
        assert!(child.due_date.is_some());

        let out = serde_json::to_value(&rec).unwrap();
        assert!(out.get("parentId").is_none());
        assert_eq!(out["children"][0]["parentId"], "a1");
        assert_eq!(out["creationDate"], "2024-05-29T10:00:00.000Z");
        assert_eq!(out["dueDate"], serde_json::Value::Null);
    }

    #[test]
    fn task_record_requires_id_and_title() {
        let res: Result<TaskRecord, _> =
            serde_json::from_str(r#"{"creationDate":"2024-05-29T10:00:00Z"}"#);
        assert!(res.is_err());
    }
}
