use chrono::NaiveDate;

use crate::model::task::TaskNode;
use crate::model::tree::TaskTree;
use crate::util::date::{DueClass, classify_on, date_only};

/// Tasks due on `day`.
///
/// A matching task is listed and its subtree is not searched; otherwise the
/// search continues into its children.
pub fn due_on(tree: &TaskTree, day: NaiveDate) -> Vec<&TaskNode> {
    let mut found = Vec::new();
    for root in tree.roots() {
        collect_due_on(root, day, &mut found);
    }
    found
}

fn collect_due_on<'a>(task: &'a TaskNode, day: NaiveDate, found: &mut Vec<&'a TaskNode>) {
    if task.due_date.as_ref().is_some_and(|due| date_only(due) == day) {
        found.push(task);
        return;
    }
    for child in task.children() {
        collect_due_on(child, day, found);
    }
}

/// Undone tasks of one urgency class, earliest due first
#[derive(Debug, Clone)]
pub struct AgendaGroup<'a> {
    pub class: DueClass,
    pub tasks: Vec<&'a TaskNode>,
}

/// Every undone task with a due date, at any depth, grouped by class.
///
/// Groups come in urgency order and empty groups are omitted.
pub fn agenda(tree: &TaskTree, today: NaiveDate) -> Vec<AgendaGroup<'_>> {
    let mut dated: Vec<&TaskNode> = tree
        .walk()
        .into_iter()
        .map(|(_, task)| task)
        .filter(|task| !task.done && task.due_date.is_some())
        .collect();
    dated.sort_by_key(|task| task.due_date);

    let mut groups: Vec<AgendaGroup<'_>> = Vec::new();
    for class in [
        DueClass::Overdue,
        DueClass::DueToday,
        DueClass::DueSoon,
        DueClass::Later,
    ] {
        let tasks: Vec<&TaskNode> = dated
            .iter()
            .copied()
            .filter(|task| {
                task.due_date
                    .as_ref()
                    .is_some_and(|due| classify_on(due, today) == class)
            })
            .collect();
        if !tasks.is_empty() {
            groups.push(AgendaGroup { class, tasks });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::NewTask;
    use crate::util::date::days_from;
    use pretty_assertions::assert_eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn titles(tasks: &[&TaskNode]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn due_match_hides_subtree() {
        let mut tree = TaskTree::new();
        let a = tree
            .create_task(NewTask::titled("A").due(days_from(day(), 0)), None)
            .unwrap();
        tree.create_task(NewTask::titled("B").due(days_from(day(), 0)), Some(&a))
            .unwrap();
        let c = tree.create_task(NewTask::titled("C"), None).unwrap();
        tree.create_task(NewTask::titled("D").due(days_from(day(), 0)), Some(&c))
            .unwrap();

        assert_eq!(titles(&due_on(&tree, day())), vec!["A", "D"]);
    }

    #[test]
    fn other_days_are_ignored() {
        let mut tree = TaskTree::new();
        tree.create_task(NewTask::titled("A").due(days_from(day(), 1)), None)
            .unwrap();
        tree.create_task(NewTask::titled("B"), None).unwrap();
        assert!(due_on(&tree, day()).is_empty());
    }

    #[test]
    fn agenda_groups_undone_dated_tasks() {
        let mut tree = TaskTree::new();
        let a = tree
            .create_task(NewTask::titled("Later").due(days_from(day(), 20)), None)
            .unwrap();
        tree.create_task(NewTask::titled("Late").due(days_from(day(), -3)), Some(&a))
            .unwrap();
        tree.create_task(NewTask::titled("Soon 5").due(days_from(day(), 5)), None)
            .unwrap();
        tree.create_task(NewTask::titled("Soon 2").due(days_from(day(), 2)), None)
            .unwrap();
        tree.create_task(NewTask::titled("Undated"), None).unwrap();
        let done = tree
            .create_task(NewTask::titled("Done").due(days_from(day(), 0)), None)
            .unwrap();
        tree.find_by_id_mut(&done).unwrap().done = true;

        let groups = agenda(&tree, day());
        let summary: Vec<(DueClass, Vec<String>)> = groups
            .iter()
            .map(|g| (g.class, titles(&g.tasks)))
            .collect();
        assert_eq!(
            summary,
            vec![
                (DueClass::Overdue, vec!["Late".to_string()]),
                (
                    DueClass::DueSoon,
                    vec!["Soon 2".to_string(), "Soon 5".to_string()]
                ),
                (DueClass::Later, vec!["Later".to_string()]),
            ]
        );
    }
}
