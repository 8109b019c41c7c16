pub mod calendar;
pub mod detail;
pub mod fold;
pub mod list;

use chrono::NaiveDate;

use crate::model::task::TaskNode;
use crate::model::tree::TaskTree;

pub use detail::{DetailView, TaskDetail};
pub use fold::FoldMap;
pub use list::{DueCell, ListRow};

/// Which panel fills the main area
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MainView {
    #[default]
    List,
    Calendar,
}

/// The rendered main panel
#[derive(Debug, Clone)]
pub enum MainPanel<'a> {
    List(Vec<ListRow>),
    /// Tasks due on the given day
    Calendar {
        day: NaiveDate,
        tasks: Vec<&'a TaskNode>,
    },
}

/// UI state that is never persisted
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub fold: FoldMap,
    pub main: MainView,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_main(main: MainView) -> Self {
        ViewState {
            main,
            ..Self::default()
        }
    }

    pub fn switch_to(&mut self, main: MainView) {
        self.main = main;
    }

    pub fn render<'a>(&mut self, tree: &'a TaskTree, today: NaiveDate) -> MainPanel<'a> {
        match self.main {
            MainView::List => MainPanel::List(list::build_rows(tree, &mut self.fold, today)),
            MainView::Calendar => MainPanel::Calendar {
                day: today,
                tasks: calendar::due_on(tree, today),
            },
        }
    }

    pub fn detail(&self, tree: &TaskTree, today: NaiveDate) -> DetailView {
        detail::detail_view(tree, today)
    }
}
