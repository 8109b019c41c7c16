use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Settings key for the due-date display mode
pub const DUE_DISPLAY_KEY: &str = "due-display";

/// How due dates are shown in the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueDisplay {
    #[default]
    None,
    Dates,
    Badges,
    Colours,
}

impl DueDisplay {
    pub fn as_str(self) -> &'static str {
        match self {
            DueDisplay::None => "none",
            DueDisplay::Dates => "dates",
            DueDisplay::Badges => "badges",
            DueDisplay::Colours => "colours",
        }
    }
}

impl std::fmt::Display for DueDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown due display mode {0:?} (expected none, dates, badges or colours)")]
pub struct UnknownDueDisplay(pub String);

impl FromStr for DueDisplay {
    type Err = UnknownDueDisplay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DueDisplay::None),
            "dates" => Ok(DueDisplay::Dates),
            "badges" => Ok(DueDisplay::Badges),
            // accept the US spelling on input, always store "colours"
            "colours" | "colors" => Ok(DueDisplay::Colours),
            _ => Err(UnknownDueDisplay(s.to_string())),
        }
    }
}

/// User display settings, persisted with the tree as ordered key/value pairs.
/// Unknown keys are kept so they survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: IndexMap<String, String>,
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The due display mode; missing or unrecognised values fall back to `none`.
    pub fn due_display(&self) -> DueDisplay {
        match self.get(DUE_DISPLAY_KEY) {
            None => DueDisplay::default(),
            Some(raw) => raw.parse::<DueDisplay>().unwrap_or_else(|e| {
                tracing::warn!("{}; using none", e);
                DueDisplay::default()
            }),
        }
    }

    pub fn set_due_display(&mut self, mode: DueDisplay) {
        self.set(DUE_DISPLAY_KEY, mode.as_str());
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Settings {
            entries: pairs.into_iter().collect(),
        }
    }
}
