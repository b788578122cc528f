use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Suggested categories, the first one is the form's default.
pub const CATEGORIES: [&str; 5] = [
    "Food",
    "Transportation",
    "Entertainment",
    "Utilities",
    "Other",
];

pub const DEFAULT_DATA_FILE: &str = "expenses.csv";

/// User preferences, restored from eframe storage on launch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dark_mode: bool,
    pub notifications: bool,
    pub data_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Page {
    #[default]
    Expenses,
    Settings,
    About,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Expenses, Page::Settings, Page::About];
}

impl Display for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Page::Expenses => write!(f, "Add New Expense"),
            Page::Settings => write!(f, "Settings"),
            Page::About => write!(f, "About"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.data_file, PathBuf::from("expenses.csv"));
        assert!(settings.notifications);
        assert!(!settings.dark_mode);
    }

    #[test]
    fn page_labels() {
        assert_eq!(Page::default(), Page::ALL[0]);
        assert_eq!(Page::Expenses.to_string(), "Add New Expense");
        assert_eq!(Page::About.to_string(), "About");
    }
}
