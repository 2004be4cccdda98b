//! Presentation collaborators.
//!
//! Core logic never prints or navigates by itself. It reports notices to a
//! `Presenter` and hands `Navigation` values to a `Navigator`; the front end
//! decides what those mean (a terminal shell, a test recorder, ...).

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible message surface and loading indicator.
pub trait Presenter: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn show_loading(&self) {}

    fn hide_loading(&self) {}
}

/// A page change to perform after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub target: String,
    pub delay: Duration,
}

impl Navigation {
    pub fn after(target: &str, delay: Duration) -> Self {
        Self {
            target: target.to_string(),
            delay,
        }
    }
}

pub trait Navigator: Send + Sync {
    /// Path of the page currently shown.
    fn current_path(&self) -> String;

    fn navigate(&self, navigation: Navigation);
}
