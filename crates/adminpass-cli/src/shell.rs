//! Terminal presentation layer.
//!
//! Notices go to stderr with a level tag, the loading indicator is a single
//! status line on interactive terminals, and "pages" are just paths: a
//! navigation is remembered and takes effect when the command settles.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use adminpass_core::auth::SubmitControl;
use adminpass_core::presenter::{Navigation, Navigator, NoticeLevel, Presenter};
use tracing::debug;

const LOADING_LINE: &str = "Loading...";

pub struct TerminalShell {
    current: Mutex<String>,
    pending: Mutex<Option<Navigation>>,
    in_flight: AtomicUsize,
    interactive: bool,
}

impl TerminalShell {
    pub fn new(page: &str) -> Self {
        Self {
            current: Mutex::new(page.to_string()),
            pending: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            interactive: io::stderr().is_terminal(),
        }
    }

    /// Carry out the last requested navigation, after its delay.
    ///
    /// Returns the page the shell ends up on.
    pub async fn settle(&self) -> String {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some(navigation) = pending {
            tokio::time::sleep(navigation.delay).await;
            eprintln!("-> {}", navigation.target);
            *self.current.lock().unwrap_or_else(|e| e.into_inner()) = navigation.target;
        }
        self.current_path()
    }

    fn clear_loading_line(&self) {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\r{}\r", " ".repeat(LOADING_LINE.len()));
        let _ = stderr.flush();
    }
}

impl Presenter for TerminalShell {
    fn notify(&self, level: NoticeLevel, message: &str) {
        if self.interactive && self.in_flight.load(Ordering::SeqCst) > 0 {
            self.clear_loading_line();
        }
        let tag = match level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}", tag, message);
    }

    fn show_loading(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 && self.interactive {
            let mut stderr = io::stderr();
            let _ = write!(stderr, "{}", LOADING_LINE);
            let _ = stderr.flush();
        }
    }

    fn hide_loading(&self) {
        let previous = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if previous == 1 && self.interactive {
            self.clear_loading_line();
        }
    }
}

impl Navigator for TerminalShell {
    fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn navigate(&self, navigation: Navigation) {
        debug!(page = %navigation.target, delay_ms = navigation.delay.as_millis() as u64, "Navigation requested");
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(navigation);
    }
}

/// Stand-in for the login form's submit button.
pub struct TerminalButton {
    label: String,
    enabled: bool,
}

impl TerminalButton {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: true,
        }
    }
}

impl SubmitControl for TerminalButton {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
        if !self.enabled {
            eprintln!("{}", label);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
