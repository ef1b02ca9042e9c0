//! Navigation and user notification
//!
//! The session store and HTTP client never talk to the terminal directly;
//! they go through a [`Navigator`]. The CLI plugs in [`TerminalNavigator`],
//! tests plug in [`RecordingNavigator`].

use colored::Colorize;
use std::sync::Mutex;

/// Hint printed when the user has to log in again.
pub const LOGIN_HINT: &str = "Run `fintrip login --email <EMAIL>` to sign in.";

/// Where the user currently is, and how to send them to the login entry point.
pub trait Navigator: Send + Sync {
    /// The location the user is currently at, if known.
    fn current_location(&self) -> Option<String>;

    /// Show a message the user must see before anything else happens.
    fn notify_blocking(&self, message: &str);

    /// Send the user to the login entry point.
    fn redirect_to_login(&self);
}

/// Navigator for the `fintrip` binary
///
/// The "location" is the command line being executed, so a forced re-login
/// can tell the user what to re-run.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    location: Mutex<Option<String>>,
    redirected: Mutex<bool>,
}

impl TerminalNavigator {
    pub fn new(location: Option<String>) -> Self {
        Self {
            location: Mutex::new(location),
            redirected: Mutex::new(false),
        }
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.lock().unwrap_or_else(|e| e.into_inner()) = Some(location.into());
    }

    /// Whether a redirect to login was requested during this run.
    pub fn was_redirected(&self) -> bool {
        *self.redirected.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for TerminalNavigator {
    fn current_location(&self) -> Option<String> {
        self.location
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn notify_blocking(&self, message: &str) {
        eprintln!("{} {}", "!".yellow().bold(), message.yellow());
    }

    fn redirect_to_login(&self) {
        let mut redirected = self.redirected.lock().unwrap_or_else(|e| e.into_inner());
        if !*redirected {
            eprintln!("{}", LOGIN_HINT.cyan());
        }
        *redirected = true;
    }
}

/// Navigator that records every call
///
/// # Examples
///
/// ```
/// use fintrip::navigation::{Navigator, RecordingNavigator};
///
/// let nav = RecordingNavigator::at("/trips/42");
/// nav.notify_blocking("expired");
/// nav.redirect_to_login();
/// assert_eq!(nav.notifications(), vec!["expired".to_string()]);
/// assert_eq!(nav.redirects(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    location: Option<String>,
    notifications: Mutex<Vec<String>>,
    redirects: Mutex<usize>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A navigator whose current location is `location`.
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn redirects(&self) -> usize {
        *self.redirects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> Option<String> {
        self.location.clone()
    }

    fn notify_blocking(&self, message: &str) {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }

    fn redirect_to_login(&self) {
        *self.redirects.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}
