//! User-facing notices
//!
//! Each save ends in exactly one notice: success or failure.

use std::fmt;

pub const SAVE_SUCCESS: &str = "Profile updated successfully!";
pub const SAVE_FAILURE: &str = "Failed to save profile. Please try again.";
pub const SESSION_MISSING: &str = "Unable to save profile. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.kind == NoticeKind::Failure
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Receives notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Routes notices to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => tracing::info!(notice = %notice, "notice"),
            NoticeKind::Failure => tracing::warn!(notice = %notice, "notice"),
        }
    }
}
