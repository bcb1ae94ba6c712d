//! Error types for the sync crate
//!
//! Provides error handling for:
//! - Store adapter failures (transport, rejection, decoding)
//! - Save refusal and aborted write sequences
//! - Editor load failures

use std::fmt;

/// Failures reported by a [`crate::ProfileStore`] adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// Store answered with a non-success status
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Check if a retry could plausibly succeed
    ///
    /// Nothing in this crate retries; callers may.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}

/// Position in the fixed save sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveStep {
    Profile,
    AboutMe,
    JobScope,
    ProjectUpsert,
    ProjectSweep,
    SocialUpsert,
    SocialSweep,
}

impl SaveStep {
    /// Steps in execution order
    pub const ORDER: [SaveStep; 7] = [
        Self::Profile,
        Self::AboutMe,
        Self::JobScope,
        Self::ProjectUpsert,
        Self::ProjectSweep,
        Self::SocialUpsert,
        Self::SocialSweep,
    ];
}

impl fmt::Display for SaveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Profile => "profile upsert",
            Self::AboutMe => "about-me upsert",
            Self::JobScope => "job-scope upsert",
            Self::ProjectUpsert => "project upsert",
            Self::ProjectSweep => "project delete-sweep",
            Self::SocialUpsert => "social-link upsert",
            Self::SocialSweep => "social-link delete-sweep",
        })
    }
}

/// Save failures
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// No owning profile id; nothing was written
    #[error("no active session: sign in before saving")]
    MissingSession,

    /// Another save on this editor has not finished
    #[error("a save is already in progress")]
    SaveInProgress,

    /// A write failed; earlier writes of this save stay committed
    #[error("save aborted at {step}: {source}")]
    WriteFailed {
        step: SaveStep,
        #[source]
        source: StoreError,
    },
}

impl SaveError {
    /// Step that failed, for write failures
    #[inline]
    #[must_use]
    pub fn step(&self) -> Option<SaveStep> {
        match self {
            Self::WriteFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Refused before any write was issued
    #[inline]
    #[must_use]
    pub fn is_refused(&self) -> bool {
        matches!(self, Self::MissingSession | Self::SaveInProgress)
    }

    #[inline]
    pub(crate) fn write(step: SaveStep, source: StoreError) -> Self {
        Self::WriteFailed { step, source }
    }
}

/// Editor failures outside the save path
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("save failed: {0}")]
    Save(#[from] SaveError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Session names a profile the store does not have
    #[error("profile not found: {0}")]
    ProfileNotFound(String),
}

impl EditorError {
    /// Check if the caller should send the user back to sign in
    #[inline]
    #[must_use]
    pub fn is_missing_session(&self) -> bool {
        matches!(
            self,
            Self::Save(SaveError::MissingSession) | Self::ProfileNotFound(_)
        )
    }
}
