//! Session source
//!
//! The editor never caches the owning profile id; it asks a
//! [`SessionProvider`] at the start of every save and load.

use ecard_core::ProfileId;
use parking_lot::RwLock;

/// Yields the id of the signed-in user's profile
pub trait SessionProvider: Send + Sync {
    /// `None` when no user is signed in
    fn profile_id(&self) -> Option<ProfileId>;
}

/// Fixed session, set once
#[derive(Debug, Clone, Default)]
pub struct StaticSession(Option<ProfileId>);

impl StaticSession {
    #[inline]
    #[must_use]
    pub fn signed_in(id: ProfileId) -> Self {
        Self(Some(id))
    }

    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionProvider for StaticSession {
    fn profile_id(&self) -> Option<ProfileId> {
        self.0.clone()
    }
}

/// Session that can change while the editor is open
#[derive(Debug, Default)]
pub struct SharedSession {
    current: RwLock<Option<ProfileId>>,
}

impl SharedSession {
    #[must_use]
    pub fn new(current: Option<ProfileId>) -> Self {
        Self {
            current: RwLock::new(current),
        }
    }

    pub fn sign_in(&self, id: ProfileId) {
        tracing::debug!(profile = %id, "session signed in");
        *self.current.write() = Some(id);
    }

    pub fn sign_out(&self) {
        tracing::debug!("session signed out");
        *self.current.write() = None;
    }
}

impl SessionProvider for SharedSession {
    fn profile_id(&self) -> Option<ProfileId> {
        self.current.read().clone()
    }
}
