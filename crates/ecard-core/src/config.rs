//! Application configuration
//!
//! Read from a TOML file, then overridden by environment variables:
//! - `ECARD_STORE_URL`: base URL of the hosted store
//! - `ECARD_STORE_KEY`: API key sent with every request
//! - `ECARD_PROFILE_ID`: profile to act on when none is given explicitly

use crate::error::CoreError;
use crate::types::{ProfileId, DEFAULT_PROJECT_STATUS};
use crate::vcard::DEFAULT_ORGANIZATION;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_STORE_URL: &str = "ECARD_STORE_URL";
pub const ENV_STORE_KEY: &str = "ECARD_STORE_KEY";
pub const ENV_PROFILE_ID: &str = "ECARD_PROFILE_ID";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub editor: EditorConfig,
    /// Profile used when the caller supplies none
    pub profile_id: Option<ProfileId>,
}

/// Hosted store connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub base_url: String,
    /// Anonymous or service API key
    pub api_key: String,
    /// Path prefix of the REST endpoint
    pub rest_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            rest_path: "/rest/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Both URL and key present
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Editor defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Status given to new project rows
    pub default_project_status: String,
    /// Organisation written to the exported vCard
    pub organization: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_project_status: DEFAULT_PROJECT_STATUS.to_string(),
            organization: DEFAULT_ORGANIZATION.to_string(),
        }
    }
}

impl AppConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, CoreError> {
        toml::from_str(text).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] when the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, then apply environment overrides
    ///
    /// # Errors
    /// Propagates file errors; a missing `path` argument is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from `lookup` (normally the process environment)
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_STORE_URL) {
            tracing::debug!("store URL taken from {ENV_STORE_URL}");
            self.store.base_url = url;
        }
        if let Some(key) = lookup(ENV_STORE_KEY) {
            self.store.api_key = key;
        }
        if let Some(id) = lookup(ENV_PROFILE_ID).filter(|id| !id.trim().is_empty()) {
            self.profile_id = Some(ProfileId::new(id.trim()));
        }
        self
    }

    /// With store connection
    #[inline]
    #[must_use]
    pub fn with_store(mut self, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.store.base_url = base_url.into();
        self.store.api_key = api_key.into();
        self
    }

    /// With default profile
    #[inline]
    #[must_use]
    pub fn with_profile(mut self, profile_id: ProfileId) -> Self {
        self.profile_id = Some(profile_id);
        self
    }
}
