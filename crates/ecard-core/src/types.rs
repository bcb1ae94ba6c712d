//! Core types for the profile builder
//!
//! Defines the data that one user edits:
//! - Profile fields (contact block)
//! - About-me text and job scope
//! - Child records: projects and social links
//! - Keys used to address child rows

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default status given to a freshly added project row
pub const DEFAULT_PROJECT_STATUS: &str = "on-hold";

/// Opaque profile identifier assigned by the store at creation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl ProfileId {
    /// Wrap a raw identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace only; never identifies a profile
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Singleton profile fields per user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub name: String,
    pub title: String,
    pub location: String,
    pub image_url: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

/// Job scope: one per profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobScope {
    pub title: String,
    pub description: String,
}

/// Project categories as they arrive from the form or from older rows
///
/// Older rows and the form input store a comma-separated string, newer rows a
/// list. Everything downstream works on [`Categories::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Categories {
    /// Raw comma-separated input
    Text(String),
    /// Already split list, passed through untouched
    List(Vec<String>),
}

impl Categories {
    /// Canonical list form
    ///
    /// Text is split on `,`, each token trimmed, empty tokens dropped.
    /// A list is returned as is.
    #[must_use]
    pub fn normalized(&self) -> Vec<String> {
        match self {
            Self::Text(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(items) => items.clone(),
        }
    }

    /// True when normalisation yields no tokens
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalized().is_empty()
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Categories {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<Vec<String>> for Categories {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl fmt::Display for Categories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized().join(", "))
    }
}

/// Project row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Stable identifier, placeholder, or nothing for unsaved rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    /// Free-form; the editor offers `on-going`, `completed`, `on-hold`
    pub status: String,
    pub categories: Categories,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            status: DEFAULT_PROJECT_STATUS.to_string(),
            categories: Categories::default(),
        }
    }
}

/// Social link row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub platform: String,
    pub url: String,
}

impl SocialLink {
    /// Links without a usable URL are never persisted
    #[inline]
    #[must_use]
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Complete editable state for one profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub profile: ProfileRecord,
    pub about_me: String,
    pub job_scope: JobScope,
    pub projects: Vec<Project>,
    pub social: Vec<SocialLink>,
}

/// Child collections addressable by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Projects,
    Social,
}

impl Collection {
    /// Name used in logs and CLI arguments
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Social => "social",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row key: identifier when the row has one, otherwise its position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Id(String),
    Index(usize),
}

impl From<usize> for ChildKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ChildKey {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}
