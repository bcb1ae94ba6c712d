//! Form state controller
//!
//! Owns the in-memory [`FormState`] for one profile and exposes the mutations
//! the view layer invokes in response to user input. None of these touch the
//! store and none of them fail: a key that matches nothing, or a field that
//! does not belong to the collection, simply changes nothing.

use crate::error::CoreError;
use crate::types::{
    Categories, ChildKey, Collection, FormState, JobScope, Project, ProfileRecord, SocialLink,
    DEFAULT_PROJECT_STATUS,
};
use std::str::FromStr;

/// Leaf fields outside the child collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Name,
    Title,
    Location,
    ImageUrl,
    Email,
    Phone,
    Website,
    AboutMe,
    JobTitle,
    JobDescription,
}

impl FieldPath {
    /// All paths in form order
    pub const ALL: [FieldPath; 10] = [
        Self::Name,
        Self::Title,
        Self::Location,
        Self::ImageUrl,
        Self::Email,
        Self::Phone,
        Self::Website,
        Self::AboutMe,
        Self::JobTitle,
        Self::JobDescription,
    ];

    /// Dotted form used by the view bindings
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "profile.name",
            Self::Title => "profile.title",
            Self::Location => "profile.location",
            Self::ImageUrl => "profile.image_url",
            Self::Email => "profile.email",
            Self::Phone => "profile.phone",
            Self::Website => "profile.website",
            Self::AboutMe => "about_me",
            Self::JobTitle => "job_scope.title",
            Self::JobDescription => "job_scope.description",
        }
    }
}

impl FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == path)
            .or(match path {
                // Accepted spellings from the older form bindings
                "profile.imageUrl" => Some(Self::ImageUrl),
                "aboutMe" | "about_me.content" => Some(Self::AboutMe),
                "jobScope.title" => Some(Self::JobTitle),
                "jobScope.description" => Some(Self::JobDescription),
                _ => None,
            })
            .ok_or_else(|| CoreError::UnknownFieldPath(path.to_string()))
    }
}

/// Scalar fields of child rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildField {
    Title,
    Description,
    Status,
    Categories,
    Platform,
    Url,
}

impl ChildField {
    /// Whether the field exists on rows of `collection`
    #[must_use]
    pub fn belongs_to(self, collection: Collection) -> bool {
        match collection {
            Collection::Projects => matches!(
                self,
                Self::Title | Self::Description | Self::Status | Self::Categories
            ),
            Collection::Social => matches!(self, Self::Platform | Self::Url),
        }
    }
}

impl FromStr for ChildField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "status" => Ok(Self::Status),
            "categories" => Ok(Self::Categories),
            "platform" => Ok(Self::Platform),
            "url" => Ok(Self::Url),
            other => Err(CoreError::UnknownChildField(other.to_string())),
        }
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "projects" => Ok(Self::Projects),
            "social" | "social_links" => Ok(Self::Social),
            other => Err(CoreError::UnknownCollection(other.to_string())),
        }
    }
}

/// Identifiers assigned to new rows during a save, by position
///
/// Positions refer to the snapshot the save was planned from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignedIds {
    pub projects: Vec<(usize, String)>,
    pub social: Vec<(usize, String)>,
}

impl AssignedIds {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.social.is_empty()
    }
}

/// In-memory owner of one profile's editable state
#[derive(Debug, Clone)]
pub struct FormStateController {
    state: FormState,
    default_status: String,
}

impl FormStateController {
    /// Start from an empty form
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_state(FormState::default())
    }

    /// Start from loaded state
    #[inline]
    #[must_use]
    pub fn from_state(state: FormState) -> Self {
        Self {
            state,
            default_status: DEFAULT_PROJECT_STATUS.to_string(),
        }
    }

    /// Status given to rows created by [`Self::add_child`]
    #[inline]
    #[must_use]
    pub fn with_default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = status.into();
        self
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Profile fields
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &ProfileRecord {
        &self.state.profile
    }

    /// Job scope
    #[inline]
    #[must_use]
    pub fn job_scope(&self) -> &JobScope {
        &self.state.job_scope
    }

    /// Project rows in display order
    #[inline]
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    /// Social link rows in display order
    #[inline]
    #[must_use]
    pub fn social(&self) -> &[SocialLink] {
        &self.state.social
    }

    /// Owned copy handed to the save path
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> FormState {
        self.state.clone()
    }

    /// Swap in freshly loaded state
    pub fn replace(&mut self, state: FormState) {
        self.state = state;
    }

    /// Replace one leaf field
    pub fn set_field(&mut self, path: FieldPath, value: impl Into<String>) {
        let value = value.into();
        let profile = &mut self.state.profile;
        let slot = match path {
            FieldPath::Name => &mut profile.name,
            FieldPath::Title => &mut profile.title,
            FieldPath::Location => &mut profile.location,
            FieldPath::ImageUrl => &mut profile.image_url,
            FieldPath::Email => &mut profile.email,
            FieldPath::Phone => &mut profile.phone,
            FieldPath::Website => &mut profile.website,
            FieldPath::AboutMe => &mut self.state.about_me,
            FieldPath::JobTitle => &mut self.state.job_scope.title,
            FieldPath::JobDescription => &mut self.state.job_scope.description,
        };
        *slot = value;
    }

    /// Append a defaulted row with no identifier
    ///
    /// Returns the key of the new row.
    pub fn add_child(&mut self, collection: Collection) -> ChildKey {
        let index = match collection {
            Collection::Projects => {
                self.state.projects.push(Project {
                    status: self.default_status.clone(),
                    ..Project::default()
                });
                self.state.projects.len() - 1
            }
            Collection::Social => {
                self.state.social.push(SocialLink::default());
                self.state.social.len() - 1
            }
        };
        tracing::debug!(%collection, index, "child row added");
        ChildKey::Index(index)
    }

    /// Remove exactly one matched row
    pub fn remove_child(&mut self, collection: Collection, key: &ChildKey) -> Option<ChildRow> {
        match collection {
            Collection::Projects => {
                let index = position(&self.state.projects, key, |p| p.id.as_deref())?;
                Some(ChildRow::Project(self.state.projects.remove(index)))
            }
            Collection::Social => {
                let index = position(&self.state.social, key, |s| s.id.as_deref())?;
                Some(ChildRow::Social(self.state.social.remove(index)))
            }
        }
    }

    /// Mutate one field of one matched row
    ///
    /// Returns `true` when a row was changed.
    pub fn update_child_field(
        &mut self,
        collection: Collection,
        key: &ChildKey,
        field: ChildField,
        value: impl Into<String>,
    ) -> bool {
        if !field.belongs_to(collection) {
            tracing::debug!(%collection, ?field, "field does not belong to collection");
            return false;
        }

        let value = value.into();
        match collection {
            Collection::Projects => {
                let Some(index) = position(&self.state.projects, key, |p| p.id.as_deref()) else {
                    return false;
                };
                let project = &mut self.state.projects[index];
                match field {
                    ChildField::Title => project.title = value,
                    ChildField::Description => project.description = value,
                    ChildField::Status => project.status = value,
                    ChildField::Categories => project.categories = Categories::Text(value),
                    ChildField::Platform | ChildField::Url => return false,
                }
            }
            Collection::Social => {
                let Some(index) = position(&self.state.social, key, |s| s.id.as_deref()) else {
                    return false;
                };
                let link = &mut self.state.social[index];
                match field {
                    ChildField::Platform => link.platform = value,
                    ChildField::Url => link.url = value,
                    _ => return false,
                }
            }
        }
        true
    }

    /// Write identifiers assigned by a successful save back into the rows
    ///
    /// Rows that already carry a stable id keep it. Positions beyond the
    /// current length are ignored.
    pub fn apply_assigned_ids(&mut self, assigned: &AssignedIds) {
        for (index, id) in &assigned.projects {
            if let Some(project) = self.state.projects.get_mut(*index) {
                if !crate::identity::has_stable_id(project.id.as_deref()) {
                    project.id = Some(id.clone());
                }
            }
        }
        for (index, id) in &assigned.social {
            if let Some(link) = self.state.social.get_mut(*index) {
                if !crate::identity::has_stable_id(link.id.as_deref()) {
                    link.id = Some(id.clone());
                }
            }
        }
    }
}

impl Default for FormStateController {
    fn default() -> Self {
        Self::new()
    }
}

/// A removed row from either collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRow {
    Project(Project),
    Social(SocialLink),
}

fn position<T>(rows: &[T], key: &ChildKey, id_of: impl Fn(&T) -> Option<&str>) -> Option<usize> {
    match key {
        ChildKey::Id(id) => rows.iter().position(|row| id_of(row) == Some(id.as_str())),
        ChildKey::Index(index) => (*index < rows.len()).then_some(*index),
    }
}
