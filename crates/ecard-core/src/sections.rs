//! Section board
//!
//! Ordered list of display sections backing the public preview. Each entry
//! carries a unique id so drag events can address it; nothing here is
//! persisted.

use crate::error::CoreError;
use crate::identity::IdGenerator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of section the board can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Profile,
    AboutMe,
    JobScope,
    Projects,
    SocialLinks,
}

impl SectionKind {
    /// Every kind in sidebar order
    pub const ALL: [SectionKind; 5] = [
        Self::Profile,
        Self::AboutMe,
        Self::JobScope,
        Self::Projects,
        Self::SocialLinks,
    ];

    /// Human label shown as the section heading
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::AboutMe => "About Me",
            Self::JobScope => "Job Scope",
            Self::Projects => "Projects",
            Self::SocialLinks => "Social Links",
        }
    }

    /// Prefix used when building section ids
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::AboutMe => "about-me",
            Self::JobScope => "job-scope",
            Self::Projects => "projects",
            Self::SocialLinks => "social-links",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SectionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.label().eq_ignore_ascii_case(wanted)
                    || kind.slug().eq_ignore_ascii_case(wanted)
                    || kind.slug().replace('-', "_").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CoreError::UnknownSectionKind(wanted.to_string()))
    }
}

/// One entry on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub kind: SectionKind,
}

/// Ordered, id-keyed sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionBoard {
    sections: Vec<Section>,
}

impl SectionBoard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Board holding one section per kind, in `kinds` order
    #[must_use]
    pub fn with_kinds(kinds: &[SectionKind], ids: &dyn IdGenerator) -> Self {
        let mut board = Self::new();
        for kind in kinds {
            board.add(*kind, ids);
        }
        board
    }

    /// Sections in display order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Append a section and return its id
    pub fn add(&mut self, kind: SectionKind, ids: &dyn IdGenerator) -> String {
        let id = format!("{}-{}", kind.slug(), ids.generate());
        self.sections.push(Section {
            id: id.clone(),
            kind,
        });
        id
    }

    /// Remove the section with `id`
    pub fn remove(&mut self, id: &str) -> Option<Section> {
        let index = self.index_of(id)?;
        Some(self.sections.remove(index))
    }

    /// Exchange the positions of two sections
    ///
    /// Returns `false` when either id is unknown.
    pub fn swap(&mut self, a: &str, b: &str) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(i), Some(j)) => {
                self.sections.swap(i, j);
                true
            }
            _ => false,
        }
    }

    /// Drag end: move `active` to the slot currently held by `over`
    ///
    /// Entries in between shift by one. No-op when the ids are equal or
    /// either is unknown.
    pub fn move_to(&mut self, active: &str, over: &str) -> bool {
        if active == over {
            return false;
        }
        let (Some(from), Some(to)) = (self.index_of(active), self.index_of(over)) else {
            return false;
        };
        let section = self.sections.remove(from);
        self.sections.insert(to, section);
        true
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.id == id)
    }
}
