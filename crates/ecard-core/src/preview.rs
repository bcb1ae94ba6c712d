//! Public preview
//!
//! Builds the read-only document shown on the public card page: one block per
//! board section, in board order, with placeholder text wherever the form is
//! still empty. Styling is left to whoever renders the document.

use crate::sections::{SectionBoard, SectionKind};
use crate::types::{FormState, Project};
use crate::vcard::{ContactCard, DEFAULT_ORGANIZATION};
use serde::{Deserialize, Serialize};
use std::fmt;

const PLACEHOLDER_IMAGE: &str = "/placeholder.png";
const UNCATEGORIZED: &str = "Uncategorized";

/// Rendered preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub contact: ContactCard,
    pub blocks: Vec<PreviewBlock>,
}

/// One rendered section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewBlock {
    Profile {
        name: String,
        title: String,
        location: String,
        image_url: String,
    },
    AboutMe {
        content: String,
    },
    JobScope {
        title: String,
        responsibilities: String,
    },
    Projects {
        groups: Vec<ProjectGroup>,
    },
    SocialLinks {
        links: Vec<LinkItem>,
    },
}

/// Projects sharing one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub category: String,
    pub projects: Vec<ProjectCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCard {
    pub title: String,
    pub description: String,
    pub status: String,
    /// Every category of the project, comma-joined
    pub categories: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkItem {
    pub platform: String,
    pub url: String,
}

impl PreviewDocument {
    /// Render `form` in the order given by `board`
    #[must_use]
    pub fn build(form: &FormState, board: &SectionBoard) -> Self {
        Self::build_with_organization(form, board, DEFAULT_ORGANIZATION)
    }

    /// Same as [`Self::build`] with an explicit organisation for the contact card
    #[must_use]
    pub fn build_with_organization(
        form: &FormState,
        board: &SectionBoard,
        organization: &str,
    ) -> Self {
        let blocks = board
            .sections()
            .iter()
            .map(|section| render_block(form, section.kind))
            .collect();

        Self {
            contact: contact_card(form, organization),
            blocks,
        }
    }

    /// True when the board has no sections
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Contact card with the preview's placeholders filled in
#[must_use]
pub fn contact_card(form: &FormState, organization: &str) -> ContactCard {
    let profile = &form.profile;
    ContactCard {
        name: or(&profile.name, "Name"),
        email: or(&profile.email, "Email"),
        phone: or(&profile.phone, "Phone"),
        title: or(&profile.title, "Title"),
        organization: or(organization, DEFAULT_ORGANIZATION),
        website: or(&profile.website, "Website"),
    }
}

fn render_block(form: &FormState, kind: SectionKind) -> PreviewBlock {
    match kind {
        SectionKind::Profile => PreviewBlock::Profile {
            name: or(&form.profile.name, "John Doe"),
            title: form.profile.title.clone(),
            location: or(&form.profile.location, "Location not set"),
            image_url: or(&form.profile.image_url, PLACEHOLDER_IMAGE),
        },
        SectionKind::AboutMe => PreviewBlock::AboutMe {
            content: or(&form.about_me, "No About Me content provided."),
        },
        SectionKind::JobScope => PreviewBlock::JobScope {
            title: or(&form.job_scope.title, "N/A"),
            responsibilities: or(&form.job_scope.description, "N/A"),
        },
        SectionKind::Projects => PreviewBlock::Projects {
            groups: group_projects(&form.projects),
        },
        SectionKind::SocialLinks => PreviewBlock::SocialLinks {
            links: form
                .social
                .iter()
                .filter(|link| link.has_url())
                .map(|link| LinkItem {
                    platform: or(&link.platform, "Platform"),
                    url: link.url.trim().to_string(),
                })
                .collect(),
        },
    }
}

/// Group by normalised category, in first-seen order
///
/// A project with several categories appears under each of them.
fn group_projects(projects: &[Project]) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();

    for project in projects {
        let card = ProjectCard {
            title: or(&project.title, "Untitled Project"),
            description: or(&project.description, "No description"),
            status: project.status.clone(),
            categories: or(&project.categories.to_string(), "None"),
        };

        let mut categories = project.categories.normalized();
        if categories.is_empty() {
            categories.push(UNCATEGORIZED.to_string());
        }

        for category in categories {
            match groups.iter_mut().find(|group| group.category == category) {
                Some(group) => group.projects.push(card.clone()),
                None => groups.push(ProjectGroup {
                    category,
                    projects: vec![card.clone()],
                }),
            }
        }
    }

    groups
}

fn or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

impl fmt::Display for PreviewDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            return writeln!(f, "No data to preview. Please go back and add components.");
        }

        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PreviewBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile {
                name,
                title,
                location,
                image_url,
            } => {
                writeln!(f, "# {name}")?;
                if !title.is_empty() {
                    writeln!(f, "{title}")?;
                }
                writeln!(f, "{location}")?;
                writeln!(f, "[image] {image_url}")
            }
            Self::AboutMe { content } => {
                writeln!(f, "## About Me")?;
                writeln!(f, "{content}")
            }
            Self::JobScope {
                title,
                responsibilities,
            } => {
                writeln!(f, "## Job Scope")?;
                writeln!(f, "- Job Title: {title}")?;
                writeln!(f, "- Responsibilities: {responsibilities}")
            }
            Self::Projects { groups } => {
                writeln!(f, "## Projects")?;
                for group in groups {
                    writeln!(f, "### {}", group.category)?;
                    for project in &group.projects {
                        writeln!(f, "- {} [{}]", project.title, project.status)?;
                        writeln!(f, "  {}", project.description)?;
                        writeln!(f, "  Categories: {}", project.categories)?;
                    }
                }
                Ok(())
            }
            Self::SocialLinks { links } => {
                writeln!(f, "## Social Links")?;
                for link in links {
                    writeln!(f, "- {}: {}", link.platform, link.url)?;
                }
                Ok(())
            }
        }
    }
}
