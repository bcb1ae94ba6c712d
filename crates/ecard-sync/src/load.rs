//! Loading a profile back into form state
//!
//! Reads the five tables for one owner and maps rows onto [`FormState`].
//! Columns missing from a row read as empty text. Categories accept both the
//! list form and the older comma-separated text form.

use crate::error::StoreError;
use crate::store::{text, Filter, ProfileStore, Row, Table, ID_COLUMN};
use ecard_core::{
    Categories, FormState, JobScope, ProfileId, ProfileRecord, Project, SocialLink,
};
use serde_json::Value;

/// Fetch the stored state of `owner`
///
/// Returns `Ok(None)` when no profile row exists.
///
/// # Errors
/// Propagates the first store failure.
pub async fn load_form(
    store: &dyn ProfileStore,
    owner: &ProfileId,
) -> Result<Option<FormState>, StoreError> {
    let profiles = store
        .select(Table::Profiles, Filter::owned_by(Table::Profiles, owner))
        .await?;
    let Some(profile) = profiles.first() else {
        tracing::debug!(profile = %owner, "no profile row");
        return Ok(None);
    };

    let about_me = store
        .select(Table::AboutMe, Filter::owned_by(Table::AboutMe, owner))
        .await?;
    let job_scope = store
        .select(Table::JobScope, Filter::owned_by(Table::JobScope, owner))
        .await?;
    let projects = store
        .select(Table::Projects, Filter::owned_by(Table::Projects, owner))
        .await?;
    let social = store
        .select(Table::SocialLinks, Filter::owned_by(Table::SocialLinks, owner))
        .await?;

    let form = FormState {
        profile: profile_from_row(profile),
        about_me: about_me
            .first()
            .map(|row| text(row, "content"))
            .unwrap_or_default(),
        job_scope: job_scope
            .first()
            .map(|row| JobScope {
                title: text(row, "title"),
                description: text(row, "description"),
            })
            .unwrap_or_default(),
        projects: projects.iter().map(project_from_row).collect(),
        social: social.iter().map(link_from_row).collect(),
    };

    tracing::info!(
        profile = %owner,
        projects = form.projects.len(),
        social = form.social.len(),
        "profile loaded"
    );
    Ok(Some(form))
}

fn profile_from_row(row: &Row) -> ProfileRecord {
    ProfileRecord {
        name: text(row, "name"),
        title: text(row, "title"),
        location: text(row, "location"),
        image_url: text(row, "image_url"),
        email: text(row, "email"),
        phone: text(row, "phone"),
        website: text(row, "website"),
    }
}

fn project_from_row(row: &Row) -> Project {
    let status = text(row, "status");
    Project {
        id: optional_id(row),
        title: text(row, "title"),
        description: text(row, "description"),
        status: if status.is_empty() {
            Project::default().status
        } else {
            status
        },
        categories: categories(row.get("categories")),
    }
}

fn link_from_row(row: &Row) -> SocialLink {
    SocialLink {
        id: optional_id(row),
        platform: text(row, "platform"),
        url: text(row, "url"),
    }
}

fn optional_id(row: &Row) -> Option<String> {
    row.get(ID_COLUMN).and_then(Value::as_str).map(str::to_string)
}

fn categories(value: Option<&Value>) -> Categories {
    match value {
        Some(Value::Array(items)) => Categories::List(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        Some(Value::String(raw)) => Categories::Text(raw.clone()),
        _ => Categories::default(),
    }
}
