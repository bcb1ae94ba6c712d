//! Set reconciliation for child collections
//!
//! Pure planning step: given the in-memory rows of one collection, the owning
//! profile and an id source, decide which rows to upsert and what the
//! delete-sweep must match. No store is involved here; [`crate::engine`]
//! executes the plan.
//!
//! # Identity
//!
//! A row is "existing" exactly when its id has the canonical UUID layout.
//! Absent ids and placeholders alike are "new" and get a fresh id. A present
//! but malformed id is counted in [`CollectionPlan::replaced_malformed`] and
//! logged, since it may be a row the store already knows under that id.

use crate::store::{Filter, Row, Table, ID_COLUMN, OWNER_COLUMN};
use ecard_core::{
    is_stable_id, AssignedIds, FormState, IdGenerator, ProfileId, Project, SocialLink,
};
use serde_json::{json, Value};

/// A row kind that lives in its own table under a profile
pub trait ChildRecord {
    /// Table the rows go to
    const TABLE: Table;

    /// Current identifier, if any
    fn id(&self) -> Option<&str>;

    /// Rows failing this gate are never written
    fn is_persistable(&self) -> bool {
        true
    }

    /// Column values for an upsert under `id`
    fn to_row(&self, id: &str, owner: &ProfileId) -> Row;
}

impl ChildRecord for Project {
    const TABLE: Table = Table::Projects;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn to_row(&self, id: &str, owner: &ProfileId) -> Row {
        row(json!({
            ID_COLUMN: id,
            OWNER_COLUMN: owner.as_str(),
            "title": self.title,
            "description": self.description,
            "status": self.status,
            "categories": self.categories.normalized(),
        }))
    }
}

impl ChildRecord for SocialLink {
    const TABLE: Table = Table::SocialLinks;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_persistable(&self) -> bool {
        self.has_url()
    }

    fn to_row(&self, id: &str, owner: &ProfileId) -> Row {
        row(json!({
            ID_COLUMN: id,
            OWNER_COLUMN: owner.as_str(),
            "platform": self.platform,
            "url": self.url,
        }))
    }
}

/// One row to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRow {
    /// Position in the in-memory collection
    pub index: usize,
    pub id: String,
    /// Id was generated by this plan
    pub assigned: bool,
    pub row: Row,
}

/// What the delete-sweep removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sweep {
    /// Every row of the owner; used when nothing survives locally
    AllForOwner,
    /// Every row of the owner except these ids
    ExceptIds(Vec<String>),
}

impl Sweep {
    /// Store filter for this sweep
    #[must_use]
    pub fn filter(&self, owner: &ProfileId) -> Filter {
        let base = Filter::eq(OWNER_COLUMN, owner.as_str());
        match self {
            Self::AllForOwner => base,
            Self::ExceptIds(keep) => base.and_not_in(ID_COLUMN, keep.clone()),
        }
    }
}

/// Writes that converge one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPlan {
    pub table: Table,
    pub upserts: Vec<PlannedRow>,
    pub sweep: Sweep,
    /// Rows dropped by the persistence gate
    pub skipped: usize,
    /// Rows whose present id was malformed and got replaced
    pub replaced_malformed: usize,
}

impl CollectionPlan {
    /// Ids that will exist for the owner after the plan runs
    #[must_use]
    pub fn kept_ids(&self) -> Vec<&str> {
        match &self.sweep {
            Sweep::AllForOwner => Vec::new(),
            Sweep::ExceptIds(keep) => keep.iter().map(String::as_str).collect(),
        }
    }

    /// `(index, id)` of every generated id
    #[must_use]
    pub fn assigned(&self) -> Vec<(usize, String)> {
        self.upserts
            .iter()
            .filter(|planned| planned.assigned)
            .map(|planned| (planned.index, planned.id.clone()))
            .collect()
    }
}

/// Plan the writes for one collection
#[must_use]
pub fn plan_collection<R: ChildRecord>(
    owner: &ProfileId,
    records: &[R],
    ids: &dyn IdGenerator,
) -> CollectionPlan {
    let mut upserts = Vec::with_capacity(records.len());
    let mut keep: Vec<String> = Vec::with_capacity(records.len());
    let mut skipped = 0;
    let mut replaced_malformed = 0;

    for (index, record) in records.iter().enumerate() {
        if !record.is_persistable() {
            tracing::debug!(table = R::TABLE.name(), index, "row skipped by persistence gate");
            skipped += 1;
            continue;
        }

        let (id, assigned) = match record.id() {
            Some(existing) if is_stable_id(existing) => (existing.to_string(), false),
            Some(malformed) => {
                tracing::warn!(
                    table = R::TABLE.name(),
                    index,
                    id = malformed,
                    "malformed row id treated as new"
                );
                replaced_malformed += 1;
                (ids.generate(), true)
            }
            None => (ids.generate(), true),
        };

        if !keep.contains(&id) {
            keep.push(id.clone());
        }
        upserts.push(PlannedRow {
            index,
            row: record.to_row(&id, owner),
            id,
            assigned,
        });
    }

    let sweep = if keep.is_empty() {
        Sweep::AllForOwner
    } else {
        Sweep::ExceptIds(keep)
    };

    CollectionPlan {
        table: R::TABLE,
        upserts,
        sweep,
        skipped,
        replaced_malformed,
    }
}

/// Every write of one save, in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    pub owner: ProfileId,
    pub profile: Row,
    pub about_me: Row,
    pub job_scope: Row,
    pub projects: CollectionPlan,
    pub social: CollectionPlan,
}

impl SavePlan {
    /// Plan a full save of `form` for `owner`
    #[must_use]
    pub fn build(owner: &ProfileId, form: &FormState, ids: &dyn IdGenerator) -> Self {
        let profile = &form.profile;
        Self {
            owner: owner.clone(),
            profile: row(json!({
                ID_COLUMN: owner.as_str(),
                "name": profile.name,
                "title": profile.title,
                "location": profile.location,
                "image_url": profile.image_url,
                "email": profile.email,
                "phone": profile.phone,
                "website": profile.website,
            })),
            about_me: row(json!({
                OWNER_COLUMN: owner.as_str(),
                "content": form.about_me,
            })),
            job_scope: row(json!({
                OWNER_COLUMN: owner.as_str(),
                "title": form.job_scope.title,
                "description": form.job_scope.description,
            })),
            projects: plan_collection(owner, &form.projects, ids),
            social: plan_collection(owner, &form.social, ids),
        }
    }

    /// Ids generated for new rows, by position
    #[must_use]
    pub fn assigned_ids(&self) -> AssignedIds {
        AssignedIds {
            projects: self.projects.assigned(),
            social: self.social.assigned(),
        }
    }

    /// Total store calls the plan will make
    #[must_use]
    pub fn write_count(&self) -> usize {
        3 + self.projects.upserts.len() + self.social.upserts.len() + 2
    }
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
