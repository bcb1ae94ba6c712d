//! Store collaborator
//!
//! The hosted backend is reached only through [`ProfileStore`]: insert-or-update
//! one row, delete by filter, select by filter. Filters are AND-combined
//! `eq` / `not in` clauses, which is all the reconciliation path needs.

use crate::error::StoreError;
use async_trait::async_trait;
use ecard_core::ProfileId;
use serde_json::{Map, Value};
use std::fmt;

/// One table row as column → value
pub type Row = Map<String, Value>;

/// Tables the profile builder reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Profiles,
    AboutMe,
    JobScope,
    Projects,
    SocialLinks,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Self::Profiles,
        Self::AboutMe,
        Self::JobScope,
        Self::Projects,
        Self::SocialLinks,
    ];

    /// Table name in the store
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::AboutMe => "about_me",
            Self::JobScope => "job_scope",
            Self::Projects => "projects",
            Self::SocialLinks => "social_links",
        }
    }

    /// Column an upsert resolves conflicts on
    #[must_use]
    pub fn conflict_column(self) -> &'static str {
        match self {
            Self::AboutMe | Self::JobScope => OWNER_COLUMN,
            Self::Profiles | Self::Projects | Self::SocialLinks => ID_COLUMN,
        }
    }

    /// Column holding the owning profile id
    #[must_use]
    pub fn owner_column(self) -> &'static str {
        match self {
            Self::Profiles => ID_COLUMN,
            _ => OWNER_COLUMN,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const ID_COLUMN: &str = "id";
pub const OWNER_COLUMN: &str = "profile_id";

/// Single filter clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Eq { column: String, value: String },
    NotIn { column: String, values: Vec<String> },
}

/// AND-combination of clauses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// `column = value`
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            clauses: vec![Clause::Eq {
                column: column.into(),
                value: value.into(),
            }],
        }
    }

    /// Rows owned by `owner` in `table`
    #[must_use]
    pub fn owned_by(table: Table, owner: &ProfileId) -> Self {
        Self::eq(table.owner_column(), owner.as_str())
    }

    /// Add `AND column NOT IN (values)`
    ///
    /// An empty list is not expressible by the store, so callers must not
    /// pass one; the reconciliation path uses an owner-only filter instead.
    #[must_use]
    pub fn and_not_in(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        debug_assert!(!values.is_empty(), "empty NOT IN list");
        self.clauses.push(Clause::NotIn {
            column: column.into(),
            values,
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluate against a row, comparing text values
    ///
    /// A missing or non-text column fails every clause, as SQL NULL would.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq { column, value } => column_text(row, column) == Some(value.as_str()),
            Clause::NotIn { column, values } => {
                column_text(row, column).is_some_and(|text| !values.iter().any(|v| v == text))
            }
        })
    }
}

fn column_text<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(Value::as_str)
}

/// Text value of `column`, empty when absent or not a string
#[must_use]
pub fn text(row: &Row, column: &str) -> String {
    column_text(row, column).unwrap_or_default().to_string()
}

/// Table-like persistence used by the editor and the reconciliation engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or update one row, resolving conflicts on
    /// [`Table::conflict_column`]
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError>;

    /// Delete every row matching `filter`
    async fn delete(&self, table: Table, filter: Filter) -> Result<(), StoreError>;

    /// Fetch every row matching `filter`
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>, StoreError>;
}
