//! Reconciliation engine
//!
//! Executes a [`SavePlan`] against a [`ProfileStore`] in the fixed order:
//! profile, about-me, job scope, project upserts, project sweep, social
//! upserts, social sweep. Each write is awaited before the next starts. The
//! first failure stops the sequence; writes already made stay made.

use crate::error::{SaveError, SaveStep};
use crate::reconcile::{CollectionPlan, SavePlan};
use crate::store::{ProfileStore, Table};
use ecard_core::{AssignedIds, FormState, IdGenerator, ProfileId};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a completed save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Store calls issued, upserts and sweeps together
    pub writes: usize,
    pub projects_written: usize,
    pub social_written: usize,
    /// Social links dropped for having no URL
    pub social_skipped: usize,
    /// Rows whose malformed id was replaced
    pub replaced_malformed: usize,
    pub assigned: AssignedIds,
    pub elapsed_ms: u64,
}

/// Drives plans against one store
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn ProfileStore>,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine").finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Plan and execute in one go
    ///
    /// # Errors
    /// [`SaveError::WriteFailed`] at the first failing write.
    pub async fn reconcile(
        &self,
        owner: &ProfileId,
        form: &FormState,
        ids: &dyn IdGenerator,
    ) -> Result<SaveReport, SaveError> {
        let plan = SavePlan::build(owner, form, ids);
        self.execute(&plan).await
    }

    /// Execute a prepared plan
    ///
    /// # Errors
    /// [`SaveError::WriteFailed`] naming the step that failed. No later step
    /// runs after a failure.
    pub async fn execute(&self, plan: &SavePlan) -> Result<SaveReport, SaveError> {
        let start = Instant::now();
        let owner = &plan.owner;
        tracing::info!(profile = %owner, writes = plan.write_count(), "save started");

        let mut writes = 0;

        self.upsert(Table::Profiles, SaveStep::Profile, plan.profile.clone())
            .await?;
        writes += 1;
        self.upsert(Table::AboutMe, SaveStep::AboutMe, plan.about_me.clone())
            .await?;
        writes += 1;
        self.upsert(Table::JobScope, SaveStep::JobScope, plan.job_scope.clone())
            .await?;
        writes += 1;

        writes += self
            .converge(owner, &plan.projects, SaveStep::ProjectUpsert, SaveStep::ProjectSweep)
            .await?;
        writes += self
            .converge(owner, &plan.social, SaveStep::SocialUpsert, SaveStep::SocialSweep)
            .await?;

        let report = SaveReport {
            writes,
            projects_written: plan.projects.upserts.len(),
            social_written: plan.social.upserts.len(),
            social_skipped: plan.social.skipped,
            replaced_malformed: plan.projects.replaced_malformed + plan.social.replaced_malformed,
            assigned: plan.assigned_ids(),
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        tracing::info!(
            profile = %owner,
            writes = report.writes,
            elapsed_ms = report.elapsed_ms,
            "save completed"
        );
        Ok(report)
    }

    /// Upserts of one collection, then its sweep
    async fn converge(
        &self,
        owner: &ProfileId,
        plan: &CollectionPlan,
        upsert_step: SaveStep,
        sweep_step: SaveStep,
    ) -> Result<usize, SaveError> {
        for planned in &plan.upserts {
            tracing::debug!(table = %plan.table, id = %planned.id, "upsert");
            self.upsert(plan.table, upsert_step, planned.row.clone())
                .await?;
        }

        let filter = plan.sweep.filter(owner);
        tracing::debug!(table = %plan.table, sweep = ?plan.sweep, "delete-sweep");
        self.store
            .delete(plan.table, filter)
            .await
            .map_err(|e| fail(sweep_step, e))?;

        Ok(plan.upserts.len() + 1)
    }

    async fn upsert(
        &self,
        table: Table,
        step: SaveStep,
        row: crate::store::Row,
    ) -> Result<(), SaveError> {
        self.store
            .upsert(table, row)
            .await
            .map_err(|e| fail(step, e))
    }
}

fn fail(step: SaveStep, source: crate::error::StoreError) -> SaveError {
    tracing::warn!(%step, error = %source, "write failed, aborting save");
    SaveError::write(step, source)
}
