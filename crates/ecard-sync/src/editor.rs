//! Profile editor
//!
//! Ties the form controller to the store:
//! - `load` fills the controller from the store
//! - `save` reconciles the controller's state into the store
//! - one save at a time per editor; a second concurrent call is refused
//!
//! Every save ends in exactly one notice to the [`Notifier`].

use crate::engine::{ReconciliationEngine, SaveReport};
use crate::error::{EditorError, SaveError, StoreError};
use crate::load::load_form;
use crate::notify::{Notice, Notifier, SAVE_FAILURE, SAVE_SUCCESS, SESSION_MISSING};
use crate::reconcile::SavePlan;
use crate::session::SessionProvider;
use crate::store::{ProfileStore, Row, Table, ID_COLUMN};
use ecard_core::{FormState, FormStateController, IdGenerator, ProfileId};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct ProfileEditor {
    store: Arc<dyn ProfileStore>,
    engine: ReconciliationEngine,
    ids: Arc<dyn IdGenerator>,
    session: Arc<dyn SessionProvider>,
    notifier: Arc<dyn Notifier>,
    form: Mutex<FormStateController>,
    saving: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ProfileEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileEditor")
            .field("form", &*self.form.lock())
            .finish_non_exhaustive()
    }
}

impl ProfileEditor {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProfileStore>,
        ids: Arc<dyn IdGenerator>,
        session: Arc<dyn SessionProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            engine: ReconciliationEngine::new(Arc::clone(&store)),
            store,
            ids,
            session,
            notifier,
            form: Mutex::new(FormStateController::new()),
            saving: tokio::sync::Mutex::new(()),
        }
    }

    /// Status given to new project rows
    #[must_use]
    pub fn with_default_status(self, status: impl Into<String>) -> Self {
        let status = status.into();
        {
            let mut form = self.form.lock();
            let current = std::mem::take(&mut *form);
            *form = current.with_default_status(status);
        }
        self
    }

    /// Start from a given state instead of an empty form
    #[must_use]
    pub fn with_form(self, state: FormState) -> Self {
        self.form.lock().replace(state);
        self
    }

    /// Run `f` against the controller
    pub fn edit<T>(&self, f: impl FnOnce(&mut FormStateController) -> T) -> T {
        f(&mut self.form.lock())
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> FormState {
        self.form.lock().snapshot()
    }

    /// Session profile id; a blank id counts as no session
    fn owner(&self) -> Option<ProfileId> {
        self.session.profile_id().filter(|id| !id.is_blank())
    }

    /// Replace the controller's state with what the store holds
    ///
    /// # Errors
    /// - [`SaveError::MissingSession`] (wrapped) without a session
    /// - [`EditorError::ProfileNotFound`] when the profile row is absent
    /// - [`EditorError::Store`] on store failure
    pub async fn load(&self) -> Result<FormState, EditorError> {
        let owner = self.owner().ok_or(SaveError::MissingSession)?;
        let state = load_form(self.store.as_ref(), &owner)
            .await?
            .ok_or_else(|| EditorError::ProfileNotFound(owner.to_string()))?;
        self.form.lock().replace(state.clone());
        Ok(state)
    }

    /// Insert an empty profile under a fresh id
    ///
    /// # Errors
    /// Propagates the store failure.
    pub async fn create_profile(
        store: &dyn ProfileStore,
        ids: &dyn IdGenerator,
    ) -> Result<ProfileId, StoreError> {
        let id = ProfileId::new(ids.generate());
        let mut row = Row::new();
        row.insert(ID_COLUMN.to_string(), id.as_str().into());
        store.upsert(Table::Profiles, row).await?;
        tracing::info!(profile = %id, "profile created");
        Ok(id)
    }

    /// Reconcile the current state into the store
    ///
    /// # Errors
    /// - [`SaveError::SaveInProgress`] while another save runs
    /// - [`SaveError::MissingSession`] without a session; nothing is written
    /// - [`SaveError::WriteFailed`] at the first failing write; earlier writes
    ///   stay committed
    pub async fn save(&self) -> Result<SaveReport, SaveError> {
        let Ok(_guard) = self.saving.try_lock() else {
            tracing::warn!("save requested while another is in flight");
            return Err(SaveError::SaveInProgress);
        };

        let Some(owner) = self.owner() else {
            tracing::warn!("save refused: no session");
            self.notifier.notify(Notice::failure(SESSION_MISSING));
            return Err(SaveError::MissingSession);
        };

        let plan = SavePlan::build(&owner, self.form.lock().state(), self.ids.as_ref());

        match self.engine.execute(&plan).await {
            Ok(report) => {
                self.form.lock().apply_assigned_ids(&report.assigned);
                self.notifier.notify(Notice::success(SAVE_SUCCESS));
                Ok(report)
            }
            Err(err) => {
                tracing::error!(profile = %owner, error = %err, "save aborted");
                self.notifier.notify(Notice::failure(SAVE_FAILURE));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::notify::NoticeKind;
    use crate::session::StaticSession;
    use crate::store::MockProfileStore;
    use ecard_core::{ChildField, Collection, FieldPath, SequentialIds};

    #[derive(Default)]
    struct Notices(Mutex<Vec<Notice>>);

    impl Notifier for Notices {
        fn notify(&self, notice: Notice) {
            self.0.lock().push(notice);
        }
    }

    fn editor(
        store: Arc<dyn ProfileStore>,
        session: StaticSession,
    ) -> (ProfileEditor, Arc<Notices>) {
        let notices = Arc::new(Notices::default());
        let editor = ProfileEditor::new(
            store,
            Arc::new(SequentialIds::new()),
            Arc::new(session),
            notices.clone(),
        );
        (editor, notices)
    }

    #[tokio::test]
    async fn save_without_session_writes_nothing() {
        let mut store = MockProfileStore::new();
        store.expect_upsert().times(0);
        store.expect_delete().times(0);

        let (editor, notices) = editor(Arc::new(store), StaticSession::anonymous());
        let err = editor.save().await.unwrap_err();

        assert!(matches!(err, SaveError::MissingSession));
        let notices = notices.0.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, SESSION_MISSING);
    }

    #[tokio::test]
    async fn blank_profile_id_is_treated_as_no_session() {
        let mut store = MockProfileStore::new();
        store.expect_upsert().times(0);
        store.expect_delete().times(0);
        store.expect_select().times(0);

        let (editor, notices) = editor(
            Arc::new(store),
            StaticSession::signed_in(ProfileId::new("  ")),
        );
        editor.edit(|form| form.set_field(FieldPath::Name, "Ada"));

        let err = editor.save().await.unwrap_err();
        assert!(matches!(err, SaveError::MissingSession));
        let notices = notices.0.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, SESSION_MISSING);
        drop(notices);

        let err = editor.load().await.unwrap_err();
        assert!(matches!(err, EditorError::Save(SaveError::MissingSession)));
    }

    #[tokio::test]
    async fn save_writes_assigned_ids_back() {
        let store = Arc::new(InMemoryStore::new());
        let (editor, notices) = editor(
            store.clone(),
            StaticSession::signed_in(ProfileId::new("p")),
        );
        editor.edit(|form| {
            form.set_field(FieldPath::Name, "Ada");
            let row = form.add_child(Collection::Projects);
            form.update_child_field(Collection::Projects, &row, ChildField::Title, "Engine");
        });

        let report = editor.save().await.unwrap();
        assert_eq!(report.assigned.projects.len(), 1);

        let saved = editor.snapshot();
        assert_eq!(
            saved.projects[0].id.as_deref(),
            Some(report.assigned.projects[0].1.as_str())
        );
        assert_eq!(store.len(Table::Projects), 1);
        assert_eq!(notices.0.lock()[0].kind, NoticeKind::Success);
    }

    #[tokio::test]
    async fn failed_save_sends_one_failure_notice() {
        let mut store = MockProfileStore::new();
        store
            .expect_upsert()
            .returning(|_, _| Err(StoreError::Transport("offline".into())));

        let (editor, notices) = editor(
            Arc::new(store),
            StaticSession::signed_in(ProfileId::new("p")),
        );
        let err = editor.save().await.unwrap_err();

        assert_eq!(err.step(), Some(crate::error::SaveStep::Profile));
        let notices = notices.0.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, SAVE_FAILURE);
    }

    #[tokio::test]
    async fn load_missing_profile_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let (editor, _) = editor(store, StaticSession::signed_in(ProfileId::new("p")));

        let err = editor.load().await.unwrap_err();
        assert!(matches!(err, EditorError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn create_then_load_round_trip() {
        let store = Arc::new(InMemoryStore::new());
        let id = ProfileEditor::create_profile(store.as_ref(), &SequentialIds::new())
            .await
            .unwrap();

        let (editor, _) = editor(store, StaticSession::signed_in(id));
        let state = editor.load().await.unwrap();
        assert_eq!(state, FormState::default());
    }

    #[tokio::test]
    async fn default_status_applies_to_new_rows() {
        let (editor, _) = editor(
            Arc::new(InMemoryStore::new()),
            StaticSession::anonymous(),
        );
        let editor = editor.with_default_status("on-going");
        editor.edit(|form| form.add_child(Collection::Projects));
        assert_eq!(editor.snapshot().projects[0].status, "on-going");
    }
}
