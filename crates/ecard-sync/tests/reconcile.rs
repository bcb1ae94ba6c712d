//! End-to-end reconciliation behaviour against in-memory store doubles

use ecard_core::{
    is_stable_id, Categories, FormState, IdGenerator, ProfileId, SequentialIds, UuidGenerator,
};
use ecard_sync::{
    NoticeKind, ProfileEditor, ProfileStore, SaveError, SavePlan, SaveStep, StaticSession, Table,
};
use ecard_test_utils::{
    child_row, link, owned_ids, owner, project, sample_form, CollectingNotifier, GatedStore, Op,
    RecordingStore, ID_A, ID_B, ID_C,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn editor_over(
    store: Arc<dyn ProfileStore>,
    form: FormState,
    ids: Arc<dyn IdGenerator>,
) -> (ProfileEditor, Arc<CollectingNotifier>) {
    let notices = CollectingNotifier::shared();
    let editor = ProfileEditor::new(
        store,
        ids,
        Arc::new(StaticSession::signed_in(owner())),
        notices.clone(),
    )
    .with_form(form);
    (editor, notices)
}

#[tokio::test]
async fn saving_twice_converges_to_the_same_state() {
    let store = Arc::new(RecordingStore::new());
    let (editor, notices) = editor_over(store.clone(), sample_form(), Arc::new(UuidGenerator));

    editor.save().await.unwrap();
    let after_first = store.inner.dump();
    let first_calls = store.calls();

    let second = editor.save().await.unwrap();
    let second_calls = store.calls()[first_calls.len()..].to_vec();

    assert_eq!(store.inner.dump(), after_first);
    assert_eq!(second_calls, first_calls);
    assert!(second.assigned.is_empty());
    assert_eq!(notices.notices().len(), 2);
    assert!(notices.notices().iter().all(|n| n.kind == NoticeKind::Success));
}

#[tokio::test]
async fn links_without_url_are_never_stored() {
    let store = Arc::new(RecordingStore::new());
    let mut form = sample_form();
    form.social.push(link(None, "Mastodon", "   "));
    let (editor, _) = editor_over(store.clone(), form, Arc::new(SequentialIds::new()));

    let report = editor.save().await.unwrap();

    let stored = store.inner.rows(Table::SocialLinks);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["url"], "https://github.com/ada");
    assert_eq!(report.social_skipped, 2);
    // Skipped rows keep no id, since nothing was written for them.
    assert!(editor.snapshot().social[1].id.is_none());
}

#[tokio::test]
async fn empty_collections_clear_stored_rows() {
    let store = Arc::new(RecordingStore::new());
    store
        .inner
        .seed(Table::Projects, [child_row(ID_A), child_row(ID_B)]);
    store.inner.seed(Table::SocialLinks, [child_row(ID_C)]);
    let mut foreign = child_row(ID_C);
    foreign.insert("profile_id".into(), "someone-else".into());
    store.inner.seed(Table::Projects, [foreign]);

    let form = FormState {
        projects: Vec::new(),
        social: vec![link(None, "Blog", "")],
        ..sample_form()
    };
    let (editor, _) = editor_over(store.clone(), form, Arc::new(SequentialIds::new()));
    editor.save().await.unwrap();

    assert!(owned_ids(&store.inner, Table::Projects).is_empty());
    assert!(owned_ids(&store.inner, Table::SocialLinks).is_empty());
    assert_eq!(store.inner.len(Table::Projects), 1);
}

#[tokio::test]
async fn removed_child_is_swept() {
    let store = Arc::new(RecordingStore::new());
    store.inner.seed(
        Table::Projects,
        [child_row(ID_A), child_row(ID_B), child_row(ID_C)],
    );

    let form = FormState {
        projects: vec![
            project(Some(ID_A), "A", "Web"),
            project(Some(ID_C), "C", "IoT"),
        ],
        ..FormState::default()
    };
    let (editor, _) = editor_over(store.clone(), form, Arc::new(SequentialIds::new()));
    editor.save().await.unwrap();

    assert_eq!(
        owned_ids(&store.inner, Table::Projects),
        vec![ID_A.to_string(), ID_C.to_string()]
    );
}

#[tokio::test]
async fn categories_are_stored_as_a_trimmed_list() {
    let store = Arc::new(RecordingStore::new());
    let form = FormState {
        projects: vec![project(None, "P", "Web, Mobile ,  IoT")],
        ..FormState::default()
    };
    let (editor, _) = editor_over(store.clone(), form, Arc::new(SequentialIds::new()));
    editor.save().await.unwrap();

    let rows = store.inner.rows(Table::Projects);
    assert_eq!(rows[0]["categories"], serde_json::json!(["Web", "Mobile", "IoT"]));
}

#[tokio::test]
async fn job_scope_failure_halts_before_children() {
    // Profile and about-me succeed; the job-scope write is the third call.
    let store = Arc::new(RecordingStore::failing_at(3));
    let (editor, notices) = editor_over(store.clone(), sample_form(), Arc::new(UuidGenerator));

    let err = editor.save().await.unwrap_err();

    assert_eq!(err.step(), Some(SaveStep::JobScope));
    assert_eq!(
        store.calls(),
        vec![
            (Op::Upsert, Table::Profiles),
            (Op::Upsert, Table::AboutMe),
            (Op::Upsert, Table::JobScope),
        ]
    );
    assert!(store.inner.rows(Table::Projects).is_empty());
    let notices = notices.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Failure);
}

#[tokio::test]
async fn failure_on_second_call_makes_no_third_call() {
    let store = Arc::new(RecordingStore::failing_at(2));
    let (editor, _) = editor_over(store.clone(), sample_form(), Arc::new(UuidGenerator));

    let err = editor.save().await.unwrap_err();

    assert_eq!(err.step(), Some(SaveStep::AboutMe));
    assert_eq!(store.call_count(), 2);
    // The profile write is not rolled back.
    assert_eq!(store.inner.len(Table::Profiles), 1);
}

#[tokio::test]
async fn failed_save_leaves_ids_unassigned() {
    let store = Arc::new(RecordingStore::failing_at(4));
    let (editor, _) = editor_over(store.clone(), sample_form(), Arc::new(UuidGenerator));

    editor.save().await.unwrap_err();
    assert!(editor.snapshot().projects.iter().all(|p| p.id.is_none()));
}

#[tokio::test]
async fn generated_ids_are_canonical_and_unique() {
    let store = Arc::new(RecordingStore::new());
    let form = FormState {
        projects: (0..40).map(|i| project(None, &format!("p{i}"), "")).collect(),
        social: (0..40)
            .map(|i| link(None, "Site", &format!("https://{i}.example")))
            .collect(),
        ..FormState::default()
    };
    let (editor, _) = editor_over(store.clone(), form, Arc::new(UuidGenerator));

    let report = editor.save().await.unwrap();

    let ids: Vec<&String> = report
        .assigned
        .projects
        .iter()
        .chain(&report.assigned.social)
        .map(|(_, id)| id)
        .collect();
    assert_eq!(ids.len(), 80);
    assert!(ids.iter().all(|id| is_stable_id(id)));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 80);
}

#[tokio::test]
async fn malformed_ids_are_replaced() {
    let store = Arc::new(RecordingStore::new());
    let form = FormState {
        projects: vec![project(Some("temp-1"), "P", "")],
        ..FormState::default()
    };
    let (editor, _) = editor_over(store.clone(), form, Arc::new(SequentialIds::new()));

    let report = editor.save().await.unwrap();

    assert_eq!(report.replaced_malformed, 1);
    let id = editor.snapshot().projects[0].id.clone().unwrap();
    assert!(is_stable_id(&id));
    assert_eq!(owned_ids(&store.inner, Table::Projects), vec![id]);
}

#[tokio::test]
async fn blank_session_id_makes_no_store_calls() {
    let store = Arc::new(RecordingStore::new());
    let notices = CollectingNotifier::shared();
    let editor = ProfileEditor::new(
        store.clone(),
        Arc::new(UuidGenerator),
        Arc::new(StaticSession::signed_in(ProfileId::new(" \t "))),
        notices.clone(),
    )
    .with_form(sample_form());

    let err = editor.save().await.unwrap_err();

    assert!(matches!(err, SaveError::MissingSession));
    assert_eq!(store.call_count(), 0);
    assert_eq!(store.inner.len(Table::Profiles), 0);
    assert_eq!(notices.notices()[0].kind, NoticeKind::Failure);
}

#[tokio::test]
async fn concurrent_save_is_rejected() {
    let store = Arc::new(GatedStore::new());
    let (editor, _) = editor_over(store.clone(), sample_form(), Arc::new(UuidGenerator));

    let first = editor.save();
    let second = async {
        let result = editor.save().await;
        store.open();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(second, Err(SaveError::SaveInProgress)));
    assert!(store.entered() > 0);
    assert_eq!(store.inner.len(Table::Profiles), 1);

    // Guard is released once the first save finishes.
    assert!(editor.save().await.is_ok());
}

#[tokio::test]
async fn load_returns_what_save_wrote() {
    let store = Arc::new(RecordingStore::new());
    let (editor, _) = editor_over(store.clone(), sample_form(), Arc::new(UuidGenerator));
    editor.save().await.unwrap();
    let saved = editor.snapshot();

    let (reader, _) = editor_over(store.clone(), FormState::default(), Arc::new(UuidGenerator));
    let loaded = reader.load().await.unwrap();

    assert_eq!(loaded.profile, saved.profile);
    assert_eq!(loaded.about_me, saved.about_me);
    assert_eq!(loaded.job_scope, saved.job_scope);
    assert_eq!(loaded.projects.len(), 2);
    assert_eq!(
        loaded.projects[0].categories,
        Categories::List(vec!["Math".into(), "History".into()])
    );
    assert_eq!(loaded.social.len(), 1);
}

proptest! {
    #[test]
    fn replanning_after_write_back_assigns_nothing(
        titles in prop::collection::vec("[a-z]{0,8}", 0..8),
        urls in prop::collection::vec(prop::option::of("https://[a-z]{1,6}\\.dev"), 0..8),
    ) {
        let mut form = FormState {
            projects: titles.iter().map(|t| project(None, t, "x, y")).collect(),
            social: urls
                .iter()
                .map(|u| link(None, "Site", u.as_deref().unwrap_or("")))
                .collect(),
            ..FormState::default()
        };
        let ids = SequentialIds::new();

        let first = SavePlan::build(&owner(), &form, &ids);
        let mut controller = ecard_core::FormStateController::from_state(form);
        controller.apply_assigned_ids(&first.assigned_ids());
        form = controller.snapshot();

        let second = SavePlan::build(&owner(), &form, &ids);
        prop_assert!(second.assigned_ids().is_empty());
        let expected: Vec<_> = first
            .projects
            .upserts
            .iter()
            .cloned()
            .map(|mut planned| {
                planned.assigned = false;
                planned
            })
            .collect();
        prop_assert_eq!(second.projects.upserts, expected);
        prop_assert_eq!(second.social.sweep, first.social.sweep);
    }
}
