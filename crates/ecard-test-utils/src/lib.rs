//! Testing utilities for the e-card workspace
//!
//! Shared fixtures, store doubles and a notice collector.

#![allow(missing_docs)]

use async_trait::async_trait;
use ecard_core::{
    Categories, FormState, JobScope, ProfileId, ProfileRecord, Project, SocialLink,
};
use ecard_sync::{
    Filter, InMemoryStore, Notice, Notifier, ProfileStore, Row, StoreError, Table,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const OWNER: &str = "owner-1";

pub const ID_A: &str = "aaaaaaaa-0000-4000-8000-00000000000a";
pub const ID_B: &str = "bbbbbbbb-0000-4000-8000-00000000000b";
pub const ID_C: &str = "cccccccc-0000-4000-8000-00000000000c";

pub fn owner() -> ProfileId {
    ProfileId::new(OWNER)
}

pub fn project(id: Option<&str>, title: &str, categories: &str) -> Project {
    Project {
        id: id.map(str::to_string),
        title: title.to_string(),
        description: format!("{title} description"),
        status: "on-going".to_string(),
        categories: Categories::from(categories),
    }
}

pub fn link(id: Option<&str>, platform: &str, url: &str) -> SocialLink {
    SocialLink {
        id: id.map(str::to_string),
        platform: platform.to_string(),
        url: url.to_string(),
    }
}

pub fn sample_form() -> FormState {
    FormState {
        profile: ProfileRecord {
            name: "Ada Lovelace".into(),
            title: "Analyst".into(),
            location: "London".into(),
            image_url: "https://img.example/ada.png".into(),
            email: "ada@example.com".into(),
            phone: "+44 20 0000".into(),
            website: "https://ada.example".into(),
        },
        about_me: "Writes programs for engines.".into(),
        job_scope: JobScope {
            title: "Research".into(),
            description: "Notes on the analytical engine".into(),
        },
        projects: vec![
            project(None, "Engine notes", "Math, History"),
            project(None, "Bernoulli table", "Math"),
        ],
        social: vec![
            link(None, "GitHub", "https://github.com/ada"),
            link(None, "Blog", ""),
        ],
    }
}

/// Store row from a JSON object literal
pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

/// Child row already present for [`OWNER`]
pub fn child_row(id: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".into(), id.into());
    row.insert("profile_id".into(), OWNER.into());
    row
}

/// Ids of `table` rows owned by [`OWNER`], sorted
pub fn owned_ids(store: &InMemoryStore, table: Table) -> Vec<String> {
    let mut ids: Vec<String> = store
        .rows(table)
        .iter()
        .filter(|row| row.get("profile_id").and_then(Value::as_str) == Some(OWNER))
        .filter_map(|row| row.get("id").and_then(Value::as_str).map(str::to_string))
        .collect();
    ids.sort();
    ids
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Upsert,
    Delete,
    Select,
}

/// In-memory store that records every call and can fail on the n-th one
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: InMemoryStore,
    calls: Mutex<Vec<(Op, Table)>>,
    fail_at: Option<usize>,
}

impl RecordingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th call (1-based) with a transport error
    #[must_use]
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Op, Table)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, op: Op, table: Table) -> Result<(), StoreError> {
        let mut calls = self.calls.lock();
        calls.push((op, table));
        if Some(calls.len()) == self.fail_at {
            return Err(StoreError::Transport(format!("injected failure on {table}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RecordingStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        self.record(Op::Upsert, table)?;
        self.inner.upsert(table, row).await
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<(), StoreError> {
        self.record(Op::Delete, table)?;
        self.inner.delete(table, filter).await
    }

    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>, StoreError> {
        self.record(Op::Select, table)?;
        self.inner.select(table, filter).await
    }
}

/// Store whose upserts wait until [`GatedStore::open`] is called
#[derive(Debug)]
pub struct GatedStore {
    pub inner: InMemoryStore,
    gate: Semaphore,
    entered: AtomicUsize,
}

impl Default for GatedStore {
    fn default() -> Self {
        Self {
            inner: InMemoryStore::new(),
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
        }
    }
}

impl GatedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let every waiting and future write through
    pub fn open(&self) {
        self.gate.close();
    }

    /// Writes that reached the gate
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        // A closed semaphore fails every acquire, which is the open state.
        if let Ok(permit) = self.gate.acquire().await {
            drop(permit);
        }
    }
}

#[async_trait]
impl ProfileStore for GatedStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        self.wait().await;
        self.inner.upsert(table, row).await
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<(), StoreError> {
        self.inner.delete(table, filter).await
    }

    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>, StoreError> {
        self.inner.select(table, filter).await
    }
}

/// Keeps every notice
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
