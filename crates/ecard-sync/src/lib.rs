//! E-Card Sync
//!
//! Persistence side of the profile builder:
//! - `ProfileStore` seam with in-memory and HTTP adapters
//! - Pure set-reconciliation planning for child collections
//! - A reconciliation engine executing plans in a fixed order
//! - `ProfileEditor`: load, save with an in-flight guard, notices
//!
//! # Example
//!
//! ```rust,ignore
//! use ecard_sync::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let editor = ProfileEditor::new(
//!     store,
//!     Arc::new(UuidGenerator),
//!     Arc::new(StaticSession::signed_in(ProfileId::new("me"))),
//!     Arc::new(LogNotifier),
//! );
//! editor.edit(|form| form.set_field(FieldPath::Name, "Ada"));
//! let report = editor.save().await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod editor;
pub mod engine;
pub mod error;
pub mod load;
pub mod memory;
pub mod notify;
pub mod reconcile;
pub mod rest;
pub mod session;
pub mod store;

pub use editor::ProfileEditor;
pub use engine::{ReconciliationEngine, SaveReport};
pub use error::{EditorError, SaveError, SaveStep, StoreError};
pub use load::load_form;
pub use memory::InMemoryStore;
pub use notify::{LogNotifier, Notice, NoticeKind, Notifier};
pub use reconcile::{plan_collection, ChildRecord, CollectionPlan, PlannedRow, SavePlan, Sweep};
pub use rest::RestStore;
pub use session::{SessionProvider, SharedSession, StaticSession};
pub use store::{Filter, ProfileStore, Row, Table};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for loading and saving profiles
    pub use crate::{
        InMemoryStore, LogNotifier, ProfileEditor, ProfileStore, RestStore, SaveError,
        SaveReport, StaticSession,
    };
    pub use ecard_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use ecard_core::{ChildField, Collection, FieldPath, ProfileId, SequentialIds};
    use std::sync::Arc;

    #[tokio::test]
    async fn second_save_without_edits_issues_same_writes() {
        let store = Arc::new(InMemoryStore::new());
        let editor = ProfileEditor::new(
            store.clone(),
            Arc::new(SequentialIds::new()),
            Arc::new(StaticSession::signed_in(ProfileId::new("p"))),
            Arc::new(LogNotifier),
        );
        editor.edit(|form| {
            form.set_field(FieldPath::Name, "Ada");
            let link = form.add_child(Collection::Social);
            form.update_child_field(Collection::Social, &link, ChildField::Url, "https://ada.dev");
        });

        let first = editor.save().await.unwrap();
        let after_first = store.dump();
        let second = editor.save().await.unwrap();

        assert_eq!(store.dump(), after_first);
        assert_eq!(first.writes, second.writes);
        assert!(second.assigned.is_empty());
    }
}
