//! E-Card Core
//!
//! Everything about one profile that lives in memory:
//! - The editable form state and its mutation API
//! - Stable identifier recognition and generation
//! - The ordered section board behind the public preview
//! - Preview rendering and vCard export
//! - Configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use ecard_core::prelude::*;
//!
//! let mut form = FormStateController::new();
//! form.set_field(FieldPath::Name, "Ada Lovelace");
//! let row = form.add_child(Collection::Projects);
//! form.update_child_field(Collection::Projects, &row, ChildField::Categories, "Web, IoT");
//!
//! let board = SectionBoard::with_kinds(&SectionKind::ALL, &UuidGenerator);
//! let preview = PreviewDocument::build(form.state(), &board);
//! println!("{}", preview.contact.to_vcard());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod form;
pub mod identity;
pub mod preview;
pub mod sections;
pub mod types;
pub mod vcard;

pub use config::{AppConfig, EditorConfig, StoreConfig};
pub use error::CoreError;
pub use form::{AssignedIds, ChildField, ChildRow, FieldPath, FormStateController};
pub use identity::{has_stable_id, is_stable_id, IdGenerator, SequentialIds, UuidGenerator};
pub use preview::{PreviewBlock, PreviewDocument};
pub use sections::{Section, SectionBoard, SectionKind};
pub use types::{
    Categories, ChildKey, Collection, FormState, JobScope, ProfileId, ProfileRecord, Project,
    SocialLink,
};
pub use vcard::ContactCard;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the profile builder
    pub use crate::{
        ChildField, ChildKey, Collection, FieldPath, FormState, FormStateController,
        PreviewDocument, ProfileId, SectionBoard, SectionKind, UuidGenerator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
