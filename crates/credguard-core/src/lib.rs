#![deny(missing_docs)]

//! # credguard-core — Foundational Types for CredGuard
//!
//! Every other crate in the workspace depends on this one. It carries no
//! internal dependencies, only `serde`, `serde_json`, `thiserror`, `chrono`,
//! and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Value objects.** [`Issuer`], [`PhysicalDocument`], and [`Credential`]
//!    are immutable once built. Lifecycle changes consume the old value and
//!    return a new one, so no two holders can observe diverging state.
//!
//! 2. **Policy lives on [`DocumentType`].** Display names, required fields,
//!    validity periods, and credential subtypes are exhaustive `match`es on a
//!    single enum. Adding a document type fails to compile until every policy
//!    is answered.
//!
//! 3. **[`CredGuardError`] taxonomy.** One variant per failure domain of the
//!    pipeline. No `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod credential;
pub mod document;
pub mod error;
pub mod issuer;

pub use credential::{Credential, JWT_CLAIM, PUBLIC_KEY_URL_CLAIM};
pub use document::{Attributes, DocumentType, PhysicalDocument, ProcessingStatus};
pub use error::{CredGuardError, TransitionError};
pub use issuer::Issuer;
