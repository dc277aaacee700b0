//! # patchdoc - partial updates and typed repositories for document stores
//!
//! patchdoc turns a record into the smallest update a document store needs:
//! only the attributes that are persistable, not excluded by the caller, and
//! currently non-null. Around that core it provides the pieces a repository
//! layer over an external store client needs.
//!
//! ## Key Features
//!
//! - **Partial updates**: compile-time attribute tables (`#[derive(Patchable)]`)
//!   and a builder that produces ordered update payloads
//! - **Update documents**: `$set` / `$unset` / `$inc` sections with conflict rules
//! - **Date conversions**: chrono types to and from millisecond store dates in a
//!   configurable zone
//! - **Repositories**: typed passthroughs, projections and bulk writes over a
//!   pluggable [`repository::DocumentOperations`] client
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use patchdoc::update::{build_partial_update, Update};
//! use patchdoc_derive::{Convertible, Patchable};
//!
//! #[derive(Patchable, Convertible)]
//! struct User {
//!     id: String,
//!     name: Option<String>,
//!     age: Option<i32>,
//!     #[patch(transient)]
//!     internal_cache: Option<String>,
//! }
//!
//! let user = User { id: "u1".into(), name: Some("Ana".into()), age: None, internal_cache: None };
//! let payload = build_partial_update(&user, &["id"])?;
//! let update = Update::from_payload(&payload)?;
//! // {"$set": {"name": "Ana"}}
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - values, conversion traits and shared utilities
//! - [`convert`] - date/time converters
//! - [`document`] - insertion-ordered documents and the `doc!` macro
//! - [`errors`] - error types and result definitions
//! - [`repository`] - entities, queries, bulk writes and repositories
//! - [`repository_config`] - repository layer configuration
//! - [`update`] - attribute tables, the partial update builder and update documents

pub mod common;
pub mod convert;
pub mod document;
pub mod errors;
pub mod repository;
pub mod repository_config;
pub mod update;
