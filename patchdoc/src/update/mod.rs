//! Partial updates of records.
//!
//! A record shape describes its attributes in an [AttributeTable], either
//! through `#[derive(Patchable)]` or by hand with [AttributeTable::builder].
//! [build_partial_update] walks that table and produces an [UpdatePayload]
//! holding only the attributes that should be written:
//!
//! - attributes flagged class-level, derived or transient are skipped
//! - attributes named in the exclusion list are skipped
//! - attributes whose current value is null are skipped
//!
//! The payload keeps declaration order and can be written into any
//! [UpdateSink], such as an [Update] document.
//!
//! ```rust,ignore
//! use patchdoc::update::{build_partial_update, Update};
//!
//! let payload = build_partial_update(&user, &["created_at"])?;
//! let update = Update::from_payload(&payload)?;
//! ```

mod builder;
mod descriptor;
mod exclusion;
mod payload;
mod update_document;

pub use builder::*;
pub use descriptor::*;
pub use exclusion::*;
pub use payload::*;
pub use update_document::*;
