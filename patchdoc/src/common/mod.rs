//! Common types shared by the update builder and the repository layer.
//!
//! - [`Value`] - the closed set of value kinds a document can hold
//! - [`Convertible`] - conversion between Rust types and [`Value`]
//! - [`Atomic`] - shared, lock-protected state used for process-wide settings

mod constants;
mod convertible;
mod type_utils;
mod value;

pub use constants::*;
pub use convertible::*;
pub use type_utils::*;
pub use value::*;
