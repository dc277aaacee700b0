//! Typed repositories over an external document store.
//!
//! The store client is represented by the [DocumentOperations] trait. A
//! [RepositoryFactory] holds one shared operations object and hands out a
//! [CustomRepository] per [Entity] type. Repositories build requests
//! ([Query], [Aggregation], [Update](crate::update::Update), [BulkOperations]), delegate them, and
//! decode the returned documents.
//!
//! ```rust,ignore
//! use patchdoc::repository::{Query, RepositoryFactory};
//! use patchdoc::repository_config::RepositoryConfig;
//!
//! let config = RepositoryConfig::builder().database_name("shop").build()?;
//! let factory = RepositoryFactory::new(config, operations)?;
//!
//! let users = factory.repository::<User>()?;
//! let update = users.build_base_update(&user, &["created_at"])?;
//! users.update_first(&Query::new(doc! { "id": "u1" }), &update)?;
//! ```
//!
//! Connection handling, retries and transport stay with the store client.

mod aggregation;
mod bulk;
mod custom_repository;
mod entity;
mod operations;
mod query;
mod repository_factory;
#[cfg(test)]
mod test_support;

pub use aggregation::*;
pub use bulk::*;
pub use custom_repository::*;
pub use entity::*;
pub use operations::*;
pub use query::*;
pub use repository_factory::*;
