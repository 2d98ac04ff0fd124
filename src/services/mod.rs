//! Cached services
//!
//! Each service reads through its named cache with `compute_once` and, after
//! every write it commits, deletes the key its read path uses.

mod applications;
mod metadata;
mod repository;
mod users;

pub use applications::ApplicationService;
pub use metadata::MetadataService;
pub use repository::{InMemoryRepository, RepositoryResult, ResumeRepository};
pub use users::UserService;
