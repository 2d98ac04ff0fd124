//! Domain values and response models
//!
//! `domain` holds the snapshots stored in the named caches, `responses`
//! the DTOs serialized by the operations API.

pub mod domain;
pub mod responses;

// Re-export commonly used types
pub use domain::{
    Application, ApplicationId, ApplicationStats, ApplicationStatus, NewApplication, ResumeId,
    ResumeMetadata, User, UserId,
};
pub use responses::{HealthResponse, InvalidateResponse, NamedCacheStats, StatsResponse};
