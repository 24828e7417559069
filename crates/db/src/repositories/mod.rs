//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod artifact_version_repo;
pub mod diagram_cache_repo;
pub mod diagram_job_repo;

pub use artifact_version_repo::ArtifactVersionRepo;
pub use diagram_cache_repo::DiagramCacheRepo;
pub use diagram_job_repo::DiagramJobRepo;
