//! Row types and insert DTOs, one module per table.

pub mod artifact_version;
pub mod diagram_cache;
pub mod diagram_job;
