//! Domain logic shared by the Ohm diagram pipeline.
//!
//! Everything here is pure: circuit parsing and validation, structural
//! hashing for the diagram cache, prompt construction, and the small
//! amount of arithmetic behind queue pacing and wait estimates.

pub mod circuit;
pub mod error;
pub mod hashing;
pub mod prompt;
pub mod queue;
pub mod types;
