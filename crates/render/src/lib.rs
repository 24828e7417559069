//! Circuit diagram rendering through a hosted text-to-image endpoint.
//!
//! [`api::DiagramApi`] is the raw HTTP client; [`generator::DiagramGenerator`]
//! is the seam the queue processor depends on, with
//! [`generator::HttpDiagramGenerator`] as the production implementation.

pub mod api;
pub mod config;
pub mod generator;

pub use api::{DiagramApi, RenderError};
pub use config::RenderConfig;
pub use generator::{DiagramGenerator, HttpDiagramGenerator, UnconfiguredGenerator};
