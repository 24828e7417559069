//! Diagram queue processing.
//!
//! - [`processor::QueueProcessor`] drains one batch of queued jobs with
//!   cache lookup, generation, and pacing.
//! - [`store::DiagramStore`] is the persistence seam it runs against, with
//!   [`store::PgDiagramStore`] backed by `ohm-db`.
//! - [`scheduler::run`] repeats the processor on a fixed interval until
//!   cancelled; used by the worker binary and the API's optional
//!   in-process scheduler.

pub mod config;
pub mod processor;
pub mod scheduler;
pub mod store;

pub use config::ProcessorConfig;
pub use processor::{ProcessError, ProcessSummary, QueueProcessor};
pub use store::{ClaimedJob, DiagramStore, PgDiagramStore, StoreError};
