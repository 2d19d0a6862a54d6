//! Background refresh of cached player documents.
//!
//! - [`queue`] -- the unbounded refresh queue and its consumer half.
//! - [`document`] -- the stored document schema and its byte encoding.
//! - [`worker`] -- the single refresh loop and its backoff rules.

pub mod document;
pub mod queue;
pub mod worker;

pub use document::{DocumentCodec, DocumentError, PlayerDocument};
pub use queue::{RefreshQueue, RefreshRequest};
pub use worker::{RefreshHandle, RefreshWorker, WorkerConfig, WorkerError};
