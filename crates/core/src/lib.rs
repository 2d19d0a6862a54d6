//! Shared domain types for the player cache proxy.
//!
//! Everything here is free of I/O so the store, the refresh worker and the
//! HTTP layer can all depend on it.

pub mod clock;
pub mod codec;
pub mod error;
pub mod types;
