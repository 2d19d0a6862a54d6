//! Player cache HTTP front end.
//!
//! Exposes config, state, error handling, request policy and routes so the
//! integration tests and the binary entrypoint share the same building
//! blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod router;
pub mod routes;
pub mod state;
