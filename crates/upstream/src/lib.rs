//! Outbound access to the player-statistics API.
//!
//! - [`client`] issues single HTTP calls and reports status, body and
//!   rate-limit headers. It never retries.
//! - [`source`] turns those calls into one [`FetchOutcome`] per player for
//!   the refresh worker.

pub mod client;
pub mod source;

pub use client::{RateLimit, UpstreamClient, UpstreamConfig, UpstreamError, UpstreamResponse};
pub use source::{FetchOutcome, HypixelSource, PlayerSource};
