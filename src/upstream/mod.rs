//! Access to the parent accounting service.
//!
//! - [`routes`]: per-operation adapter table (paths, identifier casings, flags)
//! - [`client`]: timed HTTP client with header propagation

pub mod client;
pub mod routes;

pub use client::{ForwardedHeaders, RawResponse, UpstreamClient, UpstreamError, UpstreamRequest};
pub use routes::{Operation, Route, route};
