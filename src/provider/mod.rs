//! Provider module: the remote data API behind a permanent cache
//!
//! This module contains:
//! - URL construction for the three logical resources (account snapshot,
//!   per-character match history, full match report)
//! - The HTTP client, which consults the response cache before the network

mod client;
mod endpoints;

pub use client::{build_http_client, ProviderClient, API_KEY_HEADER};
pub use endpoints::{Endpoints, PROFILE_COMPONENTS};
