//! REST API gateway for the hrdesk backend.
//!
//! This module provides the `ApiClient`, the only component that builds
//! outbound HTTP requests. Every request carries a JSON content type and,
//! when the session holds one, a bearer token.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use error::{ApiError, NETWORK_ERROR_MESSAGE};
