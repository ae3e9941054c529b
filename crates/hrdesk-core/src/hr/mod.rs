//! HR feature client.
//!
//! Typed wrappers over the backend's resource endpoints. Every request goes
//! through the `ApiClient` handed out by the session manager, so credentials
//! are attached in one place and failures arrive as `ApiError`.

pub mod client;
pub mod dashboard;

pub use client::HrClient;
pub use dashboard::DashboardSummary;
