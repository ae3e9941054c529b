//! hrdesk-core - client library for the hrdesk HR management backend.
//!
//! The crate is organised around two collaborating pieces:
//!
//! - [`auth::SessionManager`]: owns the bearer token and current user,
//!   persists them across restarts and drives login/restore/logout.
//! - [`api::ApiClient`]: the single gateway through which every backend
//!   request is issued, with credentials attached uniformly.
//!
//! Feature code (employees, leave, recruitment, ...) lives in [`hr`] and
//! only ever talks to the backend through a gateway handed out by the
//! session manager.

pub mod api;
pub mod auth;
pub mod config;
pub mod hr;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use auth::{AuthError, AuthState, RestoreOutcome, RestorePolicy, Session, SessionManager};
pub use config::Config;
pub use models::User;
