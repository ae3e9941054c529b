//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionManager`: the login/restore/logout state machine
//! - `Session`: the bearer token and the user it identifies
//! - `store`: persistence backends for the session pair (file, keychain, memory)
//!
//! The token and user snapshot are persisted together so a restart can
//! resume the session after re-validating the token with the backend.

pub mod credentials;
pub mod error;
pub mod session;
pub mod store;

pub use credentials::Credentials;
pub use error::AuthError;
pub use session::{AuthState, RestoreOutcome, RestorePolicy, Session, SessionManager};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError};
