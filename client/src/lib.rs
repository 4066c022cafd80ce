//! BeautyCut client core.
//!
//! The crate holds everything the marketplace front end needs besides
//! rendering: the authenticated session, domain types and validation, the
//! services behind each page, and outbound adapters for the hosted backend.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::BackendSettings;
pub use domain::{AuthSession, AuthState, Error, ErrorCode, Role, User};
