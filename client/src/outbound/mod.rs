//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **supabase**: reqwest-backed auth, table and storage adapters for the
//!   hosted backend
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod supabase;
