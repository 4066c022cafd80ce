//! Port for the `profiles` table.

use async_trait::async_trait;

use crate::domain::{Error, ProfileRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
        /// The backend refused the request, typically a row-level policy.
        Rejected { message: String } => "profile repository rejected request: {message}",
        /// An update matched no row visible to the caller.
        NotFound { id: String } => "profile {id} not found",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile row for `id`; `Ok(None)` when no row exists.
    async fn fetch_by_id(&self, id: &UserId) -> Result<Option<ProfileRecord>, ProfileRepositoryError>;

    /// Insert the row, or merge it into an existing row with the same id.
    async fn upsert(&self, profile: &ProfileRecord) -> Result<(), ProfileRepositoryError>;

    /// Set the display name; `NotFound` when no row was changed.
    async fn update_full_name(&self, id: &UserId, full_name: &str) -> Result<(), ProfileRepositoryError>;

    /// Set the avatar URL; `NotFound` when no row was changed.
    async fn update_avatar_url(&self, id: &UserId, avatar_url: &str) -> Result<(), ProfileRepositoryError>;
}

/// Fixture repository that stores nothing and never finds a profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileRepository;

#[async_trait]
impl ProfileRepository for FixtureProfileRepository {
    async fn fetch_by_id(&self, _id: &UserId) -> Result<Option<ProfileRecord>, ProfileRepositoryError> {
        Ok(None)
    }

    async fn upsert(&self, _profile: &ProfileRecord) -> Result<(), ProfileRepositoryError> {
        Ok(())
    }

    async fn update_full_name(&self, id: &UserId, _full_name: &str) -> Result<(), ProfileRepositoryError> {
        Err(ProfileRepositoryError::not_found(id.to_string()))
    }

    async fn update_avatar_url(&self, id: &UserId, _avatar_url: &str) -> Result<(), ProfileRepositoryError> {
        Err(ProfileRepositoryError::not_found(id.to_string()))
    }
}

impl From<ProfileRepositoryError> for Error {
    fn from(err: ProfileRepositoryError) -> Self {
        match err {
            ProfileRepositoryError::Connection { message } => Self::service_unavailable(message),
            ProfileRepositoryError::Query { message } => Self::internal(message),
            ProfileRepositoryError::Rejected { message } => Self::forbidden(message),
            ProfileRepositoryError::NotFound { id } => Self::not_found(format!("profile {id} not found")),
        }
    }
}
