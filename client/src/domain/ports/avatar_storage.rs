//! Port for the public avatar bucket.

use async_trait::async_trait;

use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Errors raised by avatar storage adapters.
    pub enum AvatarStorageError {
        /// Storage could not be reached.
        Connection { message: String } => "avatar storage unavailable: {message}",
        /// Upload refused, for example a duplicate object or a size limit.
        Rejected { message: String } => "avatar upload rejected: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// Store `bytes` at `path` inside the avatar bucket.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AvatarStorageError>;

    /// Publicly readable URL of the object at `path`.
    fn public_url(&self, path: &str) -> String;
}

/// Fixture storage that discards uploads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAvatarStorage;

#[async_trait]
impl AvatarStorage for FixtureAvatarStorage {
    async fn upload(&self, _path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), AvatarStorageError> {
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.invalid/avatars/{path}")
    }
}

impl From<AvatarStorageError> for Error {
    fn from(err: AvatarStorageError) -> Self {
        match err {
            AvatarStorageError::Connection { message } => Self::service_unavailable(message),
            AvatarStorageError::Rejected { message } => Self::invalid_request(message),
        }
    }
}
