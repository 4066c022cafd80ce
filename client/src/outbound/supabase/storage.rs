//! Avatar uploads to object storage.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use super::connection::SupabaseConnection;
use super::http::{FailureKind, HttpFailure, execute};
use crate::domain::ports::{AvatarStorage, AvatarStorageError};

/// `AvatarStorage` backed by one public storage bucket.
#[derive(Clone)]
pub struct SupabaseAvatarStorage {
    connection: SupabaseConnection,
    bucket: String,
}

impl SupabaseAvatarStorage {
    pub fn new(connection: SupabaseConnection, bucket: impl Into<String>) -> Self {
        Self {
            connection,
            bucket: bucket.into(),
        }
    }
}

impl From<HttpFailure> for AvatarStorageError {
    fn from(failure: HttpFailure) -> Self {
        let kind = failure.kind();
        let message = failure.into_message();
        match kind {
            FailureKind::Unavailable | FailureKind::RateLimited => Self::connection(message),
            FailureKind::Rejected | FailureKind::Query => Self::rejected(message),
        }
    }
}

#[async_trait]
impl AvatarStorage for SupabaseAvatarStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AvatarStorageError> {
        let url = self
            .connection
            .url(&format!("storage/v1/object/{}/{path}", self.bucket))
            .map_err(AvatarStorageError::rejected)?;
        let request = self
            .connection
            .request(Method::POST, url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        execute(request).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}storage/v1/object/public/{}/{path}",
            self.connection.base_url(),
            self.bucket
        )
    }
}

impl std::fmt::Debug for SupabaseAvatarStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAvatarStorage")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}
