//! Shared HTTP client, project endpoint and bearer token.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::BackendEndpoint;

/// Handle cloned into every backend adapter.
///
/// Requests carry the anon key as `apikey`. The bearer token is the signed-in
/// user's access token when the auth adapter has stored one, and the anon key
/// otherwise, so row-level policies see the right caller.
#[derive(Clone)]
pub struct SupabaseConnection {
    client: Client,
    base_url: Url,
    anon_key: Arc<str>,
    access_token: Arc<RwLock<Option<Zeroizing<String>>>>,
}

impl SupabaseConnection {
    /// Build a connection using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: BackendEndpoint, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let mut base_url = endpoint.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            anon_key: Arc::from(endpoint.anon_key),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` (without a leading slash) against the project URL.
    pub(super) fn url(&self, path: &str) -> Result<Url, String> {
        self.base_url
            .join(path)
            .map_err(|err| format!("invalid backend path {path}: {err}"))
    }

    /// Request with the project key and the current bearer token.
    pub(super) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, path = url.path(), "backend request");
        let bearer = self.bearer();
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_ref())
            .bearer_auth(bearer.as_str())
    }

    /// Request authorised by an explicit access token.
    pub(super) fn request_as(&self, method: Method, url: Url, access_token: &str) -> RequestBuilder {
        debug!(%method, path = url.path(), "backend request");
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_ref())
            .bearer_auth(access_token)
    }

    pub(super) fn set_access_token(&self, token: Option<&str>) {
        let mut slot = self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = token.map(|token| Zeroizing::new(token.to_owned()));
    }

    pub(super) fn bearer(&self) -> Zeroizing<String> {
        let slot = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        slot.clone()
            .unwrap_or_else(|| Zeroizing::new(self.anon_key.as_ref().to_owned()))
    }

    #[cfg(test)]
    pub(super) fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for SupabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConnection")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
