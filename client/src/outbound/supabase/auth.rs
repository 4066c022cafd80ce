//! Password auth against the hosted identity service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::Method;
use tracing::debug;
use zeroize::Zeroizing;

use super::connection::SupabaseConnection;
use super::dto::{PasswordGrantDto, SessionDto, SignUpBodyDto, SignUpResponseDto};
use super::http::{FailureKind, HttpFailure, decode, execute};
use crate::domain::ports::{AuthGateway, AuthGatewayError, AuthGrant, SignUpGrant};
use crate::domain::{LoginCredentials, SignupRequest};

/// `AuthGateway` backed by the `/auth/v1` endpoints.
///
/// The auth state holder hands every token change to
/// [`AuthGateway::adopt_access_token`], which stores it on the shared
/// connection so the table adapters act as the signed-in user.
#[derive(Clone)]
pub struct SupabaseAuthGateway {
    connection: SupabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SupabaseAuthGateway {
    pub fn new(connection: SupabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { connection, clock }
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, AuthGatewayError> {
        self.connection.url(path).map_err(AuthGatewayError::unexpected)
    }
}

impl From<HttpFailure> for AuthGatewayError {
    fn from(failure: HttpFailure) -> Self {
        let kind = failure.kind();
        let message = failure.into_message();
        match kind {
            FailureKind::Unavailable => Self::connection(message),
            FailureKind::RateLimited => Self::rate_limited(message),
            FailureKind::Rejected | FailureKind::Query => Self::rejected(message),
        }
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuthGateway {
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthGrant, AuthGatewayError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let body = PasswordGrantDto {
            email: credentials.email().as_ref(),
            password: credentials.password(),
        };
        let bytes = execute(self.connection.request(Method::POST, url).json(&body)).await?;
        let session: SessionDto = decode(&bytes, "session").map_err(AuthGatewayError::unexpected)?;
        let grant = session
            .into_grant(credentials.email(), self.clock.utc())
            .map_err(AuthGatewayError::unexpected)?;
        debug!(user_id = %grant.user_id, "password sign-in accepted");
        Ok(grant)
    }

    async fn sign_up(&self, request: &SignupRequest) -> Result<SignUpGrant, AuthGatewayError> {
        let url = self.endpoint("auth/v1/signup")?;
        let credentials = request.credentials();
        let body = SignUpBodyDto {
            email: credentials.email().as_ref(),
            password: credentials.password(),
            data: request.metadata(),
        };
        let bytes = execute(self.connection.request(Method::POST, url).json(&body)).await?;
        let response: SignUpResponseDto =
            decode(&bytes, "sign-up").map_err(AuthGatewayError::unexpected)?;
        let grant = response
            .into_grant(credentials.email(), self.clock.utc())
            .map_err(AuthGatewayError::unexpected)?;
        debug!(
            user_id = %grant.user_id,
            confirmed = grant.tokens.is_some(),
            "sign-up accepted"
        );
        Ok(grant)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthGatewayError> {
        let url = self.endpoint("auth/v1/logout")?;
        execute(self.connection.request_as(Method::POST, url, access_token)).await?;
        Ok(())
    }

    fn adopt_access_token(&self, access_token: Option<Zeroizing<String>>) {
        self.connection
            .set_access_token(access_token.as_deref().map(String::as_str));
    }
}

impl std::fmt::Debug for SupabaseAuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuthGateway")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
