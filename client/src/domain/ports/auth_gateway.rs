//! Port for the hosted authentication service.
//!
//! Adapters talk to the identity provider; the auth state holder drives them
//! and owns whatever session they hand back.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{
    AuthTokens, Email, Error, ErrorCode, LoginCredentials, SignupRequest, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by authentication adapters.
    pub enum AuthGatewayError {
        /// Credentials or signup details were refused.
        Rejected { message: String } => "authentication rejected: {message}",
        /// The auth service asked the client to slow down.
        RateLimited { message: String } => "authentication rate limited: {message}",
        /// The service could not be reached or timed out.
        Connection { message: String } => "authentication service unavailable: {message}",
        /// The service answered with something the adapter could not read.
        Unexpected { message: String } => "unexpected authentication response: {message}",
    }
}

/// Identity and tokens returned by a password sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub user_id: UserId,
    pub email: Email,
    pub tokens: AuthTokens,
}

/// Account created by a signup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpGrant {
    pub user_id: UserId,
    pub email: Email,
    /// `None` when the account must confirm its e-mail address first.
    pub tokens: Option<AuthTokens>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange an e-mail and password for a session.
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthGrant, AuthGatewayError>;

    /// Register a new account carrying the name and role as metadata.
    async fn sign_up(&self, request: &SignupRequest) -> Result<SignUpGrant, AuthGatewayError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthGatewayError>;

    /// Act as the holder of `access_token` on later backend calls, or as
    /// the anonymous client when `None`.
    ///
    /// The auth state holder calls this on every token change.
    fn adopt_access_token(&self, access_token: Option<Zeroizing<String>>);
}

/// Fixture gateway with no registered accounts.
///
/// Sign-in is always refused; signup creates an account that still needs
/// e-mail confirmation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthGateway;

#[async_trait]
impl AuthGateway for FixtureAuthGateway {
    async fn sign_in_with_password(
        &self,
        _credentials: &LoginCredentials,
    ) -> Result<AuthGrant, AuthGatewayError> {
        Err(AuthGatewayError::rejected("Invalid login credentials"))
    }

    async fn sign_up(&self, request: &SignupRequest) -> Result<SignUpGrant, AuthGatewayError> {
        let email = request.credentials().email().clone();
        let user_id = UserId::new(format!("fixture-{email}"))
            .map_err(|err| AuthGatewayError::unexpected(err.to_string()))?;
        Ok(SignUpGrant {
            user_id,
            email,
            tokens: None,
        })
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthGatewayError> {
        Ok(())
    }

    fn adopt_access_token(&self, _access_token: Option<Zeroizing<String>>) {}
}

impl From<AuthGatewayError> for Error {
    fn from(err: AuthGatewayError) -> Self {
        match err {
            AuthGatewayError::Rejected { message } => Self::unauthorized(message),
            AuthGatewayError::RateLimited { message } => Self::new(ErrorCode::RateLimited, message),
            AuthGatewayError::Connection { message } => Self::service_unavailable(message),
            AuthGatewayError::Unexpected { message } => Self::internal(message),
        }
    }
}
