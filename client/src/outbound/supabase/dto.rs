//! DTOs for the auth endpoints and partial row updates.
//!
//! Table rows decode straight into domain records; only the auth payloads,
//! whose shape differs between sign-in and sign-up, go through these types.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{AuthGrant, SignUpGrant};
use crate::domain::{AuthTokens, BookingStatus, Email, SignupMetadata, UserId};

#[derive(Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Serialize)]
pub(super) struct SignUpBodyDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: SignupMetadata,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthUserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenFieldsDto {
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
}

/// Body of a successful password grant.
#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    #[serde(flatten)]
    tokens: TokenFieldsDto,
    user: AuthUserDto,
}

/// Body of a sign-up call.
///
/// With e-mail confirmation enabled the service answers with the bare user
/// object; otherwise it returns a full session.
#[derive(Debug, Deserialize)]
pub(super) struct SignUpResponseDto {
    #[serde(flatten)]
    tokens: TokenFieldsDto,
    #[serde(default)]
    user: Option<AuthUserDto>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
pub(super) struct FullNamePatchDto<'a> {
    pub(super) full_name: &'a str,
    pub(super) updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub(super) struct AvatarPatchDto<'a> {
    pub(super) avatar_url: &'a str,
    pub(super) updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub(super) struct StatusPatchDto {
    pub(super) status: BookingStatus,
    pub(super) updated_at: DateTime<Utc>,
}

impl TokenFieldsDto {
    fn into_tokens(self, now: DateTime<Utc>) -> Option<AuthTokens> {
        let access_token = self.access_token.filter(|token| !token.is_empty())?;
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
            });
        Some(
            AuthTokens::new(access_token)
                .with_refresh_token(self.refresh_token)
                .with_expiry(expires_at),
        )
    }
}

fn identity(id: String, email: Option<String>, fallback: &Email) -> Result<(UserId, Email), String> {
    let user_id = UserId::new(id).map_err(|err| format!("auth user id: {err}"))?;
    let email = match email {
        Some(raw) => Email::new(raw).map_err(|err| format!("auth user email: {err}"))?,
        None => fallback.clone(),
    };
    Ok((user_id, email))
}

impl SessionDto {
    pub(super) fn into_grant(self, requested: &Email, now: DateTime<Utc>) -> Result<AuthGrant, String> {
        let (user_id, email) = identity(self.user.id, self.user.email, requested)?;
        let tokens = self
            .tokens
            .into_tokens(now)
            .ok_or_else(|| "session response carried no access token".to_owned())?;
        Ok(AuthGrant {
            user_id,
            email,
            tokens,
        })
    }
}

impl SignUpResponseDto {
    pub(super) fn into_grant(self, requested: &Email, now: DateTime<Utc>) -> Result<SignUpGrant, String> {
        let (id, email) = match self.user {
            Some(user) => (Some(user.id), user.email),
            None => (self.id, self.email),
        };
        let id = id.ok_or_else(|| "sign-up response carried no user id".to_owned())?;
        let (user_id, email) = identity(id, email, requested)?;
        Ok(SignUpGrant {
            user_id,
            email,
            tokens: self.tokens.into_tokens(now),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for auth payload decoding.

    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).single().expect("time")
    }

    #[fixture]
    fn requested() -> Email {
        Email::new("asha@example.com").expect("email")
    }

    #[rstest]
    fn session_prefers_absolute_expiry(now: DateTime<Utc>, requested: Email) {
        let body = r#"{
            "access_token": "jwt",
            "refresh_token": "r1",
            "expires_in": 3600,
            "expires_at": 1719828000,
            "user": { "id": "u-1", "email": "Asha@Example.com" }
        }"#;
        let dto: SessionDto = serde_json::from_str(body).expect("decode");

        let grant = dto.into_grant(&requested, now).expect("grant");

        assert_eq!(grant.user_id.as_ref(), "u-1");
        assert_eq!(grant.email, requested);
        assert_eq!(grant.tokens.refresh_token(), Some("r1"));
        assert_eq!(grant.tokens.expires_at(), DateTime::from_timestamp(1_719_828_000, 0));
    }

    #[rstest]
    fn session_falls_back_to_relative_expiry(now: DateTime<Utc>, requested: Email) {
        let body = r#"{"access_token":"jwt","expires_in":60,"user":{"id":"u-1"}}"#;
        let dto: SessionDto = serde_json::from_str(body).expect("decode");

        let grant = dto.into_grant(&requested, now).expect("grant");

        assert_eq!(grant.tokens.expires_at(), Some(now + TimeDelta::seconds(60)));
    }

    #[rstest]
    fn confirmation_signup_has_no_tokens(now: DateTime<Utc>, requested: Email) {
        let body = r#"{"id":"u-2","email":"asha@example.com","confirmation_sent_at":"2024-07-01T09:00:00Z"}"#;
        let dto: SignUpResponseDto = serde_json::from_str(body).expect("decode");

        let grant = dto.into_grant(&requested, now).expect("grant");

        assert_eq!(grant.user_id.as_ref(), "u-2");
        assert!(grant.tokens.is_none());
    }

    #[rstest]
    fn immediate_signup_carries_a_session(now: DateTime<Utc>, requested: Email) {
        let body = r#"{"access_token":"jwt","user":{"id":"u-3","email":"asha@example.com"}}"#;
        let dto: SignUpResponseDto = serde_json::from_str(body).expect("decode");

        let grant = dto.into_grant(&requested, now).expect("grant");

        assert_eq!(grant.tokens.map(|t| t.access_token().to_owned()).as_deref(), Some("jwt"));
    }

    #[rstest]
    fn signup_without_identity_is_an_error(now: DateTime<Utc>, requested: Email) {
        let dto: SignUpResponseDto = serde_json::from_str("{}").expect("decode");
        assert!(dto.into_grant(&requested, now).is_err());
    }
}
