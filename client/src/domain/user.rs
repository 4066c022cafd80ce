//! User data model.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
    InvalidEmail,
    UnknownRole { value: String },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must not contain surrounding whitespace"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::UnknownRole { value } => {
                write!(f, "role must be `user` or `salon_owner`, got `{value}`")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque, server-assigned user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised e-mail address.
///
/// ## Invariants
/// - Trimmed and lower-cased.
/// - Exactly one `@`, a non-empty local part and a dotted domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    ///
    /// # Examples
    /// ```
    /// use beautycut::domain::Email;
    ///
    /// let email = Email::new("  Ada@Example.com ").unwrap();
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalized = email.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&normalized) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalized))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Marketplace role attached to every profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Customer browsing and booking salons.
    #[default]
    User,
    /// Business operator who lists and administers a salon.
    SalonOwner,
}

impl Role {
    /// Wire representation stored in the `profiles.role` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::SalonOwner => "salon_owner",
        }
    }

    /// Label used in greetings and notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::SalonOwner => "Salon Owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "user" => Ok(Self::User),
            "salon_owner" => Ok(Self::SalonOwner),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Authenticated marketplace identity.
///
/// ## Invariants
/// - `id` is a non-empty server-assigned identifier.
/// - `email` is normalised; `name` may be empty when the profile has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    role: Role,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(id: UserId, name: impl Into<String>, email: Email, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            email,
            avatar: None,
            role,
        }
    }

    /// Attach an avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name; empty when the profile carries none.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Account e-mail address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Public avatar URL, if any.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Marketplace role.
    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" abc", UserValidationError::InvalidId)]
    fn user_id_rejects_invalid_values(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
    }

    #[rstest]
    fn user_id_accepts_opaque_values() {
        let id = UserId::new("auth0|abc-123").expect("opaque id");
        assert_eq!(id.as_ref(), "auth0|abc-123");
    }

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case("   ", UserValidationError::EmptyEmail)]
    #[case("ada", UserValidationError::InvalidEmail)]
    #[case("ada@example", UserValidationError::InvalidEmail)]
    #[case("a@b@example.com", UserValidationError::InvalidEmail)]
    #[case("ada lovelace@example.com", UserValidationError::InvalidEmail)]
    fn email_rejects_invalid_values(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Email::new(raw).expect_err("invalid email"), expected);
    }

    #[rstest]
    #[case("user", Role::User)]
    #[case("salon_owner", Role::SalonOwner)]
    #[case(" salon_owner ", Role::SalonOwner)]
    fn role_parses_wire_values(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>().expect("role"), expected);
    }

    #[rstest]
    fn role_rejects_unknown_values() {
        let err = "admin".parse::<Role>().expect_err("unknown role");
        assert_eq!(
            err,
            UserValidationError::UnknownRole {
                value: "admin".to_owned()
            }
        );
    }

    #[rstest]
    fn role_round_trips_through_serde() {
        let encoded = serde_json::to_string(&Role::SalonOwner).expect("encode");
        assert_eq!(encoded, "\"salon_owner\"");
    }

    #[rstest]
    fn user_serialises_in_camel_case_without_missing_avatar() {
        let user = User::new(
            UserId::new("u-1").expect("id"),
            "Ada",
            Email::new("ada@example.com").expect("email"),
            Role::User,
        );
        let value = serde_json::to_value(&user).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({
                "id": "u-1",
                "name": "Ada",
                "email": "ada@example.com",
                "role": "user"
            })
        );
    }
}
