//! Stored profile rows and their mapping onto [`User`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::{Email, Role, User, UserId, UserValidationError};

const AVATAR_SEED_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// Row of the `profiles` table as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// Build the row written when a new account signs up.
    pub fn for_new_account(id: &UserId, name: &str, email: &Email, role: Role) -> Self {
        Self {
            id: id.to_string(),
            full_name: Some(name.to_owned()),
            email: Some(email.to_string()),
            avatar_url: Some(default_avatar_url(email.as_ref())),
            phone_number: None,
            role: Some(role.as_str().to_owned()),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Errors raised when a stored profile cannot be mapped onto a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileMappingError {
    /// Profile id was empty or malformed.
    #[error("profile id is invalid: {0}")]
    Id(UserValidationError),
    /// Email passed alongside the profile was invalid.
    #[error("profile email is invalid: {0}")]
    Email(UserValidationError),
    /// Stored role is not a known role.
    #[error("profile role is invalid: {0}")]
    Role(UserValidationError),
}

/// Translate a stored profile into the in-memory identity.
///
/// Missing name, role and avatar fall back to an empty name, [`Role::User`]
/// and no avatar. The `email` argument is the address the identity signed in
/// with and takes precedence over the stored copy.
///
/// # Examples
/// ```
/// use beautycut::domain::{ProfileRecord, Role, map_profile_to_user};
///
/// let record = ProfileRecord { id: "u-1".into(), ..ProfileRecord::default() };
/// let user = map_profile_to_user(&record, "ada@example.com").unwrap();
/// assert_eq!(user.role(), Role::User);
/// assert_eq!(user.name(), "");
/// ```
pub fn map_profile_to_user(profile: &ProfileRecord, email: &str) -> Result<User, ProfileMappingError> {
    let id = UserId::new(&profile.id).map_err(ProfileMappingError::Id)?;
    let email = Email::new(email).map_err(ProfileMappingError::Email)?;
    let role = match profile.role.as_deref() {
        None | Some("") => Role::default(),
        Some(raw) => raw.parse().map_err(ProfileMappingError::Role)?,
    };
    let name = profile.full_name.clone().unwrap_or_default();
    let avatar = profile.avatar_url.clone().filter(|url| !url.trim().is_empty());

    Ok(User::new(id, name, email, role).with_avatar(avatar))
}

/// Generated avatar used until the user uploads their own.
pub fn default_avatar_url(seed: &str) -> String {
    format!("{AVATAR_SEED_BASE}{seed}")
}
