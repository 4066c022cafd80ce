//! Authentication primitives such as login credentials and sign-up requests.
//!
//! Keep raw form input parsing outside the session holder by exposing
//! constructors that validate string inputs before anything talks to a port.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{Email, Role, UserValidationError};

/// Minimum password length accepted by the hosted auth service.
pub const PASSWORD_MIN: usize = 6;

/// Domain error returned when login or sign-up values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
    /// Name was missing or blank once trimmed.
    EmptyName,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::EmptyName => write!(f, "name must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated login credentials used by the session holder.
///
/// ## Invariants
/// - `email` is a normalised [`Email`].
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use beautycut::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@example.com", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(CredentialsValidationError::Email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised e-mail address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    name: String,
    credentials: LoginCredentials,
    role: Role,
}

impl SignupRequest {
    /// Validate raw sign-up input.
    ///
    /// The name is trimmed; the password must be at least [`PASSWORD_MIN`]
    /// characters long.
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Self, CredentialsValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CredentialsValidationError::EmptyName);
        }
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        if password.chars().count() < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self {
            name: name.to_owned(),
            credentials,
            role,
        })
    }

    /// Trimmed display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Credentials used for the new account.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Requested role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Metadata attached to the auth identity at sign-up.
    pub fn metadata(&self) -> SignupMetadata {
        SignupMetadata {
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// User metadata stored alongside the auth identity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignupMetadata {
    /// Display name.
    pub name: String,
    /// Requested role.
    pub role: Role,
}
