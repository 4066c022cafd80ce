//! Backend settings loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_AVATAR_BUCKET: &str = "avatars";

/// Connection and behaviour settings for the hosted backend.
///
/// Values come from `BEAUTYCUT_*` environment variables or a config file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BEAUTYCUT")]
pub struct BackendSettings {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: Option<String>,
    /// Public anonymous API key sent with every request.
    pub anon_key: Option<String>,
    /// Per-request HTTP timeout.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
    /// Minimum gap between two sign-up attempts.
    #[ortho_config(default = 40)]
    pub signup_cooldown_secs: u64,
    /// Number of salons shown on the landing page.
    #[ortho_config(default = 6)]
    pub featured_limit: usize,
    /// Storage bucket holding profile pictures.
    pub avatar_bucket: Option<String>,
}

/// Settings that cannot be turned into a backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("BEAUTYCUT_URL is not set")]
    MissingUrl,
    #[error("BEAUTYCUT_URL is not a valid URL: {message}")]
    InvalidUrl { message: String },
    #[error("BEAUTYCUT_ANON_KEY is not set")]
    MissingAnonKey,
}

/// Validated address and key of the backend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub base_url: Url,
    pub anon_key: String,
}

impl BackendSettings {
    /// Resolve the project URL and anon key.
    pub fn endpoint(&self) -> Result<BackendEndpoint, SettingsError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingUrl)?;
        let base_url = Url::parse(raw).map_err(|err| SettingsError::InvalidUrl {
            message: err.to_string(),
        })?;
        let anon_key = self
            .anon_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingAnonKey)?;
        Ok(BackendEndpoint {
            base_url,
            anon_key: anon_key.to_owned(),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn signup_cooldown(&self) -> Duration {
        Duration::from_secs(self.signup_cooldown_secs)
    }

    /// Return the configured avatar bucket, falling back to `avatars`.
    pub fn avatar_bucket(&self) -> &str {
        self.avatar_bucket
            .as_deref()
            .filter(|bucket| !bucket.trim().is_empty())
            .unwrap_or(DEFAULT_AVATAR_BUCKET)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for backend settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "BEAUTYCUT_URL",
        "BEAUTYCUT_ANON_KEY",
        "BEAUTYCUT_REQUEST_TIMEOUT_SECS",
        "BEAUTYCUT_SIGNUP_COOLDOWN_SECS",
        "BEAUTYCUT_FEATURED_LIMIT",
        "BEAUTYCUT_AVATAR_BUCKET",
    ];

    fn load_from_empty_args() -> BackendSettings {
        BackendSettings::load_from_iter([OsString::from("beautycut")])
            .expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.signup_cooldown(), Duration::from_secs(40));
        assert_eq!(settings.featured_limit, 6);
        assert_eq!(settings.avatar_bucket(), "avatars");
        assert_eq!(settings.endpoint(), Err(SettingsError::MissingUrl));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.extend([
            ("BEAUTYCUT_URL", Some("https://project.example.co".to_owned())),
            ("BEAUTYCUT_ANON_KEY", Some("anon-123".to_owned())),
            ("BEAUTYCUT_SIGNUP_COOLDOWN_SECS", Some("5".to_owned())),
            ("BEAUTYCUT_AVATAR_BUCKET", Some("faces".to_owned())),
        ]);
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        let endpoint = settings.endpoint().expect("endpoint");
        assert_eq!(endpoint.base_url.as_str(), "https://project.example.co/");
        assert_eq!(endpoint.anon_key, "anon-123");
        assert_eq!(settings.signup_cooldown(), Duration::from_secs(5));
        assert_eq!(settings.avatar_bucket(), "faces");
    }

    #[rstest]
    #[case::missing_key(Some("https://project.example.co"), None, SettingsError::MissingAnonKey)]
    #[case::blank_url(Some("  "), Some("k"), SettingsError::MissingUrl)]
    fn endpoint_reports_missing_values(
        #[case] url: Option<&str>,
        #[case] key: Option<&str>,
        #[case] expected: SettingsError,
    ) {
        let settings = BackendSettings {
            url: url.map(str::to_owned),
            anon_key: key.map(str::to_owned),
            request_timeout_secs: 10,
            signup_cooldown_secs: 40,
            featured_limit: 6,
            avatar_bucket: None,
        };
        assert_eq!(settings.endpoint(), Err(expected));
    }

    #[rstest]
    fn endpoint_rejects_relative_urls() {
        let settings = BackendSettings {
            url: Some("not a url".to_owned()),
            anon_key: Some("k".to_owned()),
            request_timeout_secs: 10,
            signup_cooldown_secs: 40,
            featured_limit: 6,
            avatar_bucket: None,
        };
        assert!(matches!(
            settings.endpoint(),
            Err(SettingsError::InvalidUrl { .. })
        ));
    }
}
