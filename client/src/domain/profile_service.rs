//! Profile page use-cases: view, rename and avatar upload.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::ports::{AvatarStorage, Notifier, ProfileRepository};
use super::{AuthSession, Error, Notification, ProfileRecord, User, UserId};

#[derive(Clone)]
pub struct ProfileService {
    session: Arc<AuthSession>,
    profiles: Arc<dyn ProfileRepository>,
    avatars: Arc<dyn AvatarStorage>,
    notifier: Arc<dyn Notifier>,
}

impl ProfileService {
    pub fn new(
        session: Arc<AuthSession>,
        profiles: Arc<dyn ProfileRepository>,
        avatars: Arc<dyn AvatarStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            profiles,
            avatars,
            notifier,
        }
    }

    /// Stored profile row of the signed-in user.
    pub async fn load(&self) -> Result<ProfileRecord, Error> {
        let user = self.session.require_user()?;
        self.profiles
            .fetch_by_id(user.id())
            .await?
            .ok_or_else(|| Error::not_found(format!("no profile for user {}", user.id())))
    }

    /// Change the display name and republish the session user.
    pub async fn rename(&self, full_name: &str) -> Result<User, Error> {
        let user = self.session.require_user()?;
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(Error::invalid_request("name must not be empty"));
        }

        let result = self.profiles.update_full_name(user.id(), full_name).await;
        self.finish(
            result.map_err(Error::from),
            "Profile updated",
            "Your profile has been updated successfully.",
            "Failed to update profile. Please try again.",
        )
        .await
    }

    /// Store a new avatar image and point the profile at it.
    ///
    /// Files land at `<user id>/<random uuid>.<extension>` in the avatar
    /// bucket.
    pub async fn upload_avatar(&self, file_name: &str, bytes: Vec<u8>) -> Result<User, Error> {
        let user = self.session.require_user()?;
        let extension = file_extension(file_name)
            .ok_or_else(|| Error::invalid_request("avatar file name needs an extension"))?;
        let path = avatar_path(user.id(), Uuid::new_v4(), &extension);

        let result = self
            .store_avatar(user.id(), &path, bytes, content_type(&extension))
            .await;
        self.finish(
            result,
            "Avatar updated",
            "Your avatar has been updated successfully.",
            "Failed to upload avatar. Please try again.",
        )
        .await
    }

    async fn store_avatar(
        &self,
        user: &UserId,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Error> {
        self.avatars.upload(path, bytes, content_type).await?;
        let url = self.avatars.public_url(path);
        info!(user_id = %user, path, "avatar uploaded");
        self.profiles.update_avatar_url(user, &url).await?;
        Ok(())
    }

    async fn finish(
        &self,
        result: Result<(), Error>,
        title: &str,
        success: &str,
        failure: &str,
    ) -> Result<User, Error> {
        if let Err(err) = result {
            warn!(error = %err, "profile edit failed");
            self.notifier.notify(Notification::destructive("Error", failure));
            return Err(err);
        }
        let user = self.session.refresh_profile().await?;
        self.notifier.notify(Notification::info(title, success));
        Ok(user)
    }
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish_non_exhaustive()
    }
}

fn file_extension(file_name: &str) -> Option<String> {
    let (stem, extension) = file_name.trim().rsplit_once('.')?;
    let well_formed = !extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric());
    if stem.is_empty() || !well_formed {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

fn avatar_path(user: &UserId, object: Uuid, extension: &str) -> String {
    format!("{user}/{object}.{extension}")
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
