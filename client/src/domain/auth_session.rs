//! Session and auth state holder.
//!
//! `AuthSession` is the single writer of the signed-in [`Session`]. Writers
//! are serialised by an async mutex held for the whole operation, so two
//! concurrent logins cannot interleave their backend calls. Readers never
//! touch the mutex: they observe [`AuthState`] through a `watch` channel and
//! always see either the old or the new state.
//!
//! Every successful login re-checks the stored profile role against the role
//! the user asked to sign in with. A mismatch signs the account out again.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::ports::{AuthGateway, Notifier, ProfileRepository};
use super::{
    AuthEvent, AuthState, AuthTokens, Error, LoginCredentials, Notification, ProfileRecord, Role, Session,
    SignupOutcome, SignupRequest, SignupThrottle, User, UserId, map_profile_to_user,
};

/// Owned, explicit session object shared by the inbound adapters.
pub struct AuthSession {
    auth: Arc<dyn AuthGateway>,
    profiles: Arc<dyn ProfileRepository>,
    notifier: Arc<dyn Notifier>,
    throttle: SignupThrottle,
    session: Mutex<Option<Session>>,
    state: watch::Sender<AuthState>,
}

impl AuthSession {
    /// Create an anonymous session holder.
    pub fn new(
        auth: Arc<dyn AuthGateway>,
        profiles: Arc<dyn ProfileRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        signup_cooldown: Duration,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self {
            auth,
            profiles,
            notifier,
            throttle: SignupThrottle::new(clock, signup_cooldown),
            session: Mutex::new(None),
            state,
        }
    }

    /// Receive every published [`AuthState`], starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Snapshot of the published state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// The signed-in user, or `Unauthorized`.
    pub fn require_user(&self) -> Result<User, Error> {
        self.current_user()
            .ok_or_else(|| Error::unauthorized("please log in to continue"))
    }

    /// The signed-in user when they hold `role`; `Forbidden` otherwise.
    pub fn require_role(&self, role: Role) -> Result<User, Error> {
        let user = self.require_user()?;
        if user.role() != role {
            return Err(Error::forbidden(format!(
                "this action is only available to {} accounts",
                role.label()
            )));
        }
        Ok(user)
    }

    /// Bearer token of the current session, if any.
    pub async fn access_token(&self) -> Option<Zeroizing<String>> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| Zeroizing::new(session.tokens.access_token().to_owned()))
    }

    /// Sign in with a password and verify the stored role matches `role`.
    ///
    /// A rejected or unreachable auth service leaves the current state
    /// untouched. Once the auth call succeeds the previous session, if any,
    /// is revoked, and any later failure signs the fresh session out again
    /// and publishes [`AuthState::Anonymous`].
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<User, Error> {
        let credentials = LoginCredentials::try_from_parts(email, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let mut session = self.session.lock().await;
        let grant = match self.auth.sign_in_with_password(&credentials).await {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, "password sign-in failed");
                self.notify_failure("Login failed", "Please check your credentials and try again");
                return Err(err.into());
            }
        };
        self.replace_previous(&mut session, Some(&grant.tokens)).await;

        let user = match self.load_user(&grant.user_id, grant.email.as_ref()).await {
            Ok(user) => user,
            Err(err) => {
                warn!(user_id = %grant.user_id, error = %err, "profile unavailable after sign-in");
                self.revoke(grant.tokens.access_token()).await;
                self.clear(&mut session);
                self.notify_failure(
                    "Login failed",
                    "We could not load your profile. Please try again later.",
                );
                return Err(err);
            }
        };

        if user.role() != role {
            info!(user_id = %user.id(), requested = %role, stored = %user.role(), "role mismatch at login");
            self.revoke(grant.tokens.access_token()).await;
            self.clear(&mut session);
            let message = format!(
                "This account is registered as a {}. Please log in with the correct role.",
                user.role().label()
            );
            self.notify_failure("Login failed", message.as_str());
            return Err(Error::role_mismatch(message));
        }

        self.install(
            &mut session,
            Session {
                user: user.clone(),
                tokens: grant.tokens,
            },
        );
        info!(user_id = %user.id(), role = %user.role(), "signed in");
        self.notifier.notify(Notification::info(
            "Login successful",
            format!("Welcome back, {}!", display_name(&user)),
        ));
        Ok(user)
    }

    /// Create an account and its profile row.
    ///
    /// At most one attempt is sent per cooldown window. When the backend
    /// issues a live session the new user is signed in immediately;
    /// otherwise the state stays anonymous until the e-mail is confirmed.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<SignupOutcome, Error> {
        let request = SignupRequest::try_from_parts(name, email, password, role)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        if let Err(wait) = self.throttle.check_and_record() {
            let secs = wait.as_secs().max(1);
            debug!(wait_secs = secs, "signup throttled");
            self.notify_failure(
                "Please wait",
                format!("You can try signing up again in {secs} seconds.").as_str(),
            );
            return Err(Error::rate_limited(
                "signup attempted too soon after the previous attempt",
                wait,
            ));
        }

        let mut session = self.session.lock().await;
        let grant = match self.auth.sign_up(&request).await {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, "signup failed");
                self.notify_failure("Sign up failed", "Please try again");
                return Err(err.into());
            }
        };
        self.replace_previous(&mut session, grant.tokens.as_ref()).await;

        let profile =
            ProfileRecord::for_new_account(&grant.user_id, request.name(), &grant.email, request.role());
        if let Err(err) = self.profiles.upsert(&profile).await {
            warn!(user_id = %grant.user_id, error = %err, "profile upsert failed after signup");
            if let Some(tokens) = grant.tokens.as_ref() {
                self.revoke(tokens.access_token()).await;
            }
            self.clear(&mut session);
            self.notify_failure(
                "Sign up failed",
                "Your account was created but your profile could not be saved. Please try again.",
            );
            return Err(err.into());
        }

        let Some(tokens) = grant.tokens else {
            info!(user_id = %grant.user_id, "signup awaiting e-mail confirmation");
            self.clear(&mut session);
            self.notifier.notify(Notification::info(
                "Check your email",
                "Confirm your e-mail address, then log in.",
            ));
            return Ok(SignupOutcome::ConfirmationRequired);
        };

        let user = match map_profile_to_user(&profile, grant.email.as_ref()) {
            Ok(user) => user,
            Err(err) => {
                self.revoke(tokens.access_token()).await;
                self.clear(&mut session);
                return Err(Error::internal(format!("new profile could not be mapped: {err}")));
            }
        };
        self.install(
            &mut session,
            Session {
                user: user.clone(),
                tokens,
            },
        );
        info!(user_id = %user.id(), role = %user.role(), "signed up and signed in");
        self.notifier.notify(Notification::info(
            "Sign up successful",
            format!("Welcome to BeautyCut, {}!", user.role().label()),
        ));
        Ok(SignupOutcome::SignedIn(user))
    }

    /// Clear the local session, then revoke it remotely on a best-effort
    /// basis. Always ends anonymous.
    pub async fn logout(&self) {
        let previous = {
            let mut session = self.session.lock().await;
            let previous = session.take();
            self.clear(&mut session);
            previous
        };

        if let Some(previous) = previous {
            if let Err(err) = self.auth.sign_out(previous.tokens.access_token()).await {
                warn!(error = %err, "remote sign-out failed; local session already cleared");
            }
            info!(user_id = %previous.user.id(), "signed out");
        }
        self.notifier
            .notify(Notification::info("Logged out", "Come back soon!"));
    }

    /// Apply a change pushed by the auth backend.
    pub async fn handle_auth_event(&self, event: AuthEvent) -> Result<(), Error> {
        let mut session = self.session.lock().await;
        match event {
            AuthEvent::SignedOut => {
                if session.is_some() {
                    info!("backend reported sign-out");
                }
                self.clear(&mut session);
                Ok(())
            }
            AuthEvent::TokenExpired => {
                if session.is_some() {
                    info!("access token expired");
                    self.notify_failure("Session expired", "Please log in again.");
                }
                self.clear(&mut session);
                Ok(())
            }
            AuthEvent::TokenRefreshed(tokens) => {
                match session.as_mut() {
                    Some(current) => {
                        self.adopt(Some(&tokens));
                        current.tokens = tokens;
                    }
                    None => debug!("token refresh ignored while anonymous"),
                }
                Ok(())
            }
            AuthEvent::UserUpdated(profile) => self.apply_profile(&mut session, &profile).await,
        }
    }

    /// Re-read the signed-in user's profile and republish it.
    pub async fn refresh_profile(&self) -> Result<User, Error> {
        let mut session = self.session.lock().await;
        let id = match session.as_ref() {
            Some(current) => current.user.id().clone(),
            None => return Err(Error::unauthorized("please log in to continue")),
        };
        let profile = self
            .profiles
            .fetch_by_id(&id)
            .await?
            .ok_or_else(|| Error::profile_unavailable(format!("no profile row for user {id}")))?;
        self.apply_profile(&mut session, &profile).await?;
        session
            .as_ref()
            .map(|current| current.user.clone())
            .ok_or_else(|| Error::unauthorized("session ended while refreshing the profile"))
    }

    async fn apply_profile(
        &self,
        session: &mut MutexGuard<'_, Option<Session>>,
        profile: &ProfileRecord,
    ) -> Result<(), Error> {
        let Some(current) = session.as_ref() else {
            debug!("profile update ignored while anonymous");
            return Ok(());
        };
        if profile.id != current.user.id().as_ref() {
            warn!("profile update for another user ignored");
            return Ok(());
        }

        let updated = match map_profile_to_user(profile, current.user.email().as_ref()) {
            Ok(user) => user,
            Err(err) => {
                let token = current.tokens.access_token().to_owned();
                warn!(error = %err, "updated profile could not be mapped");
                self.revoke(&token).await;
                self.clear(session);
                return Err(Error::profile_unavailable(err.to_string()));
            }
        };
        if updated.role() != current.user.role() {
            let token = current.tokens.access_token().to_owned();
            info!(user_id = %updated.id(), stored = %updated.role(), "role changed; signing out");
            self.revoke(&token).await;
            self.clear(session);
            self.notify_failure("Signed out", "Your account role changed. Please log in again.");
            return Err(Error::role_mismatch(format!(
                "account role is now {}",
                updated.role().label()
            )));
        }

        if let Some(current) = session.as_mut() {
            current.user = updated.clone();
        }
        self.publish(AuthState::Authenticated(updated));
        Ok(())
    }

    async fn load_user(&self, id: &UserId, email: &str) -> Result<User, Error> {
        let profile = match self.profiles.fetch_by_id(id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return Err(Error::profile_unavailable(format!("no profile row for user {id}")));
            }
            Err(err) => return Err(Error::profile_unavailable(err.to_string())),
        };
        map_profile_to_user(&profile, email).map_err(|err| Error::profile_unavailable(err.to_string()))
    }

    async fn revoke(&self, access_token: &str) {
        if let Err(err) = self.auth.sign_out(access_token).await {
            warn!(error = %err, "best-effort sign-out failed");
        }
    }

    /// Drop whatever session `slot` holds and hand the adapters the token
    /// of the grant that replaces it. The dropped session is revoked.
    async fn replace_previous(&self, slot: &mut Option<Session>, incoming: Option<&AuthTokens>) {
        let previous = slot.take();
        self.adopt(incoming);
        if let Some(previous) = previous {
            debug!(user_id = %previous.user.id(), "revoking replaced session");
            self.revoke(previous.tokens.access_token()).await;
        }
    }

    fn install(&self, slot: &mut Option<Session>, session: Session) {
        self.adopt(Some(&session.tokens));
        let user = session.user.clone();
        *slot = Some(session);
        self.publish(AuthState::Authenticated(user));
    }

    fn clear(&self, slot: &mut Option<Session>) {
        *slot = None;
        self.adopt(None);
        self.publish(AuthState::Anonymous);
    }

    fn adopt(&self, tokens: Option<&AuthTokens>) {
        self.auth
            .adopt_access_token(tokens.map(|tokens| Zeroizing::new(tokens.access_token().to_owned())));
    }

    fn publish(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    fn notify_failure(&self, title: &str, description: &str) {
        self.notifier
            .notify(Notification::destructive(title, description));
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

fn display_name(user: &User) -> &str {
    if user.name().is_empty() {
        user.role().label()
    } else {
        user.name()
    }
}

#[cfg(test)]
#[path = "auth_session_tests.rs"]
mod tests;
