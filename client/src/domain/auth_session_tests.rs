//! Tests for the session and auth state holder.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    AuthGatewayError, AuthGrant, MockAuthGateway, MockProfileRepository, ProfileRepositoryError,
    SignUpGrant,
};
use crate::domain::{AuthTokens, Email, ErrorCode, NotificationVariant};
use crate::test_support::{InMemoryBackend, MutableClock, RecordingNotifier};

struct Harness {
    backend: Arc<InMemoryBackend>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<MutableClock>,
    session: AuthSession,
}

#[fixture]
fn harness() -> Harness {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).single().expect("time"),
    ));
    let session = AuthSession::new(
        backend.clone(),
        backend.clone(),
        notifier.clone(),
        clock.clone(),
        Duration::from_secs(40),
    );
    Harness {
        backend,
        notifier,
        clock,
        session,
    }
}

fn session_with(auth: MockAuthGateway, profiles: MockProfileRepository) -> (AuthSession, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let session = AuthSession::new(
        Arc::new(auth),
        Arc::new(profiles),
        notifier.clone(),
        Arc::new(MutableClock::default()),
        Duration::from_secs(40),
    );
    (session, notifier)
}

#[rstest]
#[tokio::test]
async fn login_publishes_authenticated_user(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    let mut updates = harness.session.subscribe();

    let user = harness
        .session
        .login("Asha@Example.com", "secret1", Role::User)
        .await
        .expect("login succeeds");

    assert_eq!(user.email().as_ref(), "asha@example.com");
    assert_eq!(user.name(), "Asha");
    assert!(updates.has_changed().expect("sender alive"));
    assert_eq!(*updates.borrow_and_update(), AuthState::Authenticated(user.clone()));
    assert_eq!(harness.session.current_user(), Some(user));
    assert!(harness.session.access_token().await.is_some());
    assert_eq!(harness.notifier.titles(), ["Login successful"]);
}

#[rstest]
#[tokio::test]
async fn role_mismatch_signs_out_and_stays_anonymous(harness: Harness) {
    harness
        .backend
        .with_account("Priya", "priya@example.com", "secret1", Role::SalonOwner);

    let err = harness
        .session
        .login("priya@example.com", "secret1", Role::User)
        .await
        .expect_err("role mismatch");

    assert_eq!(err.code(), ErrorCode::RoleMismatch);
    assert!(err.message().contains("Salon Owner"));
    assert_eq!(harness.session.state(), AuthState::Anonymous);
    assert!(harness.session.access_token().await.is_none());
    assert_eq!(harness.backend.calls().sign_out, 1);
    let last = harness.notifier.last().expect("notification");
    assert_eq!(last.variant, NotificationVariant::Destructive);
}

#[rstest]
#[tokio::test]
async fn rejected_credentials_leave_state_unchanged(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("first login");
    let before = harness.session.state();

    let err = harness
        .session
        .login("asha@example.com", "wrong-pass", Role::User)
        .await
        .expect_err("bad password");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(harness.session.state(), before);
    assert_eq!(harness.notifier.titles().last().map(String::as_str), Some("Login failed"));
}

#[rstest]
#[tokio::test]
async fn invalid_credentials_never_reach_the_backend(harness: Harness) {
    let err = harness
        .session
        .login("not-an-email", "secret1", Role::User)
        .await
        .expect_err("invalid email");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(harness.backend.calls().sign_in, 0);
}

#[rstest]
#[tokio::test]
async fn missing_profile_forces_sign_out(harness: Harness) {
    let id = harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness.backend.remove_profile(&id);

    let err = harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect_err("no profile");

    assert_eq!(err.code(), ErrorCode::ProfileUnavailable);
    assert_eq!(harness.session.state(), AuthState::Anonymous);
    assert_eq!(harness.backend.calls().sign_out, 1);
}

#[rstest]
#[tokio::test]
async fn unreachable_auth_service_is_reported_as_unavailable(harness: Harness) {
    harness.backend.set_offline(true);
    let err = harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect_err("offline");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(harness.session.state(), AuthState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn signup_then_login_yields_submitted_email(harness: Harness) {
    let outcome = harness
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::SalonOwner)
        .await
        .expect("signup");
    let SignupOutcome::SignedIn(user) = outcome else {
        panic!("expected a live session");
    };
    assert_eq!(user.role(), Role::SalonOwner);
    assert!(user.avatar().is_some_and(|url| url.ends_with("seed=meera@example.com")));

    harness.session.logout().await;
    let user = harness
        .session
        .login("meera@example.com", "secret1", Role::SalonOwner)
        .await
        .expect("login");
    assert_eq!(user.email().as_ref(), "meera@example.com");
    assert_eq!(user.name(), "Meera");
}

#[rstest]
#[tokio::test]
async fn signup_awaiting_confirmation_stays_anonymous(harness: Harness) {
    harness.backend.set_email_confirmation(true);
    let outcome = harness
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::User)
        .await
        .expect("signup");
    assert_eq!(outcome, SignupOutcome::ConfirmationRequired);
    assert_eq!(harness.session.state(), AuthState::Anonymous);
    assert_eq!(harness.backend.calls().profile_writes, 1);
    assert_eq!(harness.notifier.titles(), ["Check your email"]);
}

#[rstest]
#[tokio::test]
async fn second_signup_inside_cooldown_makes_no_network_call(harness: Harness) {
    harness
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::User)
        .await
        .expect("first signup");
    harness.clock.advance_seconds(10);

    let err = harness
        .session
        .signup("Ravi", "ravi@example.com", "secret1", Role::User)
        .await
        .expect_err("throttled");

    assert_eq!(err.code(), ErrorCode::RateLimited);
    assert_eq!(
        err.details().and_then(|d| d.get("retryAfterSecs")).and_then(serde_json::Value::as_u64),
        Some(30)
    );
    assert_eq!(harness.backend.calls().sign_up, 1);
    assert_eq!(harness.notifier.titles().last().map(String::as_str), Some("Please wait"));

    harness.clock.advance_seconds(30);
    harness
        .session
        .signup("Ravi", "ravi@example.com", "secret1", Role::User)
        .await
        .expect("allowed after cooldown");
    assert_eq!(harness.backend.calls().sign_up, 2);
}

#[rstest]
#[tokio::test]
async fn failed_signup_still_starts_the_cooldown(harness: Harness) {
    harness.backend.set_offline(true);
    let err = harness
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::User)
        .await
        .expect_err("offline");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);

    harness.backend.set_offline(false);
    let err = harness
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::User)
        .await
        .expect_err("throttled");
    assert_eq!(err.code(), ErrorCode::RateLimited);
}

#[rstest]
#[tokio::test]
async fn invalid_signup_is_not_counted_as_an_attempt(harness: Harness) {
    let err = harness
        .session
        .signup("Meera", "meera@example.com", "123", Role::User)
        .await
        .expect_err("short password");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    harness
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::User)
        .await
        .expect("valid signup goes through");
}

#[rstest]
#[case::anonymous(false, false)]
#[case::signed_in(true, false)]
#[case::signed_in_backend_down(true, true)]
#[tokio::test]
async fn logout_always_ends_anonymous(harness: Harness, #[case] signed_in: bool, #[case] offline: bool) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    if signed_in {
        harness
            .session
            .login("asha@example.com", "secret1", Role::User)
            .await
            .expect("login");
    }
    harness.backend.set_offline(offline);

    harness.session.logout().await;

    assert_eq!(harness.session.state(), AuthState::Anonymous);
    assert!(harness.session.access_token().await.is_none());
    assert_eq!(harness.notifier.titles().last().map(String::as_str), Some("Logged out"));
}

#[rstest]
#[tokio::test]
async fn logout_revokes_the_session_token(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");
    let token = harness.session.access_token().await.expect("token");

    harness.session.logout().await;

    assert_eq!(harness.backend.revoked_tokens(), [token.as_str().to_owned()]);
}

#[rstest]
#[case::signed_out(AuthEvent::SignedOut)]
#[case::expired(AuthEvent::TokenExpired)]
#[tokio::test]
async fn invalidating_events_clear_the_session(harness: Harness, #[case] event: AuthEvent) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");

    assert!(harness.backend.bearer().is_some());

    harness.session.handle_auth_event(event).await.expect("handled");

    assert_eq!(harness.session.state(), AuthState::Anonymous);
    assert_eq!(harness.backend.bearer(), None);
}

#[rstest]
#[tokio::test]
async fn token_refresh_swaps_tokens_without_republishing(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");
    let updates = harness.session.subscribe();

    harness
        .session
        .handle_auth_event(AuthEvent::TokenRefreshed(AuthTokens::new("fresh-token")))
        .await
        .expect("handled");

    assert!(!updates.has_changed().expect("sender alive"));
    assert_eq!(
        harness.session.access_token().await.as_deref().map(String::as_str),
        Some("fresh-token")
    );
    assert_eq!(harness.backend.bearer().as_deref(), Some("fresh-token"));
}

#[rstest]
#[tokio::test]
async fn backend_acts_as_whoever_holds_the_session(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    assert_eq!(harness.backend.bearer(), None);

    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");
    let token = harness.session.access_token().await.expect("token");
    assert_eq!(harness.backend.bearer().as_deref(), Some(token.as_str()));

    harness.session.logout().await;
    assert_eq!(harness.backend.bearer(), None);
}

#[rstest]
#[tokio::test]
async fn signing_in_again_revokes_the_replaced_session(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .backend
        .with_account("Ben", "ben@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("asha");
    let first = harness.session.access_token().await.expect("token");

    let ben = harness
        .session
        .login("ben@example.com", "secret1", Role::User)
        .await
        .expect("ben");

    let second = harness.session.access_token().await.expect("token");
    assert_eq!(ben.name(), "Ben");
    assert_eq!(harness.backend.revoked_tokens(), [first.as_str().to_owned()]);
    assert_eq!(harness.backend.bearer().as_deref(), Some(second.as_str()));
}

#[rstest]
#[tokio::test]
async fn failed_second_login_revokes_both_sessions(harness: Harness) {
    harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .backend
        .with_account("Ben", "ben@example.com", "secret1", Role::SalonOwner);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("asha");
    let first = harness.session.access_token().await.expect("token");

    let err = harness
        .session
        .login("ben@example.com", "secret1", Role::User)
        .await
        .expect_err("ben is a salon owner");

    assert_eq!(err.code(), ErrorCode::RoleMismatch);
    assert_eq!(harness.session.state(), AuthState::Anonymous);
    let revoked = harness.backend.revoked_tokens();
    assert_eq!(revoked.len(), 2);
    assert!(revoked.contains(&first.as_str().to_owned()));
    assert_eq!(harness.backend.bearer(), None);
}

#[rstest]
#[tokio::test]
async fn profile_update_with_new_role_forces_sign_out(harness: Harness) {
    let id = harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");
    let mut profile = harness.backend.profile(&id).expect("profile");
    profile.role = Some("salon_owner".to_owned());

    let err = harness
        .session
        .handle_auth_event(AuthEvent::UserUpdated(profile))
        .await
        .expect_err("role changed");

    assert_eq!(err.code(), ErrorCode::RoleMismatch);
    assert_eq!(harness.session.state(), AuthState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn refresh_profile_republishes_the_new_name(harness: Harness) {
    let id = harness
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    harness
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");
    harness
        .backend
        .update_full_name(&id, "Asha Rao")
        .await
        .expect("rename");

    let user = harness.session.refresh_profile().await.expect("refresh");

    assert_eq!(user.name(), "Asha Rao");
    assert_eq!(harness.session.current_user().map(|u| u.name().to_owned()).as_deref(), Some("Asha Rao"));
}

#[rstest]
#[tokio::test]
async fn refresh_profile_requires_a_session(harness: Harness) {
    let err = harness.session.refresh_profile().await.expect_err("anonymous");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn failed_best_effort_sign_out_still_reports_role_mismatch() {
    let mut auth = MockAuthGateway::new();
    auth.expect_sign_in_with_password().times(1).returning(|credentials| {
        Ok(AuthGrant {
            user_id: UserId::new("owner-1").expect("id"),
            email: credentials.email().clone(),
            tokens: AuthTokens::new("token"),
        })
    });
    auth.expect_sign_out()
        .times(1)
        .returning(|_| Err(AuthGatewayError::connection("timed out")));
    let mut profiles = MockProfileRepository::new();
    profiles.expect_fetch_by_id().times(1).returning(|id| {
        Ok(Some(ProfileRecord {
            id: id.to_string(),
            role: Some("salon_owner".to_owned()),
            ..ProfileRecord::default()
        }))
    });
    auth.expect_adopt_access_token().returning(|_| ());
    let (session, _) = session_with(auth, profiles);

    let err = session
        .login("owner@example.com", "secret1", Role::User)
        .await
        .expect_err("mismatch");

    assert_eq!(err.code(), ErrorCode::RoleMismatch);
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn profile_upsert_failure_after_signup_is_surfaced() {
    let mut auth = MockAuthGateway::new();
    auth.expect_sign_up().times(1).returning(|request| {
        Ok(SignUpGrant {
            user_id: UserId::new("new-1").expect("id"),
            email: request.credentials().email().clone(),
            tokens: Some(AuthTokens::new("token")),
        })
    });
    auth.expect_sign_out().times(1).returning(|_| Ok(()));
    let mut profiles = MockProfileRepository::new();
    profiles
        .expect_upsert()
        .times(1)
        .returning(|_| Err(ProfileRepositoryError::connection("reset by peer")));
    auth.expect_adopt_access_token().returning(|_| ());
    let (session, notifier) = session_with(auth, profiles);

    let err = session
        .signup("Nia", "nia@example.com", "secret1", Role::User)
        .await
        .expect_err("upsert failed");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(session.state(), AuthState::Anonymous);
    assert!(notifier.last().is_some_and(|n| n.is_destructive()));
}

#[rstest]
fn require_role_distinguishes_anonymous_from_wrong_role(harness: Harness) {
    assert_eq!(
        harness.session.require_role(Role::SalonOwner).map_err(|e| e.code()),
        Err(ErrorCode::Unauthorized)
    );
    let user = User::new(
        UserId::new("u").expect("id"),
        "A",
        Email::new("a@example.com").expect("email"),
        Role::User,
    );
    harness.session.publish(AuthState::Authenticated(user));
    assert_eq!(
        harness.session.require_role(Role::SalonOwner).map_err(|e| e.code()),
        Err(ErrorCode::Forbidden)
    );
}
