//! End-to-end properties of the session holder and page services against
//! the in-memory backend.

mod support;

use beautycut::domain::{
    AuthState, BookingRequest, ErrorCode, ListingServiceEntry, ProfileRecord, Role,
    SalonListingForm, SignupOutcome, default_salons, map_profile_to_user,
};
use chrono::TimeDelta;
use mockable::Clock;
use rstest::{fixture, rstest};
use support::World;

#[fixture]
fn world() -> World {
    World::new()
}

#[rstest]
#[tokio::test]
async fn role_mismatch_leaves_the_session_anonymous(world: World) {
    world
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);

    let err = world
        .session
        .login("asha@example.com", "secret1", Role::SalonOwner)
        .await
        .expect_err("wrong role");

    assert_eq!(err.code(), ErrorCode::RoleMismatch);
    assert_eq!(world.session.state(), AuthState::Anonymous);
    assert_eq!(world.backend.calls().sign_out, 1);
}

#[rstest]
#[tokio::test]
async fn signup_then_login_yields_the_submitted_email(world: World) {
    let outcome = world
        .session
        .signup("Meera", "Meera@Example.com", "secret1", Role::User)
        .await
        .expect("signup");
    assert!(matches!(outcome, SignupOutcome::SignedIn(_)));
    world.session.logout().await;

    let user = world
        .session
        .login("meera@example.com", "secret1", Role::User)
        .await
        .expect("login");

    assert_eq!(user.email().as_ref(), "meera@example.com");
    assert_eq!(user.name(), "Meera");
}

#[rstest]
#[case::anonymous(false)]
#[case::signed_in(true)]
#[tokio::test]
async fn logout_always_yields_anonymous(world: World, #[case] signed_in: bool) {
    world
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    if signed_in {
        world
            .session
            .login("asha@example.com", "secret1", Role::User)
            .await
            .expect("login");
    }

    world.session.logout().await;

    assert_eq!(world.session.state(), AuthState::Anonymous);
    assert!(world.session.access_token().await.is_none());
}

#[rstest]
fn mapping_a_profile_twice_gives_the_same_user() {
    let profile = ProfileRecord {
        id: "u-1".to_owned(),
        full_name: Some("Asha".to_owned()),
        role: Some("salon_owner".to_owned()),
        ..ProfileRecord::default()
    };

    let first = map_profile_to_user(&profile, "asha@example.com").expect("map");
    let second = map_profile_to_user(&profile, "asha@example.com").expect("map");

    assert_eq!(first, second);
    assert_eq!(first.role(), Role::SalonOwner);
}

#[rstest]
#[tokio::test]
async fn listing_a_salon_writes_one_row_with_its_services(world: World) {
    world
        .backend
        .with_account("Ravi", "ravi@example.com", "secret1", Role::SalonOwner);
    world
        .session
        .login("ravi@example.com", "secret1", Role::SalonOwner)
        .await
        .expect("login");
    let before = world.backend.salons().len();
    let form = SalonListingForm {
        salon_name: "Test Salon".to_owned(),
        address: "12 Road No. 1".to_owned(),
        city: "Hyderabad".to_owned(),
        state: "Telangana".to_owned(),
        zip_code: "500034".to_owned(),
        phone: "9876543210".to_owned(),
        email: "owner@testsalon.in".to_owned(),
        operating_hours: "Mon-Sat 9-7".to_owned(),
        services: vec![ListingServiceEntry {
            name: "Haircut".to_owned(),
            price: 300,
            duration: 30,
            description: None,
        }],
        description: "A friendly neighbourhood salon".to_owned(),
        booking_policy: "Walk-ins welcome".to_owned(),
        cancellation_policy: "Free up to 2 hours before".to_owned(),
        payment_methods: "UPI".to_owned(),
        hygiene_measures: "Sterilised tools".to_owned(),
        ..SalonListingForm::default()
    };

    let salon = world.listing().submit(&form).await.expect("listed");

    assert_eq!(world.backend.salons().len(), before + 1);
    assert_eq!(world.backend.calls().salon_inserts, 1);
    assert!(salon.offers("Haircut"));
}

#[rstest]
#[tokio::test]
async fn a_booking_without_a_date_writes_nothing(world: World) {
    world
        .backend
        .with_account("Asha", "asha@example.com", "secret1", Role::User);
    world
        .session
        .login("asha@example.com", "secret1", Role::User)
        .await
        .expect("login");
    let salons = default_salons();
    let salon = salons.first().expect("salon");

    let undated = BookingRequest::for_salon(salon).with_service("Haircut");
    let err = world.bookings().book(&undated).await.expect_err("no date");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(world.backend.bookings().is_empty());

    let dated = undated.with_date(world.clock.utc() + TimeDelta::days(1));
    world.bookings().book(&dated).await.expect("booked");
    assert_eq!(world.backend.bookings().len(), 1);
}

#[rstest]
#[tokio::test]
async fn a_second_signup_within_the_cooldown_makes_no_network_call(world: World) {
    world
        .session
        .signup("Meera", "meera@example.com", "secret1", Role::User)
        .await
        .expect("first signup");
    world.session.logout().await;
    world.clock.advance_seconds(39);

    let err = world
        .session
        .signup("Kiran", "kiran@example.com", "secret1", Role::User)
        .await
        .expect_err("throttled");

    assert_eq!(err.code(), ErrorCode::RateLimited);
    assert_eq!(world.backend.calls().sign_up, 1);

    world.clock.advance_seconds(1);
    world
        .session
        .signup("Kiran", "kiran@example.com", "secret1", Role::User)
        .await
        .expect("cooldown elapsed");
    assert_eq!(world.backend.calls().sign_up, 2);
}
