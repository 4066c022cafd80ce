//! Booking use-cases for the signed-in customer.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{BookingRepository, Notifier};
use super::{
    AuthSession, Booking, BookingId, BookingRequest, BookingStatus, BookingWithSalon, Error,
    Notification,
};

#[derive(Clone)]
pub struct BookingService {
    session: Arc<AuthSession>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        session: Arc<AuthSession>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            bookings,
            notifier,
            clock,
        }
    }

    /// Submit the booking dialog.
    ///
    /// The request is validated before anything is written; a rejected or
    /// failed submission leaves `request` untouched for another attempt.
    pub async fn book(&self, request: &BookingRequest) -> Result<Booking, Error> {
        let user = self.session.require_user()?;
        let booking = match request.validate(user.id(), self.clock.utc()) {
            Ok(booking) => booking,
            Err(err) => {
                self.notifier
                    .notify(Notification::destructive("Booking incomplete", err.to_string()));
                return Err(Error::invalid_request(err.to_string()));
            }
        };

        match self.bookings.insert(&booking).await {
            Ok(stored) => {
                info!(booking_id = %stored.id, "booking created");
                self.notifier.notify(Notification::info(
                    "Booking requested",
                    format!(
                        "{} on {} is pending confirmation.",
                        stored.service,
                        stored.booking_date.format("%d %b %Y, %H:%M")
                    ),
                ));
                Ok(stored)
            }
            Err(err) => {
                warn!(error = %err, "booking insert failed");
                self.notifier.notify(Notification::destructive(
                    "Booking failed",
                    "We could not save your booking. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    /// The signed-in user's bookings, latest appointment first.
    pub async fn my_bookings(&self) -> Result<Vec<BookingWithSalon>, Error> {
        let user = self.session.require_user()?;
        Ok(self.bookings.list_for_user(user.id()).await?)
    }

    /// Cancel one of the user's bookings.
    pub async fn cancel(&self, id: &BookingId) -> Result<Booking, Error> {
        let user = self.session.require_user()?;
        match self
            .bookings
            .update_status(user.id(), id, BookingStatus::Cancelled)
            .await
        {
            Ok(booking) => {
                info!(booking_id = %booking.id, user_id = %user.id(), "booking cancelled");
                self.notifier.notify(Notification::info(
                    "Booking cancelled",
                    format!("Your {} booking was cancelled.", booking.service),
                ));
                Ok(booking)
            }
            Err(err) => {
                warn!(booking_id = %id, error = %err, "booking cancellation failed");
                self.notifier.notify(Notification::destructive(
                    "Cancellation failed",
                    "We could not cancel this booking. Please try again.",
                ));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{BookingRepositoryError, MockBookingRepository};
    use crate::domain::{ErrorCode, Role, default_salons};
    use crate::test_support::{InMemoryBackend, MutableClock, RecordingNotifier};
    use chrono::{TimeDelta, TimeZone, Utc};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    struct Harness {
        backend: Arc<InMemoryBackend>,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<MutableClock>,
        session: Arc<AuthSession>,
    }

    impl Harness {
        fn service(&self) -> BookingService {
            BookingService::new(
                self.session.clone(),
                self.backend.clone(),
                self.notifier.clone(),
                self.clock.clone(),
            )
        }

        fn service_with(&self, repo: MockBookingRepository) -> BookingService {
            BookingService::new(
                self.session.clone(),
                Arc::new(repo),
                self.notifier.clone(),
                self.clock.clone(),
            )
        }

        fn request(&self) -> BookingRequest {
            let salons = default_salons();
            let salon = salons.first().expect("salon");
            BookingRequest::for_salon(salon)
                .with_service("Haircut")
                .with_date(self.clock.utc() + TimeDelta::days(2))
        }
    }

    #[fixture]
    async fn signed_in() -> Harness {
        let backend = Arc::new(InMemoryBackend::new());
        backend.with_account("Asha", "asha@example.com", "secret1", Role::User);
        backend.with_salons(default_salons());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).single().expect("time"),
        ));
        let session = Arc::new(AuthSession::new(
            backend.clone(),
            backend.clone(),
            notifier.clone(),
            clock.clone(),
            Duration::from_secs(40),
        ));
        session
            .login("asha@example.com", "secret1", Role::User)
            .await
            .expect("login");
        notifier.clear();
        Harness {
            backend,
            notifier,
            clock,
            session,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn booking_creates_pending_row(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        let booking = harness.service().book(&harness.request()).await.expect("booked");

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(harness.backend.bookings().len(), 1);
        assert_eq!(harness.notifier.titles(), ["Booking requested"]);
        let listed = harness.service().my_bookings().await.expect("list");
        assert_eq!(
            listed.first().and_then(|row| row.salon.as_ref()).map(|s| s.name.as_str()),
            Some("Style Studio")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn booking_without_date_writes_nothing(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        let request = BookingRequest {
            booking_date: None,
            ..harness.request()
        };

        let err = harness.service().book(&request).await.expect_err("no date");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(harness.backend.calls().booking_inserts, 0);
        assert!(harness.notifier.last().is_some_and(|n| n.is_destructive()));
    }

    #[rstest]
    #[tokio::test]
    async fn failed_write_leaves_request_intact(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        let mut repo = MockBookingRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(BookingRepositoryError::connection("reset")));
        let request = harness.request();
        let before = request.clone();

        let err = harness
            .service_with(repo)
            .book(&request)
            .await
            .expect_err("write failed");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
        assert_eq!(request, before);
        assert_eq!(harness.notifier.titles(), ["Booking failed"]);
    }

    #[rstest]
    #[tokio::test]
    async fn cancel_marks_booking_cancelled(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        let booking = harness.service().book(&harness.request()).await.expect("booked");

        let cancelled = harness.service().cancel(&booking.id).await.expect("cancel");

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(
            harness.backend.bookings().first().map(|b| b.status),
            Some(BookingStatus::Cancelled)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn cannot_cancel_someone_elses_booking(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        let booking = harness.service().book(&harness.request()).await.expect("booked");
        harness
            .backend
            .with_account("Ben", "ben@example.com", "secret1", Role::User);
        harness
            .session
            .login("ben@example.com", "secret1", Role::User)
            .await
            .expect("ben");

        let err = harness.service().cancel(&booking.id).await.expect_err("not ben's");

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(
            harness.backend.bookings().first().map(|b| b.status),
            Some(BookingStatus::Pending)
        );
        assert_eq!(harness.notifier.titles().last().map(String::as_str), Some("Cancellation failed"));
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_unknown_booking_is_not_found(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        let err = harness
            .service()
            .cancel(&BookingId::new("nope").expect("id"))
            .await
            .expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn anonymous_users_cannot_book(#[future] signed_in: Harness) {
        let harness = signed_in.await;
        harness.session.logout().await;

        let err = harness.service().book(&harness.request()).await.expect_err("anonymous");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(harness.backend.calls().booking_inserts, 0);
    }
}
