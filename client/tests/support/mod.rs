//! Shared wiring for integration tests.

use std::sync::Arc;
use std::time::Duration;

use beautycut::domain::{
    AuthSession, BookingService, SalonListingService, default_salons,
};
use beautycut::test_support::{InMemoryBackend, MutableClock, RecordingNotifier};

pub const SIGNUP_COOLDOWN: Duration = Duration::from_secs(40);

/// One in-memory backend with a session and the services built on it.
pub struct World {
    pub backend: Arc<InMemoryBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<MutableClock>,
    pub session: Arc<AuthSession>,
}

impl World {
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        backend.with_salons(default_salons());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(MutableClock::default());
        let session = Arc::new(AuthSession::new(
            backend.clone(),
            backend.clone(),
            notifier.clone(),
            clock.clone(),
            SIGNUP_COOLDOWN,
        ));
        Self {
            backend,
            notifier,
            clock,
            session,
        }
    }

    pub fn bookings(&self) -> BookingService {
        BookingService::new(
            self.session.clone(),
            self.backend.clone(),
            self.notifier.clone(),
            self.clock.clone(),
        )
    }

    pub fn listing(&self) -> SalonListingService {
        SalonListingService::new(
            self.session.clone(),
            self.backend.clone(),
            self.notifier.clone(),
        )
    }
}
