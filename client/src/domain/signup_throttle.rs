//! Client-side cooldown between signup attempts.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

/// Default wait between signup attempts.
pub const DEFAULT_SIGNUP_COOLDOWN: Duration = Duration::from_secs(40);

/// Allows one signup attempt per cooldown window.
///
/// Every attempt that passes the check is recorded, whether or not the signup
/// itself later succeeds.
pub struct SignupThrottle {
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    last_attempt: Mutex<Option<DateTime<Utc>>>,
}

impl SignupThrottle {
    pub fn new(clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown,
            last_attempt: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Record an attempt, or return how long the caller must still wait.
    pub fn check_and_record(&self) -> Result<(), Duration> {
        let now = self.clock.utc();
        let mut last = match self.last_attempt.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = *last {
            let elapsed = (now - previous).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.cooldown {
                return Err(self.cooldown - elapsed);
            }
        }
        *last = Some(now);
        Ok(())
    }

    /// Time remaining before the next attempt is allowed.
    pub fn remaining(&self) -> Duration {
        let last = match self.last_attempt.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        let Some(previous) = last else {
            return Duration::ZERO;
        };
        let cooldown = TimeDelta::from_std(self.cooldown).unwrap_or(TimeDelta::MAX);
        let elapsed = self.clock.utc() - previous;
        cooldown
            .checked_sub(&elapsed)
            .and_then(|left| left.to_std().ok())
            .unwrap_or(Duration::ZERO)
    }
}

impl std::fmt::Debug for SignupThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupThrottle")
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}
