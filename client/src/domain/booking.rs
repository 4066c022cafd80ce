//! Booking model and the booking dialog's client-side validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::salon::{BlankIdError, Salon, SalonId};
use super::user::UserId;

/// Opaque booking identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingId(String);

impl BookingId {
    /// Validate and construct a [`BookingId`].
    pub fn new(id: impl Into<String>) -> Result<Self, BlankIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(BlankIdError);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for BookingId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<BookingId> for String {
    fn from(value: BookingId) -> Self {
        value.0
    }
}

impl TryFrom<String> for BookingId {
    type Error = BlankIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    /// Wire representation stored in `bookings.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            // Older rows spell it the American way.
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status `{other}`")),
        }
    }
}

fn status_or_pending<'de, D>(deserializer: D) -> Result<BookingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(BookingStatus::Pending),
        Some(raw) => raw.parse().map_err(serde::de::Error::custom),
    }
}

/// Row of the `bookings` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: Option<UserId>,
    pub salon_id: Option<SalonId>,
    pub service: String,
    pub booking_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "status_or_pending")]
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Name and location of the salon a booking belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalonSummary {
    pub name: String,
    pub location: String,
}

/// Booking joined with its salon, as listed on the "My Bookings" page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWithSalon {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(default)]
    pub salon: Option<SalonSummary>,
}

/// Insert payload for the `bookings` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_id: UserId,
    pub salon_id: SalonId,
    pub service: String,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
}

/// Reasons the booking dialog refuses to submit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    #[error("please choose a salon")]
    MissingSalon,
    #[error("please choose a service")]
    MissingService,
    #[error("please select a date")]
    MissingDate,
    #[error("booking date must be in the future")]
    DateInPast,
    #[error("`{service}` is not offered by this salon")]
    UnknownService { service: String },
}

/// Booking dialog state as entered by the customer.
///
/// Validation never consumes the request, so a rejected or failed submission
/// leaves the form intact for another attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookingRequest {
    pub salon_id: Option<SalonId>,
    /// Services the salon advertises; empty when unknown.
    pub offered_services: Vec<String>,
    pub service: Option<String>,
    pub booking_date: Option<DateTime<Utc>>,
}

impl BookingRequest {
    /// Start a request for `salon`, remembering the services it offers.
    pub fn for_salon(salon: &Salon) -> Self {
        Self {
            salon_id: Some(salon.id.clone()),
            offered_services: salon.services.iter().map(|s| s.name.clone()).collect(),
            service: None,
            booking_date: None,
        }
    }

    /// Choose the service.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Choose the appointment date.
    #[must_use]
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.booking_date = Some(date);
        self
    }

    /// Validate the dialog for `user` at time `now`.
    pub fn validate(&self, user: &UserId, now: DateTime<Utc>) -> Result<NewBooking, BookingValidationError> {
        let salon_id = self
            .salon_id
            .clone()
            .ok_or(BookingValidationError::MissingSalon)?;
        let service = self
            .service
            .as_deref()
            .map(str::trim)
            .filter(|service| !service.is_empty())
            .ok_or(BookingValidationError::MissingService)?;
        let booking_date = self.booking_date.ok_or(BookingValidationError::MissingDate)?;
        if booking_date <= now {
            return Err(BookingValidationError::DateInPast);
        }
        if !self.offered_services.is_empty()
            && !self
                .offered_services
                .iter()
                .any(|offered| offered.trim().eq_ignore_ascii_case(service))
        {
            return Err(BookingValidationError::UnknownService {
                service: service.to_owned(),
            });
        }

        Ok(NewBooking {
            user_id: user.clone(),
            salon_id,
            service: service.to_owned(),
            booking_date,
            status: BookingStatus::Pending,
        })
    }
}
