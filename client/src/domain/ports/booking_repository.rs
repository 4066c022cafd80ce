//! Port for the `bookings` table.

use async_trait::async_trait;

use crate::domain::{
    Booking, BookingId, BookingStatus, BookingWithSalon, Error, NewBooking, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by booking repository adapters.
    pub enum BookingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "booking repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "booking repository query failed: {message}",
        /// The backend refused the write.
        Rejected { message: String } => "booking repository rejected request: {message}",
        /// No booking with this id is visible to the caller.
        NotFound { id: String } => "booking {id} not found",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Bookings of `user`, latest booking date first, joined with their salon.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<BookingWithSalon>, BookingRepositoryError>;

    async fn insert(&self, booking: &NewBooking) -> Result<Booking, BookingRepositoryError>;

    /// Change the status of `user`'s booking `id`.
    ///
    /// Bookings owned by someone else are reported as `NotFound`.
    async fn update_status(
        &self,
        user: &UserId,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, BookingRepositoryError>;
}

/// Fixture repository without bookings.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBookingRepository;

#[async_trait]
impl BookingRepository for FixtureBookingRepository {
    async fn list_for_user(&self, _user: &UserId) -> Result<Vec<BookingWithSalon>, BookingRepositoryError> {
        Ok(Vec::new())
    }

    async fn insert(&self, _booking: &NewBooking) -> Result<Booking, BookingRepositoryError> {
        Err(BookingRepositoryError::rejected("fixture repository is read-only"))
    }

    async fn update_status(
        &self,
        _user: &UserId,
        id: &BookingId,
        _status: BookingStatus,
    ) -> Result<Booking, BookingRepositoryError> {
        Err(BookingRepositoryError::not_found(id.to_string()))
    }
}

impl From<BookingRepositoryError> for Error {
    fn from(err: BookingRepositoryError) -> Self {
        match err {
            BookingRepositoryError::Connection { message } => Self::service_unavailable(message),
            BookingRepositoryError::Query { message } => Self::internal(message),
            BookingRepositoryError::Rejected { message } => Self::forbidden(message),
            BookingRepositoryError::NotFound { id } => Self::not_found(format!("booking {id} not found")),
        }
    }
}
