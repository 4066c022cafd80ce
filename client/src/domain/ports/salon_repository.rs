//! Port for reading and creating salons.

use async_trait::async_trait;

use crate::domain::{Error, NewSalon, Salon, SalonId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by salon repository adapters.
    pub enum SalonRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "salon repository connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } => "salon repository query failed: {message}",
        /// The backend refused the write.
        Rejected { message: String } => "salon repository rejected request: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalonRepository: Send + Sync {
    /// Newest salons first, at most `limit` rows.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Salon>, SalonRepositoryError>;

    async fn find_by_id(&self, id: &SalonId) -> Result<Option<Salon>, SalonRepositoryError>;

    /// Insert one salon row and return it as stored.
    async fn insert(&self, salon: &NewSalon) -> Result<Salon, SalonRepositoryError>;
}

/// Fixture repository with an empty catalogue that refuses writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSalonRepository;

#[async_trait]
impl SalonRepository for FixtureSalonRepository {
    async fn list_recent(&self, _limit: usize) -> Result<Vec<Salon>, SalonRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_by_id(&self, _id: &SalonId) -> Result<Option<Salon>, SalonRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _salon: &NewSalon) -> Result<Salon, SalonRepositoryError> {
        Err(SalonRepositoryError::rejected("fixture repository is read-only"))
    }
}

impl From<SalonRepositoryError> for Error {
    fn from(err: SalonRepositoryError) -> Self {
        match err {
            SalonRepositoryError::Connection { message } => Self::service_unavailable(message),
            SalonRepositoryError::Query { message } => Self::internal(message),
            SalonRepositoryError::Rejected { message } => Self::forbidden(message),
        }
    }
}
