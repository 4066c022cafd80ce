//! Port for the `favorites` table.

use async_trait::async_trait;

use crate::domain::{Error, Favorite, FavoriteSalon, NewFavorite, SalonId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by favourite repository adapters.
    pub enum FavoriteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "favorite repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "favorite repository query failed: {message}",
        /// The backend refused the write.
        Rejected { message: String } => "favorite repository rejected request: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Favourites of `user` joined with their salons, newest first.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<FavoriteSalon>, FavoriteRepositoryError>;

    async fn add(&self, favorite: &NewFavorite) -> Result<Favorite, FavoriteRepositoryError>;

    /// Remove the favourite; removing an absent favourite succeeds.
    async fn remove(&self, user: &UserId, salon: &SalonId) -> Result<(), FavoriteRepositoryError>;
}

/// Fixture repository with no favourites.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFavoriteRepository;

#[async_trait]
impl FavoriteRepository for FixtureFavoriteRepository {
    async fn list_for_user(&self, _user: &UserId) -> Result<Vec<FavoriteSalon>, FavoriteRepositoryError> {
        Ok(Vec::new())
    }

    async fn add(&self, _favorite: &NewFavorite) -> Result<Favorite, FavoriteRepositoryError> {
        Err(FavoriteRepositoryError::rejected("fixture repository is read-only"))
    }

    async fn remove(&self, _user: &UserId, _salon: &SalonId) -> Result<(), FavoriteRepositoryError> {
        Ok(())
    }
}

impl From<FavoriteRepositoryError> for Error {
    fn from(err: FavoriteRepositoryError) -> Self {
        match err {
            FavoriteRepositoryError::Connection { message } => Self::service_unavailable(message),
            FavoriteRepositoryError::Query { message } => Self::internal(message),
            FavoriteRepositoryError::Rejected { message } => Self::forbidden(message),
        }
    }
}
