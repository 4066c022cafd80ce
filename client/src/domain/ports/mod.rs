//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod avatar_storage;
mod booking_repository;
mod favorite_repository;
mod notifier;
mod profile_repository;
mod salon_repository;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, AuthGatewayError, AuthGrant, FixtureAuthGateway, SignUpGrant};
#[cfg(test)]
pub use avatar_storage::MockAvatarStorage;
pub use avatar_storage::{AvatarStorage, AvatarStorageError, FixtureAvatarStorage};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingRepository, BookingRepositoryError, FixtureBookingRepository};
#[cfg(test)]
pub use favorite_repository::MockFavoriteRepository;
pub use favorite_repository::{FavoriteRepository, FavoriteRepositoryError, FixtureFavoriteRepository};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{FixtureNotifier, Notifier};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{FixtureProfileRepository, ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use salon_repository::MockSalonRepository;
pub use salon_repository::{FixtureSalonRepository, SalonRepository, SalonRepositoryError};
