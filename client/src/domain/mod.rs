//! Domain primitives, aggregates and page services.
//!
//! Purpose: Define strongly typed marketplace entities and the use-cases the
//! front end drives. Keep types immutable and document invariants and
//! serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): error payload surfaced to adapters.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User (alias to `user::User`): signed-in identity with its role.
//! - AuthSession (alias to `auth_session::AuthSession`): single writer of
//!   the session, publishing [`AuthState`] to readers.
//! - SalonCatalogue, BookingService, FavoritesService, ProfileService and
//!   SalonListingService: page use-cases built on the ports.

pub mod auth;
pub mod auth_session;
pub mod booking;
pub mod booking_service;
pub mod error;
pub mod favorite;
pub mod favorites_service;
pub mod listing;
pub mod listing_service;
pub mod notification;
pub mod ports;
pub mod profile;
pub mod profile_service;
pub mod routes;
pub mod salon;
pub mod salon_catalogue;
pub mod session;
pub mod signup_throttle;
pub mod user;

pub use self::auth::{
    CredentialsValidationError, LoginCredentials, PASSWORD_MIN, SignupMetadata, SignupRequest,
};
pub use self::auth_session::AuthSession;
pub use self::booking::{
    Booking, BookingId, BookingRequest, BookingStatus, BookingValidationError, BookingWithSalon,
    NewBooking, SalonSummary,
};
pub use self::booking_service::BookingService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::favorite::{Favorite, FavoriteSalon, NewFavorite};
pub use self::favorites_service::FavoritesService;
pub use self::listing::{FieldError, ListingServiceEntry, ListingValidationError, SalonListingForm};
pub use self::listing_service::SalonListingService;
pub use self::notification::{Notification, NotificationVariant};
pub use self::profile::{ProfileMappingError, ProfileRecord, default_avatar_url, map_profile_to_user};
pub use self::profile_service::ProfileService;
pub use self::routes::{AccessPolicy, Route, RouteDecision, UnknownRouteError};
pub use self::salon::{
    BlankIdError, Coordinates, NewSalon, Salon, SalonId, SalonQuery, SalonSort, ServiceOffering,
    default_salons,
};
pub use self::salon_catalogue::{BROWSE_LIMIT, DEFAULT_FEATURED_LIMIT, SalonCatalogue};
pub use self::session::{AuthEvent, AuthState, AuthTokens, Session, SignupOutcome};
pub use self::signup_throttle::{DEFAULT_SIGNUP_COOLDOWN, SignupThrottle};
pub use self::user::{Email, Role, User, UserId, UserValidationError};

/// Convenient result alias for domain operations.
///
/// # Examples
/// ```
/// use beautycut::domain::{DomainResult, Error};
///
/// fn load() -> DomainResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(load().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
