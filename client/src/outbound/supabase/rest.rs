//! Table repositories over the REST (PostgREST) surface.
//!
//! Filters use the `column=eq.value` query syntax; joins are expressed in
//! `select` using the foreign-key embedding syntax.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::{Method, Url};
use tracing::debug;

use super::connection::SupabaseConnection;
use super::dto::{AvatarPatchDto, FullNamePatchDto, StatusPatchDto};
use super::http::{FailureKind, HttpFailure, decode, execute};
use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, FavoriteRepository, FavoriteRepositoryError,
    ProfileRepository, ProfileRepositoryError, SalonRepository, SalonRepositoryError,
};
use crate::domain::{
    Booking, BookingId, BookingStatus, BookingWithSalon, Favorite, FavoriteSalon, NewBooking,
    NewFavorite, NewSalon, ProfileRecord, Salon, SalonId, UserId,
};

const PREFER: &str = "Prefer";
const RETURN_MINIMAL: &str = "return=minimal";
const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT_MERGE: &str = "resolution=merge-duplicates,return=minimal";

/// Implements `From<HttpFailure>` for repository errors with `Connection`,
/// `Query` and `Rejected` variants.
macro_rules! repository_failure_mapping {
    ($error:ty) => {
        impl From<HttpFailure> for $error {
            fn from(failure: HttpFailure) -> Self {
                let kind = failure.kind();
                let message = failure.into_message();
                match kind {
                    FailureKind::Unavailable | FailureKind::RateLimited => {
                        Self::connection(message)
                    }
                    FailureKind::Rejected => Self::rejected(message),
                    FailureKind::Query => Self::query(message),
                }
            }
        }
    };
}

repository_failure_mapping!(ProfileRepositoryError);
repository_failure_mapping!(SalonRepositoryError);
repository_failure_mapping!(BookingRepositoryError);
repository_failure_mapping!(FavoriteRepositoryError);

/// URL of `table` with the given query pairs.
fn table_url(
    connection: &SupabaseConnection,
    table: &str,
    pairs: &[(&str, String)],
) -> Result<Url, String> {
    let mut url = connection.url(&format!("rest/v1/{table}"))?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// Profiles table adapter.
#[derive(Clone)]
pub struct SupabaseProfileRepository {
    connection: SupabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SupabaseProfileRepository {
    pub fn new(connection: SupabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { connection, clock }
    }

    async fn patch<T: serde::Serialize + Sync>(
        &self,
        id: &UserId,
        body: &T,
    ) -> Result<(), ProfileRepositoryError> {
        let url = table_url(&self.connection, "profiles", &[("id", eq(id))])
            .map_err(ProfileRepositoryError::query)?;
        let request = self
            .connection
            .request(Method::PATCH, url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body);
        let bytes = execute(request).await?;
        patched_profile(&bytes, id)
    }
}

/// An empty representation means the filter matched no row the caller may
/// change.
fn patched_profile(bytes: &[u8], id: &UserId) -> Result<(), ProfileRepositoryError> {
    let rows: Vec<ProfileRecord> = decode(bytes, "profile").map_err(ProfileRepositoryError::query)?;
    if rows.is_empty() {
        return Err(ProfileRepositoryError::not_found(id.to_string()));
    }
    Ok(())
}

fn booking_status_url(
    connection: &SupabaseConnection,
    user: &UserId,
    id: &BookingId,
) -> Result<Url, String> {
    table_url(
        connection,
        "bookings",
        &[("id", eq(id)), ("user_id", eq(user))],
    )
}

#[async_trait]
impl ProfileRepository for SupabaseProfileRepository {
    async fn fetch_by_id(&self, id: &UserId) -> Result<Option<ProfileRecord>, ProfileRepositoryError> {
        let url = table_url(
            &self.connection,
            "profiles",
            &[("select", "*".to_owned()), ("id", eq(id))],
        )
        .map_err(ProfileRepositoryError::query)?;
        let bytes = execute(self.connection.request(Method::GET, url)).await?;
        let rows: Vec<ProfileRecord> = decode(&bytes, "profile").map_err(ProfileRepositoryError::query)?;
        Ok(rows.into_iter().next())
    }

    async fn upsert(&self, profile: &ProfileRecord) -> Result<(), ProfileRepositoryError> {
        let url = table_url(&self.connection, "profiles", &[]).map_err(ProfileRepositoryError::query)?;
        let request = self
            .connection
            .request(Method::POST, url)
            .header(PREFER, UPSERT_MERGE)
            .json(profile);
        execute(request).await?;
        debug!(user_id = %profile.id, "profile upserted");
        Ok(())
    }

    async fn update_full_name(&self, id: &UserId, full_name: &str) -> Result<(), ProfileRepositoryError> {
        let body = FullNamePatchDto {
            full_name,
            updated_at: self.clock.utc(),
        };
        self.patch(id, &body).await
    }

    async fn update_avatar_url(&self, id: &UserId, avatar_url: &str) -> Result<(), ProfileRepositoryError> {
        let body = AvatarPatchDto {
            avatar_url,
            updated_at: self.clock.utc(),
        };
        self.patch(id, &body).await
    }
}

/// Salons table adapter.
#[derive(Clone)]
pub struct SupabaseSalonRepository {
    connection: SupabaseConnection,
}

impl SupabaseSalonRepository {
    pub fn new(connection: SupabaseConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl SalonRepository for SupabaseSalonRepository {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Salon>, SalonRepositoryError> {
        let url = table_url(
            &self.connection,
            "salons",
            &[
                ("select", "*".to_owned()),
                ("order", "created_at.desc".to_owned()),
                ("limit", limit.to_string()),
            ],
        )
        .map_err(SalonRepositoryError::query)?;
        let bytes = execute(self.connection.request(Method::GET, url)).await?;
        decode(&bytes, "salon list").map_err(SalonRepositoryError::query)
    }

    async fn find_by_id(&self, id: &SalonId) -> Result<Option<Salon>, SalonRepositoryError> {
        let url = table_url(
            &self.connection,
            "salons",
            &[("select", "*".to_owned()), ("id", eq(id))],
        )
        .map_err(SalonRepositoryError::query)?;
        let bytes = execute(self.connection.request(Method::GET, url)).await?;
        let rows: Vec<Salon> = decode(&bytes, "salon").map_err(SalonRepositoryError::query)?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, salon: &NewSalon) -> Result<Salon, SalonRepositoryError> {
        let url = table_url(&self.connection, "salons", &[]).map_err(SalonRepositoryError::query)?;
        let request = self
            .connection
            .request(Method::POST, url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(salon);
        let bytes = execute(request).await?;
        let rows: Vec<Salon> = decode(&bytes, "salon").map_err(SalonRepositoryError::query)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SalonRepositoryError::query("insert returned no row"))
    }
}

/// Bookings table adapter.
#[derive(Clone)]
pub struct SupabaseBookingRepository {
    connection: SupabaseConnection,
    clock: Arc<dyn Clock>,
}

impl SupabaseBookingRepository {
    pub fn new(connection: SupabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { connection, clock }
    }
}

#[async_trait]
impl BookingRepository for SupabaseBookingRepository {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<BookingWithSalon>, BookingRepositoryError> {
        let url = table_url(
            &self.connection,
            "bookings",
            &[
                ("select", "*,salon:salons(name,location)".to_owned()),
                ("user_id", eq(user)),
                ("order", "booking_date.desc".to_owned()),
            ],
        )
        .map_err(BookingRepositoryError::query)?;
        let bytes = execute(self.connection.request(Method::GET, url)).await?;
        decode(&bytes, "booking list").map_err(BookingRepositoryError::query)
    }

    async fn insert(&self, booking: &NewBooking) -> Result<Booking, BookingRepositoryError> {
        let url = table_url(&self.connection, "bookings", &[]).map_err(BookingRepositoryError::query)?;
        let request = self
            .connection
            .request(Method::POST, url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(booking);
        let bytes = execute(request).await?;
        let rows: Vec<Booking> = decode(&bytes, "booking").map_err(BookingRepositoryError::query)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BookingRepositoryError::query("insert returned no row"))
    }

    async fn update_status(
        &self,
        user: &UserId,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, BookingRepositoryError> {
        let url = booking_status_url(&self.connection, user, id).map_err(BookingRepositoryError::query)?;
        let body = StatusPatchDto {
            status,
            updated_at: self.clock.utc(),
        };
        let request = self
            .connection
            .request(Method::PATCH, url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&body);
        let bytes = execute(request).await?;
        let rows: Vec<Booking> = decode(&bytes, "booking").map_err(BookingRepositoryError::query)?;
        // Nothing matched both the id and the caller.
        rows.into_iter()
            .next()
            .ok_or_else(|| BookingRepositoryError::not_found(id.to_string()))
    }
}

/// Favorites table adapter.
#[derive(Clone)]
pub struct SupabaseFavoriteRepository {
    connection: SupabaseConnection,
}

impl SupabaseFavoriteRepository {
    pub fn new(connection: SupabaseConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl FavoriteRepository for SupabaseFavoriteRepository {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<FavoriteSalon>, FavoriteRepositoryError> {
        let url = table_url(
            &self.connection,
            "favorites",
            &[
                ("select", "*,salon:salons(*)".to_owned()),
                ("user_id", eq(user)),
                ("order", "created_at.desc".to_owned()),
            ],
        )
        .map_err(FavoriteRepositoryError::query)?;
        let bytes = execute(self.connection.request(Method::GET, url)).await?;
        decode(&bytes, "favorite list").map_err(FavoriteRepositoryError::query)
    }

    async fn add(&self, favorite: &NewFavorite) -> Result<Favorite, FavoriteRepositoryError> {
        let url = table_url(&self.connection, "favorites", &[]).map_err(FavoriteRepositoryError::query)?;
        let request = self
            .connection
            .request(Method::POST, url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(favorite);
        let bytes = execute(request).await?;
        let rows: Vec<Favorite> = decode(&bytes, "favorite").map_err(FavoriteRepositoryError::query)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| FavoriteRepositoryError::query("insert returned no row"))
    }

    async fn remove(&self, user: &UserId, salon: &SalonId) -> Result<(), FavoriteRepositoryError> {
        let url = table_url(
            &self.connection,
            "favorites",
            &[("user_id", eq(user)), ("salon_id", eq(salon))],
        )
        .map_err(FavoriteRepositoryError::query)?;
        let request = self
            .connection
            .request(Method::DELETE, url)
            .header(PREFER, RETURN_MINIMAL);
        execute(request).await?;
        Ok(())
    }
}
