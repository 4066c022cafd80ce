//! In-memory stand-in for the hosted backend.
//!
//! One value implements every backend port so tests can wire the same
//! `Arc<InMemoryBackend>` into the session holder and all services, then
//! inspect rows and call counts afterwards.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{
    AuthGateway, AuthGatewayError, AuthGrant, AvatarStorage, AvatarStorageError, BookingRepository,
    BookingRepositoryError, FavoriteRepository, FavoriteRepositoryError, ProfileRepository,
    ProfileRepositoryError, SalonRepository, SalonRepositoryError, SignUpGrant,
};
use crate::domain::{
    AuthTokens, Booking, BookingId, BookingStatus, BookingWithSalon, Email, Favorite, FavoriteSalon,
    LoginCredentials, NewBooking, NewFavorite, NewSalon, ProfileRecord, Role, Salon, SalonId,
    SalonSummary, SignupRequest, UserId,
};

/// Number of calls each backend operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub sign_in: usize,
    pub sign_up: usize,
    pub sign_out: usize,
    pub profile_reads: usize,
    pub profile_writes: usize,
    pub salon_inserts: usize,
    pub booking_inserts: usize,
    pub booking_updates: usize,
    pub favorite_writes: usize,
    pub uploads: usize,
}

#[derive(Debug, Clone)]
struct Account {
    user_id: UserId,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    profiles: HashMap<String, ProfileRecord>,
    salons: Vec<Salon>,
    bookings: Vec<Booking>,
    favorites: Vec<Favorite>,
    objects: HashMap<String, (Vec<u8>, String)>,
    revoked_tokens: Vec<String>,
    bearer: Option<String>,
    calls: CallCounts,
    next_id: u64,
    offline: bool,
    confirm_email: bool,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn issue_tokens(&mut self) -> AuthTokens {
        let access = self.next_id("access");
        let refresh = self.next_id("refresh");
        AuthTokens::new(access).with_refresh_token(Some(refresh))
    }
}

/// Backend double implementing every backend port.
#[derive(Debug, Default)]
pub struct InMemoryBackend(Mutex<State>);

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a confirmed account and its profile row.
    pub fn with_account(&self, name: &str, email: &str, password: &str, role: Role) -> UserId {
        let email = match Email::new(email) {
            Ok(email) => email,
            Err(err) => panic!("fixture email must be valid: {err}"),
        };
        let mut state = self.state();
        let user_id = match UserId::new(state.next_id("user")) {
            Ok(id) => id,
            Err(err) => panic!("generated id must be valid: {err}"),
        };
        state.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_owned(),
            },
        );
        state.profiles.insert(
            user_id.to_string(),
            ProfileRecord::for_new_account(&user_id, name, &email, role),
        );
        user_id
    }

    /// Seed the salon table, oldest first.
    pub fn with_salons(&self, salons: Vec<Salon>) {
        self.state().salons.extend(salons);
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Require e-mail confirmation before signups receive a session.
    pub fn set_email_confirmation(&self, required: bool) {
        self.state().confirm_email = required;
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn salons(&self) -> Vec<Salon> {
        self.state().salons.clone()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state().bookings.clone()
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        self.state().favorites.clone()
    }

    pub fn profile(&self, id: &UserId) -> Option<ProfileRecord> {
        self.state().profiles.get(id.as_ref()).cloned()
    }

    pub fn remove_profile(&self, id: &UserId) {
        self.state().profiles.remove(id.as_ref());
    }

    /// Overwrite the stored role, as an administrator might.
    pub fn set_profile_role(&self, id: &UserId, role: Role) {
        if let Some(profile) = self.state().profiles.get_mut(id.as_ref()) {
            profile.role = Some(role.as_str().to_owned());
        }
    }

    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.state().objects.get(path).cloned()
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.state().revoked_tokens.clone()
    }

    /// Token the auth state holder last handed over, if any.
    pub fn bearer(&self) -> Option<String> {
        self.state().bearer.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        match self.0.lock() {
            Ok(state) => state,
            Err(_) => panic!("in-memory backend mutex poisoned"),
        }
    }

    fn online(&self) -> Result<MutexGuard<'_, State>, String> {
        let state = self.state();
        if state.offline {
            return Err("backend unreachable".to_owned());
        }
        Ok(state)
    }
}

#[async_trait]
impl AuthGateway for InMemoryBackend {
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthGrant, AuthGatewayError> {
        let mut state = self.online().map_err(AuthGatewayError::connection)?;
        state.calls.sign_in += 1;
        let account = state
            .accounts
            .get(credentials.email().as_ref())
            .filter(|account| account.password == credentials.password())
            .cloned()
            .ok_or_else(|| AuthGatewayError::rejected("Invalid login credentials"))?;
        let tokens = state.issue_tokens();
        Ok(AuthGrant {
            user_id: account.user_id,
            email: credentials.email().clone(),
            tokens,
        })
    }

    async fn sign_up(&self, request: &SignupRequest) -> Result<SignUpGrant, AuthGatewayError> {
        let mut state = self.online().map_err(AuthGatewayError::connection)?;
        state.calls.sign_up += 1;
        let email = request.credentials().email().clone();
        if state.accounts.contains_key(email.as_ref()) {
            return Err(AuthGatewayError::rejected("User already registered"));
        }
        let user_id = UserId::new(state.next_id("user"))
            .map_err(|err| AuthGatewayError::unexpected(err.to_string()))?;
        state.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: request.credentials().password().to_owned(),
            },
        );
        let tokens = if state.confirm_email {
            None
        } else {
            Some(state.issue_tokens())
        };
        Ok(SignUpGrant {
            user_id,
            email,
            tokens,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthGatewayError> {
        let mut state = self.online().map_err(AuthGatewayError::connection)?;
        state.calls.sign_out += 1;
        state.revoked_tokens.push(access_token.to_owned());
        Ok(())
    }

    fn adopt_access_token(&self, access_token: Option<Zeroizing<String>>) {
        self.state().bearer = access_token.map(|token| token.as_str().to_owned());
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn fetch_by_id(&self, id: &UserId) -> Result<Option<ProfileRecord>, ProfileRepositoryError> {
        let mut state = self.online().map_err(ProfileRepositoryError::connection)?;
        state.calls.profile_reads += 1;
        Ok(state.profiles.get(id.as_ref()).cloned())
    }

    async fn upsert(&self, profile: &ProfileRecord) -> Result<(), ProfileRepositoryError> {
        let mut state = self.online().map_err(ProfileRepositoryError::connection)?;
        state.calls.profile_writes += 1;
        state.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn update_full_name(&self, id: &UserId, full_name: &str) -> Result<(), ProfileRepositoryError> {
        let mut state = self.online().map_err(ProfileRepositoryError::connection)?;
        state.calls.profile_writes += 1;
        let profile = state
            .profiles
            .get_mut(id.as_ref())
            .ok_or_else(|| ProfileRepositoryError::not_found(id.to_string()))?;
        profile.full_name = Some(full_name.to_owned());
        Ok(())
    }

    async fn update_avatar_url(&self, id: &UserId, avatar_url: &str) -> Result<(), ProfileRepositoryError> {
        let mut state = self.online().map_err(ProfileRepositoryError::connection)?;
        state.calls.profile_writes += 1;
        let profile = state
            .profiles
            .get_mut(id.as_ref())
            .ok_or_else(|| ProfileRepositoryError::not_found(id.to_string()))?;
        profile.avatar_url = Some(avatar_url.to_owned());
        Ok(())
    }
}

#[async_trait]
impl SalonRepository for InMemoryBackend {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Salon>, SalonRepositoryError> {
        let state = self.online().map_err(SalonRepositoryError::connection)?;
        Ok(state.salons.iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_id(&self, id: &SalonId) -> Result<Option<Salon>, SalonRepositoryError> {
        let state = self.online().map_err(SalonRepositoryError::connection)?;
        Ok(state.salons.iter().find(|salon| &salon.id == id).cloned())
    }

    async fn insert(&self, salon: &NewSalon) -> Result<Salon, SalonRepositoryError> {
        let mut state = self.online().map_err(SalonRepositoryError::connection)?;
        state.calls.salon_inserts += 1;
        let id = SalonId::new(state.next_id("salon"))
            .map_err(|err| SalonRepositoryError::query(err.to_string()))?;
        let stored = Salon {
            id,
            name: salon.name.clone(),
            description: salon.description.clone(),
            location: salon.location.clone(),
            image_url: salon.image_url.clone(),
            rating: salon.rating,
            services: salon.services.clone(),
            coordinates: None,
            created_at: None,
            updated_at: None,
        };
        state.salons.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl BookingRepository for InMemoryBackend {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<BookingWithSalon>, BookingRepositoryError> {
        let state = self.online().map_err(BookingRepositoryError::connection)?;
        let mut rows: Vec<BookingWithSalon> = state
            .bookings
            .iter()
            .filter(|booking| booking.user_id.as_ref() == Some(user))
            .map(|booking| BookingWithSalon {
                booking: booking.clone(),
                salon: booking.salon_id.as_ref().and_then(|salon_id| {
                    state
                        .salons
                        .iter()
                        .find(|salon| &salon.id == salon_id)
                        .map(|salon| SalonSummary {
                            name: salon.name.clone(),
                            location: salon.location.clone(),
                        })
                }),
            })
            .collect();
        rows.sort_by(|a, b| b.booking.booking_date.cmp(&a.booking.booking_date));
        Ok(rows)
    }

    async fn insert(&self, booking: &NewBooking) -> Result<Booking, BookingRepositoryError> {
        let mut state = self.online().map_err(BookingRepositoryError::connection)?;
        state.calls.booking_inserts += 1;
        let id = BookingId::new(state.next_id("booking"))
            .map_err(|err| BookingRepositoryError::query(err.to_string()))?;
        let stored = Booking {
            id,
            user_id: Some(booking.user_id.clone()),
            salon_id: Some(booking.salon_id.clone()),
            service: booking.service.clone(),
            booking_date: booking.booking_date,
            status: booking.status,
            created_at: None,
            updated_at: None,
        };
        state.bookings.push(stored.clone());
        Ok(stored)
    }

    async fn update_status(
        &self,
        user: &UserId,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, BookingRepositoryError> {
        let mut state = self.online().map_err(BookingRepositoryError::connection)?;
        state.calls.booking_updates += 1;
        let booking = state
            .bookings
            .iter_mut()
            .find(|booking| &booking.id == id && booking.user_id.as_ref() == Some(user))
            .ok_or_else(|| BookingRepositoryError::not_found(id.to_string()))?;
        booking.status = status;
        Ok(booking.clone())
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryBackend {
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<FavoriteSalon>, FavoriteRepositoryError> {
        let state = self.online().map_err(FavoriteRepositoryError::connection)?;
        Ok(state
            .favorites
            .iter()
            .rev()
            .filter(|favorite| favorite.user_id.as_ref() == Some(user))
            .map(|favorite| FavoriteSalon {
                favorite: favorite.clone(),
                salon: favorite.salon_id.as_ref().and_then(|salon_id| {
                    state.salons.iter().find(|salon| &salon.id == salon_id).cloned()
                }),
            })
            .collect())
    }

    async fn add(&self, favorite: &NewFavorite) -> Result<Favorite, FavoriteRepositoryError> {
        let mut state = self.online().map_err(FavoriteRepositoryError::connection)?;
        state.calls.favorite_writes += 1;
        let duplicate = state.favorites.iter().any(|existing| {
            existing.user_id.as_ref() == Some(&favorite.user_id)
                && existing.salon_id.as_ref() == Some(&favorite.salon_id)
        });
        if duplicate {
            return Err(FavoriteRepositoryError::rejected(
                "duplicate key value violates unique constraint",
            ));
        }
        let stored = Favorite {
            id: state.next_id("favorite"),
            user_id: Some(favorite.user_id.clone()),
            salon_id: Some(favorite.salon_id.clone()),
            created_at: None,
        };
        state.favorites.push(stored.clone());
        Ok(stored)
    }

    async fn remove(&self, user: &UserId, salon: &SalonId) -> Result<(), FavoriteRepositoryError> {
        let mut state = self.online().map_err(FavoriteRepositoryError::connection)?;
        state.calls.favorite_writes += 1;
        state.favorites.retain(|favorite| {
            favorite.user_id.as_ref() != Some(user) || favorite.salon_id.as_ref() != Some(salon)
        });
        Ok(())
    }
}

#[async_trait]
impl AvatarStorage for InMemoryBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AvatarStorageError> {
        let mut state = self.online().map_err(AvatarStorageError::connection)?;
        state.calls.uploads += 1;
        if state.objects.contains_key(path) {
            return Err(AvatarStorageError::rejected("The resource already exists"));
        }
        state
            .objects
            .insert(path.to_owned(), (bytes, content_type.to_owned()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://backend.test/storage/v1/object/public/avatars/{path}")
    }
}
