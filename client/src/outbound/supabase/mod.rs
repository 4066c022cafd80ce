//! Adapters for the hosted backend-as-a-service.
//!
//! One [`SupabaseConnection`] is shared by every adapter. The auth gateway
//! stores the signed-in user's access token on it; the table and storage
//! adapters send that token so row-level policies apply to the right user.

mod auth;
mod connection;
mod dto;
mod http;
mod rest;
mod storage;

pub use auth::SupabaseAuthGateway;
pub use connection::SupabaseConnection;
pub use rest::{
    SupabaseBookingRepository, SupabaseFavoriteRepository, SupabaseProfileRepository,
    SupabaseSalonRepository,
};
pub use storage::SupabaseAvatarStorage;
