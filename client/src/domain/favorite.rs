//! Saved salons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::salon::{Salon, SalonId};
use super::user::UserId;

/// Row of the `favorites` join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    pub user_id: Option<UserId>,
    pub salon_id: Option<SalonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Favourite joined with the salon it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteSalon {
    #[serde(flatten)]
    pub favorite: Favorite,
    /// `None` when the salon has since been removed.
    #[serde(default)]
    pub salon: Option<Salon>,
}

/// Insert payload for the `favorites` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFavorite {
    pub user_id: UserId,
    pub salon_id: SalonId,
}
