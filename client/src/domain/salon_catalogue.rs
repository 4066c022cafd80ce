//! Read side of the salon catalogue.
//!
//! The built-in [`default_salons`] stand in whenever the backend has no
//! salons to show, so the landing page is never empty.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::SalonRepository;
use super::{Error, Salon, SalonId, SalonQuery, default_salons};

/// Default number of salons on the landing page.
pub const DEFAULT_FEATURED_LIMIT: usize = 6;

/// Upper bound on rows fetched for the browse page.
pub const BROWSE_LIMIT: usize = 200;

#[derive(Clone)]
pub struct SalonCatalogue {
    salons: Arc<dyn SalonRepository>,
    featured_limit: usize,
}

impl SalonCatalogue {
    pub fn new(salons: Arc<dyn SalonRepository>, featured_limit: usize) -> Self {
        Self {
            salons,
            featured_limit,
        }
    }

    /// Newest salons, or the built-in ones when the backend fails or is
    /// empty.
    pub async fn featured(&self) -> Vec<Salon> {
        match self.salons.list_recent(self.featured_limit).await {
            Ok(salons) if !salons.is_empty() => salons,
            Ok(_) => {
                debug!("no salons stored; showing built-in salons");
                default_salons()
            }
            Err(err) => {
                warn!(error = %err, "featured salons unavailable; showing built-in salons");
                default_salons()
            }
        }
    }

    /// Search and sort the catalogue.
    pub async fn browse(&self, query: &SalonQuery) -> Result<Vec<Salon>, Error> {
        let mut salons = self.salons.list_recent(BROWSE_LIMIT).await?;
        if salons.is_empty() {
            salons = default_salons();
        }
        Ok(query.apply(salons))
    }

    /// One salon by id. Built-in salons resolve even when not stored.
    pub async fn details(&self, id: &SalonId) -> Result<Salon, Error> {
        if let Some(salon) = self.salons.find_by_id(id).await? {
            return Ok(salon);
        }
        default_salons()
            .into_iter()
            .find(|salon| &salon.id == id)
            .ok_or_else(|| Error::not_found(format!("salon {id} not found")))
    }
}

impl std::fmt::Debug for SalonCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalonCatalogue")
            .field("featured_limit", &self.featured_limit)
            .finish_non_exhaustive()
    }
}
