//! Salon owners register new salons through the listing form.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use super::ports::{Notifier, SalonRepository};
use super::{AuthSession, Error, ListingValidationError, Notification, Role, Salon, SalonListingForm};

#[derive(Clone)]
pub struct SalonListingService {
    session: Arc<AuthSession>,
    salons: Arc<dyn SalonRepository>,
    notifier: Arc<dyn Notifier>,
}

impl SalonListingService {
    pub fn new(
        session: Arc<AuthSession>,
        salons: Arc<dyn SalonRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            salons,
            notifier,
        }
    }

    /// Validate `form` and insert one salon.
    ///
    /// Only salon owners may submit. Field errors come back together in the
    /// error details under `fields`. The form is borrowed so a failed
    /// submission can be corrected and retried.
    pub async fn submit(&self, form: &SalonListingForm) -> Result<Salon, Error> {
        self.session.require_role(Role::SalonOwner)?;
        let salon = match form.validate() {
            Ok(salon) => salon,
            Err(err) => {
                self.notifier.notify(Notification::destructive(
                    "Please fix the highlighted fields",
                    err.to_string(),
                ));
                return Err(field_errors(&err));
            }
        };

        match self.salons.insert(&salon).await {
            Ok(stored) => {
                info!(salon_id = %stored.id, name = %stored.name, "salon listed");
                self.notifier.notify(Notification::info(
                    "Salon Registration Successful",
                    "We'll review your application and get back to you soon.",
                ));
                Ok(stored)
            }
            Err(err) => {
                warn!(error = %err, "salon listing insert failed");
                self.notifier.notify(Notification::destructive(
                    "Error",
                    "Failed to register salon. Please try again.",
                ));
                Err(err.into())
            }
        }
    }
}

fn field_errors(err: &ListingValidationError) -> Error {
    let fields: Vec<Value> = err
        .0
        .iter()
        .map(|field| json!({ "field": field.field, "message": field.message }))
        .collect();
    Error::invalid_request(err.to_string()).with_details(json!({ "fields": fields }))
}
