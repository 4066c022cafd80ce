//! Salon listing form and its field constraints.
//!
//! The form collects every field error at once so the owner can fix them in a
//! single pass. A valid form turns into exactly one [`NewSalon`] insert.

use serde::{Deserialize, Serialize};
use url::Url;

use super::salon::{NewSalon, ServiceOffering};
use super::user::Email;

/// One service row on the listing form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingServiceEntry {
    pub name: String,
    pub price: u32,
    /// Duration in minutes.
    pub duration: u32,
    pub description: Option<String>,
}

/// Raw listing form values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalonListingForm {
    pub salon_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
    pub social_media: Option<String>,
    pub operating_hours: String,
    pub google_maps_link: Option<String>,
    pub image_url: Option<String>,
    pub services: Vec<ListingServiceEntry>,
    pub description: String,
    pub booking_policy: String,
    pub cancellation_policy: String,
    pub payment_methods: String,
    pub hygiene_measures: String,
    pub staff_profiles: Option<String>,
    pub accessibility: Option<String>,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors found on a listing form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("salon listing has {} invalid field(s)", .0.len())]
pub struct ListingValidationError(pub Vec<FieldError>);

impl ListingValidationError {
    /// Whether `field` was rejected.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

struct Checker(Vec<FieldError>);

impl Checker {
    fn min_len(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.0.push(FieldError::new(field, message));
        }
    }

    fn required(&mut self, field: &str, value: &str, message: &str) {
        self.min_len(field, value, 1, message);
    }

    fn optional_url(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return;
        };
        if Url::parse(value).is_err() {
            self.0.push(FieldError::new(field, "Must be a valid URL"));
        }
    }
}

impl SalonListingForm {
    /// Validate every field and build the insert payload.
    ///
    /// # Examples
    /// ```
    /// use beautycut::domain::SalonListingForm;
    ///
    /// let form = SalonListingForm {
    ///     salon_name: "Test Salon".into(),
    ///     ..SalonListingForm::default()
    /// };
    /// let err = form.validate().unwrap_err();
    /// assert!(err.has("address"));
    /// assert!(!err.has("salonName"));
    /// ```
    pub fn validate(&self) -> Result<NewSalon, ListingValidationError> {
        let mut check = Checker(Vec::new());
        check.min_len("salonName", &self.salon_name, 2, "Salon name must be at least 2 characters.");
        check.min_len("address", &self.address, 5, "Address must be at least 5 characters.");
        check.min_len("city", &self.city, 2, "City is required");
        check.min_len("state", &self.state, 2, "State is required");
        check.min_len("zipCode", &self.zip_code, 5, "Valid ZIP code is required");
        check.min_len("phone", &self.phone, 10, "Valid phone number is required");
        if Email::new(&self.email).is_err() {
            check.0.push(FieldError::new("email", "Valid email is required"));
        }
        check.optional_url("website", self.website.as_deref());
        check.optional_url("googleMapsLink", self.google_maps_link.as_deref());
        check.optional_url("imageUrl", self.image_url.as_deref());
        check.required("operatingHours", &self.operating_hours, "Operating hours are required");
        check.min_len("description", &self.description, 10, "Description must be at least 10 characters");
        check.required("bookingPolicy", &self.booking_policy, "Booking policy is required");
        check.required(
            "cancellationPolicy",
            &self.cancellation_policy,
            "Cancellation policy is required",
        );
        check.required("paymentMethods", &self.payment_methods, "Payment methods are required");
        check.required("hygieneMeasures", &self.hygiene_measures, "Hygiene measures are required");

        if self.services.is_empty() {
            check
                .0
                .push(FieldError::new("services", "At least one service is required"));
        }
        for (index, service) in self.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                check.0.push(FieldError::new(
                    format!("services.{index}.name"),
                    "Service name is required",
                ));
            }
            if service.price == 0 {
                check.0.push(FieldError::new(
                    format!("services.{index}.price"),
                    "Price must be greater than zero",
                ));
            }
            if service.duration == 0 {
                check.0.push(FieldError::new(
                    format!("services.{index}.duration"),
                    "Duration must be greater than zero",
                ));
            }
        }

        if !check.0.is_empty() {
            return Err(ListingValidationError(check.0));
        }

        Ok(NewSalon {
            name: self.salon_name.trim().to_owned(),
            description: Some(self.description.trim().to_owned()),
            location: self.location(),
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned),
            rating: None,
            services: self
                .services
                .iter()
                .map(|service| ServiceOffering {
                    description: service
                        .description
                        .as_deref()
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_owned),
                    ..ServiceOffering::priced(service.name.trim(), service.price, service.duration)
                })
                .collect(),
        })
    }

    fn location(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.address.trim(),
            self.city.trim(),
            self.state.trim(),
            self.zip_code.trim()
        )
    }
}
