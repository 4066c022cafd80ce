//! Salon catalogue model.
//!
//! Services are stored in a single structured schema. Rows written by older
//! clients hold plain service names; those are read as offerings carrying only
//! a name, and every write uses the structured form.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Mean Earth radius used for distance sorting, in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Opaque salon identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SalonId(String);

/// Error returned for blank identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier must not be blank")]
pub struct BlankIdError;

impl SalonId {
    /// Validate and construct a [`SalonId`].
    pub fn new(id: impl Into<String>) -> Result<Self, BlankIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(BlankIdError);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for SalonId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SalonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<SalonId> for String {
    fn from(value: SalonId) -> Self {
        value.0
    }
}

impl TryFrom<String> for SalonId {
    type Error = BlankIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// WGS84 position of a salon or of the browsing user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(self, other: Self) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// One bookable service offered by a salon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ServiceOfferingDto")]
pub struct ServiceOffering {
    pub name: String,
    /// Price in whole currency units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
    /// Duration in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub experts: Vec<String>,
}

impl ServiceOffering {
    /// Offering known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: None,
            duration: None,
            description: None,
            experts: Vec::new(),
        }
    }

    /// Fully priced offering.
    pub fn priced(name: impl Into<String>, price: u32, duration: u32) -> Self {
        Self {
            price: Some(price),
            duration: Some(duration),
            ..Self::named(name)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServiceOfferingDto {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, deserialize_with = "lenient_amount")]
        price: Option<u32>,
        #[serde(default, deserialize_with = "lenient_amount")]
        duration: Option<u32>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        experts: Option<Vec<String>>,
    },
}

impl From<ServiceOfferingDto> for ServiceOffering {
    fn from(value: ServiceOfferingDto) -> Self {
        match value {
            ServiceOfferingDto::Name(name) => Self::named(name),
            ServiceOfferingDto::Detailed {
                name,
                price,
                duration,
                description,
                experts,
            } => Self {
                name,
                price,
                duration,
                description,
                experts: experts.unwrap_or_default(),
            },
        }
    }
}

/// Price or duration as stored by older listing forms: a number, a numeric
/// string, or display text such as `"₹500"` and `"45 mins"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseAmount {
    Whole(u64),
    Fractional(f64),
    Text(String),
}

impl LooseAmount {
    fn whole(self) -> Option<u32> {
        match self {
            Self::Whole(value) => u32::try_from(value).ok(),
            Self::Fractional(_) => None,
            Self::Text(text) => leading_whole_number(&text),
        }
    }
}

/// First run of digits in `text`, ignoring `,` group separators. `None` when
/// there is none, when it does not fit a `u32`, or when it is the integral
/// part of a decimal.
fn leading_whole_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let tail = text.get(start..)?;
    let end = tail
        .find(|c: char| !c.is_ascii_digit() && c != ',')
        .unwrap_or(tail.len());
    let (run, rest) = tail.split_at(end);
    let decimal = rest
        .strip_prefix('.')
        .is_some_and(|fraction| fraction.starts_with(|c: char| c.is_ascii_digit()));
    if decimal {
        return None;
    }
    run.chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()
}

/// Unreadable amounts become `None` rather than failing the whole row.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseAmount>::deserialize(deserializer)?.and_then(LooseAmount::whole))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Row of the `salons` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salon {
    pub id: SalonId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub services: Vec<ServiceOffering>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Salon {
    /// Whether the salon lists a service with this name (case-insensitive).
    pub fn offers(&self, service: &str) -> bool {
        let wanted = service.trim();
        self.services
            .iter()
            .any(|offering| offering.name.trim().eq_ignore_ascii_case(wanted))
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.location.to_lowercase().contains(needle)
            || self
                .services
                .iter()
                .any(|offering| offering.name.to_lowercase().contains(needle))
    }
}

/// Insert payload for the `salons` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSalon {
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub image_url: Option<String>,
    pub rating: Option<f32>,
    pub services: Vec<ServiceOffering>,
}

/// Ordering applied when browsing salons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SalonSort {
    /// Alphabetical by name.
    #[default]
    Name,
    /// Highest rating first; unrated salons last.
    Rating,
    /// Nearest to the origin first; salons without coordinates last.
    Distance { origin: Coordinates },
}

/// Search and sort options for the salon browser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalonQuery {
    pub search: Option<String>,
    pub sort: SalonSort,
}

impl SalonQuery {
    /// Filter and order `salons` according to this query.
    ///
    /// # Examples
    /// ```
    /// use beautycut::domain::{SalonQuery, SalonSort, default_salons};
    ///
    /// let query = SalonQuery { search: Some("facial".into()), sort: SalonSort::Name };
    /// let names: Vec<_> = query.apply(default_salons()).into_iter().map(|s| s.name).collect();
    /// assert_eq!(names, ["Elite Cuts", "Glamour Zone"]);
    /// ```
    pub fn apply(&self, salons: Vec<Salon>) -> Vec<Salon> {
        let needle = self
            .search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());
        let mut filtered: Vec<Salon> = match needle {
            Some(needle) => salons
                .into_iter()
                .filter(|salon| salon.matches(&needle))
                .collect(),
            None => salons,
        };

        match self.sort {
            SalonSort::Name => filtered.sort_by_key(|salon| salon.name.to_lowercase()),
            SalonSort::Rating => filtered.sort_by(|a, b| compare_desc(a.rating, b.rating)),
            SalonSort::Distance { origin } => filtered.sort_by(|a, b| {
                let da = a.coordinates.map(|c| origin.distance_km(c));
                let db = b.coordinates.map(|c| origin.distance_km(c));
                compare_asc(da, db)
            }),
        }
        filtered
    }
}

fn compare_desc(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_asc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Salons shown when the backend has none to offer or cannot be reached.
pub fn default_salons() -> Vec<Salon> {
    let salon = |id: &str,
                 name: &str,
                 image: &str,
                 rating: f32,
                 location: &str,
                 services: [&str; 3],
                 blurb: &str,
                 coordinates: Coordinates| Salon {
        id: SalonId(id.to_owned()),
        name: name.to_owned(),
        description: Some(blurb.to_owned()),
        location: location.to_owned(),
        image_url: Some(image.to_owned()),
        rating: Some(rating),
        services: services.into_iter().map(ServiceOffering::named).collect(),
        coordinates: Some(coordinates),
        created_at: None,
        updated_at: None,
    };
    vec![
        salon(
            "1",
            "Style Studio",
            "https://images.unsplash.com/photo-1560066984-138dadb4c035?auto=format&fit=crop&w=800&q=80",
            4.8,
            "Banjara Hills, Hyderabad",
            ["Haircut", "Color", "Styling"],
            "Premium salon services",
            Coordinates { latitude: 17.4256, longitude: 78.4539 },
        ),
        salon(
            "2",
            "Glamour Zone",
            "https://images.unsplash.com/photo-1522337360788-8b13dee7a37e?auto=format&fit=crop&w=800&q=80",
            4.9,
            "Jubilee Hills, Hyderabad",
            ["Facial", "Massage", "Nails"],
            "Luxury beauty services",
            Coordinates { latitude: 17.4326, longitude: 78.4071 },
        ),
        salon(
            "3",
            "Elite Cuts",
            "https://images.unsplash.com/photo-1633681926022-84c23e8cb2d6?auto=format&fit=crop&w=800&q=80",
            4.7,
            "Indiranagar, Bangalore",
            ["Haircut", "Beard Trim", "Facial"],
            "Premium grooming services",
            Coordinates { latitude: 12.9716, longitude: 77.6441 },
        ),
    ]
}
