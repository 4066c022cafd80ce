//! Command-line surface.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{Coordinates, Role, Route};

/// `beautycut` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "beautycut",
    about = "Browse salons, manage bookings and favourites, and list a salon",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Role accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RoleArg {
    #[default]
    User,
    SalonOwner,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::User => Self::User,
            RoleArg::SalonOwner => Self::SalonOwner,
        }
    }
}

/// Credentials for commands that act as a signed-in user.
#[derive(Debug, Clone, Default, Args)]
pub struct LoginArgs {
    #[arg(long, env = "BEAUTYCUT_EMAIL")]
    pub email: Option<String>,
    #[arg(long, env = "BEAUTYCUT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, value_enum, default_value_t = RoleArg::User)]
    pub role: RoleArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortArg {
    #[default]
    Name,
    Rating,
    Distance,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Browse the salon catalogue, or show the featured salons.
    Salons {
        /// Show the landing-page selection instead of the full catalogue.
        #[arg(long)]
        featured: bool,
        /// Match against salon name, location and services.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
        /// Origin for distance sorting as `lat,lng`.
        #[arg(long, value_name = "lat,lng", value_parser = parse_coordinates)]
        near: Option<Coordinates>,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Show one salon.
    Salon { id: String },
    /// Create an account.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BEAUTYCUT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
    },
    /// Check credentials and show the signed-in user.
    Login {
        #[command(flatten)]
        login: LoginArgs,
    },
    /// List your bookings.
    Bookings {
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Book a service at a salon.
    Book {
        #[arg(long)]
        salon: String,
        #[arg(long)]
        service: String,
        /// Appointment time, RFC 3339 or `YYYY-MM-DD HH:MM` in UTC.
        #[arg(long, value_parser = parse_booking_date)]
        at: Option<DateTime<Utc>>,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Cancel one of your bookings.
    CancelBooking {
        id: String,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// List your favourite salons.
    Favorites {
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Add or remove a favourite salon.
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
    /// Show or edit your profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Register a salon from a JSON listing form.
    ListSalon {
        /// Path to the listing form JSON file.
        form: PathBuf,
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Show every page route and whether the given user may open it.
    Routes {
        #[command(flatten)]
        login: LoginArgs,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum FavoriteAction {
    Add {
        salon: String,
        #[command(flatten)]
        login: LoginArgs,
    },
    Remove {
        salon: String,
        #[command(flatten)]
        login: LoginArgs,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileAction {
    Show {
        #[command(flatten)]
        login: LoginArgs,
    },
    Rename {
        name: String,
        #[command(flatten)]
        login: LoginArgs,
    },
    Avatar {
        /// Image file to upload.
        file: PathBuf,
        #[command(flatten)]
        login: LoginArgs,
    },
}

impl Command {
    /// Page route whose access rules gate this command.
    pub fn route(&self) -> Route {
        match self {
            Self::Salons { .. } | Self::Salon { .. } => Route::Salons,
            Self::Signup { .. } | Self::Login { .. } => Route::Signup,
            Self::Bookings { .. } | Self::Book { .. } | Self::CancelBooking { .. } => {
                Route::Bookings
            }
            Self::Favorites { .. } | Self::Favorite { .. } => Route::Favorites,
            Self::Profile { .. } => Route::Profile,
            Self::ListSalon { .. } => Route::ListSalon,
            Self::Routes { .. } => Route::Home,
        }
    }

    /// Credentials supplied with the command, if it accepts any.
    pub fn login(&self) -> Option<&LoginArgs> {
        match self {
            Self::Salons { login, .. }
            | Self::Login { login }
            | Self::Bookings { login }
            | Self::Book { login, .. }
            | Self::CancelBooking { login, .. }
            | Self::Favorites { login }
            | Self::ListSalon { login, .. }
            | Self::Routes { login }
            | Self::Favorite {
                action: FavoriteAction::Add { login, .. } | FavoriteAction::Remove { login, .. },
            }
            | Self::Profile {
                action:
                    ProfileAction::Show { login }
                    | ProfileAction::Rename { login, .. }
                    | ProfileAction::Avatar { login, .. },
            } => Some(login),
            Self::Salon { .. } | Self::Signup { .. } => None,
        }
    }
}

fn parse_coordinates(raw: &str) -> Result<Coordinates, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| "coordinates must be `lat,lng`".to_owned())?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|err| format!("latitude: {err}"))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|err| format!("longitude: {err}"))?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err("coordinates out of range".to_owned());
    }
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

fn parse_booking_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("expected RFC 3339 or `YYYY-MM-DD HH:MM`: {err}"))
}
