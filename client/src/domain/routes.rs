//! Client routes and their access gates.

use std::fmt;
use std::str::FromStr;

use super::session::AuthState;
use super::user::Role;

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    Authenticated,
    Role(Role),
}

/// Outcome of checking a route against the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// Anonymous visitor on a protected route.
    RequireLogin,
    /// Signed in, but with the wrong role.
    Forbidden,
}

/// Navigable pages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Salons,
    About,
    Signup,
    ListSalon,
    Profile,
    Bookings,
    Favorites,
    SalonAdmin,
}

impl Route {
    pub const ALL: [Self; 9] = [
        Self::Home,
        Self::Salons,
        Self::About,
        Self::Signup,
        Self::ListSalon,
        Self::Profile,
        Self::Bookings,
        Self::Favorites,
        Self::SalonAdmin,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Salons => "/salons",
            Self::About => "/about",
            Self::Signup => "/signup",
            Self::ListSalon => "/list-salon",
            Self::Profile => "/profile",
            Self::Bookings => "/bookings",
            Self::Favorites => "/favorites",
            Self::SalonAdmin => "/salon-admin",
        }
    }

    pub fn policy(self) -> AccessPolicy {
        match self {
            Self::Home | Self::Salons | Self::About | Self::Signup => AccessPolicy::Public,
            Self::Profile | Self::Bookings | Self::Favorites => AccessPolicy::Authenticated,
            Self::ListSalon | Self::SalonAdmin => AccessPolicy::Role(Role::SalonOwner),
        }
    }

    /// Decide whether `state` may open this route.
    ///
    /// # Examples
    /// ```
    /// use beautycut::domain::{AuthState, Route, RouteDecision};
    ///
    /// assert_eq!(Route::Salons.authorize(&AuthState::Anonymous), RouteDecision::Allow);
    /// assert_eq!(Route::Bookings.authorize(&AuthState::Anonymous), RouteDecision::RequireLogin);
    /// ```
    pub fn authorize(self, state: &AuthState) -> RouteDecision {
        match (self.policy(), state.user()) {
            (AccessPolicy::Public, _) => RouteDecision::Allow,
            (_, None) => RouteDecision::RequireLogin,
            (AccessPolicy::Authenticated, Some(_)) => RouteDecision::Allow,
            (AccessPolicy::Role(role), Some(user)) if user.role() == role => RouteDecision::Allow,
            (AccessPolicy::Role(_), Some(_)) => RouteDecision::Forbidden,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Path did not name a known route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no route matches `{path}`")]
pub struct UnknownRouteError {
    pub path: String,
}

impl FromStr for Route {
    type Err = UnknownRouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let normalised = match trimmed.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == normalised)
            .ok_or_else(|| UnknownRouteError {
                path: trimmed.to_owned(),
            })
    }
}
