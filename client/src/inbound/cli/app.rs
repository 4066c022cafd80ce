//! Command dispatch: sign in, gate by route, run, sign out.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::info;

use super::args::{Command, FavoriteAction, LoginArgs, ProfileAction, SortArg};
use super::{files, render};
use crate::domain::ports::{
    AuthGateway, AvatarStorage, BookingRepository, FavoriteRepository, Notifier,
    ProfileRepository, SalonRepository,
};
use crate::domain::{
    AuthSession, BookingId, BookingRequest, BookingService, Coordinates, Error, FavoritesService,
    Notification, ProfileService, Role, RouteDecision, SalonCatalogue, SalonId,
    SalonListingService, SalonQuery, SalonSort, SignupOutcome,
};

/// Backend ports the CLI runs against.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthGateway>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub salons: Arc<dyn SalonRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub avatars: Arc<dyn AvatarStorage>,
}

/// Tunables taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub signup_cooldown: Duration,
    pub featured_limit: usize,
}

/// Services wired around one [`AuthSession`].
pub struct CliApp {
    session: Arc<AuthSession>,
    catalogue: SalonCatalogue,
    bookings: BookingService,
    favorites: FavoritesService,
    profile: ProfileService,
    listing: SalonListingService,
    notifier: Arc<dyn Notifier>,
}

fn output(err: io::Error) -> Error {
    Error::internal(format!("write output: {err}"))
}

fn salon_id(raw: &str) -> Result<SalonId, Error> {
    SalonId::new(raw).map_err(|err| Error::invalid_request(format!("salon id: {err}")))
}

impl CliApp {
    pub fn new(
        backend: Backend,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        options: AppOptions,
    ) -> Self {
        let session = Arc::new(AuthSession::new(
            backend.auth,
            backend.profiles.clone(),
            notifier.clone(),
            clock.clone(),
            options.signup_cooldown,
        ));
        Self {
            catalogue: SalonCatalogue::new(backend.salons.clone(), options.featured_limit),
            bookings: BookingService::new(session.clone(), backend.bookings, notifier.clone(), clock),
            favorites: FavoritesService::new(session.clone(), backend.favorites, notifier.clone()),
            profile: ProfileService::new(
                session.clone(),
                backend.profiles,
                backend.avatars,
                notifier.clone(),
            ),
            listing: SalonListingService::new(session.clone(), backend.salons, notifier.clone()),
            session,
            notifier,
        }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Run one command.
    ///
    /// Credentials passed with the command sign in first and are signed out
    /// again afterwards, whatever the command's outcome.
    pub async fn run<W: Write + Send>(&self, command: Command, out: &mut W) -> Result<(), Error> {
        let signed_in = match command.login() {
            Some(login) if login.email.is_some() => {
                self.sign_in(login).await?;
                true
            }
            _ => false,
        };

        let result = match self.gate(&command) {
            Ok(()) => self.dispatch(command, out).await,
            Err(err) => Err(err),
        };

        if signed_in && self.session.state().is_authenticated() {
            self.session.logout().await;
        }
        result
    }

    async fn sign_in(&self, login: &LoginArgs) -> Result<(), Error> {
        let email = login.email.as_deref().unwrap_or_default();
        let password = login
            .password
            .as_deref()
            .ok_or_else(|| Error::invalid_request("--password is required with --email"))?;
        self.session.login(email, password, login.role.into()).await?;
        Ok(())
    }

    fn gate(&self, command: &Command) -> Result<(), Error> {
        let route = command.route();
        match route.authorize(&self.session.state()) {
            RouteDecision::Allow => Ok(()),
            RouteDecision::RequireLogin => Err(Error::unauthorized(format!(
                "{route} requires login; pass --email and --password"
            ))),
            RouteDecision::Forbidden => Err(Error::forbidden(format!(
                "your account cannot open {route}"
            ))),
        }
    }

    async fn dispatch<W: Write + Send>(&self, command: Command, out: &mut W) -> Result<(), Error> {
        match command {
            Command::Salons {
                featured,
                search,
                sort,
                near,
                ..
            } => {
                let salons = if featured {
                    self.catalogue.featured().await
                } else {
                    let query = SalonQuery {
                        search,
                        sort: self.sort(sort, near)?,
                    };
                    self.catalogue.browse(&query).await?
                };
                render::salons(out, &salons).map_err(output)
            }
            Command::Salon { id } => {
                let salon = self.catalogue.details(&salon_id(&id)?).await?;
                render::salon(out, &salon).map_err(output)
            }
            Command::Signup {
                name,
                email,
                password,
                role,
            } => self.signup(&name, &email, &password, role.into(), out).await,
            Command::Login { .. } => {
                let user = self.session.require_user()?;
                render::user(out, &user).map_err(output)
            }
            Command::Routes { .. } => render::routes(out, &self.session.state()).map_err(output),
            Command::Bookings { .. } => {
                let rows = self.bookings.my_bookings().await?;
                render::bookings(out, &rows).map_err(output)
            }
            Command::Book {
                salon, service, at, ..
            } => self.book(&salon, service, at, out).await,
            Command::CancelBooking { id, .. } => {
                let id = BookingId::new(id)
                    .map_err(|err| Error::invalid_request(format!("booking id: {err}")))?;
                let booking = self.bookings.cancel(&id).await?;
                writeln!(out, "Booking {} is {}", booking.id, booking.status).map_err(output)
            }
            Command::Favorites { .. } => {
                let rows = self.favorites.list().await?;
                render::favorites(out, &rows).map_err(output)
            }
            Command::Favorite { action } => self.favorite(action).await,
            Command::Profile { action } => self.profile(action, out).await,
            Command::ListSalon { form, .. } => {
                let form = files::read_listing_form(&form)?;
                let salon = self.listing.submit(&form).await?;
                render::salon(out, &salon).map_err(output)
            }
        }
    }

    /// Distance sorting needs a signed-in user; anonymous visitors get the
    /// default order and a prompt to sign up.
    fn sort(&self, sort: SortArg, near: Option<Coordinates>) -> Result<SalonSort, Error> {
        match sort {
            SortArg::Name => Ok(SalonSort::Name),
            SortArg::Rating => Ok(SalonSort::Rating),
            SortArg::Distance if !self.session.state().is_authenticated() => {
                self.notifier.notify(Notification::destructive(
                    "Sign Up Required",
                    "Please sign up to enable location-based sorting",
                ));
                Ok(SalonSort::Name)
            }
            SortArg::Distance => near
                .map(|origin| SalonSort::Distance { origin })
                .ok_or_else(|| Error::invalid_request("--near is required for distance sorting")),
        }
    }

    async fn signup<W: Write + Send>(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        out: &mut W,
    ) -> Result<(), Error> {
        match self.session.signup(name, email, password, role).await? {
            SignupOutcome::SignedIn(user) => {
                render::user(out, &user).map_err(output)?;
                self.session.logout().await;
                Ok(())
            }
            SignupOutcome::ConfirmationRequired => {
                writeln!(out, "Confirm your e-mail address, then log in.").map_err(output)
            }
        }
    }

    async fn book<W: Write + Send>(
        &self,
        salon: &str,
        service: String,
        at: Option<DateTime<Utc>>,
        out: &mut W,
    ) -> Result<(), Error> {
        let salon = self.catalogue.details(&salon_id(salon)?).await?;
        let mut request = BookingRequest::for_salon(&salon).with_service(service);
        request.booking_date = at;
        let booking = self.bookings.book(&request).await?;
        info!(booking_id = %booking.id, "booking submitted from cli");
        writeln!(
            out,
            "Booking {} for {} at {} is {}",
            booking.id,
            booking.service,
            salon.name,
            booking.status
        )
        .map_err(output)
    }

    async fn favorite(&self, action: FavoriteAction) -> Result<(), Error> {
        match action {
            FavoriteAction::Add { salon, .. } => {
                self.favorites.add(&salon_id(&salon)?).await?;
            }
            FavoriteAction::Remove { salon, .. } => {
                self.favorites.remove(&salon_id(&salon)?).await?;
            }
        }
        Ok(())
    }

    async fn profile<W: Write + Send>(&self, action: ProfileAction, out: &mut W) -> Result<(), Error> {
        match action {
            ProfileAction::Show { .. } => {
                let profile = self.profile.load().await?;
                render::profile(out, &profile).map_err(output)
            }
            ProfileAction::Rename { name, .. } => {
                let user = self.profile.rename(&name).await?;
                render::user(out, &user).map_err(output)
            }
            ProfileAction::Avatar { file, .. } => {
                let (file_name, bytes) = files::read_file(&file)?;
                let user = self.profile.upload_avatar(&file_name, bytes).await?;
                writeln!(out, "{}", user.avatar().unwrap_or_default()).map_err(output)
            }
        }
    }
}

impl std::fmt::Debug for CliApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliApp")
            .field("state", &self.session.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
