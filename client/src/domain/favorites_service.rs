//! Saved-salon use-cases.

use std::sync::Arc;

use tracing::warn;

use super::ports::{FavoriteRepository, Notifier};
use super::{AuthSession, Error, Favorite, FavoriteSalon, NewFavorite, Notification, SalonId};

#[derive(Clone)]
pub struct FavoritesService {
    session: Arc<AuthSession>,
    favorites: Arc<dyn FavoriteRepository>,
    notifier: Arc<dyn Notifier>,
}

impl FavoritesService {
    pub fn new(
        session: Arc<AuthSession>,
        favorites: Arc<dyn FavoriteRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            favorites,
            notifier,
        }
    }

    pub async fn list(&self) -> Result<Vec<FavoriteSalon>, Error> {
        let user = self.session.require_user()?;
        Ok(self.favorites.list_for_user(user.id()).await?)
    }

    pub async fn add(&self, salon: &SalonId) -> Result<Favorite, Error> {
        let user = self.session.require_user()?;
        let request = NewFavorite {
            user_id: user.id().clone(),
            salon_id: salon.clone(),
        };
        match self.favorites.add(&request).await {
            Ok(favorite) => {
                self.notifier.notify(Notification::info(
                    "Added to favorites",
                    "You can find this salon on your Favorites page.",
                ));
                Ok(favorite)
            }
            Err(err) => {
                warn!(salon_id = %salon, error = %err, "adding favorite failed");
                self.notifier.notify(Notification::destructive(
                    "Error",
                    "Failed to update favorites. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    pub async fn remove(&self, salon: &SalonId) -> Result<(), Error> {
        let user = self.session.require_user()?;
        match self.favorites.remove(user.id(), salon).await {
            Ok(()) => {
                self.notifier.notify(Notification::info(
                    "Removed from favorites",
                    "The salon was removed from your favorites.",
                ));
                Ok(())
            }
            Err(err) => {
                warn!(salon_id = %salon, error = %err, "removing favorite failed");
                self.notifier.notify(Notification::destructive(
                    "Error",
                    "Failed to update favorites. Please try again.",
                ));
                Err(err.into())
            }
        }
    }

    /// Flip the favourite state of `salon`; returns whether it is now saved.
    pub async fn toggle(&self, salon: &SalonId) -> Result<bool, Error> {
        let saved = self
            .list()
            .await?
            .iter()
            .any(|row| row.favorite.salon_id.as_ref() == Some(salon));
        if saved {
            self.remove(salon).await?;
            Ok(false)
        } else {
            self.add(salon).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ErrorCode, Role, default_salons};
    use crate::test_support::{InMemoryBackend, MutableClock, RecordingNotifier};
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    async fn service() -> (FavoritesService, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.with_account("Asha", "asha@example.com", "secret1", Role::User);
        backend.with_salons(default_salons());
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Arc::new(AuthSession::new(
            backend.clone(),
            backend.clone(),
            notifier.clone(),
            Arc::new(MutableClock::default()),
            Duration::from_secs(40),
        ));
        session
            .login("asha@example.com", "secret1", Role::User)
            .await
            .expect("login");
        (FavoritesService::new(session, backend.clone(), notifier), backend)
    }

    fn salon(id: &str) -> SalonId {
        SalonId::new(id).expect("salon id")
    }

    #[rstest]
    #[tokio::test]
    async fn added_favorites_are_listed_with_their_salon(
        #[future] service: (FavoritesService, Arc<InMemoryBackend>),
    ) {
        let (service, _) = service.await;
        service.add(&salon("2")).await.expect("add");

        let rows = service.list().await.expect("list");

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows.first().and_then(|row| row.salon.as_ref()).map(|s| s.name.as_str()),
            Some("Glamour Zone")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn toggle_adds_then_removes(#[future] service: (FavoritesService, Arc<InMemoryBackend>)) {
        let (service, backend) = service.await;

        assert!(service.toggle(&salon("1")).await.expect("first toggle"));
        assert_eq!(backend.favorites().len(), 1);
        assert!(!service.toggle(&salon("1")).await.expect("second toggle"));
        assert!(backend.favorites().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_add_is_rejected(#[future] service: (FavoritesService, Arc<InMemoryBackend>)) {
        let (service, _) = service.await;
        service.add(&salon("3")).await.expect("first add");

        let err = service.add(&salon("3")).await.expect_err("duplicate");

        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
