/// Per-room broadcast hubs.
pub mod feed;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::competition_store::CompetitionStore, error::ServiceError};

pub use self::feed::RoomFeeds;

/// State handle shared by handlers, services and background tasks.
pub type SharedState = Arc<AppState>;

/// Events buffered per room feed before slow subscribers start skipping.
const FEED_CAPACITY: usize = 64;

/// Central application state: storage handle, configuration and room feeds.
pub struct AppState {
    competition_store: RwLock<Option<Arc<dyn CompetitionStore>>>,
    config: AppConfig,
    feeds: RoomFeeds,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            competition_store: RwLock::new(None),
            config,
            feeds: RoomFeeds::new(FEED_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Construct a state with a store already installed, out of degraded mode.
    pub fn with_store(config: AppConfig, store: Arc<dyn CompetitionStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        Arc::new(Self {
            competition_store: RwLock::new(Some(store)),
            config,
            feeds: RoomFeeds::new(FEED_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Per-room change feeds.
    pub fn feeds(&self) -> &RoomFeeds {
        &self.feeds
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn competition_store(&self) -> Option<Arc<dyn CompetitionStore>> {
        let guard = self.competition_store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle for a request, or [`ServiceError::Degraded`] while storage is down.
    pub async fn require_store(&self) -> Result<Arc<dyn CompetitionStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.competition_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn CompetitionStore>) {
        {
            let mut guard = self.competition_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::competition_store::memory::MemoryCompetitionStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state
            .set_store(Arc::new(MemoryCompetitionStore::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(watcher.has_changed().expect("sender alive"));
        assert!(state.require_store().await.is_ok());
    }

    #[tokio::test]
    async fn degraded_flag_hides_an_installed_store() {
        let state = AppState::with_store(
            AppConfig::default(),
            Arc::new(MemoryCompetitionStore::new()),
        );
        state.update_degraded(true).await;
        assert!(state.require_store().await.is_err());
    }
}
