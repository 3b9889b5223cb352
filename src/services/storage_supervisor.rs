use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{competition_store::CompetitionStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Exponential backoff capped at [`MAX_DELAY`].
struct Backoff {
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            delay: INITIAL_DELAY,
        }
    }

    fn reset(&mut self) {
        self.delay = INITIAL_DELAY;
    }

    async fn wait(&mut self) {
        sleep(self.delay).await;
        self.delay = (self.delay * 2).min(MAX_DELAY);
    }
}

/// Connect to the storage backend, watch its health and keep the shared state in
/// degraded mode while it is unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CompetitionStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                backoff.reset();

                watch_health(&state, store.as_ref()).await;
                warn!("exhausted storage reconnect attempts; connecting from scratch");
                backoff.wait().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                backoff.wait().await;
            }
        }
    }
}

/// Poll the store until it fails and cannot be revived in place.
async fn watch_health(state: &SharedState, store: &dyn CompetitionStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, store).await {
                    return;
                }
                state.update_degraded(false).await;
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &dyn CompetitionStore) -> bool {
    let mut backoff = Backoff::new();

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "storage reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                backoff.wait().await;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{
        config::AppConfig, dao::competition_store::memory::MemoryCompetitionStore,
        state::AppState,
    };

    #[tokio::test]
    async fn leaves_degraded_mode_once_connected() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let handle = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StorageError::unavailable(
                        "first attempt".into(),
                        std::io::Error::other("refused"),
                    ))
                } else {
                    Ok(Arc::new(MemoryCompetitionStore::new()) as Arc<dyn CompetitionStore>)
                }
            }
        }));

        tokio::time::timeout(Duration::from_secs(5), watcher.wait_for(|degraded| !degraded))
            .await
            .expect("supervisor connected in time")
            .expect("sender alive");
        assert!(attempts.load(Ordering::SeqCst) >= 2);
        assert!(state.require_store().await.is_ok());

        handle.abort();
    }
}
