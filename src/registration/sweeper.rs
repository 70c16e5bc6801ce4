//! Background expiry sweep
//!
//! Abandoned registration attempts are never consumed, so a periodic task
//! evicts them to keep the store from growing without bound.

use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::store::RegistrationSessionStore;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn a task that evicts expired registrations every `every`
///
/// Intervals shorter than one second are raised to one second. Abort the
/// returned handle to stop sweeping.
///
/// # Panics
/// Panics if called outside a tokio runtime
pub fn spawn_expiry_sweeper<O>(store: Arc<RegistrationSessionStore<O>>, every: Duration) -> JoinHandle<()>
where
    O: Send + Sync + 'static,
{
    let period = every.max(MIN_SWEEP_INTERVAL);
    info!("Starting registration expiry sweep every {period:?}");

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = store.evict_expired();
            if evicted > 0 {
                debug!(
                    "Expiry sweep removed {evicted} registrations, {} still pending",
                    store.pending_count()
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::clock::ManualClock;
    use crate::registration::store::RegistrationStoreConfig;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_sweeper_evicts_only_expired_entries() {
        let clock = Arc::new(ManualClock::default());
        let store: Arc<RegistrationSessionStore<u8>> = Arc::new(RegistrationSessionStore::with_clock(
            RegistrationStoreConfig {
                ttl: Duration::from_secs(60),
                max_pending: 10,
            },
            clock.clone(),
        ));

        store.begin("alice", "old", 1).unwrap();
        clock.advance(TimeDelta::seconds(90));
        let live = store.begin("bob", "new", 2).unwrap();

        let handle = spawn_expiry_sweeper(store.clone(), Duration::from_millis(10));

        // The first tick fires immediately
        for _ in 0..50 {
            if store.pending_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.metrics().evicted, 1);
        assert_eq!(store.consume(live.as_str()).unwrap().issued_options(), &2);
    }
}
