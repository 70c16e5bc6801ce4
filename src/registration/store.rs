//! Pending registration store
//!
//! Correlates a server-issued request identifier with the credential creation
//! options that were sent to the client. Every entry can be taken out exactly
//! once, and only until it expires.
//!
//! Entries live in a sharded concurrent map, so operations on different
//! request ids only contend when they hash to the same shard. The capacity
//! bound is a lock-free reservation counter: a slot is reserved before an
//! entry is inserted and released after it is removed, so the number of
//! stored entries never exceeds `max_pending`.
//!
//! A `begin` that finds the store full scans for expired entries at most
//! once per second; otherwise reclaiming is left to the expiry sweeper, so a
//! flood of rejected requests never rescans the map.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::errors::RegistrationError;
use super::metrics::{StoreMetrics, StoreMetricsSnapshot};
use super::pending::{PendingRegistration, RequestId};
use crate::webauthn::{generate_request_id, RegistrationOptions, WebAuthnError};

/// Fresh identifiers to try before treating collisions as a fault
const MAX_ID_ATTEMPTS: usize = 4;

/// Minimum spacing of the expiry scans a full store runs from `begin`
const RECLAIM_INTERVAL_MS: i64 = 1_000;

/// Default lifetime of a pending registration (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default bound on live pending registrations
pub const DEFAULT_MAX_PENDING: usize = 10_000;

/// Store limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationStoreConfig {
    /// How long an issued request stays consumable
    pub ttl: Duration,
    /// Maximum number of entries held at once
    pub max_pending: usize,
}

impl Default for RegistrationStoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

/// Generator of request identifier strings
pub type RequestIdSource = Arc<dyn Fn() -> Result<String, WebAuthnError> + Send + Sync>;

/// In-memory store of registration attempts awaiting a client response
pub struct RegistrationSessionStore<O = RegistrationOptions> {
    entries: DashMap<RequestId, PendingRegistration<O>>,
    reserved: AtomicUsize,
    last_reclaim_ms: AtomicI64,
    id_source: RequestIdSource,
    config: RegistrationStoreConfig,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    metrics: StoreMetrics,
}

impl<O> RegistrationSessionStore<O> {
    /// Create a store backed by the system clock
    #[must_use]
    pub fn new(config: RegistrationStoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store with an explicit time source
    #[must_use]
    pub fn with_clock(config: RegistrationStoreConfig, clock: Arc<dyn Clock>) -> Self {
        // A TTL too large for chrono is effectively "never"
        let ttl = TimeDelta::from_std(config.ttl).unwrap_or(TimeDelta::MAX);

        Self {
            entries: DashMap::new(),
            reserved: AtomicUsize::new(0),
            last_reclaim_ms: AtomicI64::new(i64::MIN),
            id_source: Arc::new(generate_request_id),
            config,
            ttl,
            clock,
            metrics: StoreMetrics::default(),
        }
    }

    /// Replace the request identifier generator
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_id_source(mut self, id_source: RequestIdSource) -> Self {
        self.id_source = id_source;
        self
    }

    #[must_use]
    pub fn config(&self) -> RegistrationStoreConfig {
        self.config
    }

    /// Number of entries currently held, live or awaiting eviction
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.reserved.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn metrics(&self) -> StoreMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Record a new registration attempt and return its identifier
    ///
    /// # Errors
    /// * `CapacityExceeded` if `max_pending` live entries are already held
    /// * `IdentifierGeneration` if no fresh, unused identifier could be made
    pub fn begin(
        &self,
        username: impl Into<String>,
        credential_nickname: impl Into<String>,
        issued_options: O,
    ) -> Result<RequestId, RegistrationError> {
        self.reserve_slot()?;

        match self.insert_fresh(username.into(), credential_nickname.into(), issued_options) {
            Ok(request_id) => {
                self.metrics.record_issued();
                debug!(
                    "Registration request {} issued ({} pending)",
                    request_id.log_prefix(),
                    self.pending_count()
                );
                Ok(request_id)
            }
            Err(e) => {
                self.release_slots(1);
                Err(e)
            }
        }
    }

    /// Take the registration issued under `request_id`
    ///
    /// The entry is removed whether or not it is still valid, so a request id
    /// can succeed at most once. Expiry is inclusive: at exactly `expires_at`
    /// the entry is already expired, matching `evict_expired`.
    ///
    /// # Errors
    /// * `UnknownRequest` if nothing is stored under `request_id`
    /// * `Expired` if the entry was found past its expiry
    pub fn consume(&self, request_id: &str) -> Result<PendingRegistration<O>, RegistrationError> {
        let Some((_, pending)) = self.entries.remove(request_id) else {
            self.metrics.record_unknown();
            debug!("Consume of unknown registration request");
            return Err(RegistrationError::UnknownRequest);
        };
        self.release_slots(1);

        if pending.is_expired_at(self.clock.now()) {
            self.metrics.record_expired();
            info!(
                "Registration request {} for {} expired at {}",
                pending.request_id().log_prefix(),
                pending.username(),
                pending.expires_at()
            );
            return Err(RegistrationError::Expired);
        }

        self.metrics.record_consumed();
        debug!(
            "Registration request {} consumed",
            pending.request_id().log_prefix()
        );
        Ok(pending)
    }

    /// Remove every entry whose expiry has passed
    ///
    /// Shards are locked one at a time, so `begin` and `consume` keep running
    /// against the rest of the map during a sweep.
    ///
    /// # Returns
    /// The number of entries removed
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0usize;

        self.entries.retain(|_, pending| {
            let live = !pending.is_expired_at(now);
            if !live {
                evicted += 1;
            }
            live
        });

        if evicted > 0 {
            self.release_slots(evicted);
            self.metrics.record_evicted(evicted);
            debug!("Evicted {evicted} expired registration requests");
        }
        evicted
    }

    fn reserve_slot(&self) -> Result<(), RegistrationError> {
        if self.try_reserve() {
            return Ok(());
        }

        // Abandoned attempts may still hold slots; only expired ones are dropped
        if self.claim_reclaim_scan() {
            self.metrics.record_reclaim_scan();
            if self.evict_expired() > 0 && self.try_reserve() {
                return Ok(());
            }
        }

        self.metrics.record_capacity_rejection();
        warn!(
            "Registration store at capacity ({} pending)",
            self.config.max_pending
        );
        Err(RegistrationError::CapacityExceeded {
            max_pending: self.config.max_pending,
        })
    }

    /// True for at most one caller per reclaim interval
    fn claim_reclaim_scan(&self) -> bool {
        let now = self.clock.now().timestamp_millis();
        let last = self.last_reclaim_ms.load(Ordering::Acquire);

        // A clock that went backwards does not block reclaiming
        if (0..RECLAIM_INTERVAL_MS).contains(&now.saturating_sub(last)) {
            return false;
        }
        self.last_reclaim_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn try_reserve(&self) -> bool {
        let max = self.config.max_pending;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok()
    }

    fn release_slots(&self, count: usize) {
        // The closure never returns None, so this cannot fail
        let _ = self
            .reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(count))
            });
    }

    fn insert_fresh(
        &self,
        username: String,
        credential_nickname: String,
        issued_options: O,
    ) -> Result<RequestId, RegistrationError> {
        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut attempts = 0;
        let slot = loop {
            attempts += 1;
            if attempts > MAX_ID_ATTEMPTS {
                error!("Could not produce an unused registration request id after {MAX_ID_ATTEMPTS} attempts");
                return Err(RegistrationError::IdentifierGeneration(
                    "identifier space collision".to_string(),
                ));
            }

            let request_id = (self.id_source)()
                .map(RequestId::from)
                .map_err(|e| RegistrationError::IdentifierGeneration(e.to_string()))?;

            // Never overwrite: a collision would hand an old attempt's slot to a new one
            match self.entries.entry(request_id) {
                Entry::Occupied(_) => {
                    error!("Registration request id collision, regenerating");
                }
                Entry::Vacant(slot) => break slot,
            }
        };

        let request_id = slot.key().clone();
        slot.insert(PendingRegistration::new(
            request_id.clone(),
            username,
            credential_nickname,
            issued_options,
            issued_at,
            expires_at,
        ));
        Ok(request_id)
    }
}

impl<O> Default for RegistrationSessionStore<O> {
    fn default() -> Self {
        Self::new(RegistrationStoreConfig::default())
    }
}

impl<O> std::fmt::Debug for RegistrationSessionStore<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationSessionStore")
            .field("pending", &self.pending_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
