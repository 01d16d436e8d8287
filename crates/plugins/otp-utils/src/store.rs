//! Expiring code storage.
//!
//! A store maps a phone number to at most one [`OtpRecord`]. The only
//! mutation besides overwrite and delete is [`CodeStore::consume`], which
//! checks expiry, the consumed flag and the code under one lock.

use async_trait::async_trait;
use chrono::Duration;
use phone_otp_core::clock::{Clock, SystemClock};
use phone_otp_core::error::StoreError;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::OtpRecord;
use crate::verification::ConsumeOutcome;

/// Trait for expiring one-time code storage.
///
/// Expired records behave as absent for every operation. `consume` must be
/// linearizable per identifier: of several concurrent calls with the right
/// code, exactly one observes [`ConsumeOutcome::Consumed`].
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores a code, replacing any previous record for the identifier.
    async fn put(&self, identifier: &str, code: &str, ttl: Duration) -> Result<OtpRecord, StoreError>;

    /// Returns the unexpired record without modifying it.
    async fn peek(&self, identifier: &str) -> Result<Option<OtpRecord>, StoreError>;

    /// Atomically checks `submitted` against the live code and marks it used.
    async fn consume(&self, identifier: &str, submitted: &str) -> Result<ConsumeOutcome, StoreError> {
        self.consume_limited(identifier, submitted, None).await
    }

    /// Same as [`CodeStore::consume`], but counts mismatches on the record and
    /// removes it on the `max_failures`-th one, reporting
    /// [`ConsumeOutcome::Exhausted`]. Counting and removal happen under the
    /// same lock as the comparison.
    async fn consume_limited(
        &self,
        identifier: &str,
        submitted: &str,
        max_failures: Option<u32>,
    ) -> Result<ConsumeOutcome, StoreError>;

    /// Removes the record. Returns true if an unexpired one existed.
    async fn delete(&self, identifier: &str) -> Result<bool, StoreError>;

    /// Reclaims expired and consumed records, returning how many were dropped.
    async fn sweep(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Per-identifier slot. An empty slot is an absent record.
type Slot = Arc<Mutex<Option<OtpRecord>>>;

/// In-memory code store with per-identifier locking.
///
/// Operations on one identifier hold the shared map lock for reading while
/// they lock that identifier's slot, so different identifiers never wait on
/// each other. Only the first insert of a key and [`CodeStore::sweep`] take
/// the map lock for writing.
#[derive(Debug, Clone)]
pub struct MemoryCodeStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCodeStore {
    /// Creates a store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Runs `f` on the identifier's slot, if the identifier was ever stored.
    async fn with_slot<R>(
        &self,
        identifier: &str,
        f: impl FnOnce(&mut Option<OtpRecord>) -> R,
    ) -> Option<R> {
        let slots = self.slots.read().await;
        let slot = slots.get(identifier)?;
        let mut record = slot.lock().await;
        Some(f(&mut record))
    }

    /// Number of records that could still be consumed.
    pub async fn live_count(&self) -> usize {
        let now = self.clock.now();
        let slots = self.slots.read().await;
        let mut live = 0;
        for slot in slots.values() {
            if slot.lock().await.as_ref().is_some_and(|r| r.is_live(now)) {
                live += 1;
            }
        }
        live
    }

    /// Number of keys held in memory, including empty and stale slots.
    pub async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }
}

impl Default for MemoryCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn codes_match(stored: &str, submitted: &str) -> bool {
    stored.as_bytes().ct_eq(submitted.as_bytes()).into()
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn put(&self, identifier: &str, code: &str, ttl: Duration) -> Result<OtpRecord, StoreError> {
        let record = OtpRecord::new(identifier, code, self.clock.now(), ttl)?;

        let replaced = self
            .with_slot(identifier, |slot| *slot = Some(record.clone()))
            .await;
        if replaced.is_some() {
            return Ok(record);
        }

        // Nobody can hold a slot lock while the map is write-locked.
        let mut slots = self.slots.write().await;
        let slot = slots.entry(identifier.to_string()).or_default().clone();
        *slot.lock().await = Some(record.clone());
        Ok(record)
    }

    async fn peek(&self, identifier: &str) -> Result<Option<OtpRecord>, StoreError> {
        let now = self.clock.now();
        let record = self
            .with_slot(identifier, |slot| {
                slot.as_ref().filter(|r| !r.is_expired(now)).cloned()
            })
            .await;
        Ok(record.flatten())
    }

    async fn consume_limited(
        &self,
        identifier: &str,
        submitted: &str,
        max_failures: Option<u32>,
    ) -> Result<ConsumeOutcome, StoreError> {
        let outcome = self
            .with_slot(identifier, |slot| {
                let now = self.clock.now();
                let Some(record) = slot.as_mut() else {
                    return ConsumeOutcome::Invalid;
                };
                if record.is_expired(now) {
                    *slot = None;
                    return ConsumeOutcome::Invalid;
                }
                if record.consumed {
                    return ConsumeOutcome::Invalid;
                }
                if codes_match(&record.code, submitted) {
                    record.consumed = true;
                    return ConsumeOutcome::Consumed;
                }

                record.failed_attempts = record.failed_attempts.saturating_add(1);
                match max_failures {
                    Some(max) if record.failed_attempts >= max.max(1) => {
                        *slot = None;
                        ConsumeOutcome::Exhausted
                    }
                    _ => ConsumeOutcome::Mismatch,
                }
            })
            .await;
        Ok(outcome.unwrap_or(ConsumeOutcome::Invalid))
    }

    async fn delete(&self, identifier: &str) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let existed = self
            .with_slot(identifier, |slot| {
                slot.take().is_some_and(|record| !record.is_expired(now))
            })
            .await;
        Ok(existed.unwrap_or(false))
    }

    async fn sweep(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(record) => record.as_ref().is_some_and(|r| r.is_live(now)),
            Err(_) => true,
        });
        Ok(before - slots.len())
    }
}

/// Spawns a task that sweeps `store` every `interval`.
///
/// Correctness never depends on the sweeper; it only bounds memory.
pub fn spawn_sweeper(store: Arc<dyn CodeStore>, interval: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match store.sweep().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "swept stale one-time codes"),
                Err(e) => tracing::warn!(error = %e, "code store sweep failed"),
            }
        }
    })
}
