//! Capacity-bounded, time-expiring map shared across requests.
//!
//! Backs both the analysis cache and the share store. Entries expire a fixed
//! duration after insertion; there is no manual invalidation. When an insert
//! would exceed capacity, expired entries are purged first and then the oldest
//! inserted entry is evicted.
//!
//! [`ExpiringCache::get_or_compute`] lets one caller per key fill a miss while
//! concurrent callers for the same key wait for its result.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug, Default)]
struct Gate {
    turn: Arc<Mutex<()>>,
    holders: usize,
}

type Gates<K> = Arc<StdMutex<HashMap<K, Gate>>>;

#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
    // One gate per key that currently has a computation running.
    flights: Gates<K>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> Clone for ExpiringCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            flights: Arc::clone(&self.flights),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}

/// A caller's hold on a key's gate. The gate leaves the map when the last
/// holder drops, including when the computing future is cancelled.
struct Flight<K: Eq + Hash> {
    flights: Gates<K>,
    key: K,
    turn: Arc<Mutex<()>>,
}

impl<K: Eq + Hash> Drop for Flight<K> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        let done = match flights.get_mut(&self.key) {
            Some(gate) => {
                gate.holders = gate.holders.saturating_sub(1);
                gate.holders == 0
            }
            None => false,
        };
        if done {
            flights.remove(&self.key);
        }
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            flights: Arc::new(StdMutex::new(HashMap::new())),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let expired = match entries.get(key) {
            Some(entry) if self.is_live(entry, now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub async fn contains(&self, key: &K) -> bool {
        self.get(key).await.is_some()
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        self.insert_locked(&mut entries, key, value, Instant::now());
    }

    /// Returns the live value for `key`, or runs `compute` to produce one.
    ///
    /// Only one `compute` runs per key at a time. Callers that miss while it
    /// runs wait, then re-check the cache. A value is stored only when
    /// `keep` accepts it; errors are never stored.
    pub async fn get_or_compute<F, Fut, E, P>(&self, key: K, compute: F, keep: P) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        P: FnOnce(&V) -> bool,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let flight = self.join_flight(key.clone());
        let _turn = flight.turn.lock().await;
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = compute().await?;
        if keep(&value) {
            self.insert(key, value.clone()).await;
        }
        Ok(value)
    }

    /// Live entries only.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        entries.values().filter(|e| self.is_live(e, now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every expired entry and reports how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        self.purge_locked(&mut entries, Instant::now())
    }

    fn join_flight(&self, key: K) -> Flight<K> {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        let gate = flights.entry(key.clone()).or_default();
        gate.holders += 1;
        Flight {
            flights: Arc::clone(&self.flights),
            turn: Arc::clone(&gate.turn),
            key,
        }
    }

    fn is_live(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) < self.ttl
    }

    fn purge_locked(&self, entries: &mut HashMap<K, Entry<V>>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        before - entries.len()
    }

    fn insert_locked(&self, entries: &mut HashMap<K, Entry<V>>, key: K, value: V, now: Instant) {
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let purged = self.purge_locked(entries, now);
            if purged > 0 {
                debug!("Purged {} expired cache entries", purged);
            }
            while entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(oldest) => {
                        entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }
}
