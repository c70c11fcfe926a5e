//! Key-value cache capability for engines and plugins.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Cache used by engines to keep state across requests.
pub trait Cache: Send + Sync {
    /// Returns a live value.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value. A zero `ttl` never expires.
    fn set(&self, key: &str, value: String, ttl: Duration);

    /// Removes a value.
    fn delete(&self, key: &str);

    /// Keyed hash of `value`, for cache keys that must not reveal user input.
    fn secret_hash(&self, value: &str) -> String;
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-process cache with lazy expiry and an optional sweep task.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    secret: [u8; 32],
}

impl MemoryCache {
    /// Creates an empty cache with a fresh random secret.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            secret: rand::random(),
        }
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Spawns a task sweeping the cache every `every`.
    ///
    /// The task holds a weak reference and ends once the cache is dropped.
    pub fn start_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep();
                if removed > 0 {
                    debug!("Cache sweep removed {} entries", removed);
                }
            }
        })
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        self.entries
            .write()
            .insert(key.to_string(), Entry { value, expires_at });
    }

    fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn secret_hash(&self, value: &str) -> String {
        blake3::keyed_hash(&self.secret, value.as_bytes())
            .to_hex()
            .to_string()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}
