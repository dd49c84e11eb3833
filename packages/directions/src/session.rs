//! Route sessions.
//!
//! A directions response hands out a session id; follow-up requests (the
//! violation overlay) use it to look up the route geometry again. Entries
//! expire after a TTL and the store holds a bounded number of them,
//! evicting the least recently used first.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use charimachi_geometry::Coordinate;
use lru::LruCache;

/// Default number of sessions kept.
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Generates a new random session id (UUID v4).
#[must_use]
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Remembers route geometries by session id.
pub trait SessionStore: Send + Sync {
    /// Stores `route` under `id`, replacing any previous entry.
    fn put(&self, id: &str, route: Vec<Coordinate>);

    /// The route stored under `id`, unless unknown or expired.
    fn get(&self, id: &str) -> Option<Vec<Coordinate>>;
}

struct SessionEntry {
    route: Vec<Coordinate>,
    created: Instant,
}

/// [`SessionStore`] in process memory with LRU eviction and a TTL.
pub struct InMemorySessionStore {
    entries: Mutex<LruCache<String, SessionEntry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    /// Creates a store holding at most `capacity` sessions (minimum 1),
    /// each living for `ttl`.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Number of entries currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, SessionEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_at(&self, id: &str, now: Instant) -> Option<Vec<Coordinate>> {
        let mut entries = self.lock();
        let expired = now.saturating_duration_since(entries.peek(id)?.created) >= self.ttl;
        if expired {
            log::debug!("Session {id} expired");
            entries.pop(id);
            return None;
        }
        entries.get(id).map(|e| e.route.clone())
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_TTL)
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, id: &str, route: Vec<Coordinate>) {
        let evicted = self.lock().push(
            id.to_string(),
            SessionEntry {
                route,
                created: Instant::now(),
            },
        );
        if let Some((old, _)) = evicted.filter(|(old, _)| old != id) {
            log::debug!("Session {old} evicted");
        }
    }

    fn get(&self, id: &str) -> Option<Vec<Coordinate>> {
        self.get_at(id, Instant::now())
    }
}
