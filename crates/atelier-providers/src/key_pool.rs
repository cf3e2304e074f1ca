//! Round-robin credential pool with per-key cooldown state.

use atelier_core::{Error, IgnoreLock as _, KeyStatus, RateLimitStatus, Result};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// One credential slot with request accounting and cooldown state.
///
/// Records live for the process lifetime; they are never removed, only
/// re-armed once their cooldown lapses.
#[derive(Debug, Clone)]
struct KeyRecord {
    /// The credential itself.
    credential: String,
    /// Requests attempted with this key.
    requests_made: u64,
    /// When this key was last handed to a call.
    last_request_at: Option<Instant>,
    /// Whether the key is cooling down after a quota response.
    rate_limited: bool,
    /// When the cooldown lapses.
    reset_at: Option<Instant>,
}

impl KeyRecord {
    fn new(credential: String) -> Self {
        Self {
            credential,
            requests_made: 0,
            last_request_at: None,
            rate_limited: false,
            reset_at: None,
        }
    }

    fn cooldown_lapsed(&self, now: Instant) -> bool {
        self.reset_at.is_some_and(|reset_at| now >= reset_at)
    }
}

/// A key selection handed to one generation call.
///
/// The index identifies the slot for [`KeyPool::mark_limited`] and
/// [`KeyPool::record_request`]; selection state can move on behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLease {
    /// Pool slot the credential came from.
    pub index: usize,
    /// Credential to authenticate the call with.
    pub credential: String,
}

/// Mutable pool state behind one lock: selection and cooldown mutate
/// together, so two callers can never both claim the same limited key.
#[derive(Debug)]
struct PoolState {
    keys: Vec<KeyRecord>,
    cursor: usize,
}

/// Process-wide credential pool, shared across conversations.
///
/// Keys are tried round-robin from a movable cursor. All methods take
/// `&self`; the pool is intended to live in an `Arc` shared by every
/// generation client.
#[derive(Debug)]
pub struct KeyPool {
    state: Mutex<PoolState>,
}

impl KeyPool {
    /// Builds a pool from the given credentials, dropping empty strings.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when no usable credential remains; a pool
    /// without keys is a fatal configuration error.
    pub fn new(credentials: Vec<String>) -> Result<Self> {
        let keys: Vec<KeyRecord> = credentials
            .into_iter()
            .filter(|credential| !credential.is_empty())
            .map(KeyRecord::new)
            .collect();

        if keys.is_empty() {
            return Err(Error::Config(
                "no API keys configured; set GEMINI_API_KEY or add keys to the config file"
                    .to_owned(),
            ));
        }

        info!("loaded {} API key(s)", keys.len());
        Ok(Self {
            state: Mutex::new(PoolState { keys, cursor: 0 }),
        })
    }

    /// Selects a credential, skipping keys that are cooling down.
    ///
    /// Starts at the cursor and advances past limited keys, re-arming any
    /// whose cooldown has lapsed along the way. When every key is still
    /// cooling down, returns the one with the soonest reset as a best
    /// effort; the caller must still expect that key to fail.
    pub fn current(&self) -> KeyLease {
        let mut state = self.state.lock_ignore_poison();
        let now = Instant::now();
        let key_count = state.keys.len();

        for _ in 0..key_count {
            let cursor = state.cursor;
            let record = &mut state.keys[cursor];

            if record.rate_limited {
                if record.cooldown_lapsed(now) {
                    record.rate_limited = false;
                    record.reset_at = None;
                    info!("API key {} cooldown lapsed, available again", cursor + 1);
                } else {
                    state.cursor = (cursor + 1) % key_count;
                    continue;
                }
            }

            return KeyLease {
                index: cursor,
                credential: state.keys[cursor].credential.clone(),
            };
        }

        // Every key is cooling down: hand out the soonest to reset
        let soonest = state
            .keys
            .iter()
            .enumerate()
            .min_by_key(|(_, record)| record.reset_at.unwrap_or(now))
            .map_or(0, |(index, _)| index);
        state.cursor = soonest;

        KeyLease {
            index: soonest,
            credential: state.keys[soonest].credential.clone(),
        }
    }

    /// Puts the key at `index` on cooldown and advances the cursor past it
    /// so the next selection prefers a different key.
    pub fn mark_limited(&self, index: usize, retry_after: Duration) {
        let mut state = self.state.lock_ignore_poison();
        let key_count = state.keys.len();

        let Some(record) = state.keys.get_mut(index) else {
            return;
        };
        record.rate_limited = true;
        record.reset_at = Some(Instant::now() + retry_after);
        state.cursor = (index + 1) % key_count;

        warn!(
            "API key {} rate limited, reset in {:.1}s",
            index + 1,
            retry_after.as_secs_f64()
        );
    }

    /// Counts one request against the key at `index`.
    pub fn record_request(&self, index: usize) {
        let mut state = self.state.lock_ignore_poison();
        if let Some(record) = state.keys.get_mut(index) {
            record.requests_made += 1;
            record.last_request_at = Some(Instant::now());
        }
    }

    /// Requests attempted with the key at `index`.
    pub fn requests_made(&self, index: usize) -> u64 {
        let state = self.state.lock_ignore_poison();
        state.keys.get(index).map_or(0, |record| record.requests_made)
    }

    /// Whether any key is currently free of the cooldown flag.
    ///
    /// A lapsed cooldown that has not been observed yet still counts as
    /// limited here; [`KeyPool::rearm_expired`] clears those.
    pub fn has_available(&self) -> bool {
        let state = self.state.lock_ignore_poison();
        state.keys.iter().any(|record| !record.rate_limited)
    }

    /// Time until the soonest cooldown lapses; zero when any key is free.
    pub fn shortest_wait(&self) -> Duration {
        let state = self.state.lock_ignore_poison();
        let now = Instant::now();

        if state.keys.iter().any(|record| !record.rate_limited) {
            return Duration::ZERO;
        }

        state
            .keys
            .iter()
            .filter_map(|record| record.reset_at)
            .map(|reset_at| reset_at.saturating_duration_since(now))
            .min()
            .unwrap_or(Duration::ZERO)
    }

    /// Clears the cooldown flag on every key whose reset time has passed.
    pub fn rearm_expired(&self) {
        let mut state = self.state.lock_ignore_poison();
        let now = Instant::now();
        for (index, record) in state.keys.iter_mut().enumerate() {
            if record.rate_limited && record.cooldown_lapsed(now) {
                record.rate_limited = false;
                record.reset_at = None;
                info!("API key {} cooldown lapsed, available again", index + 1);
            }
        }
    }

    /// Snapshot of the pool for diagnostics.
    pub fn status(&self) -> RateLimitStatus {
        let state = self.state.lock_ignore_poison();
        let now = Instant::now();

        RateLimitStatus {
            total_keys: state.keys.len(),
            current_key_index: state.cursor,
            keys: state
                .keys
                .iter()
                .enumerate()
                .map(|(index, record)| KeyStatus {
                    index,
                    is_rate_limited: record.rate_limited,
                    reset_in_seconds: record.rate_limited.then(|| {
                        record.reset_at.map_or(0, |reset_at| {
                            reset_at.saturating_duration_since(now).as_secs_f64().ceil() as u64
                        })
                    }),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn pool_with(keys: &[&str]) -> KeyPool {
        KeyPool::new(keys.iter().map(|key| (*key).to_owned()).collect()).expect("pool")
    }

    #[test]
    fn test_zero_keys_is_fatal() {
        let error = KeyPool::new(Vec::new()).unwrap_err();
        assert!(matches!(error, Error::Config(_)));

        // Empty strings are not usable credentials
        let error = KeyPool::new(vec![String::new()]).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_current_sticks_to_free_key() {
        let pool = pool_with(&["alpha", "beta"]);
        assert_eq!(pool.current().credential, "alpha");
        // Selection does not advance on its own
        assert_eq!(pool.current().credential, "alpha");
    }

    #[test]
    fn test_mark_limited_rotates_away() {
        let pool = pool_with(&["alpha", "beta"]);
        let lease = pool.current();
        pool.mark_limited(lease.index, Duration::from_secs(30));

        let next = pool.current();
        assert_eq!(next.credential, "beta");
        assert_eq!(next.index, 1);
        assert!(pool.has_available());
    }

    #[test]
    fn test_limited_key_selectable_after_cooldown() {
        let pool = pool_with(&["alpha", "beta"]);
        pool.mark_limited(0, Duration::from_millis(40));
        assert_eq!(pool.current().index, 1);

        sleep(Duration::from_millis(60));

        // Force selection past beta; alpha's cooldown has lapsed
        pool.mark_limited(1, Duration::from_secs(30));
        let lease = pool.current();
        assert_eq!(lease.index, 0);

        let status = pool.status();
        assert!(!status.keys[0].is_rate_limited);
        assert!(status.keys[1].is_rate_limited);
    }

    #[test]
    fn test_all_limited_returns_soonest_reset() {
        let pool = pool_with(&["alpha", "beta"]);
        pool.mark_limited(0, Duration::from_millis(200));
        pool.mark_limited(1, Duration::from_secs(30));

        assert!(!pool.has_available());
        let lease = pool.current();
        assert_eq!(lease.index, 0);
        assert_eq!(lease.credential, "alpha");

        let wait = pool.shortest_wait();
        assert!(wait <= Duration::from_millis(200));
        assert!(wait > Duration::ZERO);
    }

    #[test]
    fn test_rearm_expired_clears_lapsed_cooldowns() {
        let pool = pool_with(&["alpha", "beta"]);
        pool.mark_limited(0, Duration::from_millis(30));
        pool.mark_limited(1, Duration::from_secs(30));

        sleep(Duration::from_millis(50));
        pool.rearm_expired();

        assert!(pool.has_available());
        let status = pool.status();
        assert!(!status.keys[0].is_rate_limited);
        assert!(status.keys[1].is_rate_limited);
        assert!(status.keys[1].reset_in_seconds.is_some());
    }

    #[test]
    fn test_record_request_accounting() {
        let pool = pool_with(&["alpha"]);
        assert_eq!(pool.requests_made(0), 0);
        pool.record_request(0);
        pool.record_request(0);
        assert_eq!(pool.requests_made(0), 2);
    }

    #[test]
    fn test_status_shape() {
        let pool = pool_with(&["alpha", "beta", "gamma"]);
        pool.mark_limited(1, Duration::from_secs(30));

        let status = pool.status();
        assert_eq!(status.total_keys, 3);
        assert_eq!(status.current_key_index, 2);
        assert_eq!(status.keys.len(), 3);
        assert!(!status.keys[0].is_rate_limited);
        assert!(status.keys[0].reset_in_seconds.is_none());
        assert!(status.keys[1].is_rate_limited);
        let reset_in = status.keys[1].reset_in_seconds.expect("cooldown");
        assert!((29..=30).contains(&reset_in), "reset_in was {reset_in}");
    }
}
