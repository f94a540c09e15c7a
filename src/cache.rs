//! In-memory credential cache.
//!
//! Maps username to a salted Argon2 hash of the last password the remote
//! directory verified. The raw password is never retained; an entry is only
//! usable for re-checking the exact credential that already passed remote
//! verification, within its TTL. Entries are replaced wholesale on every
//! successful remote verification and lazily purged on lookup after expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use argon2::Argon2;
use parking_lot::RwLock;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Injectable time source so TTL behavior is testable without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CachedCredential {
    hash: [u8; HASH_LEN],
    salt: [u8; SALT_LEN],
    created_at: Instant,
    ttl: Duration,
}

impl CachedCredential {
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}

pub struct CredentialCache {
    entries: RwLock<HashMap<String, CachedCredential>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    retain_expired: bool,
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl, clock, retain_expired: false }
    }

    /// Keep expired entries in the map instead of purging them on lookup.
    /// They still count as misses for [`CredentialCache::verify`]; only
    /// [`CredentialCache::verify_ignore_ttl`] can match them. Required when
    /// the fail-open policy is in use, since that policy may need an expired
    /// entry long after its TTL. Hosts enabling this should not also run
    /// [`CredentialCache::purge_expired`].
    pub fn retain_expired(mut self, retain: bool) -> Self {
        self.retain_expired = retain;
        self
    }

    /// Check `password` against the cached entry for `username`.
    /// Misses (unknown user, expired entry, hash mismatch, empty password) all
    /// return `false`; the caller decides whether to escalate to the remote
    /// directory. Never performs I/O.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.verify_entry(username, password, false)
    }

    /// Like [`CredentialCache::verify`] but accepts entries past their TTL.
    /// Only consulted under the fail-open policy when the remote directory is
    /// unreachable; an invalidated entry stays gone either way.
    pub fn verify_ignore_ttl(&self, username: &str, password: &str) -> bool {
        self.verify_entry(username, password, true)
    }

    fn verify_entry(&self, username: &str, password: &str, ignore_ttl: bool) -> bool {
        if password.is_empty() {
            return false;
        }
        let now = self.clock.now();
        // Copy the entry out so the slow KDF below never runs under the lock;
        // a verify for one user must not stall stores for another.
        let entry = {
            let entries = self.entries.read();
            let Some(entry) = entries.get(username) else { return false };
            entry.clone()
        };
        if entry.expired(now) && !ignore_ttl {
            if !self.retain_expired {
                // Lazy purge; re-check under the write lock since a concurrent
                // store may have refreshed the entry in between.
                let mut entries = self.entries.write();
                if entries.get(username).is_some_and(|e| e.expired(now)) {
                    entries.remove(username);
                    debug!(username, "expired credential cache entry purged");
                }
            }
            return false;
        }
        let mut candidate = [0u8; HASH_LEN];
        match kdf(password, &entry.salt, &mut candidate) {
            // Constant-time compare: the cache must not leak how far a wrong
            // guess matched.
            Ok(()) => bool::from(candidate.ct_eq(&entry.hash)),
            Err(e) => {
                // Malformed entry is a miss, never an error.
                warn!(username, error = %e, "credential cache entry unusable, treating as miss");
                false
            }
        }
    }

    /// Hash `password` under a fresh random salt and replace any prior entry
    /// for `username` atomically. Called only after the remote directory has
    /// verified the credential. Empty passwords are never stored.
    pub fn store(&self, username: &str, password: &str) {
        if password.is_empty() {
            return;
        }
        let mut salt = [0u8; SALT_LEN];
        if let Err(e) = getrandom::getrandom(&mut salt) {
            warn!(username, error = %e, "salt generation failed, credential not cached");
            return;
        }
        let mut hash = [0u8; HASH_LEN];
        if let Err(e) = kdf(password, &salt, &mut hash) {
            warn!(username, error = %e, "password hashing failed, credential not cached");
            return;
        }
        let entry =
            CachedCredential { hash, salt, created_at: self.clock.now(), ttl: self.ttl };
        self.entries.write().insert(username.to_string(), entry);
        debug!(username, ttl_secs = self.ttl.as_secs(), "credential cached");
    }

    /// Drop the entry for `username` immediately, e.g. after the remote
    /// directory rejected a credential that was previously cached as valid.
    pub fn invalidate(&self, username: &str) {
        if self.entries.write().remove(username).is_some() {
            debug!(username, "credential cache entry invalidated");
        }
    }

    /// Remove all expired entries. Optional memory-bounding sweep for hosts
    /// that want it; correctness never depends on it because lookups purge
    /// lazily.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[cfg(test)]
    fn salt_of(&self, username: &str) -> Option<[u8; SALT_LEN]> {
        self.entries.read().get(username).map(|e| e.salt)
    }
}

/// Slow, purpose-built password KDF (Argon2id, default parameters). A fast
/// general-purpose hash would let a memory dump of the cache be brute-forced
/// offline.
fn kdf(password: &str, salt: &[u8], out: &mut [u8]) -> Result<(), argon2::Error> {
    Argon2::default().hash_password_into(password.as_bytes(), salt, out)
}
