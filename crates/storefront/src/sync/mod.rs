//! Sync actions: each pairs a local store change with its backend call.
//!
//! # Update policy
//!
//! Cart and wishlist mutations are optimistic with rollback: snapshot the
//! affected line, mutate locally, call the backend, restore the snapshot if
//! the call fails. Checkout and profile edits have no local counterpart to
//! show early and wait for the backend instead.
//!
//! A second mutation of a key that already has one in flight fails fast
//! with [`SyncError::InFlight`](crate::error::SyncError::InFlight).

mod cart;
mod checkout;
mod session;
mod wishlist;

pub use cart::CartSync;
pub use checkout::CheckoutSync;
pub use session::SessionSync;
pub use wishlist::WishlistSync;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, SyncError};
use crate::store::AuthStore;

/// Keys with a mutation currently awaiting the backend, or a whole-store
/// claim that excludes every key.
#[derive(Debug)]
pub(crate) struct InFlight<K> {
    claims: Arc<Mutex<Claims<K>>>,
}

#[derive(Debug)]
struct Claims<K> {
    keys: HashSet<K>,
    exclusive: bool,
}

impl<K> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            claims: Arc::clone(&self.claims),
        }
    }
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            claims: Arc::new(Mutex::new(Claims {
                keys: HashSet::new(),
                exclusive: false,
            })),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    fn lock(&self) -> MutexGuard<'_, Claims<K>> {
        self.claims.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `key` until the returned guard drops.
    pub(crate) fn acquire(&self, key: &K) -> Result<InFlightGuard<K>> {
        let mut claims = self.lock();
        if claims.exclusive || !claims.keys.insert(key.clone()) {
            return Err(SyncError::InFlight);
        }
        Ok(InFlightGuard {
            claims: Arc::clone(&self.claims),
            key: Some(key.clone()),
        })
    }

    /// Claim every key at once. Fails while any single key is claimed.
    pub(crate) fn acquire_all(&self) -> Result<InFlightGuard<K>> {
        let mut claims = self.lock();
        if claims.exclusive || !claims.keys.is_empty() {
            return Err(SyncError::InFlight);
        }
        claims.exclusive = true;
        Ok(InFlightGuard {
            claims: Arc::clone(&self.claims),
            key: None,
        })
    }

    /// Claimed keys other than `own`.
    pub(crate) fn others(&self, own: Option<&K>) -> HashSet<K> {
        self.lock()
            .keys
            .iter()
            .filter(|k| Some(*k) != own)
            .cloned()
            .collect()
    }
}

pub(crate) struct InFlightGuard<K: Eq + Hash> {
    claims: Arc<Mutex<Claims<K>>>,
    /// `None` for a whole-store claim.
    key: Option<K>,
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        match &self.key {
            Some(key) => {
                claims.keys.remove(key);
            }
            None => claims.exclusive = false,
        }
    }
}

/// Wait out hydration, then insist on a session.
async fn require_session(auth: &AuthStore) -> Result<()> {
    if auth.wait_ready().await.is_authenticated() {
        Ok(())
    } else {
        Err(SyncError::NotAuthenticated)
    }
}
