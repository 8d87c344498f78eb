use crate::error::Result;
use crate::limiter::{Bucket, Limiter};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Limiters keyed by bucket name.
#[derive(Debug, Default)]
pub struct Buckets {
    limiters: HashMap<&'static str, Limiter>,
}

impl Buckets {
    /// The limiter for `bucket`, registering it on first use.
    pub fn limiter(&mut self, bucket: &Bucket) -> Result<&mut Limiter> {
        match self.limiters.entry(bucket.name) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                debug!(
                    "registering bucket {} ({} per {:?})",
                    bucket.name, bucket.rate, bucket.per
                );
                Ok(e.insert(bucket.limiter()?))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Limiter> {
        self.limiters.get(name)
    }
}

/// The client-wide exclusion gate.
///
/// Every request holds the gate for its whole duration. The bucket registry
/// lives inside it, so limiter bookkeeping is always done by the holder.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    inner: Arc<Mutex<Buckets>>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self) -> GateGuard {
        GateGuard {
            guard: self.inner.clone().lock_owned().await,
        }
    }

    /// True when nobody holds the gate (including deferred holders).
    pub fn is_free(&self) -> bool {
        self.inner.try_lock().is_ok()
    }
}

/// Scoped hold on the [`RequestGate`]; released on drop unless deferred.
pub struct GateGuard {
    guard: OwnedMutexGuard<Buckets>,
}

impl GateGuard {
    /// Keep the gate closed for `unlock_after` more, then release it.
    ///
    /// The caller gets control back immediately. Needs a running tokio runtime.
    pub fn defer(self, unlock_after: Duration) {
        let guard = self.guard;
        tokio::spawn(async move {
            tokio::time::sleep(unlock_after).await;
            drop(guard);
        });
    }
}

impl Deref for GateGuard {
    type Target = Buckets;

    fn deref(&self) -> &Buckets {
        &self.guard
    }
}

impl DerefMut for GateGuard {
    fn deref_mut(&mut self) -> &mut Buckets {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn guard_releases_on_drop() {
        let gate = RequestGate::new();
        {
            let _g = gate.acquire().await;
            assert!(!gate.is_free());
        }
        assert!(gate.is_free());
    }

    #[tokio::test(start_paused = true)]
    async fn deferred_release_holds_gate_for_the_delay() {
        let gate = RequestGate::new();
        let start = Instant::now();
        gate.acquire().await.defer(Duration::from_secs(2));
        assert!(!gate.is_free());

        let _second = gate.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn buckets_register_once() {
        let gate = RequestGate::new();
        let bucket = Bucket::new("match_players", 1, Duration::from_secs(1));
        let mut g = gate.acquire().await;
        let now = Instant::now();
        g.limiter(&bucket).unwrap().update_rate_limit(now);
        // Same limiter comes back, with its token spent.
        assert_eq!(g.limiter(&bucket).unwrap().get_tokens(now), 0);
        assert!(g.get("match_players").is_some());
        assert!(g.get("other").is_none());
    }
}
