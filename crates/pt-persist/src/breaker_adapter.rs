use std::collections::HashMap;
use std::time::Duration;

use pt_breaker::{CallError, CircuitBreaker};
use pt_recorder::HandHistory;
use serde_json::Value;

use crate::adapter::PersistenceAdapter;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 1;

/// Wraps any [`PersistenceAdapter`] with a [`CircuitBreaker`]. The breaker's `call` is
/// synchronous, so each call bridges into the async adapter via
/// `block_in_place` — this requires running on a multi-threaded Tokio
/// runtime.
pub struct BreakerAdapter<A: PersistenceAdapter> {
    inner: A,
    breaker: CircuitBreaker,
}

impl<A: PersistenceAdapter> BreakerAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self::with_breaker(inner, CircuitBreaker::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_TIMEOUT, DEFAULT_HALF_OPEN_MAX_CALLS))
    }

    pub fn with_breaker(inner: A, breaker: CircuitBreaker) -> Self {
        Self { inner, breaker }
    }

    pub fn metrics(&self) -> pt_breaker::Metrics {
        self.breaker.metrics()
    }

    fn guarded<F, T>(&self, f: F) -> Result<T, CallError<()>>
    where
        F: FnOnce() -> T,
    {
        self.breaker.call(|| Ok::<T, ()>(f()))
    }
}

#[async_trait::async_trait]
impl<A: PersistenceAdapter> PersistenceAdapter for BreakerAdapter<A> {
    async fn save_hand(&self, hand: &HandHistory) -> bool {
        let result = self.guarded(|| tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(self.inner.save_hand(hand))));
        match result {
            Ok(saved) => saved,
            Err(_) => false,
        }
    }

    async fn save_hud_profile(&self, name: &str, profile: &HashMap<String, Value>) -> bool {
        let result = self.guarded(|| {
            tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(self.inner.save_hud_profile(name, profile)))
        });
        match result {
            Ok(saved) => saved,
            Err(_) => false,
        }
    }

    async fn load_hud_profile(&self, name: &str) -> Option<HashMap<String, Value>> {
        self.guarded(|| tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(self.inner.load_hud_profile(name))))
            .ok()
            .flatten()
    }

    async fn list_hud_profiles(&self) -> Vec<String> {
        self.guarded(|| tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(self.inner.list_hud_profiles())))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryAdapter;

    #[tokio::test(flavor = "multi_thread")]
    async fn wrapped_adapter_round_trips() {
        let adapter = BreakerAdapter::new(InMemoryAdapter::new());
        let mut profile = HashMap::new();
        profile.insert("af".to_string(), Value::from(2.1));
        assert!(adapter.save_hud_profile("hero", &profile).await);
        let loaded = adapter.load_hud_profile("hero").await.unwrap();
        assert_eq!(loaded, profile);
        assert_eq!(adapter.metrics().state, pt_breaker::State::Closed);
    }
}
