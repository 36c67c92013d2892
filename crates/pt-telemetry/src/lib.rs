//! Telemetry (C10): scoped timing with guaranteed release on all exit
//! paths, rolling percentile aggregation, bounded slow-operation capture,
//! and latency-driven ensemble weight feedback.

mod percentile;
mod slowstore;
mod timer;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use pt_detect::{EnsembleVoter, StrategyId};

pub use percentile::PercentileSnapshot;
pub use slowstore::{SlowProfile, SlowStore, MAX_PROFILES};
pub use timer::ScopedTimer;

use percentile::SlotWindow;

const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(50);

/// Aggregates per-slot timing and feeds slow operations into a bounded
/// profile store.
pub struct Telemetry {
    windows: Mutex<HashMap<String, SlotWindow>>,
    slow_threshold: Duration,
    slow_store: Mutex<SlowStore>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_THRESHOLD, None)
    }
}

impl Telemetry {
    pub fn new(slow_threshold: Duration, slow_profile_dir: Option<PathBuf>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            slow_threshold,
            slow_store: Mutex::new(SlowStore::new(slow_profile_dir)),
        }
    }

    /// Starts a timer scoped to `slot`; dropping it (on any exit path)
    /// records the elapsed duration.
    pub fn scope<'a>(&'a self, slot: &'a str) -> ScopedTimer<'a> {
        ScopedTimer::new(self, slot)
    }

    /// Records a duration directly, for callers that already know an
    /// operation's cost (e.g. a strategy's self-reported `cost_ms`) rather
    /// than timing it with [`Self::scope`].
    pub fn record(&self, slot: &str, duration: Duration) {
        {
            let mut windows = self.windows.lock().expect("telemetry lock poisoned");
            windows.entry(slot.to_string()).or_default().push(duration);
        }
        if duration > self.slow_threshold {
            let mut store = self.slow_store.lock().expect("slow-store lock poisoned");
            store.capture(slot, duration, self.slow_threshold);
        }
    }

    pub fn snapshot(&self, slot: &str) -> Option<PercentileSnapshot> {
        self.windows.lock().expect("telemetry lock poisoned").get(slot).and_then(|w| w.snapshot())
    }

    pub fn slow_profiles(&self) -> Vec<SlowProfile> {
        self.slow_store.lock().expect("slow-store lock poisoned").profiles().to_vec()
    }

    /// Checks a strategy's rolling p95 against its latency `budget` and, if
    /// exceeded, penalises its ensemble weight. The slot name is the strategy's `Display`.
    pub fn enforce_budget(&self, strategy_id: StrategyId, budget: Duration, voter: &EnsembleVoter) {
        let slot = strategy_id.to_string();
        let Some(snapshot) = self.snapshot(&slot) else { return };
        if snapshot.p95 <= budget || snapshot.p95.is_zero() {
            return;
        }
        let factor = (budget.as_secs_f64() / snapshot.p95.as_secs_f64()) as f32;
        voter.penalise(strategy_id, factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn scoped_timer_records_on_drop() {
        let telemetry = Telemetry::default();
        {
            let _timer = telemetry.scope("capture");
            sleep(Duration::from_millis(1));
        }
        let snap = telemetry.snapshot("capture").expect("snapshot");
        assert_eq!(snap.count, 1);
    }

    #[test]
    fn slow_operation_is_captured() {
        let telemetry = Telemetry::new(Duration::from_millis(1), None);
        telemetry.record("slow_op", Duration::from_millis(50));
        assert_eq!(telemetry.slow_profiles().len(), 1);
    }

    #[test]
    fn budget_breach_penalises_strategy_weight() {
        let telemetry = Telemetry::new(Duration::from_millis(1), None);
        let voter = EnsembleVoter::default();
        for _ in 0..4 {
            telemetry.record("ocr", Duration::from_millis(100));
        }
        telemetry.enforce_budget(StrategyId::Ocr, Duration::from_millis(10), &voter);
        assert!(voter.weight(StrategyId::Ocr) < 1.0);
    }

    #[test]
    fn budget_within_range_does_not_panic() {
        let telemetry = Telemetry::new(Duration::from_millis(100), None);
        let voter = EnsembleVoter::default();
        telemetry.record("ocr", Duration::from_millis(5));
        telemetry.enforce_budget(StrategyId::Ocr, Duration::from_millis(100), &voter);
    }
}
