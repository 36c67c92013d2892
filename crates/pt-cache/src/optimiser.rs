use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Samples kept per query-type pattern when estimating rolling p95 latency.
const WINDOW: usize = 20;

/// Tracks per-query-type latency and raises the default approximation
/// level for a pattern once its rolling p95 breaches the target.
pub struct LatencyOptimiser {
    target: Duration,
    samples: Mutex<HashMap<String, VecDeque<Duration>>>,
    levels: Mutex<HashMap<String, u32>>,
}

impl LatencyOptimiser {
    pub fn new(target: Duration) -> Self {
        Self { target, samples: Mutex::new(HashMap::new()), levels: Mutex::new(HashMap::new()) }
    }

    pub fn default_level(&self, pattern: &str) -> u32 {
        *self.levels.lock().expect("optimiser lock poisoned").get(pattern).unwrap_or(&0)
    }

    pub fn record(&self, pattern: &str, duration: Duration) {
        let mut samples = self.samples.lock().expect("optimiser lock poisoned");
        let window = samples.entry(pattern.to_string()).or_default();
        if window.len() == WINDOW {
            window.pop_front();
        }
        window.push_back(duration);
        if window.len() < 4 {
            return; // not enough samples for a meaningful p95
        }
        let mut sorted: Vec<Duration> = window.iter().copied().collect();
        sorted.sort();
        let idx = ((sorted.len() as f64) * 0.95).floor() as usize;
        let p95 = sorted[idx.min(sorted.len() - 1)];
        if p95 > self.target {
            let mut levels = self.levels.lock().expect("optimiser lock poisoned");
            *levels.entry(pattern.to_string()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaching_target_raises_default_level() {
        let optimiser = LatencyOptimiser::new(Duration::from_millis(200));
        for _ in 0..6 {
            optimiser.record("equity", Duration::from_millis(400));
        }
        assert!(optimiser.default_level("equity") > 0);
    }

    #[test]
    fn fast_pattern_stays_at_level_zero() {
        let optimiser = LatencyOptimiser::new(Duration::from_millis(200));
        for _ in 0..6 {
            optimiser.record("equity", Duration::from_millis(10));
        }
        assert_eq!(optimiser.default_level("equity"), 0);
    }
}
