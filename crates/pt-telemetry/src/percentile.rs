use std::collections::VecDeque;
use std::time::Duration;

/// Samples retained per slot before the oldest is evicted.
pub const WINDOW: usize = 1_000;

/// `count, mean, p50, p95, p99, min, max` for one slot's rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentileSnapshot {
    pub count: usize,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub min: Duration,
    pub max: Duration,
}

#[derive(Default)]
pub(crate) struct SlotWindow {
    samples: VecDeque<Duration>,
}

impl SlotWindow {
    pub(crate) fn push(&mut self, duration: Duration) {
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    pub(crate) fn snapshot(&self) -> Option<PercentileSnapshot> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<Duration> = self.samples.iter().copied().collect();
        sorted.sort();
        let count = sorted.len();
        let total: Duration = sorted.iter().sum();
        let mean = total / count as u32;
        Some(PercentileSnapshot {
            count,
            mean,
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let idx = ((sorted.len() as f64) * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reports_min_max_and_count() {
        let mut window = SlotWindow::default();
        for ms in [10, 20, 30, 40, 50] {
            window.push(Duration::from_millis(ms));
        }
        let snap = window.snapshot().unwrap();
        assert_eq!(snap.count, 5);
        assert_eq!(snap.min, Duration::from_millis(10));
        assert_eq!(snap.max, Duration::from_millis(50));
    }

    #[test]
    fn window_evicts_oldest_past_capacity() {
        let mut window = SlotWindow::default();
        for i in 0..(WINDOW + 10) {
            window.push(Duration::from_millis(i as u64));
        }
        assert_eq!(window.snapshot().unwrap().count, WINDOW);
    }

    #[test]
    fn empty_window_has_no_snapshot() {
        let window = SlotWindow::default();
        assert!(window.snapshot().is_none());
    }
}
