use std::time::{Duration, Instant};

/// Starts on construction, stops on drop (success, error, or panic unwind
/// all run it), recording the elapsed duration into the owning
/// [`crate::Telemetry`] regardless of which exit path was taken.
pub struct ScopedTimer<'a> {
    slot: &'a str,
    started: Instant,
    telemetry: &'a super::Telemetry,
}

impl<'a> ScopedTimer<'a> {
    pub(crate) fn new(telemetry: &'a super::Telemetry, slot: &'a str) -> Self {
        Self { slot, started: Instant::now(), telemetry }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.telemetry.record(self.slot, self.started.elapsed());
    }
}
