use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Profiles retained before the oldest is overwritten").
pub const MAX_PROFILES: usize = 50;

/// One captured slow-operation record.
#[derive(Debug, Clone, Serialize)]
pub struct SlowProfile {
    pub slot: String,
    pub duration_ms: u64,
    pub threshold_ms: u64,
    pub sequence: u64,
}

/// Captures operations exceeding the configured threshold into a fixed-size
/// ring; when a directory is configured each profile is also serialised to
/// disk under a rotating filename (`profile-{slot mod 50}.json`), so the
/// file count never grows unbounded.
pub struct SlowStore {
    dir: Option<PathBuf>,
    profiles: Vec<SlowProfile>,
    next_sequence: u64,
}

impl SlowStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir, profiles: Vec::with_capacity(MAX_PROFILES), next_sequence: 0 }
    }

    pub fn capture(&mut self, slot: &str, duration: Duration, threshold: Duration) {
        let profile = SlowProfile {
            slot: slot.to_string(),
            duration_ms: duration.as_millis() as u64,
            threshold_ms: threshold.as_millis() as u64,
            sequence: self.next_sequence,
        };
        let slot_index = (self.next_sequence % MAX_PROFILES as u64) as usize;
        self.next_sequence += 1;

        if self.profiles.len() <= slot_index {
            self.profiles.push(profile.clone());
        } else {
            self.profiles[slot_index] = profile.clone();
        }

        if let Some(dir) = &self.dir {
            let path = dir.join(format!("profile-{slot_index}.json"));
            if let Ok(json) = serde_json::to_string(&profile) {
                if let Err(e) = std::fs::write(&path, json) {
                    log::warn!("failed to persist slow-operation profile to {path:?}: {e}");
                }
            }
        }
    }

    pub fn profiles(&self) -> &[SlowProfile] {
        &self.profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_caps_at_max_profiles() {
        let mut store = SlowStore::new(None);
        for i in 0..(MAX_PROFILES + 20) {
            store.capture("equity", Duration::from_millis(i as u64), Duration::from_millis(50));
        }
        assert_eq!(store.profiles().len(), MAX_PROFILES);
    }

    #[test]
    fn rotation_overwrites_oldest_slot() {
        let mut store = SlowStore::new(None);
        for i in 0..MAX_PROFILES {
            store.capture("slot-a", Duration::from_millis(i as u64), Duration::from_millis(1));
        }
        store.capture("slot-b", Duration::from_millis(999), Duration::from_millis(1));
        assert_eq!(store.profiles()[0].slot, "slot-b");
    }
}
