use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic hash of `(game_state subset, query_type, parameters)`.
///
/// Stable only within one process run — `DefaultHasher` is not guaranteed
/// stable across Rust releases, which is fine here since fingerprints never
/// cross a process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Two calls with equal `value` always produce the same fingerprint.
    pub fn of<T: Hash>(value: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_fingerprint_identically() {
        assert_eq!(Fingerprint::of(&("equity", 42, "AhKh")), Fingerprint::of(&("equity", 42, "AhKh")));
    }

    #[test]
    fn different_inputs_fingerprint_differently() {
        assert_ne!(Fingerprint::of(&("equity", 42)), Fingerprint::of(&("equity", 43)));
    }
}
