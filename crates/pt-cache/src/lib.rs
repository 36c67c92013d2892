//! Query Cache & Solver API (C7): fingerprinted memoisation for expensive
//! derivations (equity, ranges, GTO hints) with TTL/LRU eviction,
//! single-flight compute, and latency-driven approximation.

mod cache;
mod fingerprint;
mod optimiser;

pub use cache::{CacheStats, QueryCache, QueryOutcome};
pub use fingerprint::Fingerprint;
pub use optimiser::LatencyOptimiser;
