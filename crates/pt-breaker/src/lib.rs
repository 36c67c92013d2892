//! Circuit Breaker (C8): fault-isolation wrapper around an unreliable call,
//! with states CLOSED/OPEN/HALF_OPEN (GLOSSARY "Circuit breaker").
#![allow(dead_code)]

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Breaker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Closed,
    Open,
    HalfOpen,
}

/// Snapshot of breaker counters for telemetry.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub state: State,
    pub total_calls: u64,
    pub total_failures: u64,
    pub consecutive_failures: u32,
    pub failure_rate: f64,
    pub opened_at: Option<Instant>,
}

/// The circuit rejected the call without invoking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitOpenError;

impl std::fmt::Display for CircuitOpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "circuit open: call rejected fail-fast")
    }
}

impl std::error::Error for CircuitOpenError {}

/// Either the circuit was open, or the wrapped call itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError<E> {
    Open,
    Inner(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Open => write!(f, "circuit open: call rejected fail-fast"),
            CallError::Inner(e) => write!(f, "{e}"),
        }
    }
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    total_calls: u64,
    total_failures: u64,
    opened_at: Option<Instant>,
    half_open_calls_issued: u32,
}

/// Thread-safe circuit breaker: `call(fn)` wraps an arbitrary fallible
/// operation. A single internal lock guards state transitions; it is
/// held only across the bookkeeping, never across the wrapped call itself.
pub struct CircuitBreaker {
    failure_threshold: u32,
    timeout: Duration,
    half_open_max_calls: u32,
    inner: Mutex<Inner>,
    state_change_callback: Option<Box<dyn Fn(State, State) + Send + Sync>>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration, half_open_max_calls: u32) -> Self {
        Self {
            failure_threshold,
            timeout,
            half_open_max_calls,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                total_calls: 0,
                total_failures: 0,
                opened_at: None,
                half_open_calls_issued: 0,
            }),
            state_change_callback: None,
        }
    }

    /// Registers a callback invoked on every state transition. A callback
    /// that panics must never be allowed to corrupt breaker state — it runs
    /// after the transition is already committed and its panic is caught so
    /// the breaker keeps functioning.
    pub fn with_state_change_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(State, State) + Send + Sync + 'static,
    {
        self.state_change_callback = Some(Box::new(callback));
        self
    }

    fn transition(&self, inner: &mut Inner, new_state: State) {
        let old_state = inner.state;
        if old_state == new_state {
            return;
        }
        inner.state = new_state;
        if new_state == State::Open {
            inner.opened_at = Some(Instant::now());
        }
        if new_state == State::HalfOpen {
            inner.half_open_calls_issued = 0;
        }
        if let Some(callback) = &self.state_change_callback {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(old_state, new_state)));
        }
    }

    /// Whether a call may be attempted right now, transitioning OPEN to
    /// HALF_OPEN once the timeout has elapsed.
    fn admit(&self, inner: &mut Inner) -> bool {
        match inner.state {
            State::Closed => true,
            State::Open => {
                if inner.opened_at.is_some_and(|t| t.elapsed() >= self.timeout) {
                    self.transition(inner, State::HalfOpen);
                    true
                } else {
                    false
                }
            }
            State::HalfOpen => {
                if inner.half_open_calls_issued < self.half_open_max_calls {
                    inner.half_open_calls_issued += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Executes `f` with circuit-breaker protection. Rejects fail-fast with
    /// [`CallError::Open`] when the breaker is open; otherwise runs `f` and
    /// records the outcome.
    pub fn call<F, T, E>(&self, f: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        {
            let mut inner = self.inner.lock().expect("breaker lock poisoned");
            if !self.admit(&mut inner) {
                return Err(CallError::Open);
            }
            inner.total_calls += 1;
        }

        match f() {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CallError::Inner(e))
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.consecutive_failures = 0;
        if inner.state == State::HalfOpen {
            self.transition(&mut inner, State::Closed);
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.total_failures += 1;
        inner.consecutive_failures += 1;
        match inner.state {
            State::HalfOpen => self.transition(&mut inner, State::Open),
            State::Closed if inner.consecutive_failures >= self.failure_threshold => {
                self.transition(&mut inner, State::Open);
            }
            _ => {}
        }
    }

    pub fn metrics(&self) -> Metrics {
        let inner = self.inner.lock().expect("breaker lock poisoned");
        let failure_rate = if inner.total_calls > 0 {
            inner.total_failures as f64 / inner.total_calls as f64
        } else {
            0.0
        };
        Metrics {
            state: inner.state,
            total_calls: inner.total_calls,
            total_failures: inner.total_failures,
            consecutive_failures: inner.consecutive_failures,
            failure_rate,
            opened_at: inner.opened_at,
        }
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        self.transition(&mut inner, State::Closed);
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn state(&self) -> State {
        self.inner.lock().expect("breaker lock poisoned").state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> Result<(), &'static str> {
        Err("boom")
    }

    #[test]
    fn opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60), 1);
        for _ in 0..3 {
            let _ = breaker.call(failing);
        }
        assert_eq!(breaker.state(), State::Open);
    }

    #[test]
    fn open_breaker_rejects_fail_fast() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60), 1);
        let _ = breaker.call(failing);
        assert_eq!(breaker.call(|| Ok::<(), &'static str>(())), Err(CallError::Open));
    }

    #[test]
    fn half_open_success_closes_breaker() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0), 1);
        let _ = breaker.call(failing);
        assert_eq!(breaker.state(), State::Open);
        let result = breaker.call(|| Ok::<(), &'static str>(()));
        assert!(result.is_ok());
        assert_eq!(breaker.state(), State::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0), 1);
        let _ = breaker.call(failing); // CLOSED -> OPEN
        let result = breaker.call(failing); // timeout elapsed: admitted into HALF_OPEN, fails -> OPEN
        assert_eq!(result, Err(CallError::Inner("boom")));
        assert_eq!(breaker.state(), State::Open);
    }

    #[test]
    fn reset_clears_state() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60), 1);
        let _ = breaker.call(failing);
        assert_eq!(breaker.state(), State::Open);
        breaker.reset();
        assert_eq!(breaker.state(), State::Closed);
    }

    #[test]
    fn state_change_callback_panic_does_not_corrupt_state() {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(60), 1).with_state_change_callback(|_, _| panic!("boom"));
        let _ = breaker.call(failing);
        assert_eq!(breaker.state(), State::Open);
    }
}
