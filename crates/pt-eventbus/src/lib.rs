//! Event Bus (C9): typed publish/subscribe fan-out to consumers.
//!
//! Delivery is synchronous within the publishing call for handlers that did
//! not opt into `async`; `async` subscribers get their own bounded queue and
//! drain it from wherever they choose.
#![allow(dead_code)]

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tokio::sync::mpsc;

/// Default bound for async subscriber queues.
pub const ASYNC_QUEUE_CAPACITY: usize = 1024;

/// Lets the bus route a published value to the subscribers registered for
/// its kind without knowing the domain event type.
pub trait Keyed {
    type Kind: Eq + Hash + Clone + Send + 'static;
    fn kind(&self) -> Self::Kind;
}

/// A handle returned by `subscribe`, used to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

enum Subscriber<T> {
    Sync(Box<dyn Fn(&T) + Send + Sync>),
    Async(mpsc::Sender<T>),
}

/// Typed pub/sub bus over events of type `T`.
pub struct EventBus<T: Keyed> {
    subscribers: Mutex<HashMap<T::Kind, Vec<(Token, Subscriber<T>)>>>,
    next_token: AtomicU64,
    dropped_since_signal: AtomicU64,
    last_signal: Mutex<Instant>,
}

impl<T: Keyed + Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed + Clone> EventBus<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(0),
            dropped_since_signal: AtomicU64::new(0),
            last_signal: Mutex::new(Instant::now()),
        }
    }

    fn reserve_token(&self) -> Token {
        Token(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a synchronous handler, invoked inline during `publish`.
    pub fn subscribe<F>(&self, kind: T::Kind, handler: F) -> Token
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let token = self.reserve_token();
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .entry(kind)
            .or_default()
            .push((token, Subscriber::Sync(Box::new(handler))));
        token
    }

    /// Registers an async subscriber backed by a bounded channel. Overflow
    /// drops the event and counts toward the next backpressure signal rather
    /// than blocking the publisher.
    pub fn subscribe_async(&self, kind: T::Kind) -> (Token, mpsc::Receiver<T>) {
        let (tx, rx) = mpsc::channel(ASYNC_QUEUE_CAPACITY);
        let token = self.reserve_token();
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .entry(kind)
            .or_default()
            .push((token, Subscriber::Async(tx)));
        (token, rx)
    }

    pub fn unsubscribe(&self, token: Token) {
        let mut subscribers = self.subscribers.lock().expect("event bus lock poisoned");
        for subs in subscribers.values_mut() {
            subs.retain(|(t, _)| *t != token);
        }
    }

    /// Delivers `event` to every subscriber registered for its kind, in
    /// subscription order (FIFO per subscriber).
    pub fn publish(&self, event: T) {
        let kind = event.kind();
        let subscribers = self.subscribers.lock().expect("event bus lock poisoned");
        let Some(subs) = subscribers.get(&kind) else {
            return;
        };
        for (_, subscriber) in subs {
            match subscriber {
                Subscriber::Sync(handler) => handler(&event),
                Subscriber::Async(tx) => {
                    if tx.try_send(event.clone()).is_err() {
                        self.dropped_since_signal.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }
    }

    /// Returns the number of events dropped to overflow since the last
    /// signal, provided at least one second has elapsed and at least one
    /// event was dropped — a single backpressure signal per second.
    /// Callers turn this into a domain event.
    pub fn poll_backpressure(&self) -> Option<u64> {
        let mut last = self.last_signal.lock().expect("event bus lock poisoned");
        if last.elapsed() < std::time::Duration::from_secs(1) {
            return None;
        }
        let dropped = self.dropped_since_signal.swap(0, Ordering::Relaxed);
        *last = Instant::now();
        if dropped == 0 {
            None
        } else {
            log::warn!("event bus dropped {dropped} events to backpressure in the last second");
            Some(dropped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum TestKind {
        A,
        B,
    }

    #[derive(Clone, Debug)]
    struct TestEvent(TestKind, u32);

    impl Keyed for TestEvent {
        type Kind = TestKind;
        fn kind(&self) -> TestKind {
            self.0.clone()
        }
    }

    #[test]
    fn sync_subscribers_are_called_inline_in_order() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o1 = order.clone();
        bus.subscribe(TestKind::A, move |e| o1.lock().unwrap().push(("first", e.1)));
        let o2 = order.clone();
        bus.subscribe(TestKind::A, move |e| o2.lock().unwrap().push(("second", e.1)));
        bus.publish(TestEvent(TestKind::A, 7));
        assert_eq!(*order.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn only_matching_kind_is_notified() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        bus.subscribe(TestKind::A, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(TestEvent(TestKind::B, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        bus.publish(TestEvent(TestKind::A, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let token = bus.subscribe(TestKind::A, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        bus.unsubscribe(token);
        bus.publish(TestEvent(TestKind::A, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn async_overflow_is_dropped_not_blocked() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let (_token, mut rx) = bus.subscribe_async(TestKind::A);
        for i in 0..(ASYNC_QUEUE_CAPACITY + 5) {
            bus.publish(TestEvent(TestKind::A, i as u32));
        }
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, ASYNC_QUEUE_CAPACITY);
    }
}
