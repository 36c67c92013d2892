use pt_core::{ActionKind, Card, Confidence, CorrelationId, Stage};

use crate::seat::Seat;

/// Discriminant for a [`DetectionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EventKind {
    Pot,
    Card,
    HeroCards,
    Player,
    Action,
    Street,
    HandStart,
    HandEnd,
    Performance,
    Error,
}

/// Severity of an `error`-kind event. `Error` is recoverable locally;
/// `Critical` covers escalated errors (e.g. `DispatcherStateError`) that
/// also reset the current hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Critical,
}

/// Error tags attached to `error`-kind events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    StaleState,
    Validation,
    DispatcherState,
    Backpressure,
}

/// Payload carried by a [`DetectionEvent`]; the active variant matches the
/// event's [`EventKind`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum EventData {
    Pot { amount: f64, side_pots: Vec<f64> },
    Cards(Vec<Card>),
    Player(Seat),
    Action { seat: u8, kind: ActionKind, amount: Option<f64> },
    Street(Stage),
    HandBoundary { hand_id: u64 },
    Performance { fps: f32, latency_ms: f32, memory_mb: Option<f32>, cpu_pct: Option<f32> },
    Error { kind: ErrorKind, severity: Severity, message: String },
}

/// One fact the dispatcher has observed and is fanning out over the event
/// bus and diagnostic log.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DetectionEvent {
    pub event_kind: EventKind,
    pub correlation_id: CorrelationId,
    pub previous: Option<EventData>,
    pub current: EventData,
    pub confidence: Confidence,
    pub t_mono_ns: u64,
}

impl DetectionEvent {
    pub fn backpressure(correlation_id: CorrelationId, t_mono_ns: u64, dropped: u64) -> Self {
        Self {
            event_kind: EventKind::Error,
            correlation_id,
            previous: None,
            current: EventData::Error {
                kind: ErrorKind::Backpressure,
                severity: Severity::Error,
                message: format!("dropped {dropped} events to event bus backpressure"),
            },
            confidence: Confidence::MAX,
            t_mono_ns,
        }
    }
}

impl pt_eventbus::Keyed for DetectionEvent {
    type Kind = EventKind;
    fn kind(&self) -> EventKind {
        self.event_kind
    }
}
