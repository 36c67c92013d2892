//! State Dispatcher (C5): the single authoritative owner of [`TableState`],
//! responsible for diffing incoming observations, enforcing the at-most-one
//! flag invariants, and emitting [`DetectionEvent`]s for real changes.
#![allow(dead_code)]

mod dispatcher;
mod event;
mod seat;
mod table_state;

pub use dispatcher::StateDispatcher;
pub use event::{DetectionEvent, ErrorKind, EventData, EventKind, Severity};
pub use seat::{Seat, SeatUpdate};
pub use table_state::{DataSource, TableState};
