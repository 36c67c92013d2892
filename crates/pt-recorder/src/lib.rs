//! Hand Recorder (C6): builds [`HandHistory`] records from a sequence of
//! [`TableState`](pt_dispatch::TableState) snapshots via an IDLE/RECORDING/
//! COMPLETED state machine.
#![allow(dead_code)]

mod history;
mod recorder;
mod snapshot;

pub use history::{HandHistory, HeroResult, PlayerSummary, RecordedAction};
pub use recorder::HandRecorder;
pub use snapshot::HandSnapshot;
