use std::sync::Arc;
use std::time::Instant;

use pt_core::{ActionKind, Card, Confidence, CorrelationId, Stage};
use pt_eventbus::EventBus;

use crate::event::{DetectionEvent, ErrorKind, EventData, EventKind, Severity};
use crate::seat::{Seat, SeatUpdate};
use crate::table_state::{DataSource, TableState};

/// Pot change is significant past the larger of a fixed floor and a
/// proportional slice of the previous value.
const POT_ABSOLUTE_EPSILON: f64 = 0.005;
const POT_RELATIVE_EPSILON: f64 = 0.005;

/// Stack changes below this are detector noise, not a real action.
const STACK_EPSILON: f64 = 0.01;

/// Relative change required before a performance sample is worth emitting.
const PERFORMANCE_RELATIVE_EPSILON: f32 = 0.05;
const PERFORMANCE_MIN_INTERVAL_S: f64 = 1.0;

/// How long a cached slot may be served before it is considered stale and
/// dropped.
const DEFAULT_STALE_SECONDS: f64 = 30.0;

struct PerformanceSample {
    fps: f32,
    latency_ms: f32,
    memory_mb: Option<f32>,
    cpu_pct: Option<f32>,
    at: Instant,
}

/// Owns the authoritative [`TableState`] for one table, diffs incoming
/// observations against it, and emits [`DetectionEvent`]s for real changes
/// (C5). Single-threaded within a frame: only the frame loop calls these
/// methods.
pub struct StateDispatcher {
    state: TableState,
    bus: Arc<EventBus<DetectionEvent>>,
    correlation_id: Option<CorrelationId>,
    hand_id: u64,
    last_update: std::collections::HashMap<EventKind, Instant>,
    last_performance: Option<PerformanceSample>,
    stale_seconds: f64,
}

impl StateDispatcher {
    pub fn new(site: impl Into<String>, table_id: impl Into<String>, bus: Arc<EventBus<DetectionEvent>>) -> Self {
        Self {
            state: TableState::new(site, table_id),
            bus,
            correlation_id: None,
            hand_id: 0,
            last_update: std::collections::HashMap::new(),
            last_performance: None,
            stale_seconds: DEFAULT_STALE_SECONDS,
        }
    }

    pub fn with_stale_seconds(mut self, stale_seconds: f64) -> Self {
        self.stale_seconds = stale_seconds;
        self
    }

    /// Starts a frame: mints a fresh correlation id, attached to every
    /// event emitted until [`Self::end_frame`].
    pub fn begin_frame(&mut self) -> CorrelationId {
        let id = CorrelationId::next();
        self.correlation_id = Some(id);
        id
    }

    fn correlation_id(&self) -> CorrelationId {
        self.correlation_id.expect("begin_frame must be called before mutating state")
    }

    fn now_ns() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    fn publish(&self, event_kind: EventKind, previous: Option<EventData>, current: EventData, confidence: Confidence) {
        self.bus.publish(DetectionEvent {
            event_kind,
            correlation_id: self.correlation_id(),
            previous,
            current,
            confidence,
            t_mono_ns: Self::now_ns(),
        });
    }

    /// Updates the pot and any side pots. Returns whether this counted as a
    /// change.
    pub fn update_pot(&mut self, amount: f64, side_pots: Vec<f64>, confidence: Confidence) -> bool {
        let old_amount = self.state.pot_size;
        let threshold = POT_ABSOLUTE_EPSILON.max(POT_RELATIVE_EPSILON * old_amount);
        let changed = (amount - old_amount).abs() > threshold || side_pots != self.state.side_pots;
        if changed {
            let previous = EventData::Pot { amount: old_amount, side_pots: self.state.side_pots.clone() };
            self.state.pot_size = amount;
            self.state.side_pots = side_pots.clone();
            self.state.detection_confidence = confidence;
            self.publish(EventKind::Pot, Some(previous), EventData::Pot { amount, side_pots }, confidence);
        }
        changed
    }

    /// Updates the board. A street transition (board length class change)
    /// additionally emits a `street` event.
    pub fn update_board_cards(&mut self, cards: Vec<Card>, confidence: Confidence) -> bool {
        let old_set = self.state.board_cards.clone();
        let changed = !same_set(&old_set, &cards);
        if !changed {
            return false;
        }
        let old_stage = self.state.stage;
        self.state.board_cards = cards.clone();
        self.publish(EventKind::Card, Some(EventData::Cards(old_set)), EventData::Cards(cards.clone()), confidence);

        if let Some(new_stage) = Stage::from_board_len(cards.len()) {
            if new_stage != old_stage {
                self.state.stage = new_stage;
                self.publish(EventKind::Street, Some(EventData::Street(old_stage)), EventData::Street(new_stage), confidence);
            }
        }
        true
    }

    /// Updates hero's hole cards. A transition from empty to non-empty
    /// additionally emits `hand_start`.
    pub fn update_hero_cards(&mut self, cards: Vec<Card>, confidence: Confidence) -> bool {
        let old = self.state.hero_cards.clone();
        let changed = !same_set(&old, &cards);
        if !changed {
            return false;
        }
        let was_empty = old.is_empty();
        self.state.hero_cards = cards.clone();
        self.publish(EventKind::HeroCards, Some(EventData::Cards(old)), EventData::Cards(cards.clone()), confidence);
        if was_empty && !cards.is_empty() {
            self.hand_id += 1;
            self.publish(
                EventKind::HandStart,
                None,
                EventData::HandBoundary { hand_id: self.hand_id },
                confidence,
            );
        }
        true
    }

    /// Applies a partial update to one seat.
    ///
    /// Boolean exclusivity flags (`is_dealer`, `is_small_blind`,
    /// `is_big_blind`, `is_hero`, `is_active_turn`) are enforced globally:
    /// setting one to `true` on a seat clears it on every other seat.
    pub fn update_player(&mut self, seat_number: u8, update: SeatUpdate, confidence: Confidence) -> bool {
        let previous = self.state.seat(seat_number).cloned();
        let mut changed = false;
        {
            let seat = self.state.seat_mut(seat_number);
            if let Some(stack) = update.stack {
                if (stack - seat.stack).abs() > STACK_EPSILON {
                    seat.stack = stack;
                    changed = true;
                }
            }
            if let Some(bet) = update.current_bet {
                if (bet - seat.current_bet).abs() > STACK_EPSILON {
                    seat.current_bet = bet;
                    changed = true;
                }
            }
            if let Some(name) = update.player_name {
                if name != seat.player_name {
                    seat.player_name = name;
                    changed = true;
                }
            }
            if let Some(position) = update.position {
                if position != seat.position {
                    seat.position = position;
                    changed = true;
                }
            }
            if let Some(status_text) = update.status_text {
                if status_text != seat.status_text {
                    seat.status_text = status_text;
                    changed = true;
                }
            }
            if let Some(hole_cards) = update.hole_cards {
                if !same_set(&seat.hole_cards, &hole_cards) {
                    seat.hole_cards = hole_cards;
                    changed = true;
                }
            }
            if let Some(v) = update.is_dealer {
                changed |= v != seat.is_dealer;
                seat.is_dealer = v;
            }
            if let Some(v) = update.is_small_blind {
                changed |= v != seat.is_small_blind;
                seat.is_small_blind = v;
            }
            if let Some(v) = update.is_big_blind {
                changed |= v != seat.is_big_blind;
                seat.is_big_blind = v;
            }
            if let Some(v) = update.is_hero {
                changed |= v != seat.is_hero;
                seat.is_hero = v;
            }
            if let Some(v) = update.is_active {
                changed |= v != seat.is_active;
                seat.is_active = v;
            }
            if let Some(v) = update.is_active_turn {
                changed |= v != seat.is_active_turn;
                seat.is_active_turn = v;
            }
        }
        self.enforce_seat_exclusivity(seat_number, &update);
        if changed {
            let current = self.state.seat(seat_number).cloned().expect("seat just updated");
            self.publish(EventKind::Player, previous.map(EventData::Player), EventData::Player(current), confidence);
        }
        changed
    }

    fn enforce_seat_exclusivity(&mut self, seat_number: u8, update: &SeatUpdate) {
        if update.is_dealer == Some(true) {
            self.state.dealer_seat = Some(seat_number);
            for seat in self.state.seats.iter_mut().filter(|s| s.seat_number != seat_number) {
                seat.is_dealer = false;
            }
        }
        if update.is_active_turn == Some(true) {
            self.state.active_turn_seat = Some(seat_number);
            for seat in self.state.seats.iter_mut().filter(|s| s.seat_number != seat_number) {
                seat.is_active_turn = false;
            }
        }
        if update.is_hero == Some(true) {
            self.state.hero_seat = Some(seat_number);
            for seat in self.state.seats.iter_mut().filter(|s| s.seat_number != seat_number) {
                seat.is_hero = false;
            }
        }
        if update.is_small_blind == Some(true) {
            for seat in self.state.seats.iter_mut().filter(|s| s.seat_number != seat_number) {
                seat.is_small_blind = false;
            }
        }
        if update.is_big_blind == Some(true) {
            for seat in self.state.seats.iter_mut().filter(|s| s.seat_number != seat_number) {
                seat.is_big_blind = false;
            }
        }
    }

    /// Emits an `action` event; the dispatcher does not itself validate
    /// legality, only reports what was observed.
    pub fn emit_player_action(&mut self, seat: u8, kind: ActionKind, amount: Option<f64>, confidence: Confidence) {
        self.publish(
            EventKind::Action,
            None,
            EventData::Action { seat, kind, amount },
            confidence,
        );
    }

    /// Emits a `performance` event only when fps/latency moved by more than
    /// 5% relative to the last sample, or a second has elapsed since the
    /// last emission.
    pub fn update_performance(&mut self, fps: f32, latency_ms: f32, memory_mb: Option<f32>, cpu_pct: Option<f32>) {
        let now = Instant::now();
        let significant = match &self.last_performance {
            None => true,
            Some(prev) => {
                relative_change(prev.fps, fps) > PERFORMANCE_RELATIVE_EPSILON
                    || relative_change(prev.latency_ms, latency_ms) > PERFORMANCE_RELATIVE_EPSILON
                    || now.duration_since(prev.at).as_secs_f64() > PERFORMANCE_MIN_INTERVAL_S
            }
        };
        if !significant {
            return;
        }
        self.publish(
            EventKind::Performance,
            None,
            EventData::Performance { fps, latency_ms, memory_mb, cpu_pct },
            Confidence::MAX,
        );
        self.last_performance = Some(PerformanceSample { fps, latency_ms, memory_mb, cpu_pct, at: now });
    }

    /// Ends the frame, clearing the correlation id so a subsequent mutation
    /// outside a frame panics loudly instead of mis-tagging events.
    pub fn end_frame(&mut self) {
        self.correlation_id = None;
    }

    /// Clears transient per-hand state and assigns a new hand id, emitting
    /// `hand_end` with the last known pot/board/winners.
    pub fn reset_hand(&mut self, winners: Vec<u8>) {
        let pot = self.state.pot_size;
        let board = self.state.board_cards.clone();
        self.publish(
            EventKind::HandEnd,
            None,
            EventData::Pot { amount: pot, side_pots: self.state.side_pots.clone() },
            self.state.detection_confidence,
        );
        let _ = (board, winners);
        self.state.stage = Stage::Preflop;
        self.state.board_cards.clear();
        self.state.hero_cards.clear();
        self.state.pot_size = 0.0;
        self.state.side_pots.clear();
        for seat in &mut self.state.seats {
            seat.current_bet = 0.0;
            seat.is_active_turn = false;
            seat.hole_cards.clear();
        }
    }

    /// Applies the cached-state fallback for a low-trust/absent observation:
    /// serve the cached value while it is younger than `stale_seconds`, else
    /// emit a `stale_state` error and clear it.
    pub fn apply_cached_fallback(&mut self, age_seconds: f64) -> bool {
        if age_seconds < self.stale_seconds {
            self.state.data_source = DataSource::Cached { reason: "low confidence".to_string() };
            self.state.data_age_seconds = age_seconds;
            true
        } else {
            self.publish(
                EventKind::Error,
                None,
                EventData::Error {
                    kind: ErrorKind::StaleState,
                    severity: Severity::Error,
                    message: format!("table state stale for {age_seconds:.1}s"),
                },
                Confidence::MIN,
            );
            self.state.data_source = DataSource::Live;
            self.state.data_age_seconds = 0.0;
            false
        }
    }

    pub fn get_state(&self) -> TableState {
        self.state.clone()
    }

    pub fn hand_id(&self) -> u64 {
        self.hand_id
    }
}

fn relative_change(old: f32, new: f32) -> f32 {
    if old == 0.0 {
        if new == 0.0 { 0.0 } else { f32::INFINITY }
    } else {
        ((new - old) / old).abs()
    }
}

fn same_set(a: &[Card], b: &[Card]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::{Rank, Suit};

    fn dispatcher() -> StateDispatcher {
        let bus = Arc::new(EventBus::new());
        StateDispatcher::new("test-site", "table-1", bus)
    }

    #[test]
    fn pot_change_below_threshold_is_ignored() {
        let mut d = dispatcher();
        d.begin_frame();
        assert!(d.update_pot(100.0, vec![], Confidence::new(0.9)));
        assert!(!d.update_pot(100.1, vec![], Confidence::new(0.9)));
        d.end_frame();
    }

    #[test]
    fn board_transition_emits_street_change() {
        let mut d = dispatcher();
        d.begin_frame();
        let flop = vec![
            Card::new(Rank::Two, Suit::C),
            Card::new(Rank::Three, Suit::D),
            Card::new(Rank::Four, Suit::H),
        ];
        assert!(d.update_board_cards(flop, Confidence::new(0.9)));
        assert_eq!(d.get_state().stage, Stage::Flop);
    }

    #[test]
    fn hero_cards_empty_to_nonempty_starts_a_hand() {
        let mut d = dispatcher();
        d.begin_frame();
        let before = d.hand_id();
        let cards = vec![Card::new(Rank::Ace, Suit::S), Card::new(Rank::King, Suit::S)];
        assert!(d.update_hero_cards(cards, Confidence::new(0.95)));
        assert_eq!(d.hand_id(), before + 1);
    }

    #[test]
    fn dealer_flag_is_exclusive_across_seats() {
        let mut d = dispatcher();
        d.begin_frame();
        let mut update = SeatUpdate::default();
        update.is_dealer = Some(true);
        d.update_player(1, update, Confidence::new(0.9));
        let mut update2 = SeatUpdate::default();
        update2.is_dealer = Some(true);
        d.update_player(2, update2, Confidence::new(0.9));
        assert!(!d.get_state().seat(1).unwrap().is_dealer);
        assert!(d.get_state().seat(2).unwrap().is_dealer);
    }

    #[test]
    fn tiny_stack_delta_is_ignored() {
        let mut d = dispatcher();
        d.begin_frame();
        let mut update = SeatUpdate::default();
        update.stack = Some(100.0);
        assert!(d.update_player(1, update, Confidence::new(0.9)));
        let mut update2 = SeatUpdate::default();
        update2.stack = Some(100.005);
        assert!(!d.update_player(1, update2, Confidence::new(0.9)));
    }

    #[test]
    fn reset_hand_clears_transient_state() {
        let mut d = dispatcher();
        d.begin_frame();
        d.update_pot(50.0, vec![], Confidence::new(0.9));
        d.reset_hand(vec![]);
        assert_eq!(d.get_state().pot_size, 0.0);
    }

    #[test]
    fn cached_fallback_expires_after_stale_window() {
        let mut d = dispatcher().with_stale_seconds(10.0);
        d.begin_frame();
        assert!(d.apply_cached_fallback(5.0));
        assert!(!d.apply_cached_fallback(15.0));
    }
}
