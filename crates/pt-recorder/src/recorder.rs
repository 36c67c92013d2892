use pt_core::{ActionKind, Stage};
use pt_dispatch::TableState;

use crate::history::{HandHistory, HeroResult, PlayerSummary, RecordedAction};
use crate::snapshot::HandSnapshot;

/// Amounts below this are recorder noise, not a real stack movement.
const ACTION_EPSILON: f64 = 0.01;

/// Minimum snapshots recorded before a pot-to-zero transition counts as a
/// hand ending, rather than a momentary misread.
const MIN_SNAPSHOTS_FOR_POT_TERMINAL: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderState {
    Idle,
    Recording,
    Completed,
}

/// Builds [`HandHistory`] records from a stream of [`TableState`]s (C6).
///
/// ```text
/// IDLE ──(start)──▶ RECORDING ──(terminal)──▶ COMPLETED ──(next start)──▶ RECORDING
/// ```
pub struct HandRecorder {
    state: RecorderState,
    snapshots: Vec<HandSnapshot>,
    site: String,
    table: String,
    hand_id: u64,
}

impl HandRecorder {
    pub fn new(site: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            state: RecorderState::Idle,
            snapshots: Vec::new(),
            site: site.into(),
            table: table.into(),
            hand_id: 0,
        }
    }

    /// Feeds one tick's authoritative state. Returns `Some(HandHistory)`
    /// exactly when a hand completes on this call.
    pub fn observe(&mut self, state: &TableState, t: u64) -> Option<HandHistory> {
        match self.state {
            RecorderState::Idle => {
                if self.start_condition_met(state) {
                    self.start(state, t);
                }
                None
            }
            RecorderState::Recording => {
                if self.terminal_condition_met(state) {
                    // The triggering frame already reflects the hand's
                    // outcome (payout stacks, cleared hero cards), so it
                    // becomes part of the record rather than being dropped.
                    self.push(state, t);
                    let history = self.complete();
                    self.state = RecorderState::Completed;
                    if self.start_condition_met(state) {
                        self.start(state, t);
                    }
                    Some(history)
                } else {
                    self.push(state, t);
                    None
                }
            }
            RecorderState::Completed => {
                if self.start_condition_met(state) {
                    self.start(state, t);
                }
                None
            }
        }
    }

    fn start_condition_met(&self, state: &TableState) -> bool {
        if state.pot_size > 0.0 && !state.hero_cards.is_empty() {
            return true;
        }
        if self.state == RecorderState::Completed {
            if let Some(last) = self.snapshots.last() {
                return !state.hero_cards.is_empty() && !same_set(&last.hero_cards, &state.hero_cards);
            }
        }
        false
    }

    fn terminal_condition_met(&self, state: &TableState) -> bool {
        let Some(last) = self.snapshots.last() else { return false };

        let hero_emptied = !last.hero_cards.is_empty() && state.hero_cards.is_empty();
        let pot_zeroed =
            last.pot_size > 0.0 && state.pot_size <= ACTION_EPSILON && self.snapshots.len() >= MIN_SNAPSHOTS_FOR_POT_TERMINAL;
        let stage_reset_with_new_hand = last.stage != Stage::Preflop
            && state.stage == Stage::Preflop
            && !same_set(&last.hero_cards, &state.hero_cards);

        hero_emptied || pot_zeroed || stage_reset_with_new_hand
    }

    fn start(&mut self, state: &TableState, t: u64) {
        self.hand_id += 1;
        self.snapshots.clear();
        self.state = RecorderState::Recording;
        self.push(state, t);
    }

    fn push(&mut self, state: &TableState, t: u64) {
        self.snapshots.push(HandSnapshot {
            t,
            stage: state.stage,
            pot_size: state.pot_size,
            board_cards: state.board_cards.clone(),
            active_players: state.active_players,
            hero_cards: state.hero_cards.clone(),
            hero_seat: state.hero_seat,
            seats: state.seats.clone(),
        });
    }

    /// Derives the terminal [`HandHistory`] from the recorded snapshot
    /// sequence. Never fails: if derivation hits an
    /// edge case, it still returns a best-effort record rather than
    /// panicking or blocking the recorder.
    fn complete(&mut self) -> HandHistory {
        let first = self.snapshots.first().expect("complete called with snapshots");
        let last = self.snapshots.last().expect("complete called with snapshots");

        let final_stage = self
            .snapshots
            .iter()
            .map(|s| s.stage)
            .max_by_key(|s| stage_rank(*s))
            .unwrap_or(Stage::Preflop);
        let pot_size = self.snapshots.iter().map(|s| s.pot_size).fold(0.0_f64, f64::max);

        let mut seat_numbers: Vec<u8> = first.seats.iter().map(|s| s.seat_number).collect();
        for s in last.seats.iter().map(|s| s.seat_number) {
            if !seat_numbers.contains(&s) {
                seat_numbers.push(s);
            }
        }

        let mut players = Vec::new();
        for seat_number in &seat_numbers {
            let Some(start_seat) = first.seat(*seat_number) else { continue };
            let Some(end_seat) = last.seat(*seat_number) else { continue };
            let won_amount = (end_seat.stack - start_seat.stack).max(0.0);
            players.push(PlayerSummary {
                seat: *seat_number,
                name: end_seat.player_name.clone(),
                starting_stack: start_seat.stack,
                ending_stack: end_seat.stack,
                position: end_seat.position.clone(),
                is_hero: end_seat.is_hero,
                cards: end_seat.hole_cards.clone(),
                won_amount,
            });
        }

        let mut actions = Vec::new();
        for pair in self.snapshots.windows(2) {
            let [prev, next] = pair else { continue };
            if next.pot_size + ACTION_EPSILON < prev.pot_size {
                continue; // payout transition, not a betting action
            }
            for seat_number in &seat_numbers {
                let (Some(before), Some(after)) = (prev.seat(*seat_number), next.seat(*seat_number)) else { continue };
                let delta = before.stack - after.stack;
                if delta > ACTION_EPSILON {
                    let kind = if after.stack <= ACTION_EPSILON { ActionKind::Allin } else { ActionKind::Bet };
                    actions.push(RecordedAction {
                        seat: *seat_number,
                        kind,
                        amount: round2(delta),
                        stage: next.stage,
                        t: next.t,
                    });
                }
            }
        }

        let winners: Vec<u8> = players.iter().filter(|p| p.ending_stack - p.starting_stack > ACTION_EPSILON).map(|p| p.seat).collect();

        // Prefer the seat actually flagged `is_hero`; if detection never
        // resolved that flag, fall back to the seat the dispatcher tracked
        // as `hero_seat` before giving up as unknown.
        let hero = players.iter().find(|p| p.is_hero).or_else(|| {
            last.hero_seat.or(first.hero_seat).and_then(|seat_number| players.iter().find(|p| p.seat == seat_number))
        });
        let (hero_net, hero_result, hero_name) = match hero {
            Some(hero) => {
                let net = hero.ending_stack - hero.starting_stack;
                let result = if net > ACTION_EPSILON {
                    HeroResult::Won
                } else if net < -ACTION_EPSILON {
                    HeroResult::Lost
                } else {
                    HeroResult::Pushed
                };
                (net, result, hero.name.clone())
            }
            None => (0.0, HeroResult::Unknown, None),
        };

        let duration_s = (last.t.saturating_sub(first.t)) as f64 / 1_000_000_000.0;

        HandHistory {
            hand_id: self.hand_id,
            start_t: first.t,
            site: self.site.clone(),
            table: self.table.clone(),
            small_blind: 0.0,
            big_blind: 0.0,
            hero_name,
            hero_cards: first.hero_cards.clone(),
            board_cards: last.board_cards.clone(),
            players,
            actions,
            pot_size,
            winners,
            hero_result,
            hero_net,
            final_stage,
            duration_s,
        }
    }
}

fn stage_rank(stage: Stage) -> u8 {
    match stage {
        Stage::Preflop => 0,
        Stage::Flop => 1,
        Stage::Turn => 2,
        Stage::River => 3,
        Stage::Showdown => 4,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn same_set(a: &[pt_core::Card], b: &[pt_core::Card]) -> bool {
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
    use pt_core::{Card, Confidence, Rank, Suit};
    use pt_dispatch::{DataSource, Seat};

    fn table_with(pot: f64, hero_cards: Vec<Card>, stage: Stage, stacks: &[(u8, f64, bool)]) -> TableState {
        let mut state = TableState::new("site", "table");
        state.pot_size = pot;
        state.hero_cards = hero_cards;
        state.stage = stage;
        state.detection_confidence = Confidence::new(0.9);
        state.data_source = DataSource::Live;
        for (seat_number, stack, is_hero) in stacks {
            let mut seat = Seat::new(*seat_number);
            seat.stack = *stack;
            seat.is_hero = *is_hero;
            state.seats.push(seat);
        }
        state
    }

    #[test]
    fn starts_when_pot_and_hero_cards_present() {
        let mut recorder = HandRecorder::new("site", "table");
        let cards = vec![Card::new(Rank::Ace, Suit::S), Card::new(Rank::King, Suit::S)];
        let result = recorder.observe(&table_with(10.0, cards, Stage::Preflop, &[(1, 100.0, true)]), 1);
        assert!(result.is_none());
    }

    #[test]
    fn completes_when_hero_cards_clear_after_pot() {
        let mut recorder = HandRecorder::new("site", "table");
        let cards = vec![Card::new(Rank::Ace, Suit::S), Card::new(Rank::King, Suit::S)];
        recorder.observe(&table_with(10.0, cards.clone(), Stage::Preflop, &[(1, 100.0, true), (2, 100.0, false)]), 1);
        recorder.observe(&table_with(20.0, cards, Stage::Flop, &[(1, 90.0, true), (2, 90.0, false)]), 2);
        let history = recorder.observe(&table_with(20.0, vec![], Stage::Flop, &[(1, 90.0, true), (2, 90.0, false)]), 3);
        assert!(history.is_some());
        let history = history.unwrap();
        assert_eq!(history.final_stage, Stage::Flop);
    }

    #[test]
    fn derives_winner_from_stack_increase() {
        let mut recorder = HandRecorder::new("site", "table");
        let cards = vec![Card::new(Rank::Ace, Suit::S), Card::new(Rank::King, Suit::S)];
        recorder.observe(&table_with(10.0, cards.clone(), Stage::Preflop, &[(1, 100.0, true), (2, 100.0, false)]), 1);
        recorder.observe(&table_with(20.0, cards.clone(), Stage::Flop, &[(1, 90.0, true), (2, 90.0, false)]), 2);
        recorder.observe(&table_with(20.0, cards.clone(), Stage::Flop, &[(1, 90.0, true), (2, 90.0, false)]), 3);
        let history = recorder
            .observe(&table_with(0.0, vec![], Stage::Flop, &[(1, 110.0, true), (2, 90.0, false)]), 4)
            .unwrap();
        assert_eq!(history.winners, vec![1]);
        assert_eq!(history.hero_result, HeroResult::Won);
    }

    #[test]
    fn falls_back_to_tracked_hero_seat_when_no_seat_is_flagged_hero() {
        let mut recorder = HandRecorder::new("site", "table");
        let cards = vec![Card::new(Rank::Ace, Suit::S), Card::new(Rank::King, Suit::S)];

        let mut start = table_with(10.0, cards.clone(), Stage::Preflop, &[(1, 100.0, false), (2, 100.0, false)]);
        start.hero_seat = Some(1);
        recorder.observe(&start, 1);

        let mut mid = table_with(20.0, cards, Stage::Flop, &[(1, 90.0, false), (2, 90.0, false)]);
        mid.hero_seat = Some(1);
        recorder.observe(&mid, 2);
        recorder.observe(&mid, 3);

        let mut end = table_with(0.0, vec![], Stage::Flop, &[(1, 110.0, false), (2, 90.0, false)]);
        end.hero_seat = Some(1);
        let history = recorder.observe(&end, 4).unwrap();

        assert_eq!(history.hero_result, HeroResult::Won);
        assert!((history.hero_net - 10.0).abs() < 1e-6);
    }
}
