use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pt_capture::{CaptureError, CaptureSource, Frame, Roi, WindowHandle};
use pt_core::{ActionKind, Confidence, CorrelationId};
use pt_detect::{Observation, RegionHint, Slot, SlotValue, Strategy, TemplateLibrary};
use pt_dispatch::{DetectionEvent, SeatUpdate};
use pt_recognise::{filter_player_name, parse_stack, recognise_card};

use crate::app::App;

const GRACE_WINDOW: Duration = Duration::from_secs(2);

/// Runs strategies for one frame on a bounded pool"), racing each against a per-strategy timeout
/// so a laggard is dropped for this frame without blocking the rest of the
/// fan-out; its result, if it ever arrives, is simply discarded.
async fn fan_out(strategies: &[Arc<dyn Strategy>], frame: &Frame, timeout: Duration) -> Vec<Observation> {
    let pool_size = num_cpus::get().min(8).max(1);
    let frame = Arc::new(frame.clone());
    let mut observations = Vec::new();
    for chunk in strategies.chunks(pool_size) {
        let mut handles = Vec::with_capacity(chunk.len());
        for strategy in chunk {
            let strategy = strategy.clone();
            let frame = frame.clone();
            let id = strategy.id();
            let hint = RegionHint { roi: Roi { x: 0, y: 0, w: frame.width, h: frame.height } };
            let templates = TemplateLibrary::default();
            let task = tokio::task::spawn_blocking(move || strategy.detect(&frame, hint, &templates));
            handles.push((id, task));
        }
        for (id, task) in handles {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(Ok(obs))) => observations.extend(obs),
                Ok(Ok(Err(e))) => log::warn!("strategy {id} failed: {e}"),
                Ok(Err(join_err)) => log::warn!("strategy {id} panicked: {join_err}"),
                Err(_) => log::warn!("strategy {id} exceeded its {timeout:?} budget; dropping for this frame"),
            }
        }
    }
    observations
}

fn group_by_slot(observations: Vec<Observation>) -> HashMap<Slot, Vec<Observation>> {
    let mut groups: HashMap<Slot, Vec<Observation>> = HashMap::new();
    for obs in observations {
        groups.entry(obs.slot).or_default().push(obs);
    }
    groups
}

fn first_text(observations: &[Observation]) -> String {
    observations
        .iter()
        .find_map(|o| if let SlotValue::Text(t) = &o.value { Some(t.clone()) } else { None })
        .unwrap_or_default()
}

/// Splits one slot's observations by `SlotValue` variant. A seat can be
/// described by mixed claims in the same frame (a name string, a stack
/// amount, a dealer/active flag); the voter resolves one semantic kind of
/// claim at a time, so each variant is voted on independently.
fn partition_by_variant(observations: &[Observation]) -> (Vec<Observation>, Vec<Observation>, Vec<Observation>) {
    let mut texts = Vec::new();
    let mut amounts = Vec::new();
    let mut flags = Vec::new();
    for obs in observations {
        match &obs.value {
            SlotValue::Text(_) => texts.push(obs.clone()),
            SlotValue::Amount(_) => amounts.push(obs.clone()),
            SlotValue::Flag(_) => flags.push(obs.clone()),
            SlotValue::Card(_) => {}
        }
    }
    (texts, amounts, flags)
}

/// Resolves a `Slot::Seat(seat_number)` group into a [`SeatUpdate`] and
/// applies it, then reports a bet increase as a `bet`/`raise`/`all-in`
/// action. There is no
/// dedicated action slot in the detection model, so the action kind is
/// inferred from the seat's own current-bet/stack movement, the same
/// signal the hand recorder uses to derive actions after the fact.
fn apply_seat_group(app: &mut App, seat_number: u8, group: &[Observation], method: pt_detect::ResolutionMethod) {
    let (texts, amounts, flags) = partition_by_variant(group);
    let mut update = SeatUpdate::default();
    let mut confidences = Vec::new();

    if let Some(resolution) = app.voter.resolve(&texts, method) {
        if !resolution.low_trust {
            let raw = first_text(&texts);
            if let SlotValue::Text(_) = resolution.value {
                update.player_name = Some(filter_player_name(&raw));
                update.stack = update.stack.or_else(|| parse_stack(&raw));
                confidences.push(resolution.confidence.value());
            }
        }
    }
    if let Some(resolution) = app.voter.resolve(&amounts, method) {
        if !resolution.low_trust {
            if let Some(amount) = resolution.value.as_amount() {
                update.stack = Some(amount);
                confidences.push(resolution.confidence.value());
            }
        }
    }
    if let Some(resolution) = app.voter.resolve(&flags, method) {
        if !resolution.low_trust {
            if let SlotValue::Flag(is_active_turn) = resolution.value {
                update.is_active_turn = Some(is_active_turn);
                confidences.push(resolution.confidence.value());
            }
        }
    }

    if confidences.is_empty() {
        return;
    }
    let confidence = Confidence::new(confidences.iter().copied().fold(1.0_f32, f32::min));
    let before = app.dispatcher.get_state();
    let previous_seat = before.seat(seat_number);
    let previous_bet = previous_seat.map(|s| s.current_bet).unwrap_or(0.0);
    let previous_stack = previous_seat.map(|s| s.stack).unwrap_or(0.0);
    let new_stack = update.stack;
    let changed = app.dispatcher.update_player(seat_number, update, confidence);
    if !changed {
        return;
    }
    if let Some(stack) = new_stack {
        let committed = previous_stack - stack;
        if committed > f64::EPSILON {
            let kind = if stack <= f64::EPSILON {
                ActionKind::Allin
            } else if previous_bet > 0.0 {
                ActionKind::Raise
            } else {
                ActionKind::Bet
            };
            app.dispatcher.emit_player_action(seat_number, kind, Some(committed), confidence);
        }
    }
}

/// Resolves `Slot::DealerButton` and marks the winning seat as dealer;
/// `StateDispatcher::update_player`'s seat-exclusivity enforcement clears
/// the flag on every other seat.
fn apply_dealer_button(app: &mut App, group: &[Observation], method: pt_detect::ResolutionMethod) {
    let Some(resolution) = app.voter.resolve(group, method) else { return };
    if resolution.low_trust {
        return;
    }
    let Some(seat_number) = resolution.value.as_amount() else { return };
    let update = SeatUpdate { is_dealer: Some(true), ..Default::default() };
    app.dispatcher.update_player(seat_number as u8, update, resolution.confidence);
}

/// One iteration of the frame loop: `capture → strategies → voter →
/// recogniser → dispatcher.update_* → dispatcher.end_frame`.
pub async fn run_once(app: &mut App, source: &mut CaptureSource, handle: &WindowHandle, t: u64) {
    let frame_started = Instant::now();
    let _correlation = app.dispatcher.begin_frame();
    let frame_timer = app.telemetry.scope("frame");

    let frame = {
        let _capture_timer = app.telemetry.scope("capture");
        match source.capture(handle, None) {
            Ok(frame) => Some(frame),
            Err(e) => {
                if !matches!(e, CaptureError::Minimised | CaptureError::Occluded) {
                    log::warn!("capture failed: {e}");
                }
                app.dispatcher.apply_cached_fallback(0.0);
                None
            }
        }
    };

    if let Some(frame) = frame {
        let strategy_timeout = Duration::from_millis(app.config.strategies.timeout_ms);
        let observations = {
            let _strategy_timer = app.telemetry.scope("strategies");
            fan_out(&app.strategies, &frame, strategy_timeout).await
        };

        for obs in &observations {
            app.telemetry.record(&obs.strategy_id.to_string(), Duration::from_millis(obs.cost_ms as u64));
        }
        for strategy in &app.strategies {
            app.telemetry.enforce_budget(strategy.id(), strategy_timeout, &app.voter);
        }

        let method = app.ensemble_method();
        let groups = group_by_slot(observations);

        if let Some(pot_obs) = groups.get(&Slot::Pot) {
            if let Some(resolution) = app.voter.resolve(pot_obs, method) {
                let raw_text = first_text(pot_obs);
                if let Some(detection) = app.pot_recogniser.recognise(&resolution, &raw_text) {
                    app.dispatcher.update_pot(detection.amount, Vec::new(), detection.confidence);
                }
            }
        }

        let mut board_cards: Vec<(u8, pt_core::Card, f32)> = Vec::new();
        let mut hero_cards: Vec<(u8, pt_core::Card, f32)> = Vec::new();
        let mut seat_groups: Vec<(u8, &Vec<Observation>)> = Vec::new();
        let mut dealer_group: Option<&Vec<Observation>> = None;
        for (slot, group) in &groups {
            match slot {
                Slot::BoardCard(i) => {
                    if let Some(resolution) = app.voter.resolve(group, method) {
                        let confidence = resolution.confidence.value();
                        if let Some(card) = recognise_card(&resolution) {
                            board_cards.push((*i, card, confidence));
                        }
                    }
                }
                Slot::HeroCard(i) => {
                    if let Some(resolution) = app.voter.resolve(group, method) {
                        let confidence = resolution.confidence.value();
                        if let Some(card) = recognise_card(&resolution) {
                            hero_cards.push((*i, card, confidence));
                        }
                    }
                }
                Slot::Seat(seat_number) => seat_groups.push((*seat_number, group)),
                Slot::DealerButton => dealer_group = Some(group),
                Slot::Pot => {}
            }
        }
        if !board_cards.is_empty() {
            board_cards.sort_by_key(|(i, _, _)| *i);
            let confidence = board_cards.iter().map(|(_, _, c)| *c).fold(1.0_f32, f32::min);
            let cards = board_cards.into_iter().map(|(_, c, _)| c).collect();
            app.dispatcher.update_board_cards(cards, pt_core::Confidence::new(confidence));
        }
        if !hero_cards.is_empty() {
            hero_cards.sort_by_key(|(i, _, _)| *i);
            let confidence = hero_cards.iter().map(|(_, _, c)| *c).fold(1.0_f32, f32::min);
            let cards = hero_cards.into_iter().map(|(_, c, _)| c).collect();
            app.dispatcher.update_hero_cards(cards, pt_core::Confidence::new(confidence));
        }
        for (seat_number, group) in seat_groups {
            apply_seat_group(app, seat_number, group, method);
        }
        if let Some(group) = dealer_group {
            apply_dealer_button(app, group, method);
        }
    }

    if let Some(dropped) = app.bus.poll_backpressure() {
        app.bus.publish(DetectionEvent::backpressure(CorrelationId::next(), t, dropped));
    }

    if app.recording_enabled() {
        let state = app.dispatcher.get_state();
        if let Some(history) = app.recorder.observe(&state, t) {
            app.persist_hand(history);
        }
    }

    let latency_ms = frame_started.elapsed().as_secs_f32() * 1000.0;
    let fps = 1000.0 / latency_ms.max(f32::EPSILON);
    app.dispatcher.update_performance(fps, latency_ms, None, None);

    app.dispatcher.end_frame();
    drop(frame_timer);
}

/// Drives the frame loop until the shutdown flag is set, then allows
/// in-flight work up to [`GRACE_WINDOW`] before returning.
pub async fn run(app: &mut App, source: &mut CaptureSource, handle: &WindowHandle) {
    let interval = Duration::from_secs_f64(1.0 / app.config.capture.max_fps.max(1) as f64);
    let mut t: u64 = 0;
    loop {
        if app.shutdown.load(Ordering::SeqCst) {
            log::info!("shutdown flag observed, draining for {GRACE_WINDOW:?}");
            tokio::time::sleep(GRACE_WINDOW).await;
            break;
        }
        let tick_start = Instant::now();
        run_once(app, source, handle, t).await;
        t += 1;
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
}
