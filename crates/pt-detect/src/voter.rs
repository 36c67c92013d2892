use std::collections::HashMap;
use std::sync::RwLock;

use crate::observation::{Observation, StrategyId};
use crate::slot::SlotValue;
use pt_core::Confidence;

/// Learning rate for online weight adaptation.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Minimum weight floor preventing a strategy from starving to zero
/// influence.
pub const MIN_WEIGHT: f64 = 0.01;

/// Disagreement above which a resolution is tagged `low_trust` and treated
/// as absent by the recorder.
pub const LOW_TRUST_DISAGREEMENT: f64 = 0.5;

/// How observations for a slot are combined into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    WeightedVote,
    HighestConfidence,
    Majority,
    WeightedAverage,
}

/// Outcome of resolving one slot's observations.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub value: SlotValue,
    pub confidence: Confidence,
    pub method: ResolutionMethod,
    pub contributors: Vec<StrategyId>,
    pub disagreement: f64,
    pub low_trust: bool,
}

/// Combines conflicting [`Observation`]s for the same slot and adapts
/// per-strategy weights from reward feedback.
pub struct EnsembleVoter {
    weights: RwLock<HashMap<StrategyId, f64>>,
    learning_rate: f64,
}

impl Default for EnsembleVoter {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE)
    }
}

impl EnsembleVoter {
    pub fn new(learning_rate: f64) -> Self {
        Self { weights: RwLock::new(HashMap::new()), learning_rate }
    }

    fn weight_of(&self, id: StrategyId) -> f64 {
        *self.weights.read().expect("voter lock poisoned").get(&id).unwrap_or(&1.0)
    }

    /// Current effective weight for a strategy (defaults to `1.0` until
    /// adapted by [`Self::update_weights`] or [`Self::penalise`]).
    pub fn weight(&self, id: StrategyId) -> f64 {
        self.weight_of(id)
    }

    /// Resolves a slot's observations into a single value.
    ///
    /// Observations are assumed to already be scoped to one slot; the voter
    /// does not filter by `slot` itself.
    pub fn resolve(&self, observations: &[Observation], method: ResolutionMethod) -> Option<Resolution> {
        if observations.is_empty() {
            return None;
        }
        match method {
            ResolutionMethod::WeightedAverage => Some(self.weighted_average(observations)),
            ResolutionMethod::HighestConfidence => Some(self.highest_confidence(observations)),
            ResolutionMethod::Majority => Some(self.majority(observations)),
            ResolutionMethod::WeightedVote => Some(self.weighted_vote(observations)),
        }
    }

    fn score(&self, obs: &Observation) -> f64 {
        self.weight_of(obs.strategy_id) * obs.confidence.value() as f64
    }

    /// Groups observations by value using `PartialEq`, since a numeric
    /// [`SlotValue::Amount`] cannot key a `HashMap`.
    fn group_by_value<'a>(observations: &'a [Observation]) -> Vec<(&'a SlotValue, Vec<&'a Observation>)> {
        let mut groups: Vec<(&SlotValue, Vec<&Observation>)> = Vec::new();
        for obs in observations {
            match groups.iter_mut().find(|(v, _)| **v == obs.value) {
                Some((_, members)) => members.push(obs),
                None => groups.push((&obs.value, vec![obs])),
            }
        }
        groups
    }

    /// Orders two candidate groups by score, then (on an exact tie) by the
    /// lowest contributing [`StrategyId`].
    fn compare_candidates(score_a: f64, members_a: &[&Observation], score_b: f64, members_b: &[&Observation]) -> std::cmp::Ordering {
        score_a
            .partial_cmp(&score_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let min_b = members_b.iter().map(|o| o.strategy_id).min().expect("non-empty group");
                let min_a = members_a.iter().map(|o| o.strategy_id).min().expect("non-empty group");
                min_b.cmp(&min_a)
            })
    }

    fn weighted_vote(&self, observations: &[Observation]) -> Resolution {
        let groups = Self::group_by_value(observations);
        let total: f64 = observations.iter().map(|o| self.score(o)).sum();
        let scored: Vec<(&SlotValue, f64, &Vec<&Observation>)> =
            groups.iter().map(|(v, members)| (*v, members.iter().map(|o| self.score(o)).sum::<f64>(), members)).collect();
        let (winner, winner_score, _) = scored
            .iter()
            .max_by(|a, b| Self::compare_candidates(a.1, a.2, b.1, b.2))
            .map(|(v, s, m)| (*v, *s, *m))
            .expect("non-empty observations");
        let winner = winner.clone();
        let contributors: Vec<StrategyId> = observations
            .iter()
            .filter(|o| o.value == winner)
            .map(|o| o.strategy_id)
            .collect();
        let confidence = if total > 0.0 { (winner_score / total) as f32 } else { 0.0 };
        self.finish(winner, confidence, ResolutionMethod::WeightedVote, contributors, observations.len())
    }

    fn majority(&self, observations: &[Observation]) -> Resolution {
        let groups = Self::group_by_value(observations);
        let (winner, count, _) = groups
            .iter()
            .map(|(v, members)| (*v, members.len(), members))
            .max_by(|a, b| Self::compare_candidates(a.1 as f64, a.2, b.1 as f64, b.2))
            .expect("non-empty observations");
        let winner = winner.clone();
        let contributors: Vec<StrategyId> = observations
            .iter()
            .filter(|o| o.value == winner)
            .map(|o| o.strategy_id)
            .collect();
        let confidence = count as f32 / observations.len() as f32;
        self.finish(winner, confidence, ResolutionMethod::Majority, contributors, observations.len())
    }

    fn highest_confidence(&self, observations: &[Observation]) -> Resolution {
        // Minimum-count override: if two strategies agree on a value, prefer
        // that value over a single higher-confidence outlier.
        let groups = Self::group_by_value(observations);
        if let Some((value, members)) = groups.iter().find(|(_, members)| members.len() >= 2) {
            let value = (*value).clone();
            let contributors: Vec<StrategyId> = members.iter().map(|o| o.strategy_id).collect();
            let confidence = members.iter().map(|o| o.confidence.value()).fold(0.0_f32, f32::max);
            return self.finish(value, confidence, ResolutionMethod::HighestConfidence, contributors, observations.len());
        }
        let best = observations
            .iter()
            .max_by(|a, b| {
                a.confidence
                    .value()
                    .partial_cmp(&b.confidence.value())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.strategy_id.cmp(&a.strategy_id))
            })
            .expect("non-empty observations");
        self.finish(
            best.value.clone(),
            best.confidence.value(),
            ResolutionMethod::HighestConfidence,
            vec![best.strategy_id],
            observations.len(),
        )
    }

    fn weighted_average(&self, observations: &[Observation]) -> Resolution {
        let mut weighted_sum = 0.0_f64;
        let mut weight_total = 0.0_f64;
        for obs in observations {
            let Some(amount) = obs.value.as_amount() else { continue };
            let w = self.score(obs);
            weighted_sum += w * amount;
            weight_total += w;
        }
        let value = if weight_total > 0.0 { weighted_sum / weight_total } else { 0.0 };
        let confidence = observations.iter().map(|o| o.confidence.value()).sum::<f32>() / observations.len() as f32;
        let contributors = observations.iter().map(|o| o.strategy_id).collect();
        self.finish(SlotValue::Amount(value), confidence, ResolutionMethod::WeightedAverage, contributors, observations.len())
    }

    fn finish(
        &self,
        value: SlotValue,
        confidence: f32,
        method: ResolutionMethod,
        contributors: Vec<StrategyId>,
        total_votes: usize,
    ) -> Resolution {
        let winner_votes = contributors.len();
        let disagreement = 1.0 - (winner_votes as f64 / total_votes as f64);
        Resolution {
            value,
            confidence: Confidence::new(confidence),
            method,
            contributors,
            disagreement,
            low_trust: disagreement > LOW_TRUST_DISAGREEMENT,
        }
    }

    /// Online weight adaptation from a reward in `[0,1]`:
    /// `w_i ← (1-η)·w_i + η·reward_i`, then renormalise with a floor.
    pub fn update_weights(&self, strategy_id: StrategyId, reward: f32) {
        let reward = reward.clamp(0.0, 1.0) as f64;
        let mut weights = self.weights.write().expect("voter lock poisoned");
        let current = *weights.get(&strategy_id).unwrap_or(&1.0);
        let updated = (1.0 - self.learning_rate) * current + self.learning_rate * reward;
        weights.insert(strategy_id, updated.max(MIN_WEIGHT));
        let total: f64 = weights.values().sum();
        if total > 0.0 {
            for w in weights.values_mut() {
                *w = (*w / total).max(MIN_WEIGHT);
            }
        }
    }

    /// Applies telemetry's latency penalty to a strategy's effective weight.
    pub fn penalise(&self, strategy_id: StrategyId, factor: f32) {
        let factor = factor.clamp(0.5, 1.0) as f64;
        let mut weights = self.weights.write().expect("voter lock poisoned");
        let current = *weights.get(&strategy_id).unwrap_or(&1.0);
        weights.insert(strategy_id, (current * factor).max(MIN_WEIGHT));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_core::Confidence as Conf;

    fn obs(id: StrategyId, value: SlotValue, confidence: f32) -> Observation {
        Observation::new(crate::slot::Slot::Pot, value, Conf::new(confidence), id, 1)
    }

    #[test]
    fn weighted_vote_picks_higher_scoring_value() {
        let voter = EnsembleVoter::default();
        let observations = vec![
            obs(StrategyId::TemplateMatch, SlotValue::Amount(100.0), 0.9),
            obs(StrategyId::Ocr, SlotValue::Amount(100.0), 0.8),
            obs(StrategyId::ColorHeuristic, SlotValue::Amount(50.0), 0.6),
        ];
        let resolution = voter.resolve(&observations, ResolutionMethod::WeightedVote).unwrap();
        assert_eq!(resolution.value, SlotValue::Amount(100.0));
        assert!(!resolution.low_trust);
    }

    #[test]
    fn disagreement_tags_low_trust() {
        let voter = EnsembleVoter::default();
        let observations = vec![
            obs(StrategyId::TemplateMatch, SlotValue::Amount(100.0), 0.5),
            obs(StrategyId::Ocr, SlotValue::Amount(50.0), 0.5),
            obs(StrategyId::ColorHeuristic, SlotValue::Amount(25.0), 0.5),
        ];
        let resolution = voter.resolve(&observations, ResolutionMethod::Majority).unwrap();
        assert!(resolution.low_trust);
    }

    #[test]
    fn weight_update_stays_normalised_with_floor() {
        let voter = EnsembleVoter::default();
        for _ in 0..50 {
            voter.update_weights(StrategyId::TemplateMatch, 1.0);
            voter.update_weights(StrategyId::Ocr, 0.0);
        }
        let weights = voter.weights.read().unwrap();
        assert!(weights[&StrategyId::Ocr] >= MIN_WEIGHT);
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn highest_confidence_prefers_agreement_over_outlier() {
        let voter = EnsembleVoter::default();
        let observations = vec![
            obs(StrategyId::TemplateMatch, SlotValue::Amount(100.0), 0.99),
            obs(StrategyId::Ocr, SlotValue::Amount(50.0), 0.6),
            obs(StrategyId::ColorHeuristic, SlotValue::Amount(50.0), 0.55),
        ];
        let resolution = voter.resolve(&observations, ResolutionMethod::HighestConfidence).unwrap();
        assert_eq!(resolution.value, SlotValue::Amount(50.0));
    }

    #[test]
    fn weighted_vote_tie_prefers_earlier_strategy_id() {
        let voter = EnsembleVoter::default();
        let observations = vec![
            obs(StrategyId::ColorHeuristic, SlotValue::Amount(50.0), 0.6),
            obs(StrategyId::TemplateMatch, SlotValue::Amount(100.0), 0.6),
        ];
        let resolution = voter.resolve(&observations, ResolutionMethod::WeightedVote).unwrap();
        assert_eq!(resolution.value, SlotValue::Amount(100.0));
    }
}
