use std::collections::VecDeque;

use pt_core::Confidence;
use pt_detect::{Resolution, ResolutionMethod};

use crate::currency::Currency;

/// Frames of agreement required before temporal consensus boosts
/// confidence.
const CONSENSUS_WINDOW: usize = 5;
const CONSENSUS_EPSILON: f64 = 0.01;
const CONSENSUS_BOOST: f32 = 0.05;

/// Amounts outside this range are plausible OCR/template noise rather than
/// a real pot, so their confidence is penalised rather than discarded
/// outright.
const MIN_PLAUSIBLE: f64 = 0.01;
const MAX_PLAUSIBLE: f64 = 10_000_000.0;
const RANGE_PENALTY_FACTOR: f32 = 0.5;

/// A resolved pot reading.
#[derive(Debug, Clone, PartialEq)]
pub struct PotDetection {
    pub amount: f64,
    pub currency: Currency,
    pub confidence: Confidence,
    pub raw_text: String,
    pub method: ResolutionMethod,
}

/// Strips thousand separators and currency glyphs, returning the bare
/// numeric value.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Tracks recent pot readings to apply temporal consensus and owns the
/// range-penalty / currency-detection logic.
#[derive(Default)]
pub struct PotRecogniser {
    recent: VecDeque<f64>,
}

impl PotRecogniser {
    pub fn new() -> Self {
        Self { recent: VecDeque::with_capacity(CONSENSUS_WINDOW) }
    }

    /// Builds a [`PotDetection`] from the voter's resolution and the raw OCR
    /// text, applying range penalty and temporal consensus, then records
    /// this frame's amount toward future consensus.
    pub fn recognise(&mut self, resolution: &Resolution, raw_text: &str) -> Option<PotDetection> {
        if resolution.low_trust {
            return None;
        }
        let amount = resolution.value.as_amount()?;
        let currency = Currency::detect(raw_text);
        let mut confidence = resolution.confidence.value();

        if amount < MIN_PLAUSIBLE || amount > MAX_PLAUSIBLE {
            confidence *= RANGE_PENALTY_FACTOR;
        }

        let mut confidence = Confidence::new(confidence);
        if self.agrees_with_recent(amount) {
            confidence = (confidence + CONSENSUS_BOOST).capped(0.99);
        }

        if self.recent.len() == CONSENSUS_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(amount);

        Some(PotDetection {
            amount,
            currency,
            confidence,
            raw_text: raw_text.to_string(),
            method: resolution.method,
        })
    }

    fn agrees_with_recent(&self, amount: f64) -> bool {
        !self.recent.is_empty() && self.recent.iter().all(|r| (r - amount).abs() <= CONSENSUS_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thousand_separators_and_symbols() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.50));
        assert_eq!(parse_amount("€12,50"), None); // comma-as-decimal not ASCII-digit-filtered cleanly, documented limitation
    }

    #[test]
    fn temporal_consensus_boosts_confidence() {
        let mut recogniser = PotRecogniser::new();
        let resolution = Resolution {
            value: pt_detect::SlotValue::Amount(100.0),
            confidence: Confidence::new(0.8),
            method: ResolutionMethod::WeightedAverage,
            contributors: vec![],
            disagreement: 0.0,
            low_trust: false,
        };
        let first = recogniser.recognise(&resolution, "$100").unwrap();
        assert!((first.confidence.value() - 0.8).abs() < 1e-6);
        let second = recogniser.recognise(&resolution, "$100").unwrap();
        assert!(second.confidence.value() > first.confidence.value());
    }

    #[test]
    fn out_of_range_amount_is_penalised() {
        let mut recogniser = PotRecogniser::new();
        let resolution = Resolution {
            value: pt_detect::SlotValue::Amount(50_000_000.0),
            confidence: Confidence::new(0.9),
            method: ResolutionMethod::WeightedAverage,
            contributors: vec![],
            disagreement: 0.0,
            low_trust: false,
        };
        let detection = recogniser.recognise(&resolution, "50000000").unwrap();
        assert!(detection.confidence.value() < 0.9);
    }
}
