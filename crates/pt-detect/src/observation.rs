use crate::slot::{Slot, SlotValue};
use pt_core::Confidence;

/// Identifies a detection strategy for weighting, telemetry, and
/// tie-break ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum StrategyId {
    TemplateMatch,
    Ocr,
    ColorHeuristic,
    EdgeContour,
    DomBridge,
    Cached,
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyId::TemplateMatch => "template_match",
            StrategyId::Ocr => "ocr",
            StrategyId::ColorHeuristic => "color_heuristic",
            StrategyId::EdgeContour => "edge_contour",
            StrategyId::DomBridge => "dom_bridge",
            StrategyId::Cached => "cached",
        };
        write!(f, "{name}")
    }
}

/// One strategy's claim about one slot, with confidence.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub slot: Slot,
    pub value: SlotValue,
    pub confidence: Confidence,
    pub strategy_id: StrategyId,
    pub cost_ms: u32,
}

impl Observation {
    pub fn new(slot: Slot, value: SlotValue, confidence: Confidence, strategy_id: StrategyId, cost_ms: u32) -> Self {
        Self { slot, value, confidence, strategy_id, cost_ms }
    }
}
