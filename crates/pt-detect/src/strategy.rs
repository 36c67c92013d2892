use crate::observation::{Observation, StrategyId};
use pt_capture::{Frame, Roi};

/// Calibration table entry: the ROI expected to contain a given slot's
/// pixels, loaded from per-site configuration.
#[derive(Debug, Clone, Copy)]
pub struct RegionHint {
    pub roi: Roi,
}

/// Deck skins a template-matching strategy must be able to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckStyle {
    Classic,
    Modern,
    LargePip,
    FourColor,
    Auto,
}

/// Immutable, shared template data a [`Strategy`] may consult. Strategies
/// never hold mutable references to it.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    pub deck_style: Option<DeckStyle>,
}

impl TemplateLibrary {
    pub fn for_deck(deck_style: DeckStyle) -> Self {
        Self { deck_style: Some(deck_style) }
    }
}

/// A strategy threw rather than returning observations; recorded by
/// telemetry as `strategy_error` and treated as zero observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyError {
    pub strategy_id: StrategyId,
    pub message: String,
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "strategy {} failed: {}", self.strategy_id, self.message)
    }
}

impl std::error::Error for StrategyError {}

/// A pure function from a frame and region hint to candidate observations.
/// Implementations must not mutate shared state and should complete
/// well inside the per-strategy timeout (default 50 ms, enforced by the
/// caller, not the strategy itself).
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;
    fn detect(&self, frame: &Frame, hint: RegionHint, templates: &TemplateLibrary) -> Result<Vec<Observation>, StrategyError>;
}
