use std::sync::Arc;

use pt_detect::Strategy;

/// Builds the active strategy set from `strategies.enabled`.
///
/// Concrete vision/OCR strategies (template matching, OCR, colour
/// heuristics, edge/contour, DOM bridge) are site- and platform-specific
/// plugins implementing [`Strategy`]; this core ships the orchestration
/// they run inside, not the vision backends themselves. An empty registry
/// is a valid, if useless, configuration — the frame loop below tolerates
/// zero strategies by producing no observations for the frame. Strategies
/// are held behind `Arc` rather than `Box` so the frame loop can move a
/// cheap handle into each strategy's own blocking task.
pub fn build(_enabled: &[String]) -> Vec<Arc<dyn Strategy>> {
    Vec::new()
}
