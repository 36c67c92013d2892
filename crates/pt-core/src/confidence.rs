/// A probability-like score in `[0, 1]`, clamped on construction.
///
/// Used throughout the detection core for strategy confidence, ensemble
/// confidence, and disagreement metrics.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Confidence(f32);

impl Confidence {
    pub const MIN: Confidence = Confidence(0.0);
    pub const MAX: Confidence = Confidence(1.0);

    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }
    pub fn value(&self) -> f32 {
        self.0
    }
    /// Caps the value at 0.99, used by the pot temporal-consensus boost
    /// which must never reach full certainty from detection alone.
    pub fn capped(self, cap: f32) -> Self {
        Self(self.0.min(cap))
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MIN
    }
}

impl std::ops::Add<f32> for Confidence {
    type Output = Confidence;
    fn add(self, rhs: f32) -> Confidence {
        Confidence::new(self.0 + rhs)
    }
}

impl From<f32> for Confidence {
    fn from(v: f32) -> Self {
        Self::new(v)
    }
}
impl From<Confidence> for f32 {
    fn from(c: Confidence) -> f32 {
        c.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_inputs() {
        assert_eq!(Confidence::new(1.5).value(), 1.0);
        assert_eq!(Confidence::new(-0.2).value(), 0.0);
    }

    #[test]
    fn capped_boost_never_exceeds_cap() {
        let c = Confidence::new(0.97) + 0.05;
        assert_eq!(c.capped(0.99).value(), 0.99);
    }
}
