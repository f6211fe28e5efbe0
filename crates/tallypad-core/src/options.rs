//! Engine configuration

use crate::format::DisplayOptions;

/// Tolerance used by numeric equality
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    /// Relative bound, scaled by the larger magnitude
    pub relative: f64,
    /// Absolute bound, used near zero
    pub absolute: f64,
}

impl Tolerance {
    pub const fn new(relative: f64, absolute: f64) -> Self {
        Self { relative, absolute }
    }

    /// Check if two scalars are equal within this tolerance
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        let diff = (a - b).abs();
        diff <= self.absolute || diff <= self.relative * a.abs().max(b.abs())
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(1e-9, 1e-12)
    }
}

/// Options for evaluation and recomputation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// Tolerance for value equality
    pub tolerance: Tolerance,
    /// Longest list a range expression may generate (default: 10 000)
    pub max_range_elements: usize,
    /// Formatting used when values are rendered
    pub display: DisplayOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            max_range_elements: crate::DEFAULT_MAX_RANGE_ELEMENTS,
            display: DisplayOptions::default(),
        }
    }
}
