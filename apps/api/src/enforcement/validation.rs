//! Character-count validation against a target window.

use serde::{Deserialize, Serialize};

/// Default width of the window below `target_max` when no minimum is given.
pub const DEFAULT_TOLERANCE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDirection {
    Under,
    Over,
    Within,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterValidationResult {
    pub is_compliant: bool,
    pub actual_length: usize,
    pub target_min: usize,
    pub target_max: usize,
    pub variance_direction: VarianceDirection,
    /// Characters to add (positive) or remove (negative) to land in the window.
    pub chars_to_adjust: i64,
}

impl CharacterValidationResult {
    /// Absolute distance to the nearest edge of the window.
    pub fn miss(&self) -> usize {
        self.chars_to_adjust.unsigned_abs() as usize
    }
}

/// Character length as counted by the form: Unicode scalar values.
pub fn char_length(text: &str) -> usize {
    text.chars().count()
}

/// Lower bound of the window: explicit `target_min`, else `target_max - tolerance`.
pub fn resolve_min(target_max: usize, target_min: Option<usize>, tolerance: Option<usize>) -> usize {
    target_min.unwrap_or_else(|| target_max.saturating_sub(tolerance.unwrap_or(DEFAULT_TOLERANCE)))
}

/// Checks `text` against the inclusive window `[target_min, target_max]`.
pub fn validate(
    text: &str,
    target_max: usize,
    target_min: Option<usize>,
    tolerance: Option<usize>,
) -> CharacterValidationResult {
    let target_min = resolve_min(target_max, target_min, tolerance);
    let actual_length = char_length(text);

    let (variance_direction, chars_to_adjust) = if actual_length < target_min {
        (VarianceDirection::Under, target_min as i64 - actual_length as i64)
    } else if actual_length > target_max {
        (VarianceDirection::Over, target_max as i64 - actual_length as i64)
    } else {
        (VarianceDirection::Within, 0)
    };

    CharacterValidationResult {
        is_compliant: variance_direction == VarianceDirection::Within,
        actual_length,
        target_min,
        target_max,
        variance_direction,
        chars_to_adjust,
    }
}
