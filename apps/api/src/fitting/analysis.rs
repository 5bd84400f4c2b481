//! Read-only fit report used by the editor's live preview.

use serde::{Deserialize, Serialize};

use crate::fitting::optimize::{optimize, OptimizeStatus};
use crate::fitting::render::render;

/// Fill range, in percent of the field width, that counts as a well-sized statement.
const OPTIMAL_FILL_MIN: f64 = 90.0;
const OPTIMAL_FILL_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFitAnalysis {
    pub fits_on_one_line: bool,
    pub overflow: f64,
    pub overflow_percent: f64,
    pub fill_percent: f64,
    /// `ceil(width / target)`.
    pub estimated_lines: u32,
    /// Fill lies in [90, 100] percent.
    pub is_optimal: bool,
    /// Space substitution is expected to reach an exact fit.
    pub can_be_optimized: bool,
}

/// Analyzes how `text` fits a field `target_width` px wide.
pub fn analyze(text: &str, target_width: f64) -> TextFitAnalysis {
    let rendering = render(text, target_width);
    let fill_percent = percent_of(rendering.full_width, target_width);
    let estimated_lines = if target_width > 0.0 {
        (rendering.full_width / target_width).ceil() as u32
    } else {
        rendering.lines as u32
    };

    TextFitAnalysis {
        fits_on_one_line: rendering.lines == 1 && rendering.overflow <= 0.0,
        overflow: rendering.overflow,
        overflow_percent: percent_of(rendering.overflow, target_width),
        fill_percent,
        estimated_lines,
        is_optimal: (OPTIMAL_FILL_MIN..=OPTIMAL_FILL_MAX).contains(&fill_percent),
        can_be_optimized: optimize(text, target_width).status == OptimizeStatus::Optimized,
    }
}

fn percent_of(value: f64, target_width: f64) -> f64 {
    if target_width > 0.0 {
        value / target_width * 100.0
    } else {
        0.0
    }
}
