//! Space-substitution optimization — makes a one-line statement exactly fill the field
//! by swapping regular inter-word spaces for thin or medium spaces. Words are never
//! touched, and only regular spaces (U+0020) are candidates for substitution.
//!
//! The space between the first and second word is never substituted. The next space
//! to replace is chosen by a string hash of the current state, so a given input always
//! produces the same output.

use serde::{Deserialize, Serialize};

use crate::fitting::render::{render, RenderResult};
use crate::fitting::width_table::{space_width, width_of_char, MEDIUM_SPACE, THIN_SPACE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeStatus {
    /// The statement fills the field within one space step of the edge.
    Optimized,
    /// Even substituting every eligible space cannot reach the target.
    Failed,
    /// Nothing to optimize: blank input or no substitutable space.
    NotOptimized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub status: OptimizeStatus,
    pub rendering: RenderResult,
    pub optimized_text: String,
    /// Number of spaces replaced relative to the input.
    pub substitutions: usize,
}

/// Largest underflow still considered a perfect fit: one medium-space step.
///
/// Any successful optimization lands inside this band, which is what makes
/// re-optimizing an optimized statement a no-op.
pub fn optimization_tolerance() -> f64 {
    width_of_char(MEDIUM_SPACE) - space_width()
}

/// True if `overflow` means "fits, and cannot usefully grow by one more space step".
pub fn is_within_tolerance(overflow: f64) -> bool {
    overflow <= 0.0 && overflow > -optimization_tolerance()
}

/// Adjusts inter-word spacing so `text` exactly fills `target_width` on one line.
pub fn optimize(text: &str, target_width: f64) -> OptimizeResult {
    let rendering = render(text, target_width);

    if text.trim().is_empty() {
        return unchanged(OptimizeStatus::NotOptimized, rendering, text);
    }
    if is_within_tolerance(rendering.overflow) {
        return unchanged(OptimizeStatus::Optimized, rendering, text);
    }

    let narrowing = rendering.overflow > 0.0;
    let space = if narrowing { THIN_SPACE } else { MEDIUM_SPACE };
    // Leading and trailing whitespace pass through untouched.
    let body = text.trim();
    let lead = &text[..text.len() - text.trim_start().len()];
    let tail = &text[text.trim_end().len()..];
    let mut words: Vec<String> = body.split(' ').map(str::to_string).collect();

    if words.len() < 3 {
        return unchanged(OptimizeStatus::NotOptimized, rendering, text);
    }

    // Every space but the first replaced: the furthest the loop below can go.
    let worst_text = format!("{lead}{}{tail}", worst_case(&words, space));
    let worst = render(&worst_text, target_width);
    let max_substitutions = words.len() - 2;
    let reachable = if narrowing {
        worst.overflow <= 0.0
    } else {
        worst.overflow > 0.0 || is_within_tolerance(worst.overflow)
    };
    if !reachable {
        return OptimizeResult {
            status: OptimizeStatus::Failed,
            rendering: worst,
            optimized_text: worst_text,
            substitutions: max_substitutions,
        };
    }

    let mut best_text = text.to_string();
    let mut best = render(&best_text, target_width);
    let mut substitutions = 0;

    while words.len() > 2 {
        let idx = pick_space(&best_text, words.len());
        let right = words.remove(idx + 1);
        words[idx] = format!("{}{}{}", words[idx], space, right);

        let candidate_text = format!("{lead}{}{tail}", words.join(" "));
        let candidate = render(&candidate_text, target_width);

        if narrowing {
            substitutions += 1;
            best_text = candidate_text;
            best = candidate;
            if best.overflow <= 0.0 {
                break;
            }
        } else {
            if candidate.overflow > 0.0 {
                // One step too far: the previous state is the closest fit.
                break;
            }
            substitutions += 1;
            best_text = candidate_text;
            best = candidate;
        }
    }

    let status = if is_within_tolerance(best.overflow) {
        OptimizeStatus::Optimized
    } else {
        OptimizeStatus::Failed
    };

    OptimizeResult {
        status,
        rendering: best,
        optimized_text: best_text,
        substitutions,
    }
}

fn unchanged(status: OptimizeStatus, rendering: RenderResult, text: &str) -> OptimizeResult {
    OptimizeResult {
        status,
        rendering,
        optimized_text: text.to_string(),
        substitutions: 0,
    }
}

fn worst_case(words: &[String], space: char) -> String {
    let mut out = words[0].clone();
    for (i, word) in words.iter().enumerate().skip(1) {
        out.push(if i == 1 { ' ' } else { space });
        out.push_str(word);
    }
    out
}

/// Index `i` in `1..=word_count - 2`: the space between `words[i]` and `words[i + 1]`.
///
/// Requires `word_count >= 3`.
fn pick_space(state: &str, word_count: usize) -> usize {
    1 + (stable_hash(state) as usize) % (word_count - 2)
}

/// 31-multiplier string hash over code points. No hidden state, no per-process seed.
pub fn stable_hash(s: &str) -> u32 {
    s.chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
