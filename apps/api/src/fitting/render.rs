//! Form rendering simulation — predicts how the PDF form wraps a statement.
//!
//! Line breaking is iterative: each pass peels one line off the front of the remaining
//! text. Every pass either finishes or strictly shortens the remainder, so a string with
//! no break opportunity degrades to a single unbreakable line instead of looping.

use serde::{Deserialize, Serialize};

use crate::fitting::line_break::tokenize;
use crate::fitting::width_table::{form_table, units_to_px, CharacterWidthTable};

/// Outcome of rendering a statement into a field of fixed width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    /// One entry per wrapped line, trailing whitespace removed.
    pub text_lines: Vec<String>,
    /// Width of the whole (right-trimmed) statement on a single line, in px.
    pub full_width: f64,
    pub lines: usize,
    /// `full_width - target_width`. Non-positive when the statement fits on one line.
    pub overflow: f64,
}

/// Renders `text` into a field `target_width` px wide.
///
/// Trailing whitespace never counts against the width. Never panics, whatever the input.
pub fn render(text: &str, target_width: f64) -> RenderResult {
    let table = form_table();
    let trimmed = text.trim_end();
    let full_width = table.width_of_str(trimmed);
    let text_lines = wrap_lines(trimmed, target_width, table);

    RenderResult {
        lines: text_lines.len(),
        text_lines,
        full_width,
        overflow: full_width - target_width,
    }
}

fn wrap_lines(text: &str, target_width: f64, table: &CharacterWidthTable) -> Vec<String> {
    let mut lines = Vec::new();
    let mut remaining = text;

    loop {
        if table.width_of_str(remaining) <= target_width {
            lines.push(remaining.to_string());
            break;
        }

        let split = token_split(remaining, target_width, table)
            .or_else(|| char_split(remaining, target_width, table));

        match split {
            Some(idx) if idx > 0 && idx < remaining.len() => {
                let (line, rest) = remaining.split_at(idx);
                lines.push(line.trim_end().to_string());
                remaining = rest;
            }
            // No progress possible: keep the rest as one overflowing line.
            _ => {
                lines.push(remaining.to_string());
                break;
            }
        }
    }

    lines
}

/// Byte offset of the last token boundary that keeps the line within `target_width`.
///
/// Leading whitespace belongs to the first token, so a line never consists of
/// whitespace alone. Returns `None` when there is only one token or the first token
/// alone is too wide, leaving the decision to the character-level fallback.
fn token_split(text: &str, target_width: f64, table: &CharacterWidthTable) -> Option<usize> {
    let content_start = text.len() - text.trim_start().len();
    let (indent, content) = text.split_at(content_start);
    let tokens = tokenize(content);
    let (first, rest) = tokens.split_first()?;
    let indent_units = table.units_of_str(indent);
    let first_units = indent_units + table.units_of_str(first.trim_end());
    if rest.is_empty() || units_to_px(first_units) > target_width {
        return None;
    }

    let mut end = content_start + first.len();
    let mut committed_units = indent_units + table.units_of_str(first);
    for token in rest {
        let candidate_units = committed_units + table.units_of_str(token.trim_end());
        if units_to_px(candidate_units) > target_width {
            break;
        }
        committed_units += table.units_of_str(token);
        end += token.len();
    }
    Some(end)
}

/// Byte offset of the first character whose cumulative width exceeds `target_width`.
///
/// Starts from an estimate based on the average character width, then scans toward
/// the exact crossing point.
fn char_split(text: &str, target_width: f64, table: &CharacterWidthTable) -> Option<usize> {
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let count = offsets.len();
    if count == 0 {
        return None;
    }

    let mut prefix_units = Vec::with_capacity(count + 1);
    prefix_units.push(0u64);
    for c in text.chars() {
        let last = prefix_units[prefix_units.len() - 1];
        prefix_units.push(last + u64::from(table.units_of(c)));
    }
    let prefix_px = |n: usize| units_to_px(prefix_units[n]);

    let average = prefix_px(count) / count as f64;
    let estimate = if average > 0.0 {
        (target_width / average).floor()
    } else {
        0.0
    };
    // NaN and negative estimates saturate to 0.
    let mut idx = (estimate as usize).min(count);

    if prefix_px(idx) > target_width {
        while idx > 0 && prefix_px(idx) > target_width {
            idx -= 1;
        }
    } else {
        while idx < count && prefix_px(idx + 1) <= target_width {
            idx += 1;
        }
    }

    // Leading whitespace never makes up a line on its own.
    let leading = text.chars().take_while(|c| c.is_whitespace()).count();
    if leading > 0 && idx <= leading {
        idx = leading + 1;
    }

    match idx {
        0 => None,
        n if n >= count => None,
        n => Some(offsets[n]),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
