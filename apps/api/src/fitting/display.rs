//! Storage ⇄ display transforms.
//!
//! Browser text boxes wrap at hyphens; the form does not. Swapping `-` for U+2011 in the
//! editable copy keeps the editor's wrapping in line with the form. Both glyphs have the
//! same width, so measurements are unaffected.

use crate::fitting::width_table::{HAIR_SPACE, MEDIUM_SPACE, NON_BREAKING_HYPHEN, THIN_SPACE};

/// Converts stored text into its editable display form.
pub fn to_display(text: &str) -> String {
    text.replace('-', &NON_BREAKING_HYPHEN.to_string())
}

/// Converts display text back to storage form before persisting.
pub fn from_display(text: &str) -> String {
    text.replace(NON_BREAKING_HYPHEN, "-")
}

/// Collapses optimization spaces and non-breaking hyphens to their plain equivalents.
///
/// Run this on externally sourced text before width analysis; it may already carry
/// optimized spacing from an earlier pass.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            THIN_SPACE | MEDIUM_SPACE | HAIR_SPACE => ' ',
            NON_BREAKING_HYPHEN => '-',
            other => other,
        })
        .collect()
}
