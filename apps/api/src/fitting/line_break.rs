//! Line-break policy of the reference form renderer.
//!
//! A break opportunity exists only *after* a boundary character (any whitespace,
//! including the optimization spaces, or one of `? / | % !`) and only when the next
//! character is alphanumeric, `+` or `\`. The regular hyphen is never a boundary:
//! the form keeps `cross-functional` on one line, so a hyphenated compound must
//! never be split here either.

/// Punctuation after which the form renderer may wrap.
const BREAK_PUNCTUATION: [char; 5] = ['?', '/', '|', '%', '!'];

/// True if a line may end right after `c`.
pub fn is_boundary(c: char) -> bool {
    c.is_whitespace() || BREAK_PUNCTUATION.contains(&c)
}

/// True if a line may start with `c`.
pub fn can_start_line(c: char) -> bool {
    c.is_alphanumeric() || c == '+' || c == '\\'
}

/// Splits `text` into break-eligible tokens.
///
/// Each token ends with its boundary character (if any), so concatenating the tokens
/// always reproduces the input exactly.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_boundary(c) {
            continue;
        }
        if let Some(&(next_idx, next)) = chars.peek() {
            if can_start_line(next) {
                tokens.push(&text[start..next_idx]);
                start = next_idx;
            }
        }
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}
