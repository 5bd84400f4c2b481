//! Deterministic clean-up of model-revised statements.
//!
//! Runs once, after the enforcement loop, on any statement the model touched:
//! 1. replace banned or cliché words from the style policy
//! 2. collapse runs of periods left by truncated generations
//! 3. drop a trailing sentence fragment that looks cut off
//! 4. collapse repeated spaces
//! 5. make sure the statement ends in terminal punctuation
//!
//! The replacement list is data, not code: it is loaded from a JSON style policy so it
//! can be edited without a rebuild.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Policy compiled into the binary, used when no `STYLE_POLICY_PATH` is configured.
const BUNDLED_POLICY: &str = include_str!("../../config/style_policy.json");

/// Words that end a fragment mid-thought when nothing follows them.
const DANGLING_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "of", "on", "or", "the", "to",
    "with",
];

/// A fragment shorter than this many words is treated as a truncation.
const MIN_FRAGMENT_WORDS: usize = 4;

/// Externally editable style policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StylePolicy {
    /// Banned word or phrase (matched case-insensitively) → approved substitute.
    pub replacements: BTreeMap<String, String>,
}

impl StylePolicy {
    pub fn bundled() -> Result<Self> {
        serde_json::from_str(BUNDLED_POLICY).context("bundled style policy is not valid JSON")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read style policy at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("style policy at {} is not valid JSON", path.display()))
    }
}

/// Compiled form of a `StylePolicy`.
#[derive(Debug)]
pub struct Sanitizer {
    replacements: BTreeMap<String, String>,
    banned: Option<Regex>,
    period_runs: Regex,
    space_runs: Regex,
}

impl Sanitizer {
    pub fn new(policy: StylePolicy) -> Result<Self> {
        let replacements: BTreeMap<String, String> = policy
            .replacements
            .into_iter()
            .map(|(banned, approved)| (banned.trim().to_lowercase(), approved))
            .filter(|(banned, _)| !banned.is_empty())
            .collect();

        // Longest first, so "in order to" wins over any shorter overlapping entry.
        let mut keys: Vec<&String> = replacements.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let banned = if keys.is_empty() {
            None
        } else {
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
                    .context("style policy produced an invalid pattern")?,
            )
        };

        Ok(Self {
            replacements,
            banned,
            period_runs: Regex::new(r"(?:(?:\.\s*){2,}|…\s*)(\p{Ll})?")?,
            space_runs: Regex::new(r" {2,}")?,
        })
    }

    pub fn sanitize(&self, text: &str) -> String {
        let replaced = self.replace_banned(text);
        let collapsed = self.period_runs.replace_all(&replaced, |caps: &Captures| {
            // The collapsed run ends a sentence, so the next word starts a new one.
            match caps.get(1) {
                Some(next) => format!(". {}", next.as_str().to_uppercase()),
                None => ". ".to_string(),
            }
        });
        let trimmed = drop_truncated_tail(collapsed.trim());
        let spaced = self.space_runs.replace_all(&trimmed, " ");
        ensure_terminal_punctuation(spaced.trim())
    }

    fn replace_banned(&self, text: &str) -> String {
        let Some(pattern) = &self.banned else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures| {
                let matched = &caps[0];
                match self.replacements.get(&matched.to_lowercase()) {
                    Some(approved) => match_capitalization(matched, approved),
                    None => matched.to_string(),
                }
            })
            .into_owned()
    }
}

/// Copies the capitalization of `original`'s first letter onto `replacement`.
fn match_capitalization(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Splits into complete sentences plus a trailing fragment without terminal punctuation.
fn split_sentences(text: &str) -> (Vec<&str>, &str) {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let end = idx + c.len_utf8();
        match chars.peek() {
            None => {
                sentences.push(&text[start..end]);
                start = text.len();
            }
            Some(&(_, next)) if next.is_whitespace() => {
                sentences.push(&text[start..end]);
                start = end;
            }
            _ => {}
        }
    }
    (sentences, &text[start..])
}

fn looks_truncated(fragment: &str) -> bool {
    let fragment = fragment.trim();
    let words: Vec<&str> = fragment.split_whitespace().collect();
    let Some(last) = words.last() else {
        return false;
    };
    let last = last.to_lowercase();
    words.len() < MIN_FRAGMENT_WORDS
        || DANGLING_WORDS.contains(&last.as_str())
        || fragment.ends_with([',', ';', ':', '-'])
}

/// Drops a trailing fragment that looks cut off, when complete sentences precede it.
fn drop_truncated_tail(text: &str) -> String {
    let (sentences, fragment) = split_sentences(text);
    if sentences.is_empty() || fragment.trim().is_empty() || !looks_truncated(fragment) {
        return text.to_string();
    }
    sentences.concat().trim().to_string()
}

fn ensure_terminal_punctuation(text: &str) -> String {
    if text.is_empty() || text.ends_with(is_terminal) {
        return text.to_string();
    }
    let stripped = text.trim_end_matches([',', ';', ':', '-', ' ']);
    if stripped.is_empty() {
        return String::new();
    }
    format!("{stripped}.")
}
