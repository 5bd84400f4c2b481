//! Character-Count Enforcement Loop — coerces a model-drafted statement into a
//! character window by asking the model to revise it.
//!
//! # Termination
//! The model is an unreliable, costly oracle, so the loop stops on the first of:
//! - compliant: the candidate lands in the window
//! - close_enough: the candidate is within `CLOSE_ENOUGH_CHARS` of the window
//! - duplicate: the model repeats a statement already seen in this run
//! - no_progress: the miss shrank by less than `MIN_PROGRESS_CHARS`
//! - oscillating: the miss flipped between under and over twice
//! - error: the model call failed or exceeded its timeout
//! - max_retries: `MAX_RETRIES_CEILING` calls made, whatever the caller asked for
//!
//! Calls for one statement are strictly sequential; each prompt depends on the
//! previous candidate. `enforce_batch` runs up to `BATCH_SIZE` statements at a time.

use std::collections::HashSet;
use std::time::Duration;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::enforcement::prompts::{
    CONTRACT_PROMPT_TEMPLATE, CONTRACT_SYSTEM, EXPAND_PROMPT_TEMPLATE, EXPAND_SYSTEM,
};
use crate::enforcement::sanitize::Sanitizer;
use crate::enforcement::validation::{validate, CharacterValidationResult, VarianceDirection};
use crate::llm_client::prompts::{FIDELITY_INSTRUCTION, PLAIN_TEXT_ONLY_SYSTEM};
use crate::llm_client::{GenerationRequest, LlmError, TextGenerator};

/// Absolute ceiling on model calls per statement. Requests above it are clamped.
pub const MAX_RETRIES_CEILING: u32 = 3;
/// A miss this small is accepted without (further) model calls.
pub const CLOSE_ENOUGH_CHARS: usize = 15;
/// Minimum shrink of the miss between consecutive attempts.
pub const MIN_PROGRESS_CHARS: usize = 5;
/// Under/over flips that count as oscillation.
pub const OSCILLATION_FLIPS: usize = 2;
/// A miss above this fraction of `target_max` is not worth patching.
pub const EXTREME_MISS_FRACTION: f64 = 0.5;
/// Statements enforced concurrently by `enforce_batch`.
pub const BATCH_SIZE: usize = 3;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 600;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Compliant,
    MaxRetries,
    NoProgress,
    Oscillating,
    CloseEnough,
    Duplicate,
    Error,
}

#[derive(Debug, Clone)]
pub struct EnforcementConfig {
    pub target_max: usize,
    pub target_min: Option<usize>,
    /// Requested retry budget; clamped to `MAX_RETRIES_CEILING`.
    pub max_retries: Option<u32>,
    pub model: String,
    /// Opaque label passed to the model, e.g. the MPA the statement belongs to.
    pub context: Option<String>,
    pub call_timeout: Duration,
}

impl EnforcementConfig {
    pub fn new(target_max: usize, model: impl Into<String>) -> Self {
        Self {
            target_max,
            target_min: None,
            max_retries: None,
            model: model.into(),
            context: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Retry budget after applying the hard ceiling.
    pub fn effective_retries(&self) -> u32 {
        self.max_retries
            .unwrap_or(MAX_RETRIES_CEILING)
            .min(MAX_RETRIES_CEILING)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementResult {
    pub statement: String,
    /// Model calls performed, including a failed one.
    pub attempts: u32,
    pub was_adjusted: bool,
    pub final_validation: CharacterValidationResult,
    pub stop_reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecheckReason {
    Compliant,
    CloseEnough,
    TooFarOff,
    NeedsAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckResult {
    pub should_enforce: bool,
    pub reason: PrecheckReason,
}

// ────────────────────────────────────────────────────────────────────────────
// Pre-check
// ────────────────────────────────────────────────────────────────────────────

/// Cheap test for whether `enforce` is worth calling at all.
pub fn should_enforce(text: &str, target_max: usize, target_min: Option<usize>) -> PrecheckResult {
    let validation = validate(text, target_max, target_min, None);
    let reason = if validation.is_compliant {
        PrecheckReason::Compliant
    } else if validation.miss() <= CLOSE_ENOUGH_CHARS {
        PrecheckReason::CloseEnough
    } else if validation.miss() as f64 > target_max as f64 * EXTREME_MISS_FRACTION {
        PrecheckReason::TooFarOff
    } else {
        PrecheckReason::NeedsAdjustment
    };

    PrecheckResult {
        should_enforce: reason == PrecheckReason::NeedsAdjustment,
        reason,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Enforcement loop
// ────────────────────────────────────────────────────────────────────────────

/// Drives `generator` until `text` lands in the configured window or a stop
/// condition fires. Never returns an error: failures end the loop with
/// `StopReason::Error` and the best statement obtained so far.
pub async fn enforce(
    text: &str,
    config: &EnforcementConfig,
    generator: &dyn TextGenerator,
    sanitizer: &Sanitizer,
) -> EnforcementResult {
    let initial = validate(text, config.target_max, config.target_min, None);

    if initial.is_compliant {
        return untouched(text, initial, StopReason::Compliant);
    }
    if initial.miss() <= CLOSE_ENOUGH_CHARS {
        return untouched(text, initial, StopReason::CloseEnough);
    }

    let max_retries = config.effective_retries();
    info!(
        length = initial.actual_length,
        target_min = initial.target_min,
        target_max = initial.target_max,
        max_retries,
        "Enforcing statement character count"
    );

    let mut seen: HashSet<String> = HashSet::from([text.to_string()]);
    let mut directions = vec![initial.variance_direction];
    let mut current = text.to_string();
    let mut current_validation = initial.clone();
    let mut best = (text.to_string(), initial);
    let mut attempts = 0u32;
    let mut stop: Option<StopReason> = None;

    while attempts < max_retries {
        attempts += 1;

        let (system, prompt) =
            build_correction_prompt(&current, &current_validation, config.context.as_deref());
        let request = GenerationRequest {
            model: &config.model,
            system: Some(&system),
            prompt: &prompt,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let outcome = tokio::time::timeout(config.call_timeout, generator.generate(request))
            .await
            .unwrap_or(Err(LlmError::Timeout {
                seconds: config.call_timeout.as_secs(),
            }));
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                warn!(attempt = attempts, error = %e, "Model call failed during enforcement");
                stop = Some(StopReason::Error);
                break;
            }
        };

        let candidate = strip_wrapping_quotes(&raw).to_string();
        if !seen.insert(candidate.clone()) {
            stop = Some(StopReason::Duplicate);
            break;
        }

        let validation = validate(&candidate, config.target_max, config.target_min, None);
        debug!(
            attempt = attempts,
            length = validation.actual_length,
            miss = validation.miss(),
            "Enforcement candidate"
        );

        if validation.miss() < best.1.miss() {
            best = (candidate.clone(), validation.clone());
        }

        if validation.is_compliant {
            stop = Some(StopReason::Compliant);
            break;
        }
        if validation.miss() <= CLOSE_ENOUGH_CHARS {
            stop = Some(StopReason::CloseEnough);
            break;
        }
        let improvement = current_validation.miss() as i64 - validation.miss() as i64;
        if attempts > 1 && improvement < MIN_PROGRESS_CHARS as i64 {
            stop = Some(StopReason::NoProgress);
            break;
        }
        directions.push(validation.variance_direction);
        if count_flips(&directions) >= OSCILLATION_FLIPS {
            stop = Some(StopReason::Oscillating);
            break;
        }

        current = candidate;
        current_validation = validation;
    }

    let stop_reason = stop.unwrap_or(StopReason::MaxRetries);
    let (best_text, best_validation) = best;
    let was_adjusted = best_text != text;

    let (statement, final_validation) = if was_adjusted {
        let sanitized = sanitizer.sanitize(&best_text);
        let revalidated = validate(&sanitized, config.target_max, config.target_min, None);
        (sanitized, revalidated)
    } else {
        (best_text, best_validation)
    };

    if stop_reason == StopReason::Compliant {
        info!(attempts, length = final_validation.actual_length, "Statement enforced");
    } else {
        warn!(
            attempts,
            stop_reason = ?stop_reason,
            length = final_validation.actual_length,
            "Enforcement stopped before reaching the target window"
        );
    }

    EnforcementResult {
        statement,
        attempts,
        was_adjusted,
        final_validation,
        stop_reason,
    }
}

/// Enforces many statements, `BATCH_SIZE` at a time. Results keep input order.
pub async fn enforce_batch(
    statements: &[String],
    config: &EnforcementConfig,
    generator: &dyn TextGenerator,
    sanitizer: &Sanitizer,
) -> Vec<EnforcementResult> {
    let mut results = Vec::with_capacity(statements.len());
    for batch in statements.chunks(BATCH_SIZE) {
        let batch_results = join_all(
            batch
                .iter()
                .map(|statement| enforce(statement, config, generator, sanitizer)),
        )
        .await;
        results.extend(batch_results);
    }
    results
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt builder
// ────────────────────────────────────────────────────────────────────────────

/// Returns `(system, prompt)` for one correction call.
pub(crate) fn build_correction_prompt(
    text: &str,
    validation: &CharacterValidationResult,
    context: Option<&str>,
) -> (String, String) {
    let (system, template) = match validation.variance_direction {
        VarianceDirection::Over => (CONTRACT_SYSTEM, CONTRACT_PROMPT_TEMPLATE),
        _ => (EXPAND_SYSTEM, EXPAND_PROMPT_TEMPLATE),
    };
    let context_line = context
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("CONTEXT: {}\n", c.trim()))
        .unwrap_or_default();

    let prompt = template
        .replace("{current_length}", &validation.actual_length.to_string())
        .replace("{target_min}", &validation.target_min.to_string())
        .replace("{target_max}", &validation.target_max.to_string())
        .replace("{delta}", &validation.miss().to_string())
        .replace("{context_line}", &context_line)
        .replace("{fidelity}", FIDELITY_INSTRUCTION)
        .replace("{plain_text}", PLAIN_TEXT_ONLY_SYSTEM)
        .replace("{statement}", text);

    (system.to_string(), prompt)
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn untouched(
    text: &str,
    validation: CharacterValidationResult,
    stop_reason: StopReason,
) -> EnforcementResult {
    EnforcementResult {
        statement: text.to_string(),
        attempts: 0,
        was_adjusted: false,
        final_validation: validation,
        stop_reason,
    }
}

fn count_flips(directions: &[VarianceDirection]) -> usize {
    directions
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count()
}

const QUOTE_PAIRS: [(char, char); 4] = [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

/// Removes one layer of matching quotes wrapped around the whole reply.
pub(crate) fn strip_wrapping_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    trimmed
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enforcement::sanitize::StylePolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Respond = Box<dyn Fn(usize) -> Result<String, LlmError> + Send + Sync>;

    /// Generator whose reply depends only on the call number (0-based).
    struct MockGenerator {
        respond: Respond,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockGenerator {
        fn new(respond: impl Fn(usize) -> Result<String, LlmError> + Send + Sync + 'static) -> Self {
            Self {
                respond: Box::new(respond),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn scripted(replies: Vec<String>) -> Self {
            Self::new(move |call| Ok(replies[call.min(replies.len() - 1)].clone()))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(request.prompt.to_string());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)(call)
        }
    }

    /// Never answers within any reasonable timeout.
    struct HangingGenerator;

    #[async_trait]
    impl TextGenerator for HangingGenerator {
        async fn generate(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    /// Records how many calls are in flight at once.
    struct ConcurrencyProbe {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for ConcurrencyProbe {
        async fn generate(&self, _request: GenerationRequest<'_>) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(statement(345, 'c'))
        }
    }

    /// A one-sentence statement of exactly `len` characters.
    fn statement(len: usize, fill: char) -> String {
        format!("Led{}.", fill.to_string().repeat(len - 4))
    }

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(StylePolicy::bundled().unwrap()).unwrap()
    }

    fn config() -> EnforcementConfig {
        let mut config = EnforcementConfig::new(350, "test-model");
        config.target_min = Some(340);
        config
    }

    // ── should_enforce ──────────────────────────────────────────────────────

    #[test]
    fn test_precheck_compliant() {
        let result = should_enforce(&statement(345, 'a'), 350, Some(340));
        assert!(!result.should_enforce);
        assert_eq!(result.reason, PrecheckReason::Compliant);
    }

    #[test]
    fn test_precheck_close_enough() {
        let result = should_enforce(&statement(330, 'a'), 350, Some(340));
        assert!(!result.should_enforce);
        assert_eq!(result.reason, PrecheckReason::CloseEnough);
    }

    #[test]
    fn test_precheck_large_but_patchable_miss() {
        // 150 over is under the 175-char extreme threshold.
        let result = should_enforce(&statement(500, 'a'), 350, Some(340));
        assert!(result.should_enforce);
        assert_eq!(result.reason, PrecheckReason::NeedsAdjustment);
    }

    #[test]
    fn test_precheck_too_far_off() {
        let result = should_enforce(&statement(700, 'a'), 350, Some(340));
        assert!(!result.should_enforce);
        assert_eq!(result.reason, PrecheckReason::TooFarOff);
    }

    // ── helpers ─────────────────────────────────────────────────────────────

    #[test]
    fn test_effective_retries_is_capped() {
        let mut config = config();
        assert_eq!(config.effective_retries(), 3);
        config.max_retries = Some(10);
        assert_eq!(config.effective_retries(), 3);
        config.max_retries = Some(1);
        assert_eq!(config.effective_retries(), 1);
    }

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("  \"Led 4 Airmen.\"  "), "Led 4 Airmen.");
        assert_eq!(strip_wrapping_quotes("“Led 4 Airmen.”"), "Led 4 Airmen.");
        assert_eq!(strip_wrapping_quotes("'Led'"), "Led");
        assert_eq!(strip_wrapping_quotes("Led \"Ops\" cell"), "Led \"Ops\" cell");
        assert_eq!(strip_wrapping_quotes("\""), "\"");
    }

    #[test]
    fn test_count_flips() {
        use VarianceDirection::{Over, Under};
        assert_eq!(count_flips(&[Under]), 0);
        assert_eq!(count_flips(&[Under, Under, Under]), 0);
        assert_eq!(count_flips(&[Under, Over]), 1);
        assert_eq!(count_flips(&[Under, Over, Under]), 2);
    }

    #[test]
    fn test_expand_prompt_names_delta_and_context() {
        let text = statement(300, 'a');
        let validation = validate(&text, 350, Some(340), None);
        let (system, prompt) = build_correction_prompt(&text, &validation, Some("Executing the Mission"));
        assert_eq!(system, EXPAND_SYSTEM);
        assert!(prompt.contains("ADD exactly 40 characters"));
        assert!(prompt.contains("CONTEXT: Executing the Mission"));
        assert!(prompt.contains(&text));
        assert!(!prompt.contains('{'), "all placeholders should be filled");
    }

    #[test]
    fn test_contract_prompt_for_over_length() {
        let text = statement(380, 'a');
        let validation = validate(&text, 350, Some(340), None);
        let (system, prompt) = build_correction_prompt(&text, &validation, None);
        assert_eq!(system, CONTRACT_SYSTEM);
        assert!(prompt.contains("REMOVE exactly 30 characters"));
        assert!(!prompt.contains("CONTEXT:"));
    }

    // ── enforce ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_already_compliant_makes_no_calls() {
        let generator = MockGenerator::scripted(vec![statement(345, 'b')]);
        let text = statement(342, 'a');
        let result = enforce(&text, &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Compliant);
        assert_eq!(result.attempts, 0);
        assert!(!result.was_adjusted);
        assert_eq!(result.statement, text);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_close_enough_skips_api() {
        let generator = MockGenerator::scripted(vec![statement(345, 'b')]);
        let result = enforce(&statement(330, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::CloseEnough);
        assert_eq!(result.attempts, 0);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_compliant_on_first_attempt() {
        let reply = statement(345, 'b');
        let generator = MockGenerator::scripted(vec![reply.clone()]);
        let result = enforce(&statement(300, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Compliant);
        assert_eq!(result.attempts, 1);
        assert!(result.was_adjusted);
        assert_eq!(result.statement, reply);
        assert!(result.final_validation.is_compliant);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_identical_reply_is_duplicate() {
        let text = statement(300, 'a');
        let echo = text.clone();
        let generator = MockGenerator::new(move |_| Ok(echo.clone()));
        let result = enforce(&text, &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Duplicate);
        assert!(result.attempts <= 3);
        assert_eq!(result.statement, text);
        assert!(!result.was_adjusted);
    }

    #[tokio::test]
    async fn test_quoted_echo_is_still_duplicate() {
        let text = statement(300, 'a');
        let quoted = format!("\"{text}\"");
        let generator = MockGenerator::new(move |_| Ok(quoted.clone()));
        let result = enforce(&text, &config(), &generator, &sanitizer()).await;
        assert_eq!(result.stop_reason, StopReason::Duplicate);
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_alternating_lengths_oscillate() {
        // Under by 40 → over by 30 → under by 20, forever.
        let over = statement(380, 'o');
        let under = statement(320, 'u');
        let generator = MockGenerator::new(move |call| {
            Ok(if call % 2 == 0 { over.clone() } else { under.clone() })
        });
        let result = enforce(&statement(300, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Oscillating);
        assert!(generator.calls() <= 3);
        assert_eq!(result.attempts, 2);
        // The 320-char reply was the closest seen.
        assert_eq!(result.final_validation.actual_length, 320);
    }

    #[tokio::test]
    async fn test_over_length_oscillation_is_detected() {
        // Over by 70 → under by 40 → over by 30: each miss shrinks, direction keeps flipping.
        let under = statement(300, 'u');
        let over = statement(380, 'o');
        let generator = MockGenerator::new(move |call| {
            Ok(if call % 2 == 0 { under.clone() } else { over.clone() })
        });
        let result = enforce(&statement(420, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Oscillating);
        assert_eq!(result.attempts, 2);
        assert_eq!(generator.calls(), 2);
        assert_eq!(result.final_validation.actual_length, 380);
        assert!(result.was_adjusted);
    }

    #[tokio::test]
    async fn test_unique_but_never_in_range_hits_max_retries() {
        let generator = MockGenerator::new(|call| Ok(statement(230 + call * 30, 'n')));
        let mut config = config();
        config.max_retries = Some(10);
        let result = enforce(&statement(200, 'a'), &config, &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::MaxRetries);
        assert_eq!(result.attempts, 3);
        assert_eq!(generator.calls(), 3);
        assert_eq!(result.final_validation.actual_length, 290);
    }

    #[tokio::test]
    async fn test_stagnating_model_stops_with_no_progress() {
        let generator = MockGenerator::scripted(vec![statement(305, 'b'), statement(307, 'c')]);
        let result = enforce(&statement(300, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::NoProgress);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.final_validation.actual_length, 307);
    }

    #[tokio::test]
    async fn test_close_enough_after_attempt() {
        let generator = MockGenerator::scripted(vec![statement(330, 'b')]);
        let result = enforce(&statement(300, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::CloseEnough);
        assert_eq!(result.attempts, 1);
        assert!(result.was_adjusted);
    }

    #[tokio::test]
    async fn test_model_error_returns_best_so_far() {
        let better = statement(320, 'b');
        let reply = better.clone();
        let generator = MockGenerator::new(move |call| match call {
            0 => Ok(reply.clone()),
            _ => Err(LlmError::EmptyContent),
        });
        let result = enforce(&statement(290, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Error);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.statement, better);
    }

    #[tokio::test]
    async fn test_error_on_first_call_keeps_original() {
        let generator = MockGenerator::new(|_| Err(LlmError::RateLimited { retries: 3 }));
        let text = statement(300, 'a');
        let result = enforce(&text, &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Error);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.statement, text);
        assert!(!result.was_adjusted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_model_times_out() {
        let mut config = config();
        config.call_timeout = Duration::from_secs(5);
        let text = statement(300, 'a');
        let result = enforce(&text, &config, &HangingGenerator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Error);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.statement, text);
    }

    #[tokio::test]
    async fn test_adjusted_statement_is_sanitized_and_revalidated() {
        let reply = format!("Utilized {}.", "x".repeat(335));
        assert_eq!(reply.chars().count(), 345);
        let generator = MockGenerator::scripted(vec![reply]);
        let result = enforce(&statement(300, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Compliant);
        assert!(result.statement.starts_with("Used "));
        assert_eq!(result.final_validation.actual_length, 341);
        assert!(result.final_validation.is_compliant);
    }

    #[tokio::test]
    async fn test_each_prompt_builds_on_previous_candidate() {
        let first = statement(230, 'b');
        let second = statement(270, 'c');
        let generator = MockGenerator::scripted(vec![first.clone(), second, statement(345, 'd')]);
        let result = enforce(&statement(200, 'a'), &config(), &generator, &sanitizer()).await;

        assert_eq!(result.stop_reason, StopReason::Compliant);
        assert_eq!(result.attempts, 3);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[1].contains(&first));
        assert!(prompts[1].contains("ADD exactly 110 characters"));
    }

    // ── enforce_batch ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_batch_bounds_concurrency_and_keeps_order() {
        let probe = ConcurrencyProbe {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let statements: Vec<String> = (0..7)
            .map(|i| statement(300, char::from(b'a' + i as u8)))
            .collect();

        let results = enforce_batch(&statements, &config(), &probe, &sanitizer()).await;

        assert_eq!(results.len(), 7);
        assert!(results.iter().all(|r| r.stop_reason == StopReason::Compliant));
        assert_eq!(probe.peak.load(Ordering::SeqCst), BATCH_SIZE);
    }

    #[tokio::test]
    async fn test_batch_of_compliant_statements_makes_no_calls() {
        let generator = MockGenerator::scripted(vec![statement(345, 'z')]);
        let statements = vec![statement(340, 'a'), statement(350, 'b')];
        let results = enforce_batch(&statements, &config(), &generator, &sanitizer()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].statement, statements[0]);
        assert_eq!(results[1].statement, statements[1]);
        assert_eq!(generator.calls(), 0);
    }
}
