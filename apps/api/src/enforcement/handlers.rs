use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::enforcement::enforcer::{
    enforce, enforce_batch, should_enforce, EnforcementConfig, EnforcementResult, PrecheckResult,
};
use crate::enforcement::validation::{validate, CharacterValidationResult};
use crate::errors::AppError;
use crate::state::AppState;

/// Upper bound on statements accepted by one batch request.
const MAX_BATCH_STATEMENTS: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnforceRequest {
    pub text: String,
    pub target_max: usize,
    pub target_min: Option<usize>,
    pub max_retries: Option<u32>,
    pub model: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnforceBatchRequest {
    pub statements: Vec<String>,
    pub target_max: usize,
    pub target_min: Option<usize>,
    pub max_retries: Option<u32>,
    pub model: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnforceBatchResponse {
    pub results: Vec<EnforcementResult>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub text: String,
    pub target_max: usize,
    pub target_min: Option<usize>,
    pub tolerance: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub text: String,
    pub target_max: usize,
    pub target_min: Option<usize>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/enforce
pub async fn handle_enforce(
    State(state): State<AppState>,
    Json(request): Json<EnforceRequest>,
) -> Result<Json<EnforcementResult>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    let config = build_config(
        &state,
        request.target_max,
        request.target_min,
        request.max_retries,
        request.model,
        request.context,
    )?;

    let result = enforce(&request.text, &config, state.llm.as_ref(), &state.sanitizer).await;
    Ok(Json(result))
}

/// POST /api/v1/enforce/batch
pub async fn handle_enforce_batch(
    State(state): State<AppState>,
    Json(request): Json<EnforceBatchRequest>,
) -> Result<Json<EnforceBatchResponse>, AppError> {
    if request.statements.is_empty() {
        return Err(AppError::Validation("statements must not be empty".to_string()));
    }
    if request.statements.len() > MAX_BATCH_STATEMENTS {
        return Err(AppError::Validation(format!(
            "at most {MAX_BATCH_STATEMENTS} statements per batch"
        )));
    }
    let config = build_config(
        &state,
        request.target_max,
        request.target_min,
        request.max_retries,
        request.model,
        request.context,
    )?;

    info!(count = request.statements.len(), "Enforcing statement batch");
    let results =
        enforce_batch(&request.statements, &config, state.llm.as_ref(), &state.sanitizer).await;
    Ok(Json(EnforceBatchResponse { results }))
}

/// POST /api/v1/enforce/validate
pub async fn handle_validate(
    Json(request): Json<ValidateRequest>,
) -> Result<Json<CharacterValidationResult>, AppError> {
    check_window(request.target_max, request.target_min)?;
    Ok(Json(validate(
        &request.text,
        request.target_max,
        request.target_min,
        request.tolerance,
    )))
}

/// POST /api/v1/enforce/check
pub async fn handle_check(
    Json(request): Json<CheckRequest>,
) -> Result<Json<PrecheckResult>, AppError> {
    check_window(request.target_max, request.target_min)?;
    Ok(Json(should_enforce(
        &request.text,
        request.target_max,
        request.target_min,
    )))
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn build_config(
    state: &AppState,
    target_max: usize,
    target_min: Option<usize>,
    max_retries: Option<u32>,
    model: Option<String>,
    context: Option<String>,
) -> Result<EnforcementConfig, AppError> {
    check_window(target_max, target_min)?;

    let model = model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.config.llm_model.clone());
    let mut config = EnforcementConfig::new(target_max, model);
    config.target_min = target_min;
    config.max_retries = max_retries;
    config.context = context;
    config.call_timeout = state.config.llm_call_timeout;
    Ok(config)
}

fn check_window(target_max: usize, target_min: Option<usize>) -> Result<(), AppError> {
    if target_max == 0 {
        return Err(AppError::Validation("target_max must be greater than zero".to_string()));
    }
    if let Some(min) = target_min {
        if min > target_max {
            return Err(AppError::Validation(format!(
                "target_min ({min}) must not exceed target_max ({target_max})"
            )));
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
