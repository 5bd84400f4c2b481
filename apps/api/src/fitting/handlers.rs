//! Axum route handlers for the line-fit engine.
//!
//! Rendering and optimization are CPU-bound (optimization re-renders once per
//! substituted space), so they run inside `tokio::task::spawn_blocking`.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::fitting::analysis::{analyze, TextFitAnalysis};
use crate::fitting::display::{from_display, normalize, to_display};
use crate::fitting::optimize::{optimize, OptimizeResult};
use crate::fitting::render::{render, RenderResult};
use crate::fitting::width_table::DEFAULT_TARGET_WIDTH;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FitRequest {
    pub text: String,
    /// Field width in px. Defaults to the evaluation form's narrative field.
    pub target_width: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub target_width: Option<f64>,
    /// Collapse optimization spaces and non-breaking hyphens before measuring.
    #[serde(default)]
    pub normalize: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    ToDisplay,
    FromDisplay,
    Normalize,
}

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    pub text: String,
    pub mode: TransformMode,
}

#[derive(Debug, Serialize)]
pub struct TransformResponse {
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/fit/render
pub async fn handle_render(Json(request): Json<FitRequest>) -> Result<Json<RenderResult>, AppError> {
    let target_width = resolve_target_width(request.target_width)?;
    let result = run_blocking(move || render(&request.text, target_width)).await?;
    debug!(lines = result.lines, overflow = result.overflow, "Rendered statement");
    Ok(Json(result))
}

/// POST /api/v1/fit/optimize
pub async fn handle_optimize(
    Json(request): Json<FitRequest>,
) -> Result<Json<OptimizeResult>, AppError> {
    let target_width = resolve_target_width(request.target_width)?;
    let result = run_blocking(move || optimize(&request.text, target_width)).await?;
    debug!(
        status = ?result.status,
        substitutions = result.substitutions,
        "Optimized statement spacing"
    );
    Ok(Json(result))
}

/// POST /api/v1/fit/analyze
pub async fn handle_analyze(
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<TextFitAnalysis>, AppError> {
    let target_width = resolve_target_width(request.target_width)?;
    let text = if request.normalize {
        normalize(&request.text)
    } else {
        request.text
    };
    let result = run_blocking(move || analyze(&text, target_width)).await?;
    Ok(Json(result))
}

/// POST /api/v1/fit/transform
pub async fn handle_transform(Json(request): Json<TransformRequest>) -> Json<TransformResponse> {
    let text = match request.mode {
        TransformMode::ToDisplay => to_display(&request.text),
        TransformMode::FromDisplay => from_display(&request.text),
        TransformMode::Normalize => normalize(&request.text),
    };
    Json(TransformResponse { text })
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn resolve_target_width(target_width: Option<f64>) -> Result<f64, AppError> {
    let width = target_width.unwrap_or(DEFAULT_TARGET_WIDTH);
    if !width.is_finite() || width <= 0.0 {
        return Err(AppError::Validation(
            "target_width must be a positive number".to_string(),
        ));
    }
    Ok(width)
}

async fn run_blocking<T, F>(job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in fit engine: {e}")))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
