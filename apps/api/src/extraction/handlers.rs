//! Axum route handlers for course-plan extraction and free generation.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::models::{
    require_units, ExtractCourseRequest, ExtractUnitsRequest, GenerateRequest, PdfPayload,
};
use crate::extraction::prompts::{capabilities_prompt, course_prompt, knowledge_prompt};
use crate::gemini::DEFAULT_GENERATION_MAX_TOKENS;
use crate::models::response::{ContentResponse, DataResponse};
use crate::state::AppState;

/// POST /extract-course
///
/// Extracts course metadata and the units not already listed in `ucsFromExcel`.
pub async fn handle_extract_course(
    State(state): State<AppState>,
    payload: Result<Json<ExtractCourseRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Value>>, AppError> {
    let Json(request) = payload?;
    let pdf = PdfPayload::parse(request.pdf_base64.as_deref())?;
    let mut known_units = request.ucs_from_excel.unwrap_or_default();
    known_units.retain(|u| !u.name().is_empty());

    info!(known_units = known_units.len(), "Extracting course metadata");
    let data = state
        .gemini
        .extract_json(&course_prompt(&known_units), pdf.as_str())
        .await?;

    Ok(Json(DataResponse::new(data)))
}

/// POST /extract-capacidades
///
/// Extracts CB/CT/CS capability lists for each requested unit.
pub async fn handle_extract_capabilities(
    State(state): State<AppState>,
    payload: Result<Json<ExtractUnitsRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Value>>, AppError> {
    let Json(request) = payload?;
    let pdf = PdfPayload::parse(request.pdf_base64.as_deref())?;
    let units = require_units(request.ucs)?;

    info!(units = units.len(), "Extracting capabilities");
    let data = state
        .gemini
        .extract_json(&capabilities_prompt(&units), pdf.as_str())
        .await?;

    Ok(Json(DataResponse::new(data)))
}

/// POST /extract-conhecimentos
///
/// Extracts the knowledge-topic tree of each requested unit.
pub async fn handle_extract_knowledge(
    State(state): State<AppState>,
    payload: Result<Json<ExtractUnitsRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Value>>, AppError> {
    let Json(request) = payload?;
    let pdf = PdfPayload::parse(request.pdf_base64.as_deref())?;
    let units = require_units(request.ucs)?;

    info!(units = units.len(), "Extracting knowledge topics");
    let data = state
        .gemini
        .extract_json(&knowledge_prompt(&units), pdf.as_str())
        .await?;

    Ok(Json(DataResponse::new(data)))
}

/// POST /generate
///
/// Pass-through generation from caller-supplied prompts. Returns the raw
/// completion text; hitting the token ceiling fails the request.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<ContentResponse>, AppError> {
    let Json(request) = payload?;

    let system_prompt = request
        .system_prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("systemPrompt is required".to_string()))?;
    let user_prompt = request
        .user_prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("userPrompt is required".to_string()))?;

    let max_tokens = request.max_tokens.unwrap_or(DEFAULT_GENERATION_MAX_TOKENS);
    if max_tokens == 0 {
        return Err(AppError::Validation(
            "maxTokens must be greater than zero".to_string(),
        ));
    }

    info!(max_tokens, "Generating content");
    let content = state
        .gemini
        .generate(&system_prompt, &user_prompt, max_tokens)
        .await?;

    Ok(Json(ContentResponse::new(content)))
}
