//! Request bodies for the extraction and generation endpoints.
//!
//! Every field is optional at the serde level so a missing field becomes a
//! 400 with our error shape instead of an extractor rejection.

use std::fmt;

use serde::Deserialize;

use crate::errors::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractCourseRequest {
    pub pdf_base64: Option<String>,
    /// Units the caller already has (from a spreadsheet); excluded from the result.
    #[serde(default)]
    pub ucs_from_excel: Option<Vec<UnitDescriptor>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractUnitsRequest {
    pub pdf_base64: Option<String>,
    #[serde(default)]
    pub ucs: Option<Vec<UnitDescriptor>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub max_tokens: Option<u32>,
}

/// A curricular unit as named by the caller: a bare name, or an object
/// straight out of the course spreadsheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UnitDescriptor {
    Name(String),
    Detailed(UnitRow),
}

/// Spreadsheet row. Exports mix Portuguese and English headers, sometimes
/// both in one row; the Portuguese column wins when both are filled.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRow {
    pub nome: Option<String>,
    pub name: Option<String>,
    pub carga_horaria: Option<Hours>,
    pub hours: Option<Hours>,
    pub modulo: Option<String>,
    pub module: Option<String>,
}

/// First of the two columns holding non-blank text.
fn first_filled<'a>(
    preferred: &'a Option<String>,
    fallback: &'a Option<String>,
) -> Option<&'a str> {
    [preferred, fallback]
        .into_iter()
        .filter_map(|v| v.as_deref().map(str::trim))
        .find(|v| !v.is_empty())
}

/// Spreadsheet exports give hours either as a number or as text like "60h".
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Hours {
    Number(f64),
    Text(String),
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hours::Number(n) => write!(f, "{n}h"),
            Hours::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

impl UnitDescriptor {
    /// Trimmed unit name; empty when the row carries none.
    pub fn name(&self) -> &str {
        match self {
            UnitDescriptor::Name(name) => name.trim(),
            UnitDescriptor::Detailed(row) => first_filled(&row.nome, &row.name).unwrap_or(""),
        }
    }

    /// One-line rendering for prompts, e.g. "Banco de Dados (120h, Módulo Específico I)".
    pub fn label(&self) -> String {
        let UnitDescriptor::Detailed(row) = self else {
            return self.name().to_string();
        };

        let details: Vec<String> = row
            .carga_horaria
            .as_ref()
            .or(row.hours.as_ref())
            .map(ToString::to_string)
            .into_iter()
            .chain(first_filled(&row.modulo, &row.module).map(str::to_string))
            .filter(|d| !d.is_empty())
            .collect();

        if details.is_empty() {
            self.name().to_string()
        } else {
            format!("{} ({})", self.name(), details.join(", "))
        }
    }
}

/// Requires a non-empty unit list with no blank names.
pub fn require_units(ucs: Option<Vec<UnitDescriptor>>) -> Result<Vec<UnitDescriptor>, AppError> {
    let ucs = ucs
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("ucs must be a non-empty list".to_string()))?;

    if ucs.iter().any(|u| u.name().is_empty()) {
        return Err(AppError::Validation(
            "every entry in ucs must have a name".to_string(),
        ));
    }
    Ok(ucs)
}

/// Base64 PDF payload as forwarded to Gemini: any `data:` URL prefix removed
/// and line wrapping joined. The content itself is left for the provider to
/// judge; only absence is rejected here.
#[derive(Debug)]
pub struct PdfPayload(String);

impl PdfPayload {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = raw
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("pdfBase64 is required".to_string()))?;

        let data = match raw.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => raw,
        };

        let data: String = if data.contains(|c: char| c.is_ascii_whitespace()) {
            data.chars().filter(|c| !c.is_ascii_whitespace()).collect()
        } else {
            data.to_string()
        };
        if data.is_empty() {
            return Err(AppError::Validation("pdfBase64 is required".to_string()));
        }

        Ok(Self(data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
