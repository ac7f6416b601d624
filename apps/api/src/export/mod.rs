// Profile export (JSON, CSV, SAP SuccessFactors CSV) and JSON import.
// Formats live at the API edge; the skill core only hands over `SkillProfile`.

pub mod handlers;

use std::str::FromStr;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::skills::models::{ManualStatus, SkillItem, SkillProfile};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

/// 555-123-4567, 555.123.4567, 5551234567
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap());

const CSV_HEADER: [&str; 7] = [
    "Skill Name",
    "Category",
    "Confidence",
    "Status",
    "ESCO ID",
    "Evidence Count",
    "Sources",
];

const SAP_HEADER: [&str; 8] = [
    "externalCode",
    "name_en_US",
    "proServRatingScaleOption",
    "proServRatingScaleLabel",
    "libraryId",
    "category",
    "lastModifiedDateTime",
    "status",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Sap,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv | ExportFormat::Sap => "text/csv",
        }
    }

    pub fn file_name(&self, profile_id: Uuid) -> String {
        match self {
            ExportFormat::Json => format!("skill_profile_{profile_id}.json"),
            ExportFormat::Csv => format!("skills_{profile_id}.csv"),
            ExportFormat::Sap => format!("sap_successfactors_skills_{profile_id}.csv"),
        }
    }

    pub fn render(&self, profile: &SkillProfile) -> Result<String> {
        match self {
            ExportFormat::Json => to_json(profile),
            ExportFormat::Csv => to_csv(profile),
            ExportFormat::Sap => to_sap_csv(profile),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "sap" => Ok(ExportFormat::Sap),
            other => Err(AppError::Validation(format!(
                "Unsupported export format '{other}' (expected json, csv or sap)"
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PII masking
// ────────────────────────────────────────────────────────────────────────────

pub fn mask_snippet(snippet: &str) -> String {
    let masked = EMAIL_RE.replace_all(snippet, "[EMAIL]");
    PHONE_RE.replace_all(&masked, "[PHONE]").into_owned()
}

/// Masks e-mail addresses and phone numbers in every evidence snippet. Applied to
/// export copies only; stored profiles keep the original text.
pub fn mask_pii(profile: &mut SkillProfile) {
    for skill in profile.skills.values_mut() {
        for evidence in &mut skill.evidence {
            evidence.snippet = mask_snippet(&evidence.snippet);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Formats
// ────────────────────────────────────────────────────────────────────────────

pub fn to_json(profile: &SkillProfile) -> Result<String> {
    Ok(serde_json::to_string_pretty(profile)?)
}

/// All non-rejected skills, one row each.
pub fn to_csv(profile: &SkillProfile) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for skill in profile
        .skills
        .values()
        .filter(|s| s.manual_status != ManualStatus::Rejected)
    {
        let sources = skill.sources().into_iter().collect::<Vec<_>>().join(", ");
        writer.write_record([
            skill.display_name().to_string(),
            skill.category.as_str().to_string(),
            skill.confidence.to_string(),
            skill.manual_status.as_str().to_string(),
            skill.mapped_taxonomy_id.clone().unwrap_or_default(),
            skill.evidence.len().to_string(),
            sources,
        ])?;
    }

    finish(writer)
}

/// SAP SuccessFactors Job Profile Builder import rows for accepted and suggested skills.
pub fn to_sap_csv(profile: &SkillProfile) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SAP_HEADER)?;

    let modified = profile.updated_at.format("%Y-%m-%dT%H:%M:%S").to_string();
    for skill in profile.skills.values() {
        let status = match skill.manual_status {
            ManualStatus::Accepted => "ACTIVE",
            ManualStatus::Suggested => "SUGGESTED",
            ManualStatus::Rejected | ManualStatus::Edited => continue,
        };
        let (rating, label) = proficiency_rating(skill.confidence);
        let library = if skill.mapped_taxonomy_id.is_some() {
            "ESCO"
        } else {
            "CUSTOM"
        };
        writer.write_record([
            external_code(skill),
            skill.display_name().to_string(),
            rating.to_string(),
            label.to_string(),
            library.to_string(),
            skill.category.as_str().to_uppercase(),
            modified.clone(),
            status.to_string(),
        ])?;
    }

    finish(writer)
}

/// Confidence → SAP 1–5 proficiency rating and label.
pub fn proficiency_rating(confidence: f64) -> (u8, &'static str) {
    if confidence >= 0.9 {
        (5, "Expert")
    } else if confidence >= 0.75 {
        (4, "Advanced")
    } else if confidence >= 0.6 {
        (3, "Intermediate")
    } else if confidence >= 0.4 {
        (2, "Basic")
    } else {
        (1, "Novice")
    }
}

fn external_code(skill: &SkillItem) -> String {
    match &skill.mapped_taxonomy_id {
        Some(id) => id.clone(),
        None => format!("CUSTOM_{}", skill.name.to_uppercase().replace(' ', "_")),
    }
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

// ────────────────────────────────────────────────────────────────────────────
// Import
// ────────────────────────────────────────────────────────────────────────────

/// Structural checks on an imported profile. Ownership of the résumé id is checked
/// by the handler against the store.
pub fn validate_import(profile: &SkillProfile) -> Result<(), AppError> {
    if profile.resume_id.trim().is_empty() {
        return Err(AppError::Validation("resume_id must not be empty".to_string()));
    }
    for (key, skill) in &profile.skills {
        if *key != skill.key() {
            return Err(AppError::Validation(format!(
                "Skill '{}' is stored under key '{key}', expected '{}'",
                skill.name,
                skill.key()
            )));
        }
        if skill.evidence.is_empty() {
            return Err(AppError::Validation(format!(
                "Skill '{}' has no evidence",
                skill.name
            )));
        }
        if !(0.0..=1.0).contains(&skill.confidence) {
            return Err(AppError::Validation(format!(
                "Skill '{}' has confidence {} outside 0.0..=1.0",
                skill.name, skill.confidence
            )));
        }
    }
    Ok(())
}
