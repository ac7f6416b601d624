use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::skills::github::GithubData;
use crate::skills::models::{AuditLogEntry, SkillActionRequest, SkillItem, SkillProfile};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateProfileRequest {
    pub resume_id: String,
    pub resume_text: String,
    #[serde(default)]
    pub github_data: Option<GithubData>,
}

#[derive(Serialize)]
pub struct SkillActionResponse {
    pub success: bool,
    pub message: String,
    pub updated_skill: SkillItem,
}

/// POST /api/v1/skills/profile
pub async fn handle_create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<Json<SkillProfile>, AppError> {
    let profile = state
        .extraction
        .create_profile(&req.resume_id, &req.resume_text, req.github_data.as_ref())
        .await?;
    Ok(Json(profile))
}

/// GET /api/v1/skills/profile/:profile_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<SkillProfile>, AppError> {
    let profile = state
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill profile {profile_id} not found")))?;
    Ok(Json(profile))
}

/// GET /api/v1/skills/profile/by-resume/:resume_id
pub async fn handle_get_profile_by_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<String>,
) -> Result<Json<SkillProfile>, AppError> {
    let profile = state
        .store
        .get_profile_by_resume(&resume_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No skill profile for resume {resume_id}"))
        })?;
    Ok(Json(profile))
}

/// GET /api/v1/skills/profile/:profile_id/audit
pub async fn handle_audit_log(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    if state.store.get_profile(profile_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Skill profile {profile_id} not found"
        )));
    }
    let log = state.store.audit_log(profile_id).await?;
    Ok(Json(log))
}

/// POST /api/v1/skills/skill/action
pub async fn handle_skill_action(
    State(state): State<AppState>,
    Json(req): Json<SkillActionRequest>,
) -> Result<Json<SkillActionResponse>, AppError> {
    let updated_skill = state.extraction.apply_action(&req).await?;
    Ok(Json(SkillActionResponse {
        success: true,
        message: format!(
            "Skill '{}' marked as {}",
            req.skill_name,
            updated_skill.manual_status.as_str()
        ),
        updated_skill,
    }))
}
