use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::MAX_TOP_K;
use crate::errors::AppError;
use crate::matching::job_match::MatchResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MatchJobRequest {
    pub profile_id: Uuid,
    pub job_text: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// POST /api/v1/skills/match-job
pub async fn handle_match_job(
    State(state): State<AppState>,
    Json(req): Json<MatchJobRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let top_k = req.top_k.unwrap_or(state.config.default_top_k);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}, got {top_k}"
        )));
    }

    let profile = state
        .store
        .get_profile(req.profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill profile {} not found", req.profile_id)))?;

    let result = state
        .job_matcher
        .match_profile(&profile, &req.job_text, top_k)
        .await;
    info!(
        "Matched profile {} against job: score {:.2}, {} matched, {} missing",
        profile.profile_id,
        result.match_score,
        result.matched_skills.len(),
        result.missing_skills.len()
    );
    Ok(Json(result))
}
