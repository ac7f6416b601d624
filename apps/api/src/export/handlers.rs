use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{mask_pii, validate_import, ExportFormat};
use crate::skills::models::SkillProfile;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_mask_pii")]
    pub mask_pii: bool,
}

fn default_mask_pii() -> bool {
    true
}

/// GET /api/v1/skills/export/:profile_id?format=json|csv|sap&mask_pii=bool
pub async fn handle_export(
    State(state): State<AppState>,
    Path(profile_id): Path<Uuid>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = match params.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };

    let mut profile = state
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill profile {profile_id} not found")))?;

    if params.mask_pii {
        mask_pii(&mut profile);
    }

    let body = format.render(&profile)?;
    info!(
        "Exported skill profile {profile_id} as {format:?} ({} skills, mask_pii: {})",
        profile.skills.len(),
        params.mask_pii
    );

    let disposition = format!("attachment; filename={}", format.file_name(profile_id));
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/v1/skills/import
pub async fn handle_import(
    State(state): State<AppState>,
    Json(profile): Json<SkillProfile>,
) -> Result<(StatusCode, Json<SkillProfile>), AppError> {
    validate_import(&profile)?;

    if let Some(owner) = state.store.get_profile_by_resume(&profile.resume_id).await? {
        if owner.profile_id != profile.profile_id {
            return Err(AppError::Validation(format!(
                "Resume {} already belongs to skill profile {}",
                profile.resume_id, owner.profile_id
            )));
        }
    }

    state.store.put_profile(&profile).await?;
    info!(
        "Imported skill profile {} for resume {} ({} skills)",
        profile.profile_id,
        profile.resume_id,
        profile.skills.len()
    );
    Ok((StatusCode::CREATED, Json(profile)))
}
