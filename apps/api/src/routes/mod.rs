pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::export::handlers as export;
use crate::matching::handlers as matching;
use crate::skills::handlers as skills;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Skill profiles
        .route("/api/v1/skills/profile", post(skills::handle_create_profile))
        .route(
            "/api/v1/skills/profile/:profile_id",
            get(skills::handle_get_profile),
        )
        .route(
            "/api/v1/skills/profile/by-resume/:resume_id",
            get(skills::handle_get_profile_by_resume),
        )
        .route(
            "/api/v1/skills/profile/:profile_id/audit",
            get(skills::handle_audit_log),
        )
        .route(
            "/api/v1/skills/skill/action",
            post(skills::handle_skill_action),
        )
        // Job matching
        .route("/api/v1/skills/match-job", post(matching::handle_match_job))
        // Export / import
        .route(
            "/api/v1/skills/export/:profile_id",
            get(export::handle_export),
        )
        .route("/api/v1/skills/import", post(export::handle_import))
        .with_state(state)
}
