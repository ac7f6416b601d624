use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{SkillAuditLogRow, SkillProfileRow};
use crate::skills::models::{AuditLogEntry, SkillItem, SkillProfile};

/// One accepted manual action: the new skill value and its audit record.
pub struct SkillUpdate<'a> {
    pub profile_id: Uuid,
    /// Normalized key of the skill inside the profile.
    pub skill_key: &'a str,
    pub skill: &'a SkillItem,
    pub updated_at: DateTime<Utc>,
    pub audit: &'a AuditLogEntry,
}

/// Durable profile persistence, keyed by profile id and by résumé id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts a new profile. When the résumé already has one, the stored profile is
    /// returned unchanged instead.
    async fn insert_profile(&self, profile: &SkillProfile) -> Result<SkillProfile, AppError>;

    /// Inserts or fully replaces the profile with the same `profile_id`.
    async fn put_profile(&self, profile: &SkillProfile) -> Result<(), AppError>;

    async fn get_profile(&self, profile_id: Uuid) -> Result<Option<SkillProfile>, AppError>;

    async fn get_profile_by_resume(&self, resume_id: &str)
        -> Result<Option<SkillProfile>, AppError>;

    /// Replaces one skill and appends its audit entry atomically. Concurrent updates
    /// to the same skill are last-writer-wins; every audit entry is kept.
    async fn save_skill_update(&self, update: SkillUpdate<'_>) -> Result<(), AppError>;

    /// Audit history of a profile, oldest first.
    async fn audit_log(&self, profile_id: Uuid) -> Result<Vec<AuditLogEntry>, AppError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ─────────────────────────────────────────────────────────────────────────────

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn insert_profile(&self, profile: &SkillProfile) -> Result<SkillProfile, AppError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO skill_profiles
                (profile_id, resume_id, skills, privacy_settings, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (resume_id) DO NOTHING
            "#,
        )
        .bind(profile.profile_id)
        .bind(&profile.resume_id)
        .bind(Json(&profile.skills))
        .bind(Json(&profile.privacy_settings))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            info!(
                "Stored skill profile {} for resume {} ({} skills)",
                profile.profile_id,
                profile.resume_id,
                profile.skills.len()
            );
            return Ok(profile.clone());
        }

        // Lost a race with another request for the same résumé
        self.get_profile_by_resume(&profile.resume_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Profile for resume {} vanished after conflict",
                    profile.resume_id
                ))
            })
    }

    async fn put_profile(&self, profile: &SkillProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO skill_profiles
                (profile_id, resume_id, skills, privacy_settings, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (profile_id) DO UPDATE SET
                resume_id = EXCLUDED.resume_id,
                skills = EXCLUDED.skills,
                privacy_settings = EXCLUDED.privacy_settings,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.profile_id)
        .bind(&profile.resume_id)
        .bind(Json(&profile.skills))
        .bind(Json(&profile.privacy_settings))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_profile(&self, profile_id: Uuid) -> Result<Option<SkillProfile>, AppError> {
        let row = sqlx::query_as::<_, SkillProfileRow>(
            "SELECT * FROM skill_profiles WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SkillProfile::from))
    }

    async fn get_profile_by_resume(
        &self,
        resume_id: &str,
    ) -> Result<Option<SkillProfile>, AppError> {
        let row = sqlx::query_as::<_, SkillProfileRow>(
            "SELECT * FROM skill_profiles WHERE resume_id = $1",
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SkillProfile::from))
    }

    async fn save_skill_update(&self, update: SkillUpdate<'_>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE skill_profiles
            SET skills = jsonb_set(skills, ARRAY[$2::text], $3, false),
                updated_at = $4
            WHERE profile_id = $1 AND skills ? $2
            "#,
        )
        .bind(update.profile_id)
        .bind(update.skill_key)
        .bind(Json(update.skill))
        .bind(update.updated_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::SkillNotFound(format!(
                "Skill '{}' not found in profile {}",
                update.skill_key, update.profile_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO skill_audit_logs
                (profile_id, skill_name, action, previous_value, new_value, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(update.audit.profile_id)
        .bind(&update.audit.skill_name)
        .bind(update.audit.action.as_str())
        .bind(Json(&update.audit.previous_value))
        .bind(Json(&update.audit.new_value))
        .bind(update.audit.timestamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn audit_log(&self, profile_id: Uuid) -> Result<Vec<AuditLogEntry>, AppError> {
        let rows = sqlx::query_as::<_, SkillAuditLogRow>(
            r#"
            SELECT * FROM skill_audit_logs
            WHERE profile_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<Uuid, SkillProfile>,
    by_resume: HashMap<String, Uuid>,
    audit: Vec<AuditLogEntry>,
}

/// Process-local store for tests and database-less local runs.
#[derive(Default)]
pub struct InMemoryProfileStore {
    state: RwLock<MemoryState>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn insert_profile(&self, profile: &SkillProfile) -> Result<SkillProfile, AppError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .by_resume
            .get(&profile.resume_id)
            .and_then(|id| state.profiles.get(id))
        {
            return Ok(existing.clone());
        }
        state
            .by_resume
            .insert(profile.resume_id.clone(), profile.profile_id);
        state.profiles.insert(profile.profile_id, profile.clone());
        Ok(profile.clone())
    }

    async fn put_profile(&self, profile: &SkillProfile) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if let Some(previous) = state.profiles.get(&profile.profile_id) {
            let stale_resume = previous.resume_id.clone();
            state.by_resume.remove(&stale_resume);
        }
        state
            .by_resume
            .insert(profile.resume_id.clone(), profile.profile_id);
        state.profiles.insert(profile.profile_id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, profile_id: Uuid) -> Result<Option<SkillProfile>, AppError> {
        Ok(self.state.read().await.profiles.get(&profile_id).cloned())
    }

    async fn get_profile_by_resume(
        &self,
        resume_id: &str,
    ) -> Result<Option<SkillProfile>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .by_resume
            .get(resume_id)
            .and_then(|id| state.profiles.get(id))
            .cloned())
    }

    async fn save_skill_update(&self, update: SkillUpdate<'_>) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let profile = state.profiles.get_mut(&update.profile_id).ok_or_else(|| {
            AppError::NotFound(format!("Skill profile {} not found", update.profile_id))
        })?;
        let slot = profile.skills.get_mut(update.skill_key).ok_or_else(|| {
            AppError::SkillNotFound(format!(
                "Skill '{}' not found in profile {}",
                update.skill_key, update.profile_id
            ))
        })?;
        *slot = update.skill.clone();
        profile.updated_at = update.updated_at;
        state.audit.push(update.audit.clone());
        Ok(())
    }

    async fn audit_log(&self, profile_id: Uuid) -> Result<Vec<AuditLogEntry>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .audit
            .iter()
            .filter(|e| e.profile_id == profile_id)
            .cloned()
            .collect())
    }
}
