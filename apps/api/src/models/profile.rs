use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::skills::models::{AuditLogEntry, PrivacySettings, SkillItem, SkillProfile, SkillSet};

#[derive(Debug, Clone, FromRow)]
pub struct SkillProfileRow {
    pub profile_id: Uuid,
    pub resume_id: String,
    pub skills: Json<SkillSet>,
    pub privacy_settings: Json<PrivacySettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SkillProfileRow> for SkillProfile {
    fn from(row: SkillProfileRow) -> Self {
        SkillProfile {
            profile_id: row.profile_id,
            resume_id: row.resume_id,
            skills: row.skills.0,
            privacy_settings: row.privacy_settings.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SkillAuditLogRow {
    pub id: i64,
    pub profile_id: Uuid,
    pub skill_name: String,
    pub action: String,
    pub previous_value: Json<SkillItem>,
    pub new_value: Json<SkillItem>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SkillAuditLogRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: SkillAuditLogRow) -> Result<Self, Self::Error> {
        Ok(AuditLogEntry {
            profile_id: row.profile_id,
            skill_name: row.skill_name,
            action: row.action.parse()?,
            previous_value: row.previous_value.0,
            new_value: row.new_value.0,
            timestamp: row.created_at,
        })
    }
}
