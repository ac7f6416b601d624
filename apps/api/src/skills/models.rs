use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Evidence source label for skills found in résumé text.
pub const SOURCE_RESUME: &str = "resume";
/// Evidence source label for skills derived from GitHub activity.
pub const SOURCE_GITHUB: &str = "github";

/// Skills keyed by `normalize_skill_name` of their original name.
pub type SkillSet = BTreeMap<String, SkillItem>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    #[default]
    Technical,
    Soft,
    Domain,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Soft => "soft",
            SkillCategory::Domain => "domain",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technical" => Ok(SkillCategory::Technical),
            "soft" => Ok(SkillCategory::Soft),
            "domain" => Ok(SkillCategory::Domain),
            other => Err(AppError::Validation(format!(
                "Unknown skill category '{other}' (expected technical, soft or domain)"
            ))),
        }
    }
}

/// One textual occurrence supporting a skill claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceItem {
    pub source: String,
    pub snippet: String,
    /// 0.0 – 1.0
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// User curation state of a suggested skill.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    #[default]
    Suggested,
    Accepted,
    Rejected,
    Edited,
}

impl ManualStatus {
    /// Transition table for explicit user actions.
    ///
    /// `None` marks an illegal transition. No action leads back to `Suggested`.
    pub fn transition(self, action: SkillAction) -> Option<ManualStatus> {
        use ManualStatus::*;
        use SkillAction::*;

        match (self, action) {
            (Suggested | Accepted | Rejected | Edited, Accept) => Some(Accepted),
            (Suggested | Accepted | Rejected | Edited, Reject) => Some(Rejected),
            (Suggested | Accepted | Rejected | Edited, Edit) => Some(Edited),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManualStatus::Suggested => "suggested",
            ManualStatus::Accepted => "accepted",
            ManualStatus::Rejected => "rejected",
            ManualStatus::Edited => "edited",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillAction {
    Accept,
    Reject,
    Edit,
}

impl SkillAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillAction::Accept => "accept",
            SkillAction::Reject => "reject",
            SkillAction::Edit => "edit",
        }
    }
}

impl fmt::Display for SkillAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(SkillAction::Accept),
            "reject" => Ok(SkillAction::Reject),
            "edit" => Ok(SkillAction::Edit),
            other => Err(AppError::Validation(format!(
                "Invalid action '{other}' (expected accept, reject or edit)"
            ))),
        }
    }
}

/// A single skill in a profile.
///
/// `evidence` is never empty for a skill that lives in a profile.
/// `confidence` is fixed at creation and not recomputed after manual actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillItem {
    pub skill_id: Uuid,
    pub name: String,
    pub category: SkillCategory,
    pub confidence: f64,
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub mapped_taxonomy_id: Option<String>,
    #[serde(default)]
    pub manual_status: ManualStatus,
    #[serde(default)]
    pub edited_name: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl SkillItem {
    /// The name shown to users: the edited name when one was set.
    pub fn display_name(&self) -> &str {
        self.edited_name.as_deref().unwrap_or(&self.name)
    }

    /// Key under which this skill is stored in a profile.
    pub fn key(&self) -> String {
        normalize_skill_name(&self.name)
    }

    pub fn sources(&self) -> BTreeSet<&str> {
        self.evidence.iter().map(|e| e.source.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrivacySettings {
    pub share_github: bool,
    pub share_linkedin: bool,
    pub mask_pii: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            share_github: true,
            share_linkedin: true,
            mask_pii: true,
        }
    }
}

/// Skill profile built from one résumé (1:1 with `resume_id`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillProfile {
    pub profile_id: Uuid,
    pub resume_id: String,
    pub skills: SkillSet,
    #[serde(default)]
    pub privacy_settings: PrivacySettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillProfile {
    /// Looks a skill up by its original name (case-insensitive), never by `edited_name`.
    pub fn skill(&self, name: &str) -> Option<&SkillItem> {
        self.skills.get(&normalize_skill_name(name))
    }

    /// Skills that may count toward a job match.
    pub fn matchable_skills(&self) -> impl Iterator<Item = &SkillItem> {
        self.skills
            .values()
            .filter(|s| s.manual_status != ManualStatus::Rejected)
    }
}

/// Append-only record of one manual action on a skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub profile_id: Uuid,
    pub skill_name: String,
    pub action: SkillAction,
    pub previous_value: SkillItem,
    pub new_value: SkillItem,
    pub timestamp: DateTime<Utc>,
}

/// Request to accept, reject or edit a skill.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillActionRequest {
    pub profile_id: Uuid,
    pub skill_name: String,
    pub action: String,
    #[serde(default)]
    pub edited_name: Option<String>,
    #[serde(default)]
    pub edited_category: Option<String>,
}

/// Case-insensitive, whitespace-collapsed form of a skill name.
pub fn normalize_skill_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize_skill_name("  Machine   Learning "), "machine learning");
        assert_eq!(normalize_skill_name("React"), normalize_skill_name("react"));
    }

    #[test]
    fn test_no_transition_reverts_to_suggested() {
        let statuses = [
            ManualStatus::Suggested,
            ManualStatus::Accepted,
            ManualStatus::Rejected,
            ManualStatus::Edited,
        ];
        let actions = [SkillAction::Accept, SkillAction::Reject, SkillAction::Edit];
        for status in statuses {
            for action in actions {
                assert_ne!(status.transition(action), Some(ManualStatus::Suggested));
            }
        }
    }

    #[test]
    fn test_edited_skill_can_be_rejected() {
        assert_eq!(
            ManualStatus::Edited.transition(SkillAction::Reject),
            Some(ManualStatus::Rejected)
        );
    }

    #[test]
    fn test_action_parse_rejects_unknown() {
        assert_eq!("ACCEPT".parse::<SkillAction>().unwrap(), SkillAction::Accept);
        assert!(matches!(
            "approve".parse::<SkillAction>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_category_serde_is_lowercase() {
        let json = serde_json::to_string(&SkillCategory::Soft).unwrap();
        assert_eq!(json, r#""soft""#);
        let parsed: SkillCategory = serde_json::from_str(r#""domain""#).unwrap();
        assert_eq!(parsed, SkillCategory::Domain);
    }

    #[test]
    fn test_manual_status_defaults_to_suggested() {
        let json = r#"{
            "skill_id": "7f1e2a84-5f0c-4b8e-9d3a-1c2b3d4e5f60",
            "name": "Python",
            "category": "technical",
            "confidence": 0.5,
            "evidence": [{"source": "resume", "snippet": "Python", "score": 0.5}]
        }"#;
        let skill: SkillItem = serde_json::from_str(json).unwrap();
        assert_eq!(skill.manual_status, ManualStatus::Suggested);
        assert!(skill.tags.is_empty());
        assert_eq!(skill.display_name(), "Python");
    }
}
