// ── Work experience domain type ──

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceKind};
use super::resource_id::ResourceId;

/// A position in the work history timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub id: ResourceId,
    pub company: String,
    pub position: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_date: NaiveDate,
    /// `None` while the position is current.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceDraft {
    pub company: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperiencePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl Resource for WorkExperience {
    type Draft = WorkExperienceDraft;
    type Patch = WorkExperiencePatch;

    const KIND: ResourceKind = ResourceKind::WorkExperience;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: ResourceId, draft: &WorkExperienceDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            company: draft.company.clone(),
            position: draft.position.clone(),
            location: draft.location.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            current: draft.current,
            description: draft.description.clone(),
            highlights: draft.highlights.clone(),
            display_order: draft.display_order,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &WorkExperiencePatch) {
        if let Some(v) = &patch.company {
            self.company.clone_from(v);
        }
        if let Some(v) = &patch.position {
            self.position.clone_from(v);
        }
        if let Some(v) = &patch.location {
            self.location = Some(v.clone());
        }
        if let Some(v) = patch.start_date {
            self.start_date = v;
        }
        if let Some(v) = patch.end_date {
            self.end_date = Some(v);
            self.current = false;
        }
        if let Some(v) = patch.current {
            self.current = v;
            if v {
                self.end_date = None;
            }
        }
        if let Some(v) = &patch.description {
            self.description.clone_from(v);
        }
        if let Some(v) = &patch.highlights {
            self.highlights.clone_from(v);
        }
        if let Some(v) = patch.display_order {
            self.display_order = v;
        }
    }
}
