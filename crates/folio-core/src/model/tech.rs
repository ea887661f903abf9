// ── Tech stack domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceKind};
use super::resource_id::ResourceId;

/// One entry in the tech stack grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechItem {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// 0-100.
    #[serde(default)]
    pub proficiency: Option<u8>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechItemDraft {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<u8>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl Resource for TechItem {
    type Draft = TechItemDraft;
    type Patch = TechItemPatch;

    const KIND: ResourceKind = ResourceKind::TechStack;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: ResourceId, draft: &TechItemDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            category: draft.category.clone(),
            icon_url: draft.icon_url.clone(),
            proficiency: draft.proficiency,
            display_order: draft.display_order,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &TechItemPatch) {
        if let Some(v) = &patch.name {
            self.name.clone_from(v);
        }
        if let Some(v) = &patch.category {
            self.category.clone_from(v);
        }
        if let Some(v) = &patch.icon_url {
            self.icon_url = Some(v.clone());
        }
        if let Some(v) = patch.proficiency {
            self.proficiency = Some(v);
        }
        if let Some(v) = patch.display_order {
            self.display_order = v;
        }
    }
}
