// ── Social link domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceKind};
use super::resource_id::ResourceId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub id: ResourceId,
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinkDraft {
    pub platform: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl Resource for SocialLink {
    type Draft = SocialLinkDraft;
    type Patch = SocialLinkPatch;

    const KIND: ResourceKind = ResourceKind::SocialLinks;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: ResourceId, draft: &SocialLinkDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            platform: draft.platform.clone(),
            url: draft.url.clone(),
            icon: draft.icon.clone(),
            display_order: draft.display_order,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &SocialLinkPatch) {
        if let Some(v) = &patch.platform {
            self.platform.clone_from(v);
        }
        if let Some(v) = &patch.url {
            self.url.clone_from(v);
        }
        if let Some(v) = &patch.icon {
            self.icon = Some(v.clone());
        }
        if let Some(v) = patch.display_order {
            self.display_order = v;
        }
    }
}
