// ── Project domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceKind};
use super::resource_id::ResourceId;

/// A portfolio project card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl Resource for Project {
    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    const KIND: ResourceKind = ResourceKind::Projects;

    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: ResourceId, draft: &ProjectDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            image_url: draft.image_url.clone(),
            tech_stack: draft.tech_stack.clone(),
            live_url: draft.live_url.clone(),
            repo_url: draft.repo_url.clone(),
            featured: draft.featured,
            display_order: draft.display_order,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &ProjectPatch) {
        if let Some(v) = &patch.title {
            self.title.clone_from(v);
        }
        if let Some(v) = &patch.description {
            self.description.clone_from(v);
        }
        if let Some(v) = &patch.image_url {
            self.image_url = Some(v.clone());
        }
        if let Some(v) = &patch.tech_stack {
            self.tech_stack.clone_from(v);
        }
        if let Some(v) = &patch.live_url {
            self.live_url = Some(v.clone());
        }
        if let Some(v) = &patch.repo_url {
            self.repo_url = Some(v.clone());
        }
        if let Some(v) = patch.featured {
            self.featured = v;
        }
        if let Some(v) = patch.display_order {
            self.display_order = v;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_row_with_defaults() {
        let p: Project = serde_json::from_value(json!({
            "id": 1,
            "title": "Site",
            "techStack": ["rust"],
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(p.id, ResourceId::Int(1));
        assert_eq!(p.tech_stack, vec!["rust".to_owned()]);
        assert!(!p.featured);
        assert!(p.repo_url.is_none());
    }

    #[test]
    fn patch_touches_only_set_fields() {
        let now = Utc::now();
        let draft = ProjectDraft {
            title: "Old".into(),
            description: "desc".into(),
            ..ProjectDraft::default()
        };
        let mut p = Project::from_draft(ResourceId::Int(1), &draft, now);
        p.apply_patch(&ProjectPatch {
            title: Some("New".into()),
            featured: Some(true),
            ..ProjectPatch::default()
        });
        assert_eq!(p.title, "New");
        assert_eq!(p.description, "desc");
        assert!(p.featured);
        assert_eq!(p.updated_at, now);
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let body = serde_json::to_value(ProjectPatch::default()).unwrap();
        assert_eq!(body, json!({}));
    }
}
