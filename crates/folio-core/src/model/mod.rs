// ── Domain model ──
//
// Identity, the `Resource` contract, and the four portfolio tables.

mod experience;
mod project;
mod resource;
mod resource_id;
mod social;
mod tech;

pub use experience::{WorkExperience, WorkExperienceDraft, WorkExperiencePatch};
pub use project::{Project, ProjectDraft, ProjectPatch};
pub use resource::{Resource, ResourceKind};
pub use resource_id::ResourceId;
pub use social::{SocialLink, SocialLinkDraft, SocialLinkPatch};
pub use tech::{TechItem, TechItemDraft, TechItemPatch};
