// ── Resource contract ──
//
// Every synchronized entity implements `Resource`. The engine is generic
// over it; each concrete type only says how to build an optimistic
// snapshot from a draft and how to apply a partial patch.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::resource_id::ResourceId;

/// The resource tables the dashboard manages.
///
/// `Display` / `FromStr` use the table names of the data API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Projects,
    TechStack,
    SocialLinks,
    WorkExperience,
}

impl ResourceKind {
    /// Table name on the REST and realtime surfaces.
    pub fn table(self) -> &'static str {
        self.into()
    }
}

/// An entity managed by the synchronization engine.
pub trait Resource:
    Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Payload sent to the create endpoint.
    type Draft: Debug + Clone + Serialize + Send + Sync + 'static;

    /// Partial update sent to the update endpoint. `Default` is the empty patch.
    type Patch: Debug + Clone + Default + Serialize + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> &ResourceId;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Synthesize the local snapshot shown while a create is in flight.
    fn from_draft(id: ResourceId, draft: &Self::Draft, now: DateTime<Utc>) -> Self;

    /// Apply a partial update in place. Timestamps are left alone: the server
    /// clock owns `updated_at`.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Shallow-merge a newer copy of the same row into this one.
    ///
    /// Typed rows carry every field, so the default is a field-wise overwrite.
    fn merge(&mut self, incoming: Self) {
        *self = incoming;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn kind_table_names() {
        assert_eq!(ResourceKind::Projects.table(), "projects");
        assert_eq!(ResourceKind::TechStack.table(), "tech_stack");
        assert_eq!(ResourceKind::SocialLinks.to_string(), "social_links");
        assert_eq!(
            ResourceKind::from_str("work_experience").unwrap(),
            ResourceKind::WorkExperience
        );
        assert_eq!(ResourceKind::iter().count(), 4);
    }
}
