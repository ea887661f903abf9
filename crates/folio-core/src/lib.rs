// folio-core: Client-side resource synchronization engine (cache, optimistic edits, realtime merge).

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
mod ledger;
pub mod model;
pub mod mutation;
pub mod realtime;
pub mod remote;
pub mod session;
pub mod store;
pub mod subscribers;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{Authorizer, StaticAuthorizer};
pub use config::SessionConfig;
pub use engine::{EngineOptions, ResourceEngine, ResourceHandle};
pub use error::{CoreError, ErrorKind};
pub use fetch::{FetchCoordinator, FetchState};
pub use ledger::{MutationKind, PendingMutation};
pub use mutation::OptimisticMutator;
pub use realtime::{ApplyOutcome, DiscardReason, RealtimeEvent, RealtimeOperation, RealtimeReconciler};
pub use remote::{HttpRemote, RemoteSource};
pub use session::{ConnectionState, Remotes, SyncSession};
pub use store::ResourceStore;
pub use subscribers::{SubscriberRegistry, Subscription};
pub use view::{HookStatus, ResourceView, ResourceWatch};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Project, ProjectDraft, ProjectPatch, Resource, ResourceId, ResourceKind, SocialLink,
    SocialLinkDraft, SocialLinkPatch, TechItem, TechItemDraft, TechItemPatch, WorkExperience,
    WorkExperienceDraft, WorkExperiencePatch,
};
