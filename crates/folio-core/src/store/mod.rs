// ── Resource store ──
//
// Canonical in-memory collections, one per resource type.

mod collection;

pub use collection::ResourceStore;
