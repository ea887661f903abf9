// ── Authorization gate ──
//
// The auth provider is an external collaborator. The engine only needs to
// know whether the signed-in user may mutate; the bearer token itself is
// attached by the transport.

use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "may the current user edit resources?".
pub trait Authorizer: Send + Sync {
    fn is_admin(&self) -> bool;
}

/// Fixed admin flag, flipped on sign-in / sign-out.
#[derive(Debug, Default)]
pub struct StaticAuthorizer {
    admin: AtomicBool,
}

impl StaticAuthorizer {
    pub fn new(admin: bool) -> Self {
        Self {
            admin: AtomicBool::new(admin),
        }
    }

    pub fn set_admin(&self, admin: bool) {
        self.admin.store(admin, Ordering::Release);
    }
}

impl Authorizer for StaticAuthorizer {
    fn is_admin(&self) -> bool {
        self.admin.load(Ordering::Acquire)
    }
}
