//! Fixed identity provider for tests.

use content_core::{IdentityProvider, UserIdentity};

/// An [`IdentityProvider`] that always answers the same thing.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    /// An authenticated user.
    pub fn signed_in(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user: Some(UserIdentity::new(user_id, display_name)),
        }
    }

    /// A local guest identity.
    pub fn guest(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user: Some(UserIdentity::guest(user_id, display_name)),
        }
    }

    /// No resolvable user at all.
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}
