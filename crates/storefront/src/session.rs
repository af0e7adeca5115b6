//! Signed-in shopper identity.
//!
//! Authentication itself happens elsewhere; this module only exposes who is
//! signed in. The cart and catalog never look at it. Checkout needs it to
//! attach an order to a customer.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use parfum_core::UserId;

/// The shopper a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SessionUser {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Source of the current shopper identity.
pub trait Identity {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<SessionUser>;

    /// End the session.
    fn logout(&self);
}

/// Identity held in process memory.
#[derive(Debug, Default)]
pub struct LocalSession {
    user: RwLock<Option<SessionUser>>,
}

impl LocalSession {
    /// A session with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session already signed in as `user`.
    #[must_use]
    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            user: RwLock::new(Some(user)),
        }
    }

    /// Replace the signed-in user.
    pub fn sign_in(&self, user: SessionUser) {
        info!(user_id = %user.user_id, "Signed in");
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }
}

impl Identity for LocalSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn logout(&self) {
        let previous = self
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user) = previous {
            info!(user_id = %user.user_id, "Logged out");
        }
    }
}
