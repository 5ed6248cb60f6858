//! # Session State
//!
//! Who is logged in, as last reported by the backend.

use farma_core::UserInfo;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Option<UserInfo>,
}

impl SessionState {
    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Seller name for receipts.
    pub fn seller_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|n| !n.trim().is_empty())
    }

    pub fn set_user(&mut self, user: Option<UserInfo>) {
        self.user = user;
    }
}
