//! Inbound chat message as seen by plugins.

use serde::{Deserialize, Serialize};

/// A single inbound message delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Transport name (e.g. "aiocqhttp", "telegram").
    pub platform: String,
    pub sender_id: String,
    /// Group chat identifier. `None` for private messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub text: String,
    /// Set by the transport when the sender holds admin privilege.
    #[serde(default)]
    pub sender_is_admin: bool,
}

impl MessageEvent {
    pub fn group(
        platform: impl Into<String>,
        group_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            sender_id: sender_id.into(),
            group_id: Some(group_id.into()),
            text: text.into(),
            sender_is_admin: false,
        }
    }

    pub fn private(
        platform: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            sender_id: sender_id.into(),
            group_id: None,
            text: text.into(),
            sender_is_admin: false,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.sender_is_admin = is_admin;
        self
    }

    /// Group identifier with surrounding whitespace removed. A blank id counts
    /// as absent, so the message is treated as private.
    pub fn group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
