//! Slash commands: parsing, registration, and the admin permission gate.

use std::{collections::BTreeMap, sync::Arc};

use {
    anyhow::Result,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::event::MessageEvent;

/// Prefix that marks a message as a command.
pub const COMMAND_PREFIX: char = '/';

/// Reply for callers lacking a command's required permission.
pub const PERMISSION_DENIED_REPLY: &str = "Permission denied: this command requires admin privilege.";

/// Who may invoke a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Member,
    Admin,
}

/// A parsed command line: `/name [arg]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    /// Single optional string argument (the rest of the line, trimmed).
    pub arg: Option<String>,
}

impl CommandInvocation {
    /// Parse `text` as a command. Returns `None` for ordinary chat text.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix(COMMAND_PREFIX)?;
        let mut parts = body.splitn(2, char::is_whitespace);
        let name = parts.next().filter(|n| !n.is_empty())?.to_string();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        Some(Self { name, arg })
    }
}

/// Plain-text reply emitted to the originating chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub text: String,
}

impl CommandReply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Literal command name, without the leading slash.
    fn name(&self) -> &str;

    fn permission(&self) -> Permission {
        Permission::Member
    }

    async fn run(&self, event: &MessageEvent, arg: Option<&str>) -> Result<CommandReply>;
}

/// Command names bound to handlers.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its name. A later registration with the same
    /// name replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        let name = handler.name().to_string();
        if self.commands.insert(name.clone(), handler).is_some() {
            info!(command = %name, "command handler replaced");
        } else {
            debug!(command = %name, "command handler registered");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(name)
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Run the named command if it exists.
    ///
    /// Returns `Ok(None)` for unknown commands. Callers without the required
    /// permission receive [`PERMISSION_DENIED_REPLY`] and the handler is not
    /// invoked.
    pub async fn dispatch(
        &self,
        event: &MessageEvent,
        invocation: &CommandInvocation,
    ) -> Result<Option<CommandReply>> {
        let Some(handler) = self.commands.get(&invocation.name) else {
            return Ok(None);
        };

        if handler.permission() == Permission::Admin && !event.sender_is_admin {
            info!(
                command = %invocation.name,
                sender = %event.sender_id,
                "command refused: admin privilege required"
            );
            return Ok(Some(CommandReply::plain(PERMISSION_DENIED_REPLY)));
        }

        debug!(command = %invocation.name, sender = %event.sender_id, "running command");
        handler
            .run(event, invocation.arg.as_deref())
            .await
            .map(Some)
    }
}
