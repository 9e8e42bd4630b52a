//! Inbound event pipeline: message hooks first, then command dispatch.

use {anyhow::Result, tracing::info};

use crate::{
    commands::{CommandInvocation, CommandRegistry, CommandReply},
    event::MessageEvent,
    hooks::{HookAction, HookPayload, HookRegistry},
    plugin::{Plugin, PluginMetadata},
};

/// What happened to an inbound message.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A hook halted propagation; nothing else observed the message.
    Blocked { reason: String },
    /// A command ran and produced a reply.
    Replied(CommandReply),
    /// Not a known command; left to the rest of the host.
    Ignored,
}

#[derive(Default)]
pub struct EventDispatcher {
    hooks: HookRegistry,
    commands: CommandRegistry,
    plugins: Vec<PluginMetadata>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `plugin` fill in the registries.
    pub fn install(&mut self, plugin: &dyn Plugin) {
        let metadata = plugin.metadata();
        plugin.register(&mut self.hooks, &mut self.commands);
        info!(
            plugin = %metadata.name,
            version = %metadata.version,
            commands = self.commands.names().len(),
            "plugin installed"
        );
        self.plugins.push(metadata);
    }

    pub fn plugins(&self) -> &[PluginMetadata] {
        &self.plugins
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Run the hook chain for `event`, and only if no hook blocked it, try it
    /// as a command.
    ///
    /// Command handler failures propagate to the caller.
    pub async fn handle(&self, event: MessageEvent) -> Result<DispatchOutcome> {
        let payload = HookPayload::for_message(event);
        if let HookAction::Block(reason) = self.hooks.dispatch(&payload).await {
            return Ok(DispatchOutcome::Blocked { reason });
        }

        let event = payload.message();
        let Some(invocation) = CommandInvocation::parse(&event.text) else {
            return Ok(DispatchOutcome::Ignored);
        };

        Ok(match self.commands.dispatch(event, &invocation).await? {
            Some(reply) => DispatchOutcome::Replied(reply),
            None => DispatchOutcome::Ignored,
        })
    }
}
