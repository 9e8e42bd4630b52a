//! Admin commands that edit the ban list and the enable flag.
//!
//! Command names are fixed: operators and external docs depend on them.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, tracing::info};

use {
    group_ban_common::{
        commands::{CommandHandler, CommandReply, Permission},
        event::MessageEvent,
    },
    crate::{config::normalize_group_id, state::SharedBanState},
};

pub const BAN: &str = "ban";
pub const PASS: &str = "pass";
pub const PASS_ALL: &str = "pass-all";
pub const BAN_ENABLE: &str = "ban_enable";
pub const BAN_DISABLE: &str = "ban_disable";
pub const BANLIST: &str = "banlist";
pub const BAN_HELP: &str = "ban-help";

pub const BAN_USAGE: &str =
    "Specify a group id after /ban, or send /ban inside a group chat to ban that group.";
pub const PASS_USAGE: &str =
    "Specify a group id after /pass, or send /pass inside a group chat to allow that group.";
pub const EMPTY_BANLIST: &str = "Banned groups: none";

pub const HELP_TEXT: &str = "\
[Group ban plugin commands]
1. /ban <group id>: ban the given group from using the bot
2. /ban: ban the current group
3. /pass <group id>: allow the given group to use the bot again
4. /pass: allow the current group
5. /pass-all: allow every group
6. /ban_enable: turn group ban filtering on
7. /ban_disable: turn group ban filtering off
8. /banlist: list banned groups
9. /ban-help: show this help

Note: private messages are never affected by the group ban list.
Note: while filtering is on, commands sent inside a banned group are ignored; \
use a private chat or another group to unban it.";

/// The argument if given, else the group the command was sent from.
fn resolve_target(event: &MessageEvent, arg: Option<&str>) -> Option<String> {
    arg.and_then(normalize_group_id)
        .or_else(|| event.group_id().and_then(normalize_group_id))
}

/// Every command this plugin provides, sharing one state.
pub fn all(state: &Arc<SharedBanState>) -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(BanCommand::new(Arc::clone(state))),
        Arc::new(PassCommand::new(Arc::clone(state))),
        Arc::new(PassAllCommand::new(Arc::clone(state))),
        Arc::new(SetEnabledCommand::enable(Arc::clone(state))),
        Arc::new(SetEnabledCommand::disable(Arc::clone(state))),
        Arc::new(BanListCommand::new(Arc::clone(state))),
        Arc::new(BanHelpCommand),
    ]
}

// ── /ban ────────────────────────────────────────────────────────────────────

pub struct BanCommand {
    state: Arc<SharedBanState>,
}

impl BanCommand {
    pub fn new(state: Arc<SharedBanState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for BanCommand {
    fn name(&self) -> &str {
        BAN
    }

    fn permission(&self) -> Permission {
        Permission::Admin
    }

    async fn run(&self, event: &MessageEvent, arg: Option<&str>) -> Result<CommandReply> {
        let Some(group_id) = resolve_target(event, arg) else {
            return Ok(CommandReply::plain(BAN_USAGE));
        };
        self.state.update(|s| s.ban(group_id.clone())).await?;
        info!(group_id = %group_id, by = %event.sender_id, "group banned");
        Ok(CommandReply::plain(format!(
            "Group {group_id} is now banned from using the bot."
        )))
    }
}

// ── /pass ───────────────────────────────────────────────────────────────────

pub struct PassCommand {
    state: Arc<SharedBanState>,
}

impl PassCommand {
    pub fn new(state: Arc<SharedBanState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for PassCommand {
    fn name(&self) -> &str {
        PASS
    }

    fn permission(&self) -> Permission {
        Permission::Admin
    }

    async fn run(&self, event: &MessageEvent, arg: Option<&str>) -> Result<CommandReply> {
        let Some(group_id) = resolve_target(event, arg) else {
            return Ok(CommandReply::plain(PASS_USAGE));
        };
        let was_banned = self.state.update(|s| s.pass(&group_id)).await?;
        info!(group_id = %group_id, was_banned, by = %event.sender_id, "group allowed");
        Ok(CommandReply::plain(format!(
            "Group {group_id} may use the bot again."
        )))
    }
}

// ── /pass-all ───────────────────────────────────────────────────────────────

pub struct PassAllCommand {
    state: Arc<SharedBanState>,
}

impl PassAllCommand {
    pub fn new(state: Arc<SharedBanState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for PassAllCommand {
    fn name(&self) -> &str {
        PASS_ALL
    }

    fn permission(&self) -> Permission {
        Permission::Admin
    }

    async fn run(&self, event: &MessageEvent, _arg: Option<&str>) -> Result<CommandReply> {
        let removed = self.state.update(|s| s.pass_all()).await?;
        info!(removed, by = %event.sender_id, "ban list cleared");
        Ok(CommandReply::plain("All groups may use the bot again."))
    }
}

// ── /ban_enable, /ban_disable ───────────────────────────────────────────────

/// Flips the enable flag. The flag is persisted and survives restarts.
pub struct SetEnabledCommand {
    state: Arc<SharedBanState>,
    enabled: bool,
}

impl SetEnabledCommand {
    pub fn enable(state: Arc<SharedBanState>) -> Self {
        Self {
            state,
            enabled: true,
        }
    }

    pub fn disable(state: Arc<SharedBanState>) -> Self {
        Self {
            state,
            enabled: false,
        }
    }
}

#[async_trait]
impl CommandHandler for SetEnabledCommand {
    fn name(&self) -> &str {
        if self.enabled {
            BAN_ENABLE
        } else {
            BAN_DISABLE
        }
    }

    fn permission(&self) -> Permission {
        Permission::Admin
    }

    async fn run(&self, event: &MessageEvent, _arg: Option<&str>) -> Result<CommandReply> {
        let enabled = self.enabled;
        self.state.update(|s| s.set_enabled(enabled)).await?;
        info!(enabled, by = %event.sender_id, "group ban filtering toggled");
        let verb = if enabled { "enabled" } else { "disabled" };
        Ok(CommandReply::plain(format!(
            "Group ban filtering {verb}. The setting is saved and survives restarts."
        )))
    }
}

// ── /banlist ────────────────────────────────────────────────────────────────

pub struct BanListCommand {
    state: Arc<SharedBanState>,
}

impl BanListCommand {
    pub fn new(state: Arc<SharedBanState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for BanListCommand {
    fn name(&self) -> &str {
        BANLIST
    }

    fn permission(&self) -> Permission {
        Permission::Admin
    }

    async fn run(&self, _event: &MessageEvent, _arg: Option<&str>) -> Result<CommandReply> {
        let state = self.state.read().await;
        if state.is_empty() {
            return Ok(CommandReply::plain(EMPTY_BANLIST));
        }
        let listing = state.banned_groups().collect::<Vec<_>>().join(", ");
        Ok(CommandReply::plain(format!("Banned groups: {listing}")))
    }
}

// ── /ban-help ───────────────────────────────────────────────────────────────

pub struct BanHelpCommand;

#[async_trait]
impl CommandHandler for BanHelpCommand {
    fn name(&self) -> &str {
        BAN_HELP
    }

    fn permission(&self) -> Permission {
        Permission::Admin
    }

    async fn run(&self, _event: &MessageEvent, _arg: Option<&str>) -> Result<CommandReply> {
        Ok(CommandReply::plain(HELP_TEXT))
    }
}
