//! Group blacklist plugin.
//!
//! Keeps a set of banned group ids and an enable flag. While enabled, every
//! group message from a banned group is halted by a top-priority hook, so no
//! other plugin (and no command) ever sees it. Admin commands edit the list
//! and flag; each change is written to the host key-value store.

pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod state;

use std::sync::Arc;

use group_ban_common::{
    commands::CommandRegistry,
    event::MessageEvent,
    hooks::HookRegistry,
    kv::KvStore,
    plugin::{Plugin, PluginMetadata},
};

pub use {
    config::GroupBanConfig,
    error::{Error, Result},
    gate::BanGateHook,
    state::{BanState, SharedBanState},
};

pub const PLUGIN_NAME: &str = "astrbot_group_ban";
pub const PLUGIN_AUTHOR: &str = "Tsukumi233";
pub const PLUGIN_DESCRIPTION: &str =
    "Group chat blacklist: silences the bot in banned groups. Send /ban-help for commands.";
pub const PLUGIN_VERSION: &str = "2.0.0";

pub struct GroupBanPlugin {
    state: Arc<SharedBanState>,
}

impl GroupBanPlugin {
    /// Load persisted state from `store` and merge it with `config`.
    pub async fn new(config: GroupBanConfig, store: Arc<dyn KvStore>) -> Result<Self> {
        let state = SharedBanState::load(&config, store).await?;
        Ok(Self {
            state: Arc::new(state),
        })
    }

    pub fn state(&self) -> &Arc<SharedBanState> {
        &self.state
    }

    pub async fn is_group_banned(&self, event: &MessageEvent) -> bool {
        self.state.read().await.is_group_banned(event)
    }
}

impl Plugin for GroupBanPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: PLUGIN_NAME.into(),
            author: PLUGIN_AUTHOR.into(),
            description: PLUGIN_DESCRIPTION.into(),
            version: PLUGIN_VERSION.into(),
        }
    }

    fn register(&self, hooks: &mut HookRegistry, registry: &mut CommandRegistry) {
        hooks.register(Arc::new(BanGateHook::new(Arc::clone(&self.state))));
        for command in commands::all(&self.state) {
            registry.register(command);
        }
    }
}
