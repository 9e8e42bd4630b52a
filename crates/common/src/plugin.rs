use serde::{Deserialize, Serialize};

use crate::{commands::CommandRegistry, hooks::HookRegistry};

/// Registration metadata a plugin reports to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
}

/// A plugin contributes hooks and commands to the host registries.
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    /// Register every hook and command this plugin provides.
    fn register(&self, hooks: &mut HookRegistry, commands: &mut CommandRegistry);
}
