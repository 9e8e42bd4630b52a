//! `group-ban-gate` hook: halts group messages from banned groups before any
//! other handler sees them.

use std::sync::Arc;

use {anyhow::Result, async_trait::async_trait, tracing::info};

use {
    group_ban_common::hooks::{HookAction, HookEvent, HookHandler, HookPayload},
    crate::state::SharedBanState,
};

/// Runs ahead of every other group-message hook.
pub const GATE_PRIORITY: i32 = 999;

pub struct BanGateHook {
    state: Arc<SharedBanState>,
}

impl BanGateHook {
    pub fn new(state: Arc<SharedBanState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl HookHandler for BanGateHook {
    fn name(&self) -> &str {
        "group-ban-gate"
    }

    fn events(&self) -> &[HookEvent] {
        &[HookEvent::GroupMessage]
    }

    fn priority(&self) -> i32 {
        GATE_PRIORITY
    }

    async fn handle(&self, _event: HookEvent, payload: &HookPayload) -> Result<HookAction> {
        let state = self.state.read().await;
        if !state.is_enabled() {
            return Ok(HookAction::Continue);
        }

        let message = payload.message();
        if state.is_group_banned(message) {
            let group_id = message.group_id().unwrap_or_default();
            info!(group_id = %group_id, "group is banned, stopping event propagation");
            return Ok(HookAction::Block(format!("group {group_id} is banned")));
        }

        Ok(HookAction::Continue)
    }
}
