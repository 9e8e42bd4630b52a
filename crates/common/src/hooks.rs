//! Message hooks: priority-ordered handlers that may halt an inbound event
//! before any command or reply logic sees it.

use std::{collections::HashMap, fmt, sync::Arc};

use {
    anyhow::Result,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, info, warn},
};

use crate::event::MessageEvent;

// ── HookEvent ───────────────────────────────────────────────────────────────

/// Events that hooks can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    GroupMessage,
    PrivateMessage,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// ── HookPayload ─────────────────────────────────────────────────────────────

/// Typed payload carried with each hook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum HookPayload {
    GroupMessage { message: MessageEvent },
    PrivateMessage { message: MessageEvent },
}

impl HookPayload {
    /// Wrap a message in the payload matching its kind.
    pub fn for_message(message: MessageEvent) -> Self {
        if message.group_id().is_some() {
            Self::GroupMessage { message }
        } else {
            Self::PrivateMessage { message }
        }
    }

    /// Returns the [`HookEvent`] variant that matches this payload.
    pub fn event(&self) -> HookEvent {
        match self {
            Self::GroupMessage { .. } => HookEvent::GroupMessage,
            Self::PrivateMessage { .. } => HookEvent::PrivateMessage,
        }
    }

    pub fn message(&self) -> &MessageEvent {
        match self {
            Self::GroupMessage { message } | Self::PrivateMessage { message } => message,
        }
    }
}

// ── HookAction ──────────────────────────────────────────────────────────────

/// The outcome a hook handler returns.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum HookAction {
    /// Let the event proceed normally.
    #[default]
    Continue,
    /// Stop propagation: no later hook and no command handler sees the event.
    Block(String),
}

// ── HookHandler trait ───────────────────────────────────────────────────────

#[async_trait]
pub trait HookHandler: Send + Sync {
    /// A human-readable name for this handler.
    fn name(&self) -> &str;

    /// Which events this handler subscribes to.
    fn events(&self) -> &[HookEvent];

    /// Priority for ordering. Higher values run first. Default is 0.
    fn priority(&self) -> i32 {
        0
    }

    /// Handle the event, returning an action that may block the flow.
    async fn handle(&self, event: HookEvent, payload: &HookPayload) -> Result<HookAction>;
}

// ── HookRegistry ────────────────────────────────────────────────────────────

/// Manages registered hook handlers and dispatches events to them.
pub struct HookRegistry {
    handlers: HashMap<HookEvent, Vec<Arc<dyn HookHandler>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for all events it subscribes to.
    /// Handlers are sorted by priority (descending) within each event.
    pub fn register(&mut self, handler: Arc<dyn HookHandler>) {
        for &event in handler.events() {
            let handlers = self.handlers.entry(event).or_default();
            handlers.push(Arc::clone(&handler));
            // Stable sort keeps registration order among equal priorities.
            handlers.sort_by_key(|h| std::cmp::Reverse(h.priority()));
        }
        info!(
            handler = handler.name(),
            priority = handler.priority(),
            "hook handler registered"
        );
    }

    /// Returns true if any handlers are registered for the given event.
    pub fn has_handlers(&self, event: HookEvent) -> bool {
        self.handlers.get(&event).is_some_and(|v| !v.is_empty())
    }

    /// Handler names for one event, in dispatch order.
    pub fn handler_order(&self, event: HookEvent) -> Vec<String> {
        self.handlers
            .get(&event)
            .map(|v| v.iter().map(|h| h.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// List all registered handler names (deduplicated).
    pub fn handler_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .values()
            .flatten()
            .map(|h| h.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Dispatch an event to all registered handlers, in priority order.
    ///
    /// Returns the first [`HookAction::Block`] encountered (short-circuits),
    /// otherwise [`HookAction::Continue`]. A failing handler is logged and
    /// skipped.
    pub async fn dispatch(&self, payload: &HookPayload) -> HookAction {
        let event = payload.event();
        let handlers = match self.handlers.get(&event) {
            Some(h) if !h.is_empty() => h,
            _ => return HookAction::Continue,
        };

        debug!(event = %event, count = handlers.len(), "dispatching hook event");

        for handler in handlers {
            match handler.handle(event, payload).await {
                Ok(HookAction::Continue) => {},
                Ok(HookAction::Block(reason)) => {
                    info!(handler = handler.name(), event = %event, reason = %reason, "hook blocked event");
                    return HookAction::Block(reason);
                },
                Err(e) => {
                    warn!(handler = handler.name(), event = %event, error = %e, "hook handler failed");
                },
            }
        }

        HookAction::Continue
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
