//! Host-side contract for chat-bot plugins: hook events, slash commands,
//! permission gating, key-value persistence, and plugin metadata.
//!
//! Plugins depend on this crate only; the host wires a [`dispatch::EventDispatcher`]
//! from the registries a plugin fills in.

pub mod commands;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hooks;
pub mod kv;
pub mod plugin;

pub use error::{Error, FromMessage, Result};
