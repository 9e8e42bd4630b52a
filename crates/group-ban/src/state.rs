//! Ban state and its persistence through the host key-value store.

use std::{collections::BTreeSet, sync::Arc};

use {
    serde_json::{Value, json},
    tokio::sync::{RwLock, RwLockReadGuard},
    tracing::{debug, info, warn},
};

use {
    group_ban_common::{event::MessageEvent, kv::KvStore},
    crate::{
        config::{GroupBanConfig, group_ids_from_value},
        error::Result,
    },
};

/// Store key holding the banned group list.
pub const BANNED_GROUPS_KEY: &str = "ban_plugin_banned_groups";
/// Store key holding the enable flag.
pub const ENABLE_KEY: &str = "ban_plugin_enable";

/// The plugin's entire state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanState {
    enabled: bool,
    banned_groups: BTreeSet<String>,
}

impl BanState {
    pub fn new(enabled: bool, banned_groups: impl IntoIterator<Item = String>) -> Self {
        Self {
            enabled,
            banned_groups: banned_groups.into_iter().collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.banned_groups.contains(group_id)
    }

    /// Whether `event` comes from a banned group. Private messages never are.
    pub fn is_group_banned(&self, event: &MessageEvent) -> bool {
        let Some(group_id) = event.group_id() else {
            return false;
        };
        if self.banned_groups.contains(group_id) {
            info!(group_id = %group_id, "group is banned");
            return true;
        }
        false
    }

    /// Returns true if the group was not already banned.
    pub fn ban(&mut self, group_id: impl Into<String>) -> bool {
        self.banned_groups.insert(group_id.into())
    }

    /// Returns true if the group was banned.
    pub fn pass(&mut self, group_id: &str) -> bool {
        self.banned_groups.remove(group_id)
    }

    /// Clears the list, returning how many groups were removed.
    pub fn pass_all(&mut self) -> usize {
        let removed = self.banned_groups.len();
        self.banned_groups.clear();
        removed
    }

    pub fn banned_groups(&self) -> impl Iterator<Item = &str> {
        self.banned_groups.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.banned_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banned_groups.is_empty()
    }

    /// Ordered list snapshot, as written to the store.
    pub fn snapshot(&self) -> Vec<String> {
        self.banned_groups.iter().cloned().collect()
    }
}

/// [`BanState`] shared between the gate hook and the admin commands, written
/// through to the store after every mutation.
pub struct SharedBanState {
    state: RwLock<BanState>,
    store: Arc<dyn KvStore>,
}

impl SharedBanState {
    /// Build the initial state: configured groups united with persisted ones.
    ///
    /// A persisted enable flag overrides `config.enable`.
    pub async fn load(config: &GroupBanConfig, store: Arc<dyn KvStore>) -> Result<Self> {
        let stored_groups = match group_ids_from_value(
            store.get(BANNED_GROUPS_KEY, json!([])).await?,
        ) {
            Ok(groups) => groups,
            Err(e) => {
                warn!(key = BANNED_GROUPS_KEY, error = %e, "ignoring malformed persisted group list");
                Vec::new()
            },
        };

        let enabled = match store.get(ENABLE_KEY, Value::Null).await? {
            Value::Bool(flag) => flag,
            Value::Null => config.enable,
            other => {
                warn!(key = ENABLE_KEY, value = %other, "ignoring malformed persisted enable flag");
                config.enable
            },
        };

        let state = BanState::new(
            enabled,
            config.banned_groups.iter().cloned().chain(stored_groups),
        );
        info!(
            enabled = state.is_enabled(),
            banned = state.len(),
            "group ban state loaded"
        );

        Ok(Self {
            state: RwLock::new(state),
            store,
        })
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, BanState> {
        self.state.read().await
    }

    /// Apply `f` to a copy of the state and install it once persisted.
    ///
    /// The write lock is held throughout. If the store rejects the write, the
    /// in-memory state is left as it was.
    pub async fn update<R>(&self, f: impl FnOnce(&mut BanState) -> R) -> Result<R> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let out = f(&mut next);
        self.persist(&next).await?;
        *state = next;
        Ok(out)
    }

    async fn persist(&self, state: &BanState) -> Result<()> {
        let groups = state.snapshot();
        debug!(banned = groups.len(), enabled = state.is_enabled(), "persisting group ban state");
        self.store.put(BANNED_GROUPS_KEY, json!(groups)).await?;
        self.store.put(ENABLE_KEY, json!(state.is_enabled())).await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use {
        async_trait::async_trait,
        group_ban_common::kv::MemoryKvStore,
        rstest::rstest,
    };

    use super::*;

    /// Memory store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryKvStore,
        reject_puts: AtomicBool,
    }

    #[async_trait]
    impl KvStore for FlakyStore {
        async fn get(&self, key: &str, default: Value) -> group_ban_common::Result<Value> {
            self.inner.get(key, default).await
        }

        async fn put(&self, key: &str, value: Value) -> group_ban_common::Result<()> {
            if self.reject_puts.load(Ordering::SeqCst) {
                return Err(group_ban_common::Error::message("disk full"));
            }
            self.inner.put(key, value).await
        }
    }

    fn config(enable: bool, groups: &[&str]) -> GroupBanConfig {
        GroupBanConfig {
            enable,
            banned_groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn private_messages_are_never_banned() {
        let state = BanState::new(true, vec!["111".to_string()]);
        let event = MessageEvent::private("test", "111", "hello");
        assert!(!state.is_group_banned(&event));
    }

    #[rstest]
    #[case("111", true)]
    #[case("222", false)]
    #[case(" 111 ", true)]
    #[case("111\n", true)]
    fn membership_decides_ban(#[case] group: &str, #[case] banned: bool) {
        let state = BanState::new(true, vec!["111".to_string()]);
        let event = MessageEvent::group("test", group, "alice", "hello");
        assert_eq!(state.is_group_banned(&event), banned);
    }

    #[test]
    fn ban_then_pass_round_trips() {
        let mut state = BanState::default();
        assert!(state.ban("42"));
        assert!(!state.ban("42"));
        assert_eq!(state.len(), 1);
        assert!(state.pass("42"));
        assert!(!state.pass("42"));
        let event = MessageEvent::group("test", "42", "alice", "hi");
        assert!(!state.is_group_banned(&event));
    }

    #[tokio::test]
    async fn load_merges_config_and_store() {
        let store = Arc::new(MemoryKvStore::new());
        store
            .put(BANNED_GROUPS_KEY, json!(["222", 333, "111"]))
            .await
            .unwrap();

        let shared = SharedBanState::load(&config(true, &["111"]), store)
            .await
            .unwrap();
        let state = shared.read().await;
        assert_eq!(state.snapshot(), vec!["111", "222", "333"]);
        assert!(state.is_enabled());
    }

    #[tokio::test]
    async fn stored_flag_overrides_config() {
        let store = Arc::new(MemoryKvStore::new());
        store.put(ENABLE_KEY, json!(false)).await.unwrap();

        let shared = SharedBanState::load(&config(true, &[]), store).await.unwrap();
        assert!(!shared.read().await.is_enabled());
    }

    #[tokio::test]
    async fn malformed_store_values_fall_back() {
        let store = Arc::new(MemoryKvStore::new());
        store.put(BANNED_GROUPS_KEY, json!("oops")).await.unwrap();
        store.put(ENABLE_KEY, json!("yes")).await.unwrap();

        let shared = SharedBanState::load(&config(false, &["7"]), store).await.unwrap();
        let state = shared.read().await;
        assert_eq!(state.snapshot(), vec!["7"]);
        assert!(!state.is_enabled());
    }

    #[tokio::test]
    async fn update_persists_both_fields() {
        let store = Arc::new(MemoryKvStore::new());
        let shared = SharedBanState::load(&config(true, &[]), store.clone())
            .await
            .unwrap();

        shared
            .update(|s| {
                s.ban("b");
                s.ban("a");
                s.set_enabled(false);
            })
            .await
            .unwrap();

        assert_eq!(
            store.get(BANNED_GROUPS_KEY, json!(null)).await.unwrap(),
            json!(["a", "b"])
        );
        assert_eq!(store.get(ENABLE_KEY, json!(null)).await.unwrap(), json!(false));
    }

    #[tokio::test]
    async fn persisted_state_reloads_identically() {
        let store = Arc::new(MemoryKvStore::new());
        let shared = SharedBanState::load(&config(true, &[]), store.clone())
            .await
            .unwrap();
        for (op, id) in [("ban", "1"), ("ban", "2"), ("pass", "1"), ("ban", "3"), ("pass", "9")] {
            shared
                .update(|s| {
                    if op == "ban" {
                        s.ban(id);
                    } else {
                        s.pass(id);
                    }
                })
                .await
                .unwrap();
        }

        let before = shared.read().await.clone();
        let reloaded = SharedBanState::load(&config(true, &[]), store).await.unwrap();
        assert_eq!(*reloaded.read().await, before);
    }

    #[tokio::test]
    async fn failed_write_leaves_state_untouched() {
        let store = Arc::new(FlakyStore::default());
        let shared = SharedBanState::load(&config(true, &["1"]), store.clone())
            .await
            .unwrap();
        shared.update(|s| s.ban("2")).await.unwrap();

        store.reject_puts.store(true, Ordering::SeqCst);
        let err = shared
            .update(|s| {
                s.pass_all();
                s.set_enabled(false);
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));

        let state = shared.read().await;
        assert_eq!(state.snapshot(), vec!["1", "2"]);
        assert!(state.is_enabled());
        drop(state);

        store.reject_puts.store(false, Ordering::SeqCst);
        shared.update(|s| s.ban("3")).await.unwrap();
        assert_eq!(shared.read().await.snapshot(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn bad_stored_entries_do_not_wipe_the_list() {
        let store = Arc::new(MemoryKvStore::new());
        store
            .put(
                BANNED_GROUPS_KEY,
                json!(["111", "222", 18446744073709551615u64, null, 1.5]),
            )
            .await
            .unwrap();

        let shared = SharedBanState::load(&config(true, &[]), store.clone())
            .await
            .unwrap();
        assert_eq!(shared.read().await.snapshot(), vec![
            "111",
            "18446744073709551615",
            "222"
        ]);

        shared.update(|s| s.ban("333")).await.unwrap();
        assert_eq!(
            store.get(BANNED_GROUPS_KEY, json!(null)).await.unwrap(),
            json!(["111", "18446744073709551615", "222", "333"])
        );
    }
}
