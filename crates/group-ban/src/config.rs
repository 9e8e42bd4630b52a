//! Plugin options supplied by the host at construction.
//!
//! ```toml
//! enable = true
//! banned_groups = ["111", 222]
//! ```

use std::path::Path;

use {
    serde::{Deserialize, Deserializer, Serialize},
    serde_json::Value,
    tracing::warn,
};

use crate::error::{Context, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupBanConfig {
    /// Whether gating starts active. A flag saved by `/ban_enable` or
    /// `/ban_disable` takes precedence.
    pub enable: bool,
    /// Groups banned from the start, merged with the persisted list.
    #[serde(deserialize_with = "deserialize_group_ids")]
    pub banned_groups: Vec<String>,
}

impl Default for GroupBanConfig {
    fn default() -> Self {
        Self {
            enable: true,
            banned_groups: Vec::new(),
        }
    }
}

impl GroupBanConfig {
    /// Build from the JSON object the host hands to plugins. `null` yields
    /// the defaults.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            other => Err(Error::config(format!("expected an object, got {other}"))),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a `.toml` or `.json` config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_value(serde_json::from_str(&content)?),
            _ => Self::from_toml_str(&content),
        }
    }
}

/// Trim a group id; blank ids are dropped.
pub fn normalize_group_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Normalise each entry of a group id list on its own.
///
/// Strings are trimmed and integers of any width become their decimal text.
/// Other entries are skipped with a warning so the rest of the list survives.
fn collect_group_ids(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => normalize_group_id(&s),
            Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
            other => {
                warn!(value = %other, "skipping malformed group id");
                None
            },
        })
        .collect()
}

fn deserialize_group_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer).map(collect_group_ids)
}

/// Parse a persisted or host-supplied list of group ids. Only a value that is
/// not a list at all is an error.
pub(crate) fn group_ids_from_value(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => Ok(collect_group_ids(items)),
        other => Err(Error::config(format!(
            "expected a list of group ids, got {other}"
        ))),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_enable_gating_with_no_groups() {
        let config = GroupBanConfig::from_value(Value::Null).unwrap();
        assert!(config.enable);
        assert!(config.banned_groups.is_empty());

        let config = GroupBanConfig::from_value(json!({})).unwrap();
        assert_eq!(config, GroupBanConfig::default());
    }

    #[test]
    fn accepts_numeric_and_padded_ids() {
        let config = GroupBanConfig::from_value(json!({
            "enable": false,
            "banned_groups": ["111", 222, "  333 ", ""]
        }))
        .unwrap();
        assert!(!config.enable);
        assert_eq!(config.banned_groups, vec!["111", "222", "333"]);
    }

    #[test]
    fn skips_bad_entries_without_losing_the_list() {
        let config = GroupBanConfig::from_value(json!({
            "banned_groups": ["111", 18446744073709551615u64, -5, null, 1.5, {"id": 7}, " 222 "]
        }))
        .unwrap();
        assert_eq!(config.banned_groups, vec![
            "111",
            "18446744073709551615",
            "-5",
            "222"
        ]);
    }

    #[test]
    fn group_list_must_be_a_list() {
        assert!(group_ids_from_value(json!("111")).is_err());
        assert_eq!(
            group_ids_from_value(json!([true, "9"])).unwrap(),
            vec!["9"]
        );
    }

    #[test]
    fn rejects_non_object_config() {
        let err = GroupBanConfig::from_value(json!(["111"])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn parses_toml() {
        let config = GroupBanConfig::from_toml_str(
            r#"
enable = true
banned_groups = ["111", 222]
"#,
        )
        .unwrap();
        assert_eq!(config.banned_groups, vec!["111", "222"]);
    }

    #[test]
    fn loads_json_and_toml_files() {
        let tmp = tempfile::tempdir().unwrap();
        let json_path = tmp.path().join("group_ban.json");
        std::fs::write(&json_path, r#"{"banned_groups": ["9"]}"#).unwrap();
        let toml_path = tmp.path().join("group_ban.toml");
        std::fs::write(&toml_path, "enable = false\n").unwrap();

        let from_json = GroupBanConfig::from_file(&json_path).unwrap();
        assert!(from_json.enable);
        assert_eq!(from_json.banned_groups, vec!["9"]);

        let from_toml = GroupBanConfig::from_file(&toml_path).unwrap();
        assert!(!from_toml.enable);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GroupBanConfig::from_file(Path::new("/nonexistent/group_ban.toml")).unwrap_err();
        assert!(err.to_string().contains("group_ban.toml"));
    }
}
