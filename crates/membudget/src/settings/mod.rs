//! Persisted per-user budget settings and the source/sink seams the
//! allocator is driven through.
//!
//! A session reads [`UserSettings`] from a [`SettingsSource`] when it opens
//! and writes them back through a [`SettingsSink`] on save. Two stores
//! implement both traits:
//!
//! - [`FileSettingsStore`]: one `<user>.json` file per user under a directory.
//! - [`MemorySettingsStore`]: in-process map, for tests and ephemeral servers.

mod store;

pub use store::{FileSettingsStore, MemorySettingsStore};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::category::CategorySizes;
use crate::error::StoreError;

/// Longest accepted user id.
const MAX_USER_ID_LEN: usize = 64;

/// Settings for one user, in the flat wire shape:
///
/// ```json
/// {"max_tokens": 8000, "min_tokens": 100,
///  "functions": 1000, "ltm1": 1000, "ltm2": 1000, "episodic": 1000,
///  "recent": 1000, "notes": 1000, "input": 1000, "output": 1000}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserSettings {
    /// Total budget `T`.
    pub max_tokens: i64,
    /// Minimum gap `G` between adjacent handles.
    pub min_tokens: i64,
    #[serde(flatten)]
    pub allocation: CategorySizes,
    /// RFC 3339 time of the last save. Written by the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Supplies persisted settings when an edit session opens.
pub trait SettingsSource: Send + Sync {
    /// Load a user's settings. `Ok(None)` means the user has never saved.
    fn load(&self, user: &str) -> Result<Option<UserSettings>, StoreError>;
}

/// Receives committed settings when an edit session saves.
pub trait SettingsSink: Send + Sync {
    fn store(&self, user: &str, settings: &UserSettings) -> Result<(), StoreError>;
}

/// A store that is both a source and a sink.
pub trait SettingsStore: SettingsSource + SettingsSink {}

impl<T: SettingsSource + SettingsSink> SettingsStore for T {}

/// Reject user ids that are empty, too long, or contain anything outside
/// `[A-Za-z0-9_-]`.
pub fn validate_user_id(user: &str) -> Result<(), StoreError> {
    let valid = !user.is_empty()
        && user.len() <= MAX_USER_ID_LEN
        && user
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidUser(user.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_flat_shape() {
        let json = r#"{"max_tokens":8000,"min_tokens":100,"functions":1000,"ltm1":1000,
            "ltm2":1000,"episodic":1000,"recent":1000,"notes":1000,"input":1000,"output":1000}"#;
        let settings: UserSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.max_tokens, 8000);
        assert_eq!(settings.min_tokens, 100);
        assert_eq!(settings.allocation.recent, 1000);
        assert!(settings.updated_at.is_none());
    }

    #[test]
    fn settings_serialize_flat_shape() {
        let settings = UserSettings {
            max_tokens: 8000,
            min_tokens: 100,
            allocation: CategorySizes::from_array([1000; 8]),
            updated_at: None,
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["output"], 1000);
        assert!(json.get("allocation").is_none());
        assert!(json.get("updated_at").is_none());
    }

    #[test]
    fn user_ids_are_validated() {
        assert!(validate_user_id("alice").is_ok());
        assert!(validate_user_id("bob_2-x").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id("with space").is_err());
        assert!(validate_user_id(&"a".repeat(65)).is_err());
    }
}
