//! Configuration for indexing and draft persistence.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::index::CollisionPolicy;

/// Top-level configuration.
///
/// Every field has a default, so `{}` is a valid config file.
///
/// # Example
///
/// ```rust
/// use selcodec::{CodecConfig, CollisionPolicy};
///
/// let config = CodecConfig::from_json_str(r#"{"collision_policy": "reject"}"#).unwrap();
/// assert_eq!(config.collision_policy, CollisionPolicy::Reject);
/// assert_eq!(config.draft.key, "pgll_draft_v1");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// How to index catalog items that share a date and time slot.
    pub collision_policy: CollisionPolicy,
    /// Draft persistence.
    pub draft: DraftConfig,
}

/// Draft persistence settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftConfig {
    /// Storage key of the draft record.
    pub key: String,
    /// Age after which a draft is discarded, in milliseconds.
    pub ttl_ms: u64,
    /// Quiet period before a free-text edit is written, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            key: "pgll_draft_v1".to_string(),
            ttl_ms: 30 * 24 * 60 * 60 * 1000,
            debounce_ms: 300,
        }
    }
}

impl DraftConfig {
    /// Draft time-to-live.
    pub fn ttl(&self) -> Duration {
        millis(self.ttl_ms)
    }

    /// Debounce window for text edits.
    pub fn debounce(&self) -> Duration {
        millis(self.debounce_ms)
    }
}

fn millis(ms: u64) -> Duration {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or(Duration::MAX)
}

impl CodecConfig {
    /// Parse JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json).map_err(|e| CodecError::Config(e.to_string()))
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CodecError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.collision_policy, CollisionPolicy::Alias);
        assert_eq!(config.draft.ttl(), Duration::days(30));
        assert_eq!(config.draft.debounce(), Duration::milliseconds(300));
    }

    #[test]
    fn test_partial_override() {
        let config =
            CodecConfig::from_json_str(r#"{"draft": {"key": "k", "debounce_ms": 50}}"#).unwrap();
        assert_eq!(config.draft.key, "k");
        assert_eq!(config.draft.debounce_ms, 50);
        assert_eq!(config.draft.ttl_ms, DraftConfig::default().ttl_ms);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            CodecConfig::from_json_str(r#"{"colision_policy": "alias"}"#),
            Err(CodecError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selcodec.json");
        std::fs::write(&path, r#"{"collision_policy": "distinct"}"#).unwrap();
        let config = CodecConfig::load(&path).unwrap();
        assert_eq!(config.collision_policy, CollisionPolicy::Distinct);
        assert!(CodecConfig::load(dir.path().join("missing.json")).is_err());
    }
}
