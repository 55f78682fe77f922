//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tunables for an [`EditingEngine`](crate::EditingEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of commands kept on the undo stack
    pub max_undo_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_undo_entries: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());

        let config: EngineConfig = serde_json::from_str(r#"{"max_undo_entries":3}"#).unwrap();
        assert_eq!(config.max_undo_entries, 3);
    }
}
