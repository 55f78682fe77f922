//! Application settings
//!
//! Plain serde values handed in by the host application. Missing fields
//! fall back to their defaults, so a partial settings document is valid.

use edit_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Main application settings container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Undo history settings
    pub history: HistorySettings,
    /// Background import settings
    pub import: ImportSettings,
    /// Background export settings
    pub export: ExportSettings,
    /// Log output settings
    pub logging: LoggingSettings,
}

impl AppSettings {
    /// Engine configuration derived from these settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_undo_entries: self.history.max_undo_entries,
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of undoable commands kept per document
    pub max_undo_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_undo_entries: EngineConfig::default().max_undo_entries,
        }
    }
}

/// Background import settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImportSettings {
    /// Stop a batch at the first file that fails to parse
    pub stop_on_error: bool,
    /// Parsed files buffered between the worker and the editor
    pub queue_size: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            stop_on_error: true,
            queue_size: 8,
        }
    }
}

/// Background export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    /// Ask before replacing an existing file
    pub confirm_overwrite: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            confirm_overwrite: true,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directives used when `RUST_LOG` is not set
    pub filter: String,
    /// Colour the output
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();

        assert_eq!(settings.history.max_undo_entries, 100);
        assert!(settings.import.stop_on_error);
        assert_eq!(settings.import.queue_size, 8);
        assert!(settings.export.confirm_overwrite);
        assert_eq!(settings.logging.filter, "info");
        assert_eq!(settings.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{"history":{"max_undo_entries":7}}"#).unwrap();
        assert_eq!(parsed.history.max_undo_entries, 7);
        assert_eq!(parsed.import, ImportSettings::default());
        assert_eq!(parsed.engine_config().max_undo_entries, 7);
    }
}
