// File: src/config.rs
//
// Interpreter configuration.
// Every field has a default, so an empty or partial TOML file is valid. The
// CLI layers its flags on top of whatever the file provides.

use crate::errors::DmoError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How far a failed lookup falls back through the call stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeFallback {
    /// Current frame, then the caller's frame only
    #[default]
    SingleHop,
    /// Current frame, then every live caller frame up to the program root
    CallerChain,
}

/// Initial state of the graphics window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig { title: "DMO Graphics Window".to_string(), width: 800, height: 600 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub scope_fallback: ScopeFallback,
    /// Calls nested deeper than this are refused
    pub max_call_depth: usize,
    /// Extra directories searched by `use`, after `.` and `./modules`
    pub module_paths: Vec<PathBuf>,
    /// Where the SVG document is written on teardown, if anywhere
    pub svg_output: Option<PathBuf>,
    /// Print each runtime error report to stderr as it happens
    pub echo_diagnostics: bool,
    pub window: WindowConfig,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            scope_fallback: ScopeFallback::SingleHop,
            max_call_depth: 512,
            module_paths: Vec::new(),
            svg_output: None,
            echo_diagnostics: false,
            window: WindowConfig::default(),
        }
    }
}

impl InterpreterConfig {
    /// Parses a configuration from TOML text
    pub fn from_toml(source: &str) -> Result<Self, DmoError> {
        toml::from_str(source)
            .map_err(|e| DmoError::parse_error(format!("Invalid configuration: {}", e)))
    }

    /// Reads and parses a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, DmoError> {
        let source = fs::read_to_string(path).map_err(|e| {
            DmoError::parse_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(InterpreterConfig::from_toml("").unwrap(), InterpreterConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config = InterpreterConfig::from_toml(
            r#"
            scope_fallback = "caller-chain"
            max_call_depth = 64
            module_paths = ["lib"]

            [window]
            title = "Game"
            "#,
        )
        .unwrap();

        assert_eq!(config.scope_fallback, ScopeFallback::CallerChain);
        assert_eq!(config.max_call_depth, 64);
        assert_eq!(config.module_paths, vec![PathBuf::from("lib")]);
        assert_eq!(config.window.title, "Game");
        assert_eq!(config.window.width, 800);
        assert!(config.svg_output.is_none());
        // Only the CLI turns echoing on
        assert!(!config.echo_diagnostics);
    }

    #[test]
    fn test_unknown_fallback_mode_is_rejected() {
        let error = InterpreterConfig::from_toml(r#"scope_fallback = "lexical""#).unwrap_err();
        assert!(error.message.contains("Invalid configuration"));
    }
}
