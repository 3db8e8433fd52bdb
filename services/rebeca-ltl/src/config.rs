//! Configuration for the Rebeca LTL translator

use crate::converter::DEFAULT_MAX_EXPRESSION_DEPTH;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration for the translator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Downstream LTL-to-automaton engine
    #[serde(default)]
    pub engine: EngineConfig,
    /// Batch conversion settings
    #[serde(default)]
    pub batch: BatchConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Owl engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the `owl` executable
    pub owl_path: Option<PathBuf>,
    /// LTL-to-NBA construction
    pub translation: NbaTranslation,
    /// Simplify formulas before translating
    pub simplify_formula: bool,
    /// Simplify the acceptance condition of produced automata
    pub simplify_acceptance: bool,
    /// Use the direct constructions for simple LTL fragments
    pub translation_portfolio: bool,
    /// Make produced automata complete
    pub complete: bool,
    /// Emit state-based instead of transition-based acceptance
    pub state_acceptance: bool,
    /// Timeout for one engine invocation (milliseconds)
    pub timeout_ms: u64,
}

/// Batch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Deepest expression tree a definition may have
    pub max_expression_depth: usize,
    /// Also convert the `LTL` section of the property model
    pub include_ltl_definitions: bool,
    /// Number of independent batches translated at once
    pub max_parallel_batches: usize,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Translate but do not write anything
    pub dry_run: bool,
    /// Pretty print JSON output
    pub pretty_print: bool,
}

/// LTL-to-NBA constructions offered by Owl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NbaTranslation {
    #[default]
    #[serde(rename = "EKS20")]
    Eks20,
    #[serde(rename = "SMALLEST_AUTOMATON")]
    SmallestAutomaton,
}

impl NbaTranslation {
    /// Name as Owl expects it after `--translation`
    pub fn as_str(&self) -> &'static str {
        match self {
            NbaTranslation::Eks20 => "EKS20",
            NbaTranslation::SmallestAutomaton => "SMALLEST_AUTOMATON",
        }
    }
}

impl fmt::Display for NbaTranslation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NbaTranslation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EKS20" => Ok(NbaTranslation::Eks20),
            "SMALLEST_AUTOMATON" => Ok(NbaTranslation::SmallestAutomaton),
            _ => Err(ConfigError::InvalidValue {
                key: "engine.translation".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            owl_path: None,
            translation: NbaTranslation::default(),
            simplify_formula: true,
            simplify_acceptance: true,
            translation_portfolio: true,
            complete: false,
            state_acceptance: false,
            timeout_ms: 30000, // 30 seconds
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
            include_ltl_definitions: false,
            max_parallel_batches: num_cpus::get(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            pretty_print: true,
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;

        let config: TranslatorConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat {
            message: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|e| ConfigError::InvalidFormat {
            message: e.to_string(),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(owl_path) = &self.engine.owl_path {
            if !owl_path.exists() {
                return Err(ConfigError::InvalidValue {
                    key: "engine.owl_path".to_string(),
                    value: owl_path.to_string_lossy().to_string(),
                });
            }
        }

        if self.engine.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "engine.timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }

        if self.batch.max_expression_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch.max_expression_depth".to_string(),
                value: "0".to_string(),
            });
        }

        if self.batch.max_parallel_batches == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch.max_parallel_batches".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    /// Get Owl path, trying to find it automatically if not specified
    pub fn get_owl_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.engine.owl_path {
            Ok(path.clone())
        } else {
            which::which("owl").map_err(|_| ConfigError::MissingKey {
                key: "engine.owl_path".to_string(),
            })
        }
    }
}
