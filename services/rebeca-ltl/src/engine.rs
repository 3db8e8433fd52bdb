//! Downstream LTL-to-automaton translation
//!
//! Labelled formulas leave the crate here. Building automata is the engine's
//! job; this module only hands formulas over and collects what comes back.

use crate::config::{EngineConfig, TranslatorConfig};
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::ltl::LabelledFormula;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::debug;

/// Automaton produced for one labelled formula
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automaton {
    /// Formula text handed to the engine
    pub formula: String,
    /// Proposition names, in index order
    pub propositions: Vec<String>,
    /// Automaton in HOA format
    pub hoa: String,
    /// Engine time (milliseconds)
    pub execution_time_ms: u64,
}

/// Trait for LTL-to-automaton engines
#[async_trait::async_trait]
pub trait TranslationEngine: Send + Sync {
    fn name(&self) -> &str;
    async fn translate(&self, formula: &LabelledFormula) -> EngineResult<Automaton>;
}

/// Runs `owl ltl2nba` once per formula
#[derive(Debug, Clone)]
pub struct OwlEngine {
    owl_path: PathBuf,
    config: EngineConfig,
}

impl OwlEngine {
    pub fn new(owl_path: impl Into<PathBuf>, config: EngineConfig) -> Self {
        Self {
            owl_path: owl_path.into(),
            config,
        }
    }

    /// Engine at the configured path, or the `owl` found on `PATH`
    pub fn from_config(config: &TranslatorConfig) -> EngineResult<Self> {
        let owl_path = config.get_owl_path().map_err(|e| match e {
            ConfigError::MissingKey { .. } => EngineError::EngineNotFound {
                engine: "owl".to_string(),
            },
            other => EngineError::ExecutionFailed {
                output: other.to_string(),
            },
        })?;
        Ok(Self::new(owl_path, config.engine.clone()))
    }

    pub fn owl_path(&self) -> &Path {
        &self.owl_path
    }

    /// Command-line arguments for translating `formula_text`
    pub fn arguments(&self, formula_text: &str) -> Vec<String> {
        let mut arguments = vec![
            "ltl2nba".to_string(),
            "-f".to_string(),
            formula_text.to_string(),
            "--translation".to_string(),
            self.config.translation.to_string(),
        ];

        let flags = [
            (!self.config.simplify_formula, "--skip-formula-simplifier"),
            (!self.config.simplify_acceptance, "--skip-acceptance-simplifier"),
            (!self.config.translation_portfolio, "--skip-translation-portfolio"),
            (self.config.complete, "--complete"),
            (self.config.state_acceptance, "--state-acceptance"),
        ];
        arguments.extend(
            flags
                .iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| flag.to_string()),
        );

        arguments
    }
}

#[async_trait::async_trait]
impl TranslationEngine for OwlEngine {
    fn name(&self) -> &str {
        "owl"
    }

    async fn translate(&self, formula: &LabelledFormula) -> EngineResult<Automaton> {
        let start_time = Instant::now();
        let formula_text = formula.to_string();
        debug!(formula = %formula_text, "Invoking Owl");

        let child = tokio::process::Command::new(&self.owl_path)
            .args(self.arguments(&formula_text))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_millis(self.config.timeout_ms), child)
            .await
            .map_err(|_| EngineError::Timeout {
                timeout_ms: self.config.timeout_ms,
            })?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::EngineNotFound {
                    engine: self.owl_path.to_string_lossy().to_string(),
                },
                _ => EngineError::ExecutionFailed {
                    output: e.to_string(),
                },
            })?;

        if !output.status.success() {
            return Err(EngineError::ExecutionFailed {
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let hoa = String::from_utf8_lossy(&output.stdout).to_string();
        if !hoa.contains("HOA:") {
            return Err(EngineError::EmptyOutput {
                formula: formula_text,
            });
        }

        Ok(Automaton {
            formula: formula_text,
            propositions: formula.propositions.clone(),
            hoa,
            execution_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NbaTranslation;
    use crate::ltl::Formula;

    fn safety() -> LabelledFormula {
        LabelledFormula::new(
            Formula::and(
                Formula::AtomicProposition(0),
                Formula::globally(Formula::AtomicProposition(1)),
            ),
            vec!["p0".to_string(), "p1".to_string()],
        )
    }

    #[test]
    fn test_default_arguments() {
        let engine = OwlEngine::new("owl", EngineConfig::default());
        assert_eq!(
            engine.arguments("p0 & G p1"),
            vec!["ltl2nba", "-f", "p0 & G p1", "--translation", "EKS20"]
        );
    }

    #[test]
    fn test_option_flags() {
        let config = EngineConfig {
            translation: NbaTranslation::SmallestAutomaton,
            simplify_formula: false,
            simplify_acceptance: false,
            translation_portfolio: false,
            complete: true,
            state_acceptance: true,
            ..EngineConfig::default()
        };
        let arguments = OwlEngine::new("owl", config).arguments("true");

        assert!(arguments.contains(&"SMALLEST_AUTOMATON".to_string()));
        for flag in [
            "--skip-formula-simplifier",
            "--skip-acceptance-simplifier",
            "--skip-translation-portfolio",
            "--complete",
            "--state-acceptance",
        ] {
            assert!(arguments.contains(&flag.to_string()), "missing {}", flag);
        }
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let engine = OwlEngine::new("/nonexistent/owl", EngineConfig::default());
        let result = engine.translate(&safety()).await;
        assert!(matches!(result, Err(EngineError::EngineNotFound { .. })));
    }

    #[cfg(unix)]
    fn fake_owl(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("owl");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collects_hoa_output() {
        let dir = tempfile::tempdir().unwrap();
        let owl = fake_owl(dir.path(), "echo 'HOA: v1'\necho \"name: \\\"$3\\\"\"\necho '--BODY--'\necho '--END--'");
        let engine = OwlEngine::new(owl, EngineConfig::default());

        let automaton = engine.translate(&safety()).await.unwrap();
        assert_eq!(automaton.formula, "p0 & G p1");
        assert_eq!(automaton.propositions, vec!["p0", "p1"]);
        assert!(automaton.hoa.starts_with("HOA: v1"));
        assert!(automaton.hoa.contains("p0 & G p1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let owl = fake_owl(dir.path(), "echo 'parse error' >&2\nexit 2");
        let engine = OwlEngine::new(owl, EngineConfig::default());

        match engine.translate(&safety()).await {
            Err(EngineError::ExecutionFailed { output }) => assert_eq!(output, "parse error"),
            other => panic!("Expected ExecutionFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_without_automaton() {
        let dir = tempfile::tempdir().unwrap();
        let owl = fake_owl(dir.path(), "echo 'nothing here'");
        let engine = OwlEngine::new(owl, EngineConfig::default());

        let result = engine.translate(&safety()).await;
        assert!(matches!(result, Err(EngineError::EmptyOutput { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let owl = fake_owl(dir.path(), "sleep 5");
        let config = EngineConfig {
            timeout_ms: 100,
            ..EngineConfig::default()
        };
        let engine = OwlEngine::new(owl, config);

        let result = engine.translate(&safety()).await;
        assert!(matches!(result, Err(EngineError::Timeout { timeout_ms: 100 })));
    }
}
