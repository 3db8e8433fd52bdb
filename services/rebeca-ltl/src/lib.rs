//! Rebeca property to LTL translator
//!
//! This crate turns the definitions of a compiled Rebeca property model into
//! labelled LTL formulas: formulas over indexed atomic propositions paired with
//! the proposition names, ready for an LTL-to-automaton engine such as Owl.

pub mod ast;
pub mod compiler;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod ltl;
pub mod operators;
pub mod registry;

pub use ast::{Definition, Expression, NodeId, PropertyModel, RebecaModel};
pub use compiler::{
    BatchOutcome, BatchSource, BatchStats, BatchTranslator, DefinitionFailure, ModelCompiler,
    PropertyCompiler, TranslatedDefinition,
};
pub use config::TranslatorConfig;
pub use converter::{assemble, canonical_string, DefinitionAssembler, ExpressionConverter};
pub use engine::{Automaton, OwlEngine, TranslationEngine};
pub use error::{TranslatorError, TranslatorResult};
pub use ltl::{Formula, LabelledFormula};
pub use registry::PropositionRegistry;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Main translator: configuration plus the compilers that feed its batches
#[derive(Clone)]
pub struct RebecaTranslator {
    config: TranslatorConfig,
    batch: BatchTranslator,
}

impl RebecaTranslator {
    /// Create a translator with default configuration reading JSON sources
    pub fn new() -> Self {
        Self::with_config(TranslatorConfig::default())
    }

    /// Create a translator with custom configuration reading JSON sources
    pub fn with_config(config: TranslatorConfig) -> Self {
        Self::with_compilers(
            config,
            Arc::new(frontend::JsonModelCompiler),
            Arc::new(frontend::JsonPropertyCompiler),
        )
    }

    /// Create a translator over custom model and property compilers
    pub fn with_compilers(
        config: TranslatorConfig,
        model_compiler: Arc<dyn ModelCompiler>,
        property_compiler: Arc<dyn PropertyCompiler>,
    ) -> Self {
        let batch = BatchTranslator::new(model_compiler, property_compiler, config.batch.clone());
        Self { config, batch }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate one batch with a registry of its own
    pub fn translate(&self, source: &BatchSource) -> BatchOutcome {
        let mut registry = PropositionRegistry::new();
        self.batch.translate(source, &mut registry)
    }

    /// Translate one batch with a caller-owned registry; the registry is reset first
    pub fn translate_with_registry(
        &self,
        source: &BatchSource,
        registry: &mut PropositionRegistry,
    ) -> BatchOutcome {
        self.batch.translate(source, registry)
    }

    /// Translate independent batches concurrently.
    ///
    /// Every batch gets its own registry. At most `batch.max_parallel_batches`
    /// run at once. Outcomes are returned in the order of `sources`.
    pub async fn translate_batches(&self, sources: Vec<BatchSource>) -> Vec<BatchOutcome> {
        let permits = Arc::new(Semaphore::new(self.config.batch.max_parallel_batches.max(1)));
        let mut tasks = JoinSet::new();

        for (position, source) in sources.into_iter().enumerate() {
            let batch = self.batch.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let property = source.property.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    let mut registry = PropositionRegistry::new();
                    batch.translate(&source, &mut registry)
                })
                .await
                .unwrap_or_else(|e| {
                    error!(property = ?property, error = %e, "Batch task failed");
                    BatchOutcome::failed(format!("batch task failed: {}", e), 0)
                });
                (position, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => outcomes.push(entry),
                Err(e) => error!(error = %e, "Batch task failed to join"),
            }
        }
        outcomes.sort_by_key(|(position, _)| *position);

        info!(batches = outcomes.len(), "Translated batches");
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Translate one batch and hand every labelled formula to `engine`.
    ///
    /// Engine failures are reported per definition; the remaining formulas are
    /// still translated.
    pub async fn translate_to_automata(
        &self,
        source: &BatchSource,
        engine: &dyn TranslationEngine,
    ) -> AutomataReport {
        let batch = self.translate(source);
        let mut report = AutomataReport {
            automata: Vec::with_capacity(batch.formulas.len()),
            engine_failures: Vec::new(),
            batch,
        };

        for definition in &report.batch.formulas {
            match engine.translate(&definition.formula).await {
                Ok(automaton) => report.automata.push(NamedAutomaton {
                    name: definition.name.clone(),
                    automaton,
                }),
                Err(e) => {
                    error!(definition = %definition.name, engine = engine.name(), error = %e, "Automaton translation failed");
                    report.engine_failures.push(DefinitionFailure {
                        name: definition.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

impl Default for RebecaTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Automaton for one definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedAutomaton {
    pub name: String,
    pub automaton: Automaton,
}

/// Result of running a batch through the downstream engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomataReport {
    pub batch: BatchOutcome,
    pub automata: Vec<NamedAutomaton>,
    pub engine_failures: Vec<DefinitionFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, CompileResult, EngineError, EngineResult};
    use std::path::Path;

    /// Property model chosen by the property source's file name
    struct NamedProperties;

    impl ModelCompiler for NamedProperties {
        fn compile_model(&self, _source: &Path) -> CompileResult<RebecaModel> {
            Ok(RebecaModel::default())
        }
    }

    impl PropertyCompiler for NamedProperties {
        fn compile_properties(
            &self,
            _model: &RebecaModel,
            source: &Path,
        ) -> CompileResult<PropertyModel> {
            let stem = source
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            if stem == "broken" {
                return Err(CompileError::InvalidPropertyModel {
                    path: stem,
                    message: "rejected".to_string(),
                });
            }
            Ok(PropertyModel::with_definitions(vec![Definition::new(
                stem.clone(),
                Expression::binary("&&", Expression::term(stem), Expression::term("shared")),
            )]))
        }
    }

    fn translator() -> RebecaTranslator {
        RebecaTranslator::with_compilers(
            TranslatorConfig::default(),
            Arc::new(NamedProperties),
            Arc::new(NamedProperties),
        )
    }

    struct EchoEngine;

    #[async_trait::async_trait]
    impl TranslationEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        async fn translate(&self, formula: &LabelledFormula) -> EngineResult<Automaton> {
            if formula.propositions.iter().any(|name| name == "unsupported") {
                return Err(EngineError::ExecutionFailed {
                    output: "unsupported".to_string(),
                });
            }
            Ok(Automaton {
                formula: formula.to_string(),
                propositions: formula.propositions.clone(),
                hoa: format!("HOA: v1\nname: \"{}\"\n--BODY--\n--END--\n", formula),
                execution_time_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_batches_keep_their_own_registries() {
        let sources = vec![
            BatchSource::new("m.json", "alpha.json"),
            BatchSource::new("m.json", "broken.json"),
            BatchSource::new("m.json", "beta.json"),
        ];
        let outcomes = translator().translate_batches(sources).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].formulas[0].formula.propositions, vec!["alpha", "shared"]);
        assert!(outcomes[1].is_failed());
        assert!(outcomes[1].formulas.is_empty());
        assert_eq!(outcomes[2].formulas[0].formula.propositions, vec!["beta", "shared"]);
    }

    #[tokio::test]
    async fn test_single_permit_still_translates_everything() {
        let mut config = TranslatorConfig::default();
        config.batch.max_parallel_batches = 1;
        let translator = RebecaTranslator::with_compilers(
            config,
            Arc::new(NamedProperties),
            Arc::new(NamedProperties),
        );

        let sources = (0..8)
            .map(|i| BatchSource::new("m.json", format!("p{}.json", i)))
            .collect();
        let outcomes = translator.translate_batches(sources).await;

        let names: Vec<_> = outcomes.iter().map(|o| o.formulas[0].name.clone()).collect();
        let expected: Vec<_> = (0..8).map(|i| format!("p{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_translate_to_automata() {
        let report = translator()
            .translate_to_automata(&BatchSource::new("m.json", "ready.json"), &EchoEngine)
            .await;

        assert_eq!(report.automata.len(), 1);
        assert_eq!(report.automata[0].name, "ready");
        assert_eq!(report.automata[0].automaton.formula, "ready & shared");
        assert!(report.engine_failures.is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_is_reported_per_definition() {
        let report = translator()
            .translate_to_automata(&BatchSource::new("m.json", "unsupported.json"), &EchoEngine)
            .await;

        assert!(report.automata.is_empty());
        assert_eq!(report.engine_failures.len(), 1);
        assert_eq!(report.engine_failures[0].name, "unsupported");
    }

    #[test]
    fn test_caller_registry_is_reset() {
        let mut registry = PropositionRegistry::new();
        registry.intern("leftover");

        let outcome = translator()
            .translate_with_registry(&BatchSource::new("m.json", "gamma.json"), &mut registry);

        assert_eq!(outcome.formulas[0].formula.propositions, vec!["gamma", "shared"]);
        assert_eq!(registry.lookup("leftover"), None);
    }
}
