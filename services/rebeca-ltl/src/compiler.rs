//! Batch orchestration
//!
//! One batch is one model source plus one property source. The external
//! compilers turn them into a property model, whose definitions are then
//! assembled one after another against a single registry.

use crate::ast::{Definition, PropertyModel, RebecaModel};
use crate::config::BatchConfig;
use crate::converter::DefinitionAssembler;
use crate::error::CompileResult;
use crate::ltl::LabelledFormula;
use crate::registry::PropositionRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Produces the compiled model from a model source
pub trait ModelCompiler: Send + Sync {
    fn compile_model(&self, source: &Path) -> CompileResult<RebecaModel>;
}

/// Produces the property model from a property source, checked against the model
pub trait PropertyCompiler: Send + Sync {
    fn compile_properties(&self, model: &RebecaModel, source: &Path) -> CompileResult<PropertyModel>;
}

/// Inputs of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSource {
    pub model: PathBuf,
    pub property: PathBuf,
}

impl BatchSource {
    pub fn new(model: impl Into<PathBuf>, property: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            property: property.into(),
        }
    }
}

/// Successfully converted definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedDefinition {
    pub name: String,
    pub formula: LabelledFormula,
}

/// Definition that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionFailure {
    pub name: String,
    pub message: String,
}

/// Batch statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Definitions submitted for conversion
    pub definition_count: usize,
    /// Definitions converted
    pub converted_count: usize,
    /// Definitions skipped after a failure
    pub failed_count: usize,
    /// Distinct atomic propositions in the batch
    pub proposition_count: usize,
    /// Total batch time (milliseconds)
    pub total_time_ms: u64,
}

/// Everything one batch produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Labelled formulas, in definition order
    pub formulas: Vec<TranslatedDefinition>,
    pub failures: Vec<DefinitionFailure>,
    pub stats: BatchStats,
    /// Set when no property model could be obtained
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    /// Empty outcome of a batch that failed as a whole
    pub fn failed(message: impl Into<String>, total_time_ms: u64) -> Self {
        Self {
            error: Some(message.into()),
            stats: BatchStats {
                total_time_ms,
                ..BatchStats::default()
            },
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs batches through the external compilers and the converter
#[derive(Clone)]
pub struct BatchTranslator {
    model_compiler: Arc<dyn ModelCompiler>,
    property_compiler: Arc<dyn PropertyCompiler>,
    config: BatchConfig,
}

impl BatchTranslator {
    pub fn new(
        model_compiler: Arc<dyn ModelCompiler>,
        property_compiler: Arc<dyn PropertyCompiler>,
        config: BatchConfig,
    ) -> Self {
        Self {
            model_compiler,
            property_compiler,
            config,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Compile `source` and convert its definitions.
    ///
    /// A compiler failure yields an empty outcome carrying the error message.
    pub fn translate(&self, source: &BatchSource, registry: &mut PropositionRegistry) -> BatchOutcome {
        let start_time = Instant::now();
        info!(model = ?source.model, property = ?source.property, "Translating batch");

        match self.compile(source) {
            Ok(property_model) => {
                let mut outcome = self.translate_model(&property_model, registry);
                outcome.stats.total_time_ms = start_time.elapsed().as_millis() as u64;
                outcome
            }
            Err(e) => {
                error!(property = ?source.property, error = %e, "Batch failed");
                BatchOutcome::failed(e.to_string(), start_time.elapsed().as_millis() as u64)
            }
        }
    }

    fn compile(&self, source: &BatchSource) -> CompileResult<PropertyModel> {
        let model = self.model_compiler.compile_model(&source.model)?;
        self.property_compiler.compile_properties(&model, &source.property)
    }

    /// Convert every selected definition of `property_model`, in order.
    ///
    /// The registry is reset once up front; failing definitions are logged and
    /// left out without affecting the others.
    pub fn translate_model(
        &self,
        property_model: &PropertyModel,
        registry: &mut PropositionRegistry,
    ) -> BatchOutcome {
        let start_time = Instant::now();
        let assembler = DefinitionAssembler::new(self.config.max_expression_depth);
        registry.reset();

        let mut outcome = BatchOutcome::default();
        for definition in self.selected_definitions(property_model) {
            outcome.stats.definition_count += 1;
            match assembler.assemble(definition, registry) {
                Ok(formula) => {
                    outcome.formulas.push(TranslatedDefinition {
                        name: definition.name.clone(),
                        formula,
                    });
                }
                Err(e) => {
                    error!(definition = %e.definition(), error = %e, "Skipping definition");
                    outcome.failures.push(DefinitionFailure {
                        name: definition.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome.stats.converted_count = outcome.formulas.len();
        outcome.stats.failed_count = outcome.failures.len();
        outcome.stats.proposition_count = registry.len();
        outcome.stats.total_time_ms = start_time.elapsed().as_millis() as u64;

        debug!(
            converted = outcome.stats.converted_count,
            failed = outcome.stats.failed_count,
            propositions = outcome.stats.proposition_count,
            "Batch converted"
        );
        outcome
    }

    fn selected_definitions<'m>(
        &self,
        property_model: &'m PropertyModel,
    ) -> impl Iterator<Item = &'m Definition> {
        let ltl_definitions: &'m [Definition] = if self.config.include_ltl_definitions {
            &property_model.ltl_definitions
        } else {
            &[]
        };
        property_model.definitions.iter().chain(ltl_definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use crate::error::CompileError;
    use crate::ltl::Formula;

    struct StaticModel;

    impl ModelCompiler for StaticModel {
        fn compile_model(&self, _source: &Path) -> CompileResult<RebecaModel> {
            Ok(RebecaModel::default())
        }
    }

    struct StaticProperties(PropertyModel);

    impl PropertyCompiler for StaticProperties {
        fn compile_properties(
            &self,
            _model: &RebecaModel,
            _source: &Path,
        ) -> CompileResult<PropertyModel> {
            Ok(self.0.clone())
        }
    }

    struct RejectingModel;

    impl ModelCompiler for RejectingModel {
        fn compile_model(&self, source: &Path) -> CompileResult<RebecaModel> {
            Err(CompileError::InvalidModel {
                path: source.to_string_lossy().to_string(),
                message: "unexpected token".to_string(),
            })
        }
    }

    fn translator(property_model: PropertyModel, config: BatchConfig) -> BatchTranslator {
        BatchTranslator::new(
            Arc::new(StaticModel),
            Arc::new(StaticProperties(property_model)),
            config,
        )
    }

    fn deep_negation(depth: usize) -> Expression {
        let mut expression = Expression::term("deep");
        for _ in 1..depth {
            expression = Expression::unary("!", expression);
        }
        expression
    }

    #[test]
    fn test_batch_in_definition_order() {
        let property_model = PropertyModel::with_definitions(vec![
            Definition::new("First", Expression::term("x")),
            Definition::new("Second", Expression::binary("&&", Expression::term("y"), Expression::term("x"))),
        ]);
        let mut registry = PropositionRegistry::new();
        registry.intern("stale");

        let outcome = translator(property_model, BatchConfig::default())
            .translate(&BatchSource::new("model.json", "property.json"), &mut registry);

        assert!(!outcome.is_failed());
        let names: Vec<_> = outcome.formulas.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(outcome.formulas[0].formula.formula, Formula::AtomicProposition(0));
        assert_eq!(outcome.formulas[1].formula.propositions, vec!["x", "y"]);
        assert_eq!(outcome.stats.proposition_count, 2);
    }

    #[test]
    fn test_failing_definition_is_skipped() {
        let property_model = PropertyModel::with_definitions(vec![
            Definition::new("Before", Expression::term("a")),
            Definition::new("TooDeep", deep_negation(20)),
            Definition::new("After", Expression::term("b")),
        ]);
        let config = BatchConfig {
            max_expression_depth: 10,
            ..BatchConfig::default()
        };
        let mut registry = PropositionRegistry::new();

        let outcome = translator(property_model, config)
            .translate(&BatchSource::new("model.json", "property.json"), &mut registry);

        let names: Vec<_> = outcome.formulas.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Before", "After"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "TooDeep");
        assert_eq!(outcome.stats.definition_count, 3);
        assert_eq!(outcome.stats.failed_count, 1);
        // The skipped definition interned nothing, so "b" follows "a" directly.
        assert_eq!(outcome.formulas[1].formula.propositions, vec!["a", "b"]);
    }

    #[test]
    fn test_compile_failure_yields_empty_outcome() {
        let translator = BatchTranslator::new(
            Arc::new(RejectingModel),
            Arc::new(StaticProperties(PropertyModel::default())),
            BatchConfig::default(),
        );
        let mut registry = PropositionRegistry::new();
        let outcome = translator.translate(&BatchSource::new("bad.json", "property.json"), &mut registry);

        assert!(outcome.is_failed());
        assert!(outcome.formulas.is_empty());
        assert!(outcome.error.unwrap().contains("unexpected token"));
    }

    #[test]
    fn test_ltl_section_is_opt_in() {
        let property_model = PropertyModel {
            definitions: vec![Definition::new("Safety", Expression::term("p"))],
            ltl_definitions: vec![Definition::new(
                "Liveness",
                Expression::temporal("F", Expression::term("q")),
            )],
            assertion_definitions: vec![Definition::new("Check", Expression::term("r"))],
        };
        let mut registry = PropositionRegistry::new();

        let outcome = translator(property_model.clone(), BatchConfig::default())
            .translate_model(&property_model, &mut registry);
        assert_eq!(outcome.formulas.len(), 1);

        let config = BatchConfig {
            include_ltl_definitions: true,
            ..BatchConfig::default()
        };
        let outcome = translator(property_model.clone(), config)
            .translate_model(&property_model, &mut registry);
        let names: Vec<_> = outcome.formulas.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Safety", "Liveness"]);
        assert_eq!(outcome.formulas[1].formula.propositions, vec!["p", "q"]);
    }

    #[test]
    fn test_outcome_json() {
        let outcome = BatchOutcome::failed("no model", 3);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "no model");
        assert_eq!(json["stats"]["total_time_ms"], 3);

        let json = serde_json::to_value(BatchOutcome::default()).unwrap();
        assert!(json.get("error").is_none());
    }
}
