//! JSON front-end
//!
//! Reads a model and a property model that were already compiled and serialised
//! as JSON. Rebeca source text is not parsed here.

use crate::ast::{Definition, Expression, PropertyModel, RebecaModel};
use crate::compiler::{ModelCompiler, PropertyCompiler};
use crate::error::{CompileError, CompileResult};
use std::path::Path;
use tracing::debug;

fn read_source(path: &Path) -> CompileResult<String> {
    std::fs::read_to_string(path).map_err(|e| CompileError::FileAccess {
        path: path.to_string_lossy().to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelCompiler;

impl ModelCompiler for JsonModelCompiler {
    fn compile_model(&self, source: &Path) -> CompileResult<RebecaModel> {
        let content = read_source(source)?;
        let model: RebecaModel =
            serde_json::from_str(&content).map_err(|e| CompileError::InvalidModel {
                path: source.to_string_lossy().to_string(),
                message: e.to_string(),
            })?;

        debug!(
            classes = model.reactive_classes.len(),
            instances = model.instances.len(),
            "Loaded model"
        );
        Ok(model)
    }
}

/// Loads a property model and checks its rebec references against the model
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPropertyCompiler;

impl PropertyCompiler for JsonPropertyCompiler {
    fn compile_properties(&self, model: &RebecaModel, source: &Path) -> CompileResult<PropertyModel> {
        let content = read_source(source)?;
        let property_model: PropertyModel =
            serde_json::from_str(&content).map_err(|e| CompileError::InvalidPropertyModel {
                path: source.to_string_lossy().to_string(),
                message: e.to_string(),
            })?;

        let sections = [
            &property_model.definitions,
            &property_model.ltl_definitions,
            &property_model.assertion_definitions,
        ];
        for definition in sections.into_iter().flatten() {
            check_instances(model, definition)?;
        }

        debug!(
            definitions = property_model.definitions.len(),
            ltl_definitions = property_model.ltl_definitions.len(),
            "Loaded property model"
        );
        Ok(property_model)
    }
}

/// Every `rebec.member` access must name a rebec declared in the model
fn check_instances(model: &RebecaModel, definition: &Definition) -> CompileResult<()> {
    let mut stack: Vec<&Expression> = definition.expression.iter().collect();
    while let Some(expression) = stack.pop() {
        if let Expression::MemberAccess { left: Some(left), .. } = expression {
            if let Expression::Term {
                name: Some(instance),
                arguments: None,
                ..
            } = &**left
            {
                if !model.has_instance(instance) {
                    return Err(CompileError::UnknownInstance {
                        definition: definition.name.clone(),
                        instance: instance.clone(),
                    });
                }
            }
        }
        stack.extend(expression.children());
    }
    Ok(())
}
