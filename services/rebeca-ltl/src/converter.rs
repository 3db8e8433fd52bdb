//! Expression-to-formula conversion
//!
//! Boolean and temporal structure of a property expression becomes LTL structure.
//! Everything else (comparisons, arithmetic, member accesses, casts, unknown
//! operators) is opaque and becomes an atomic proposition keyed by its canonical
//! rendering, so identical opaque sub-expressions share one proposition across
//! the whole batch. Operands are converted before the node that holds them, so
//! the parts of an opaque node are interned ahead of the node itself.

use crate::ast::{Definition, Expression};
use crate::error::{DefinitionError, DefinitionResult};
use crate::ltl::{Formula, LabelledFormula};
use crate::operators::{BinaryOperator, TemporalCall, UnaryOperator};
use crate::registry::PropositionRegistry;
use tracing::{debug, warn};

/// Default bound on expression nesting accepted by [`DefinitionAssembler`]
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 2048;

/// Placeholder for an absent child in canonical renderings
const ABSENT: &str = "null";

/// Converts expressions to formulas, interning atomic propositions in the
/// batch registry it borrows.
pub struct ExpressionConverter<'r> {
    registry: &'r mut PropositionRegistry,
}

impl<'r> ExpressionConverter<'r> {
    pub fn new(registry: &'r mut PropositionRegistry) -> Self {
        Self { registry }
    }

    /// Convert a possibly absent expression; an absent one is `false`
    pub fn convert(&mut self, expression: Option<&Expression>) -> Formula {
        match expression {
            Some(expression) => self.convert_expression(expression),
            None => Formula::FALSE,
        }
    }

    pub fn convert_expression(&mut self, expression: &Expression) -> Formula {
        match expression {
            Expression::Binary {
                operator,
                left,
                right,
            } => self.convert_binary(expression, operator, left.as_deref(), right.as_deref()),
            Expression::Unary { operator, operand } => {
                self.convert_unary(expression, operator, operand.as_deref())
            }
            Expression::MemberAccess { .. } => self.opaque(expression),
            Expression::Term {
                id,
                name,
                arguments,
            } => match name.as_deref().filter(|name| !name.is_empty()) {
                Some(name) => self.convert_term(name, arguments.as_deref()),
                None => self.proposition(&format!("$term#{}", id)),
            },
            Expression::Literal { id, value } => match value.as_deref() {
                Some(value) if value.eq_ignore_ascii_case("true") => Formula::TRUE,
                Some(value) if value.eq_ignore_ascii_case("false") => Formula::FALSE,
                Some(value) => self.proposition(value),
                None => self.proposition(&format!("$literal#{}", id)),
            },
            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition = self.convert(condition.as_deref());
                let then_formula = self.convert(then_expr.as_deref());
                let else_formula = self.convert(else_expr.as_deref());
                Formula::or(
                    Formula::and(condition.clone(), then_formula),
                    Formula::and(Formula::not(condition), else_formula),
                )
            }
            Expression::ArithmeticGroup { .. }
            | Expression::Cast { .. }
            | Expression::TypeTest { .. }
            | Expression::NonDeterministicChoice { .. } => self.opaque(expression),
        }
    }

    /// Both operands are converted, left then right, before the operator is
    /// looked at; rows that do not use an operand discard its formula.
    fn convert_binary(
        &mut self,
        whole: &Expression,
        operator: &str,
        left: Option<&Expression>,
        right: Option<&Expression>,
    ) -> Formula {
        let left = self.convert(left);
        let right = self.convert(right);

        let Some(operator_kind) = BinaryOperator::from_symbol(operator) else {
            warn!(operator, "Unknown binary operator, treating expression as atomic");
            return self.opaque(whole);
        };

        match operator_kind {
            BinaryOperator::And => Formula::and(left, right),
            BinaryOperator::Or => Formula::or(left, right),
            BinaryOperator::Implies => Formula::or(Formula::not(left), right),
            BinaryOperator::Iff => Formula::and(
                Formula::or(Formula::not(left.clone()), right.clone()),
                Formula::or(left, Formula::not(right)),
            ),
            // Single-operand temporal operators arrive as binary nodes; only
            // `left` is meaningful and `right` is discarded.
            BinaryOperator::Globally => Formula::globally(left),
            BinaryOperator::Finally => Formula::finally(left),
            BinaryOperator::Next => Formula::next(left),
            BinaryOperator::Until => Formula::until(left, right),
            BinaryOperator::WeakUntil => Formula::weak_until(left, right),
            BinaryOperator::StrongRelease => Formula::strong_release(left, right),
            BinaryOperator::Release => Formula::release(left, right),
            BinaryOperator::Comparison(_) | BinaryOperator::Arithmetic(_) => self.opaque(whole),
        }
    }

    fn convert_unary(
        &mut self,
        whole: &Expression,
        operator: &str,
        operand: Option<&Expression>,
    ) -> Formula {
        let operand = self.convert(operand);
        match UnaryOperator::from_symbol(operator) {
            Some(UnaryOperator::Not) => Formula::not(operand),
            Some(UnaryOperator::Globally) => Formula::globally(operand),
            Some(UnaryOperator::Finally) => Formula::finally(operand),
            Some(UnaryOperator::Next) => Formula::next(operand),
            Some(UnaryOperator::Sign) => self.opaque(whole),
            None => {
                warn!(operator, "Unknown unary operator, treating expression as atomic");
                self.opaque(whole)
            }
        }
    }

    /// `G(p)`, `F(p)` and `X(p)` written as calls apply the operator to the first
    /// argument. The first argument of any call is converted before the name is
    /// checked.
    fn convert_term(&mut self, name: &str, arguments: Option<&[Expression]>) -> Formula {
        let Some(argument) = arguments.and_then(<[Expression]>::first) else {
            return self.proposition(name);
        };
        let operand = self.convert_expression(argument);
        match TemporalCall::from_name(name) {
            Some(TemporalCall::Globally) => Formula::globally(operand),
            Some(TemporalCall::Finally) => Formula::finally(operand),
            Some(TemporalCall::Next) => Formula::next(operand),
            None => self.proposition(name),
        }
    }

    fn opaque(&mut self, expression: &Expression) -> Formula {
        self.proposition(&canonical_string(expression))
    }

    fn proposition(&mut self, name: &str) -> Formula {
        Formula::AtomicProposition(self.registry.intern(name))
    }
}

/// Deterministic structural rendering used as the interning key for opaque
/// expressions.
///
/// Ternary, arithmetic group, cast, type test and non-deterministic choice
/// nodes render as their kind name followed by their parts (`cast<int>(x)`,
/// `ternary(c, 1, 0)`) rather than by kind name alone, so two casts of
/// different operands stay different propositions.
pub fn canonical_string(expression: &Expression) -> String {
    let mut out = String::new();
    render(expression, &mut out);
    out
}

fn render_slot(slot: Option<&Expression>, out: &mut String) {
    match slot {
        Some(expression) => render(expression, out),
        None => out.push_str(ABSENT),
    }
}

fn render(expression: &Expression, out: &mut String) {
    match expression {
        Expression::Term { name, .. } => out.push_str(name.as_deref().unwrap_or("term")),
        Expression::Literal { value, .. } => out.push_str(value.as_deref().unwrap_or("literal")),
        Expression::MemberAccess { left, right } => {
            render_slot(left.as_deref(), out);
            out.push('.');
            render_slot(right.as_deref(), out);
        }
        Expression::Binary {
            operator,
            left,
            right,
        } => {
            out.push('(');
            render_slot(left.as_deref(), out);
            out.push(' ');
            out.push_str(operator);
            out.push(' ');
            render_slot(right.as_deref(), out);
            out.push(')');
        }
        Expression::Unary { operator, operand } => {
            out.push_str(operator);
            out.push('(');
            render_slot(operand.as_deref(), out);
            out.push(')');
        }
        // The remaining kinds render as their kind name followed by their
        // parts, so distinct nodes of the same kind stay distinct.
        Expression::Ternary {
            condition,
            then_expr,
            else_expr,
        } => render_kind(
            expression,
            None,
            &[condition.as_deref(), then_expr.as_deref(), else_expr.as_deref()],
            out,
        ),
        Expression::ArithmeticGroup { expression: inner } => {
            render_kind(expression, None, &[inner.as_deref()], out)
        }
        Expression::Cast {
            target_type,
            expression: inner,
        } => render_kind(expression, Some(target_type), &[inner.as_deref()], out),
        Expression::TypeTest {
            type_name,
            expression: inner,
        } => render_kind(expression, Some(type_name), &[inner.as_deref()], out),
        Expression::NonDeterministicChoice { choices } => {
            let parts: Vec<Option<&Expression>> = choices.iter().map(Some).collect();
            render_kind(expression, None, &parts, out)
        }
    }
}

fn render_kind(
    expression: &Expression,
    type_name: Option<&str>,
    parts: &[Option<&Expression>],
    out: &mut String,
) {
    out.push_str(expression.kind_name());
    if let Some(type_name) = type_name {
        out.push('<');
        out.push_str(type_name);
        out.push('>');
    }
    out.push('(');
    for (position, part) in parts.iter().enumerate() {
        if position > 0 {
            out.push_str(", ");
        }
        render_slot(*part, out);
    }
    out.push(')');
}

/// Turns one definition into a labelled formula using the batch registry
#[derive(Debug, Clone, Copy)]
pub struct DefinitionAssembler {
    max_expression_depth: usize,
}

impl DefinitionAssembler {
    pub fn new(max_expression_depth: usize) -> Self {
        Self {
            max_expression_depth,
        }
    }

    /// Convert `definition` and label the result with the registry's names as
    /// they stand after the conversion.
    ///
    /// The depth bound is checked before anything is interned, so a rejected
    /// definition leaves the registry untouched.
    pub fn assemble(
        &self,
        definition: &Definition,
        registry: &mut PropositionRegistry,
    ) -> DefinitionResult<LabelledFormula> {
        if let Some(expression) = &definition.expression {
            let depth = expression.depth();
            if depth > self.max_expression_depth {
                return Err(DefinitionError::DepthExceeded {
                    definition: definition.name.clone(),
                    depth,
                    limit: self.max_expression_depth,
                });
            }
        }

        let formula = ExpressionConverter::new(registry).convert(definition.expression.as_ref());
        let labelled = LabelledFormula::new(formula, registry.snapshot());

        if let Some(index) = labelled.first_unlabelled_proposition() {
            return Err(DefinitionError::DanglingProposition {
                definition: definition.name.clone(),
                index,
                available: labelled.propositions.len(),
            });
        }

        debug!(definition = %definition.name, formula = %labelled, "Converted definition");
        Ok(labelled)
    }
}

impl Default for DefinitionAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPRESSION_DEPTH)
    }
}

/// Assemble with the default depth bound
pub fn assemble(
    definition: &Definition,
    registry: &mut PropositionRegistry,
) -> DefinitionResult<LabelledFormula> {
    DefinitionAssembler::default().assemble(definition, registry)
}
