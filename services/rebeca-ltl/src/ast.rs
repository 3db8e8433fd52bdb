//! Property model produced by the Rebeca model/property compilers
//!
//! The expression tree mirrors the object model of the property language: it is
//! built once by a front-end and only ever read by the converter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of an expression node.
///
/// Every freshly constructed term or literal receives a process-unique id, so two
/// structurally identical nodes are still told apart. Cloning a node keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a new, never before returned id
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Property-language expression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Binary operator application: `left op right`.
    ///
    /// Temporal operators written with a single operand arrive as binary nodes
    /// with only `left` populated.
    Binary {
        operator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        left: Option<Box<Expression>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        right: Option<Box<Expression>>,
    },
    /// Prefix operator application: `op operand`
    Unary {
        operator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operand: Option<Box<Expression>>,
    },
    /// Member access: `left.right`, e.g. `phil0.eating`
    MemberAccess {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        left: Option<Box<Expression>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        right: Option<Box<Expression>>,
    },
    /// Identifier, optionally followed by a call argument list: `name` or `name(args)`
    Term {
        #[serde(skip, default = "NodeId::fresh")]
        id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<Expression>>,
    },
    /// Literal value as written in the source
    Literal {
        #[serde(skip, default = "NodeId::fresh")]
        id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Conditional: `condition ? then_expr : else_expr`
    Ternary {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Box<Expression>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then_expr: Option<Box<Expression>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_expr: Option<Box<Expression>>,
    },
    /// Parenthesised arithmetic sub-expression
    ArithmeticGroup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<Box<Expression>>,
    },
    /// Type cast: `(target_type) expression`
    Cast {
        target_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<Box<Expression>>,
    },
    /// Type test: `expression instanceof type_name`
    TypeTest {
        type_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expression: Option<Box<Expression>>,
    },
    /// Non-deterministic choice: `?(a, b, ...)`
    NonDeterministicChoice {
        #[serde(default)]
        choices: Vec<Expression>,
    },
}

fn boxed(expression: Expression) -> Option<Box<Expression>> {
    Some(Box::new(expression))
}

impl Expression {
    pub fn binary(operator: impl Into<String>, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            operator: operator.into(),
            left: boxed(left),
            right: boxed(right),
        }
    }

    /// Single-operand temporal operator in the binary shape the front-end emits
    pub fn temporal(operator: impl Into<String>, operand: Expression) -> Self {
        Expression::Binary {
            operator: operator.into(),
            left: boxed(operand),
            right: None,
        }
    }

    pub fn unary(operator: impl Into<String>, operand: Expression) -> Self {
        Expression::Unary {
            operator: operator.into(),
            operand: boxed(operand),
        }
    }

    pub fn member(left: Expression, right: Expression) -> Self {
        Expression::MemberAccess {
            left: boxed(left),
            right: boxed(right),
        }
    }

    pub fn term(name: impl Into<String>) -> Self {
        Expression::Term {
            id: NodeId::fresh(),
            name: Some(name.into()),
            arguments: None,
        }
    }

    /// Term with no name, as produced for synthesised nodes
    pub fn anonymous_term() -> Self {
        Expression::Term {
            id: NodeId::fresh(),
            name: None,
            arguments: None,
        }
    }

    /// Call-shaped term: `name(arguments)`
    pub fn call(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Term {
            id: NodeId::fresh(),
            name: Some(name.into()),
            arguments: Some(arguments),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Expression::Literal {
            id: NodeId::fresh(),
            value: Some(value.into()),
        }
    }

    pub fn anonymous_literal() -> Self {
        Expression::Literal {
            id: NodeId::fresh(),
            value: None,
        }
    }

    pub fn ternary(condition: Expression, then_expr: Expression, else_expr: Expression) -> Self {
        Expression::Ternary {
            condition: boxed(condition),
            then_expr: boxed(then_expr),
            else_expr: boxed(else_expr),
        }
    }

    pub fn group(expression: Expression) -> Self {
        Expression::ArithmeticGroup {
            expression: boxed(expression),
        }
    }

    pub fn cast(target_type: impl Into<String>, expression: Expression) -> Self {
        Expression::Cast {
            target_type: target_type.into(),
            expression: boxed(expression),
        }
    }

    pub fn type_test(expression: Expression, type_name: impl Into<String>) -> Self {
        Expression::TypeTest {
            type_name: type_name.into(),
            expression: boxed(expression),
        }
    }

    pub fn nondet(choices: Vec<Expression>) -> Self {
        Expression::NonDeterministicChoice { choices }
    }

    /// Name of the node kind, matching its `kind` tag in JSON
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Binary { .. } => "binary",
            Expression::Unary { .. } => "unary",
            Expression::MemberAccess { .. } => "member_access",
            Expression::Term { .. } => "term",
            Expression::Literal { .. } => "literal",
            Expression::Ternary { .. } => "ternary",
            Expression::ArithmeticGroup { .. } => "arithmetic_group",
            Expression::Cast { .. } => "cast",
            Expression::TypeTest { .. } => "type_test",
            Expression::NonDeterministicChoice { .. } => "non_deterministic_choice",
        }
    }

    /// Direct children, in source order
    pub fn children(&self) -> Vec<&Expression> {
        fn present<'a>(slots: &[&'a Option<Box<Expression>>]) -> Vec<&'a Expression> {
            slots.iter().copied().filter_map(Option::as_deref).collect()
        }

        match self {
            Expression::Binary { left, right, .. } | Expression::MemberAccess { left, right } => {
                present(&[left, right])
            }
            Expression::Unary { operand, .. } => present(&[operand]),
            Expression::Term { arguments, .. } => {
                arguments.iter().flat_map(|args| args.iter()).collect()
            }
            Expression::Literal { .. } => Vec::new(),
            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
            } => present(&[condition, then_expr, else_expr]),
            Expression::ArithmeticGroup { expression }
            | Expression::Cast { expression, .. }
            | Expression::TypeTest { expression, .. } => present(&[expression]),
            Expression::NonDeterministicChoice { choices } => choices.iter().collect(),
        }
    }

    /// Nesting depth of the tree; a leaf has depth 1.
    ///
    /// Walks with an explicit stack so arbitrarily deep trees can be measured
    /// before any recursive pass runs over them.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(node.children().into_iter().map(|child| (child, depth + 1)));
        }
        max_depth
    }
}

/// Named property definition: `name = expression;`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
}

impl Definition {
    pub fn new(name: impl Into<String>, expression: Expression) -> Self {
        Self {
            name: name.into(),
            expression: Some(expression),
        }
    }
}

/// Compiled property file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyModel {
    /// `define` section
    #[serde(default)]
    pub definitions: Vec<Definition>,
    /// `LTL` section
    #[serde(default)]
    pub ltl_definitions: Vec<Definition>,
    /// `Assertion` section; never translated to LTL
    #[serde(default)]
    pub assertion_definitions: Vec<Definition>,
}

impl PropertyModel {
    pub fn with_definitions(definitions: Vec<Definition>) -> Self {
        Self {
            definitions,
            ..Self::default()
        }
    }
}

/// Rebeca instance declared in the model's `main` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebecInstance {
    pub name: String,
    pub class_name: String,
}

/// Compiled Rebeca model, as far as property compilation needs it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebecaModel {
    #[serde(default)]
    pub reactive_classes: Vec<String>,
    #[serde(default)]
    pub instances: Vec<RebecInstance>,
}

impl RebecaModel {
    pub fn has_instance(&self, name: &str) -> bool {
        self.instances.iter().any(|instance| instance.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_node_ids_are_distinct() {
        let a = Expression::anonymous_term();
        let b = Expression::anonymous_term();
        match (a, b) {
            (Expression::Term { id: first, .. }, Expression::Term { id: second, .. }) => {
                assert_ne!(first, second);
            }
            _ => panic!("Expected terms"),
        }
    }

    #[test]
    fn test_clone_keeps_identity() {
        let literal = Expression::anonymous_literal();
        let copy = literal.clone();
        match (literal, copy) {
            (Expression::Literal { id: first, .. }, Expression::Literal { id: second, .. }) => {
                assert_eq!(first, second);
            }
            _ => panic!("Expected literals"),
        }
    }

    #[test]
    fn test_depth() {
        assert_eq!(Expression::term("p").depth(), 1);

        let nested = Expression::binary(
            "&&",
            Expression::temporal("G", Expression::term("p0")),
            Expression::unary("!", Expression::unary("!", Expression::term("p1"))),
        );
        assert_eq!(nested.depth(), 4);
    }

    #[test]
    fn test_depth_of_degenerate_chain() {
        let mut expression = Expression::term("p");
        for _ in 0..100_000 {
            expression = Expression::unary("!", expression);
        }
        assert_eq!(expression.depth(), 100_001);
        // Dropping a tree this deep recursively would overflow the test thread's stack.
        std::mem::forget(expression);
    }

    #[test]
    fn test_children_skip_absent_slots() {
        let temporal = Expression::temporal("G", Expression::term("p"));
        assert_eq!(temporal.children().len(), 1);

        let call = Expression::call("F", vec![Expression::term("a"), Expression::term("b")]);
        assert_eq!(call.children().len(), 2);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "kind": "binary",
            "operator": "&&",
            "left": { "kind": "term", "name": "p0" },
            "right": { "kind": "binary", "operator": "G", "left": { "kind": "term", "name": "p1" } }
        }"#;

        let expression: Expression = serde_json::from_str(json).unwrap();
        match expression {
            Expression::Binary { operator, left, right } => {
                assert_eq!(operator, "&&");
                assert!(matches!(left.as_deref(), Some(Expression::Term { .. })));
                match right.as_deref() {
                    Some(Expression::Binary { right: None, .. }) => (),
                    other => panic!("Expected single-operand binary, got {:?}", other),
                }
            }
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_property_model_sections_default_to_empty() {
        let model: PropertyModel =
            serde_json::from_str(r#"{ "definitions": [ { "name": "Safety" } ] }"#).unwrap();
        assert_eq!(model.definitions.len(), 1);
        assert!(model.definitions[0].expression.is_none());
        assert!(model.ltl_definitions.is_empty());
        assert!(model.assertion_definitions.is_empty());
    }

    #[test]
    fn test_model_instances() {
        let model = RebecaModel {
            reactive_classes: vec!["Philosopher".to_string()],
            instances: vec![RebecInstance {
                name: "phil0".to_string(),
                class_name: "Philosopher".to_string(),
            }],
        };
        assert!(model.has_instance("phil0"));
        assert!(!model.has_instance("phil1"));
    }
}
