//! Operator lookup tables for the property language
//!
//! Every operator is matched through one table so that both spellings
//! (`&&`/`and`, `G`/`globally`, ...) resolve to the same variant and anything
//! outside the table is visibly a fallback.

use serde::{Deserialize, Serialize};

/// Comparison operators; comparisons are opaque to LTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Arithmetic operators; arithmetic is opaque to LTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    And,
    Or,
    Implies,
    Iff,
    Globally,
    Finally,
    Next,
    Until,
    WeakUntil,
    StrongRelease,
    Release,
    Comparison(ComparisonOperator),
    Arithmetic(ArithmeticOperator),
}

const BINARY_OPERATORS: &[(&str, BinaryOperator)] = &[
    ("&&", BinaryOperator::And),
    ("and", BinaryOperator::And),
    ("||", BinaryOperator::Or),
    ("or", BinaryOperator::Or),
    ("->", BinaryOperator::Implies),
    ("implies", BinaryOperator::Implies),
    ("<->", BinaryOperator::Iff),
    ("iff", BinaryOperator::Iff),
    ("G", BinaryOperator::Globally),
    ("globally", BinaryOperator::Globally),
    ("F", BinaryOperator::Finally),
    ("finally", BinaryOperator::Finally),
    ("X", BinaryOperator::Next),
    ("next", BinaryOperator::Next),
    ("U", BinaryOperator::Until),
    ("until", BinaryOperator::Until),
    ("W", BinaryOperator::WeakUntil),
    ("weak_until", BinaryOperator::WeakUntil),
    ("M", BinaryOperator::StrongRelease),
    ("strong_release", BinaryOperator::StrongRelease),
    ("R", BinaryOperator::Release),
    ("release", BinaryOperator::Release),
    ("==", BinaryOperator::Comparison(ComparisonOperator::Equal)),
    ("!=", BinaryOperator::Comparison(ComparisonOperator::NotEqual)),
    ("<", BinaryOperator::Comparison(ComparisonOperator::LessThan)),
    ("<=", BinaryOperator::Comparison(ComparisonOperator::LessEqual)),
    (">", BinaryOperator::Comparison(ComparisonOperator::GreaterThan)),
    (">=", BinaryOperator::Comparison(ComparisonOperator::GreaterEqual)),
    ("+", BinaryOperator::Arithmetic(ArithmeticOperator::Add)),
    ("-", BinaryOperator::Arithmetic(ArithmeticOperator::Subtract)),
    ("*", BinaryOperator::Arithmetic(ArithmeticOperator::Multiply)),
    ("/", BinaryOperator::Arithmetic(ArithmeticOperator::Divide)),
    ("%", BinaryOperator::Arithmetic(ArithmeticOperator::Remainder)),
];

impl BinaryOperator {
    /// Look up an operator by its source spelling
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        lookup(BINARY_OPERATORS, symbol)
    }

    /// All accepted spellings, in table order
    pub fn symbols() -> impl Iterator<Item = &'static str> {
        BINARY_OPERATORS.iter().map(|(symbol, _)| *symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Globally,
    Finally,
    Next,
    /// Arithmetic sign, `+x` or `-x`
    Sign,
}

const UNARY_OPERATORS: &[(&str, UnaryOperator)] = &[
    ("!", UnaryOperator::Not),
    ("not", UnaryOperator::Not),
    ("G", UnaryOperator::Globally),
    ("globally", UnaryOperator::Globally),
    ("F", UnaryOperator::Finally),
    ("finally", UnaryOperator::Finally),
    ("X", UnaryOperator::Next),
    ("next", UnaryOperator::Next),
    ("+", UnaryOperator::Sign),
    ("-", UnaryOperator::Sign),
];

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        lookup(UNARY_OPERATORS, symbol)
    }

    pub fn symbols() -> impl Iterator<Item = &'static str> {
        UNARY_OPERATORS.iter().map(|(symbol, _)| *symbol)
    }
}

/// Temporal operator written as a call, `G(p)`.
///
/// Only the single-letter names are recognised in call position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalCall {
    Globally,
    Finally,
    Next,
}

const TEMPORAL_CALLS: &[(&str, TemporalCall)] = &[
    ("G", TemporalCall::Globally),
    ("F", TemporalCall::Finally),
    ("X", TemporalCall::Next),
];

impl TemporalCall {
    pub fn from_name(name: &str) -> Option<Self> {
        lookup(TEMPORAL_CALLS, name)
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], symbol: &str) -> Option<T> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == symbol)
        .map(|(_, operator)| *operator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_spellings_resolve_to_same_operator() {
        let pairs = [
            ("&&", "and"),
            ("||", "or"),
            ("->", "implies"),
            ("<->", "iff"),
            ("G", "globally"),
            ("F", "finally"),
            ("X", "next"),
            ("U", "until"),
            ("W", "weak_until"),
            ("M", "strong_release"),
            ("R", "release"),
        ];
        for (symbol, keyword) in pairs {
            assert_eq!(
                BinaryOperator::from_symbol(symbol),
                BinaryOperator::from_symbol(keyword),
                "{} vs {}",
                symbol,
                keyword
            );
            assert!(BinaryOperator::from_symbol(symbol).is_some());
        }
    }

    #[test]
    fn test_unknown_symbols() {
        assert_eq!(BinaryOperator::from_symbol("@@"), None);
        assert_eq!(BinaryOperator::from_symbol("AND"), None);
        assert_eq!(UnaryOperator::from_symbol("~"), None);
        assert_eq!(TemporalCall::from_name("globally"), None);
    }

    #[test]
    fn test_comparison_and_arithmetic_categories() {
        assert_eq!(
            BinaryOperator::from_symbol("<="),
            Some(BinaryOperator::Comparison(ComparisonOperator::LessEqual))
        );
        assert_eq!(
            BinaryOperator::from_symbol("%"),
            Some(BinaryOperator::Arithmetic(ArithmeticOperator::Remainder))
        );
        assert_eq!(UnaryOperator::from_symbol("-"), Some(UnaryOperator::Sign));
    }

    #[test]
    fn test_symbol_listing() {
        assert_eq!(BinaryOperator::symbols().count(), 33);
        assert!(UnaryOperator::symbols().any(|symbol| symbol == "not"));
    }
}
