//! Linear temporal logic formulas over indexed atomic propositions

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

/// LTL formula
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formula {
    /// `true` / `false`
    BooleanConstant(bool),
    /// Atomic proposition, identified by its registry index
    AtomicProposition(usize),
    /// ¬φ
    Negation(Box<Formula>),
    /// φ₁ ∧ … ∧ φₙ, n ≥ 2
    Conjunction(Vec<Formula>),
    /// φ₁ ∨ … ∨ φₙ, n ≥ 2
    Disjunction(Vec<Formula>),
    /// X φ
    Next(Box<Formula>),
    /// G φ
    Globally(Box<Formula>),
    /// F φ
    Finally(Box<Formula>),
    /// φ U ψ
    Until(Box<Formula>, Box<Formula>),
    /// φ W ψ
    WeakUntil(Box<Formula>, Box<Formula>),
    /// φ M ψ
    StrongRelease(Box<Formula>, Box<Formula>),
    /// φ R ψ
    Release(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub const TRUE: Formula = Formula::BooleanConstant(true);
    pub const FALSE: Formula = Formula::BooleanConstant(false);

    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::Conjunction(vec![left, right])
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Formula::Disjunction(vec![left, right])
    }

    pub fn not(operand: Formula) -> Self {
        Formula::Negation(Box::new(operand))
    }

    pub fn next(operand: Formula) -> Self {
        Formula::Next(Box::new(operand))
    }

    pub fn globally(operand: Formula) -> Self {
        Formula::Globally(Box::new(operand))
    }

    pub fn finally(operand: Formula) -> Self {
        Formula::Finally(Box::new(operand))
    }

    pub fn until(left: Formula, right: Formula) -> Self {
        Formula::Until(Box::new(left), Box::new(right))
    }

    pub fn weak_until(left: Formula, right: Formula) -> Self {
        Formula::WeakUntil(Box::new(left), Box::new(right))
    }

    pub fn strong_release(left: Formula, right: Formula) -> Self {
        Formula::StrongRelease(Box::new(left), Box::new(right))
    }

    pub fn release(left: Formula, right: Formula) -> Self {
        Formula::Release(Box::new(left), Box::new(right))
    }

    /// Indices of all atomic propositions occurring in this formula
    pub fn atomic_propositions(&self) -> BTreeSet<usize> {
        let mut indices = BTreeSet::new();
        self.collect_atomic_propositions(&mut indices);
        indices
    }

    fn collect_atomic_propositions(&self, indices: &mut BTreeSet<usize>) {
        match self {
            Formula::BooleanConstant(_) => {}
            Formula::AtomicProposition(index) => {
                indices.insert(*index);
            }
            Formula::Negation(operand)
            | Formula::Next(operand)
            | Formula::Globally(operand)
            | Formula::Finally(operand) => operand.collect_atomic_propositions(indices),
            Formula::Conjunction(children) | Formula::Disjunction(children) => {
                for child in children {
                    child.collect_atomic_propositions(indices);
                }
            }
            Formula::Until(left, right)
            | Formula::WeakUntil(left, right)
            | Formula::StrongRelease(left, right)
            | Formula::Release(left, right) => {
                left.collect_atomic_propositions(indices);
                right.collect_atomic_propositions(indices);
            }
        }
    }

    /// Maximum nesting depth of temporal operators
    pub fn temporal_depth(&self) -> usize {
        match self {
            Formula::BooleanConstant(_) | Formula::AtomicProposition(_) => 0,
            Formula::Negation(operand) => operand.temporal_depth(),
            Formula::Conjunction(children) | Formula::Disjunction(children) => children
                .iter()
                .map(Formula::temporal_depth)
                .max()
                .unwrap_or(0),
            Formula::Next(operand) | Formula::Globally(operand) | Formula::Finally(operand) => {
                1 + operand.temporal_depth()
            }
            Formula::Until(left, right)
            | Formula::WeakUntil(left, right)
            | Formula::StrongRelease(left, right)
            | Formula::Release(left, right) => {
                1 + std::cmp::max(left.temporal_depth(), right.temporal_depth())
            }
        }
    }

    /// Render with proposition names taken from `names`; indices without a name
    /// fall back to `p{index}`
    pub fn display_with<'a>(&'a self, names: &'a [String]) -> impl fmt::Display + 'a {
        FormulaDisplay {
            formula: self,
            names,
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
        match self {
            Formula::BooleanConstant(value) => write!(f, "{}", value),
            Formula::AtomicProposition(index) => match names.get(*index) {
                Some(name) => write_proposition_name(f, name),
                None => write!(f, "p{}", index),
            },
            Formula::Negation(operand) => {
                f.write_str("!")?;
                operand.write_operand(f, names)
            }
            Formula::Conjunction(children) => write_joined(f, children, " & ", names),
            Formula::Disjunction(children) => write_joined(f, children, " | ", names),
            Formula::Next(operand) => write_prefix(f, "X", operand, names),
            Formula::Globally(operand) => write_prefix(f, "G", operand, names),
            Formula::Finally(operand) => write_prefix(f, "F", operand, names),
            Formula::Until(left, right) => write_infix(f, left, "U", right, names),
            Formula::WeakUntil(left, right) => write_infix(f, left, "W", right, names),
            Formula::StrongRelease(left, right) => write_infix(f, left, "M", right, names),
            Formula::Release(left, right) => write_infix(f, left, "R", right, names),
        }
    }

    /// Operands that are themselves infix get parentheses
    fn write_operand(&self, f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
        match self {
            Formula::Conjunction(_)
            | Formula::Disjunction(_)
            | Formula::Until(..)
            | Formula::WeakUntil(..)
            | Formula::StrongRelease(..)
            | Formula::Release(..) => {
                f.write_str("(")?;
                self.write(f, names)?;
                f.write_str(")")
            }
            _ => self.write(f, names),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, &[])
    }
}

struct FormulaDisplay<'a> {
    formula: &'a Formula,
    names: &'a [String],
}

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.formula.write(f, self.names)
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    children: &[Formula],
    separator: &str,
    names: &[String],
) -> fmt::Result {
    for (position, child) in children.iter().enumerate() {
        if position > 0 {
            f.write_str(separator)?;
        }
        child.write_operand(f, names)?;
    }
    Ok(())
}

fn write_prefix(
    f: &mut fmt::Formatter<'_>,
    operator: &str,
    operand: &Formula,
    names: &[String],
) -> fmt::Result {
    write!(f, "{} ", operator)?;
    operand.write_operand(f, names)
}

fn write_infix(
    f: &mut fmt::Formatter<'_>,
    left: &Formula,
    operator: &str,
    right: &Formula,
    names: &[String],
) -> fmt::Result {
    left.write_operand(f, names)?;
    write!(f, " {} ", operator)?;
    right.write_operand(f, names)
}

const RESERVED_WORDS: &[&str] = &[
    "true", "false", "X", "F", "G", "U", "W", "M", "R", "tt", "ff",
];

/// Whether `name` can be written into formula text without quoting
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let leading_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    leading_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

fn write_proposition_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_identifier(name) {
        f.write_str(name)
    } else {
        f.write_char('"')?;
        for c in name.chars() {
            if matches!(c, '"' | '\\') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('"')
    }
}

/// Formula paired with the names of its atomic propositions.
///
/// `propositions[i]` is the name of `AtomicProposition(i)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledFormula {
    pub formula: Formula,
    pub propositions: Vec<String>,
}

impl LabelledFormula {
    pub fn new(formula: Formula, propositions: Vec<String>) -> Self {
        Self {
            formula,
            propositions,
        }
    }

    pub fn proposition_name(&self, index: usize) -> Option<&str> {
        self.propositions.get(index).map(String::as_str)
    }

    /// First proposition index used by the formula that has no name
    pub fn first_unlabelled_proposition(&self) -> Option<usize> {
        self.formula
            .atomic_propositions()
            .into_iter()
            .find(|index| *index >= self.propositions.len())
    }
}

impl fmt::Display for LabelledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.formula.write(f, &self.propositions)
    }
}
