//! Expression trees.
//!
//! Expressions are split by the category they evaluate to: [`BooleanExpression`],
//! [`NumberExpression`] and [`StringExpression`]. A comparison never mixes categories,
//! so the type of every subtree is known from its position in the tree.
//!
//! `simplify` folds literal subtrees bottom-up and is idempotent: simplifying an already
//! simplified tree returns an equal tree. The script compiler simplifies every
//! expression once before storing it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Bindings, Number, Scope, Value, ValueType};

/// Errors raised while evaluating an expression against a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("variable \"{0}\" has no value")]
    Undefined(String),
    #[error("\"{name}\" is a {found} where a {expected} was expected")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },
    #[error("no binding named \"{0}\"")]
    UnknownBinding(String),
    #[error("binding \"{name}\" takes {expected} argument(s), got {found}")]
    Arity { name: String, expected: usize, found: usize },
}

fn lookup<'a>(scope: &'a Scope, name: &str) -> Result<&'a Value, EvalError> {
    scope.get(name).ok_or_else(|| EvalError::Undefined(name.to_string()))
}

fn mismatch(name: &str, expected: ValueType, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.value_type(),
    }
}

/// Equality operator shared by all comparison categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Is,
    IsNot,
}

impl CompareOp {
    pub fn apply<T: PartialEq + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            CompareOp::Is => left == right,
            CompareOp::IsNot => left != right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Is => write!(f, "is"),
            CompareOp::IsNot => write!(f, "is not"),
        }
    }
}

/// A call into a host binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expression>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    fn simplify(self) -> Self {
        Self {
            name: self.name,
            args: self.args.into_iter().map(Expression::simplify).collect(),
        }
    }

    fn evaluate(&self, scope: &Scope, bindings: &Bindings) -> Result<Value, EvalError> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.evaluate(scope, bindings))
            .collect::<Result<Vec<_>, _>>()?;
        bindings.call(&self.name, &args)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// An expression producing a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberExpression {
    Literal(Number),
    Variable(String),
    Call(Call),
    Add(Box<NumberExpression>, Box<NumberExpression>),
    Subtract(Box<NumberExpression>, Box<NumberExpression>),
    Multiply(Box<NumberExpression>, Box<NumberExpression>),
    Divide(Box<NumberExpression>, Box<NumberExpression>),
}

type NumberNode = fn(Box<NumberExpression>, Box<NumberExpression>) -> NumberExpression;

impl NumberExpression {
    pub fn literal(value: f64) -> Self {
        Self::Literal(Number(value))
    }

    pub fn add(left: Self, right: Self) -> Self {
        Self::Add(Box::new(left), Box::new(right))
    }

    pub fn subtract(left: Self, right: Self) -> Self {
        Self::Subtract(Box::new(left), Box::new(right))
    }

    pub fn multiply(left: Self, right: Self) -> Self {
        Self::Multiply(Box::new(left), Box::new(right))
    }

    pub fn divide(left: Self, right: Self) -> Self {
        Self::Divide(Box::new(left), Box::new(right))
    }

    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Self::Literal(n) => Some(n.get()),
            _ => None,
        }
    }

    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Add(l, r) => fold_number(*l, *r, Self::Add, |a, b| a + b),
            Self::Subtract(l, r) => fold_number(*l, *r, Self::Subtract, |a, b| a - b),
            Self::Multiply(l, r) => fold_number(*l, *r, Self::Multiply, |a, b| a * b),
            Self::Divide(l, r) => fold_number(*l, *r, Self::Divide, |a, b| a / b),
            Self::Call(call) => Self::Call(call.simplify()),
            other => other,
        }
    }

    /// # Errors
    /// Fails when a variable is unset or holds another category, or a binding call fails.
    pub fn evaluate(&self, scope: &Scope, bindings: &Bindings) -> Result<f64, EvalError> {
        Ok(match self {
            Self::Literal(n) => n.get(),
            Self::Variable(name) => match lookup(scope, name)? {
                Value::Number(n) => n.get(),
                other => return Err(mismatch(name, ValueType::Number, other)),
            },
            Self::Call(call) => match call.evaluate(scope, bindings)? {
                Value::Number(n) => n.get(),
                other => return Err(mismatch(&call.name, ValueType::Number, &other)),
            },
            Self::Add(l, r) => l.evaluate(scope, bindings)? + r.evaluate(scope, bindings)?,
            Self::Subtract(l, r) => l.evaluate(scope, bindings)? - r.evaluate(scope, bindings)?,
            Self::Multiply(l, r) => l.evaluate(scope, bindings)? * r.evaluate(scope, bindings)?,
            Self::Divide(l, r) => l.evaluate(scope, bindings)? / r.evaluate(scope, bindings)?,
        })
    }
}

fn fold_number(
    left: NumberExpression,
    right: NumberExpression,
    rebuild: NumberNode,
    op: fn(f64, f64) -> f64,
) -> NumberExpression {
    let (left, right) = (left.simplify(), right.simplify());
    match (left.as_literal(), right.as_literal()) {
        (Some(a), Some(b)) => NumberExpression::literal(op(a, b)),
        _ => rebuild(Box::new(left), Box::new(right)),
    }
}

impl fmt::Display for NumberExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{n}"),
            Self::Variable(name) => write!(f, "{name}"),
            Self::Call(call) => write!(f, "{call}"),
            Self::Add(l, r) => write!(f, "({l} + {r})"),
            Self::Subtract(l, r) => write!(f, "({l} - {r})"),
            Self::Multiply(l, r) => write!(f, "({l} * {r})"),
            Self::Divide(l, r) => write!(f, "({l} / {r})"),
        }
    }
}

/// An expression producing a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanExpression {
    Literal(bool),
    Variable(String),
    Call(Call),
    Not(Box<BooleanExpression>),
    And(Box<BooleanExpression>, Box<BooleanExpression>),
    Or(Box<BooleanExpression>, Box<BooleanExpression>),
    Xor(Box<BooleanExpression>, Box<BooleanExpression>),
    Compare(Box<Comparison>),
}

type BooleanNode = fn(Box<BooleanExpression>, Box<BooleanExpression>) -> BooleanExpression;

impl BooleanExpression {
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn xor(left: Self, right: Self) -> Self {
        Self::Xor(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn compare(comparison: Comparison) -> Self {
        Self::Compare(Box::new(comparison))
    }

    pub fn as_literal(&self) -> Option<bool> {
        match self {
            Self::Literal(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Not(inner) => match inner.simplify() {
                Self::Literal(b) => Self::Literal(!b),
                other => Self::not(other),
            },
            Self::And(l, r) => fold_boolean(*l, *r, Self::And, |a, b| a && b),
            Self::Or(l, r) => fold_boolean(*l, *r, Self::Or, |a, b| a || b),
            Self::Xor(l, r) => fold_boolean(*l, *r, Self::Xor, |a, b| a ^ b),
            Self::Compare(comparison) => comparison.simplify(),
            Self::Call(call) => Self::Call(call.simplify()),
            other => other,
        }
    }

    /// # Errors
    /// Fails when a variable is unset or holds another category, or a binding call fails.
    pub fn evaluate(&self, scope: &Scope, bindings: &Bindings) -> Result<bool, EvalError> {
        Ok(match self {
            Self::Literal(b) => *b,
            Self::Variable(name) => match lookup(scope, name)? {
                Value::Boolean(b) => *b,
                other => return Err(mismatch(name, ValueType::Boolean, other)),
            },
            Self::Call(call) => match call.evaluate(scope, bindings)? {
                Value::Boolean(b) => b,
                other => return Err(mismatch(&call.name, ValueType::Boolean, &other)),
            },
            Self::Not(inner) => !inner.evaluate(scope, bindings)?,
            Self::And(l, r) => l.evaluate(scope, bindings)? && r.evaluate(scope, bindings)?,
            Self::Or(l, r) => l.evaluate(scope, bindings)? || r.evaluate(scope, bindings)?,
            Self::Xor(l, r) => l.evaluate(scope, bindings)? ^ r.evaluate(scope, bindings)?,
            Self::Compare(comparison) => comparison.evaluate(scope, bindings)?,
        })
    }
}

fn fold_boolean(
    left: BooleanExpression,
    right: BooleanExpression,
    rebuild: BooleanNode,
    op: fn(bool, bool) -> bool,
) -> BooleanExpression {
    let (left, right) = (left.simplify(), right.simplify());
    match (left.as_literal(), right.as_literal()) {
        (Some(a), Some(b)) => BooleanExpression::Literal(op(a, b)),
        _ => rebuild(Box::new(left), Box::new(right)),
    }
}

impl fmt::Display for BooleanExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(b) => write!(f, "{b}"),
            Self::Variable(name) => write!(f, "{name}"),
            Self::Call(call) => write!(f, "{call}"),
            Self::Not(inner) => write!(f, "not {inner}"),
            Self::And(l, r) => write!(f, "({l} and {r})"),
            Self::Or(l, r) => write!(f, "({l} or {r})"),
            Self::Xor(l, r) => write!(f, "({l} xor {r})"),
            Self::Compare(comparison) => write!(f, "{comparison}"),
        }
    }
}

/// Equality between two operands of the same category.
///
/// `Variables` compares two bare variables whose shared category is only
/// known once the whole script has been compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Boolean {
        op: CompareOp,
        left: BooleanExpression,
        right: BooleanExpression,
    },
    Number {
        op: CompareOp,
        left: NumberExpression,
        right: NumberExpression,
    },
    String {
        op: CompareOp,
        left: StringExpression,
        right: StringExpression,
    },
    Variables {
        op: CompareOp,
        left: String,
        right: String,
    },
}

impl Comparison {
    /// Folds both operands, collapsing to a literal when both are constant.
    pub fn simplify(self) -> BooleanExpression {
        let folded = match self {
            Comparison::Boolean { op, left, right } => {
                let (left, right) = (left.simplify(), right.simplify());
                if let (Some(a), Some(b)) = (left.as_literal(), right.as_literal()) {
                    return BooleanExpression::Literal(op.apply(&a, &b));
                }
                Comparison::Boolean { op, left, right }
            },
            Comparison::Number { op, left, right } => {
                let (left, right) = (left.simplify(), right.simplify());
                if let (Some(a), Some(b)) = (left.as_literal(), right.as_literal()) {
                    return BooleanExpression::Literal(op.apply(&a, &b));
                }
                Comparison::Number { op, left, right }
            },
            Comparison::String { op, left, right } => {
                let (left, right) = (left.simplify(), right.simplify());
                if let (Some(a), Some(b)) = (left.as_literal(), right.as_literal()) {
                    return BooleanExpression::Literal(op.apply(a, b));
                }
                Comparison::String { op, left, right }
            },
            vars @ Comparison::Variables { .. } => vars,
        };
        BooleanExpression::compare(folded)
    }

    /// # Errors
    /// Fails when an operand fails to evaluate, or two linked variables hold different categories.
    pub fn evaluate(&self, scope: &Scope, bindings: &Bindings) -> Result<bool, EvalError> {
        match self {
            Comparison::Boolean { op, left, right } => Ok(op.apply(
                &left.evaluate(scope, bindings)?,
                &right.evaluate(scope, bindings)?,
            )),
            Comparison::Number { op, left, right } => Ok(op.apply(
                &left.evaluate(scope, bindings)?,
                &right.evaluate(scope, bindings)?,
            )),
            Comparison::String { op, left, right } => Ok(op.apply(
                &left.evaluate(scope, bindings)?,
                &right.evaluate(scope, bindings)?,
            )),
            Comparison::Variables { op, left, right } => {
                let a = lookup(scope, left)?;
                let b = lookup(scope, right)?;
                if a.value_type() != b.value_type() {
                    return Err(mismatch(right, a.value_type(), b));
                }
                Ok(op.apply(a, b))
            },
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Boolean { op, left, right } => write!(f, "({left} {op} {right})"),
            Comparison::Number { op, left, right } => write!(f, "({left} {op} {right})"),
            Comparison::String { op, left, right } => write!(f, "(\"{left}\" {op} \"{right}\")"),
            Comparison::Variables { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}

/// An expression producing text.
///
/// `FromNumber` and `FromBoolean` are the coercions used by `{...}` substitutions;
/// `Interpolate` renders a variable of whatever category it turns out to hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringExpression {
    Literal(String),
    Variable(String),
    Call(Call),
    Concat(Box<StringExpression>, Box<StringExpression>),
    FromNumber(Box<NumberExpression>),
    FromBoolean(Box<BooleanExpression>),
    Interpolate(String),
}

impl StringExpression {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn concat(left: Self, right: Self) -> Self {
        Self::Concat(Box::new(left), Box::new(right))
    }

    pub fn from_number(number: NumberExpression) -> Self {
        Self::FromNumber(Box::new(number))
    }

    pub fn from_boolean(boolean: BooleanExpression) -> Self {
        Self::FromBoolean(Box::new(boolean))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Folds coercions of constants and normalizes concatenation: nested `Concat`s
    /// become one left-leaning chain with adjacent literals merged and empty ones
    /// dropped, so text split across lines has the same shape as text on one line.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Concat(..) => {
                let mut parts = Vec::new();
                self.flatten_into(&mut parts);
                Self::rebuild(parts)
            },
            Self::FromNumber(n) => match n.simplify() {
                NumberExpression::Literal(x) => Self::Literal(x.to_string()),
                other => Self::from_number(other),
            },
            Self::FromBoolean(b) => match b.simplify() {
                BooleanExpression::Literal(x) => Self::Literal(x.to_string()),
                other => Self::from_boolean(other),
            },
            Self::Call(call) => Self::Call(call.simplify()),
            other => other,
        }
    }

    /// Pushes the simplified non-`Concat` pieces of `self`, in order, merging literal runs.
    fn flatten_into(self, parts: &mut Vec<Self>) {
        if let Self::Concat(l, r) = self {
            (*l).flatten_into(parts);
            (*r).flatten_into(parts);
            return;
        }
        match self.simplify() {
            Self::Literal(text) if text.is_empty() => {},
            Self::Literal(text) => match parts.last_mut() {
                Some(Self::Literal(last)) => last.push_str(&text),
                _ => parts.push(Self::Literal(text)),
            },
            piece => parts.push(piece),
        }
    }

    fn rebuild(parts: Vec<Self>) -> Self {
        parts
            .into_iter()
            .reduce(Self::concat)
            .unwrap_or_else(|| Self::literal(""))
    }

    /// # Errors
    /// Fails when a variable is unset or holds another category, or a binding call fails.
    pub fn evaluate(&self, scope: &Scope, bindings: &Bindings) -> Result<String, EvalError> {
        Ok(match self {
            Self::Literal(s) => s.clone(),
            Self::Variable(name) => match lookup(scope, name)? {
                Value::String(s) => s.clone(),
                other => return Err(mismatch(name, ValueType::String, other)),
            },
            Self::Call(call) => match call.evaluate(scope, bindings)? {
                Value::String(s) => s,
                other => return Err(mismatch(&call.name, ValueType::String, &other)),
            },
            Self::Concat(l, r) => l.evaluate(scope, bindings)? + &r.evaluate(scope, bindings)?,
            Self::FromNumber(n) => Number(n.evaluate(scope, bindings)?).to_string(),
            Self::FromBoolean(b) => b.evaluate(scope, bindings)?.to_string(),
            Self::Interpolate(name) => lookup(scope, name)?.to_string(),
        })
    }
}

/// Renders text the way it would be written in a dialogue line.
impl fmt::Display for StringExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s}"),
            Self::Variable(name) | Self::Interpolate(name) => write!(f, "{{{name}}}"),
            Self::Call(call) => write!(f, "{{{call}}}"),
            Self::Concat(l, r) => write!(f, "{l}{r}"),
            Self::FromNumber(n) => write!(f, "{{{n}}}"),
            Self::FromBoolean(b) => write!(f, "{{{b}}}"),
        }
    }
}

/// Any expression, tagged with its category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Boolean(BooleanExpression),
    Number(NumberExpression),
    String(StringExpression),
}

impl Expression {
    pub fn value_type(&self) -> ValueType {
        match self {
            Expression::Boolean(_) => ValueType::Boolean,
            Expression::Number(_) => ValueType::Number,
            Expression::String(_) => ValueType::String,
        }
    }

    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Expression::Boolean(e) => Expression::Boolean(e.simplify()),
            Expression::Number(e) => Expression::Number(e.simplify()),
            Expression::String(e) => Expression::String(e.simplify()),
        }
    }

    /// # Errors
    /// Propagates the evaluation error of the wrapped expression.
    pub fn evaluate(&self, scope: &Scope, bindings: &Bindings) -> Result<Value, EvalError> {
        Ok(match self {
            Expression::Boolean(e) => Value::Boolean(e.evaluate(scope, bindings)?),
            Expression::Number(e) => Value::from(e.evaluate(scope, bindings)?),
            Expression::String(e) => Value::String(e.evaluate(scope, bindings)?),
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Boolean(e) => write!(f, "{e}"),
            Expression::Number(e) => write!(f, "{e}"),
            Expression::String(e) => write!(f, "\"{e}\""),
        }
    }
}

impl From<BooleanExpression> for Expression {
    fn from(value: BooleanExpression) -> Self {
        Expression::Boolean(value)
    }
}

impl From<NumberExpression> for Expression {
    fn from(value: NumberExpression) -> Self {
        Expression::Number(value)
    }
}

impl From<StringExpression> for Expression {
    fn from(value: StringExpression) -> Self {
        Expression::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BindingHint;

    fn lit(s: &str) -> StringExpression {
        StringExpression::literal(s)
    }

    fn var(name: &str) -> StringExpression {
        StringExpression::Interpolate(name.into())
    }

    #[test]
    fn arithmetic_folds_to_literal() {
        let expr = NumberExpression::multiply(
            NumberExpression::add(NumberExpression::literal(1.0), NumberExpression::literal(2.0)),
            NumberExpression::literal(5.0),
        );
        assert_eq!(expr.simplify(), NumberExpression::literal(15.0));
    }

    #[test]
    fn folding_stops_at_variables() {
        let expr = NumberExpression::add(
            NumberExpression::Variable("x".into()),
            NumberExpression::add(NumberExpression::literal(1.0), NumberExpression::literal(2.0)),
        );
        let expected = NumberExpression::add(NumberExpression::Variable("x".into()), NumberExpression::literal(3.0));
        assert_eq!(expr.simplify(), expected);
    }

    #[test]
    fn logic_and_comparisons_fold() {
        let expr = BooleanExpression::or(
            BooleanExpression::and(BooleanExpression::Literal(true), BooleanExpression::Literal(false)),
            BooleanExpression::compare(Comparison::Number {
                op: CompareOp::IsNot,
                left: NumberExpression::literal(1.0),
                right: NumberExpression::literal(2.0),
            }),
        );
        assert_eq!(expr.simplify(), BooleanExpression::Literal(true));
        let not = BooleanExpression::not(BooleanExpression::Literal(true));
        assert_eq!(not.simplify(), BooleanExpression::Literal(false));
    }

    #[test]
    fn text_concatenation_merges_literal_runs() {
        let text = StringExpression::concat(
            StringExpression::concat(StringExpression::concat(lit("Hello, "), var("name")), lit("")),
            StringExpression::concat(lit(" and"), lit(" welcome")),
        );
        let expected = StringExpression::concat(
            StringExpression::concat(lit("Hello, "), var("name")),
            lit(" and welcome"),
        );
        assert_eq!(text.simplify(), expected);
    }

    #[test]
    fn concatenation_shape_does_not_depend_on_grouping() {
        let right_leaning = StringExpression::concat(
            lit("Hi "),
            StringExpression::concat(StringExpression::Interpolate("name".into()), lit("!")),
        );
        let left_leaning = StringExpression::concat(
            StringExpression::concat(lit("Hi "), StringExpression::Interpolate("name".into())),
            lit("!"),
        );
        assert_eq!(right_leaning.simplify(), left_leaning.clone().simplify());
        assert_eq!(left_leaning.clone().simplify(), left_leaning);
        assert_eq!(StringExpression::concat(lit(""), lit("")).simplify(), lit(""));
    }

    #[test]
    fn coercions_fold_through_substitutions() {
        let text = StringExpression::concat(
            StringExpression::concat(
                lit("That's "),
                StringExpression::from_boolean(BooleanExpression::or(
                    BooleanExpression::and(BooleanExpression::Literal(true), BooleanExpression::Literal(false)),
                    BooleanExpression::Literal(true),
                )),
            ),
            lit("."),
        );
        assert_eq!(text.simplify(), lit("That's true."));
    }

    #[test]
    fn simplify_is_idempotent() {
        let samples = vec![
            StringExpression::concat(
                StringExpression::concat(lit("a"), var("x")),
                StringExpression::concat(lit("b"), var("y")),
            ),
            StringExpression::concat(lit("a"), StringExpression::concat(lit("b"), var("z"))),
            StringExpression::from_number(NumberExpression::divide(
                NumberExpression::Variable("n".into()),
                NumberExpression::literal(2.0),
            )),
        ];
        for sample in samples {
            let once = sample.simplify();
            assert_eq!(once.clone().simplify(), once);
        }
    }

    #[test]
    fn evaluation_reads_scope_and_bindings() {
        let mut scope = Scope::new();
        scope.set("name", "Alice").unwrap();
        scope.set("coins", 3.0).unwrap();
        let mut bindings = Bindings::new();
        bindings.bind(
            "double",
            BindingHint::new([ValueType::Number], ValueType::Number),
            |args| Value::from(args[0].as_number().unwrap_or_default() * 2.0),
        );

        let coins = NumberExpression::Call(Call::new(
            "double",
            vec![NumberExpression::Variable("coins".into()).into()],
        ));
        assert_eq!(coins.evaluate(&scope, &bindings), Ok(6.0));

        let text = StringExpression::concat(
            StringExpression::concat(var("name"), lit(" has ")),
            StringExpression::from_number(coins),
        );
        assert_eq!(text.evaluate(&scope, &bindings).unwrap(), "Alice has 6");
    }

    #[test]
    fn evaluation_reports_missing_and_mistyped_variables() {
        let mut scope = Scope::new();
        scope.set("flag", true).unwrap();
        let bindings = Bindings::new();
        let missing = NumberExpression::Variable("nope".into());
        assert_eq!(
            missing.evaluate(&scope, &bindings),
            Err(EvalError::Undefined("nope".into()))
        );
        let wrong = NumberExpression::Variable("flag".into());
        assert!(matches!(
            wrong.evaluate(&scope, &bindings),
            Err(EvalError::TypeMismatch { expected: ValueType::Number, .. })
        ));
    }

    #[test]
    fn linked_variables_compare_by_value() {
        let mut scope = Scope::new();
        scope.set("a", 1.0).unwrap();
        scope.set("b", 1.0).unwrap();
        scope.set("c", "one").unwrap();
        let bindings = Bindings::new();
        let same = Comparison::Variables {
            op: CompareOp::Is,
            left: "a".into(),
            right: "b".into(),
        };
        assert_eq!(same.evaluate(&scope, &bindings), Ok(true));
        let mixed = Comparison::Variables {
            op: CompareOp::Is,
            left: "a".into(),
            right: "c".into(),
        };
        assert!(mixed.evaluate(&scope, &bindings).is_err());
    }
}
