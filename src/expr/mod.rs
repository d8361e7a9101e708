//! Symbolic scalar expressions for component parameters and placements.
//!
//! Expressions are immutable trees. Every constructor folds what it can, so
//! a tree that only contains literals collapses to a single [`Expr::Number`]
//! and trivial identities (`x + 0`, `x * 1`, `x - x`, ...) never survive.
//! Substitution of statically known variables goes through
//! [`Expr::evaluate`], which returns a new, possibly more resolved tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use meval::{Context, ContextProvider};

pub mod parse;
pub mod resolve;

pub use parse::{ParseError, parse_expr};
pub use resolve::{DeferredValue, ParameterEvaluator, Resolution, RuntimeLink};

/// Statically resolvable variables: name → expression.
pub type Bindings = BTreeMap<String, Expr>;

/// Substitution depth after which a binding is assumed to refer to itself.
const MAX_SUBSTITUTION_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "^",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Rem => 2,
            Self::Pow => 4,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        let result = match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div if rhs == 0.0 => return None,
            Self::Div => lhs / rhs,
            Self::Rem if rhs == 0.0 => return None,
            Self::Rem => lhs % rhs,
            Self::Pow => lhs.powf(rhs),
        };
        result.is_finite().then_some(result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// A string literal, e.g. `"mid"` for a placement convention.
    Text(String),
    /// A reference to a declared variable or instrument parameter.
    Ident(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    #[must_use]
    pub const fn number(value: f64) -> Self {
        Self::Number(value)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self::Number(0.0)
    }

    #[must_use]
    pub const fn one() -> Self {
        Self::Number(1.0)
    }

    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Builds a unary node, folding literal operands.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        match (op, operand) {
            (UnaryOp::Neg, Self::Number(value)) => Self::Number(-value),
            (UnaryOp::Neg, Self::Unary(UnaryOp::Neg, inner)) => *inner,
            (op, operand) => Self::Unary(op, Box::new(operand)),
        }
    }

    /// Builds a binary node, folding literals and trivial identities.
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        if let (Self::Number(a), Self::Number(b)) = (&lhs, &rhs) {
            if let Some(result) = op.apply(*a, *b) {
                return Self::Number(result);
            }
        }

        match op {
            BinaryOp::Add => {
                if lhs.is_zero() {
                    return rhs;
                }
                if rhs.is_zero() {
                    return lhs;
                }
                if lhs.is_negation_of(&rhs) {
                    return Self::zero();
                }
                if let Self::Unary(UnaryOp::Neg, inner) = rhs {
                    return Self::binary(BinaryOp::Sub, lhs, *inner);
                }
            }
            BinaryOp::Sub => {
                if rhs.is_zero() {
                    return lhs;
                }
                if lhs.is_zero() {
                    return Self::unary(UnaryOp::Neg, rhs);
                }
                if lhs == rhs {
                    return Self::zero();
                }
            }
            BinaryOp::Mul => {
                if lhs.is_zero() || rhs.is_zero() {
                    return Self::zero();
                }
                if lhs.is_one() {
                    return rhs;
                }
                if rhs.is_one() {
                    return lhs;
                }
                if lhs.value() == Some(-1.0) {
                    return Self::unary(UnaryOp::Neg, rhs);
                }
                if rhs.value() == Some(-1.0) {
                    return Self::unary(UnaryOp::Neg, lhs);
                }
            }
            BinaryOp::Div => {
                if rhs.is_one() {
                    return lhs;
                }
                if lhs.is_zero() && !rhs.is_zero() {
                    return Self::zero();
                }
            }
            BinaryOp::Pow => {
                if rhs.is_zero() {
                    return Self::one();
                }
                if rhs.is_one() {
                    return lhs;
                }
            }
            BinaryOp::Rem => {}
        }

        Self::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    /// Builds a function call, evaluating it when every argument is a literal.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        let name = name.into();
        let literal: Option<Vec<f64>> = args.iter().map(Expr::value).collect();
        if let Some(values) = literal {
            let context = function_context();
            if let Ok(result) = context.eval_func(&name, &values) {
                if result.is_finite() {
                    return Self::Number(result);
                }
            }
        }
        Self::Call(name, args)
    }

    #[must_use]
    pub fn sqrt(self) -> Self {
        Self::call("sqrt", vec![self])
    }

    #[must_use]
    pub fn abs(self) -> Self {
        Self::call("abs", vec![self])
    }

    /// `true` for literal numbers and strings.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Text(_))
    }

    /// The literal value, if this expression is a number.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// `true` only for a literal zero; symbolic expressions are never zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value() == Some(0.0)
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        self.value() == Some(1.0)
    }

    fn is_negation_of(&self, other: &Expr) -> bool {
        match (self, other) {
            (Self::Unary(UnaryOp::Neg, inner), other) | (other, Self::Unary(UnaryOp::Neg, inner)) => {
                inner.as_ref() == other
            }
            (Self::Number(a), Self::Number(b)) => *a == -*b,
            _ => false,
        }
    }

    /// Does the expression (transitively through its own tree) reference `name`?
    #[must_use]
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Self::Number(_) | Self::Text(_) => false,
            Self::Ident(ident) => ident == name,
            Self::Unary(_, operand) => operand.depends_on(name),
            Self::Binary(_, lhs, rhs) => lhs.depends_on(name) || rhs.depends_on(name),
            Self::Call(_, args) => args.iter().any(|arg| arg.depends_on(name)),
        }
    }

    /// All identifiers referenced by the expression, sorted.
    #[must_use]
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Number(_) | Self::Text(_) => {}
            Self::Ident(ident) => {
                names.insert(ident.clone());
            }
            Self::Unary(_, operand) => operand.collect_variables(names),
            Self::Binary(_, lhs, rhs) => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Self::Call(_, args) => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }

    /// Substitutes `bindings` and re-simplifies. Unbound identifiers stay
    /// symbolic, except for the well-known constants (`pi`, `e`, `PI`, `M_PI`).
    /// A name bound to itself is pinned: it stays symbolic and hides a
    /// constant of the same name.
    #[must_use]
    pub fn evaluate(&self, bindings: &Bindings) -> Expr {
        self.evaluate_at_depth(bindings, 0)
    }

    fn evaluate_at_depth(&self, bindings: &Bindings, depth: usize) -> Expr {
        match self {
            Self::Number(_) | Self::Text(_) => self.clone(),
            Self::Ident(name) => {
                if let Some(bound) = bindings.get(name) {
                    if matches!(bound, Self::Ident(pinned) if pinned == name) {
                        return self.clone();
                    }
                    if depth < MAX_SUBSTITUTION_DEPTH {
                        return bound.evaluate_at_depth(bindings, depth + 1);
                    }
                    log::warn!("binding `{name}` is self-referential; left unresolved");
                    return self.clone();
                }
                match function_context().get_var(name) {
                    Some(value) => Self::Number(value),
                    None => self.clone(),
                }
            }
            Self::Unary(op, operand) => Self::unary(*op, operand.evaluate_at_depth(bindings, depth)),
            Self::Binary(op, lhs, rhs) => Self::binary(
                *op,
                lhs.evaluate_at_depth(bindings, depth),
                rhs.evaluate_at_depth(bindings, depth),
            ),
            Self::Call(name, args) => Self::call(
                name.clone(),
                args.iter()
                    .map(|arg| arg.evaluate_at_depth(bindings, depth))
                    .collect(),
            ),
        }
    }

    /// Re-applies the folding rules bottom-up.
    #[must_use]
    pub fn fold(&self) -> Expr {
        self.evaluate(&Bindings::new())
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Number(value) if *value < 0.0 => 3,
            Self::Number(_) | Self::Text(_) | Self::Ident(_) | Self::Call(..) => 5,
            Self::Unary(UnaryOp::Neg, _) => 3,
            Self::Binary(op, ..) => op.precedence(),
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "\"{text}\""),
            Self::Ident(name) => f.write_str(name),
            Self::Unary(UnaryOp::Neg, operand) => {
                f.write_str("-")?;
                operand.fmt_operand(f, operand.precedence() < 3)
            }
            Self::Binary(op, lhs, rhs) => {
                let own = op.precedence();
                let left_parens = if *op == BinaryOp::Pow {
                    lhs.precedence() <= own
                } else {
                    lhs.precedence() < own
                };
                let right_parens = match op {
                    BinaryOp::Sub | BinaryOp::Div | BinaryOp::Rem => rhs.precedence() <= own,
                    BinaryOp::Pow => rhs.precedence() < own,
                    BinaryOp::Add | BinaryOp::Mul => rhs.precedence() < own,
                };
                lhs.fmt_operand(f, left_parens)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_operand(f, right_parens)
            }
            Self::Call(name, args) => {
                write!(f, "{name}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Self) -> Self::Output {
        Self::binary(BinaryOp::Div, self, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Self::Output {
        Self::unary(UnaryOp::Neg, self)
    }
}

/// meval's builtin functions and constants plus the C spellings that show up
/// in instrument files.
fn function_context() -> Context<'static> {
    let mut context = Context::new();
    context.func("fabs", f64::abs);
    context.func("log", f64::ln);
    context.func("log10", f64::log10);
    context.func2("pow", f64::powf);
    context.func2("fmod", |a, b| a % b);
    context.var("PI", std::f64::consts::PI);
    context.var("M_PI", std::f64::consts::PI);
    context.var("DEG2RAD", std::f64::consts::PI / 180.0);
    context.var("RAD2DEG", 180.0 / std::f64::consts::PI);
    context
}
