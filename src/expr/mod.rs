//! # Expression tree
//!
//! Column expressions used as grouping keys and as aggregations. Expressions
//! are plain values; evaluation happens in [`eval`] for the element-wise
//! context and in the aggregation dispatcher for the per-group context.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use crate::core::column::DataType;
use crate::core::data_value::DataValue;

pub mod eval;

/// Represents an expression over the columns of a table
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(String),
    /// Every non-key column; expanded before evaluation
    Wildcard,
    /// Literal value
    Literal(DataValue),
    /// Renames the output of the inner expression
    Alias(Box<Expr>, String),
    /// Binary operation
    BinaryExpr {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },
    /// Reduction of the input to one value per group
    Agg { input: Box<Expr>, func: AggFunc },
    /// Number of rows in the group
    Count,
}

/// Types of binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    /// True division, always producing floats
    Divide,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
        )
    }
}

/// Interpolation used by quantiles that fall between two values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantileInterpolation {
    #[default]
    Nearest,
    Lower,
    Higher,
    Midpoint,
    Linear,
}

/// Per-group reductions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggFunc {
    Sum,
    Mean,
    Min,
    Max,
    First,
    Last,
    /// Non-null values
    Count,
    NUnique,
    Median,
    Quantile(f64, QuantileInterpolation),
    /// Sample standard deviation
    Std,
    /// Sample variance
    Var,
    /// Collect the values into one list
    List,
}

impl AggFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::First => "first",
            AggFunc::Last => "last",
            AggFunc::Count => "count",
            AggFunc::NUnique => "n_unique",
            AggFunc::Median => "median",
            AggFunc::Quantile(..) => "quantile",
            AggFunc::Std => "std",
            AggFunc::Var => "var",
            AggFunc::List => "list",
        }
    }
}

/// Creates a column reference
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Selects every column that is not a grouping key
pub fn all() -> Expr {
    Expr::Wildcard
}

/// Creates a literal value
pub fn lit<T: Into<DataValue>>(value: T) -> Expr {
    Expr::Literal(value.into())
}

/// Number of rows per group
pub fn count() -> Expr {
    Expr::Count
}

impl Expr {
    /// Creates a binary operation
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Self::BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn agg(self, func: AggFunc) -> Self {
        Self::Agg {
            input: Box::new(self),
            func,
        }
    }

    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias(Box::new(self), name.into())
    }

    pub fn cast(self, data_type: DataType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            data_type,
        }
    }

    pub fn sum(self) -> Self {
        self.agg(AggFunc::Sum)
    }

    pub fn mean(self) -> Self {
        self.agg(AggFunc::Mean)
    }

    pub fn min(self) -> Self {
        self.agg(AggFunc::Min)
    }

    pub fn max(self) -> Self {
        self.agg(AggFunc::Max)
    }

    pub fn first(self) -> Self {
        self.agg(AggFunc::First)
    }

    pub fn last(self) -> Self {
        self.agg(AggFunc::Last)
    }

    /// Number of non-null values
    pub fn count(self) -> Self {
        self.agg(AggFunc::Count)
    }

    pub fn n_unique(self) -> Self {
        self.agg(AggFunc::NUnique)
    }

    pub fn median(self) -> Self {
        self.agg(AggFunc::Median)
    }

    pub fn quantile(self, q: f64, interpolation: QuantileInterpolation) -> Self {
        self.agg(AggFunc::Quantile(q, interpolation))
    }

    pub fn std(self) -> Self {
        self.agg(AggFunc::Std)
    }

    pub fn var(self) -> Self {
        self.agg(AggFunc::Var)
    }

    /// Collect each group's values into a list
    pub fn list(self) -> Self {
        self.agg(AggFunc::List)
    }

    pub fn eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::Equal, other)
    }

    pub fn neq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::NotEqual, other)
    }

    pub fn lt(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::LessThan, other)
    }

    pub fn lt_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::LessThanOrEqual, other)
    }

    pub fn gt(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::GreaterThan, other)
    }

    pub fn gt_eq(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::GreaterThanOrEqual, other)
    }

    pub fn and(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::And, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Self::binary(self, BinaryOperator::Or, other)
    }

    /// Name of the column this expression produces.
    ///
    /// Alias wins, otherwise the leftmost root column; `None` only for a bare
    /// wildcard, which must be expanded first.
    pub fn output_name(&self) -> Option<String> {
        match self {
            Expr::Alias(_, name) => Some(name.clone()),
            Expr::Column(name) => Some(name.clone()),
            Expr::Wildcard => None,
            Expr::Literal(_) => Some("literal".to_string()),
            Expr::Count => Some("count".to_string()),
            Expr::BinaryExpr { left, .. } => left.output_name(),
            Expr::Cast { expr, .. } => expr.output_name(),
            Expr::Agg { input, .. } => input.output_name(),
        }
    }

    /// Column names referenced anywhere in the tree, in first-seen order
    pub fn root_columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Column(name) = e {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
        });
        out
    }

    /// True when the tree contains a reduction or a row count
    pub fn has_aggregation(&self) -> bool {
        let mut found = false;
        self.visit(&mut |e| {
            if matches!(e, Expr::Agg { .. } | Expr::Count) {
                found = true;
            }
        });
        found
    }

    pub fn has_wildcard(&self) -> bool {
        let mut found = false;
        self.visit(&mut |e| {
            if matches!(e, Expr::Wildcard) {
                found = true;
            }
        });
        found
    }

    /// True when the tree is built from literals only
    pub fn is_literal_only(&self) -> bool {
        let mut literal = true;
        self.visit(&mut |e| {
            if matches!(e, Expr::Column(_) | Expr::Wildcard | Expr::Count) {
                literal = false;
            }
        });
        literal
    }

    /// One copy of the expression per column name, with the wildcard
    /// replaced by that column. Expressions without a wildcard pass through.
    pub fn expand_wildcard(&self, columns: &[String]) -> Vec<Expr> {
        if !self.has_wildcard() {
            return vec![self.clone()];
        }
        columns
            .iter()
            .map(|name| self.replace_wildcard(name))
            .collect()
    }

    fn replace_wildcard(&self, name: &str) -> Expr {
        match self {
            Expr::Wildcard => Expr::Column(name.to_string()),
            Expr::Column(_) | Expr::Literal(_) | Expr::Count => self.clone(),
            Expr::Alias(inner, alias) => {
                Expr::Alias(Box::new(inner.replace_wildcard(name)), alias.clone())
            }
            Expr::BinaryExpr { left, op, right } => Expr::BinaryExpr {
                left: Box::new(left.replace_wildcard(name)),
                op: *op,
                right: Box::new(right.replace_wildcard(name)),
            },
            Expr::Cast { expr, data_type } => Expr::Cast {
                expr: Box::new(expr.replace_wildcard(name)),
                data_type: data_type.clone(),
            },
            Expr::Agg { input, func } => Expr::Agg {
                input: Box::new(input.replace_wildcard(name)),
                func: *func,
            },
        }
    }

    fn visit<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match self {
            Expr::Column(_) | Expr::Wildcard | Expr::Literal(_) | Expr::Count => {}
            Expr::Alias(inner, _) => inner.visit(f),
            Expr::BinaryExpr { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Expr::Cast { expr, .. } => expr.visit(f),
            Expr::Agg { input, .. } => input.visit(f),
        }
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        col(name)
    }
}

impl From<String> for Expr {
    fn from(name: String) -> Self {
        col(name)
    }
}

macro_rules! impl_arith {
    ($trait:ident, $method:ident, $op:expr) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary(self, $op, rhs)
            }
        }
    };
}

impl_arith!(Add, add, BinaryOperator::Add);
impl_arith!(Sub, sub, BinaryOperator::Subtract);
impl_arith!(Mul, mul, BinaryOperator::Multiply);
impl_arith!(Div, div, BinaryOperator::Divide);

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::And => "&",
            Self::Or => "|",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(name) => write!(f, "col(\"{}\")", name),
            Self::Wildcard => write!(f, "*"),
            Self::Literal(value) => write!(f, "lit({})", value),
            Self::Alias(expr, name) => write!(f, "{}.alias(\"{}\")", expr, name),
            Self::BinaryExpr { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Self::Cast { expr, data_type } => write!(f, "{}.cast({})", expr, data_type),
            Self::Agg { input, func } => write!(f, "{}.{}()", input, func.name()),
            Self::Count => write!(f, "count()"),
        }
    }
}
