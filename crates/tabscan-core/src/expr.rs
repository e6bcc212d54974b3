//! Expression AST, binding, and elementwise evaluation.
//!
//! The AST can only express column references, literals, operators and
//! calls to the closed [`Function`] set. There is no node for anything else,
//! so a parsed expression cannot reach outside the table it is evaluated on.
//! Parsing lives in [`crate::parse`]; placeholder templates in
//! [`crate::template`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Column, Scalar, Table};

/// Binary operators for expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Comparison operators
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical operators
    And,
    Or,
    // Arithmetic operators
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    /// Parse a binary operator from its textual form.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "==" | "=" => Some(BinOp::Eq),
            "!=" | "<>" => Some(BinOp::Ne),
            "<" => Some(BinOp::Lt),
            "<=" => Some(BinOp::Le),
            ">" => Some(BinOp::Gt),
            ">=" => Some(BinOp::Ge),
            "&" | "&&" => Some(BinOp::And),
            "|" | "||" => Some(BinOp::Or),
            "+" => Some(BinOp::Add),
            "-" => Some(BinOp::Sub),
            "*" => Some(BinOp::Mul),
            "/" => Some(BinOp::Div),
            "//" => Some(BinOp::FloorDiv),
            "%" => Some(BinOp::Mod),
            "**" => Some(BinOp::Pow),
            _ if op.eq_ignore_ascii_case("and") => Some(BinOp::And),
            _ if op.eq_ignore_ascii_case("or") => Some(BinOp::Or),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// Unary operators for expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// The closed set of callable functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    Abs,
    Sqrt,
    Exp,
    Ln,
    Log10,
    Floor,
    Ceil,
    Round,
    Pow,
    Min,
    Max,
    Lower,
    Upper,
    Len,
    Concat,
    Coalesce,
    IsNull,
    IsNotNull,
    IfElse,
}

impl Function {
    pub const ALL: [Function; 19] = [
        Function::Abs,
        Function::Sqrt,
        Function::Exp,
        Function::Ln,
        Function::Log10,
        Function::Floor,
        Function::Ceil,
        Function::Round,
        Function::Pow,
        Function::Min,
        Function::Max,
        Function::Lower,
        Function::Upper,
        Function::Len,
        Function::Concat,
        Function::Coalesce,
        Function::IsNull,
        Function::IsNotNull,
        Function::IfElse,
    ];

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Pow => "pow",
            Function::Min => "min",
            Function::Max => "max",
            Function::Lower => "lower",
            Function::Upper => "upper",
            Function::Len => "len",
            Function::Concat => "concat",
            Function::Coalesce => "coalesce",
            Function::IsNull => "is_null",
            Function::IsNotNull => "is_not_null",
            Function::IfElse => "if_else",
        }
    }

    /// Accepted argument counts as `(min, max)`; `None` means variadic.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Function::Round => (1, Some(2)),
            Function::Pow => (2, Some(2)),
            Function::IfElse => (3, Some(3)),
            Function::Min | Function::Max | Function::Concat | Function::Coalesce => (1, None),
            _ => (1, Some(1)),
        }
    }
}

/// Expression AST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a column by name.
    Column(String),
    Literal(Scalar),
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        arg: Box<Expr>,
    },
    Call {
        func: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn lit(value: impl Into<Scalar>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Referenced column names, first occurrence order, no duplicates.
    pub fn columns(&self) -> Vec<&str> {
        fn walk<'a>(e: &'a Expr, out: &mut Vec<&'a str>) {
            match e {
                Expr::Column(name) => {
                    if !out.contains(&name.as_str()) {
                        out.push(name);
                    }
                }
                Expr::Literal(_) => {}
                Expr::BinaryOp { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
                Expr::UnaryOp { arg, .. } => walk(arg, out),
                Expr::Call { args, .. } => args.iter().for_each(|a| walk(a, out)),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Resolve every column reference against `available` (ordered names).
    pub fn bind(&self, available: &[String]) -> Result<BoundExpr> {
        Ok(match self {
            Expr::Column(name) => {
                let idx = available.iter().position(|a| a == name).ok_or_else(|| {
                    Error::UnknownColumnReference {
                        column: name.clone(),
                        available: available.to_vec(),
                    }
                })?;
                BoundExpr::Column(idx)
            }
            Expr::Literal(v) => BoundExpr::Literal(v.clone()),
            Expr::BinaryOp { op, left, right } => BoundExpr::BinaryOp {
                op: *op,
                left: Box::new(left.bind(available)?),
                right: Box::new(right.bind(available)?),
            },
            Expr::UnaryOp { op, arg } => BoundExpr::UnaryOp {
                op: *op,
                arg: Box::new(arg.bind(available)?),
            },
            Expr::Call { func, args } => {
                let (min, max) = func.arity();
                if args.len() < min || max.is_some_and(|m| args.len() > m) {
                    return Err(Error::Evaluation(format!(
                        "{}() takes {} argument(s), got {}",
                        func.name(),
                        arity_text(min, max),
                        args.len()
                    )));
                }
                BoundExpr::Call {
                    func: *func,
                    args: args
                        .iter()
                        .map(|a| a.bind(available))
                        .collect::<Result<Vec<_>>>()?,
                }
            }
        })
    }
}

pub(crate) fn arity_text(min: usize, max: Option<usize>) -> String {
    match max {
        Some(m) if m == min => min.to_string(),
        Some(m) => format!("{min} to {m}"),
        None => format!("at least {min}"),
    }
}

/// An expression whose column references are positions into a table.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundExpr {
    Column(usize),
    Literal(Scalar),
    BinaryOp {
        op: BinOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    UnaryOp {
        op: UnaryOp,
        arg: Box<BoundExpr>,
    },
    Call {
        func: Function,
        args: Vec<BoundExpr>,
    },
}

impl BoundExpr {
    /// Evaluate against one row.
    pub fn evaluate(&self, table: &Table, row: usize) -> Result<Scalar> {
        match self {
            BoundExpr::Column(idx) => {
                let col = table.columns.get(*idx).ok_or_else(|| {
                    Error::Evaluation(format!("bound column {idx} missing from table"))
                })?;
                col.values
                    .get(row)
                    .cloned()
                    .ok_or_else(|| Error::Evaluation(format!("row index {row} out of bounds")))
            }
            BoundExpr::Literal(v) => Ok(v.clone()),
            BoundExpr::BinaryOp { op, left, right } => {
                let l = left.evaluate(table, row)?;
                let r = right.evaluate(table, row)?;
                evaluate_binary_op(*op, &l, &r)
            }
            BoundExpr::UnaryOp { op, arg } => {
                let v = arg.evaluate(table, row)?;
                evaluate_unary_op(*op, &v)
            }
            BoundExpr::Call { func, args } => evaluate_call(*func, args, table, row),
        }
    }

    /// Evaluate for every row of `table`, producing a column called `name`.
    ///
    /// A constant expression yields one value per row.
    pub fn evaluate_column(&self, table: &Table, name: &str) -> Result<Column> {
        let rows = table.num_rows();
        let mut values = Vec::with_capacity(rows);
        for row in 0..rows {
            values.push(self.evaluate(table, row)?);
        }
        Ok(Column::new(name, values))
    }
}

// --- numeric helpers ---

#[derive(Debug, Clone, Copy)]
enum Num {
    Int { v: i64, narrow: bool },
    Float { v: f64, narrow: bool },
}

impl Num {
    fn of(s: &Scalar) -> Option<Num> {
        match s {
            Scalar::I32(v) => Some(Num::Int {
                v: *v as i64,
                narrow: true,
            }),
            Scalar::I64(v) => Some(Num::Int {
                v: *v,
                narrow: false,
            }),
            Scalar::F32(v) => Some(Num::Float {
                v: *v as f64,
                narrow: true,
            }),
            Scalar::F64(v) => Some(Num::Float {
                v: *v,
                narrow: false,
            }),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int { v, .. } => v as f64,
            Num::Float { v, .. } => v,
        }
    }

    fn is_narrow_float(self) -> bool {
        matches!(self, Num::Float { narrow: true, .. })
    }
}

fn int_scalar(v: i64, narrow: bool) -> Result<Scalar> {
    if narrow {
        i32::try_from(v)
            .map(Scalar::I32)
            .map_err(|_| Error::Evaluation(format!("integer overflow: {v} does not fit Int32")))
    } else {
        Ok(Scalar::I64(v))
    }
}

fn float_scalar(v: f64, narrow: bool) -> Scalar {
    if narrow {
        Scalar::F32(v as f32)
    } else {
        Scalar::F64(v)
    }
}

fn overflow(op: BinOp, a: i64, b: i64) -> Error {
    Error::Evaluation(format!("integer overflow in {a} {} {b}", op.symbol()))
}

fn type_name(s: &Scalar) -> String {
    s.data_type().to_string()
}

fn mismatch(op: &str, l: &Scalar, r: &Scalar) -> Error {
    Error::Evaluation(format!(
        "unsupported operand types for {op}: {} and {}",
        type_name(l),
        type_name(r)
    ))
}

fn floor_div_i64(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn mod_i64(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

/// Evaluate a binary operation. Nulls propagate; `and`/`or` use three-valued logic.
fn evaluate_binary_op(op: BinOp, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    match op {
        BinOp::And | BinOp::Or => logical(op, left, right),
        _ if left.is_null() || right.is_null() => Ok(Scalar::Null),
        _ if op.is_comparison() => {
            let ord = compare(left, right, op.symbol())?;
            let b = match op {
                BinOp::Eq => ord == Some(Ordering::Equal),
                BinOp::Ne => ord != Some(Ordering::Equal),
                BinOp::Lt => ord == Some(Ordering::Less),
                BinOp::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
                BinOp::Gt => ord == Some(Ordering::Greater),
                BinOp::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
                _ => unreachable!("non-comparison operator in comparison arm"),
            };
            Ok(Scalar::Bool(b))
        }
        BinOp::Add => {
            if let (Scalar::Str(a), Scalar::Str(b)) = (left, right) {
                return Ok(Scalar::Str(format!("{a}{b}")));
            }
            arithmetic(op, left, right)
        }
        _ => arithmetic(op, left, right),
    }
}

fn arithmetic(op: BinOp, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    let (a, b) = match (Num::of(left), Num::of(right)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(mismatch(op.symbol(), left, right)),
    };
    let narrow_float = a.is_narrow_float() && b.is_narrow_float();

    if let (Num::Int { v: x, narrow: nx }, Num::Int { v: y, narrow: ny }) = (a, b) {
        let narrow = nx && ny;
        return match op {
            BinOp::Add => int_scalar(x.checked_add(y).ok_or_else(|| overflow(op, x, y))?, narrow),
            BinOp::Sub => int_scalar(x.checked_sub(y).ok_or_else(|| overflow(op, x, y))?, narrow),
            BinOp::Mul => int_scalar(x.checked_mul(y).ok_or_else(|| overflow(op, x, y))?, narrow),
            BinOp::Div => Ok(Scalar::F64(x as f64 / y as f64)),
            BinOp::FloorDiv => match (y, floor_div_i64(x, y)) {
                (0, _) => Ok(Scalar::Null),
                (_, Some(q)) => int_scalar(q, narrow),
                (_, None) => Err(overflow(op, x, y)),
            },
            BinOp::Mod => match (y, mod_i64(x, y)) {
                (0, _) => Ok(Scalar::Null),
                (_, Some(r)) => int_scalar(r, narrow),
                (_, None) => Err(overflow(op, x, y)),
            },
            BinOp::Pow => {
                if y >= 0 {
                    let exp = u32::try_from(y).map_err(|_| overflow(op, x, y))?;
                    int_scalar(x.checked_pow(exp).ok_or_else(|| overflow(op, x, y))?, narrow)
                } else {
                    Ok(Scalar::F64((x as f64).powf(y as f64)))
                }
            }
            _ => Err(mismatch(op.symbol(), left, right)),
        };
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let v = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => x / y,
        BinOp::FloorDiv => {
            if y == 0.0 {
                return Ok(Scalar::Null);
            }
            (x / y).floor()
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Ok(Scalar::Null);
            }
            x - y * (x / y).floor()
        }
        BinOp::Pow => x.powf(y),
        _ => return Err(mismatch(op.symbol(), left, right)),
    };
    Ok(float_scalar(v, narrow_float))
}

fn logical(op: BinOp, left: &Scalar, right: &Scalar) -> Result<Scalar> {
    let as_bool = |s: &Scalar| -> Result<Option<bool>> {
        match s {
            Scalar::Null => Ok(None),
            Scalar::Bool(b) => Ok(Some(*b)),
            _ => Err(mismatch(op.symbol(), left, right)),
        }
    };
    let (l, r) = (as_bool(left)?, as_bool(right)?);
    let out = match op {
        BinOp::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        _ => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    Ok(out.map(Scalar::Bool).unwrap_or(Scalar::Null))
}

/// Order two non-null scalars. `None` for unordered floats (NaN).
fn compare(left: &Scalar, right: &Scalar, op: &str) -> Result<Option<Ordering>> {
    if let (Some(a), Some(b)) = (Num::of(left), Num::of(right)) {
        return Ok(match (a, b) {
            (Num::Int { v: x, .. }, Num::Int { v: y, .. }) => Some(x.cmp(&y)),
            _ => a.as_f64().partial_cmp(&b.as_f64()),
        });
    }
    match (left, right) {
        (Scalar::Str(a), Scalar::Str(b)) => Ok(Some(a.cmp(b))),
        (Scalar::Bool(a), Scalar::Bool(b)) => Ok(Some(a.cmp(b))),
        (Scalar::Bin(a), Scalar::Bin(b)) => Ok(Some(a.cmp(b))),
        _ => Err(mismatch(op, left, right)),
    }
}

/// Evaluate a unary operation.
fn evaluate_unary_op(op: UnaryOp, arg: &Scalar) -> Result<Scalar> {
    match (op, arg) {
        (_, Scalar::Null) => Ok(Scalar::Null),
        (UnaryOp::Not, Scalar::Bool(b)) => Ok(Scalar::Bool(!b)),
        (UnaryOp::Neg, Scalar::I32(v)) => v
            .checked_neg()
            .map(Scalar::I32)
            .ok_or_else(|| Error::Evaluation(format!("integer overflow negating {v}"))),
        (UnaryOp::Neg, Scalar::I64(v)) => v
            .checked_neg()
            .map(Scalar::I64)
            .ok_or_else(|| Error::Evaluation(format!("integer overflow negating {v}"))),
        (UnaryOp::Neg, Scalar::F32(v)) => Ok(Scalar::F32(-v)),
        (UnaryOp::Neg, Scalar::F64(v)) => Ok(Scalar::F64(-v)),
        (op, other) => Err(Error::Evaluation(format!(
            "unsupported operand type for {}: {}",
            match op {
                UnaryOp::Not => "not",
                UnaryOp::Neg => "unary -",
            },
            type_name(other)
        ))),
    }
}

fn evaluate_call(func: Function, args: &[BoundExpr], table: &Table, row: usize) -> Result<Scalar> {
    // Branching functions only evaluate what they need.
    match func {
        Function::IfElse => {
            let cond = nth(func, args, 0)?.evaluate(table, row)?;
            return match cond {
                Scalar::Bool(true) => nth(func, args, 1)?.evaluate(table, row),
                Scalar::Bool(false) | Scalar::Null => nth(func, args, 2)?.evaluate(table, row),
                other => Err(Error::Evaluation(format!(
                    "if_else condition must be Boolean, got {}",
                    type_name(&other)
                ))),
            };
        }
        Function::Coalesce => {
            for a in args {
                let v = a.evaluate(table, row)?;
                if !v.is_null() {
                    return Ok(v);
                }
            }
            return Ok(Scalar::Null);
        }
        _ => {}
    }

    let values = args
        .iter()
        .map(|a| a.evaluate(table, row))
        .collect::<Result<Vec<_>>>()?;

    match func {
        Function::IsNull => Ok(Scalar::Bool(nth(func, &values, 0)?.is_null())),
        Function::IsNotNull => Ok(Scalar::Bool(!nth(func, &values, 0)?.is_null())),
        Function::Min | Function::Max => extremum(func, &values),
        Function::Concat => {
            if values.iter().any(Scalar::is_null) {
                return Ok(Scalar::Null);
            }
            Ok(Scalar::Str(values.iter().map(|v| v.to_string()).collect()))
        }
        _ if values.iter().any(Scalar::is_null) => Ok(Scalar::Null),
        Function::Lower | Function::Upper | Function::Len => string_fn(func, nth(func, &values, 0)?),
        Function::Pow => {
            evaluate_binary_op(BinOp::Pow, nth(func, &values, 0)?, nth(func, &values, 1)?)
        }
        Function::Round => {
            let decimals = match values.get(1) {
                None => 0,
                Some(Scalar::I32(d)) => *d as i64,
                Some(Scalar::I64(d)) => *d,
                Some(other) => {
                    return Err(Error::Evaluation(format!(
                        "round decimals must be an integer, got {}",
                        type_name(other)
                    )))
                }
            };
            numeric_fn(func, nth(func, &values, 0)?, decimals)
        }
        _ => numeric_fn(func, nth(func, &values, 0)?, 0),
    }
}

/// Argument `i` of a call. Parsed and bound calls always have enough; a
/// hand-built [`BoundExpr`] may not.
fn nth<T>(func: Function, args: &[T], i: usize) -> Result<&T> {
    args.get(i).ok_or_else(|| {
        let (min, max) = func.arity();
        Error::Evaluation(format!(
            "{}() takes {} argument(s), got {}",
            func.name(),
            arity_text(min, max),
            args.len()
        ))
    })
}

fn numeric_fn(func: Function, arg: &Scalar, decimals: i64) -> Result<Scalar> {
    let n = Num::of(arg).ok_or_else(|| {
        Error::Evaluation(format!(
            "{} expects a numeric argument, got {}",
            func.name(),
            type_name(arg)
        ))
    })?;
    match (func, n) {
        (Function::Abs, Num::Int { v, narrow }) => int_scalar(
            v.checked_abs()
                .ok_or_else(|| Error::Evaluation(format!("integer overflow in abs({v})")))?,
            narrow,
        ),
        (Function::Floor | Function::Ceil | Function::Round, Num::Int { .. }) => Ok(arg.clone()),
        (_, n) => {
            let x = n.as_f64();
            let narrow = n.is_narrow_float();
            let v = match func {
                Function::Abs => x.abs(),
                Function::Floor => x.floor(),
                Function::Ceil => x.ceil(),
                Function::Round => {
                    let factor = 10f64.powi(decimals.clamp(-300, 300) as i32);
                    (x * factor).round() / factor
                }
                Function::Sqrt => return Ok(Scalar::F64(x.sqrt())),
                Function::Exp => return Ok(Scalar::F64(x.exp())),
                Function::Ln => return Ok(Scalar::F64(x.ln())),
                Function::Log10 => return Ok(Scalar::F64(x.log10())),
                other => {
                    return Err(Error::Evaluation(format!(
                        "{} is not a numeric function",
                        other.name()
                    )))
                }
            };
            Ok(float_scalar(v, narrow))
        }
    }
}

fn string_fn(func: Function, arg: &Scalar) -> Result<Scalar> {
    match (func, arg) {
        (Function::Lower, Scalar::Str(s)) => Ok(Scalar::Str(s.to_lowercase())),
        (Function::Upper, Scalar::Str(s)) => Ok(Scalar::Str(s.to_uppercase())),
        (Function::Len, Scalar::Str(s)) => Ok(Scalar::I64(s.chars().count() as i64)),
        (Function::Len, Scalar::Bin(b)) => Ok(Scalar::I64(b.len() as i64)),
        (f, other) => Err(Error::Evaluation(format!(
            "{} expects a string argument, got {}",
            f.name(),
            type_name(other)
        ))),
    }
}

/// Horizontal min/max ignoring nulls; all-null yields null.
fn extremum(func: Function, values: &[Scalar]) -> Result<Scalar> {
    let mut best: Option<&Scalar> = None;
    for v in values.iter().filter(|v| !v.is_null()) {
        best = match best {
            None => Some(v),
            Some(cur) => {
                let ord = compare(v, cur, func.name())?;
                let better = match func {
                    Function::Min => ord == Some(Ordering::Less),
                    _ => ord == Some(Ordering::Greater),
                };
                Some(if better { v } else { cur })
            }
        };
    }
    Ok(best.cloned().unwrap_or(Scalar::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_table() -> Table {
        Table::try_new(vec![]).unwrap()
    }

    fn eval(e: &Expr) -> Result<Scalar> {
        let t = Table::try_new(vec![Column::new("x", vec![Scalar::I32(0)])]).unwrap();
        e.bind(&t.column_names())?.evaluate(&t, 0)
    }

    #[test]
    fn python_style_floor_division_and_modulo() {
        let e = Expr::binary(BinOp::FloorDiv, Expr::lit(-7i64), Expr::lit(2i64));
        assert_eq!(eval(&e).unwrap(), Scalar::I64(-4));
        let e = Expr::binary(BinOp::Mod, Expr::lit(-7i64), Expr::lit(2i64));
        assert_eq!(eval(&e).unwrap(), Scalar::I64(1));
        let e = Expr::binary(BinOp::Mod, Expr::lit(7i64), Expr::lit(0i64));
        assert_eq!(eval(&e).unwrap(), Scalar::Null);
    }

    #[test]
    fn true_division_yields_float() {
        let e = Expr::binary(BinOp::Div, Expr::lit(7i64), Expr::lit(2i64));
        assert_eq!(eval(&e).unwrap(), Scalar::F64(3.5));
    }

    #[test]
    fn kleene_logic() {
        let null = Expr::Literal(Scalar::Null);
        let e = Expr::binary(BinOp::And, null.clone(), Expr::lit(false));
        assert_eq!(eval(&e).unwrap(), Scalar::Bool(false));
        let e = Expr::binary(BinOp::Or, null.clone(), Expr::lit(false));
        assert_eq!(eval(&e).unwrap(), Scalar::Null);
        let e = Expr::binary(BinOp::Or, null, Expr::lit(true));
        assert_eq!(eval(&e).unwrap(), Scalar::Bool(true));
    }

    #[test]
    fn mixed_comparison_is_an_error() {
        let e = Expr::binary(BinOp::Eq, Expr::lit("a"), Expr::lit(1i64));
        assert!(matches!(eval(&e), Err(Error::Evaluation(_))));
    }

    #[test]
    fn int32_overflow_is_reported() {
        let e = Expr::binary(BinOp::Mul, Expr::lit(i32::MAX), Expr::lit(2i32));
        assert!(matches!(eval(&e), Err(Error::Evaluation(_))));
    }

    #[test]
    fn bind_reports_available_columns() {
        let err = Expr::col("z").bind(&["a".into(), "b".into()]).unwrap_err();
        match err {
            Error::UnknownColumnReference { column, available } => {
                assert_eq!(column, "z");
                assert_eq!(available, vec!["a", "b"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn constant_over_empty_table() {
        let col = Expr::lit(1i64)
            .bind(&[])
            .unwrap()
            .evaluate_column(&empty_table(), "c")
            .unwrap();
        assert!(col.is_empty());
    }

    #[test]
    fn float_floor_division_and_modulo() {
        let e = Expr::binary(BinOp::FloorDiv, Expr::lit(7.5), Expr::lit(2i64));
        assert_eq!(eval(&e).unwrap(), Scalar::F64(3.0));
        let e = Expr::binary(BinOp::Mod, Expr::lit(-7.5), Expr::lit(2i64));
        assert_eq!(eval(&e).unwrap(), Scalar::F64(0.5));
        let e = Expr::binary(BinOp::FloorDiv, Expr::lit(1.0), Expr::lit(0.0));
        assert_eq!(eval(&e).unwrap(), Scalar::Null);
    }

    #[test]
    fn power_chain_evaluates_right_to_left() {
        let e = Expr::binary(
            BinOp::Pow,
            Expr::lit(2i64),
            Expr::binary(BinOp::Pow, Expr::lit(3i64), Expr::lit(2i64)),
        );
        assert_eq!(eval(&e).unwrap(), Scalar::I64(512));
    }

    #[test]
    fn round_with_decimals() {
        let round = |args: Vec<Expr>| {
            eval(&Expr::Call {
                func: Function::Round,
                args,
            })
        };
        assert_eq!(round(vec![Expr::lit(3.14159), Expr::lit(2i64)]).unwrap(), Scalar::F64(3.14));
        assert_eq!(round(vec![Expr::lit(2.5)]).unwrap(), Scalar::F64(3.0));
        assert_eq!(round(vec![Expr::lit(7i64), Expr::lit(1i64)]).unwrap(), Scalar::I64(7));
        assert!(matches!(
            round(vec![Expr::lit(1.5), Expr::lit(0.5)]),
            Err(Error::Evaluation(_))
        ));
    }

    #[test]
    fn hand_built_call_missing_arguments() {
        let t = empty_table();
        for func in [Function::IfElse, Function::Abs, Function::Pow, Function::IsNull] {
            let call = BoundExpr::Call { func, args: vec![] };
            assert!(
                matches!(call.evaluate(&t, 0), Err(Error::Evaluation(_))),
                "{}",
                func.name()
            );
        }
    }
}
