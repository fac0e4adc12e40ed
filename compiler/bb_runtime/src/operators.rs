//! Builtin operator dispatch.
//!
//! Operators resolve on the operator and the types of their operands. Every
//! combination not listed here fails with an error naming both. Struct
//! operands are not handled here: the interpreter first looks for an
//! overloading field on the struct and only falls back to this table when
//! there is none.

use std::cmp::Ordering;

use bb_ir::Operator;

use crate::errors::{
    failed, index_out_of_range, modulo_by_zero, unsupported_operator, EvalError, EvalResult,
};
use crate::value::{FileValue, ListValue, NumVector, Value};

/// Apply `op` to `args`.
///
/// Returns `None` for operators that only have an effect (`push`, `put`)
/// and for `pop`/`next` on an empty list.
pub fn dispatch(op: Operator, args: &[Value]) -> EvalResult<Option<Value>> {
    if let Some(Value::Error(error)) = args.iter().find(|v| v.is_error()) {
        return Err(failed(error.message()));
    }
    match args {
        [a] => unary(op, a),
        [a, b] => binary(op, a, b),
        [a, b, c] => ternary(op, a, b, c),
        _ => {
            let names: Vec<&'static str> = args.iter().map(Value::type_name).collect();
            Err(unsupported_operator(op, &names))
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    reason = "conversions follow C-style numeric semantics"
)]
fn unary(op: Operator, a: &Value) -> EvalResult<Option<Value>> {
    let value = match (op, a) {
        (Operator::Not, Value::Bool(b)) => Value::Bool(!b),

        (Operator::Len, Value::Str(s)) => Value::Int(s.chars().count() as i64),
        (Operator::Len, Value::List(l)) => Value::Int(l.len() as i64),
        (Operator::Len, Value::Vector(v)) => Value::Int(v.len() as i64),
        (Operator::Len, Value::File(f)) => Value::Int(f.lines()?.len() as i64),

        (Operator::Pop, Value::List(l)) => return Ok(l.pop()),
        (Operator::Next, Value::List(l)) => return Ok(l.next()),

        (Operator::ToVector, Value::Int(n)) => Value::Vector(NumVector::zeros(&[extent(*n)?])?),
        (Operator::ToVector, Value::List(l)) => Value::Vector(list_to_vector(l)?),
        (Operator::ToVector, Value::Vector(v)) => Value::Vector(v.copy()),

        (Operator::ToInt, Value::Int(n)) => Value::Int(*n),
        (Operator::ToInt, Value::Float(x)) => Value::Int(*x as i64),
        (Operator::ToInt, Value::Bool(b)) => Value::Int(i64::from(*b)),
        (Operator::ToInt, Value::Str(s)) => Value::Int(
            s.trim()
                .parse()
                .map_err(|_| EvalError::new(format!("Cannot convert \"{s}\" to int")))?,
        ),

        (Operator::ToFloat, Value::Float(x)) => Value::Float(*x),
        (Operator::ToFloat, Value::Bool(b)) => Value::Float(if *b { 1.0 } else { 0.0 }),
        (Operator::ToFloat, Value::Str(s)) => Value::Float(
            s.trim()
                .parse()
                .map_err(|_| EvalError::new(format!("Cannot convert \"{s}\" to float")))?,
        ),
        (Operator::ToFloat, Value::Int(n)) => Value::Float(*n as f64),

        (Operator::ToStr, Value::File(f)) => Value::string(f.contents()?),
        (Operator::ToStr, other) => Value::string(other.to_string()),

        (Operator::ToBool, Value::Bool(b)) => Value::Bool(*b),
        (Operator::ToBool, Value::Int(n)) => Value::Bool(*n != 0),
        (Operator::ToBool, Value::Float(x)) => Value::Bool(*x != 0.0),
        (Operator::ToBool, Value::Str(s)) => match s.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(EvalError::new(format!("Cannot convert \"{s}\" to bool"))),
        },

        (Operator::ToFile, Value::Str(s)) => Value::File(FileValue::new(s.to_string())?),
        (Operator::ToFile, Value::File(f)) => Value::File(f.clone()),

        (Operator::Copy, other) => other.shallow_copy()?,

        (Operator::Sum, Value::Vector(v)) => Value::Float(v.sum()),
        (Operator::Sum, Value::List(l)) => fold_numeric(op, &l.snapshot(), |acc, x| acc + x)?,
        (Operator::Max | Operator::Min, Value::Vector(v)) => {
            let extreme = if op == Operator::Max { v.max() } else { v.min() };
            Value::Float(extreme.ok_or_else(|| EvalError::new("Empty vector has no extreme"))?)
        }
        (Operator::Max | Operator::Min, Value::List(l)) => list_extreme(op, &l.snapshot())?,

        (Operator::Shape, Value::Vector(v)) => Value::list(
            v.shape()
                .iter()
                .map(|&d| Value::Int(d as i64))
                .collect(),
        ),

        (Operator::Log, Value::Vector(v)) => Value::Vector(v.map(f64::ln)),
        (Operator::Log, Value::Int(n)) => Value::Float((*n as f64).ln()),
        (Operator::Log, Value::Float(x)) => Value::Float(x.ln()),

        _ => return Err(unsupported_operator(op, &[a.type_name()])),
    };
    Ok(Some(value))
}

fn binary(op: Operator, a: &Value, b: &Value) -> EvalResult<Option<Value>> {
    let unsupported = || unsupported_operator(op, &[a.type_name(), b.type_name()]);

    let value = match (op, a, b) {
        (Operator::And, Value::Bool(x), Value::Bool(y)) => Value::Bool(*x && *y),
        (Operator::Or, Value::Bool(x), Value::Bool(y)) => Value::Bool(*x || *y),

        (Operator::Eq | Operator::Neq, _, _) => {
            let equal = scalar_eq(a, b).ok_or_else(unsupported)?;
            Value::Bool(equal == (op == Operator::Eq))
        }
        (Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge, _, _) => {
            let ordering = scalar_cmp(a, b).ok_or_else(unsupported)?;
            Value::Bool(match op {
                Operator::Lt => ordering == Ordering::Less,
                Operator::Le => ordering != Ordering::Greater,
                Operator::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }

        (Operator::Add, Value::Str(x), Value::Str(y)) => Value::string(format!("{x}{y}")),
        (
            Operator::Add
            | Operator::Sub
            | Operator::Mul
            | Operator::Div
            | Operator::Mod
            | Operator::Pow,
            _,
            _,
        ) => arithmetic(op, a, b).ok_or_else(unsupported)??,

        (Operator::Push, Value::List(list), item) => {
            list.push(item.clone());
            return Ok(None);
        }

        (Operator::At, Value::List(list), Value::Int(i)) => list.at(*i)?,
        (Operator::At, Value::Vector(v), Value::Int(i)) => v.at(*i)?,
        (Operator::At, Value::Str(s), Value::Int(i)) => {
            let ch = usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .ok_or_else(|| index_out_of_range(*i, s.chars().count()))?;
            Value::string(ch.to_string())
        }
        (Operator::At, Value::File(f), Value::Int(i)) => {
            let lines = f.lines()?;
            let line = usize::try_from(*i)
                .ok()
                .and_then(|i| lines.get(i))
                .ok_or_else(|| index_out_of_range(*i, lines.len()))?;
            Value::Str(line.clone())
        }

        (Operator::ToVector, Value::Int(rows), Value::Int(cols)) => {
            Value::Vector(NumVector::zeros(&[extent(*rows)?, extent(*cols)?])?)
        }

        _ => return Err(unsupported()),
    };
    Ok(Some(value))
}

fn ternary(op: Operator, a: &Value, b: &Value, c: &Value) -> EvalResult<Option<Value>> {
    match (op, a, b, c) {
        (Operator::Put, Value::List(list), Value::Int(i), item) => list.put(*i, item.clone())?,
        (Operator::Put, Value::Vector(v), Value::Int(i), n) if n.as_f64().is_some() => {
            v.put(*i, n.as_f64().unwrap_or(0.0))?;
        }
        _ => {
            return Err(unsupported_operator(
                op,
                &[a.type_name(), b.type_name(), c.type_name()],
            ))
        }
    }
    Ok(None)
}

/// Arithmetic over numbers and vectors. `None` when the operand types
/// have no arithmetic.
fn arithmetic(op: Operator, a: &Value, b: &Value) -> Option<EvalResult<Value>> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(int_arithmetic(op, *x, *y)),
        (Value::Vector(x), Value::Vector(y)) => {
            Some(x.zip_with(y, |l, r| float_arithmetic(op, l, r)).map(Value::Vector))
        }
        (Value::Vector(x), scalar) => {
            let r = scalar.as_f64()?;
            Some(Ok(Value::Vector(x.map(|l| float_arithmetic(op, l, r)))))
        }
        (scalar, Value::Vector(y)) => {
            let l = scalar.as_f64()?;
            Some(Ok(Value::Vector(y.map(|r| float_arithmetic(op, l, r)))))
        }
        _ => {
            let (l, r) = (a.as_f64()?, b.as_f64()?);
            Some(Ok(Value::Float(float_arithmetic(op, l, r))))
        }
    }
}

#[allow(clippy::cast_precision_loss, reason = "int division yields a float")]
fn int_arithmetic(op: Operator, x: i64, y: i64) -> EvalResult<Value> {
    let overflow = || EvalError::new(format!("Integer overflow in {op}"));
    let result = match op {
        Operator::Add => x.checked_add(y).ok_or_else(overflow)?,
        Operator::Sub => x.checked_sub(y).ok_or_else(overflow)?,
        Operator::Mul => x.checked_mul(y).ok_or_else(overflow)?,
        Operator::Div => return Ok(Value::Float(x as f64 / y as f64)),
        Operator::Mod => {
            if y == 0 {
                return Err(modulo_by_zero());
            }
            x.checked_rem(y).ok_or_else(overflow)?
        }
        Operator::Pow => match u32::try_from(y) {
            Ok(exp) => x.checked_pow(exp).ok_or_else(overflow)?,
            Err(_) => return Ok(Value::Float((x as f64).powf(y as f64))),
        },
        _ => return Err(unsupported_operator(op, &["int", "int"])),
    };
    Ok(Value::Int(result))
}

fn float_arithmetic(op: Operator, l: f64, r: f64) -> f64 {
    match op {
        Operator::Add => l + r,
        Operator::Sub => l - r,
        Operator::Mul => l * r,
        Operator::Div => l / r,
        Operator::Mod => l % r,
        _ => l.powf(r),
    }
}

#[allow(clippy::float_cmp, reason = "language equality is exact")]
fn scalar_eq(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x == y),
        (Value::Bool(x), Value::Bool(y)) => Some(x == y),
        (Value::Str(x), Value::Str(y)) => Some(x == y),
        _ => Some(a.as_f64()? == b.as_f64()?),
    }
}

fn scalar_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn extent(n: i64) -> EvalResult<usize> {
    usize::try_from(n).map_err(|_| EvalError::new(format!("Invalid vector size {n}")))
}

fn list_to_vector(list: &ListValue) -> EvalResult<NumVector> {
    list.snapshot()
        .iter()
        .map(|item| {
            item.as_f64().ok_or_else(|| {
                EvalError::new(format!(
                    "Non-numeric value of type {} in list during conversion to vector",
                    item.type_name()
                ))
            })
        })
        .collect::<EvalResult<Vec<f64>>>()
        .map(NumVector::from_vec)
}

/// Sum of a numeric list: int if every element is an int, float otherwise.
fn fold_numeric(op: Operator, items: &[Value], f: impl Fn(f64, f64) -> f64) -> EvalResult<Value> {
    if items.iter().all(|v| matches!(v, Value::Int(_))) {
        let mut total: i64 = 0;
        for item in items {
            if let Value::Int(n) = item {
                total = total
                    .checked_add(*n)
                    .ok_or_else(|| EvalError::new(format!("Integer overflow in {op}")))?;
            }
        }
        return Ok(Value::Int(total));
    }
    let mut acc = 0.0;
    for item in items {
        let x = item
            .as_f64()
            .ok_or_else(|| unsupported_operator(op, &["list", item.type_name()]))?;
        acc = f(acc, x);
    }
    Ok(Value::Float(acc))
}

fn list_extreme(op: Operator, items: &[Value]) -> EvalResult<Value> {
    let mut best: Option<&Value> = None;
    for item in items {
        let ordering = match best {
            None => {
                if item.as_f64().is_none() {
                    return Err(unsupported_operator(op, &["list", item.type_name()]));
                }
                best = Some(item);
                continue;
            }
            Some(current) => scalar_cmp(item, current)
                .ok_or_else(|| unsupported_operator(op, &["list", item.type_name()]))?,
        };
        let better = match op {
            Operator::Max => ordering == Ordering::Greater,
            _ => ordering == Ordering::Less,
        };
        if better {
            best = Some(item);
        }
    }
    best.cloned()
        .ok_or_else(|| EvalError::new("Empty list has no extreme"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
