//! The reference numeric tower: `int < long < float < complex`.
//!
//! Each numeric kind implements its operators against operands of the same or
//! a narrower kind. When the other operand is wider the call answers
//! `NotImplemented`, so mixed arithmetic resolves through the reflected call on
//! the wider operand. `bool` is deliberately not part of the tower.

use num_bigint::BigInt;
use num_integer::Integer;

use crate::{
    capability::{BinaryOp, CompareOp, Dispatch, Side, UnaryOp},
    exception::{RunError, RunResult},
    types::{Complex, LongInt, float},
    value::Value,
};

/// Largest left shift a long will perform before the result is rejected.
const MAX_SHIFT_BITS: usize = 1 << 26;

/// A numeric value lifted out of a [`Value`].
#[derive(Debug, Clone)]
pub(crate) enum Number {
    Int(i64),
    Long(LongInt),
    Float(f64),
    Complex(Complex),
}

/// Position in the tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Rank {
    Int,
    Long,
    Float,
    Complex,
}

impl Number {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Long(l) => Some(Self::Long(l.clone())),
            Value::Float(f) => Some(Self::Float(*f)),
            Value::Complex(c) => Some(Self::Complex(*c)),
            _ => None,
        }
    }

    pub fn rank(&self) -> Rank {
        match self {
            Self::Int(_) => Rank::Int,
            Self::Long(_) => Rank::Long,
            Self::Float(_) => Rank::Float,
            Self::Complex(_) => Rank::Complex,
        }
    }

    /// Widens to `rank`; numbers already at or above it are returned unchanged.
    fn promote(self, rank: Rank) -> Self {
        match (self, rank) {
            (Self::Int(i), Rank::Long) => Self::Long(LongInt::from(i)),
            (Self::Int(i), Rank::Float) => Self::Float(i as f64),
            (Self::Int(i), Rank::Complex) => Self::Complex(Complex::new(i as f64, 0.0)),
            (Self::Long(l), Rank::Float) => Self::Float(l.to_f64()),
            (Self::Long(l), Rank::Complex) => Self::Complex(Complex::new(l.to_f64(), 0.0)),
            (Self::Float(f), Rank::Complex) => Self::Complex(Complex::new(f, 0.0)),
            (n, _) => n,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Long(l) => Value::Long(l),
            Self::Float(f) => Value::Float(f),
            Self::Complex(c) => Value::Complex(c),
        }
    }

    /// `abs()`; the absolute value of a complex is its float magnitude.
    pub fn abs(self) -> Value {
        match self {
            Self::Int(i) => i
                .checked_abs()
                .map_or_else(|| LongInt::from(i).abs().into_int_value(), Value::Int),
            Self::Long(l) => Value::Long(l.abs()),
            Self::Float(f) => Value::Float(f.abs()),
            Self::Complex(c) => Value::Float(c.abs()),
        }
    }
}

/// Whether a numeric kind implements a binary operator (either side).
pub(crate) fn implements_binary(rank: Rank, op: BinaryOp) -> bool {
    match op {
        BinaryOp::Power
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::TrueDivide
        | BinaryOp::Add
        | BinaryOp::Subtract => true,
        BinaryOp::FloorDivide | BinaryOp::Modulo => rank != Rank::Complex,
        BinaryOp::LeftShift | BinaryOp::RightShift | BinaryOp::And | BinaryOp::Xor | BinaryOp::Or => {
            rank <= Rank::Long
        }
    }
}

pub(crate) fn implements_unary(rank: Rank, op: UnaryOp) -> bool {
    match op {
        UnaryOp::Positive | UnaryOp::Negative => true,
        UnaryOp::Invert => rank <= Rank::Long,
    }
}

pub(crate) fn implements_compare(rank: Rank, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Ne => true,
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => rank != Rank::Complex,
        CompareOp::In | CompareOp::NotIn | CompareOp::Is | CompareOp::IsNot | CompareOp::ExceptionMatch => false,
    }
}

/// Invokes `op` on `this`, which is the operand named by `side`.
pub(crate) fn binary_op(this: Number, op: BinaryOp, side: Side, other: &Value) -> RunResult<Dispatch> {
    let Some(other) = Number::from_value(other) else {
        return Ok(Dispatch::NotImplemented);
    };
    let rank = this.rank();
    if other.rank() > rank || !implements_binary(rank, op) {
        return Ok(Dispatch::NotImplemented);
    }
    let other = other.promote(rank);
    let (left, right) = match side {
        Side::Forward => (this, other),
        Side::Reflected => (other, this),
    };
    apply(op, left, right)
}

fn apply(op: BinaryOp, left: Number, right: Number) -> RunResult<Dispatch> {
    match (left, right) {
        (Number::Int(a), Number::Int(b)) => int_op(op, a, b).map(Dispatch::Resolved),
        (Number::Long(a), Number::Long(b)) => long_op(op, &a, &b).map(Dispatch::Resolved),
        (Number::Float(a), Number::Float(b)) => float_op(op, a, b),
        (Number::Complex(a), Number::Complex(b)) => complex_op(op, a, b),
        (left, right) => {
            let rank = left.rank().max(right.rank());
            apply(op, left.promote(rank), right.promote(rank))
        }
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> RunResult<Value> {
    let wide = |a: i64, b: i64| long_op(op, &LongInt::from(a), &LongInt::from(b)).map(demote);
    match op {
        BinaryOp::Add => a.checked_add(b).map_or_else(|| wide(a, b), |v| Ok(Value::Int(v))),
        BinaryOp::Subtract => a.checked_sub(b).map_or_else(|| wide(a, b), |v| Ok(Value::Int(v))),
        BinaryOp::Multiply => a.checked_mul(b).map_or_else(|| wide(a, b), |v| Ok(Value::Int(v))),
        BinaryOp::Power => {
            if b < 0 {
                return float::pow(a as f64, b as f64).map(Value::Float);
            }
            match a {
                0 | 1 => return Ok(Value::Int(if b == 0 { 1 } else { a })),
                -1 => return Ok(Value::Int(if b % 2 == 0 { 1 } else { -1 })),
                _ => {}
            }
            match u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)) {
                Some(v) => Ok(Value::Int(v)),
                None => wide(a, b),
            }
        }
        BinaryOp::Divide | BinaryOp::TrueDivide => {
            if b == 0 {
                return Err(int_zero_division());
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        BinaryOp::FloorDivide => {
            if b == 0 {
                return Err(int_zero_division());
            }
            if a == i64::MIN && b == -1 {
                return wide(a, b);
            }
            Ok(Value::Int(a.div_floor(&b)))
        }
        BinaryOp::Modulo => {
            if b == 0 {
                return Err(int_zero_division());
            }
            if b == -1 {
                return Ok(Value::Int(0));
            }
            Ok(Value::Int(a.mod_floor(&b)))
        }
        BinaryOp::LeftShift => {
            if b < 0 {
                return Err(RunError::invalid_value("negative shift count"));
            }
            if b < 63 {
                let shifted = a << b;
                if shifted >> b == a {
                    return Ok(Value::Int(shifted));
                }
            }
            wide(a, b)
        }
        BinaryOp::RightShift => {
            if b < 0 {
                return Err(RunError::invalid_value("negative shift count"));
            }
            Ok(Value::Int(if b >= 64 { if a < 0 { -1 } else { 0 } } else { a >> b }))
        }
        BinaryOp::And => Ok(Value::Int(a & b)),
        BinaryOp::Xor => Ok(Value::Int(a ^ b)),
        BinaryOp::Or => Ok(Value::Int(a | b)),
    }
}

/// An `int` operation that overflowed into the long path stays an `int` when
/// the result fits again.
fn demote(value: Value) -> Value {
    match value {
        Value::Long(l) => l.into_int_value(),
        other => other,
    }
}

fn int_zero_division() -> RunError {
    RunError::ZeroDivision {
        msg: "integer division or modulo by zero",
    }
}

fn long_op(op: BinaryOp, a: &LongInt, b: &LongInt) -> RunResult<Value> {
    let long = |bi: BigInt| Value::Long(LongInt::new(bi));
    match op {
        BinaryOp::Add => Ok(long(a.inner() + b.inner())),
        BinaryOp::Subtract => Ok(long(a.inner() - b.inner())),
        BinaryOp::Multiply => Ok(long(a.inner() * b.inner())),
        BinaryOp::Power => {
            if b.is_negative() {
                return float::pow(a.to_f64(), b.to_f64()).map(Value::Float);
            }
            a.pow(b).map(Value::Long)
        }
        BinaryOp::Divide | BinaryOp::TrueDivide => {
            if b.is_zero() {
                return Err(RunError::ZeroDivision {
                    msg: "long division or modulo by zero",
                });
            }
            Ok(Value::Float(a.to_f64() / b.to_f64()))
        }
        BinaryOp::FloorDivide => a.div_floor(b).map(Value::Long),
        BinaryOp::Modulo => a.mod_floor(b).map(Value::Long),
        BinaryOp::LeftShift => {
            let count = b.shift_count()?;
            if count > MAX_SHIFT_BITS && !a.is_zero() {
                return Err(RunError::invalid_value("shift count too large"));
            }
            Ok(long(a.inner() << count))
        }
        BinaryOp::RightShift => {
            let count = b.shift_count().or_else(|err| {
                // any count beyond usize shifts every bit out
                if b.is_negative() { Err(err) } else { Ok(usize::MAX) }
            })?;
            let bits = usize::try_from(a.inner().bits()).unwrap_or(usize::MAX);
            if count > bits {
                return Ok(long(BigInt::from(if a.is_negative() { -1 } else { 0 })));
            }
            Ok(long(a.inner() >> count))
        }
        BinaryOp::And => Ok(long(a.inner() & b.inner())),
        BinaryOp::Xor => Ok(long(a.inner() ^ b.inner())),
        BinaryOp::Or => Ok(long(a.inner() | b.inner())),
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> RunResult<Dispatch> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::TrueDivide => float::divide(a, b)?,
        BinaryOp::FloorDivide => float::floor_divide(a, b)?,
        BinaryOp::Modulo => float::modulo(a, b)?,
        BinaryOp::Power => float::pow(a, b)?,
        BinaryOp::LeftShift | BinaryOp::RightShift | BinaryOp::And | BinaryOp::Xor | BinaryOp::Or => {
            return Ok(Dispatch::NotImplemented);
        }
    };
    Ok(Dispatch::Resolved(Value::Float(result)))
}

fn complex_op(op: BinaryOp, a: Complex, b: Complex) -> RunResult<Dispatch> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::TrueDivide => a.divide(b)?,
        BinaryOp::Power => a.pow(b)?,
        _ => return Ok(Dispatch::NotImplemented),
    };
    Ok(Dispatch::Resolved(Value::Complex(result)))
}

/// Rich comparison with `this` on the left.
pub(crate) fn compare(this: Number, op: CompareOp, other: &Value) -> RunResult<Dispatch> {
    let Some(other) = Number::from_value(other) else {
        return Ok(Dispatch::NotImplemented);
    };
    let rank = this.rank();
    if other.rank() > rank || !implements_compare(rank, op) {
        return Ok(Dispatch::NotImplemented);
    }
    let ordering = match (this, other.promote(rank)) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (Number::Long(a), Number::Long(b)) => Some(a.cmp(&b)),
        (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
        (Number::Complex(a), Number::Complex(b)) => {
            let equal = a == b;
            return Ok(Dispatch::Resolved(Value::Bool(if op == CompareOp::Eq { equal } else { !equal })));
        }
        _ => return Ok(Dispatch::NotImplemented),
    };
    // unordered (NaN) compares unequal to everything
    let result = match ordering {
        Some(ordering) => op.matches(ordering).unwrap_or(false),
        None => op == CompareOp::Ne,
    };
    Ok(Dispatch::Resolved(Value::Bool(result)))
}

pub(crate) fn unary_op(this: Number, op: UnaryOp) -> RunResult<Dispatch> {
    let value = match (op, this) {
        (UnaryOp::Positive, n) => n.into_value(),
        (UnaryOp::Negative, Number::Int(i)) => i
            .checked_neg()
            .map_or_else(|| Value::Long(-LongInt::from(i)), Value::Int),
        (UnaryOp::Negative, Number::Long(l)) => Value::Long(-l),
        (UnaryOp::Negative, Number::Float(f)) => Value::Float(-f),
        (UnaryOp::Negative, Number::Complex(c)) => Value::Complex(-c),
        (UnaryOp::Invert, Number::Int(i)) => Value::Int(!i),
        (UnaryOp::Invert, Number::Long(l)) => Value::Long(LongInt::new(-(l.0 + BigInt::from(1)))),
        (UnaryOp::Invert, _) => return Ok(Dispatch::NotImplemented),
    };
    Ok(Dispatch::Resolved(value))
}

/// Exact equality across the tower, used by container equality and dict keys.
pub(crate) fn numbers_equal(a: &Number, b: &Number) -> bool {
    let rank = a.rank().max(b.rank());
    match (a.clone().promote(rank), b.clone().promote(rank)) {
        (Number::Int(a), Number::Int(b)) => a == b,
        (Number::Long(a), Number::Long(b)) => a == b,
        (Number::Float(a), Number::Float(b)) => a == b,
        (Number::Complex(a), Number::Complex(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(dispatch: RunResult<Dispatch>) -> Value {
        match dispatch.unwrap() {
            Dispatch::Resolved(v) => v,
            Dispatch::NotImplemented => panic!("expected a resolved value"),
        }
    }

    #[test]
    fn int_overflow_promotes_to_long() {
        let v = resolved(binary_op(Number::Int(i64::MAX), BinaryOp::Add, Side::Forward, &Value::Int(1)));
        assert!(matches!(v, Value::Long(_)));
        assert_eq!(v.py_str(), "9223372036854775808");
    }

    #[test]
    fn narrower_operand_declines_wider_one() {
        let d = binary_op(Number::Int(1), BinaryOp::Add, Side::Forward, &Value::Float(0.5)).unwrap();
        assert!(matches!(d, Dispatch::NotImplemented));
        let v = resolved(binary_op(Number::Float(0.5), BinaryOp::Add, Side::Reflected, &Value::Int(1)));
        assert_eq!(v, Value::Float(1.5));
    }

    #[test]
    fn reflected_subtract_keeps_operand_order() {
        // 10 - 2.5, resolved on the float
        let v = resolved(binary_op(
            Number::Float(2.5),
            BinaryOp::Subtract,
            Side::Reflected,
            &Value::Int(10),
        ));
        assert_eq!(v, Value::Float(7.5));
    }

    #[test]
    fn floor_division_and_modulo_round_down() {
        assert_eq!(int_op(BinaryOp::FloorDivide, -7, 2).unwrap(), Value::Int(-4));
        assert_eq!(int_op(BinaryOp::Modulo, -7, 2).unwrap(), Value::Int(1));
        assert!(matches!(
            int_op(BinaryOp::Modulo, 1, 0),
            Err(RunError::ZeroDivision { .. })
        ));
    }

    #[test]
    fn shifts() {
        assert_eq!(int_op(BinaryOp::LeftShift, 1, 4).unwrap(), Value::Int(16));
        assert!(matches!(int_op(BinaryOp::LeftShift, 1, 64).unwrap(), Value::Long(_)));
        assert_eq!(int_op(BinaryOp::RightShift, -1, 100).unwrap(), Value::Int(-1));
        assert!(int_op(BinaryOp::LeftShift, 1, -1).is_err());
    }

    #[test]
    fn float_compares_against_wide_long() {
        let big = Value::Long(LongInt::new(BigInt::from(10).pow(30)));
        let v = resolved(compare(Number::Float(1.0), CompareOp::Lt, &big));
        assert_eq!(v, Value::Bool(true));
    }

    #[test]
    fn complex_has_no_ordering() {
        assert!(!implements_compare(Rank::Complex, CompareOp::Lt));
        assert!(implements_compare(Rank::Complex, CompareOp::Eq));
    }
}
