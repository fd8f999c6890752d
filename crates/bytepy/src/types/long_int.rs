//! LongInt wrapper for arbitrary precision integer support.
//!
//! The `long` kind of the numeric tower. Plain `int` values live in
//! `Value::Int(i64)` and promote to `LongInt` when an operation overflows; once a
//! value is a long it stays a long, the way `2L + 1` stays `3L`.

use std::{
    fmt::{self, Display},
    ops::{Add, Mul, Neg, Sub},
};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    exception::{RunError, RunResult},
    resource::check_result_size,
    value::Value,
};

/// Wrapper around `num_bigint::BigInt` for arbitrary precision integers.
///
/// The inner `BigInt` is accessible via `.0` for arithmetic operations that need direct
/// access to the underlying type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct LongInt(pub BigInt);

impl LongInt {
    /// Creates a new `LongInt` from a `BigInt`.
    pub fn new(bi: BigInt) -> Self {
        Self(bi)
    }

    /// Converts the result of an `int` operation back to a `Value`, demoting to
    /// `Value::Int` when it fits and promoting to `Value::Long` otherwise.
    pub fn into_int_value(self) -> Value {
        match self.0.to_i64() {
            Some(i) => Value::Int(i),
            None => Value::Long(self),
        }
    }

    /// Returns a reference to the inner `BigInt`.
    pub fn inner(&self) -> &BigInt {
        &self.0
    }

    /// Checks if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Tries to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    /// Converts to f64, saturating to infinity for values beyond the float range.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(if self.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        })
    }

    /// Returns the absolute value as a new `LongInt`.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Floor division, rounding towards negative infinity.
    pub fn div_floor(&self, rhs: &Self) -> RunResult<Self> {
        if rhs.is_zero() {
            return Err(RunError::ZeroDivision {
                msg: "long division or modulo by zero",
            });
        }
        Ok(Self(self.0.div_floor(&rhs.0)))
    }

    /// Modulo whose result takes the sign of the divisor.
    pub fn mod_floor(&self, rhs: &Self) -> RunResult<Self> {
        if rhs.is_zero() {
            return Err(RunError::ZeroDivision {
                msg: "long division or modulo by zero",
            });
        }
        Ok(Self(self.0.mod_floor(&rhs.0)))
    }

    /// Raises to a non-negative power.
    ///
    /// Exponents that do not fit in `u32` are rejected, and so is any result
    /// whose estimated size is over the result size limit.
    pub fn pow(&self, exponent: &Self) -> RunResult<Self> {
        let exp = exponent
            .0
            .to_u32()
            .ok_or_else(|| RunError::invalid_value("exponent too large"))?;
        // 0, 1 and -1 never grow
        let base_bits = self.0.bits();
        if base_bits > 1 {
            let estimated_bytes = base_bits.saturating_mul(u64::from(exp)) / 8;
            check_result_size(usize::try_from(estimated_bytes).unwrap_or(usize::MAX))?;
        }
        Ok(Self(num_traits::pow(self.0.clone(), exp as usize)))
    }

    /// Shift count as `usize`; negative counts are rejected.
    pub fn shift_count(&self) -> RunResult<usize> {
        if self.is_negative() {
            return Err(RunError::invalid_value("negative shift count"));
        }
        self.0
            .to_usize()
            .ok_or_else(|| RunError::invalid_value("shift count too large"))
    }
}

// === Trait Implementations ===

impl From<BigInt> for LongInt {
    fn from(bi: BigInt) -> Self {
        Self(bi)
    }
}

impl From<i64> for LongInt {
    fn from(i: i64) -> Self {
        Self(BigInt::from(i))
    }
}

impl Add for LongInt {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for LongInt {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul for LongInt {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Neg for LongInt {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Display for LongInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
