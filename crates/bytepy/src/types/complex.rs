use std::ops::{Add, Mul, Neg, Sub};

use crate::{
    exception::{RunError, RunResult},
    types::float,
};

/// A complex number, the widest kind of the numeric tower.
///
/// Complex values have no ordering; only `==` and `!=` are defined.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

/// Integral exponents up to this magnitude use repeated squaring, which keeps
/// results like `(1+1j) ** 2` exact.
const MAX_INTEGRAL_EXPONENT: f64 = 100.0;

impl Complex {
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    #[must_use]
    pub fn abs(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Division using Smith's algorithm to avoid needless overflow.
    pub fn divide(self, rhs: Self) -> RunResult<Self> {
        if rhs.is_zero() {
            return Err(RunError::ZeroDivision {
                msg: "complex division by zero",
            });
        }
        if rhs.re.abs() >= rhs.im.abs() {
            let ratio = rhs.im / rhs.re;
            let denom = rhs.re + rhs.im * ratio;
            Ok(Self::new(
                (self.re + self.im * ratio) / denom,
                (self.im - self.re * ratio) / denom,
            ))
        } else {
            let ratio = rhs.re / rhs.im;
            let denom = rhs.re * ratio + rhs.im;
            Ok(Self::new(
                (self.re * ratio + self.im) / denom,
                (self.im * ratio - self.re) / denom,
            ))
        }
    }

    pub fn pow(self, exponent: Self) -> RunResult<Self> {
        if exponent.is_zero() {
            return Ok(Self::new(1.0, 0.0));
        }
        if self.is_zero() {
            if exponent.im != 0.0 || exponent.re < 0.0 {
                return Err(RunError::ZeroDivision {
                    msg: "0.0 to a negative or complex power",
                });
            }
            return Ok(Self::new(0.0, 0.0));
        }
        if exponent.im == 0.0 && exponent.re.fract() == 0.0 && exponent.re.abs() <= MAX_INTEGRAL_EXPONENT {
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "bounded above")]
            let n = exponent.re.abs() as u32;
            let result = self.powu(n);
            return if exponent.re < 0.0 {
                Self::new(1.0, 0.0).divide(result)
            } else {
                Ok(result)
            };
        }
        let magnitude = self.abs();
        let angle = self.im.atan2(self.re);
        let mut len = magnitude.powf(exponent.re);
        let mut phase = angle * exponent.re;
        if exponent.im != 0.0 {
            len /= (angle * exponent.im).exp();
            phase += exponent.im * magnitude.ln();
        }
        Ok(Self::new(len * phase.cos(), len * phase.sin()))
    }

    fn powu(self, mut n: u32) -> Self {
        let mut result = Self::new(1.0, 0.0);
        let mut base = self;
        while n > 0 {
            if n & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            n >>= 1;
        }
        result
    }

    /// `repr()` form: `2j` for a pure imaginary with a positive-zero real
    /// part, otherwise `(1+2j)`.
    #[must_use]
    pub fn repr(self) -> String {
        let im = part(self.im);
        if self.re == 0.0 && self.re.is_sign_positive() {
            return format!("{im}j");
        }
        let sign = if im.starts_with('-') { "" } else { "+" };
        format!("({}{sign}{im}j)", part(self.re))
    }
}

fn part(f: f64) -> String {
    let s = float::repr(f);
    match s.strip_suffix(".0") {
        Some(integral) => integral.to_owned(),
        None => s,
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Neg for Complex {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.re, -self.im)
    }
}
