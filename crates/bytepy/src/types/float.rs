//! Float formatting and the float operations whose semantics differ from the
//! IEEE defaults (floor division, modulo, power, division by zero).

use crate::exception::{RunError, RunResult};

/// `repr()` of a float: shortest round-tripping digits, scientific notation
/// outside `1e-4 <= |f| < 1e16`.
pub fn repr(f: f64) -> String {
    if let Some(special) = non_finite(f) {
        return special.to_owned();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return python_exponent(&format!("{f:e}"));
    }
    let mut s = format!("{f}");
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// `str()` of a float: twelve significant digits, trailing zeros trimmed.
pub fn str(f: f64) -> String {
    if let Some(special) = non_finite(f) {
        return special.to_owned();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }
    let sci = format!("{f:.11e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..12).contains(&exp) {
        let mantissa = trim_fraction(mantissa);
        return python_exponent(&format!("{mantissa}e{exp}"));
    }
    let decimals = usize::try_from(11 - exp).unwrap_or(0);
    let mut s = trim_fraction(&format!("{f:.decimals$}")).to_owned();
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

fn non_finite(f: f64) -> Option<&'static str> {
    if f.is_nan() {
        Some("nan")
    } else if f.is_infinite() {
        Some(if f > 0.0 { "inf" } else { "-inf" })
    } else {
        None
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Rewrites Rust's `1.5e-7` exponent form as `1.5e-07`, `1e20` as `1e+20`.
fn python_exponent(s: &str) -> String {
    let Some((mantissa, exp)) = s.split_once('e') else {
        return s.to_owned();
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// True division.
pub fn divide(a: f64, b: f64) -> RunResult<f64> {
    if b == 0.0 {
        return Err(RunError::ZeroDivision {
            msg: "float division by zero",
        });
    }
    Ok(a / b)
}

/// Modulo whose result takes the sign of the divisor.
pub fn modulo(a: f64, b: f64) -> RunResult<f64> {
    if b == 0.0 {
        return Err(RunError::ZeroDivision { msg: "float modulo" });
    }
    let mut m = a % b;
    if m == 0.0 {
        m = 0.0_f64.copysign(b);
    } else if (b < 0.0) != (m < 0.0) {
        m += b;
    }
    Ok(m)
}

/// Floor division, consistent with [`modulo`] so that `a == (a // b) * b + a % b`.
pub fn floor_divide(a: f64, b: f64) -> RunResult<f64> {
    if b == 0.0 {
        return Err(RunError::ZeroDivision { msg: "float divmod()" });
    }
    let m = a % b;
    let mut div = (a - m) / b;
    if m != 0.0 && (b < 0.0) != (m < 0.0) {
        div -= 1.0;
    }
    if div == 0.0 {
        return Ok(0.0_f64.copysign(a / b));
    }
    let mut floor = div.floor();
    if div - floor > 0.5 {
        floor += 1.0;
    }
    Ok(floor)
}

/// Float exponentiation with the errors of the reference numeric model.
pub fn pow(base: f64, exponent: f64) -> RunResult<f64> {
    if exponent == 0.0 {
        return Ok(1.0);
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(RunError::ZeroDivision {
            msg: "0.0 cannot be raised to a negative power",
        });
    }
    if base < 0.0 && exponent.is_finite() && exponent.fract() != 0.0 {
        return Err(RunError::invalid_value(
            "negative number cannot be raised to a fractional power",
        ));
    }
    Ok(base.powf(exponent))
}
