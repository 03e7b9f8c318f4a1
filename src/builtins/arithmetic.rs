//! Arithmetic on dimensioned numbers: `+ - * / % ^ ^/ < > <= >=`
//!
//! Dimensional rules:
//!
//! - `+`, `-`, `%` and the comparisons require both operands to carry
//!   the same dimension
//! - `*` adds exponent vectors, `/` subtracts them
//! - `^` requires a dimensionless integer exponent and scales the
//!   base's exponents
//! - `^/` is the n-th root; even roots of negatives are out of domain
//!
//! Also registers the SI unit constructors (`meters 3`, `seconds 4`),
//! which attach a base dimension to a dimensionless number.

use crate::builtins::{as_unit, native2};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::units::{BaseUnit, Dimension};
use crate::value::Value;
use num_rational::Rational64;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use std::cmp::Ordering;
use std::rc::Rc;

fn dims_equal(left: Dimension, right: Dimension) -> Result<(), RuntimeError> {
    if left == right {
        Ok(())
    } else {
        Err(RuntimeError::DimensionMismatch { left, right })
    }
}

fn add(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (ma, da) = as_unit(&a)?;
    let (mb, db) = as_unit(&b)?;
    dims_equal(da, db)?;
    let magnitude = ma
        .checked_add(mb)
        .ok_or_else(|| RuntimeError::not_in_domain(a, "the sum is out of range"))?;
    Ok(Value::Unit { magnitude, dim: da })
}

fn sub(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (ma, da) = as_unit(&a)?;
    let (mb, db) = as_unit(&b)?;
    dims_equal(da, db)?;
    let magnitude = ma
        .checked_sub(mb)
        .ok_or_else(|| RuntimeError::not_in_domain(a, "the difference is out of range"))?;
    Ok(Value::Unit { magnitude, dim: da })
}

fn mul(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (ma, da) = as_unit(&a)?;
    let (mb, db) = as_unit(&b)?;
    let magnitude = ma
        .checked_mul(mb)
        .ok_or_else(|| RuntimeError::not_in_domain(a, "the product is out of range"))?;
    Ok(Value::Unit {
        magnitude,
        dim: da.mul(&db),
    })
}

fn div(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (ma, da) = as_unit(&a)?;
    let (mb, db) = as_unit(&b)?;
    if mb.is_zero() {
        return Err(RuntimeError::not_in_domain(b, "division by zero"));
    }
    let magnitude = ma
        .checked_div(mb)
        .ok_or_else(|| RuntimeError::not_in_domain(a, "the quotient is out of range"))?;
    Ok(Value::Unit {
        magnitude,
        dim: da.div(&db),
    })
}

/// Remainder of like quantities: the divisor must be non-zero and
/// dimension-equal to the dividend.
fn rem(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (ma, da) = as_unit(&a)?;
    let (mb, db) = as_unit(&b)?;
    dims_equal(da, db)?;
    if mb.is_zero() {
        return Err(RuntimeError::not_in_domain(b, "division by zero"));
    }
    let magnitude = ma
        .checked_rem(mb)
        .ok_or_else(|| RuntimeError::not_in_domain(a, "the remainder is out of range"))?;
    Ok(Value::Unit { magnitude, dim: da })
}

fn integer_exponent(value: &Value) -> Result<i64, RuntimeError> {
    let (magnitude, dim) = as_unit(value)?;
    if !dim.is_none() {
        return Err(RuntimeError::not_in_domain(
            value.clone(),
            "the exponent must be dimensionless",
        ));
    }
    if !magnitude.fract().is_zero() {
        return Err(RuntimeError::not_in_domain(
            value.clone(),
            "the exponent must be an integer",
        ));
    }
    magnitude.to_i64().ok_or_else(|| {
        RuntimeError::not_in_domain(value.clone(), "the exponent is out of range")
    })
}

fn pow(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (base, base_dim) = as_unit(&a)?;
    let n = integer_exponent(&b)?;
    if base.is_zero() && n < 0 {
        return Err(RuntimeError::not_in_domain(
            a,
            "cannot raise zero to a negative power",
        ));
    }
    let magnitude = base
        .checked_powi(n)
        .ok_or_else(|| RuntimeError::not_in_domain(a, "the power is out of range"))?;
    Ok(Value::Unit {
        magnitude,
        dim: base_dim.scale(Rational64::from_integer(n)),
    })
}

fn root(a: Value, b: Value, _env: &Rc<Environment>) -> Result<Value, RuntimeError> {
    let (base, base_dim) = as_unit(&a)?;
    let n = integer_exponent(&b)?;
    if n <= 0 {
        return Err(RuntimeError::not_in_domain(
            b,
            "the root degree must be positive",
        ));
    }
    if n % 2 == 0 && base.is_sign_negative() && !base.is_zero() {
        return Err(RuntimeError::not_in_domain(
            a,
            "cannot take an even root of a negative number",
        ));
    }
    let dim = base_dim.scale(Rational64::new(1, n));
    if n == 1 {
        return Ok(Value::Unit {
            magnitude: base,
            dim,
        });
    }
    let positive = base.abs();
    let unsigned = if n == 2 {
        positive.sqrt()
    } else {
        positive.checked_powd(Decimal::ONE / Decimal::from(n))
    };
    let unsigned =
        unsigned.ok_or_else(|| RuntimeError::not_in_domain(a, "the root is out of range"))?;
    let magnitude = if base.is_sign_negative() {
        -unsigned
    } else {
        unsigned
    };
    Ok(Value::Unit { magnitude, dim })
}

fn comparison(name: &'static str, pred: fn(Ordering) -> bool) -> Value {
    native2(name, move |a, b, _env| {
        let (ma, da) = as_unit(&a)?;
        let (mb, db) = as_unit(&b)?;
        dims_equal(da, db)?;
        Ok(Value::Bool(pred(ma.cmp(&mb))))
    })
}

fn unit_constructor(name: &'static str, unit: BaseUnit) -> Value {
    Value::native(name, move |arg, _env| {
        let (magnitude, dim) = as_unit(&arg)?;
        if !dim.is_none() {
            return Err(RuntimeError::not_in_domain(
                arg,
                "expected a dimensionless number",
            ));
        }
        Ok(Value::Unit {
            magnitude,
            dim: Dimension::base(unit),
        })
    })
}

/// Register all arithmetic operators and unit constructors.
pub fn register(env: &Rc<Environment>) {
    env.define("+".to_string(), native2("+", add));
    env.define("-".to_string(), native2("-", sub));
    env.define("*".to_string(), native2("*", mul));
    env.define("/".to_string(), native2("/", div));
    env.define("%".to_string(), native2("%", rem));
    env.define("^".to_string(), native2("^", pow));
    env.define("^/".to_string(), native2("^/", root));

    env.define("<".to_string(), comparison("<", Ordering::is_lt));
    env.define(">".to_string(), comparison(">", Ordering::is_gt));
    env.define("<=".to_string(), comparison("<=", Ordering::is_le));
    env.define(">=".to_string(), comparison(">=", Ordering::is_ge));

    env.define("seconds".to_string(), unit_constructor("seconds", BaseUnit::Time));
    env.define("meters".to_string(), unit_constructor("meters", BaseUnit::Length));
    env.define(
        "kilograms".to_string(),
        unit_constructor("kilograms", BaseUnit::Mass),
    );
    env.define(
        "amperes".to_string(),
        unit_constructor("amperes", BaseUnit::Current),
    );
    env.define(
        "kelvins".to_string(),
        unit_constructor("kelvins", BaseUnit::Temperature),
    );
    env.define("moles".to_string(), unit_constructor("moles", BaseUnit::Amount));
    env.define(
        "candelas".to_string(),
        unit_constructor("candelas", BaseUnit::Luminosity),
    );
}
