//! Scalar-to-scalar value transforms applied by the mutation engine.

pub mod fuzz;
pub mod noise;

use crate::core::error::TransformError;
use crate::core::value::Value;
use rand::{Rng, RngCore};
use std::fmt;

pub type TransformResult = std::result::Result<Value, TransformError>;

/// Signature of the stateless catalogue functions.
pub type TransformFn = fn(&Value, &mut dyn RngCore) -> TransformResult;

/// A pure function of one cell value. Randomness comes from the caller's
/// generator so seeded runs repeat.
pub trait Transform {
    fn name(&self) -> &str;

    fn apply(&self, value: &Value, rng: &mut dyn RngCore) -> TransformResult;
}

/// A catalogue function with its name.
#[derive(Clone, Copy)]
pub struct Named {
    pub name: &'static str,
    pub f: TransformFn,
}

impl Named {
    pub const fn new(name: &'static str, f: TransformFn) -> Self {
        Self { name, f }
    }
}

impl fmt::Debug for Named {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Named({})", self.name)
    }
}

impl Transform for Named {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, value: &Value, rng: &mut dyn RngCore) -> TransformResult {
        (self.f)(value, rng)
    }
}

/// Closure-backed transform.
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&Value, &mut dyn RngCore) -> TransformResult,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, value: &Value, rng: &mut dyn RngCore) -> TransformResult {
        (self.f)(value, rng)
    }
}

pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnTransform<F>
where
    F: Fn(&Value, &mut dyn RngCore) -> TransformResult,
{
    FnTransform {
        name: name.into(),
        f,
    }
}

/// Replaces every value with the same constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    name: &'static str,
    value: Value,
}

impl Constant {
    pub fn new(value: Value) -> Self {
        Self {
            name: "constant",
            value,
        }
    }

    pub fn null() -> Self {
        Self {
            name: "add_nulls",
            value: Value::Null,
        }
    }
}

impl Transform for Constant {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, _value: &Value, _rng: &mut dyn RngCore) -> TransformResult {
        Ok(self.value.clone())
    }
}

/// Uniform pick from a non-empty slice.
pub(crate) fn pick<'a, T>(items: &'a [T], rng: &mut dyn RngCore) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn closures_and_constants() {
        let mut rng = StdRng::seed_from_u64(1);
        let double = from_fn("double", |v: &Value, _: &mut dyn RngCore| {
            Ok(Value::Int(v.as_int().unwrap_or(0) * 2))
        });
        assert_eq!(double.name(), "double");
        assert_eq!(double.apply(&Value::Int(4), &mut rng), Ok(Value::Int(8)));

        let nulls = Constant::null();
        assert_eq!(nulls.apply(&Value::from("x"), &mut rng), Ok(Value::Null));
    }
}
