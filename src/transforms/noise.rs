use super::{pick, Named, Transform, TransformResult};
use crate::core::error::TransformError;
use crate::core::value::{Value, ValueType};
use rand::{Rng, RngCore};

pub const MESSY_SPACES: Named = Named::new("messy_spaces", messy_spaces);

/// Replace every space with 0, 2, 3, 4 or 5 spaces. Non-strings pass
/// through.
pub fn messy_spaces(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    match value {
        Value::String(s) => {
            let width = *pick(&[0usize, 2, 3, 4, 5], rng);
            Ok(Value::String(s.replace(' ', &" ".repeat(width))))
        }
        other => Ok(other.clone()),
    }
}

/// Uniform integer in `[low, high]`, ignoring the old value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomInt {
    pub low: i64,
    pub high: i64,
}

impl RandomInt {
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            low: low.min(high),
            high: low.max(high),
        }
    }
}

impl Transform for RandomInt {
    fn name(&self) -> &str {
        "random_int"
    }

    fn apply(&self, _value: &Value, rng: &mut dyn RngCore) -> TransformResult {
        Ok(Value::Int(rng.gen_range(self.low..=self.high)))
    }
}

/// Uniform float in `[low, high]`, ignoring the old value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomFloat {
    pub low: f64,
    pub high: f64,
}

impl RandomFloat {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low: low.min(high),
            high: low.max(high),
        }
    }
}

impl Transform for RandomFloat {
    fn name(&self) -> &str {
        "random_float"
    }

    fn apply(&self, _value: &Value, rng: &mut dyn RngCore) -> TransformResult {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(TransformError::InvalidRange {
                low: self.low,
                high: self.high,
            });
        }
        Ok(Value::Float(uniform_between(self.low, self.high, rng)))
    }
}

/// Uniform draw in `[low, high]` for finite bounds, including spans wider
/// than `f64::MAX`.
pub(crate) fn uniform_between(low: f64, high: f64, rng: &mut dyn RngCore) -> f64 {
    if low == high {
        return low;
    }
    if (high - low).is_finite() {
        return rng.gen_range(low..=high);
    }
    let half_span = high / 2.0 - low / 2.0;
    (low + rng.gen::<f64>() * half_span * 2.0).clamp(low, high)
}

/// Scalar type conversion. Nulls stay null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cast {
    pub to: ValueType,
}

impl Cast {
    pub fn new(to: ValueType) -> Self {
        Self { to }
    }

    fn fail(&self, value: &Value) -> TransformError {
        TransformError::Conversion {
            from: value.value_type(),
            to: self.to,
            value: value.to_string(),
        }
    }
}

impl Transform for Cast {
    fn name(&self) -> &str {
        match self.to {
            ValueType::String => "to_string",
            ValueType::Int => "to_int",
            ValueType::Float => "to_float",
            _ => "cast",
        }
    }

    fn apply(&self, value: &Value, _rng: &mut dyn RngCore) -> TransformResult {
        if value.is_null() {
            return Ok(value.clone());
        }
        match (self.to, value) {
            (ValueType::String, v) => Ok(Value::String(v.to_text().into_owned())),
            (ValueType::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
            (ValueType::Float, Value::Float(f)) => Ok(Value::Float(*f)),
            (ValueType::Float, Value::Bool(b)) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            (ValueType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.fail(value)),
            (ValueType::Int, Value::Int(i)) => Ok(Value::Int(*i)),
            // truncation toward zero
            (ValueType::Int, Value::Float(f)) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
            (ValueType::Int, Value::Bool(b)) => Ok(Value::Int(*b as i64)),
            (ValueType::Int, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.fail(value)),
            _ => Err(self.fail(value)),
        }
    }
}
