use super::{Strategy, StrategyBase, StrategyConfig};
use crate::core::dataset::{scaled_count, DataSet, Records};
use crate::core::error::Result;
use crate::core::value::{Value, ValueType};
use crate::engine::{mutation, Diagnostic, RunReport};
use crate::transforms::noise::{messy_spaces, uniform_between};
use crate::transforms::{from_fn, Transform, TransformResult};
use rand::rngs::ThreadRng;
use rand::{Rng, RngCore};

/// Appends a sample of existing rows, optionally noised so the copies are
/// not exact duplicates.
pub struct Duplicator<'a, R: RngCore = ThreadRng> {
    base: StrategyBase<'a>,
    add_noise: bool,
    rng: R,
}

impl<'a> Duplicator<'a> {
    pub fn new(dataset: &'a mut DataSet, config: &StrategyConfig) -> Result<Self> {
        Self::with_rng(dataset, config, rand::thread_rng())
    }
}

impl<'a, R: RngCore> Duplicator<'a, R> {
    pub fn with_rng(dataset: &'a mut DataSet, config: &StrategyConfig, rng: R) -> Result<Self> {
        let base = StrategyBase::new(dataset, config.fraction())?;
        Ok(Self {
            base,
            add_noise: config.add_noise,
            rng,
        })
    }

    fn noise_sample(&mut self, sample: Records, report: &mut RunReport) -> Result<Records> {
        let mut transient = DataSet::from_records(sample)?;
        let source = self.base.dataset();

        let mut candidates = Vec::new();
        for column in 0..transient.num_columns() {
            let dtype = source.column_dtype(column)?;
            if dtype.is_numeric() || dtype.is_textual() {
                candidates.push((column, dtype));
            }
        }
        if candidates.is_empty() {
            report.push(Diagnostic::new(
                None,
                "duplicate",
                "no numeric or string columns to add noise to",
            ));
            return Ok(transient.into_records());
        }

        let amount = scaled_count(candidates.len(), self.base.percentage()).max(1);
        let picks = rand::seq::index::sample(&mut self.rng, candidates.len(), amount);
        let rows = transient.len();
        for pick in picks.iter() {
            let (column, dtype) = candidates[pick];
            let transform: Box<dyn Transform> = if dtype.is_numeric() {
                let ds = self.base.dataset();
                match ds.column_min(column)?.zip(ds.column_max(column)?) {
                    Some((low, high)) => redraw(dtype, &low, &high),
                    None => continue,
                }
            } else {
                Box::new(from_fn("messy_spaces", perturb_text))
            };
            tracing::debug!(column, transform = transform.name(), "noising duplicated rows");
            let outcome = mutation::apply(&mut transient, column, transform.as_ref(), rows, &mut self.rng)?;
            report.record(outcome);
        }
        Ok(transient.into_records())
    }
}

/// A value in `[low, high]` that differs from the old one. Equal bounds are
/// widened by one, downward at the top of the integer range.
fn redraw(dtype: ValueType, low: &Value, high: &Value) -> Box<dyn Transform> {
    if dtype == ValueType::Int {
        let low = low.as_int().unwrap_or(0);
        let high = high.as_int().unwrap_or(low).max(low);
        let (low, high) = match (low, high) {
            (l, h) if l < h => (l, h),
            (i64::MAX, h) => (i64::MAX - 1, h),
            (l, _) => (l, l + 1),
        };
        Box::new(from_fn("redraw_int", move |old: &Value, rng: &mut dyn RngCore| {
            let draw = match old.as_int() {
                Some(old) if (low..=high).contains(&old) => {
                    let d = rng.gen_range(low..high);
                    if d >= old {
                        d + 1
                    } else {
                        d
                    }
                }
                _ => rng.gen_range(low..=high),
            };
            Ok(Value::Int(draw))
        }))
    } else {
        let low = low.as_float().filter(|f| f.is_finite()).unwrap_or(f64::MIN);
        let mut high = high.as_float().filter(|f| f.is_finite()).unwrap_or(f64::MAX);
        if high <= low {
            high = (low + low.abs().max(1.0)).min(f64::MAX);
        }
        let low = if low == high { f64::MIN } else { low };
        Box::new(from_fn("redraw_float", move |old: &Value, rng: &mut dyn RngCore| {
            let old = old.as_float();
            let mut draw = uniform_between(low, high, rng);
            for _ in 0..8 {
                if Some(draw) != old {
                    break;
                }
                draw = uniform_between(low, high, rng);
            }
            if Some(draw) == old {
                draw = if draw < high { high } else { low };
            }
            Ok(Value::Float(draw))
        }))
    }
}

fn perturb_text(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let out = messy_spaces(value, rng)?;
    if &out == value {
        return Ok(Value::String(format!("{} ", value.to_text())));
    }
    Ok(out)
}

impl<R: RngCore> Strategy for Duplicator<'_, R> {
    fn name(&self) -> &str {
        "duplicator"
    }

    fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::new(self.name());
        let mut sample = self.base.dataset().sample(self.base.percentage(), &mut self.rng);
        if sample.is_empty() {
            tracing::warn!(strategy = "duplicator", "sample is empty, nothing to duplicate");
            return Ok(report);
        }
        if self.add_noise {
            sample = self.noise_sample(sample, &mut report)?;
        }
        report.rows_appended = self.base.dataset_mut().append(sample)?;
        tracing::info!(
            strategy = "duplicator",
            rows = report.rows_appended,
            noised = self.add_noise,
            "rows duplicated"
        );
        Ok(report)
    }
}
