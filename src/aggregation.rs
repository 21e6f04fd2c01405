//! Per-unit aggregation
//!
//! Continuous datasets are reduced with a NaN-skipping mean across all points
//! of an Arc_ID. Categorical rasters are reduced with a [`CategoricalRule`]
//! over the pooled pixel values of an Arc_ID on one date.

use ndarray::{Array1, ArrayView1};
use std::fmt;

/// Sentinel written for a unit whose value cannot be determined
pub const NOT_AVAILABLE: &str = "na";

/// One cell of an output table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// No sample for this combination; written as an empty cell
    Missing,
    /// Samples exist but no value can be derived; written as `na`
    NotAvailable,
    /// Integer result of a counting rule
    Count(u64),
    /// Continuous value; NaN is written as an empty cell
    Value(f32),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Value(v) => v.is_nan(),
            _ => false,
        }
    }
}

/// Renders a float the way the tabular outputs expect: shortest round-trip
/// text, with `.0` kept on integral values.
pub fn format_value(value: f32) -> String {
    if value.is_nan() {
        return String::new();
    }
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::NotAvailable => f.write_str(NOT_AVAILABLE),
            Cell::Count(n) => write!(f, "{n}"),
            Cell::Value(v) => f.write_str(&format_value(*v)),
        }
    }
}

/// Rounds to `decimals` places, ties to even (`6.25` -> `6.2`, `0.03125` -> `0.0312`).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 {
        2.0 * (scaled / 2.0).round()
    } else {
        scaled.round()
    };
    rounded / factor
}

/// Per-step mean across several series of equal length, skipping NaN.
///
/// A step where every series is NaN yields NaN. Computation runs in f64.
pub fn nanmean_series(series: &[ArrayView1<'_, f32>]) -> Array1<f64> {
    let len = series.first().map_or(0, |s| s.len());
    let mut sums = Array1::<f64>::zeros(len);
    let mut counts = vec![0_u32; len];

    for s in series {
        for (i, &v) in s.iter().enumerate().take(len) {
            if !v.is_nan() {
                sums[i] += f64::from(v);
                counts[i] += 1;
            }
        }
    }

    sums.iter_mut().zip(counts).for_each(|(sum, count)| {
        *sum = if count == 0 { f64::NAN } else { *sum / f64::from(count) };
    });
    sums
}

/// Reduction of categorical pixel values to one cell
#[derive(Debug, Clone, PartialEq)]
pub enum CategoricalRule {
    /// Count of `flag` pixels; `0` when every pixel is background; `na` otherwise
    FlagCount { flag: f64, background: Vec<f64> },
    /// Share of `target` among pixels whose value is in `valid`, in percent
    Percentage {
        target: f64,
        valid: Vec<f64>,
        decimals: u32,
    },
    /// Sum of the pixels whose value is in `valid`
    ValidSum { valid: Vec<f64> },
    /// Number of `target` pixels among those whose value is in `valid`
    ValidCount { target: f64, valid: Vec<f64> },
}

fn keep_valid<'a>(values: &'a [f64], valid: &'a [f64]) -> impl Iterator<Item = f64> + 'a {
    values.iter().copied().filter(move |v| valid.contains(v))
}

impl CategoricalRule {
    pub fn apply(&self, values: &[f64]) -> Cell {
        let values: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        match self {
            CategoricalRule::FlagCount { flag, background } => {
                if values.is_empty() {
                    return Cell::NotAvailable;
                }
                let flagged = values.iter().filter(|&&v| v == *flag).count();
                if flagged > 0 {
                    Cell::Count(flagged as u64)
                } else if values.iter().all(|v| background.contains(v)) {
                    Cell::Count(0)
                } else {
                    Cell::NotAvailable
                }
            }
            CategoricalRule::Percentage {
                target,
                valid,
                decimals,
            } => {
                let kept: Vec<f64> = keep_valid(&values, valid).collect();
                if kept.is_empty() {
                    return Cell::NotAvailable;
                }
                let hits = kept.iter().filter(|&&v| v == *target).count();
                let share = hits as f64 / kept.len() as f64 * 100.0;
                Cell::Value(round_to(share, *decimals) as f32)
            }
            CategoricalRule::ValidSum { valid } => {
                let kept: Vec<f64> = keep_valid(&values, valid).collect();
                if kept.is_empty() {
                    return Cell::NotAvailable;
                }
                let sum: f64 = kept.iter().sum();
                if sum >= 0.0 && sum.fract() == 0.0 {
                    Cell::Count(sum as u64)
                } else {
                    Cell::Value(sum as f32)
                }
            }
            CategoricalRule::ValidCount { target, valid } => {
                let kept: Vec<f64> = keep_valid(&values, valid).collect();
                if kept.is_empty() {
                    return Cell::NotAvailable;
                }
                Cell::Count(kept.iter().filter(|&&v| v == *target).count() as u64)
            }
        }
    }
}

/// Categorical rule together with how absent units are reported
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutput {
    pub rule: CategoricalRule,
    /// Evaluate units seen on other dates but absent on this one as an empty
    /// sample set instead of leaving the cell missing
    pub fill_absent: bool,
}
