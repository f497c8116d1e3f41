use serde::Serialize;

use crate::money::round_to_cents;

/// The value range of a chart's y-axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

/// The y-axis range that fits every value in `values` and always includes zero.
///
/// When every value is zero the axis is `0..1` so that charts never have a
/// zero-height scale.
pub fn axis_bounds(values: impl IntoIterator<Item = f64>) -> AxisBounds {
    let (min, max) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((0.0_f64, 0.0_f64), |(min, max), value| {
            (min.min(value), max.max(value))
        });

    if min == max {
        AxisBounds { min: 0.0, max: 1.0 }
    } else {
        AxisBounds {
            min: round_to_cents(min),
            max: round_to_cents(max),
        }
    }
}
