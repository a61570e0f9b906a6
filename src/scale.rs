use serde::Serialize;
use tracing::debug;

use crate::error::{ChartError, ChartResult};

/// Padding policy shared by the chart kinds.
///
/// Line and scatter charts pad their domain by 10%, bar and pie charts by 15%.
/// A flat series (min == max) cannot be padded proportionally, so it falls
/// back to a fixed amount instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    Line,
    Bar,
}

impl Framing {
    pub fn padding_factor(self) -> f64 {
        match self {
            Framing::Line => 0.10,
            Framing::Bar => 0.15,
        }
    }

    pub fn flat_padding(self) -> f64 {
        match self {
            Framing::Line => 2.0,
            Framing::Bar => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    /// Screen y grows downward, so larger values map to smaller pixels
    Vertical,
}

/// A run of pixels starting at `origin` (the inset reserved for labels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelSpan {
    pub origin: f64,
    pub extent: f64,
}

impl PixelSpan {
    pub fn new(origin: f64, extent: f64) -> Self {
        PixelSpan { origin, extent }
    }

    pub fn end(&self) -> f64 {
        self.origin + self.extent
    }
}

/// Linear value-to-pixel mapping for one axis of one render
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scale {
    pub data_min: f64,
    pub data_max: f64,
    pub padding: f64,
    /// Padded domain actually mapped onto the span
    pub lower: f64,
    pub upper: f64,
    pub span: PixelSpan,
    pub axis: Axis,
}

impl Scale {
    /// Build a scale from the raw values of one axis
    pub fn from_values(
        values: &[f64],
        framing: Framing,
        span: PixelSpan,
        axis: Axis,
    ) -> ChartResult<Scale> {
        let mm = min_max(values).ok_or(ChartError::EmptySeries)?;
        let padding = compute_padding(mm.min, mm.max, framing);
        let (lower, upper) = pad_range(mm.min, mm.max, padding);

        debug!(
            min = mm.min,
            max = mm.max,
            padding,
            lower,
            upper,
            ?axis,
            "computed scale"
        );

        Ok(Scale {
            data_min: mm.min,
            data_max: mm.max,
            padding,
            lower,
            upper,
            span,
            axis,
        })
    }

    /// Map a data value onto the pixel span
    pub fn map(&self, value: f64) -> f64 {
        let t = (value - self.lower) / (self.upper - self.lower);
        match self.axis {
            Axis::Horizontal => self.span.origin + t * self.span.extent,
            Axis::Vertical => self.span.end() - t * self.span.extent,
        }
    }

    /// Clamp a value into the padded domain
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

fn min_max(values: &[f64]) -> Option<MinMax> {
    if values.is_empty() {
        return None;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &val in values {
        if val < min { min = val; }
        if val > max { max = val; }
    }
    Some(MinMax { min, max })
}

fn compute_padding(min: f64, max: f64, framing: Framing) -> f64 {
    if min == max {
        framing.flat_padding()
    } else {
        (max - min) * framing.padding_factor()
    }
}

/// Axis floor never drops below zero unless the data itself is negative
fn pad_range(min: f64, max: f64, padding: f64) -> (f64, f64) {
    let lower = if min < 0.0 {
        min - padding
    } else {
        (min - padding).max(0.0)
    };
    (lower, max + padding)
}
