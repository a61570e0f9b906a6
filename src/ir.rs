use serde::{Serialize, Serializer};

use crate::scale::{Framing, Scale};

/// The four chart kinds the engine can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
        }
    }

    pub fn framing(self) -> Framing {
        match self {
            ChartKind::Line | ChartKind::Scatter => Framing::Line,
            ChartKind::Bar | ChartKind::Pie => Framing::Bar,
        }
    }
}

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// How a requested kind string was turned into a `ChartKind`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KindResolution {
    /// Matched a kind name directly
    Exact,
    /// `multi-line` / `multi-bar`, rendered as their single-series form
    Alias,
    /// `auto`, inferred from the data
    Inferred,
    /// Unrecognized; fell back to bar
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSelection {
    pub kind: ChartKind,
    pub requested: String,
    pub resolution: KindResolution,
}

/// A chart request whose fields and kind have been validated
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChart {
    pub selection: ChartSelection,
    pub x_field: String,
    pub y_field: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Phase 2: Extraction
// =============================================================================

/// Labels and numbers pulled out of a series, in series order.
/// `x_values` is only populated for scatter charts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
}

impl ChartData {
    pub fn len(&self) -> usize {
        self.y_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_values.is_empty()
    }
}

/// A percentage that may be undefined (zero denominator).
///
/// Serializes as a number, or as the string `"undefined"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    Defined(f64),
    Undefined,
}

impl Percentage {
    /// `part / whole * 100`, undefined when `whole` is zero
    pub fn of(part: f64, whole: f64) -> Percentage {
        if whole == 0.0 {
            Percentage::Undefined
        } else {
            Percentage::Defined(part / whole * 100.0)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Percentage::Defined(v) => Some(v),
            Percentage::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Percentage::Undefined)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Percentage::Defined(v) => serializer.serialize_f64(*v),
            Percentage::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

/// Non-fatal events worth surfacing next to the geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    UnknownChartKind { requested: String, fallback: ChartKind },
    CoercedValue { row: usize, field: String, raw: String },
    MissingValue { row: usize, field: String },
    UndefinedPercentages,
    UndefinedTrendChange,
}

// =============================================================================
// Phase 3: Geometry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub label: String,
    pub value: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineGeometry {
    pub points: Vec<PlotPoint>,
    /// SVG path: move to the first point, straight lines to the rest
    pub path: String,
    pub y_scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRect {
    pub label: String,
    pub value: f64,
    // Top-left corner plus size, in pixels
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color_index: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarGeometry {
    pub bars: Vec<BarRect>,
    pub slot_width: f64,
    /// Pixel row of the zero line (or the domain edge nearest to it)
    pub baseline: f64,
    pub y_scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    // Degrees, 0 at 3 o'clock, growing clockwise on screen
    pub start_angle: f64,
    pub end_angle: f64,
    pub sweep: f64,
    pub percentage: Percentage,
    pub color_index: usize,
    pub color: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieGeometry {
    pub slices: Vec<PieSlice>,
    pub total: f64,
    pub center: (f64, f64),
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub label: String,
    pub x_value: f64,
    pub y_value: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterGeometry {
    pub points: Vec<ScatterPoint>,
    pub x_scale: Scale,
    pub y_scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Line(LineGeometry),
    Bar(BarGeometry),
    Pie(PieGeometry),
    Scatter(ScatterGeometry),
}

impl Geometry {
    pub fn kind(&self) -> ChartKind {
        match self {
            Geometry::Line(_) => ChartKind::Line,
            Geometry::Bar(_) => ChartKind::Bar,
            Geometry::Pie(_) => ChartKind::Pie,
            Geometry::Scatter(_) => ChartKind::Scatter,
        }
    }
}

// =============================================================================
// Phase 4: Scene
// =============================================================================

/// Everything a presentation layer needs to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartScene {
    pub kind: ChartKind,
    pub requested_kind: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub width: u32,
    pub height: u32,
    pub total_data_points: usize,
    pub x_field: String,
    pub y_field: String,
    pub geometry: Geometry,
    pub diagnostics: Vec<Diagnostic>,
}

impl ChartScene {
    /// True when the requested kind was not recognized
    pub fn used_fallback(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::UnknownChartKind { .. }))
    }
}
