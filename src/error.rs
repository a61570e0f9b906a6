// Error states produced by the chart engine

use thiserror::Error;

pub type ChartResult<T> = std::result::Result<T, ChartError>;

/// Every way a render or normalization can fail.
///
/// None of these are fatal to the host: `runtime::render_or_placeholder`
/// turns each one into a labelled placeholder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    /// The series is missing or has no records
    #[error("No data available")]
    EmptySeries,

    /// `x_field` or `y_field` was not supplied in the chart configuration
    #[error("Missing chart configuration: {0}")]
    MissingFieldConfig(&'static str),

    /// A value could not be coerced to a number (fail-fast only)
    #[error("Value '{raw}' in field '{field}' at row {row} is not numeric")]
    UnparseableValue {
        row: usize,
        field: String,
        raw: String,
    },

    /// A record did not supply the requested field (fail-fast only)
    #[error("Field '{field}' is missing at row {row}")]
    MissingValue { row: usize, field: String },

    /// Pie values sum to zero (fail-fast only)
    #[error("Pie values sum to zero; slice percentages are undefined")]
    ZeroTotal,

    /// Trend starts at zero so its percentage change is undefined (fail-fast only)
    #[error("Trend starts at zero; percentage change is undefined")]
    UndefinedChange,

    /// The metric field is absent from the tool result
    #[error("Metric field '{0}' not found in tool result")]
    MissingMetric(String),

    /// The payload could not be decoded into the expected shape
    #[error("Invalid chart payload: {0}")]
    InvalidPayload(String),
}

impl ChartError {
    /// Short machine-readable tag used by placeholders
    pub fn reason(&self) -> &'static str {
        match self {
            ChartError::EmptySeries => "empty_series",
            ChartError::MissingFieldConfig(_) => "missing_field_config",
            ChartError::UnparseableValue { .. } => "unparseable_value",
            ChartError::MissingValue { .. } => "missing_value",
            ChartError::ZeroTotal => "zero_total",
            ChartError::UndefinedChange => "undefined_change",
            ChartError::MissingMetric(_) => "missing_metric",
            ChartError::InvalidPayload(_) => "invalid_payload",
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(err: serde_json::Error) -> Self {
        ChartError::InvalidPayload(err.to_string())
    }
}
