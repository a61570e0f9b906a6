// Metric tool results (numeric or pre-formatted values) into one canonical shape

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::FailurePolicy;
use crate::error::{ChartError, ChartResult};
use crate::ir::Diagnostic;
use crate::payload::ChartRequest;
use crate::transform::numeric_field;
use crate::trend::{derive_trend, SuppliedTrend, TrendSummary};
use crate::value::{format_number, parse_numeric_text, Record, Series};

/// The headline value before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Numeric(f64),
    Preformatted(String),
}

impl MetricValue {
    fn from_json(value: &Value) -> Option<MetricValue> {
        match value {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(MetricValue::Numeric),
            Value::String(s) => Some(MetricValue::Preformatted(s.clone())),
            other => Some(MetricValue::Preformatted(other.to_string())),
        }
    }
}

/// Where to find each part of a metric tool result
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub value_field: String,
    /// Defaults to `<value_field>_formatted`
    pub formatted_field: Option<String>,
    pub trend_field: String,
    pub trend_value_field: String,
    pub trend_label_field: String,
}

impl MetricSpec {
    pub fn new(value_field: &str) -> Self {
        MetricSpec {
            value_field: value_field.to_string(),
            formatted_field: None,
            trend_field: "trend".to_string(),
            trend_value_field: "rate".to_string(),
            trend_label_field: "date".to_string(),
        }
    }

    pub fn formatted_field(&self) -> String {
        self.formatted_field
            .clone()
            .unwrap_or_else(|| format!("{}_formatted", self.value_field))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Benchmark {
    #[serde(default)]
    pub industry_average: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMetric {
    pub numeric_value: f64,
    pub display_string: String,
    pub series: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_summary: Option<TrendSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<Benchmark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizedMetric {
    /// Line chart payload for the trend series
    pub fn trend_chart(&self, spec: &MetricSpec) -> ChartRequest {
        let mut request = ChartRequest::new(
            "line",
            self.series.clone(),
            &spec.trend_label_field,
            &spec.trend_value_field,
        );
        request.description = self.trend_summary.as_ref().map(|t| t.description.clone());
        request
    }
}

/// Normalize one metric tool result
pub fn normalize_metric(
    result: &Value,
    spec: &MetricSpec,
    policy: FailurePolicy,
) -> ChartResult<NormalizedMetric> {
    let object = result
        .as_object()
        .ok_or_else(|| ChartError::InvalidPayload("Tool result must be an object".to_string()))?;
    let mut diagnostics = Vec::new();

    let raw = object
        .get(&spec.value_field)
        .and_then(MetricValue::from_json)
        .ok_or_else(|| ChartError::MissingMetric(spec.value_field.clone()))?;

    let numeric_value = match &raw {
        MetricValue::Numeric(v) => *v,
        MetricValue::Preformatted(text) => match parse_numeric_text(text) {
            Some((v, _)) => v,
            None => {
                if policy.is_strict() {
                    return Err(ChartError::UnparseableValue {
                        row: 0,
                        field: spec.value_field.clone(),
                        raw: text.clone(),
                    });
                }
                warn!(field = %spec.value_field, raw = %text, "metric value coerced to 0");
                diagnostics.push(Diagnostic::CoercedValue {
                    row: 0,
                    field: spec.value_field.clone(),
                    raw: text.clone(),
                });
                0.0
            }
        },
    };

    let display_string = match object.get(&spec.formatted_field()) {
        Some(Value::String(formatted)) => formatted.clone(),
        _ => match &raw {
            MetricValue::Preformatted(text) => text.clone(),
            MetricValue::Numeric(v) => format!("{}%", format_number(*v)),
        },
    };

    let series = trend_series(object, &spec.trend_field)?;
    let trend_summary = match supplied_trend(object) {
        Some(summary) => Some(summary),
        None => {
            let mut values = Vec::with_capacity(series.len());
            for (row, record) in series.iter().enumerate() {
                values.push(numeric_field(
                    record,
                    row,
                    &spec.trend_value_field,
                    policy,
                    &mut diagnostics,
                )?);
            }
            derive_trend(&values, &spec.trend_value_field, policy, &mut diagnostics)?
        }
    };

    let benchmark = object
        .get("benchmark")
        .and_then(|b| serde_json::from_value::<Benchmark>(b.clone()).ok());
    let status = object.get("status").and_then(Value::as_str).map(str::to_string);

    debug!(
        field = %spec.value_field,
        numeric_value,
        display = %display_string,
        points = series.len(),
        "normalized metric"
    );

    Ok(NormalizedMetric {
        numeric_value,
        display_string,
        series,
        trend_summary,
        benchmark,
        status,
        diagnostics,
    })
}

fn trend_series(object: &Record, trend_field: &str) -> ChartResult<Series> {
    match object.get(trend_field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record.clone()),
                _ => Err(ChartError::InvalidPayload(format!(
                    "Trend field '{}' must contain objects",
                    trend_field
                ))),
            })
            .collect(),
        Some(_) => Err(ChartError::InvalidPayload(format!(
            "Trend field '{}' must be an array",
            trend_field
        ))),
    }
}

fn supplied_trend(object: &Record) -> Option<TrendSummary> {
    let analysis = object.get("trend_analysis")?;
    match serde_json::from_value::<SuppliedTrend>(analysis.clone()) {
        Ok(supplied) => Some(supplied.into()),
        Err(err) => {
            warn!(error = %err, "ignoring malformed trend_analysis; deriving instead");
            None
        }
    }
}
