// Data structure inference: field types, suggested axes, optimal chart kind

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::value::{parse_numeric_text, NumericText, Record};

/// Share of values that must agree before a field is typed numeric / date
const TYPE_THRESHOLD: f64 = 0.8;
/// Fields with fewer distinct values than this share are categorical
const CATEGORICAL_THRESHOLD: f64 = 0.5;
/// Only the first few values are probed for dates
const DATE_PROBE: usize = 10;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y-%m", "%m/%d/%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Date,
    DateTime,
    Categorical,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldProfile {
    pub name: String,
    pub kind: FieldKind,
    pub unique_count: usize,
    pub is_percentage: bool,
    pub is_currency: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPattern {
    TimeSeries,
    CategoricalBreakdown,
    MultiMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataAnalysis {
    pub total_records: usize,
    pub fields: Vec<FieldProfile>,
    pub has_time_series: bool,
    pub has_categories: bool,
    pub has_percentages: bool,
    pub suggested_x_field: Option<String>,
    pub suggested_y_field: Option<String>,
    pub patterns: Vec<DataPattern>,
}

impl DataAnalysis {
    pub fn has_pattern(&self, pattern: DataPattern) -> bool {
        self.patterns.contains(&pattern)
    }

    pub fn field(&self, name: &str) -> Option<&FieldProfile> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Best chart kind name for this data (may be `multi-bar`)
    pub fn optimal_chart_type(&self) -> &'static str {
        if self.has_pattern(DataPattern::TimeSeries) {
            "line"
        } else if self.has_pattern(DataPattern::CategoricalBreakdown) {
            "pie"
        } else if self.has_pattern(DataPattern::MultiMetric) {
            "multi-bar"
        } else if self.has_categories {
            "bar"
        } else {
            "line"
        }
    }
}

/// Analyze the records to suggest a chart configuration.
///
/// Fields are taken from the first record, in order.
pub fn analyze_data(series: &[Record]) -> DataAnalysis {
    let mut analysis = DataAnalysis {
        total_records: series.len(),
        fields: Vec::new(),
        has_time_series: false,
        has_categories: false,
        has_percentages: false,
        suggested_x_field: None,
        suggested_y_field: None,
        patterns: Vec::new(),
    };

    let Some(sample) = series.first() else {
        return analysis;
    };

    for name in sample.keys() {
        let values: Vec<&Value> = series
            .iter()
            .filter_map(|r| r.get(name))
            .filter(|v| !v.is_null())
            .collect();
        if values.is_empty() {
            continue;
        }

        let profile = analyze_field(name, &values);
        match profile.kind {
            FieldKind::Date | FieldKind::DateTime => {
                analysis.has_time_series = true;
                if analysis.suggested_x_field.is_none() {
                    analysis.suggested_x_field = Some(name.clone());
                }
            }
            FieldKind::Categorical => analysis.has_categories = true,
            FieldKind::Numeric => {
                if analysis.suggested_y_field.is_none() {
                    analysis.suggested_y_field = Some(name.clone());
                }
            }
            FieldKind::Text => {}
        }
        if profile.is_percentage {
            analysis.has_percentages = true;
        }
        analysis.fields.push(profile);
    }

    // No date field: label the x axis with the first categorical, then text, field
    if analysis.suggested_x_field.is_none() {
        analysis.suggested_x_field = [FieldKind::Categorical, FieldKind::Text]
            .iter()
            .find_map(|kind| analysis.fields.iter().find(|f| f.kind == *kind))
            .map(|f| f.name.clone());
    }

    if analysis.has_time_series {
        analysis.patterns.push(DataPattern::TimeSeries);
    }
    if analysis.has_categories && analysis.has_percentages {
        analysis.patterns.push(DataPattern::CategoricalBreakdown);
    }
    let numeric_fields = analysis
        .fields
        .iter()
        .filter(|f| f.kind == FieldKind::Numeric)
        .count();
    if numeric_fields > 2 {
        analysis.patterns.push(DataPattern::MultiMetric);
    }

    analysis
}

/// Determine the type and characteristics of one field
fn analyze_field(name: &str, values: &[&Value]) -> FieldProfile {
    let unique_count = values
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<HashSet<_>>()
        .len();

    let mut profile = FieldProfile {
        name: name.to_string(),
        kind: FieldKind::Text,
        unique_count,
        is_percentage: false,
        is_currency: false,
        range: None,
        average: None,
        date_format: None,
    };

    let mut numeric = Vec::new();
    for value in values {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    numeric.push(v);
                }
            }
            Value::String(s) => {
                if let Some((v, flavour)) = parse_numeric_text(s) {
                    match flavour {
                        NumericText::Percentage => profile.is_percentage = true,
                        NumericText::Currency => profile.is_currency = true,
                        NumericText::Plain => {}
                    }
                    numeric.push(v);
                }
            }
            _ => {}
        }
    }

    let mut typed = false;
    if numeric.len() as f64 > values.len() as f64 * TYPE_THRESHOLD {
        let min = numeric.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = numeric.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        profile.kind = FieldKind::Numeric;
        profile.range = Some((min, max));
        profile.average = Some(numeric.iter().sum::<f64>() / numeric.len() as f64);
        typed = true;
    }

    if let Some((kind, format)) = detect_date_format(values) {
        profile.kind = kind;
        profile.date_format = Some(format);
        typed = true;
    }

    if !typed {
        profile.kind = if (unique_count as f64) < values.len() as f64 * CATEGORICAL_THRESHOLD {
            FieldKind::Categorical
        } else {
            FieldKind::Text
        };
    }

    profile
}

/// First format that parses every string among the probed values, provided
/// strings make up most of the probe
fn detect_date_format(values: &[&Value]) -> Option<(FieldKind, &'static str)> {
    let probe: Vec<&str> = values
        .iter()
        .take(DATE_PROBE)
        .filter_map(|v| v.as_str())
        .collect();
    let probed = values.len().min(DATE_PROBE);
    if probe.is_empty() || probe.len() as f64 <= probed as f64 * TYPE_THRESHOLD {
        return None;
    }

    let candidates = DATE_FORMATS
        .iter()
        .map(|f| (FieldKind::Date, *f))
        .chain(DATETIME_FORMATS.iter().map(|f| (FieldKind::DateTime, *f)));

    for (kind, format) in candidates {
        if probe.iter().all(|s| parses_as(s.trim(), kind, format)) {
            return Some((kind, format));
        }
    }
    None
}

fn parses_as(text: &str, kind: FieldKind, format: &str) -> bool {
    match kind {
        FieldKind::DateTime => NaiveDateTime::parse_from_str(text, format).is_ok(),
        // chrono needs a day to build a date
        _ if format == "%Y-%m" => {
            NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d").is_ok()
        }
        _ => NaiveDate::parse_from_str(text, format).is_ok(),
    }
}

/// Title-case a field or kind name: `churn_rate` → `Churn Rate`
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

/// Auto-generate a chart title from the kind and fields
pub fn generate_title(
    chart_type: &str,
    x_field: Option<&str>,
    y_field: Option<&str>,
    analysis: &DataAnalysis,
) -> String {
    let x = title_case(x_field.unwrap_or(""));
    let y = title_case(y_field.unwrap_or(""));
    match chart_type {
        "line" if analysis.has_pattern(DataPattern::TimeSeries) => format!("{} Over Time", y),
        "bar" => format!("{} by {}", y, x),
        "pie" => format!("{} Distribution", y),
        other => format!("{} Chart", title_case(other)),
    }
}

/// Auto-generate a chart description from the analysis
pub fn generate_description(analysis: &DataAnalysis) -> String {
    let mut parts = vec![format!("Chart showing {} data points", analysis.total_records)];
    if analysis.has_pattern(DataPattern::TimeSeries) {
        parts.push("with time series analysis".to_string());
    }
    if analysis.has_pattern(DataPattern::CategoricalBreakdown) {
        parts.push("with categorical breakdown".to_string());
    }
    if analysis.has_pattern(DataPattern::MultiMetric) {
        parts.push("with multiple metrics".to_string());
    }
    parts.join(". ") + "."
}
