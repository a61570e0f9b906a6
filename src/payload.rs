// Wire shapes accepted from the hosting tool framework

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChartError, ChartResult};
use crate::value::{Record, Series};

fn default_chart_type() -> String {
    "auto".to_string()
}

/// Field mapping and renderer options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_field: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
    /// Some producers nest the records here instead of at the top level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Series>,
}

/// A chart payload as produced by a charting tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default)]
    pub data: Series,
    #[serde(default)]
    pub config: FieldConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ChartRequest {
    fn default() -> Self {
        ChartRequest {
            chart_type: default_chart_type(),
            data: Vec::new(),
            config: FieldConfig::default(),
            title: None,
            description: None,
        }
    }
}

impl ChartRequest {
    pub fn new(chart_type: &str, data: Series, x_field: &str, y_field: &str) -> Self {
        ChartRequest {
            chart_type: chart_type.to_string(),
            data,
            config: FieldConfig {
                x_field: Some(x_field.to_string()),
                y_field: Some(y_field.to_string()),
                ..FieldConfig::default()
            },
            ..ChartRequest::default()
        }
    }

    pub fn from_json_str(text: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Records to chart: top-level `data`, else `config.data`
    pub fn series(&self) -> &[Record] {
        if self.data.is_empty() {
            if let Some(nested) = &self.config.data {
                return nested;
            }
        }
        &self.data
    }
}

/// Accept raw data as a JSON string, a single object, or an array of objects
pub fn series_from_value(data: &Value) -> ChartResult<Series> {
    match data {
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text)
                .map_err(|_| ChartError::InvalidPayload("Invalid JSON data provided".to_string()))?;
            series_from_value(&parsed)
        }
        Value::Object(record) => {
            if record.is_empty() {
                return Err(ChartError::EmptySeries);
            }
            Ok(vec![record.clone()])
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Err(ChartError::EmptySeries);
            }
            items
                .iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record.clone()),
                    _ => Err(ChartError::InvalidPayload(
                        "Data must be a list of objects or a single object".to_string(),
                    )),
                })
                .collect()
        }
        Value::Null => Err(ChartError::EmptySeries),
        _ => Err(ChartError::InvalidPayload(
            "Data must be a list of objects or a single object".to_string(),
        )),
    }
}
