// First-to-last change summary for a metric trend

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::FailurePolicy;
use crate::error::{ChartError, ChartResult};
use crate::ir::{Diagnostic, Percentage};
use crate::value::format_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub change_absolute: f64,
    pub change_percentage: Percentage,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    /// False when the tool supplied the summary itself
    pub derived: bool,
}

/// Summary as tools report it (`trend_analysis`)
#[derive(Debug, Clone, Deserialize)]
pub struct SuppliedTrend {
    pub direction: TrendDirection,
    pub change_absolute: f64,
    #[serde(default)]
    pub change_percentage: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub projection: Option<String>,
}

impl From<SuppliedTrend> for TrendSummary {
    fn from(s: SuppliedTrend) -> Self {
        TrendSummary {
            direction: s.direction,
            change_absolute: s.change_absolute,
            change_percentage: s
                .change_percentage
                .map(Percentage::Defined)
                .unwrap_or(Percentage::Undefined),
            description: s.description,
            projection: s.projection,
            derived: false,
        }
    }
}

/// Derive a summary from the first and last values of a trend.
///
/// Needs at least two points. A flat trend reports `Increasing`. A trend
/// starting at zero has no defined percentage change.
pub fn derive_trend(
    values: &[f64],
    field: &str,
    policy: FailurePolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> ChartResult<Option<TrendSummary>> {
    let (first, last) = match values {
        [first, .., last] => (*first, *last),
        _ => return Ok(None),
    };

    let direction = if first > last {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Increasing
    };
    let change_absolute = last - first;
    let change_percentage = Percentage::of(change_absolute, first);

    if change_percentage.is_undefined() {
        if policy.is_strict() {
            return Err(ChartError::UndefinedChange);
        }
        warn!(field, "trend starts at zero; percentage change undefined");
        diagnostics.push(Diagnostic::UndefinedTrendChange);
    }

    let description = if first == last {
        format!("The {} has remained at {} over the period.", field, format_number(first))
    } else {
        let verb = match direction {
            TrendDirection::Decreasing => "decreased",
            _ => "increased",
        };
        format!(
            "The {} has {} from {} to {} over the period.",
            field,
            verb,
            format_number(first),
            format_number(last)
        )
    };

    Ok(Some(TrendSummary {
        direction,
        change_absolute,
        change_percentage,
        description,
        projection: None,
        derived: true,
    }))
}
