use tracing::warn;

use crate::config::FailurePolicy;
use crate::error::{ChartError, ChartResult};
use crate::ir::{ChartData, ChartKind, Diagnostic, ResolvedChart};
use crate::value::{coerce, display_label, Coerced, Record};

/// Main entry point: pull labels and numbers for a resolved chart out of its series
pub fn extract_chart_data(
    chart: &ResolvedChart,
    series: &[Record],
    policy: FailurePolicy,
) -> ChartResult<(ChartData, Vec<Diagnostic>)> {
    if series.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let mut diagnostics = Vec::new();
    let mut data = ChartData {
        labels: Vec::with_capacity(series.len()),
        x_values: Vec::new(),
        y_values: Vec::with_capacity(series.len()),
    };
    let numeric_x = matches!(chart.selection.kind, ChartKind::Scatter);

    for (row, record) in series.iter().enumerate() {
        if numeric_x {
            let x = numeric_field(record, row, &chart.x_field, policy, &mut diagnostics)?;
            data.x_values.push(x);
        } else {
            require_label(record, row, &chart.x_field, policy, &mut diagnostics)?;
        }
        data.labels.push(display_label(record.get(&chart.x_field)));

        let y = numeric_field(record, row, &chart.y_field, policy, &mut diagnostics)?;
        data.y_values.push(y);
    }

    Ok((data, diagnostics))
}

/// Category labels must be present; a missing one is labelled "" under fail-soft
fn require_label(
    record: &Record,
    row: usize,
    field: &str,
    policy: FailurePolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> ChartResult<()> {
    if !matches!(coerce(record.get(field)), Coerced::Missing) {
        return Ok(());
    }
    if policy.is_strict() {
        return Err(ChartError::MissingValue {
            row,
            field: field.to_string(),
        });
    }
    warn!(row, field, "missing label left blank");
    diagnostics.push(Diagnostic::MissingValue {
        row,
        field: field.to_string(),
    });
    Ok(())
}

/// Coerce one field of one record, applying the failure policy
pub fn numeric_field(
    record: &Record,
    row: usize,
    field: &str,
    policy: FailurePolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> ChartResult<f64> {
    match coerce(record.get(field)) {
        Coerced::Number(v) => Ok(v),
        Coerced::Missing => {
            if policy.is_strict() {
                return Err(ChartError::MissingValue {
                    row,
                    field: field.to_string(),
                });
            }
            warn!(row, field, "missing value treated as 0");
            diagnostics.push(Diagnostic::MissingValue {
                row,
                field: field.to_string(),
            });
            Ok(0.0)
        }
        Coerced::Unparseable(raw) => {
            if policy.is_strict() {
                return Err(ChartError::UnparseableValue {
                    row,
                    field: field.to_string(),
                    raw,
                });
            }
            warn!(row, field, raw = %raw, "unparseable value coerced to 0");
            diagnostics.push(Diagnostic::CoercedValue {
                row,
                field: field.to_string(),
                raw,
            });
            Ok(0.0)
        }
    }
}
