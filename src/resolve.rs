use serde_json::Value;
use tracing::debug;

use crate::analysis::{analyze_data, generate_description, generate_title, DataAnalysis};
use crate::error::{ChartError, ChartResult};
use crate::ir::{KindResolution, ResolvedChart};
use crate::payload::{series_from_value, ChartRequest, FieldConfig};
use crate::runtime::select_chart_kind;
use crate::value::Record;

/// Resolve the chart kind and field mapping for a request
pub fn resolve_chart(request: &ChartRequest, series: &[Record]) -> ChartResult<ResolvedChart> {
    // 1. Analysis only when something has to be inferred
    let inferring = request.chart_type.trim().eq_ignore_ascii_case("auto");
    let analysis = inferring.then(|| analyze_data(series));

    // 2. Kind
    let selection = select_chart_kind(&request.chart_type, analysis.as_ref());

    // 3. Fields: explicit config wins, `auto` may fill the gaps
    let x_field = resolve_field(
        request.config.x_field.as_deref(),
        analysis.as_ref().and_then(|a| a.suggested_x_field.as_deref()),
        "x_field",
    )?;
    let y_field = resolve_field(
        request.config.y_field.as_deref(),
        analysis.as_ref().and_then(|a| a.suggested_y_field.as_deref()),
        "y_field",
    )?;

    debug!(
        kind = selection.kind.as_str(),
        resolution = ?selection.resolution,
        x_field = %x_field,
        y_field = %y_field,
        "resolved chart"
    );

    // 4. Titles for inferred charts come from the analysis as well, named
    // after the inferred type (`multi-bar`) rather than the kind drawn
    let (title, description) = match &analysis {
        Some(analysis) if selection.resolution == KindResolution::Inferred => (
            request.title.clone().or_else(|| {
                Some(generate_title(
                    analysis.optimal_chart_type(),
                    Some(&x_field),
                    Some(&y_field),
                    analysis,
                ))
            }),
            request
                .description
                .clone()
                .or_else(|| Some(generate_description(analysis))),
        ),
        _ => (request.title.clone(), request.description.clone()),
    };

    Ok(ResolvedChart {
        selection,
        x_field,
        y_field,
        title,
        description,
    })
}

fn resolve_field(
    configured: Option<&str>,
    suggested: Option<&str>,
    name: &'static str,
) -> ChartResult<String> {
    configured
        .filter(|f| !f.trim().is_empty())
        .or(suggested)
        .map(str::to_string)
        .ok_or(ChartError::MissingFieldConfig(name))
}

/// Build a complete chart payload from raw data.
///
/// `data` may be a JSON string, a single object or an array of objects.
/// Anything not supplied is inferred from the data analysis, which is
/// returned alongside the payload.
pub fn prepare_request(
    data: &Value,
    chart_type: Option<&str>,
    x_field: Option<&str>,
    y_field: Option<&str>,
    title: Option<&str>,
    description: Option<&str>,
) -> ChartResult<(ChartRequest, DataAnalysis)> {
    let series = series_from_value(data)?;
    let analysis = analyze_data(&series);

    let chart_type = match chart_type.map(str::trim) {
        None | Some("") => analysis.optimal_chart_type().to_string(),
        Some(t) if t.eq_ignore_ascii_case("auto") => analysis.optimal_chart_type().to_string(),
        Some(t) => t.to_lowercase(),
    };

    let x_field = resolve_field(x_field, analysis.suggested_x_field.as_deref(), "x_field")?;
    let y_field = resolve_field(y_field, analysis.suggested_y_field.as_deref(), "y_field")?;

    let title = title
        .map(str::to_string)
        .unwrap_or_else(|| generate_title(&chart_type, Some(&x_field), Some(&y_field), &analysis));
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| generate_description(&analysis));

    let request = ChartRequest {
        chart_type,
        data: series,
        config: FieldConfig {
            x_field: Some(x_field),
            y_field: Some(y_field),
            ..FieldConfig::default()
        },
        title: Some(title),
        description: Some(description),
    };
    Ok((request, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ChartKind;
    use serde_json::json;

    fn request(value: Value) -> ChartRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_explicit_fields() {
        let req = request(json!({
            "chart_type": "Bar",
            "data": [{"region": "EU", "sales": 3}],
            "config": {"x_field": "region", "y_field": "sales"}
        }));
        let resolved = resolve_chart(&req, req.series()).unwrap();
        assert_eq!(resolved.selection.kind, ChartKind::Bar);
        assert_eq!(resolved.x_field, "region");
        assert_eq!(resolved.y_field, "sales");
        assert_eq!(resolved.title, None);
    }

    #[test]
    fn test_resolve_missing_fields() {
        let req = request(json!({
            "chart_type": "line",
            "data": [{"a": 1}],
            "config": {"y_field": "a"}
        }));
        assert_eq!(
            resolve_chart(&req, req.series()),
            Err(ChartError::MissingFieldConfig("x_field"))
        );

        let req = request(json!({
            "chart_type": "line",
            "data": [{"a": 1}],
            "config": {"x_field": "a", "y_field": ""}
        }));
        assert_eq!(
            resolve_chart(&req, req.series()),
            Err(ChartError::MissingFieldConfig("y_field"))
        );
    }

    #[test]
    fn test_resolve_auto_fills_fields_and_title() {
        let req = request(json!({
            "data": [
                {"date": "2024-01-01", "sales": 10},
                {"date": "2024-01-02", "sales": 12}
            ]
        }));
        let resolved = resolve_chart(&req, req.series()).unwrap();
        assert_eq!(resolved.selection.kind, ChartKind::Line);
        assert_eq!(resolved.selection.resolution, KindResolution::Inferred);
        assert_eq!(resolved.x_field, "date");
        assert_eq!(resolved.y_field, "sales");
        assert_eq!(resolved.title.as_deref(), Some("Sales Over Time"));
    }

    #[test]
    fn test_auto_title_matches_prepared_payload() {
        let data = json!([
            {"name": "a", "q1": 1, "q2": 2, "q3": 3},
            {"name": "b", "q1": 4, "q2": 5, "q3": 6}
        ]);
        let (prepared, _) = prepare_request(&data, None, None, None, None, None).unwrap();
        assert_eq!(prepared.title.as_deref(), Some("Multi-Bar Chart"));

        let req = request(json!({"chart_type": "auto", "data": data}));
        let resolved = resolve_chart(&req, req.series()).unwrap();
        assert_eq!(resolved.selection.kind, ChartKind::Bar);
        assert_eq!(resolved.title, prepared.title);
        assert_eq!(resolved.description, prepared.description);
    }

    #[test]
    fn test_prepare_request_infers_everything() {
        let data = json!([
            {"segment": "Consumer", "share": "40%"},
            {"segment": "Business", "share": "35%"},
            {"segment": "Consumer", "share": "25%"},
            {"segment": "Business", "share": "0%"},
            {"segment": "Consumer", "share": "0%"}
        ]);
        let (req, analysis) = prepare_request(&data, None, None, None, None, None).unwrap();
        assert_eq!(req.chart_type, "pie");
        assert_eq!(req.config.x_field.as_deref(), Some("segment"));
        assert_eq!(req.config.y_field.as_deref(), Some("share"));
        assert_eq!(req.title.as_deref(), Some("Share Distribution"));
        assert_eq!(
            req.description.as_deref(),
            Some("Chart showing 5 data points. with categorical breakdown.")
        );
        assert_eq!(analysis.total_records, 5);
    }

    #[test]
    fn test_prepare_request_from_json_string() {
        let data = Value::String(r#"{"month": "Jan", "sales": 1000}"#.to_string());
        let (req, _) =
            prepare_request(&data, Some("BAR"), Some("month"), None, Some("Sales"), None).unwrap();
        assert_eq!(req.chart_type, "bar");
        assert_eq!(req.title.as_deref(), Some("Sales"));
        assert_eq!(req.data.len(), 1);
    }

    #[test]
    fn test_prepare_request_rejects_bad_data() {
        let err = prepare_request(&json!([]), None, None, None, None, None).unwrap_err();
        assert_eq!(err, ChartError::EmptySeries);
        let err = prepare_request(&json!("not json"), None, None, None, None, None).unwrap_err();
        assert_eq!(err.reason(), "invalid_payload");
        // Nothing numeric to chart
        let err = prepare_request(&json!([{"name": "a"}]), None, None, None, None, None).unwrap_err();
        assert_eq!(err, ChartError::MissingFieldConfig("y_field"));
    }
}
