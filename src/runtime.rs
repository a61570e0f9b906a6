// Runtime executor for chart payloads

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::DataAnalysis;
use crate::compiler::builder_for;
use crate::config::EngineConfig;
use crate::error::{ChartError, ChartResult};
use crate::ir::{ChartKind, ChartScene, ChartSelection, Diagnostic, KindResolution};
use crate::payload::ChartRequest;
use crate::resolve::resolve_chart;
use crate::transform::extract_chart_data;

/// Kind used for anything unrecognized
pub const FALLBACK_KIND: ChartKind = ChartKind::Bar;

/// Map a requested kind string onto a chart kind.
///
/// Matching is case-insensitive. `auto` takes the optimal kind from the
/// analysis (line when there is none). Unknown names fall back to bar with a
/// `Fallback` resolution so callers can surface it.
pub fn select_chart_kind(requested: &str, analysis: Option<&DataAnalysis>) -> ChartSelection {
    let name = requested.trim().to_lowercase();

    let (kind, resolution) = if name == "auto" {
        let inferred = analysis.map(|a| a.optimal_chart_type()).unwrap_or("line");
        let (kind, _) = kind_by_name(inferred).unwrap_or((ChartKind::Line, KindResolution::Exact));
        (kind, KindResolution::Inferred)
    } else {
        match kind_by_name(&name) {
            Some(found) => found,
            None => {
                warn!(requested = %requested, fallback = FALLBACK_KIND.as_str(), "unknown chart type");
                (FALLBACK_KIND, KindResolution::Fallback)
            }
        }
    };

    debug!(requested = %requested, kind = kind.as_str(), ?resolution, "selected chart kind");
    ChartSelection {
        kind,
        requested: requested.to_string(),
        resolution,
    }
}

fn kind_by_name(name: &str) -> Option<(ChartKind, KindResolution)> {
    match name {
        "line" => Some((ChartKind::Line, KindResolution::Exact)),
        "bar" => Some((ChartKind::Bar, KindResolution::Exact)),
        "pie" => Some((ChartKind::Pie, KindResolution::Exact)),
        "scatter" => Some((ChartKind::Scatter, KindResolution::Exact)),
        // Single series only: multi-* render their first series
        "multi-line" => Some((ChartKind::Line, KindResolution::Alias)),
        "multi-bar" => Some((ChartKind::Bar, KindResolution::Alias)),
        _ => None,
    }
}

/// Render a chart payload to a scene
pub fn render_chart(request: &ChartRequest, config: &EngineConfig) -> ChartResult<ChartScene> {
    let series = request.series();
    if series.is_empty() {
        return Err(ChartError::EmptySeries);
    }

    let resolved = resolve_chart(request, series)?;
    let policy = config.failure_policy;

    let mut diagnostics = Vec::new();
    if resolved.selection.resolution == KindResolution::Fallback {
        diagnostics.push(Diagnostic::UnknownChartKind {
            requested: resolved.selection.requested.clone(),
            fallback: resolved.selection.kind,
        });
    }

    let (data, extraction_diagnostics) = extract_chart_data(&resolved, series, policy)?;
    diagnostics.extend(extraction_diagnostics);

    let geometry =
        builder_for(resolved.selection.kind).build(&data, &config.frame, policy, &mut diagnostics)?;

    info!(
        kind = resolved.selection.kind.as_str(),
        points = data.len(),
        diagnostics = diagnostics.len(),
        "rendered chart"
    );

    Ok(ChartScene {
        kind: geometry.kind(),
        requested_kind: resolved.selection.requested,
        title: resolved.title,
        description: resolved.description,
        width: config.frame.width,
        height: config.frame.height,
        total_data_points: data.len(),
        x_field: resolved.x_field,
        y_field: resolved.y_field,
        geometry,
        diagnostics,
    })
}

/// An error state drawn in place of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub reason: &'static str,
    pub message: String,
}

impl From<&ChartError> for Placeholder {
    fn from(err: &ChartError) -> Self {
        Placeholder {
            reason: err.reason(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Rendered {
    Chart(ChartScene),
    Placeholder(Placeholder),
}

/// Render a chart, turning any error into a labelled placeholder
pub fn render_or_placeholder(request: &ChartRequest, config: &EngineConfig) -> Rendered {
    match render_chart(request, config) {
        Ok(scene) => Rendered::Chart(scene),
        Err(err) => {
            info!(reason = err.reason(), "rendering placeholder");
            Rendered::Placeholder(Placeholder::from(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::ir::Geometry;
    use crate::value::Record;
    use serde_json::{json, Value};

    fn request(value: Value) -> ChartRequest {
        serde_json::from_value(value).unwrap()
    }

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_select_known_kinds() {
        assert_eq!(select_chart_kind("line", None).kind, ChartKind::Line);
        assert_eq!(select_chart_kind("PIE", None).kind, ChartKind::Pie);
        assert_eq!(select_chart_kind(" Scatter ", None).kind, ChartKind::Scatter);

        let alias = select_chart_kind("multi-bar", None);
        assert_eq!(alias.kind, ChartKind::Bar);
        assert_eq!(alias.resolution, KindResolution::Alias);
        assert_eq!(select_chart_kind("Multi-Line", None).kind, ChartKind::Line);
    }

    #[test]
    fn test_select_unknown_falls_back_to_bar() {
        let selection = select_chart_kind("donut", None);
        assert_eq!(selection.kind, ChartKind::Bar);
        assert_eq!(selection.resolution, KindResolution::Fallback);
        assert_eq!(selection.requested, "donut");
    }

    #[test]
    fn test_select_auto_uses_analysis() {
        let series = records(json!([
            {"segment": "A", "share": "60%"},
            {"segment": "B", "share": "40%"},
            {"segment": "A", "share": "0%"},
            {"segment": "B", "share": "0%"},
            {"segment": "A", "share": "0%"}
        ]));
        let analysis = crate::analysis::analyze_data(&series);
        let selection = select_chart_kind("auto", Some(&analysis));
        assert_eq!(selection.kind, ChartKind::Pie);
        assert_eq!(selection.resolution, KindResolution::Inferred);

        assert_eq!(select_chart_kind("auto", None).kind, ChartKind::Line);
    }

    #[test]
    fn test_render_empty_series_is_no_data() {
        let req = request(json!({
            "chart_type": "line",
            "data": [],
            "config": {"x_field": "a", "y_field": "b"}
        }));
        assert_eq!(
            render_chart(&req, &EngineConfig::default()),
            Err(ChartError::EmptySeries)
        );
        assert_eq!(
            render_or_placeholder(&req, &EngineConfig::default()),
            Rendered::Placeholder(Placeholder {
                reason: "empty_series",
                message: "No data available".to_string(),
            })
        );
    }

    #[test]
    fn test_render_missing_field_config_placeholder() {
        let req = request(json!({
            "chart_type": "bar",
            "data": [{"a": 1}],
            "config": {"y_field": "a"}
        }));
        match render_or_placeholder(&req, &EngineConfig::default()) {
            Rendered::Placeholder(p) => {
                assert_eq!(p.reason, "missing_field_config");
                assert_eq!(p.message, "Missing chart configuration: x_field");
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_render_line_monthly_sales() {
        let req = request(json!({
            "chart_type": "line",
            "data": [
                {"month": "Jan", "sales": 1000},
                {"month": "Feb", "sales": 1200},
                {"month": "Mar", "sales": 1400}
            ],
            "config": {"x_field": "month", "y_field": "sales"},
            "title": "Monthly Sales"
        }));
        let scene = render_chart(&req, &EngineConfig::default()).unwrap();
        assert_eq!(scene.kind, ChartKind::Line);
        assert_eq!(scene.total_data_points, 3);
        assert_eq!(scene.title.as_deref(), Some("Monthly Sales"));
        assert!(scene.diagnostics.is_empty());

        let Geometry::Line(line) = &scene.geometry else {
            panic!("expected line geometry");
        };
        assert!(line.points.windows(2).all(|w| w[0].x < w[1].x));
        assert!(line.points.windows(2).all(|w| w[0].y > w[1].y));
    }

    #[test]
    fn test_render_pie_market_share() {
        let req = request(json!({
            "chart_type": "pie",
            "data": [
                {"segment": "Consumer", "share": 35},
                {"segment": "Business", "share": 28},
                {"segment": "Enterprise", "share": 37}
            ],
            "config": {"x_field": "segment", "y_field": "share"}
        }));
        let scene = render_chart(&req, &EngineConfig::default()).unwrap();
        let Geometry::Pie(pie) = &scene.geometry else {
            panic!("expected pie geometry");
        };
        let sweeps: Vec<f64> = pie.slices.iter().map(|s| s.sweep).collect();
        for (got, want) in sweeps.iter().zip([126.0, 100.8, 133.2]) {
            assert!((got - want).abs() < 1e-9, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_render_unknown_kind_is_observable() {
        let req = request(json!({
            "chart_type": "radar",
            "data": [{"k": "a", "v": 1}, {"k": "b", "v": 2}],
            "config": {"x_field": "k", "y_field": "v"}
        }));
        let scene = render_chart(&req, &EngineConfig::default()).unwrap();
        assert_eq!(scene.kind, ChartKind::Bar);
        assert_eq!(scene.requested_kind, "radar");
        assert!(scene.used_fallback());
        assert_eq!(
            scene.diagnostics[0],
            Diagnostic::UnknownChartKind {
                requested: "radar".to_string(),
                fallback: ChartKind::Bar
            }
        );
    }

    #[test]
    fn test_render_respects_failure_policy() {
        let req = request(json!({
            "chart_type": "pie",
            "data": [{"k": "a", "v": 0}, {"k": "b", "v": "0"}],
            "config": {"x_field": "k", "y_field": "v"}
        }));
        let soft = render_chart(&req, &EngineConfig::default()).unwrap();
        assert!(soft.diagnostics.contains(&Diagnostic::UndefinedPercentages));

        let strict = EngineConfig {
            failure_policy: FailurePolicy::FailFast,
            ..EngineConfig::default()
        };
        match render_or_placeholder(&req, &strict) {
            Rendered::Placeholder(p) => assert_eq!(p.reason, "zero_total"),
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[test]
    fn test_render_missing_label_follows_policy() {
        let req = request(json!({
            "chart_type": "bar",
            "data": [{"k": "a", "v": 1}, {"v": 2}],
            "config": {"x_field": "k", "y_field": "v"}
        }));
        let soft = render_chart(&req, &EngineConfig::default()).unwrap();
        assert_eq!(
            soft.diagnostics,
            vec![Diagnostic::MissingValue {
                row: 1,
                field: "k".to_string()
            }]
        );

        let strict = EngineConfig {
            failure_policy: FailurePolicy::FailFast,
            ..EngineConfig::default()
        };
        assert_eq!(
            render_chart(&req, &strict),
            Err(ChartError::MissingValue {
                row: 1,
                field: "k".to_string()
            })
        );
    }

    #[test]
    fn test_render_nested_config_data() {
        let req = request(json!({
            "chart_type": "bar",
            "config": {"x_field": "k", "y_field": "v", "data": [{"k": "a", "v": 3}]}
        }));
        let scene = render_chart(&req, &EngineConfig::default()).unwrap();
        assert_eq!(scene.total_data_points, 1);
    }

    #[test]
    fn test_rendered_serializes_with_status() {
        let rendered = Rendered::Placeholder(Placeholder::from(&ChartError::EmptySeries));
        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["status"], "placeholder");
        assert_eq!(json["reason"], "empty_series");
        assert_eq!(json["message"], "No data available");
    }
}
