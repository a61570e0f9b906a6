use tracing::warn;

use crate::config::{FailurePolicy, Frame};
use crate::error::{ChartError, ChartResult};
use crate::ir::{
    BarGeometry, BarRect, ChartData, ChartKind, Diagnostic, Geometry, LineGeometry, Percentage,
    PieGeometry, PieSlice, PlotPoint, ScatterGeometry, ScatterPoint,
};
use crate::palette::ColorPalette;
use crate::scale::{Axis, Framing, PixelSpan, Scale};

/// Share of each bar slot covered by the bar itself
pub const BAR_WIDTH_RATIO: f64 = 0.8;

/// Pie slices start at 12 o'clock
pub const PIE_START_ANGLE: f64 = -90.0;

/// Turns extracted chart data into geometry for one chart kind
pub trait GeometryBuilder {
    fn build(
        &self,
        data: &ChartData,
        frame: &Frame,
        policy: FailurePolicy,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ChartResult<Geometry>;
}

pub struct LineBuilder;
pub struct BarBuilder;
pub struct PieBuilder;
pub struct ScatterBuilder;

/// The builder responsible for a chart kind
pub fn builder_for(kind: ChartKind) -> &'static dyn GeometryBuilder {
    match kind {
        ChartKind::Line => &LineBuilder,
        ChartKind::Bar => &BarBuilder,
        ChartKind::Pie => &PieBuilder,
        ChartKind::Scatter => &ScatterBuilder,
    }
}

impl GeometryBuilder for LineBuilder {
    fn build(
        &self,
        data: &ChartData,
        frame: &Frame,
        _policy: FailurePolicy,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> ChartResult<Geometry> {
        let y_scale = Scale::from_values(
            &data.y_values,
            Framing::Line,
            frame.vertical_span(),
            Axis::Vertical,
        )?;
        let xs = category_positions(data.len(), frame.horizontal_span());

        let points: Vec<PlotPoint> = data
            .labels
            .iter()
            .zip(data.y_values.iter())
            .zip(xs)
            .map(|((label, &value), x)| PlotPoint {
                label: label.clone(),
                value,
                x,
                y: y_scale.map(value),
            })
            .collect();

        let path = line_path(points.iter().map(|p| (p.x, p.y)));

        Ok(Geometry::Line(LineGeometry {
            points,
            path,
            y_scale,
        }))
    }
}

impl GeometryBuilder for BarBuilder {
    fn build(
        &self,
        data: &ChartData,
        frame: &Frame,
        _policy: FailurePolicy,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> ChartResult<Geometry> {
        let y_scale = Scale::from_values(
            &data.y_values,
            Framing::Bar,
            frame.vertical_span(),
            Axis::Vertical,
        )?;
        let palette = ColorPalette::chart8();
        let span = frame.horizontal_span();

        // Equal slots regardless of category count
        let slot_width = span.extent / data.len() as f64;
        let bar_width = slot_width * BAR_WIDTH_RATIO;
        let baseline = y_scale.map(y_scale.clamp(0.0));

        let bars = data
            .labels
            .iter()
            .zip(data.y_values.iter())
            .enumerate()
            .map(|(i, (label, &value))| {
                let top = y_scale.map(value);
                BarRect {
                    label: label.clone(),
                    value,
                    x: span.origin + i as f64 * slot_width + (slot_width - bar_width) / 2.0,
                    y: top.min(baseline),
                    width: bar_width,
                    height: (baseline - top).abs(),
                    color_index: palette.index_for(i),
                    color: palette.get_color(i).to_string(),
                }
            })
            .collect();

        Ok(Geometry::Bar(BarGeometry {
            bars,
            slot_width,
            baseline,
            y_scale,
        }))
    }
}

impl GeometryBuilder for PieBuilder {
    fn build(
        &self,
        data: &ChartData,
        frame: &Frame,
        policy: FailurePolicy,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ChartResult<Geometry> {
        if data.is_empty() {
            return Err(ChartError::EmptySeries);
        }

        let palette = ColorPalette::chart8();
        let center = frame.center();
        let radius = frame.plot_width().min(frame.plot_height()) / 2.0;
        let total: f64 = data.y_values.iter().sum();

        if total == 0.0 {
            if policy.is_strict() {
                return Err(ChartError::ZeroTotal);
            }
            warn!(slices = data.len(), "pie values sum to zero; percentages undefined");
            diagnostics.push(Diagnostic::UndefinedPercentages);
        }

        let mut angle = PIE_START_ANGLE;
        let mut slices = Vec::with_capacity(data.len());

        for (i, (label, &value)) in data.labels.iter().zip(data.y_values.iter()).enumerate() {
            let (sweep, percentage) = if total == 0.0 {
                (0.0, Percentage::Undefined)
            } else {
                (value / total * 360.0, Percentage::of(value, total))
            };
            let start_angle = angle;
            let end_angle = angle + sweep;
            angle = end_angle;

            slices.push(PieSlice {
                label: label.clone(),
                value,
                start_angle,
                end_angle,
                sweep,
                percentage,
                color_index: palette.index_for(i),
                color: palette.get_color(i).to_string(),
                path: arc_path(center, radius, start_angle, sweep),
            });
        }

        Ok(Geometry::Pie(PieGeometry {
            slices,
            total,
            center,
            radius,
        }))
    }
}

impl GeometryBuilder for ScatterBuilder {
    fn build(
        &self,
        data: &ChartData,
        frame: &Frame,
        _policy: FailurePolicy,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> ChartResult<Geometry> {
        let x_scale = Scale::from_values(
            &data.x_values,
            Framing::Line,
            frame.horizontal_span(),
            Axis::Horizontal,
        )?;
        let y_scale = Scale::from_values(
            &data.y_values,
            Framing::Line,
            frame.vertical_span(),
            Axis::Vertical,
        )?;

        let points = data
            .labels
            .iter()
            .zip(data.x_values.iter().zip(data.y_values.iter()))
            .map(|(label, (&x_value, &y_value))| ScatterPoint {
                label: label.clone(),
                x_value,
                y_value,
                x: x_scale.map(x_value),
                y: y_scale.map(y_value),
            })
            .collect();

        Ok(Geometry::Scatter(ScatterGeometry {
            points,
            x_scale,
            y_scale,
        }))
    }
}

/// Evenly spaced category centres across a span; a single category is centred
fn category_positions(n: usize, span: PixelSpan) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![span.origin + span.extent / 2.0],
        _ => {
            let step = span.extent / (n - 1) as f64;
            (0..n).map(|i| span.origin + i as f64 * step).collect()
        }
    }
}

/// SVG path through the points with straight segments
fn line_path<I>(points: I) -> String
where
    I: IntoIterator<Item = (f64, f64)>,
{
    points
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| {
            let cmd = if i == 0 { "M" } else { "L" };
            format!("{} {:.2} {:.2}", cmd, x, y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn polar(center: (f64, f64), radius: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees.to_radians();
    (center.0 + radius * rad.cos(), center.1 + radius * rad.sin())
}

/// SVG wedge for one slice. Zero sweeps collapse to the centre; a full
/// circle is drawn as two half arcs since SVG cannot arc onto its own start.
fn arc_path(center: (f64, f64), radius: f64, start_angle: f64, sweep: f64) -> String {
    let (cx, cy) = center;
    if sweep <= 0.0 {
        return format!("M {:.2} {:.2} Z", cx, cy);
    }

    let (x1, y1) = polar(center, radius, start_angle);
    if sweep >= 360.0 - 1e-9 {
        let (xm, ym) = polar(center, radius, start_angle + 180.0);
        return format!(
            "M {:.2} {:.2} A {:.2} {:.2} 0 1 1 {:.2} {:.2} A {:.2} {:.2} 0 1 1 {:.2} {:.2} Z",
            x1, y1, radius, radius, xm, ym, radius, radius, x1, y1
        );
    }

    let (x2, y2) = polar(center, radius, start_angle + sweep);
    let large_arc = if sweep > 180.0 { 1 } else { 0 };
    format!(
        "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z",
        cx, cy, x1, y1, radius, radius, large_arc, x2, y2
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(labels: &[&str], values: &[f64]) -> ChartData {
        ChartData {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            x_values: Vec::new(),
            y_values: values.to_vec(),
        }
    }

    fn build(kind: ChartKind, data: &ChartData) -> (Geometry, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let geometry = builder_for(kind)
            .build(data, &Frame::default(), FailurePolicy::FailSoft, &mut diagnostics)
            .unwrap();
        (geometry, diagnostics)
    }

    #[test]
    fn test_line_monthly_sales() {
        let data = make_data(&["Jan", "Feb", "Mar"], &[1000.0, 1200.0, 1400.0]);
        let (geometry, _) = build(ChartKind::Line, &data);

        let Geometry::Line(line) = geometry else {
            panic!("Expected line geometry");
        };
        assert_eq!(line.points.len(), 3);
        assert_eq!(line.points[0].label, "Jan");
        for pair in line.points.windows(2) {
            assert!(pair[1].x > pair[0].x);
            assert!(pair[1].y < pair[0].y);
        }
        assert!(line.path.starts_with("M "));
        assert_eq!(line.path.matches('L').count(), 2);
        assert!(!line.path.contains('C'));
    }

    #[test]
    fn test_line_single_point_centred() {
        let data = make_data(&["only"], &[7.0]);
        let (geometry, _) = build(ChartKind::Line, &data);
        let Geometry::Line(line) = geometry else {
            panic!("Expected line geometry");
        };
        let span = Frame::default().horizontal_span();
        assert_eq!(line.points[0].x, span.origin + span.extent / 2.0);
        assert!(line.points[0].y.is_finite());
        assert_eq!(line.path.matches('L').count(), 0);
    }

    #[test]
    fn test_bar_color_index_cycles() {
        let labels: Vec<String> = (0..20).map(|i| format!("c{}", i)).collect();
        let label_refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        let values: Vec<f64> = (0..20).map(|i| (i + 1) as f64).collect();
        let (geometry, _) = build(ChartKind::Bar, &make_data(&label_refs, &values));

        let Geometry::Bar(bar) = geometry else {
            panic!("Expected bar geometry");
        };
        assert_eq!(bar.bars.len(), 20);
        for (i, rect) in bar.bars.iter().enumerate() {
            assert_eq!(rect.color_index, i % 8);
        }
        assert_eq!(bar.bars[8].color, bar.bars[0].color);
    }

    #[test]
    fn test_bar_equal_width_and_height_from_baseline() {
        let data = make_data(&["A", "B", "C"], &[10.0, 20.0, 40.0]);
        let (geometry, _) = build(ChartKind::Bar, &data);
        let Geometry::Bar(bar) = geometry else {
            panic!("Expected bar geometry");
        };

        let frame = Frame::default();
        assert!((bar.slot_width - frame.plot_width() / 3.0).abs() < 1e-9);
        for rect in &bar.bars {
            assert!((rect.width - bar.slot_width * BAR_WIDTH_RATIO).abs() < 1e-9);
            assert!((rect.y + rect.height - bar.baseline).abs() < 1e-9);
        }
        assert!(bar.bars[2].height > bar.bars[1].height);
        assert!(bar.bars[1].height > bar.bars[0].height);
        // Spacing between consecutive bars is constant
        let gap1 = bar.bars[1].x - bar.bars[0].x;
        let gap2 = bar.bars[2].x - bar.bars[1].x;
        assert!((gap1 - gap2).abs() < 1e-9);
        // Non-negative data: the domain floor sits on the bottom of the plot area
        assert!((bar.baseline - frame.vertical_span().end()).abs() < 1e-9);
    }

    #[test]
    fn test_bar_negative_values_hang_from_zero() {
        let data = make_data(&["up", "down"], &[5.0, -5.0]);
        let (geometry, _) = build(ChartKind::Bar, &data);
        let Geometry::Bar(bar) = geometry else {
            panic!("Expected bar geometry");
        };
        let zero = bar.y_scale.map(0.0);
        assert!((bar.baseline - zero).abs() < 1e-9);
        assert!((bar.bars[0].y + bar.bars[0].height - zero).abs() < 1e-9);
        assert!((bar.bars[1].y - zero).abs() < 1e-9);
    }

    #[test]
    fn test_pie_market_share() {
        let data = make_data(&["A", "B", "C"], &[35.0, 28.0, 37.0]);
        let (geometry, diagnostics) = build(ChartKind::Pie, &data);
        assert!(diagnostics.is_empty());

        let Geometry::Pie(pie) = geometry else {
            panic!("Expected pie geometry");
        };
        let sweeps: Vec<f64> = pie.slices.iter().map(|s| s.sweep).collect();
        assert!((sweeps[0] - 126.0).abs() < 0.1);
        assert!((sweeps[1] - 100.8).abs() < 0.1);
        assert!((sweeps[2] - 133.2).abs() < 0.1);
        assert!((sweeps.iter().sum::<f64>() - 360.0).abs() < 1e-9);

        assert_eq!(pie.slices[0].start_angle, -90.0);
        assert_eq!(pie.slices[1].start_angle, pie.slices[0].end_angle);
        assert!((pie.slices[2].end_angle - 270.0).abs() < 1e-9);
        let share = pie.slices[0].percentage.value().unwrap();
        assert!((share - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_pie_angles_sum_for_many_slices() {
        let values: Vec<f64> = (1..=13).map(|i| i as f64 * 1.7).collect();
        let labels: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let label_refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        let (geometry, _) = build(ChartKind::Pie, &make_data(&label_refs, &values));
        let Geometry::Pie(pie) = geometry else {
            panic!("Expected pie geometry");
        };
        let total: f64 = pie.slices.iter().map(|s| s.sweep).sum();
        assert!((total - 360.0).abs() < 1e-9);
        assert_eq!(pie.slices[12].color_index, 4);
    }

    #[test]
    fn test_pie_zero_slice_is_degenerate() {
        let data = make_data(&["A", "B", "C"], &[50.0, 0.0, 50.0]);
        let (geometry, _) = build(ChartKind::Pie, &data);
        let Geometry::Pie(pie) = geometry else {
            panic!("Expected pie geometry");
        };
        assert_eq!(pie.slices.len(), 3);
        assert_eq!(pie.slices[1].sweep, 0.0);
        assert_eq!(pie.slices[1].start_angle, pie.slices[1].end_angle);
        assert_eq!(pie.slices[1].percentage, Percentage::Defined(0.0));
        assert!(pie.slices[1].path.ends_with('Z'));
    }

    #[test]
    fn test_pie_single_slice_full_circle() {
        let data = make_data(&["all"], &[3.0]);
        let (geometry, _) = build(ChartKind::Pie, &data);
        let Geometry::Pie(pie) = geometry else {
            panic!("Expected pie geometry");
        };
        assert_eq!(pie.slices[0].sweep, 360.0);
        assert_eq!(pie.slices[0].path.matches('A').count(), 2);
    }

    #[test]
    fn test_pie_zero_total_soft() {
        let data = make_data(&["A", "B"], &[0.0, 0.0]);
        let (geometry, diagnostics) = build(ChartKind::Pie, &data);
        assert_eq!(diagnostics, vec![Diagnostic::UndefinedPercentages]);
        let Geometry::Pie(pie) = geometry else {
            panic!("Expected pie geometry");
        };
        assert!(pie.slices.iter().all(|s| s.percentage.is_undefined()));
        assert!(pie.slices.iter().all(|s| s.sweep == 0.0));
    }

    #[test]
    fn test_pie_zero_total_strict() {
        let data = make_data(&["A", "B"], &[0.0, 0.0]);
        let mut diagnostics = Vec::new();
        let result = PieBuilder.build(
            &data,
            &Frame::default(),
            FailurePolicy::FailFast,
            &mut diagnostics,
        );
        assert_eq!(result, Err(ChartError::ZeroTotal));
    }

    #[test]
    fn test_scatter_independent_axes() {
        let data = ChartData {
            labels: vec!["a".into(), "b".into(), "c".into()],
            x_values: vec![1.0, 3.0, 2.0],
            y_values: vec![100.0, 50.0, 75.0],
        };
        let (geometry, _) = build(ChartKind::Scatter, &data);
        let Geometry::Scatter(scatter) = geometry else {
            panic!("Expected scatter geometry");
        };
        assert_eq!(scatter.x_scale.axis, Axis::Horizontal);
        assert_eq!(scatter.y_scale.axis, Axis::Vertical);
        let p = &scatter.points;
        assert!(p[1].x > p[2].x && p[2].x > p[0].x);
        assert!(p[0].y < p[2].y && p[2].y < p[1].y);
    }

    #[test]
    fn test_builders_are_idempotent() {
        let data = ChartData {
            labels: vec!["a".into(), "b".into(), "c".into()],
            x_values: vec![1.0, 2.0, 4.0],
            y_values: vec![3.0, 1.0, 2.0],
        };
        for kind in [ChartKind::Line, ChartKind::Bar, ChartKind::Pie, ChartKind::Scatter] {
            let (first, _) = build(kind, &data);
            let (second, _) = build(kind, &data);
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[test]
    fn test_empty_data_is_empty_series() {
        let data = ChartData::default();
        for kind in [ChartKind::Line, ChartKind::Bar, ChartKind::Pie, ChartKind::Scatter] {
            let mut diagnostics = Vec::new();
            let result = builder_for(kind).build(
                &data,
                &Frame::default(),
                FailurePolicy::FailSoft,
                &mut diagnostics,
            );
            assert_eq!(result, Err(ChartError::EmptySeries));
        }
    }
}
