// Draws finished scenes with plotters; geometry is already in pixel space

use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::ir::{ChartScene, Geometry};
use crate::palette::parse_hex_color;
use crate::runtime::{Placeholder, Rendered};

const AXIS_COLOR: RGBColor = RGBColor(160, 160, 160);
const TEXT_COLOR: RGBColor = RGBColor(40, 40, 40);
const FALLBACK_FILL: RGBColor = RGBColor(136, 132, 216);
const POINT_RADIUS: i32 = 4;
/// Angular step when approximating pie arcs with polygons, in degrees
const ARC_STEP: f64 = 2.0;

/// Size of a placeholder image when no scene supplies one
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

pub fn render_png(rendered: &Rendered, canvas: &Canvas) -> Result<Vec<u8>> {
    let (width, height) = dimensions(rendered, canvas);
    let mut buffer = vec![0u8; rgb_buffer_len(width, height)?];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw(&root, rendered)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

pub fn render_svg(rendered: &Rendered, canvas: &Canvas) -> Result<String> {
    let (width, height) = dimensions(rendered, canvas);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw(&root, rendered)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg)
}

/// Bytes needed for an RGB bitmap of this size
fn rgb_buffer_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| anyhow!("Image size {}x{} is too large", width, height))
}

fn dimensions(rendered: &Rendered, canvas: &Canvas) -> (u32, u32) {
    match rendered {
        Rendered::Chart(scene) => (scene.width, scene.height),
        Rendered::Placeholder(_) => (canvas.width, canvas.height),
    }
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, rendered: &Rendered) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;
    match rendered {
        Rendered::Chart(scene) => draw_scene(root, scene),
        Rendered::Placeholder(placeholder) => draw_placeholder(root, placeholder),
    }
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &ChartScene) -> Result<()>
where
    DB::ErrorType: 'static,
{
    if let Some(title) = &scene.title {
        root.draw(&Text::new(
            title.clone(),
            (10, 8),
            ("sans-serif", 18).into_font().color(&TEXT_COLOR),
        ))
        .context("Failed to draw title")?;
    }

    match &scene.geometry {
        Geometry::Line(line) => {
            let points: Vec<(i32, i32)> = line.points.iter().map(|p| px(p.x, p.y)).collect();
            root.draw(&PathElement::new(points.clone(), FALLBACK_FILL.stroke_width(2)))
                .context("Failed to draw line")?;
            for point in points {
                root.draw(&Circle::new(point, POINT_RADIUS, FALLBACK_FILL.filled()))
                    .context("Failed to draw line point")?;
            }
        }
        Geometry::Bar(bars) => {
            let baseline = bars.baseline.round() as i32;
            for bar in &bars.bars {
                let color = fill_for(&bar.color);
                root.draw(&Rectangle::new(
                    [px(bar.x, bar.y), px(bar.x + bar.width, bar.y + bar.height)],
                    color.filled(),
                ))
                .context("Failed to draw bar")?;
            }
            let (left, right) = bars
                .bars
                .first()
                .zip(bars.bars.last())
                .map(|(f, l)| (f.x, l.x + l.width))
                .unwrap_or_default();
            root.draw(&PathElement::new(
                vec![(left.round() as i32, baseline), (right.round() as i32, baseline)],
                AXIS_COLOR.stroke_width(1),
            ))
            .context("Failed to draw baseline")?;
        }
        Geometry::Pie(pie) => {
            for slice in pie.slices.iter().filter(|s| s.sweep > 0.0) {
                let polygon = arc_polygon(pie.center, pie.radius, slice.start_angle, slice.end_angle);
                root.draw(&Polygon::new(polygon, fill_for(&slice.color).filled()))
                    .context("Failed to draw pie slice")?;
            }
        }
        Geometry::Scatter(scatter) => {
            for point in &scatter.points {
                root.draw(&Circle::new(
                    px(point.x, point.y),
                    POINT_RADIUS,
                    FALLBACK_FILL.filled(),
                ))
                .context("Failed to draw scatter point")?;
            }
        }
    }
    Ok(())
}

fn draw_placeholder<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    placeholder: &Placeholder,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, height) = root.dim_in_pixel();
    root.draw(&Rectangle::new(
        [(4, 4), (width as i32 - 4, height as i32 - 4)],
        AXIS_COLOR.stroke_width(1),
    ))
    .context("Failed to draw placeholder frame")?;
    root.draw(&Text::new(
        placeholder.message.clone(),
        (16, height as i32 / 2 - 8),
        ("sans-serif", 16).into_font().color(&TEXT_COLOR),
    ))
    .context("Failed to draw placeholder message")?;
    Ok(())
}

fn px(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn fill_for(hex: &str) -> RGBColor {
    parse_hex_color(hex)
        .map(|(r, g, b)| RGBColor(r, g, b))
        .unwrap_or(FALLBACK_FILL)
}

/// Centre plus points along the arc from `start` to `end` degrees
fn arc_polygon(center: (f64, f64), radius: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = ((end - start) / ARC_STEP).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(px(center.0, center.1));
    for i in 0..=steps {
        let angle = (start + (end - start) * i as f64 / steps as f64).to_radians();
        points.push(px(
            center.0 + radius * angle.cos(),
            center.1 + radius * angle.sin(),
        ));
    }
    points
}
