//! Canvas painting of the view models' display lists.
//!
//! Nothing in here decides *what* to draw; the views emit marks and this
//! module rasterizes them in the order they arrive.

use foundation::color::Color;
use foundation::math::precision::stable_total_cmp_f64;
use scene::world::{NODE_RADIUS, SceneWorld};
use views::{
    AxisDensityMark, AxisTick, CellMark, CircleMark, DensityMark, HighlightMark, LegendEntry,
    LegendGradient, LinkMark, SegmentMark,
};
use web_sys::CanvasRenderingContext2d;

use crate::camera::OrbitCamera;

const GLOW_BLUR: f64 = 2.5;
const AXIS_COLOR: &str = "#333333";
const LABEL_FONT: &str = "10px sans-serif";

fn css(color: Color) -> String {
    color.to_string()
}

pub fn clear(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
    ctx.clear_rect(0.0, 0.0, width, height);
}

/// Projects and paints the 3D scene: lines in their given (weight-descending)
/// order, then spheres far-to-near, then labels.
pub fn paint_scene(
    ctx: &CanvasRenderingContext2d,
    world: &SceneWorld,
    camera: &OrbitCamera,
    width: f64,
    height: f64,
) {
    clear(ctx, width, height);

    for line in world.lines() {
        let (Some(a), Some(b)) = (
            camera.project(line.from, width, height),
            camera.project(line.to, width, height),
        ) else {
            continue;
        };
        ctx.set_global_alpha(line.opacity);
        ctx.set_stroke_style_str(&css(line.color));
        ctx.set_line_width(1.5);
        ctx.begin_path();
        ctx.move_to(a.x, a.y);
        ctx.line_to(b.x, b.y);
        ctx.stroke();
    }
    ctx.set_global_alpha(1.0);

    let mut spheres: Vec<_> = world
        .nodes()
        .filter_map(|node| {
            camera
                .project(node.position, width, height)
                .map(|p| (node, p))
        })
        .collect();
    // Painter's order: far spheres first.
    spheres.sort_by(|(_, a), (_, b)| stable_total_cmp_f64(b.depth, a.depth));

    for (node, projected) in &spheres {
        let radius = NODE_RADIUS * projected.scale;
        if let Some(emissive) = node.emissive {
            ctx.set_stroke_style_str(&css(emissive));
            ctx.set_line_width(2.0);
            ctx.begin_path();
            let _ = ctx.arc(
                projected.x,
                projected.y,
                radius + 2.0,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.stroke();
        }
        ctx.set_fill_style_str(&css(node.color));
        ctx.begin_path();
        let _ = ctx.arc(projected.x, projected.y, radius, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }

    ctx.set_fill_style_str(AXIS_COLOR);
    ctx.set_font("bold 12px sans-serif");
    for label in world.labels() {
        if let Some(projected) = camera.project(label.position, width, height) {
            let _ = ctx.fill_text(&label.text, projected.x + 6.0, projected.y - 6.0);
        }
    }
}

/// Paints the 2D projection: circles, then edge strokes over them.
pub fn paint_planar(
    ctx: &CanvasRenderingContext2d,
    circles: &[CircleMark],
    segments: &[SegmentMark],
    width: f64,
    height: f64,
) {
    clear(ctx, width, height);

    for circle in circles {
        ctx.set_fill_style_str(&css(circle.fill));
        ctx.begin_path();
        let _ = ctx.arc(
            circle.center.x,
            circle.center.y,
            circle.radius,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.fill();
    }

    ctx.set_line_width(2.0);
    for segment in segments {
        ctx.set_global_alpha(segment.opacity);
        ctx.set_stroke_style_str(&css(segment.color));
        ctx.begin_path();
        ctx.move_to(segment.from.x, segment.from.y);
        ctx.line_to(segment.to.x, segment.to.y);
        ctx.stroke();
    }
    ctx.set_global_alpha(1.0);
    ctx.set_line_width(1.0);
}

pub struct HeatmapFrame<'a> {
    pub cells: &'a [CellMark],
    pub highlights: &'a [HighlightMark],
    pub x_ticks: &'a [AxisTick],
    pub y_ticks: &'a [AxisTick],
    pub legend: Option<&'a LegendGradient>,
    pub density: &'a [DensityMark],
    pub size: f64,
    pub margin_left: f64,
    pub margin_top: f64,
}

pub fn paint_heatmap(ctx: &CanvasRenderingContext2d, frame: &HeatmapFrame<'_>) {
    let (ox, oy) = (frame.margin_left, frame.margin_top);

    for cell in frame.cells {
        ctx.set_fill_style_str(&css(cell.fill));
        ctx.fill_rect(ox + cell.x, oy + cell.y, cell.width, cell.height);
    }

    for mark in frame.highlights {
        ctx.set_global_alpha(mark.opacity);
        ctx.set_stroke_style_str(&css(mark.stroke));
        ctx.set_line_width(mark.stroke_width);
        ctx.set_shadow_blur(GLOW_BLUR);
        ctx.set_shadow_color(&css(mark.stroke));
        ctx.stroke_rect(ox + mark.x, oy + mark.y, mark.width, mark.height);
    }
    ctx.set_global_alpha(1.0);
    ctx.set_shadow_blur(0.0);
    ctx.set_line_width(1.0);

    ctx.set_fill_style_str(AXIS_COLOR);
    ctx.set_font(LABEL_FONT);
    for tick in frame.x_ticks {
        let _ = ctx.fill_text(&tick.label, ox + tick.offset, oy + frame.size + 14.0);
    }
    for tick in frame.y_ticks {
        let _ = ctx.fill_text(&tick.label, 2.0, oy + tick.offset + 10.0);
    }

    for mark in frame.density {
        ctx.set_fill_style_str(&css(mark.fill));
        ctx.fill_rect(
            ox + mark.x,
            oy + frame.size + 20.0,
            mark.width,
            10.0,
        );
    }

    if let Some(legend) = frame.legend {
        paint_legend_gradient(ctx, legend, ox + frame.size + 40.0, oy, frame.size);
    }
}

fn paint_legend_gradient(
    ctx: &CanvasRenderingContext2d,
    legend: &LegendGradient,
    x: f64,
    y: f64,
    height: f64,
) {
    let gradient = ctx.create_linear_gradient(x, y + height, x, y);
    let _ = gradient.add_color_stop(0.0, &css(legend.light));
    let _ = gradient.add_color_stop(1.0, &css(legend.dark));
    ctx.set_fill_style_canvas_gradient(&gradient);
    ctx.fill_rect(x, y, 20.0, height);

    ctx.set_fill_style_str(AXIS_COLOR);
    ctx.set_font(LABEL_FONT);
    let _ = ctx.fill_text(&format!("{:.6}", legend.max), x + 24.0, y + 10.0);
    let _ = ctx.fill_text(&format!("{:.6}", legend.min), x + 24.0, y + height);
}

pub struct ParallelFrame<'a> {
    pub links: &'a [LinkMark],
    pub ticks: &'a [AxisTick],
    pub legend: &'a [LegendEntry],
    pub density: &'a [AxisDensityMark],
    pub width: f64,
    pub height: f64,
    pub axis_inset: f64,
}

pub fn paint_parallel(ctx: &CanvasRenderingContext2d, frame: &ParallelFrame<'_>) {
    clear(ctx, frame.width, frame.height + 40.0);

    for link in frame.links {
        ctx.set_global_alpha(link.opacity);
        ctx.set_stroke_style_str(&css(link.color));
        ctx.set_line_width(link.width);
        ctx.begin_path();
        ctx.move_to(link.x1, link.y1);
        ctx.line_to(link.x2, link.y2);
        ctx.stroke();
    }
    ctx.set_global_alpha(1.0);
    ctx.set_line_width(1.0);

    // Axis rails plus tick labels on both sides.
    ctx.set_stroke_style_str(AXIS_COLOR);
    for x in [frame.axis_inset, frame.width - frame.axis_inset] {
        ctx.begin_path();
        ctx.move_to(x, 0.0);
        ctx.line_to(x, frame.height);
        ctx.stroke();
    }
    ctx.set_fill_style_str(AXIS_COLOR);
    ctx.set_font(LABEL_FONT);
    for tick in frame.ticks {
        let _ = ctx.fill_text(&tick.label, 0.0, tick.offset + 3.0);
        let _ = ctx.fill_text(
            &tick.label,
            frame.width - frame.axis_inset + 4.0,
            tick.offset + 3.0,
        );
    }

    for mark in frame.density {
        ctx.set_fill_style_str(&css(mark.fill));
        ctx.fill_rect(frame.axis_inset - 14.0, mark.y, 10.0, mark.height.max(1.0));
        ctx.fill_rect(frame.width - frame.axis_inset + 4.0, mark.y, 10.0, mark.height.max(1.0));
    }

    let mut legend_x = 10.0;
    for entry in frame.legend {
        ctx.set_fill_style_str(&css(entry.color));
        ctx.fill_rect(legend_x, frame.height + 8.0, 12.0, 12.0);
        ctx.set_fill_style_str(AXIS_COLOR);
        let _ = ctx.fill_text(&entry.label, legend_x + 16.0, frame.height + 18.0);
        legend_x += 80.0;
    }
}
