//! Overlay drawing on top of decoded frames.
//!
//! The `draw_*` functions are stateless: they only queue filled paths into a `vello_cpu`
//! render context. [`OverlayPainter`] owns the context and a transparent layer, rasterizes the
//! queued overlays once per frame and composites the layer onto the frame buffer.

use kurbo::{BezPath, Circle, Shape as _, Vec2};

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{AnnotateError, AnnotateResult};
use crate::render::frame::{VideoFrame, premul_over_in_place};
use crate::render::style::OverlayStyle;
use crate::trigger::state::OverlayPlan;

/// Draw the horizontal scale guide: a line at the first point's row, markers at both columns.
pub fn draw_scale_line(
    ctx: &mut vello_cpu::RenderContext,
    scale: [Point; 2],
    style: &OverlayStyle,
) {
    horizontal_line_with_points(ctx, scale, style.scale, style);
}

/// Draw one filled marker per visible stride point, without connecting lines.
pub fn draw_stride_markers(
    ctx: &mut vello_cpu::RenderContext,
    points: &[Point],
    style: &OverlayStyle,
) {
    for &p in points {
        fill_marker(ctx, p, style.marker_radius, style.stride);
    }
}

/// Draw the takeoff/landing guide in the same horizontal style as the scale.
pub fn draw_jump_line(ctx: &mut vello_cpu::RenderContext, jump: [Point; 2], style: &OverlayStyle) {
    horizontal_line_with_points(ctx, jump, style.jump, style);
}

/// Draw the angle reference: the direct line between both points, the horizontal leg from the
/// first point to the second point's column, and markers at both ends plus the corner.
pub fn draw_angle_line(
    ctx: &mut vello_cpu::RenderContext,
    angle: [Point; 2],
    style: &OverlayStyle,
) {
    let [a, b] = angle;
    let corner = Point::new(b.x, a.y);
    fill_segment(ctx, a, b, style.line_thickness, style.angle);
    fill_segment(ctx, a, corner, style.line_thickness, style.angle);
    for p in [a, b, corner] {
        fill_marker(ctx, p, style.marker_radius, style.angle);
    }
}

fn horizontal_line_with_points(
    ctx: &mut vello_cpu::RenderContext,
    pair: [Point; 2],
    color: Rgba8,
    style: &OverlayStyle,
) {
    let [a, b] = pair;
    let end = Point::new(b.x, a.y);
    fill_segment(ctx, a, end, style.line_thickness, color);
    fill_marker(ctx, a, style.marker_radius, color);
    fill_marker(ctx, end, style.marker_radius, color);
}

fn fill_marker(ctx: &mut vello_cpu::RenderContext, center: Point, radius: f64, color: Rgba8) {
    let circle = Circle::new(center.to_kurbo(), radius);
    let mut path = BezPath::new();
    for el in circle.path_elements(0.1) {
        path.push(el);
    }
    fill(ctx, &path, color);
}

/// A thick segment as a filled quad; degenerate segments become a square dot.
fn fill_segment(
    ctx: &mut vello_cpu::RenderContext,
    a: Point,
    b: Point,
    thickness: f64,
    color: Rgba8,
) {
    let (pa, pb) = (a.to_kurbo(), b.to_kurbo());
    let half = thickness / 2.0;
    let dir = pb - pa;
    let len = dir.hypot();
    let (along, across) = if len < 1e-9 {
        (Vec2::new(half, 0.0), Vec2::new(0.0, half))
    } else {
        let unit = dir / len;
        (Vec2::ZERO, Vec2::new(-unit.y, unit.x) * half)
    };

    let mut path = BezPath::new();
    path.move_to(pa - along + across);
    path.line_to(pb + along + across);
    path.line_to(pb + along - across);
    path.line_to(pa - along - across);
    path.close_path();
    fill(ctx, &path, color);
}

fn fill(ctx: &mut vello_cpu::RenderContext, path: &BezPath, color: Rgba8) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(path));
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Rasterizes an [`OverlayPlan`] onto frames.
///
/// Keeps its render context and layer between frames of the same size. One painter per worker;
/// it holds no per-video state.
#[derive(Default)]
pub struct OverlayPainter {
    ctx: Option<vello_cpu::RenderContext>,
    layer: Option<vello_cpu::Pixmap>,
}

impl OverlayPainter {
    /// Create a painter with no cached buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw every group in `plan` onto `frame`.
    pub fn paint(
        &mut self,
        frame: &mut VideoFrame,
        plan: &OverlayPlan<'_>,
        style: &OverlayStyle,
    ) -> AnnotateResult<()> {
        let width: u16 = frame
            .width
            .try_into()
            .map_err(|_| AnnotateError::validation("frame width exceeds u16"))?;
        let height: u16 = frame
            .height
            .try_into()
            .map_err(|_| AnnotateError::validation("frame height exceeds u16"))?;
        if frame.data.len() != frame.expected_len() {
            return Err(AnnotateError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        draw_scale_line(&mut ctx, plan.scale, style);
        draw_stride_markers(&mut ctx, plan.stride_markers, style);
        if let Some(jump) = plan.jump {
            draw_jump_line(&mut ctx, jump, style);
        }
        if let Some(angle) = plan.angle {
            draw_angle_line(&mut ctx, angle, style);
        }
        ctx.flush();

        let mut layer = match self.layer.take() {
            Some(pm) if pm.width() == width && pm.height() == height => pm,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        layer.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut layer);

        let out = premul_over_in_place(&mut frame.data, layer.data_as_u8_slice());
        self.ctx = Some(ctx);
        self.layer = Some(layer);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
