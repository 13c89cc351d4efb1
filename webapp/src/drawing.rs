use crate::geometry::{Coord2D, CoordGeo, Projection};
use crate::programs::ProgramRegistry;
use crate::shop::Shop;

pub const BOUNDARY_COLOR: &str = "#334155";
pub const LABEL_COLOR: &str = "#111827";

/// Drawing operation. Polygons are not stored as ops; a vector of
/// coordinates is mapped onto this enum on the fly while drawing.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp<CoordT> {
    BeginPath,
    MoveTo(CoordT),
    LineTo(CoordT),
    ClosePath,
    Stroke(String),
    Fill(String),
    /// Filled dot for shops that only have a center point.
    Marker { at: CoordT, radius: f64, color: String },
    /// Text centered on a point.
    Label { at: CoordT, text: String, color: String },
}

/// Consumes the line iterator and turns it into an iterator of drawing
/// operations for one closed path.
pub fn coord_iter_into_draw_ops<CoordT>(mut iter: impl Iterator<Item = CoordT>) -> impl Iterator<Item = DrawOp<CoordT>> {
    std::iter::once(DrawOp::BeginPath)
        .chain(iter.next().map(DrawOp::MoveTo))
        .chain(iter.map(DrawOp::LineTo))
        .chain(std::iter::once(DrawOp::ClosePath))
}

/// Outline of the whole market hall.
pub fn boundary_draw_ops(
    boundary: &[CoordGeo],
    proj: &impl Projection<CoordGeo, Coord2D>,
) -> Vec<DrawOp<Coord2D>> {
    let mut ops: Vec<_> = coord_iter_into_draw_ops(boundary.iter().map(|p| proj.project(p))).collect();
    ops.push(DrawOp::Stroke(BOUNDARY_COLOR.to_string()));
    ops
}

/// Draw ops for every shop: polygons filled and outlined in their map color,
/// labelled with the shop number, markers for shops with only a center.
/// Shops with neither are skipped.
pub fn shop_draw_ops(
    shops: &[Shop],
    programs: &ProgramRegistry,
    proj: &impl Projection<CoordGeo, Coord2D>,
) -> Vec<DrawOp<Coord2D>> {
    let mut ops = Vec::new();
    for shop in shops {
        let color = programs.color_of(shop).to_string();
        if shop.polygon.len() >= 3 {
            ops.extend(coord_iter_into_draw_ops(shop.polygon.iter().map(|p| proj.project(p))));
            ops.push(DrawOp::Fill(color.clone()));
            ops.push(DrawOp::Stroke(color));

            let n = shop.polygon.len() as f64;
            let (sx, sy) = shop
                .polygon
                .iter()
                .map(|p| proj.project(p))
                .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
            ops.push(DrawOp::Label {
                at: Coord2D { x: sx / n, y: sy / n },
                text: shop.no.trim().to_string(),
                color: LABEL_COLOR.to_string(),
            });
        } else if let Some(center) = shop.center.filter(CoordGeo::is_finite) {
            ops.push(DrawOp::Marker { at: proj.project(&center), radius: 4.0, color });
        }
    }
    ops
}

#[cfg(target_arch = "wasm32")]
impl DrawOp<Coord2D> {
    pub fn draw(&self, context: &web_sys::CanvasRenderingContext2d) {
        match self {
            DrawOp::BeginPath => context.begin_path(),
            DrawOp::MoveTo(Coord2D { x, y }) => context.move_to(*x, *y),
            DrawOp::LineTo(Coord2D { x, y }) => context.line_to(*x, *y),
            DrawOp::ClosePath => context.close_path(),
            DrawOp::Stroke(style) => {
                context.set_stroke_style_str(style);
                context.stroke();
            }
            DrawOp::Fill(style) => {
                context.set_fill_style_str(style);
                context.fill();
            }
            DrawOp::Marker { at, radius, color } => {
                context.begin_path();
                // Full circle; arc only fails for a negative radius
                let _ = context.arc(at.x, at.y, *radius, 0.0, std::f64::consts::TAU);
                context.set_fill_style_str(color);
                context.fill();
            }
            DrawOp::Label { at, text, color } => {
                context.set_fill_style_str(color);
                context.set_text_align("center");
                context.set_text_baseline("middle");
                let _ = context.fill_text(text, at.x, at.y);
            }
        }
    }
}
