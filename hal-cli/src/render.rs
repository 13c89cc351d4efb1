use std::path::Path;

use anyhow::anyhow;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{debug, warn};

use hal_map::drawing::{boundary_draw_ops, shop_draw_ops, DrawOp};
use hal_map::geometry::{Bounds, Coord2D, Viewport, HAL_BOUNDARY};
use hal_map::{ProgramRegistry, Shop};

const MARGIN: f64 = 24.0;
/// `#64748b`, used for colors that fail to parse.
const FALLBACK_COLOR: RGBColor = RGBColor(0x64, 0x74, 0x8b);

/// Parses `#rrggbb` or `#rgb`.
pub fn parse_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(RGBColor(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let c = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(RGBColor(c(0)?, c(1)?, c(2)?))
        }
        _ => None,
    }
}

fn color_or_fallback(hex: &str) -> RGBColor {
    parse_color(hex).unwrap_or(FALLBACK_COLOR)
}

fn px(c: &Coord2D) -> (i32, i32) {
    (c.x.round() as i32, c.y.round() as i32)
}

/// Viewport covering the hall outline plus every shop point.
pub fn map_viewport(shops: &[Shop], width: u32, height: u32) -> Viewport {
    let mut bounds = Bounds::from_points(HAL_BOUNDARY.iter())
        .unwrap_or(Bounds { min: HAL_BOUNDARY[0], max: HAL_BOUNDARY[0] });
    for shop in shops {
        shop.polygon
            .iter()
            .chain(shop.center.iter())
            .filter(|p| p.is_finite())
            .for_each(|p| bounds.extend(p));
    }
    Viewport::fit(&bounds, f64::from(width), f64::from(height), MARGIN)
}

fn draw_ops<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    ops: impl IntoIterator<Item = DrawOp<Coord2D>>,
) -> anyhow::Result<()> {
    let mut path: Vec<(i32, i32)> = Vec::new();
    let mut label_failed = false;

    for op in ops {
        match op {
            DrawOp::BeginPath => path.clear(),
            DrawOp::MoveTo(c) | DrawOp::LineTo(c) => path.push(px(&c)),
            DrawOp::ClosePath => {
                if let Some(&first) = path.first() {
                    path.push(first);
                }
            }
            DrawOp::Fill(color) => {
                let style = color_or_fallback(&color).mix(0.85).filled();
                root.draw(&Polygon::new(path.clone(), style))
                    .map_err(|e| anyhow!("fill failed: {e}"))?;
            }
            DrawOp::Stroke(color) => {
                let style = color_or_fallback(&color).stroke_width(1);
                root.draw(&PathElement::new(path.clone(), style))
                    .map_err(|e| anyhow!("stroke failed: {e}"))?;
            }
            DrawOp::Marker { at, radius, color } => {
                let style = color_or_fallback(&color).filled();
                root.draw(&Circle::new(px(&at), radius.round() as i32, style))
                    .map_err(|e| anyhow!("marker failed: {e}"))?;
            }
            DrawOp::Label { at, text, color } => {
                if label_failed || text.is_empty() {
                    continue;
                }
                let style = ("sans-serif", 11)
                    .into_font()
                    .color(&color_or_fallback(&color))
                    .pos(Pos::new(HPos::Center, VPos::Center));
                // Hosts without system fonts still get the shapes
                if let Err(e) = root.draw(&Text::new(text, px(&at), style)) {
                    warn!("skipping labels, text rendering failed: {}", e);
                    label_failed = true;
                }
            }
        }
    }
    Ok(())
}

/// Draws the hall outline and `shops` into a PNG at `output`.
pub fn render_png(
    output: &Path,
    width: u32,
    height: u32,
    shops: &[Shop],
    programs: &ProgramRegistry,
) -> anyhow::Result<()> {
    let viewport = map_viewport(shops, width, height);
    let ops: Vec<DrawOp<Coord2D>> = boundary_draw_ops(&HAL_BOUNDARY, &viewport)
        .into_iter()
        .chain(shop_draw_ops(shops, programs, &viewport))
        .collect();
    debug!("rendering {} draw ops at {}x{}", ops.len(), width, height);

    let root = BitMapBackend::new(output, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("clearing canvas failed: {e}"))?;
    draw_ops(&root, ops)?;
    root.present().map_err(|e| anyhow!("writing {} failed: {e}", output.display()))?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use hal_map::{BlockPlan, CoordGeo, Direction, NumberingOrigin};

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_color("#10b981"), Some(RGBColor(0x10, 0xb9, 0x81)));
        assert_eq!(parse_color(" #fff "), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_color("10b981"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gggggg"), None);
        assert_eq!(parse_color("#aé123"), None);
        assert_eq!(parse_color("#é1"), None);
        assert_eq!(color_or_fallback("#aé123"), FALLBACK_COLOR);
        assert_eq!(color_or_fallback("red"), FALLBACK_COLOR);
    }

    #[test]
    fn viewport_covers_shops_outside_the_hall() {
        let far = Shop { center: Some(CoordGeo::new(37.0, 30.8)), ..Default::default() };
        let viewport = map_viewport(&[far.clone()], 400, 300);
        let p = hal_map::geometry::Projection::project(&viewport, &far.center.unwrap());
        assert!(p.x <= 400.0 - MARGIN + 1e-6 && p.y >= MARGIN - 1e-6, "{p}");
    }

    #[test]
    fn writes_png() {
        let corners = [
            CoordGeo::new(36.9210, 30.7400),
            CoordGeo::new(36.9210, 30.7420),
            CoordGeo::new(36.9200, 30.7420),
            CoordGeo::new(36.9200, 30.7400),
        ];
        let plan = BlockPlan { start_no: 1, end_no: 4, direction: Direction::Horizontal, origin: NumberingOrigin::TopRight };
        let block = hal_map::BlockId::from_millis(1);
        let shops: Vec<Shop> = plan
            .generate(&corners)
            .unwrap()
            .iter()
            .map(|c| Shop::from_cell(c, &block, 1))
            .collect();

        let dir = std::env::temp_dir().join(format!("hal_render_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("map.png");
        render_png(&out, 320, 240, &shops, &ProgramRegistry::default()).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
