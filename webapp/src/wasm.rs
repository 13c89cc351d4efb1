//! Browser entry points. Values cross the boundary as JSON strings in the
//! same shape the shops collection stores them.

use wasm_bindgen::prelude::*;

use crate::block::BlockPlan;
use crate::console_log;
use crate::drawing::{boundary_draw_ops, shop_draw_ops};
use crate::filter::{filter_shops, ShopFilter};
use crate::geometry::{Bounds, CoordGeo, Viewport, HAL_BOUNDARY};
use crate::programs::{Program, ProgramRegistry};
use crate::shop::Shop;
use crate::stats::compute_stats;
use crate::utils;

const CANVAS_MARGIN: f64 = 16.0;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn from_json<'a, T: serde::Deserialize<'a>>(json: &'a str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(js_err)
}

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

/// Partitions four `{lat, lng}` points per a `BlockPlan` and returns the
/// numbered cells as `[{ no, center, polygon }]`.
#[wasm_bindgen]
pub fn partition_block(points_json: &str, plan_json: &str) -> Result<String, JsValue> {
    let points: Vec<CoordGeo> = from_json(points_json)?;
    let plan: BlockPlan = from_json(plan_json)?;
    let cells = plan.generate(&points).map_err(js_err)?;
    let out: Vec<serde_json::Value> = cells
        .iter()
        .map(|c| {
            serde_json::json!({
                "no": c.seq,
                "center": c.center,
                "polygon": c.vertices,
            })
        })
        .collect();
    serde_json::to_string(&out).map_err(js_err)
}

#[wasm_bindgen]
pub fn shop_stats(shops_json: &str) -> Result<String, JsValue> {
    let shops: Vec<Shop> = from_json(shops_json)?;
    serde_json::to_string(&compute_stats(&shops)).map_err(js_err)
}

/// Ids of the shops passing `filter` and `query`, in input order.
#[wasm_bindgen]
pub fn filter_shop_ids(shops_json: &str, programs_json: &str, filter: &str, query: &str) -> Result<String, JsValue> {
    let shops: Vec<Shop> = from_json(shops_json)?;
    let programs = ProgramRegistry::new(from_json::<Vec<Program>>(programs_json)?);
    let filter: ShopFilter = filter.parse().map_err(js_err)?;
    let ids: Vec<&str> = filter_shops(&shops, &filter, query, &programs)
        .into_iter()
        .map(|s| s.id.as_str())
        .collect();
    serde_json::to_string(&ids).map_err(js_err)
}

/// Clears the canvas and draws the hall outline and every shop on it.
#[wasm_bindgen]
pub fn draw_shops(canvas_id: &str, shops_json: &str, programs_json: &str) -> Result<(), JsValue> {
    let shops: Vec<Shop> = from_json(shops_json)?;
    let programs = ProgramRegistry::new(from_json::<Vec<Program>>(programs_json)?);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| js_err("no document"))?;
    let canvas: web_sys::HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| js_err(format!("no element #{canvas_id}")))?
        .dyn_into()
        .map_err(|_| js_err(format!("#{canvas_id} is not a <canvas>")))?;
    let context: web_sys::CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| js_err("no 2d context"))?
        .dyn_into()
        .map_err(|_| js_err("not a 2d context"))?;

    let width = f64::from(canvas.width());
    let height = f64::from(canvas.height());
    let mut bounds = Bounds::from_points(HAL_BOUNDARY.iter()).ok_or_else(|| js_err("empty boundary"))?;
    for shop in &shops {
        shop.polygon.iter().chain(shop.center.iter()).filter(|p| p.is_finite()).for_each(|p| bounds.extend(p));
    }
    let viewport = Viewport::fit(&bounds, width, height, CANVAS_MARGIN);

    context.clear_rect(0.0, 0.0, width, height);
    let ops = boundary_draw_ops(&HAL_BOUNDARY, &viewport)
        .into_iter()
        .chain(shop_draw_ops(&shops, &programs, &viewport));
    ops.for_each(|op| op.draw(&context));
    console_log!("drew {} shops", shops.len());
    Ok(())
}
