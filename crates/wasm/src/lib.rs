use flamelens_core::search::highlight_ranges;
use flamelens_core::{
    FlamegraphView, FlattenedFrames, FrameKey, FrameTree, PhysicalSize, ResizeEvent, SearchQuery,
    TrimRegion, ViewBounds, ZoomStrategy, hit_test, search_frames,
};
use flamelens_protocol::{Point, Rect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

#[derive(Debug, Serialize)]
struct Hit<'a> {
    key: FrameKey,
    name: &'a str,
    score: i64,
    ranges: &'a [[usize; 2]],
}

/// A frame tree with its view, driven from JavaScript.
///
/// Coordinates passed in are physical canvas pixels; views are exchanged in
/// the `x,y,width,height` config-space encoding.
#[wasm_bindgen]
pub struct Flamegraph {
    tree: FrameTree,
    view: FlamegraphView,
}

impl Flamegraph {
    fn from_json(json: &str, min_width: f64) -> Result<Self, serde_json::Error> {
        let tree = FrameTree::from_json(json.as_bytes())?;
        let view = FlamegraphView::new(ViewBounds::for_tree(&tree, min_width), PhysicalSize::default());
        Ok(Self { tree, view })
    }

    fn search_json(&self, query: &str) -> Result<String, String> {
        let frames = FlattenedFrames::new(&self.tree);
        let results = search_frames(&frames, &SearchQuery::parse(query)).map_err(|e| e.to_string())?;
        let hits: Vec<Hit<'_>> = results
            .ranked(&frames)
            .into_iter()
            .filter_map(|m| {
                let frame = frames.get(frames.index_of(m.key)?)?;
                Some(Hit {
                    key: m.key,
                    name: frame.name.as_str(),
                    score: m.score,
                    ranges: &m.ranges,
                })
            })
            .collect();
        serde_json::to_string(&hits).map_err(|e| e.to_string())
    }

    fn hit(&self, x: f64, y: f64) -> Option<FrameKey> {
        let cursor = self.view.physical_to_config(Point::new(x, y))?;
        hit_test(&self.tree.roots, cursor).map(|frame| frame.key)
    }

    fn zoom_to(&mut self, key: FrameKey, strategy: &str) -> Result<String, String> {
        let strategy: ZoomStrategy = strategy.parse().map_err(|e: flamelens_core::ViewError| e.to_string())?;
        let frames = FlattenedFrames::new(&self.tree);
        let frame = frames
            .index_of(key)
            .and_then(|index| frames.get(index))
            .ok_or_else(|| format!("no frame with key {}", key.0))?;
        self.view
            .zoom_into_frame(frame, strategy)
            .map_err(|e| e.to_string())?;
        Ok(self.view.encode())
    }
}

#[wasm_bindgen]
impl Flamegraph {
    /// Load a JSON frame tree. `min_width` is the narrowest view allowed, in
    /// config units.
    #[wasm_bindgen(constructor)]
    pub fn new(json: &str, min_width: f64) -> Result<Flamegraph, JsError> {
        Self::from_json(json, min_width).map_err(js_error)
    }

    pub fn frame_count(&self) -> usize {
        self.tree.frame_count()
    }

    /// Track the canvas size. Returns whether the physical size changed.
    pub fn resize(&mut self, logical_width: f64, logical_height: f64, device_pixel_ratio: f64) -> bool {
        let physical = ResizeEvent {
            canvas: flamelens_core::CanvasId(0),
            logical_width,
            logical_height,
            device_pixel_ratio,
        }
        .physical_size();
        let changed = physical != self.view.physical();
        self.view.resize(physical);
        changed
    }

    pub fn set_row_height(&mut self, row_height: Option<f64>) {
        self.view.set_row_height(row_height);
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.view.set_inverted(inverted);
    }

    /// Ranked search hits as a JSON array of
    /// `{key, name, score, ranges}`.
    pub fn search(&self, query: &str) -> Result<String, JsError> {
        self.search_json(query).map_err(js_error)
    }

    /// Key of the frame under the physical point, if any.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<u64> {
        self.hit(x, y).map(|key| key.0)
    }

    /// Clamp and apply a requested view; returns the encoded result.
    pub fn clamp_view(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<String, JsError> {
        self.view
            .set_config_view(Rect::new(x, y, width, height))
            .map_err(js_error)?;
        Ok(self.view.encode())
    }

    /// Move the view onto a frame with the `exact` or `min` strategy.
    pub fn zoom_to_frame(&mut self, key: u64, strategy: &str) -> Result<String, JsError> {
        self.zoom_to(FrameKey(key), strategy).map_err(js_error)
    }

    pub fn zoom_at(&mut self, factor: f64, x: f64, y: f64) -> String {
        self.view.zoom_at(factor, Point::new(x, y));
        self.view.encode()
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> String {
        self.view.pan_physical(dx, dy);
        self.view.encode()
    }

    pub fn encode_view(&self) -> String {
        self.view.encode()
    }

    /// Restore a persisted view. Invalid input resets the view and returns
    /// `false`.
    pub fn decode_view(&mut self, encoded: &str) -> bool {
        self.view.restore(encoded)
    }

    /// Config → physical transform, column-major.
    pub fn config_to_physical(&self) -> Vec<f64> {
        self.view.config_to_physical().values().to_vec()
    }
}

/// Center-trim `text` to `budget` characters. Returns `{text, trim}` JSON.
#[wasm_bindgen]
pub fn trim_text_center(text: &str, budget: usize) -> Result<String, JsError> {
    serde_json::to_string(&flamelens_core::trim_text_center(text, budget)).map_err(js_error)
}

/// Map match ranges (JSON `[[start, end], ...]`) through a trim region
/// (JSON, as returned by [`trim_text_center`]).
#[wasm_bindgen]
pub fn highlight(ranges: &str, trim: &str) -> Result<String, JsError> {
    let ranges: Vec<[usize; 2]> = serde_json::from_str(ranges).map_err(js_error)?;
    let trim: TrimRegion = serde_json::from_str(trim).map_err(js_error)?;
    let mapped = highlight_ranges(&ranges, &trim).map_err(js_error)?;
    serde_json::to_string(&mapped).map_err(js_error)
}
