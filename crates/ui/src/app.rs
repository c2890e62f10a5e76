use std::sync::Arc;

use eframe::egui;
use eframe::egui_glow;
use eframe::glow;
use egui::mutex::Mutex;
use flamelens_core::{
    CanvasId, ColorMap, FlamegraphRenderer, FlamegraphView, FlattenedFrames, FrameKey, FrameTree,
    RenderOptions, RenderSetupError, ResizeBroadcaster, ResizeEvent, ResizeState, ResizeSubscription,
    SearchQuery, SearchResults, Theme, ViewBounds, ZoomStrategy, hit_test, search_frames,
};
use flamelens_protocol::{Point, ThemeMode, ThemeToken};

use crate::glow_context::GlowContext;
use crate::overlay::{self, LabelMetrics, LabelPaint};
use crate::theme;

type SharedRenderer = Arc<Mutex<Option<FlamegraphRenderer<GlowContext>>>>;

const CANVAS: CanvasId = CanvasId(0);

/// Label inset from the frame edge, in logical points.
const LABEL_PADDING: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorBy {
    Depth,
    Name,
}

/// A loaded frame tree and everything derived from it.
struct Profile {
    tree: FrameTree,
    view: FlamegraphView,
    results: Option<SearchResults>,
    /// Search hits, best first.
    ranked: Vec<FrameKey>,
    next_result: usize,
}

/// Main application state.
pub struct FlameApp {
    theme: Theme,
    color_by: ColorBy,
    options: RenderOptions,
    gl: Option<Arc<glow::Context>>,
    renderer: SharedRenderer,
    profile: Option<Profile>,
    search_text: String,
    search_error: Option<String>,
    resize: ResizeBroadcaster,
    subscription: ResizeSubscription,
    canvas: ResizeState,
    /// View string to restore once a tree is loaded.
    pending_view: Option<String>,
    /// Last view string written to the URL hash.
    #[cfg(target_arch = "wasm32")]
    published_view: String,
    error: Option<String>,
}

fn create_renderer(
    gl: Option<&Arc<glow::Context>>,
    options: RenderOptions,
) -> Result<FlamegraphRenderer<GlowContext>, RenderSetupError> {
    let gl = gl.ok_or(RenderSetupError::MissingContext)?;
    FlamegraphRenderer::new(&mut GlowContext::new(Arc::clone(gl)), options)
}

/// Format a duration in config time units.
fn format_duration(units: f64) -> String {
    if units >= 100.0 {
        format!("{units:.0}")
    } else {
        format!("{units:.3}")
    }
}

impl FlameApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: RenderOptions) -> Self {
        let theme = Theme::dark();
        cc.egui_ctx.set_visuals(theme::visuals(&theme));
        theme::apply_typography(&cc.egui_ctx);

        let options = RenderOptions {
            clear_color: theme.resolve(ThemeToken::Background),
            ..options
        };
        let gl = cc.gl.clone();
        let (renderer, error) = match create_renderer(gl.as_ref(), options) {
            Ok(renderer) => (Some(renderer), None),
            Err(err) => {
                log::error!("flamegraph renderer setup failed: {err}");
                (None, Some(format!("Renderer unavailable: {err}")))
            }
        };

        let resize = ResizeBroadcaster::new();
        let subscription = resize.subscribe(CANVAS);

        Self {
            theme,
            color_by: ColorBy::Depth,
            options,
            gl,
            renderer: Arc::new(Mutex::new(renderer)),
            profile: None,
            search_text: String::new(),
            search_error: None,
            resize,
            subscription,
            canvas: ResizeState::new(CANVAS),
            pending_view: Self::view_from_location(),
            #[cfg(target_arch = "wasm32")]
            published_view: String::new(),
            error,
        }
    }

    /// The `#view=x,y,w,h` fragment of the page URL.
    #[cfg(target_arch = "wasm32")]
    fn view_from_location() -> Option<String> {
        let hash = web_sys::window()?.location().hash().ok()?;
        hash.strip_prefix("#view=").map(str::to_string)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn view_from_location() -> Option<String> {
        None
    }

    #[cfg(target_arch = "wasm32")]
    fn publish_view(&mut self) {
        let Some(profile) = &self.profile else {
            return;
        };
        let encoded = profile.view.encode();
        if encoded == self.published_view {
            return;
        }
        if let Some(window) = web_sys::window()
            && window.location().set_hash(&format!("view={encoded}")).is_ok()
        {
            self.published_view = encoded;
        }
    }

    /// Replace the current tree with one parsed from `data` (JSON).
    pub fn load_tree(&mut self, data: &[u8]) {
        let tree = match FrameTree::from_json(data) {
            Ok(tree) => tree,
            Err(err) => {
                self.error = Some(format!("Failed to parse frame tree: {err}"));
                return;
            }
        };
        if let Err(err) = tree.validate() {
            log::warn!("frame tree is not well nested: {err}");
        }
        log::info!("loaded {} frames, {} rows", tree.frame_count(), tree.max_depth() + 1);

        let min_width = (tree.duration() * 1e-6).max(f64::EPSILON);
        let mut view = FlamegraphView::new(ViewBounds::for_tree(&tree, min_width), self.canvas.physical());
        view.set_row_height(Some(f64::from(theme::ROW_HEIGHT) * self.canvas.device_pixel_ratio()));
        if let Some(saved) = self.pending_view.take() {
            view.restore(&saved);
        }

        self.profile = Some(Profile {
            tree,
            view,
            results: None,
            ranked: Vec::new(),
            next_result: 0,
        });
        self.error = None;
        self.upload_frames();
        self.run_search();
    }

    /// Rebuild every GPU buffer from the loaded tree.
    fn upload_frames(&mut self) {
        let (Some(gl), Some(profile)) = (&self.gl, &self.profile) else {
            return;
        };
        let mut renderer = self.renderer.lock();
        let Some(renderer) = renderer.as_mut() else {
            return;
        };
        let frames = FlattenedFrames::new(&profile.tree);
        let colors = match self.color_by {
            ColorBy::Depth => ColorMap::by_depth(&frames, &self.theme),
            ColorBy::Name => ColorMap::by_name(&frames, &self.theme),
        };
        let mut ctx = GlowContext::new(Arc::clone(gl));
        renderer.set_frames(&mut ctx, &frames, &colors);
        renderer.set_search_results(&mut ctx, &frames, profile.results.as_ref());
    }

    fn run_search(&mut self) {
        let Some(profile) = &mut self.profile else {
            return;
        };
        let frames = FlattenedFrames::new(&profile.tree);
        let query = SearchQuery::parse(self.search_text.trim());
        let results = if query.is_empty() {
            Ok(None)
        } else {
            search_frames(&frames, &query).map(Some)
        };

        let results = match results {
            Ok(results) => results,
            Err(err) => {
                self.search_error = Some(err.to_string());
                return;
            }
        };
        self.search_error = None;
        profile.ranked = results
            .as_ref()
            .map(|r| r.ranked(&frames).iter().map(|m| m.key).collect())
            .unwrap_or_default();
        profile.next_result = 0;

        let mut renderer = self.renderer.lock();
        if let (Some(gl), Some(renderer)) = (&self.gl, renderer.as_mut()) {
            renderer.set_search_results(&mut GlowContext::new(Arc::clone(gl)), &frames, results.as_ref());
        }
        profile.results = results;
    }

    /// Bring the next-best search hit into view, moving as little as
    /// possible.
    fn show_next_result(&mut self) {
        let Some(profile) = &mut self.profile else {
            return;
        };
        let Some(key) = profile.ranked.get(profile.next_result).copied() else {
            return;
        };
        profile.next_result = (profile.next_result + 1) % profile.ranked.len();
        let frames = FlattenedFrames::new(&profile.tree);
        let Some(frame) = frames.index_of(key).and_then(|index| frames.get(index)) else {
            return;
        };
        if let Err(err) = profile.view.zoom_into_frame(frame, ZoomStrategy::Min) {
            log::warn!("cannot show search result: {err}");
        }
    }

    fn set_theme(&mut self, ctx: &egui::Context, theme: Theme) {
        self.theme = theme;
        ctx.set_visuals(theme::visuals(&theme));
        self.options.clear_color = theme.resolve(ThemeToken::Background);
        if let Some(renderer) = self.renderer.lock().as_mut() {
            renderer.set_options(self.options);
        }
        self.upload_frames();
    }

    fn toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.heading("flamelens");
        ui.separator();

        #[cfg(not(target_arch = "wasm32"))]
        if ui.button("Open").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("Frame tree", &["json"])
                .pick_file()
        {
            match std::fs::read(&path) {
                Ok(data) => self.load_tree(&data),
                Err(e) => {
                    self.error = Some(format!("Failed to read file: {e}"));
                }
            }
        }

        let search = ui.add(
            egui::TextEdit::singleline(&mut self.search_text)
                .hint_text("fuzzy, or /regex/i")
                .desired_width(220.0),
        );
        if search.changed() {
            self.run_search();
        }
        let hits = self.profile.as_ref().map_or(0, |p| p.ranked.len());
        let enter = search.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.add_enabled(hits > 0, egui::Button::new("Next")).clicked() || (enter && hits > 0) {
            self.show_next_result();
        }
        if let Some(err) = &self.search_error {
            ui.colored_label(ui.visuals().error_fg_color, err);
        } else if hits > 0 {
            ui.label(format!("{hits} hits"));
        }

        ui.separator();

        let before = self.color_by;
        egui::ComboBox::from_id_salt("color_by")
            .selected_text(match self.color_by {
                ColorBy::Depth => "Color by depth",
                ColorBy::Name => "Color by name",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut self.color_by, ColorBy::Depth, "Color by depth");
                ui.selectable_value(&mut self.color_by, ColorBy::Name, "Color by name");
            });
        if self.color_by != before {
            self.upload_frames();
        }

        let theme_label = match self.theme.mode {
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
        };
        if ui.button(theme_label).clicked() {
            let next = match self.theme.mode {
                ThemeMode::Dark => Theme::light(),
                ThemeMode::Light => Theme::dark(),
            };
            self.set_theme(ctx, next);
        }

        if let Some(profile) = &mut self.profile {
            let mut inverted = profile.view.is_inverted();
            if ui.checkbox(&mut inverted, "Icicle").changed() {
                profile.view.set_inverted(inverted);
            }
            if ui.button("Reset view").clicked() {
                profile.view.reset_config_view();
            }
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        if let Some(err) = &self.error {
            ui.colored_label(ui.visuals().error_fg_color, err);
        } else if let Some(profile) = &self.profile {
            let view = profile.view.config_view();
            ui.label(format!(
                "Frames: {} | Duration: {} | Viewing: {} | view={}",
                profile.tree.frame_count(),
                format_duration(profile.tree.duration()),
                format_duration(view.width),
                profile.view.encode(),
            ));
        } else {
            ui.label("No frame tree loaded. Click Open or drag & drop a JSON file");
        }
    }

    /// Pan and zoom from pointer and keyboard input over the canvas.
    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let Some(profile) = &mut self.profile else {
            return;
        };
        let dpr = self.canvas.device_pixel_ratio();
        let canvas = response.rect;
        let to_physical = |pos: egui::Pos2| {
            Point::new(
                f64::from(pos.x - canvas.left()) * dpr,
                f64::from(pos.y - canvas.top()) * dpr,
            )
        };
        let center = to_physical(canvas.center());
        let anchor = response.hover_pos().map_or(center, to_physical);

        if response.dragged() {
            let delta = response.drag_delta();
            profile
                .view
                .pan_physical(f64::from(delta.x) * dpr, f64::from(delta.y) * dpr);
        }

        if response.double_clicked()
            && let Some(cursor) = profile.view.physical_to_config(anchor)
            && let Some(frame) = hit_test(&profile.tree.roots, cursor)
            && let Err(err) = profile.view.zoom_into_frame(frame, ZoomStrategy::Exact)
        {
            log::warn!("cannot zoom into frame: {err}");
        }

        if response.hovered() {
            // Scroll wheel = zoom, horizontal scroll = pan
            let scroll = ui.input(|i| i.smooth_scroll_delta);
            if scroll.y.abs() > 0.1 {
                profile.view.zoom_at(2.0_f64.powf(-f64::from(scroll.y) * 0.01), anchor);
            }
            if scroll.x.abs() > 0.1 {
                profile.view.pan_physical(f64::from(scroll.x) * dpr, 0.0);
            }

            let zoom_delta = ui.input(|i| i.zoom_delta());
            if (zoom_delta - 1.0).abs() > 0.001 {
                profile.view.zoom_at(1.0 / f64::from(zoom_delta), anchor);
            }
        }

        if ui.ctx().wants_keyboard_input() {
            return;
        }
        let step = f64::from(canvas.width()) * dpr * 0.1;
        ui.input(|i| {
            if i.key_pressed(egui::Key::A) || i.key_pressed(egui::Key::ArrowLeft) {
                profile.view.pan_physical(step, 0.0);
            }
            if i.key_pressed(egui::Key::D) || i.key_pressed(egui::Key::ArrowRight) {
                profile.view.pan_physical(-step, 0.0);
            }
            if i.key_pressed(egui::Key::W) || i.key_pressed(egui::Key::ArrowUp) {
                profile.view.pan_physical(0.0, step);
            }
            if i.key_pressed(egui::Key::S) || i.key_pressed(egui::Key::ArrowDown) {
                profile.view.pan_physical(0.0, -step);
            }
            // +/= key = zoom in, - key = zoom out, 0 = reset
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                profile.view.zoom_at(0.5, center);
            }
            if i.key_pressed(egui::Key::Minus) {
                profile.view.zoom_at(2.0, center);
            }
            if i.key_pressed(egui::Key::Num0) {
                profile.view.reset_config_view();
            }
        });
    }

    fn flamegraph_panel(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(available, egui::Sense::click_and_drag());
        let pixels_per_point = ui.ctx().pixels_per_point();

        self.resize.dispatch(ResizeEvent {
            canvas: CANVAS,
            logical_width: f64::from(available.width()),
            logical_height: f64::from(available.height()),
            device_pixel_ratio: f64::from(pixels_per_point),
        });
        if self.canvas.poll(&self.subscription)
            && let Some(profile) = &mut self.profile
        {
            profile.view.resize(self.canvas.physical());
            profile
                .view
                .set_row_height(Some(f64::from(theme::ROW_HEIGHT) * self.canvas.device_pixel_ratio()));
        }

        self.handle_input(ui, &response);

        let Some(profile) = &self.profile else {
            ui.painter()
                .rect_filled(available, egui::CornerRadius::ZERO, theme::resolve(&self.theme, ThemeToken::Background));
            return;
        };
        let physical = profile.view.physical();
        let model = profile.view.config_to_physical();

        let renderer = Arc::clone(&self.renderer);
        let callback = egui_glow::CallbackFn::new(move |info, painter| {
            let mut ctx = GlowContext::for_paint(Arc::clone(painter.gl()), &info);
            if let Some(renderer) = renderer.lock().as_ref() {
                renderer.draw(&mut ctx, physical, &model);
            }
        });
        ui.painter().add(egui::PaintCallback {
            rect: available,
            callback: Arc::new(callback),
        });

        let painter = ui.painter_at(available);
        let font = egui::FontId::monospace(theme::FONT_CAPTION);
        let char_width = painter
            .layout_no_wrap("M".to_owned(), font.clone(), egui::Color32::WHITE)
            .size()
            .x;
        let metrics = LabelMetrics {
            char_width: f64::from(char_width * pixels_per_point),
            padding: f64::from(LABEL_PADDING * pixels_per_point),
        };
        let labels = overlay::layout_labels(&profile.tree.roots, &model, physical, metrics, profile.results.as_ref());
        overlay::paint_labels(
            &painter,
            available,
            pixels_per_point,
            metrics,
            &labels,
            &LabelPaint {
                font,
                text: theme::resolve(&self.theme, ThemeToken::LabelOnFrame),
                highlight: theme::resolve(&self.theme, ThemeToken::SearchHighlight),
            },
        );

        let dpr = self.canvas.device_pixel_ratio();
        let hovered = response.hover_pos().and_then(|pos| {
            let point = Point::new(
                f64::from(pos.x - available.left()) * dpr,
                f64::from(pos.y - available.top()) * dpr,
            );
            let cursor = profile.view.physical_to_config(point)?;
            hit_test(&profile.tree.roots, cursor)
        });
        let Some(frame) = hovered else {
            return;
        };
        overlay::paint_hover(
            &painter,
            available,
            pixels_per_point,
            frame,
            &model,
            theme::resolve(&self.theme, ThemeToken::HoverHighlight),
        );
        let total = profile.tree.duration();
        let score = profile
            .results
            .as_ref()
            .and_then(|r| r.get(frame.key))
            .map(|m| m.score);
        response.on_hover_ui_at_pointer(|ui| {
            ui.strong(frame.name.as_str());
            let share = if total > 0.0 { frame.duration() / total * 100.0 } else { 0.0 };
            ui.label(format!("{} ({share:.1}% of total)", format_duration(frame.duration())));
            ui.label(format!("depth {}", frame.depth));
            if let Some(score) = score {
                ui.label(format!("search score {score}"));
            }
        });
    }

    fn take_dropped_file(ctx: &egui::Context) -> Option<Result<Vec<u8>, String>> {
        ctx.input(|i| {
            let file = i.raw.dropped_files.first()?;
            if let Some(bytes) = &file.bytes {
                return Some(Ok(bytes.to_vec()));
            }
            let path = file.path.as_ref()?;
            Some(std::fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display())))
        })
    }
}

impl eframe::App for FlameApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match Self::take_dropped_file(ctx) {
            Some(Ok(data)) => self.load_tree(&data),
            Some(Err(err)) => self.error = Some(err),
            None => {}
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| self.toolbar(ctx, ui));
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| self.status_bar(ui));
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.flamegraph_panel(ui));

        #[cfg(target_arch = "wasm32")]
        self.publish_view();
    }

    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        let renderer = self.renderer.lock().take();
        if let (Some(gl), Some(renderer)) = (&self.gl, renderer) {
            renderer.destroy(&mut GlowContext::new(Arc::clone(gl)));
        }
    }
}
