use flamelens_protocol::Mat3;

use super::RenderSetupError;
use super::buffers::{
    BOUNDS_COMPONENTS, COLOR_COMPONENTS, POSITION_COMPONENTS, SEARCH_COMPONENTS, VERTICES_PER_FRAME,
    build_bounds, build_colors, build_positions, build_search_flags,
};
use super::context::{GraphicsContext, ShaderStage, UniformValue};
use super::shaders;
use crate::colors::ColorMap;
use crate::model::FlattenedFrames;
use crate::resize::PhysicalSize;
use crate::search::SearchResults;
use crate::theme::RenderOptions;
use crate::viewport::physical_border_size;

struct Attributes {
    position: u32,
    bounds: u32,
    color: u32,
    is_search_result: u32,
}

struct Uniforms<L> {
    model: L,
    projection: L,
    border_width: L,
    draw_border: L,
    search_active: L,
    search_dim: L,
}

/// Owns the GPU program and buffers for one flamegraph canvas.
///
/// The graphics context is borrowed for each call rather than stored, so
/// the host keeps control of it between frames. Release everything with
/// [`FlamegraphRenderer::destroy`] on the same context.
pub struct FlamegraphRenderer<C: GraphicsContext> {
    program: C::Program,
    vertex_array: C::VertexArray,
    positions: C::Buffer,
    bounds: C::Buffer,
    colors: C::Buffer,
    search: C::Buffer,
    uniforms: Uniforms<C::UniformLocation>,
    options: RenderOptions,
    frame_count: usize,
    search_active: bool,
}

impl<C: GraphicsContext> FlamegraphRenderer<C> {
    /// Compile and link the program, look up every attribute and uniform,
    /// and allocate the vertex buffers.
    pub fn new(ctx: &mut C, options: RenderOptions) -> Result<Self, RenderSetupError> {
        let program = compile_and_link(ctx)?;

        let (attributes, uniforms) = match locate(ctx, &program) {
            Ok(found) => found,
            Err(err) => {
                ctx.delete_program(program);
                return Err(err);
            }
        };

        let vertex_array = match ctx.create_vertex_array() {
            Ok(vertex_array) => vertex_array,
            Err(reason) => {
                ctx.delete_program(program);
                return Err(RenderSetupError::BufferAllocation(reason));
            }
        };

        let mut buffers = Vec::with_capacity(4);
        for _ in 0..4 {
            match ctx.create_buffer() {
                Ok(buffer) => buffers.push(buffer),
                Err(reason) => {
                    release(ctx, program, vertex_array, buffers);
                    return Err(RenderSetupError::BufferAllocation(reason));
                }
            }
        }
        let [positions, bounds, colors, search] = match <[C::Buffer; 4]>::try_from(buffers) {
            Ok(buffers) => buffers,
            Err(buffers) => {
                release(ctx, program, vertex_array, buffers);
                return Err(RenderSetupError::BufferAllocation(
                    "buffer count mismatch".to_string(),
                ));
            }
        };

        ctx.bind_vertex_array(Some(&vertex_array));
        ctx.set_attribute(attributes.position, &positions, POSITION_COMPONENTS);
        ctx.set_attribute(attributes.bounds, &bounds, BOUNDS_COMPONENTS);
        ctx.set_attribute(attributes.color, &colors, COLOR_COMPONENTS);
        ctx.set_attribute(attributes.is_search_result, &search, SEARCH_COMPONENTS);
        ctx.bind_vertex_array(None);

        log::info!("flamegraph program linked");

        Ok(Self {
            program,
            vertex_array,
            positions,
            bounds,
            colors,
            search,
            uniforms,
            options,
            frame_count: 0,
            search_active: false,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn vertex_count(&self) -> usize {
        self.frame_count * VERTICES_PER_FRAME
    }

    /// Rebuild every buffer for a new frame list. Search flags are cleared.
    pub fn set_frames(&mut self, ctx: &mut C, frames: &FlattenedFrames<'_>, colors: &ColorMap) {
        let (color_data, missing) = build_colors(frames, colors);
        if missing > 0 {
            log::warn!(
                "{missing} of {} frames have no color, using the fallback",
                frames.len()
            );
        }

        ctx.upload_data(&self.positions, &build_positions(frames));
        ctx.upload_data(&self.bounds, &build_bounds(frames));
        ctx.upload_data(&self.colors, &color_data);
        ctx.upload_data(&self.search, &build_search_flags(frames, None));

        self.frame_count = frames.len();
        self.search_active = false;
        log::debug!("rebuilt frame buffers for {} frames", self.frame_count);
    }

    /// Rebuild only the search flags. `None` ends the search; `Some` with no
    /// hits dims every frame.
    ///
    /// Frames that do not match the loaded buffers end the search instead,
    /// so no flags from an earlier search are left on screen.
    pub fn set_search_results(
        &mut self,
        ctx: &mut C,
        frames: &FlattenedFrames<'_>,
        results: Option<&SearchResults>,
    ) {
        if frames.len() != self.frame_count {
            log::warn!(
                "search flags for {} frames do not match {} loaded frames, clearing search",
                frames.len(),
                self.frame_count
            );
            let cleared = vec![0.0_f32; self.vertex_count() * usize::from(SEARCH_COMPONENTS)];
            ctx.upload_data(&self.search, &cleared);
            self.search_active = false;
            return;
        }
        ctx.upload_data(&self.search, &build_search_flags(frames, results));
        self.search_active = results.is_some();
        log::debug!(
            "search flags updated: {} hits",
            results.map_or(0, SearchResults::len)
        );
    }

    /// Draw all frames into a canvas of `physical` size with
    /// `config_to_physical` as the model transform.
    pub fn draw(&self, ctx: &mut C, physical: PhysicalSize, config_to_physical: &Mat3) {
        if physical.is_empty() {
            return;
        }

        ctx.clear(self.options.clear_color);
        ctx.use_program(Some(&self.program));

        let projection = Mat3::projection(f64::from(physical.width), f64::from(physical.height));
        ctx.set_uniform(
            &self.uniforms.projection,
            UniformValue::Mat3(projection.to_f32_array()),
        );
        ctx.set_uniform(
            &self.uniforms.model,
            UniformValue::Mat3(config_to_physical.to_f32_array()),
        );

        let border = physical_border_size(config_to_physical);
        let (border_x, border_y) = border.unwrap_or((0.0, 0.0));
        ctx.set_uniform(
            &self.uniforms.draw_border,
            UniformValue::Bool(self.options.draw_border && border.is_some()),
        );
        ctx.set_uniform(
            &self.uniforms.border_width,
            UniformValue::Vec2([border_x as f32, border_y as f32]),
        );
        ctx.set_uniform(
            &self.uniforms.search_active,
            UniformValue::Bool(self.search_active),
        );
        ctx.set_uniform(
            &self.uniforms.search_dim,
            UniformValue::Float(self.options.search_dim_alpha),
        );

        ctx.set_viewport(physical);
        if self.frame_count > 0 {
            ctx.bind_vertex_array(Some(&self.vertex_array));
            ctx.draw_triangles(self.vertex_count());
            ctx.bind_vertex_array(None);
        }
        ctx.use_program(None);
    }

    pub fn destroy(self, ctx: &mut C) {
        ctx.delete_buffer(self.positions);
        ctx.delete_buffer(self.bounds);
        ctx.delete_buffer(self.colors);
        ctx.delete_buffer(self.search);
        ctx.delete_vertex_array(self.vertex_array);
        ctx.delete_program(self.program);
    }
}

/// Delete what a failed setup had already created.
fn release<C: GraphicsContext>(
    ctx: &mut C,
    program: C::Program,
    vertex_array: C::VertexArray,
    buffers: Vec<C::Buffer>,
) {
    for buffer in buffers {
        ctx.delete_buffer(buffer);
    }
    ctx.delete_vertex_array(vertex_array);
    ctx.delete_program(program);
}

fn compile_and_link<C: GraphicsContext>(ctx: &mut C) -> Result<C::Program, RenderSetupError> {
    let vertex = ctx
        .compile_shader(ShaderStage::Vertex, shaders::VERTEX_SHADER)
        .map_err(|log| RenderSetupError::ShaderCompile {
            stage: ShaderStage::Vertex,
            log,
        })?;
    let fragment = match ctx.compile_shader(ShaderStage::Fragment, shaders::FRAGMENT_SHADER) {
        Ok(fragment) => fragment,
        Err(log) => {
            ctx.delete_shader(vertex);
            return Err(RenderSetupError::ShaderCompile {
                stage: ShaderStage::Fragment,
                log,
            });
        }
    };

    let linked = ctx.link_program(&vertex, &fragment);
    ctx.delete_shader(vertex);
    ctx.delete_shader(fragment);
    linked.map_err(|log| RenderSetupError::ProgramLink { log })
}

fn attribute<C: GraphicsContext>(
    ctx: &mut C,
    program: &C::Program,
    name: &'static str,
) -> Result<u32, RenderSetupError> {
    ctx.attribute_location(program, name)
        .ok_or(RenderSetupError::MissingAttribute(name))
}

fn uniform<C: GraphicsContext>(
    ctx: &mut C,
    program: &C::Program,
    name: &'static str,
) -> Result<C::UniformLocation, RenderSetupError> {
    ctx.uniform_location(program, name)
        .ok_or(RenderSetupError::MissingUniform(name))
}

fn locate<C: GraphicsContext>(
    ctx: &mut C,
    program: &C::Program,
) -> Result<(Attributes, Uniforms<C::UniformLocation>), RenderSetupError> {
    let attributes = Attributes {
        position: attribute(ctx, program, shaders::A_POSITION)?,
        bounds: attribute(ctx, program, shaders::A_BOUNDS)?,
        color: attribute(ctx, program, shaders::A_COLOR)?,
        is_search_result: attribute(ctx, program, shaders::A_IS_SEARCH_RESULT)?,
    };
    let uniforms = Uniforms {
        model: uniform(ctx, program, shaders::U_MODEL)?,
        projection: uniform(ctx, program, shaders::U_PROJECTION)?,
        border_width: uniform(ctx, program, shaders::U_BORDER_WIDTH)?,
        draw_border: uniform(ctx, program, shaders::U_DRAW_BORDER)?,
        search_active: uniform(ctx, program, shaders::U_SEARCH_ACTIVE)?,
        search_dim: uniform(ctx, program, shaders::U_SEARCH_DIM)?,
    };
    Ok((attributes, uniforms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frame, FrameKey, FrameTree};
    use crate::render::recording::{Call, RecordingContext};
    use crate::search::{SearchQuery, search_frames};
    use crate::theme::Theme;
    use flamelens_protocol::Rect;

    fn tree() -> FrameTree {
        FrameTree::new(vec![Frame {
            key: FrameKey(1),
            name: "main".into(),
            start: 0.0,
            end: 100.0,
            depth: 0,
            children: vec![
                Frame {
                    key: FrameKey(2),
                    name: "parse".into(),
                    start: 0.0,
                    end: 40.0,
                    depth: 1,
                    children: vec![],
                },
                Frame {
                    key: FrameKey(3),
                    name: "render".into(),
                    start: 50.0,
                    end: 90.0,
                    depth: 1,
                    children: vec![],
                },
            ],
        }])
    }

    fn renderer(ctx: &mut RecordingContext) -> FlamegraphRenderer<RecordingContext> {
        FlamegraphRenderer::new(ctx, RenderOptions::default()).expect("setup succeeds")
    }

    #[test]
    fn setup_wires_all_attributes() {
        let mut ctx = RecordingContext::new();
        let _renderer = renderer(&mut ctx);
        let attributes = ctx
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::SetAttribute { .. }))
            .count();
        assert_eq!(attributes, 4);
        // program, vertex array, four buffers; shaders already released
        assert_eq!(ctx.live_objects(), 6);
    }

    #[test]
    fn compile_failure_is_fatal() {
        let mut ctx = RecordingContext::new().with_compile_failure(ShaderStage::Fragment);
        let err = FlamegraphRenderer::new(&mut ctx, RenderOptions::default()).err();
        assert!(matches!(
            err,
            Some(RenderSetupError::ShaderCompile {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
        assert_eq!(ctx.live_objects(), 0);
    }

    #[test]
    fn link_failure_is_fatal() {
        let mut ctx = RecordingContext::new().with_link_failure();
        let err = FlamegraphRenderer::new(&mut ctx, RenderOptions::default()).err();
        assert!(matches!(err, Some(RenderSetupError::ProgramLink { .. })));
        assert_eq!(ctx.live_objects(), 0);
    }

    #[test]
    fn missing_locations_are_fatal() {
        let mut ctx = RecordingContext::new().without_location(shaders::A_COLOR);
        let err = FlamegraphRenderer::new(&mut ctx, RenderOptions::default()).err();
        assert_eq!(err, Some(RenderSetupError::MissingAttribute("a_color")));
        assert_eq!(ctx.live_objects(), 0);

        let mut ctx = RecordingContext::new().without_location(shaders::U_SEARCH_DIM);
        let err = FlamegraphRenderer::new(&mut ctx, RenderOptions::default()).err();
        assert_eq!(err, Some(RenderSetupError::MissingUniform("u_search_dim")));
    }

    #[test]
    fn allocation_failure_releases_program() {
        let mut ctx = RecordingContext::new().with_allocation_failure();
        let err = FlamegraphRenderer::new(&mut ctx, RenderOptions::default()).err();
        assert!(matches!(err, Some(RenderSetupError::BufferAllocation(_))));
        assert_eq!(ctx.live_objects(), 0);
    }

    #[test]
    fn set_frames_fills_buffers() {
        let tree = tree();
        let frames = FlattenedFrames::new(&tree);
        let mut ctx = RecordingContext::new();
        let mut renderer = renderer(&mut ctx);
        renderer.set_frames(&mut ctx, &frames, &ColorMap::by_depth(&frames, &Theme::dark()));

        assert_eq!(renderer.frame_count(), 3);
        assert_eq!(ctx.attribute_data(shaders::A_POSITION).map(<[f32]>::len), Some(36));
        assert_eq!(ctx.attribute_data(shaders::A_BOUNDS).map(<[f32]>::len), Some(72));
        assert_eq!(ctx.attribute_data(shaders::A_COLOR).map(<[f32]>::len), Some(72));
        assert_eq!(ctx.attribute_data(shaders::A_IS_SEARCH_RESULT), Some(&[0.0; 18][..]));
    }

    #[test]
    fn search_update_touches_only_the_flag_buffer() {
        let tree = tree();
        let frames = FlattenedFrames::new(&tree);
        let mut ctx = RecordingContext::new();
        let mut renderer = renderer(&mut ctx);
        renderer.set_frames(&mut ctx, &frames, &ColorMap::by_depth(&frames, &Theme::dark()));
        ctx.take_calls();

        let results = search_frames(&frames, &SearchQuery::fuzzy("render")).expect("searches");
        renderer.set_search_results(&mut ctx, &frames, Some(&results));

        let uploads: Vec<&Call> = ctx
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::UploadData { .. }))
            .collect();
        assert_eq!(uploads.len(), 1);
        let flags = ctx.attribute_data(shaders::A_IS_SEARCH_RESULT).expect("bound");
        assert_eq!(&flags[12..18], &[1.0; 6]);
        assert_eq!(&flags[..12], &[0.0; 12]);
    }

    #[test]
    fn mismatched_frames_end_the_search() {
        let tree = tree();
        let frames = FlattenedFrames::new(&tree);
        let mut ctx = RecordingContext::new();
        let mut renderer = renderer(&mut ctx);
        renderer.set_frames(&mut ctx, &frames, &ColorMap::by_depth(&frames, &Theme::dark()));
        let results = search_frames(&frames, &SearchQuery::fuzzy("render")).expect("searches");
        renderer.set_search_results(&mut ctx, &frames, Some(&results));

        let other = FrameTree::new(vec![Frame {
            key: FrameKey(9),
            name: "idle".into(),
            start: 0.0,
            end: 10.0,
            depth: 0,
            children: vec![],
        }]);
        let other_frames = FlattenedFrames::new(&other);
        renderer.set_search_results(&mut ctx, &other_frames, None);
        renderer.draw(
            &mut ctx,
            PhysicalSize::new(100, 40),
            &Mat3::from_scaling(1.0, 20.0),
        );

        assert_eq!(ctx.last_uniform(shaders::U_SEARCH_ACTIVE), Some(UniformValue::Bool(false)));
        assert_eq!(ctx.attribute_data(shaders::A_IS_SEARCH_RESULT), Some(&[0.0; 18][..]));
    }

    #[test]
    fn mismatched_hits_are_not_drawn_either() {
        let tree = tree();
        let frames = FlattenedFrames::new(&tree);
        let mut ctx = RecordingContext::new();
        let mut renderer = renderer(&mut ctx);
        renderer.set_frames(&mut ctx, &frames, &ColorMap::by_depth(&frames, &Theme::dark()));

        let other = FrameTree::new(vec![Frame {
            key: FrameKey(3),
            name: "render".into(),
            start: 0.0,
            end: 10.0,
            depth: 0,
            children: vec![],
        }]);
        let other_frames = FlattenedFrames::new(&other);
        let results = search_frames(&other_frames, &SearchQuery::fuzzy("render")).expect("searches");
        renderer.set_search_results(&mut ctx, &other_frames, Some(&results));

        assert_eq!(ctx.attribute_data(shaders::A_IS_SEARCH_RESULT), Some(&[0.0; 18][..]));
        renderer.draw(&mut ctx, PhysicalSize::new(100, 40), &Mat3::identity());
        assert_eq!(ctx.last_uniform(shaders::U_SEARCH_ACTIVE), Some(UniformValue::Bool(false)));
    }

    #[test]
    fn draw_sets_uniforms_then_draws() {
        let tree = tree();
        let frames = FlattenedFrames::new(&tree);
        let mut ctx = RecordingContext::new();
        let mut renderer = renderer(&mut ctx);
        renderer.set_frames(&mut ctx, &frames, &ColorMap::by_depth(&frames, &Theme::dark()));
        ctx.take_calls();

        let physical = PhysicalSize::new(1000, 200);
        let model = Mat3::between(&Rect::new(0.0, 0.0, 100.0, 10.0), &physical.to_rect());
        renderer.draw(&mut ctx, physical, &model);

        let calls = ctx.calls();
        assert!(matches!(calls.first(), Some(Call::Clear(_))));
        assert!(calls.contains(&Call::SetViewport(physical)));
        assert!(calls.contains(&Call::DrawTriangles(18)));
        assert_eq!(
            ctx.last_uniform(shaders::U_PROJECTION),
            Some(UniformValue::Mat3(Mat3::projection(1000.0, 200.0).to_f32_array()))
        );
        assert_eq!(ctx.last_uniform(shaders::U_DRAW_BORDER), Some(UniformValue::Bool(true)));
        assert_eq!(
            ctx.last_uniform(shaders::U_BORDER_WIDTH),
            Some(UniformValue::Vec2([0.1, 0.05]))
        );
        assert_eq!(ctx.last_uniform(shaders::U_SEARCH_ACTIVE), Some(UniformValue::Bool(false)));
    }

    #[test]
    fn empty_canvas_draws_nothing() {
        let mut ctx = RecordingContext::new();
        let renderer = renderer(&mut ctx);
        ctx.take_calls();
        renderer.draw(&mut ctx, PhysicalSize::new(0, 100), &Mat3::identity());
        assert!(ctx.calls().is_empty());
    }

    #[test]
    fn destroy_releases_everything() {
        let mut ctx = RecordingContext::new();
        let renderer = renderer(&mut ctx);
        renderer.destroy(&mut ctx);
        assert_eq!(ctx.live_objects(), 0);
    }
}
