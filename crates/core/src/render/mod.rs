//! Frame drawing over an abstract [`GraphicsContext`].

pub mod buffers;
pub mod context;
pub mod pipeline;
pub mod recording;
pub mod shaders;

use thiserror::Error;

pub use context::{GraphicsContext, ShaderStage, UniformValue};
pub use pipeline::FlamegraphRenderer;
pub use recording::RecordingContext;

/// Renderer setup failures. All of them are configuration errors of the
/// host's graphics stack and are not worth retrying.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderSetupError {
    #[error("no graphics context available")]
    MissingContext,
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {log}")]
    ProgramLink { log: String },
    #[error("attribute {0} not found in linked program")]
    MissingAttribute(&'static str),
    #[error("uniform {0} not found in linked program")]
    MissingUniform(&'static str),
    #[error("failed to allocate GPU object: {0}")]
    BufferAllocation(String),
}
