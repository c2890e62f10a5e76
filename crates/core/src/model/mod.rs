pub mod flattened;
pub mod frame;

pub use flattened::{FlattenedFrames, FrameIndex};
pub use frame::{Frame, FrameKey, FrameTree, FrameTreeError};
