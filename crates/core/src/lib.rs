pub mod colors;
pub mod model;
pub mod render;
pub mod resize;
pub mod search;
pub mod text;
pub mod theme;
pub mod viewport;

pub use colors::ColorMap;
pub use hit_test::{hit_test, hit_test_index};
pub use model::{FlattenedFrames, Frame, FrameIndex, FrameKey, FrameTree, FrameTreeError};
pub use render::{FlamegraphRenderer, GraphicsContext, RenderSetupError};
pub use resize::{CanvasId, PhysicalSize, ResizeBroadcaster, ResizeEvent, ResizeState, ResizeSubscription};
pub use search::{SearchError, SearchMatch, SearchMode, SearchQuery, SearchResults, search_frames};
pub use text::{TrimRegion, TrimmedText, trim_text_center};
pub use theme::{RenderOptions, Theme};
pub use viewport::{FlamegraphView, Range, ViewBounds, ViewError, ZoomStrategy};
