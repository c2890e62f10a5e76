pub mod frame_name;
pub mod theme;
pub mod transform;
pub mod types;

pub use frame_name::FrameName;
pub use theme::{ThemeMode, ThemeToken};
pub use transform::Mat3;
pub use types::{Color, Point, Rect};
