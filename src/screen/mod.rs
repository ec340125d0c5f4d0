//! The clickable screen
//!
//! A small 2D canvas drawn on the CPU and uploaded as the texture of the
//! screen mesh. Clicks arrive as texture coordinates from the picker and are
//! hit-tested against the button rectangles.

pub mod canvas;
pub mod display;
pub mod font;

pub use canvas::{Canvas, Rect};
pub use display::{ScreenButton, ScreenDisplay};
