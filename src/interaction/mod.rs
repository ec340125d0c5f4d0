//! Input-driven animation of scene objects
//!
//! - [`key_press`]: keyboard keys dip while the matching physical key is hit
//! - [`cursor_follow`]: the mouse model tracks the window cursor

pub mod cursor_follow;
pub mod key_press;

pub use cursor_follow::CursorFollow;
pub use key_press::{key_name, KeyAnimator};
