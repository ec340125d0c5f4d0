//! # Desk Scene Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use desk_scene::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut config = SceneConfig::default();
//!     config.controls.auto_rotate = false;
//!     DeskSceneApp::new(config)?.run()
//! }
//! ```

// Re-export core application types
pub use crate::app::DeskSceneApp;
pub use crate::default;
pub use crate::error::SceneError;

// Configuration
pub use crate::config::{
    ButtonSpec, CameraConfig, ControlsConfig, LightRig, ModelSlot, ModelSpec, PointLight,
    SceneConfig, ScreenConfig,
};

// Scene and camera
pub use crate::gfx::camera::{CameraManager, OrbitCamera};
pub use crate::gfx::scene::{Object, Scene, SceneStatistics, ScreenClick};
pub use crate::screen::{Canvas, ScreenDisplay};

pub use cgmath::Vector3;
