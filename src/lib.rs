// src/lib.rs
//! Desk Scene
//!
//! An interactive 3D desk (keyboard, mouse and a clickable screen) rendered
//! with wgpu and winit.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod interaction;
pub mod prelude;
pub mod screen;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::DeskSceneApp;
pub use config::SceneConfig;
pub use error::SceneError;

/// Creates the application with the default scene configuration
pub fn default() -> error::Result<DeskSceneApp> {
    DeskSceneApp::new(SceneConfig::default())
}
