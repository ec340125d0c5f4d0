//! # Graphics Module
//!
//! Everything that touches the GPU or the 3D scene:
//!
//! - **Camera System** ([`camera`]) - Orbit camera with damping, inertia and auto-rotation
//! - **Rendering Pipeline** ([`rendering`]) - Surface setup and the lit scene pass
//! - **Scene Management** ([`scene`]) - Loaded models, interaction state and click handling
//! - **Resource Management** ([`resources`]) - Materials, textures and global uniforms
//! - **Picking** ([`picking`]) - Screen-space rays and mesh intersection
//! - **Debug Overlay** ([`ui`]) - imgui window with camera and scene state
//!
//! GPU resources are created lazily, so the scene and camera can be driven
//! without a device (which is how the tests run).

pub mod camera;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod ui;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
