pub mod camera_utils;
pub mod inertia;
pub mod orbit_camera;
pub mod orbit_controls;

// Re-export main types
pub use camera_utils::{CameraManager, CameraUniform};
pub use inertia::RotationInertia;
pub use orbit_camera::{OrbitCamera, OrbitCameraBounds};
pub use orbit_controls::OrbitControls;
