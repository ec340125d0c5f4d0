use cgmath::{Matrix4, SquareMatrix};
use winit::event::DeviceEvent;

use super::{orbit_camera::OrbitCamera, orbit_controls::OrbitControls};

/// Camera plus the controls that drive it
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controls: OrbitControls,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controls: OrbitControls) -> Self {
        Self { camera, controls }
    }

    /// Forwards raw mouse motion and wheel input to the controls
    pub fn process_event(&mut self, event: &DeviceEvent) {
        self.controls.process_events(event, &mut self.camera);
    }

    /// Advances damping, inertia and auto-rotation by one frame
    pub fn update(&mut self, delta_time: f32) {
        self.controls.update(&mut self.camera, delta_time);
        self.camera.update_view_proj();
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}
