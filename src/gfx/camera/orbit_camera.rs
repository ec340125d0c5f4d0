use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::config::ControlsConfig;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Perspective camera orbiting a target on a sphere, y-up.
///
/// `azimuth` is measured around the up axis from +Z towards +X and `polar`
/// from the up axis, so `polar = PI / 2` sits on the horizon.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * self.view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, azimuth: f32, polar: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            azimuth,
            polar,
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: cgmath::Rad(std::f32::consts::PI / 4.0),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Builds a camera looking from `eye` at `target`, clamped into `bounds`
    pub fn from_position(
        eye: Vector3<f32>,
        target: Vector3<f32>,
        bounds: OrbitCameraBounds,
        aspect: f32,
    ) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let azimuth = offset.x.atan2(offset.z);
        let polar = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).acos()
        } else {
            std::f32::consts::FRAC_PI_2
        };

        let mut camera = Self::new(distance, azimuth, polar, target, aspect);
        camera.bounds = bounds;
        camera.clamp_to_bounds();
        camera
    }

    pub fn with_perspective(mut self, fovy: Rad<f32>, znear: f32, zfar: f32) -> Self {
        self.fovy = fovy;
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn set_distance(&mut self, distance: f32) {
        // max/min rather than clamp: inverted bounds must not panic
        self.distance = distance
            .min(self.bounds.max_distance.unwrap_or(f32::MAX))
            .max(self.bounds.min_distance.unwrap_or(f32::EPSILON));
        self.update();
    }

    /// Multiplies the orbit radius by `scale` (< 1 moves closer)
    pub fn zoom(&mut self, scale: f32) {
        self.set_distance(self.distance * scale);
    }

    pub fn set_polar(&mut self, polar: f32) {
        self.polar = polar.min(self.bounds.max_polar).max(self.bounds.min_polar);
        self.update();
    }

    pub fn add_polar(&mut self, delta: f32) {
        self.set_polar(self.polar + delta);
    }

    pub fn set_azimuth(&mut self, azimuth: f32) {
        let mut bounded = azimuth;
        if let Some(min_azimuth) = self.bounds.min_azimuth {
            bounded = bounded.max(min_azimuth);
        }
        if let Some(max_azimuth) = self.bounds.max_azimuth {
            bounded = bounded.min(max_azimuth);
        }
        self.azimuth = bounded;
        self.update();
    }

    pub fn add_azimuth(&mut self, delta: f32) {
        self.set_azimuth(self.azimuth + delta);
    }

    /// Re-applies the bounds after they changed
    pub fn clamp_to_bounds(&mut self) {
        self.set_distance(self.distance);
        self.set_polar(self.polar);
        self.set_azimuth(self.azimuth);
    }

    /// Updates the camera after changing `distance`, `azimuth` or `polar`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.polar, self.azimuth, self.distance, self.target);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    /// Ignores zero-sized windows (minimised)
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_azimuth: Option<f32>,
    pub max_azimuth: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_polar: f32::EPSILON,
            max_polar: std::f32::consts::PI - f32::EPSILON,
            min_azimuth: None,
            max_azimuth: None,
        }
    }
}

impl From<&ControlsConfig> for OrbitCameraBounds {
    fn from(controls: &ControlsConfig) -> Self {
        Self {
            min_distance: Some(controls.min_distance),
            max_distance: Some(controls.max_distance),
            min_polar: controls.min_polar.max(f32::EPSILON),
            max_polar: controls.max_polar.min(std::f32::consts::PI - f32::EPSILON),
            min_azimuth: Some(controls.min_azimuth),
            max_azimuth: Some(controls.max_azimuth),
        }
    }
}

fn calculate_cartesian_eye_position(
    polar: f32,
    azimuth: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * polar.sin() * azimuth.sin(),
        distance * polar.cos(),
        distance * polar.sin() * azimuth.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_from_position_recovers_spherical_pose() {
        let camera = OrbitCamera::from_position(
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::zero(),
            OrbitCameraBounds::default(),
            1.0,
        );

        assert!(approx(camera.distance, 2.0));
        assert!(approx(camera.azimuth, 0.0));
        assert!(approx(camera.polar, PI / 2.0));
        assert!(approx(camera.eye.z, 2.0));
    }

    #[test]
    fn test_from_position_clamps_into_control_bounds() {
        let bounds = OrbitCameraBounds::from(&ControlsConfig::default());
        let camera = OrbitCamera::from_position(
            Vector3::new(0.2, 0.5, 0.0),
            Vector3::zero(),
            bounds,
            1.0,
        );

        assert!(approx(camera.azimuth, PI / 2.0));
        assert!(approx(camera.polar, PI / 2.5));
        assert!(camera.distance >= 0.5 && camera.distance <= 0.7);
        assert!(approx((camera.eye - camera.target).magnitude(), camera.distance));
    }

    #[test]
    fn test_distance_respects_bounds() {
        let mut camera = OrbitCamera::new(0.6, 0.0, 1.4, Vector3::zero(), 1.0);
        camera.bounds = OrbitCameraBounds::from(&ControlsConfig::default());

        camera.zoom(10.0);
        assert!(approx(camera.distance, 0.7));
        camera.zoom(0.01);
        assert!(approx(camera.distance, 0.5));
    }

    #[test]
    fn test_angles_respect_bounds() {
        let mut camera = OrbitCamera::new(0.6, 1.0, 1.4, Vector3::zero(), 1.0);
        camera.bounds = OrbitCameraBounds::from(&ControlsConfig::default());

        camera.add_azimuth(-5.0);
        assert!(approx(camera.azimuth, 0.0));
        camera.add_azimuth(10.0);
        assert!(approx(camera.azimuth, PI));

        camera.add_polar(1.0);
        assert!(approx(camera.polar, PI / 2.0));
        camera.add_polar(-1.0);
        assert!(approx(camera.polar, PI / 2.5));
    }

    #[test]
    fn test_inverted_bounds_settle_on_minimum() {
        let controls = ControlsConfig {
            min_distance: 0.9,
            max_distance: 0.5,
            min_polar: 1.5,
            max_polar: 1.0,
            ..Default::default()
        };
        let camera = OrbitCamera::from_position(
            Vector3::new(0.2, 0.5, 0.0),
            Vector3::zero(),
            OrbitCameraBounds::from(&controls),
            1.0,
        );

        assert!(approx(camera.distance, 0.9));
        assert!(approx(camera.polar, 1.5));
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = OrbitCamera::new(1.0, 0.0, 1.0, Vector3::zero(), 1.0);
        camera.resize_projection(1920, 1080);
        assert!(approx(camera.aspect, 1920.0 / 1080.0));

        camera.resize_projection(800, 0);
        assert!(approx(camera.aspect, 1920.0 / 1080.0));
    }
}
