use std::f32::consts::PI;

use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, MouseScrollDelta},
};

use super::{inertia::RotationInertia, orbit_camera::OrbitCamera};
use crate::config::ControlsConfig;

/// Radians per second for an auto-rotate speed of 1 (one turn per minute)
const AUTO_ROTATE_UNIT: f32 = 2.0 * PI / 60.0;

/// Pixel deltas are converted to the same scale as wheel lines
const PIXELS_PER_LINE: f32 = 100.0;

/// Pointer-driven orbiting with damping, zoom and inertial auto-rotation
pub struct OrbitControls {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    pub inertia: RotationInertia,
    azimuth_delta: f32,
    polar_delta: f32,
    drag_azimuth: f32,
    drag_speed: f32,
    is_pointer_down: bool,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            auto_rotate: config.auto_rotate,
            inertia: RotationInertia::new(
                config.auto_rotate_speed,
                config.inertia_damping,
                config.max_release_speed,
            ),
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            drag_azimuth: 0.0,
            drag_speed: 0.0,
            is_pointer_down: false,
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, camera: &mut OrbitCamera) {
        match event {
            DeviceEvent::MouseMotion { delta } => {
                self.rotate(delta.0 as f32, delta.1 as f32);
            }
            DeviceEvent::MouseWheel { delta } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 / PIXELS_PER_LINE
                    }
                };
                self.zoom(scroll, camera);
            }
            _ => (),
        }
    }

    pub fn pointer_down(&mut self) {
        self.is_pointer_down = true;
        self.drag_speed = 0.0;
        self.drag_azimuth = 0.0;
        self.inertia.begin_interaction();
    }

    pub fn pointer_up(&mut self) {
        if !self.is_pointer_down {
            return;
        }
        self.is_pointer_down = false;
        self.inertia.end_interaction(self.drag_speed);
    }

    pub fn is_pointer_down(&self) -> bool {
        self.is_pointer_down
    }

    /// Drag by a pointer delta in pixels; ignored unless the pointer is down
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if !self.is_pointer_down {
            return;
        }
        let azimuth = -dx * self.rotate_speed;
        self.azimuth_delta += azimuth;
        self.drag_azimuth += azimuth;
        self.polar_delta -= dy * self.rotate_speed;
    }

    /// Positive `scroll` moves the camera closer
    pub fn zoom(&mut self, scroll: f32, camera: &mut OrbitCamera) {
        if scroll == 0.0 {
            return;
        }
        let scale = 0.95f32.powf(self.zoom_speed * scroll.abs());
        if scroll > 0.0 {
            camera.zoom(scale);
        } else {
            camera.zoom(1.0 / scale);
        }
    }

    pub fn update(&mut self, camera: &mut OrbitCamera, delta_time: f32) {
        if self.is_pointer_down {
            if delta_time > 0.0 {
                // Opposite sign: auto-rotation subtracts from the azimuth
                let instantaneous = -self.drag_azimuth / delta_time / AUTO_ROTATE_UNIT;
                self.drag_speed = 0.5 * (self.drag_speed + instantaneous);
            }
        } else if self.auto_rotate {
            let speed = self.inertia.step();
            self.azimuth_delta -= auto_rotation_angle(speed, delta_time);
        }
        self.drag_azimuth = 0.0;

        if self.enable_damping {
            camera.add_azimuth(self.azimuth_delta * self.damping_factor);
            camera.add_polar(self.polar_delta * self.damping_factor);
            self.azimuth_delta *= 1.0 - self.damping_factor;
            self.polar_delta *= 1.0 - self.damping_factor;
        } else {
            camera.add_azimuth(self.azimuth_delta);
            camera.add_polar(self.polar_delta);
            self.azimuth_delta = 0.0;
            self.polar_delta = 0.0;
        }
    }
}

fn auto_rotation_angle(speed: f32, delta_time: f32) -> f32 {
    AUTO_ROTATE_UNIT * speed * delta_time
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::OrbitCameraBounds;
    use cgmath::{Vector3, Zero};

    fn free_camera() -> OrbitCamera {
        let mut camera = OrbitCamera::new(1.0, 0.0, PI / 2.0, Vector3::zero(), 1.0);
        camera.bounds = OrbitCameraBounds::default();
        camera
    }

    fn still_config() -> ControlsConfig {
        ControlsConfig {
            auto_rotate: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_damping_applies_fraction_of_pending_delta() {
        let mut controls = OrbitControls::new(&still_config());
        let mut camera = free_camera();

        controls.pointer_down();
        controls.rotate(-100.0, 0.0);
        controls.update(&mut camera, 1.0 / 60.0);

        // 100 px * 0.005 rad/px = 0.5 rad pending, 2% applied
        assert!((camera.azimuth - 0.01).abs() < 1e-5);

        controls.update(&mut camera, 1.0 / 60.0);
        assert!((camera.azimuth - (0.01 + 0.0098)).abs() < 1e-5);
    }

    #[test]
    fn test_without_damping_delta_applies_at_once() {
        let config = ControlsConfig {
            enable_damping: false,
            ..still_config()
        };
        let mut controls = OrbitControls::new(&config);
        let mut camera = free_camera();

        controls.pointer_down();
        controls.rotate(0.0, 40.0);
        controls.update(&mut camera, 1.0 / 60.0);
        assert!((camera.polar - (PI / 2.0 - 0.2)).abs() < 1e-5);

        controls.update(&mut camera, 1.0 / 60.0);
        assert!((camera.polar - (PI / 2.0 - 0.2)).abs() < 1e-5);
    }

    #[test]
    fn test_motion_without_pointer_is_ignored() {
        let mut controls = OrbitControls::new(&still_config());
        let mut camera = free_camera();

        controls.rotate(500.0, 500.0);
        controls.update(&mut camera, 1.0 / 60.0);
        assert_eq!(camera.azimuth, 0.0);
        assert_eq!(camera.polar, PI / 2.0);
    }

    #[test]
    fn test_auto_rotation_turns_camera_until_velocity_dies() {
        let config = ControlsConfig {
            enable_damping: false,
            auto_rotate_speed: 1.0,
            ..Default::default()
        };
        let mut controls = OrbitControls::new(&config);
        let mut camera = free_camera();

        controls.update(&mut camera, 1.0);
        let expected = -AUTO_ROTATE_UNIT * 0.95;
        assert!((camera.azimuth - expected).abs() < 1e-5);

        for _ in 0..1000 {
            controls.update(&mut camera, 1.0 / 60.0);
        }
        let rest = camera.azimuth;
        controls.update(&mut camera, 1.0 / 60.0);
        assert_eq!(camera.azimuth, rest);
        assert_eq!(controls.inertia.velocity(), 0.0);
    }

    #[test]
    fn test_release_after_drag_seeds_inertia() {
        let mut controls = OrbitControls::new(&still_config());
        let mut camera = free_camera();

        controls.pointer_down();
        assert_eq!(controls.inertia.velocity(), 0.0);

        controls.rotate(20.0, 0.0);
        controls.update(&mut camera, 1.0 / 60.0);
        controls.pointer_up();

        assert!(!controls.is_pointer_down());
        assert!(controls.inertia.velocity() > 0.0);
        // Dragging right lowers the azimuth, as does positive auto-rotation
        assert!(controls.inertia.auto_rotate_speed() > 0.0);
    }

    #[test]
    fn test_wheel_zooms_within_bounds() {
        let mut controls = OrbitControls::new(&still_config());
        let mut camera = free_camera();

        controls.zoom(1.0, &mut camera);
        assert!((camera.distance - 0.95).abs() < 1e-5);
        controls.zoom(-1.0, &mut camera);
        assert!((camera.distance - 1.0).abs() < 1e-5);
    }
}
