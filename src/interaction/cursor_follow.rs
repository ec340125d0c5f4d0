use crate::{config::CursorConfig, gfx::scene::object::Object};

/// Maps the window cursor onto the desk plane for the mouse model
///
/// Horizontal cursor travel moves the model along z, vertical travel along x.
#[derive(Debug, Clone, Copy)]
pub struct CursorFollow {
    sensitivity: f32,
    mouse_x: f32,
    mouse_z: f32,
}

impl CursorFollow {
    pub fn new(config: &CursorConfig) -> Self {
        Self {
            sensitivity: config.sensitivity,
            mouse_x: 0.0,
            mouse_z: 0.0,
        }
    }

    /// Records a cursor position in window pixels. Ignored for empty windows.
    pub fn update(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.mouse_z = -(x / width) * 2.0 + 1.0;
        self.mouse_x = (y / height) * 2.0 - 2.0;
    }

    /// The mapped `(x, z)` axes before sensitivity is applied
    pub fn axes(&self) -> (f32, f32) {
        (self.mouse_x, self.mouse_z)
    }

    /// Places the model; y is left untouched
    pub fn apply(&self, mouse: &mut Object) {
        mouse.position.x = self.mouse_x * self.sensitivity;
        mouse.position.z = self.mouse_z * self.sensitivity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_cursor_maps_to_desk_axes() {
        let mut follow = CursorFollow::new(&CursorConfig::default());

        follow.update(0.0, 0.0, 800.0, 600.0);
        assert_eq!(follow.axes(), (-2.0, 1.0));

        follow.update(800.0, 600.0, 800.0, 600.0);
        assert_eq!(follow.axes(), (0.0, -1.0));

        follow.update(400.0, 300.0, 800.0, 600.0);
        assert_eq!(follow.axes(), (-1.0, 0.0));
    }

    #[test]
    fn test_apply_scales_by_sensitivity_and_keeps_height() {
        let mut follow = CursorFollow::new(&CursorConfig::default());
        let mut mouse = Object::new("mouse", Vec::new());
        mouse.set_position(Vector3::new(1.0, -0.2, 0.0));

        follow.update(200.0, 450.0, 800.0, 600.0);
        follow.apply(&mut mouse);

        assert!((mouse.position.x - (-0.05)).abs() < 1e-6);
        assert!((mouse.position.y - (-0.2)).abs() < 1e-6);
        assert!((mouse.position.z - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_zero_sized_window_is_ignored() {
        let mut follow = CursorFollow::new(&CursorConfig::default());
        follow.update(10.0, 10.0, 0.0, 0.0);
        assert_eq!(follow.axes(), (0.0, 0.0));
    }
}
