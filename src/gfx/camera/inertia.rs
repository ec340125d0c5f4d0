/// Auto-rotation speed carried over after the user lets go of the camera.
///
/// The velocity is a non-negative speed in auto-rotate units (one unit turns
/// the camera once per minute); the sign of the last release is kept apart in
/// `direction`. While the user is not interacting the velocity is multiplied
/// by `damping` every frame.
#[derive(Debug, Clone, Copy)]
pub struct RotationInertia {
    velocity: f32,
    direction: f32,
    damping: f32,
    max_velocity: f32,
    interacting: bool,
}

/// Below this the camera is considered at rest
const REST_VELOCITY: f32 = 1e-4;

impl RotationInertia {
    pub fn new(initial_velocity: f32, damping: f32, max_velocity: f32) -> Self {
        let max_velocity = max_velocity.abs();
        Self {
            velocity: initial_velocity.abs().min(max_velocity),
            direction: if initial_velocity < 0.0 { -1.0 } else { 1.0 },
            damping: damping.clamp(0.0, 1.0),
            max_velocity,
            interacting: false,
        }
    }

    /// Pointer pressed: the user takes over and any spin stops
    pub fn begin_interaction(&mut self) {
        self.interacting = true;
        self.velocity = 0.0;
    }

    /// Pointer released with the given signed drag speed
    pub fn end_interaction(&mut self, release_speed: f32) {
        self.interacting = false;
        self.velocity = release_speed.abs().min(self.max_velocity);
        if release_speed != 0.0 {
            self.direction = release_speed.signum();
        }
    }

    /// Decays the velocity by one frame and returns the signed auto-rotate speed
    pub fn step(&mut self) -> f32 {
        if !self.interacting {
            self.velocity *= self.damping;
            if self.velocity < REST_VELOCITY {
                self.velocity = 0.0;
            }
        }
        self.auto_rotate_speed()
    }

    pub fn auto_rotate_speed(&self) -> f32 {
        self.velocity * self.direction
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_decays_monotonically_to_zero() {
        let mut inertia = RotationInertia::new(0.5, 0.95, 30.0);
        let mut previous = inertia.velocity();

        for _ in 0..1000 {
            inertia.step();
            let current = inertia.velocity();
            assert!(current >= 0.0);
            assert!(current <= previous);
            previous = current;
        }

        assert_eq!(inertia.velocity(), 0.0);
    }

    #[test]
    fn test_single_step_applies_damping_factor() {
        let mut inertia = RotationInertia::new(2.0, 0.95, 30.0);
        let speed = inertia.step();
        assert!((speed - 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_interaction_resets_and_freezes_velocity() {
        let mut inertia = RotationInertia::new(5.0, 0.95, 30.0);
        inertia.begin_interaction();
        assert!(inertia.is_interacting());
        assert_eq!(inertia.velocity(), 0.0);

        inertia.step();
        assert_eq!(inertia.velocity(), 0.0);
    }

    #[test]
    fn test_release_seeds_non_negative_velocity_with_direction() {
        let mut inertia = RotationInertia::new(0.0, 0.95, 30.0);
        inertia.begin_interaction();
        inertia.end_interaction(-4.0);

        assert!(!inertia.is_interacting());
        assert_eq!(inertia.velocity(), 4.0);
        assert_eq!(inertia.auto_rotate_speed(), -4.0);

        inertia.end_interaction(100.0);
        assert_eq!(inertia.velocity(), 30.0);
        assert_eq!(inertia.auto_rotate_speed(), 30.0);
    }
}
