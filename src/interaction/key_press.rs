use std::time::{Duration, Instant};

use winit::keyboard::{Key, NamedKey};

use crate::{config::KeyPressConfig, gfx::scene::object::Object};

/// Name of a logical key as the keyboard model's meshes are named.
///
/// Follows the DOM `KeyboardEvent.key` values: characters as typed ("a", "A",
/// "1"), named keys by name ("Enter", "ArrowUp") and the space bar as `" "`.
pub fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_string()),
        Key::Named(NamedKey::Space) => Some(" ".to_string()),
        Key::Named(NamedKey::Super) => Some("Meta".to_string()),
        Key::Named(named) => Some(format!("{:?}", named)),
        Key::Unidentified(_) | Key::Dead(_) => None,
    }
}

#[derive(Debug)]
struct PendingRelease {
    mesh: String,
    due: Instant,
}

/// Presses keyboard meshes down and lets them back up after a delay
#[derive(Debug)]
pub struct KeyAnimator {
    depth: f32,
    duration: Duration,
    pending: Vec<PendingRelease>,
}

impl KeyAnimator {
    pub fn new(config: &KeyPressConfig) -> Self {
        Self {
            depth: config.press_depth,
            duration: Duration::from_millis(config.press_duration_ms),
            pending: Vec::new(),
        }
    }

    /// Lowers the mesh called `name` and schedules its release.
    ///
    /// Returns false when the keyboard has no such mesh. Repeated presses
    /// stack; each one is undone by its own release.
    pub fn press(&mut self, keyboard: &mut Object, name: &str, now: Instant) -> bool {
        let Some(mesh) = keyboard.find_mesh_mut(name) else {
            return false;
        };
        mesh.offset.y -= self.depth;
        self.pending.push(PendingRelease {
            mesh: name.to_string(),
            due: now + self.duration,
        });
        true
    }

    /// Raises every key whose release is due; returns how many were released
    pub fn update(&mut self, keyboard: &mut Object, now: Instant) -> usize {
        let depth = self.depth;
        let before = self.pending.len();
        self.pending.retain(|release| {
            if release.due > now {
                return true;
            }
            if let Some(mesh) = keyboard.find_mesh_mut(&release.mesh) {
                mesh.offset.y += depth;
            }
            false
        });
        before - self.pending.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::object::Mesh;
    use winit::keyboard::SmolStr;

    fn keyboard() -> Object {
        let key = |name: &str| {
            Mesh::new(
                name,
                &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
                &[],
                &[],
                vec![0, 1, 2],
            )
        };
        Object::new("keyboard", vec![key("a"), key("Enter"), key(" ")])
    }

    #[test]
    fn test_key_names_follow_dom_convention() {
        assert_eq!(key_name(&Key::Character(SmolStr::new("a"))).as_deref(), Some("a"));
        assert_eq!(key_name(&Key::Named(NamedKey::Space)).as_deref(), Some(" "));
        assert_eq!(key_name(&Key::Named(NamedKey::Enter)).as_deref(), Some("Enter"));
        assert_eq!(key_name(&Key::Named(NamedKey::ArrowUp)).as_deref(), Some("ArrowUp"));
        assert_eq!(key_name(&Key::Named(NamedKey::Super)).as_deref(), Some("Meta"));
        assert_eq!(key_name(&Key::Dead(None)), None);
    }

    #[test]
    fn test_press_lowers_key_until_release_is_due() {
        let mut animator = KeyAnimator::new(&KeyPressConfig::default());
        let mut keyboard = keyboard();
        let start = Instant::now();

        assert!(animator.press(&mut keyboard, "a", start));
        assert!((keyboard.find_mesh("a").unwrap().offset.y + 0.002).abs() < 1e-7);

        assert_eq!(animator.update(&mut keyboard, start + Duration::from_millis(100)), 0);
        assert!((keyboard.find_mesh("a").unwrap().offset.y + 0.002).abs() < 1e-7);

        assert_eq!(animator.update(&mut keyboard, start + Duration::from_millis(150)), 1);
        assert!(keyboard.find_mesh("a").unwrap().offset.y.abs() < 1e-7);
        assert_eq!(animator.pending(), 0);
    }

    #[test]
    fn test_repeated_presses_return_to_rest() {
        let mut animator = KeyAnimator::new(&KeyPressConfig::default());
        let mut keyboard = keyboard();
        let start = Instant::now();

        animator.press(&mut keyboard, " ", start);
        animator.press(&mut keyboard, " ", start + Duration::from_millis(30));
        assert!((keyboard.find_mesh(" ").unwrap().offset.y + 0.004).abs() < 1e-7);

        animator.update(&mut keyboard, start + Duration::from_millis(160));
        assert!((keyboard.find_mesh(" ").unwrap().offset.y + 0.002).abs() < 1e-7);
        animator.update(&mut keyboard, start + Duration::from_millis(200));
        assert!(keyboard.find_mesh(" ").unwrap().offset.y.abs() < 1e-7);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut animator = KeyAnimator::new(&KeyPressConfig::default());
        let mut keyboard = keyboard();

        assert!(!animator.press(&mut keyboard, "F13", Instant::now()));
        assert_eq!(animator.pending(), 0);
        assert!(keyboard.meshes.iter().all(|mesh| mesh.offset.y == 0.0));
    }
}
