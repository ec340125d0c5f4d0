use std::{collections::HashMap, time::Instant};

use cgmath::{Deg, Rad, Vector3};
use wgpu::Device;

use crate::{
    config::{LightRig, ModelSlot, SceneConfig},
    error::Result,
    gfx::{
        camera::{CameraManager, OrbitCamera, OrbitCameraBounds, OrbitControls},
        picking::ObjectPicker,
        resources::{
            global_bindings::MAX_POINT_LIGHTS,
            material::{Material, MaterialManager},
        },
    },
    interaction::{CursorFollow, KeyAnimator},
    screen::ScreenDisplay,
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::{loader::LoadedModel, object::Object};

/// Material painted with the screen canvas
pub const SCREEN_MATERIAL: &str = "screen_canvas";

/// Draw order of the model slots
const SLOTS: [ModelSlot; 3] = [ModelSlot::Keyboard, ModelSlot::Mouse, ModelSlot::Screen];

/// A click that landed on the screen mesh
#[derive(Debug, Clone)]
pub struct ScreenClick {
    /// Texture coordinate under the cursor
    pub uv: [f32; 2],
    /// World space hit point
    pub point: Vector3<f32>,
    /// Label of the button that was hit, if any
    pub button: Option<String>,
}

/// Main scene: the three desk models, their materials, the camera and the
/// input-driven animation state
pub struct Scene {
    pub camera_manager: CameraManager,
    pub lights: LightRig,
    objects: HashMap<ModelSlot, Object>,
    material_manager: MaterialManager,
    model_positions: HashMap<ModelSlot, [f32; 3]>,
    key_animator: KeyAnimator,
    cursor_follow: CursorFollow,
    screen: ScreenDisplay,
    screen_mesh: String,
    picker: ObjectPicker,
    click_slop: f32,
    viewport: (u32, u32),
    press_position: Option<(f32, f32)>,
    last_click: Option<ScreenClick>,
}

impl Scene {
    /// Builds an empty scene (no models yet) for a viewport of the given size
    pub fn new(config: &SceneConfig, width: u32, height: u32) -> Self {
        let camera_config = &config.camera;
        let aspect = if height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        let camera = OrbitCamera::from_position(
            Vector3::from(camera_config.position),
            Vector3::from(camera_config.target),
            OrbitCameraBounds::from(&config.controls),
            aspect,
        )
        .with_perspective(
            Rad::from(Deg(camera_config.fov_y_degrees)),
            camera_config.near,
            camera_config.far,
        );
        let mut camera_manager =
            CameraManager::new(camera, OrbitControls::new(&config.controls));
        camera_manager.camera.update_view_proj();

        if config.lights.point_lights.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "{} point lights configured, only the first {} are used",
                config.lights.point_lights.len(),
                MAX_POINT_LIGHTS
            );
        }

        let mut screen = ScreenDisplay::new(&config.screen);
        let mut canvas_material = Material::new(SCREEN_MATERIAL, [1.0, 1.0, 1.0, 1.0], 0.0, 0.6);
        screen.take_dirty();
        canvas_material.set_texture_rgba(
            screen.canvas().width(),
            screen.canvas().height(),
            screen.canvas().as_raw().to_vec(),
        );

        let mut material_manager = MaterialManager::new();
        material_manager.add_material(canvas_material);

        Self {
            camera_manager,
            lights: config.lights.clone(),
            objects: HashMap::new(),
            material_manager,
            model_positions: config
                .models
                .iter()
                .map(|spec| (spec.slot, spec.position))
                .collect(),
            key_animator: KeyAnimator::new(&config.keys),
            cursor_follow: CursorFollow::new(&config.cursor),
            screen,
            screen_mesh: config.screen.mesh_name.clone(),
            picker: ObjectPicker::new(),
            click_slop: config.controls.click_slop,
            viewport: (width, height),
            press_position: None,
            last_click: None,
        }
    }

    /// Installs a model delivered by the loader; failures are logged and skipped
    pub fn on_model_loaded(&mut self, slot: ModelSlot, result: Result<LoadedModel>) {
        match result {
            Ok(model) => self.install_model(slot, model),
            Err(err) => log::warn!("Skipping {} model: {}", slot.name(), err),
        }
    }

    /// Places a loaded model into its slot, replacing any previous one
    pub fn install_model(&mut self, slot: ModelSlot, model: LoadedModel) {
        let mut object = Object::new(model.name, model.meshes);
        if let Some(position) = self.model_positions.get(&slot) {
            object.set_position(Vector3::from(*position));
        }

        for material in model.materials {
            self.material_manager.add_material(material);
        }

        match slot {
            ModelSlot::Keyboard => {
                for name in object.mesh_names() {
                    log::debug!("Keyboard mesh: {:?}", name);
                }
            }
            ModelSlot::Screen => match object.find_mesh_mut(&self.screen_mesh) {
                Some(mesh) => mesh.material_id = Some(SCREEN_MATERIAL.to_string()),
                None => log::warn!(
                    "Screen model has no mesh named '{}' (found: {})",
                    self.screen_mesh,
                    object.mesh_names().collect::<Vec<_>>().join(", ")
                ),
            },
            ModelSlot::Mouse => {}
        }

        log::info!(
            "Loaded {} model '{}' ({} meshes)",
            slot.name(),
            object.name,
            object.meshes.len()
        );
        if self.objects.insert(slot, object).is_some() {
            log::debug!("Replaced previously loaded {} model", slot.name());
        }
    }

    /// Updates the camera aspect and the viewport used for picking
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.camera_manager.camera.resize_projection(width, height);
    }

    /// Animates the keyboard key named `name`. Ignored until the keyboard has
    /// loaded or when it has no such key.
    pub fn press_key(&mut self, name: &str, now: Instant) -> bool {
        log::debug!("Key pressed: {:?}", name);
        match self.objects.get_mut(&ModelSlot::Keyboard) {
            Some(keyboard) => self.key_animator.press(keyboard, name, now),
            None => false,
        }
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let (width, height) = self.viewport;
        self.cursor_follow
            .update(x, y, width as f32, height as f32);
    }

    /// Primary button pressed: the user takes over the camera
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.press_position = Some((x, y));
        self.camera_manager.controls.pointer_down();
    }

    /// Primary button released. A release close to where the press happened
    /// counts as a click and is cast against the screen.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> Option<ScreenClick> {
        self.camera_manager.controls.pointer_up();
        let (press_x, press_y) = self.press_position.take()?;
        let travel = ((x - press_x).powi(2) + (y - press_y).powi(2)).sqrt();
        if travel > self.click_slop {
            return None;
        }
        self.handle_click(x, y)
    }

    /// Casts a ray through window pixel (`x`, `y`) against the screen mesh
    pub fn handle_click(&mut self, x: f32, y: f32) -> Option<ScreenClick> {
        let screen = self.objects.get(&ModelSlot::Screen)?;
        let (width, height) = self.viewport;
        let ray = self.picker.screen_to_ray(
            (x, y),
            (width as f32, height as f32),
            &self.camera_manager.camera,
        );
        let hit = self.picker.pick_mesh(&ray, screen, &self.screen_mesh)?;

        let button = self
            .screen
            .click_uv(hit.uv)
            .and_then(|index| self.screen.buttons().get(index))
            .map(|button| button.label.clone());

        log::info!(
            "Screen hit at uv ({:.3}, {:.3}){}",
            hit.uv[0],
            hit.uv[1],
            button
                .as_deref()
                .map(|label| format!(", button '{}'", label))
                .unwrap_or_default()
        );

        let click = ScreenClick {
            uv: hit.uv,
            point: hit.point,
            button,
        };
        self.last_click = Some(click.clone());
        Some(click)
    }

    /// Advances the scene by one frame
    pub fn update(&mut self, delta_time: f32, now: Instant) {
        if let Some(keyboard) = self.objects.get_mut(&ModelSlot::Keyboard) {
            self.key_animator.update(keyboard, now);
        }

        self.camera_manager.update(delta_time);

        if let Some(mouse) = self.objects.get_mut(&ModelSlot::Mouse) {
            self.cursor_follow.apply(mouse);
        }

        if self.screen.take_dirty() {
            if let Some(material) = self.material_manager.get_material_mut(SCREEN_MATERIAL) {
                let canvas = self.screen.canvas();
                material.set_texture_rgba(canvas.width(), canvas.height(), canvas.as_raw().to_vec());
            }
        }
    }

    /// Creates GPU resources for new meshes and materials and uploads this
    /// frame's transforms and textures
    pub fn sync_gpu(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        transform_layout: &wgpu::BindGroupLayout,
        material_layout: &BindGroupLayoutWithDesc,
    ) {
        for object in self.objects.values_mut() {
            object.init_gpu_resources(device, transform_layout);
            object.update_transforms(queue);
        }
        self.material_manager
            .update_all_gpu_resources(device, queue, material_layout);
    }

    /// Loaded objects in draw order
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        SLOTS.iter().filter_map(|slot| self.objects.get(slot))
    }

    pub fn object(&self, slot: ModelSlot) -> Option<&Object> {
        self.objects.get(&slot)
    }

    pub fn is_loaded(&self, slot: ModelSlot) -> bool {
        self.objects.contains_key(&slot)
    }

    pub fn materials(&self) -> &MaterialManager {
        &self.material_manager
    }

    pub fn screen(&self) -> &ScreenDisplay {
        &self.screen
    }

    pub fn last_click(&self) -> Option<&ScreenClick> {
        self.last_click.as_ref()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let camera = &self.camera_manager.camera;
        let inertia = &self.camera_manager.controls.inertia;
        SceneStatistics {
            loaded: self.objects().map(|object| object.name.clone()).collect(),
            total_triangles: self
                .objects()
                .flat_map(|object| object.meshes.iter())
                .map(|mesh| mesh.index_count() / 3)
                .sum(),
            distance: camera.distance,
            azimuth: camera.azimuth,
            polar: camera.polar,
            rotation_velocity: inertia.velocity(),
            pending_keys: self.key_animator.pending(),
        }
    }
}

/// Scene statistics for the debug overlay
#[derive(Debug)]
pub struct SceneStatistics {
    pub loaded: Vec<String>,
    pub total_triangles: u32,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub rotation_velocity: f32,
    pub pending_keys: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{ControlsConfig, ModelSpec},
        error::SceneError,
    };
    use std::{f32::consts::PI, path::PathBuf, time::Duration};

    const SCREEN_OBJ: &str = "\
o Screen
v -0.5 -0.5 0
v 0.5 -0.5 0
v 0.5 0.5 0
v -0.5 0.5 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
o Bezel
v -0.6 -0.6 -0.01
v 0.6 -0.6 -0.01
v 0.6 0.6 -0.01
f 5 6 7
";

    const KEYBOARD_OBJ: &str = "\
o a
v 0 0 0
v 0.01 0 0
v 0 0 0.01
f 1 2 3
";

    /// Camera at (0, 0, 2) looking at a screen quad centred on the origin
    fn facing_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.camera.position = [0.0, 0.0, 2.0];
        config.controls = ControlsConfig {
            min_distance: 0.1,
            max_distance: 10.0,
            min_azimuth: -PI,
            max_azimuth: PI,
            min_polar: 0.1,
            max_polar: PI - 0.1,
            auto_rotate: false,
            ..Default::default()
        };
        config.models = vec![
            ModelSpec::new(ModelSlot::Keyboard, "keyboard.obj", [0.0, -0.2, 0.0]),
            ModelSpec::new(ModelSlot::Screen, "screen.obj", [0.0, 0.0, 0.0]),
        ];
        config
    }

    fn scene_with_screen() -> Scene {
        let mut scene = Scene::new(&facing_config(), 800, 600);
        let model = LoadedModel::from_obj_str("screen", SCREEN_OBJ).unwrap();
        scene.install_model(ModelSlot::Screen, model);
        scene
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let mut scene = Scene::new(&SceneConfig::default(), 1200, 800);
        assert!((scene.camera_manager.camera.aspect - 1.5).abs() < 1e-6);

        scene.resize(1920, 1080);
        assert!((scene.camera_manager.camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(scene.viewport(), (1920, 1080));

        scene.resize(0, 0);
        assert_eq!(scene.viewport(), (1920, 1080));
    }

    #[test]
    fn test_screen_mesh_receives_canvas_material() {
        let scene = scene_with_screen();
        let screen = scene.object(ModelSlot::Screen).unwrap();

        assert_eq!(
            screen.find_mesh("Screen").unwrap().material_id.as_deref(),
            Some(SCREEN_MATERIAL)
        );
        assert_eq!(screen.find_mesh("Bezel").unwrap().material_id, None);

        let canvas = scene.materials().get_material(SCREEN_MATERIAL).unwrap();
        assert!(canvas.has_texture());
    }

    #[test]
    fn test_model_is_placed_at_configured_position() {
        let mut scene = Scene::new(&facing_config(), 800, 600);
        let keyboard = LoadedModel::from_obj_str("keyboard", KEYBOARD_OBJ).unwrap();
        scene.install_model(ModelSlot::Keyboard, keyboard);

        let keyboard = scene.object(ModelSlot::Keyboard).unwrap();
        assert_eq!(keyboard.position, Vector3::new(0.0, -0.2, 0.0));
    }

    #[test]
    fn test_click_on_screen_is_handled() {
        let mut scene = scene_with_screen();

        let click = scene.handle_click(400.0, 300.0).unwrap();
        assert!((click.uv[0] - 0.5).abs() < 1e-3);
        assert!((click.uv[1] - 0.5).abs() < 1e-3);
        assert_eq!(click.button, None);
        assert!(scene.last_click().is_some());
    }

    #[test]
    fn test_click_on_button_activates_page() {
        let mut scene = scene_with_screen();

        // Projects on screen of the centre of the "About" button
        // (canvas pixel 91, 86) with a 75 degree lens at distance 2
        let click = scene.handle_click(337.0, 255.0).unwrap();
        assert_eq!(click.button.as_deref(), Some("About"));
        assert_eq!(
            scene.screen().active().map(|button| button.label.as_str()),
            Some("About")
        );

        // The redrawn canvas is queued for upload on the next update
        scene.update(0.0, Instant::now());
        assert!(scene
            .materials()
            .get_material(SCREEN_MATERIAL)
            .unwrap()
            .needs_upload());
    }

    #[test]
    fn test_click_off_screen_is_not_handled() {
        let mut scene = scene_with_screen();
        assert!(scene.handle_click(0.0, 0.0).is_none());
        assert!(scene.last_click().is_none());

        let mut empty = Scene::new(&facing_config(), 800, 600);
        assert!(empty.handle_click(400.0, 300.0).is_none());
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut scene = scene_with_screen();

        scene.pointer_down(400.0, 300.0);
        assert!(scene.pointer_up(420.0, 300.0).is_none());

        scene.pointer_down(400.0, 300.0);
        assert!(scene.pointer_up(402.0, 301.0).is_some());
    }

    #[test]
    fn test_keys_are_ignored_until_keyboard_loads() {
        let mut scene = Scene::new(&facing_config(), 800, 600);
        let now = Instant::now();
        assert!(!scene.press_key("a", now));

        let keyboard = LoadedModel::from_obj_str("keyboard", KEYBOARD_OBJ).unwrap();
        scene.install_model(ModelSlot::Keyboard, keyboard);
        assert!(scene.press_key("a", now));

        let offset = |scene: &Scene| {
            scene
                .object(ModelSlot::Keyboard)
                .and_then(|keyboard| keyboard.find_mesh("a"))
                .map(|mesh| mesh.offset.y)
                .unwrap()
        };
        assert!((offset(&scene) + 0.002).abs() < 1e-7);

        scene.update(1.0 / 60.0, now + Duration::from_millis(200));
        assert!(offset(&scene).abs() < 1e-7);
    }

    #[test]
    fn test_failed_load_leaves_slot_empty() {
        let mut scene = Scene::new(&facing_config(), 800, 600);
        scene.on_model_loaded(
            ModelSlot::Mouse,
            Err(SceneError::ModelLoad {
                path: PathBuf::from("mouse.obj"),
                source: tobj::LoadError::OpenFileFailed,
            }),
        );
        assert!(!scene.is_loaded(ModelSlot::Mouse));
        assert_eq!(scene.objects().count(), 0);
    }

    #[test]
    fn test_rotation_velocity_decays_after_release() {
        let mut scene = Scene::new(&SceneConfig::default(), 800, 600);
        scene.pointer_down(100.0, 100.0);
        scene.camera_manager.controls.rotate(30.0, 0.0);
        scene.update(1.0 / 60.0, Instant::now());
        scene.pointer_up(130.0, 100.0);

        let mut previous = scene.get_statistics().rotation_velocity;
        assert!(previous > 0.0);
        for _ in 0..600 {
            scene.update(1.0 / 60.0, Instant::now());
            let velocity = scene.get_statistics().rotation_velocity;
            assert!(velocity <= previous);
            previous = velocity;
        }
        assert_eq!(previous, 0.0);
    }
}
