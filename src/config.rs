//! # Scene Configuration
//!
//! Every tunable of the desk scene lives here. The defaults reproduce the
//! original portfolio scene; a JSON file may override any subset of them:
//!
//! ```json
//! { "asset_dir": "public", "controls": { "auto_rotate_speed": 1.0 } }
//! ```

use std::{
    f32::consts::PI,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Result, SceneError};

/// Root configuration consumed by [`crate::app::DeskSceneApp`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lights: LightRig,
    pub models: Vec<ModelSpec>,
    pub asset_dir: PathBuf,
    pub keys: KeyPressConfig,
    pub cursor: CursorConfig,
    pub screen: ScreenConfig,
    /// Clear colour behind the models (linear RGB)
    pub background: [f64; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lights: LightRig::default(),
            models: vec![
                ModelSpec::new(ModelSlot::Keyboard, "models/keyboard.obj", [0.0, -0.2, 0.0]),
                ModelSpec::new(ModelSlot::Mouse, "models/mouse.obj", [1.0, -0.2, 0.0]),
                ModelSpec::new(ModelSlot::Screen, "models/screen.obj", [0.0, -0.2, 0.0]),
            ],
            asset_dir: PathBuf::from("assets"),
            keys: KeyPressConfig::default(),
            cursor: CursorConfig::default(),
            screen: ScreenConfig::default(),
            background: [0.0, 0.0, 0.0],
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the camera cannot work with
    pub fn validate(&self) -> Result<()> {
        self.controls.validate()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SceneError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Resolves a model path against the asset directory
    pub fn model_path(&self, spec: &ModelSpec) -> PathBuf {
        self.asset_dir.join(&spec.path)
    }

    pub fn model_spec(&self, slot: ModelSlot) -> Option<&ModelSpec> {
        self.models.iter().find(|spec| spec.slot == slot)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Desk Scene".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.2, 0.5, 0.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Orbit control tuning. Angles are in radians.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    /// Per-frame multiplier applied to the rotation velocity after release
    pub inertia_damping: f32,
    /// Upper bound for the velocity seeded by a release
    pub max_release_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_azimuth: f32,
    pub max_azimuth: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// Pointer travel in pixels under which a press/release pair is a click
    pub click_slop: f32,
}

impl ControlsConfig {
    /// Every bound pair must be finite with min <= max, and the distance positive
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("distance", self.min_distance, self.max_distance),
            ("azimuth", self.min_azimuth, self.max_azimuth),
            ("polar", self.min_polar, self.max_polar),
        ];
        for (name, min, max) in pairs {
            if !min.is_finite() || !max.is_finite() {
                return Err(SceneError::InvalidConfig(format!(
                    "controls: {} bounds must be finite",
                    name
                )));
            }
            if min > max {
                return Err(SceneError::InvalidConfig(format!(
                    "controls: min_{} ({}) is greater than max_{} ({})",
                    name, min, name, max
                )));
            }
        }
        if self.min_distance <= 0.0 {
            return Err(SceneError::InvalidConfig(
                "controls: min_distance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.02,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            inertia_damping: 0.95,
            max_release_speed: 30.0,
            min_distance: 0.5,
            max_distance: 0.7,
            min_azimuth: 0.0,
            max_azimuth: PI,
            min_polar: PI / 2.5,
            max_polar: PI / 2.0,
            rotate_speed: 0.005,
            zoom_speed: 1.0,
            click_slop: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 0.5,
        }
    }
}

/// A point light. A `range` of zero means the light never cuts off.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub range: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 10.0,
            position: [0.0, 0.0, 0.0],
            range: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightRig {
    pub ambient: AmbientLight,
    pub point_lights: Vec<PointLight>,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight::default(),
            point_lights: vec![
                PointLight {
                    position: [1.0, 0.2, 0.0],
                    range: 30.0,
                    ..Default::default()
                },
                PointLight {
                    position: [-3.0, 0.2, 0.0],
                    ..Default::default()
                },
            ],
        }
    }
}

/// Role a loaded model plays in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSlot {
    Keyboard,
    Mouse,
    Screen,
}

impl ModelSlot {
    pub fn name(&self) -> &'static str {
        match self {
            ModelSlot::Keyboard => "keyboard",
            ModelSlot::Mouse => "mouse",
            ModelSlot::Screen => "screen",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSpec {
    pub slot: ModelSlot,
    pub path: PathBuf,
    #[serde(default)]
    pub position: [f32; 3],
}

impl ModelSpec {
    pub fn new(slot: ModelSlot, path: impl Into<PathBuf>, position: [f32; 3]) -> Self {
        Self {
            slot,
            path: path.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyPressConfig {
    pub press_depth: f32,
    pub press_duration_ms: u64,
}

impl Default for KeyPressConfig {
    fn default() -> Self {
        Self {
            press_depth: 0.002,
            press_duration_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub sensitivity: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self { sensitivity: 0.1 }
    }
}

/// A clickable rectangle on the screen canvas, in canvas pixels
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonSpec {
    pub label: String,
    /// `[x, y, width, height]`
    pub rect: [u32; 4],
    /// Text shown below the buttons while this button is active
    #[serde(default)]
    pub lines: Vec<String>,
}

impl ButtonSpec {
    fn new(label: &str, rect: [u32; 4], lines: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            rect,
            lines: lines.iter().map(|line| line.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Name of the mesh inside the screen model that receives the canvas
    pub mesh_name: String,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub buttons: Vec<ButtonSpec>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            mesh_name: "Screen".to_string(),
            width: 512,
            height: 320,
            title: "Portfolio".to_string(),
            buttons: vec![
                ButtonSpec::new(
                    "About",
                    [16, 64, 150, 44],
                    &["Hi, I build software.", "Systems, graphics, web."],
                ),
                ButtonSpec::new(
                    "Projects",
                    [181, 64, 150, 44],
                    &["Desk scene: wgpu and winit.", "More on my profile."],
                ),
                ButtonSpec::new("Contact", [346, 64, 150, 44], &["Say hello:", "hello@example.com"]),
            ],
        }
    }
}
