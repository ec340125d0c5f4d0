//! # Scene Management Module
//!
//! Scene graph for the desk: models loaded from OBJ files, split into named
//! meshes, placed into one of three slots and drawn with shared materials.
//!
//! ## Key Components
//!
//! - [`Scene`] - Owns the camera, the loaded objects, materials and the
//!   interaction state, and turns window input into scene changes
//! - [`Object`] / [`Mesh`] - A placed model and its named parts
//! - [`ModelLoader`] - Background loading of the model files
//! - [`Vertex3D`] - Vertex layout shared by every mesh
//!
//! ## Usage
//!
//! ```no_run
//! use desk_scene::config::{ModelSlot, SceneConfig};
//! use desk_scene::gfx::scene::{loader::load_model, Scene};
//!
//! let config = SceneConfig::default();
//! let mut scene = Scene::new(&config, 1200, 800);
//! let spec = config.model_spec(ModelSlot::Keyboard).unwrap();
//! scene.on_model_loaded(spec.slot, load_model(&config.model_path(spec)));
//! ```

pub mod loader;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use loader::{LoadedModel, ModelLoader, SceneEvent};
pub use object::{DrawMesh, Mesh, Object};
pub use scene::{Scene, SceneStatistics, ScreenClick, SCREEN_MATERIAL};
pub use vertex::Vertex3D;
