//! Model loading
//!
//! Models are OBJ files (plus optional MTL) parsed with `tobj`. Each `o`/`g`
//! group becomes a named [`Mesh`], which is how individual keys of the
//! keyboard and the screen panel are addressed later on.
//!
//! [`ModelLoader`] parses every model on its own thread and hands the result to
//! the event loop as a [`SceneEvent`]; loads are independent and may finish in
//! any order.

use std::path::{Path, PathBuf};

use winit::event_loop::EventLoopProxy;

use super::object::Mesh;
use crate::{
    config::ModelSlot,
    error::{Result, SceneError},
    gfx::resources::material::Material,
};

/// User events delivered to the winit event loop
pub enum SceneEvent {
    ModelLoaded {
        slot: ModelSlot,
        result: Result<LoadedModel>,
    },
}

/// CPU-side model data ready to be installed into a scene
pub struct LoadedModel {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Loads an OBJ file and its materials from disk
pub fn load_model(path: &Path) -> Result<LoadedModel> {
    let (models, materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| SceneError::ModelLoad {
            path: path.to_path_buf(),
            source,
        })?;

    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No usable MTL for {}: {}", path.display(), err);
        Vec::new()
    });

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    LoadedModel::from_tobj(&name, models, materials)
}

impl LoadedModel {
    /// Parses OBJ text held in memory. `mtllib` statements are ignored.
    pub fn from_obj_str(name: &str, obj: &str) -> Result<Self> {
        let (models, _) = tobj::load_obj_buf(&mut obj.as_bytes(), &load_options(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|source| SceneError::ModelLoad {
            path: PathBuf::from(name),
            source,
        })?;

        Self::from_tobj(name, models, Vec::new())
    }

    fn from_tobj(
        name: &str,
        models: Vec<tobj::Model>,
        materials: Vec<tobj::Material>,
    ) -> Result<Self> {
        // tobj reports geometry-less input as a single empty model
        let models: Vec<tobj::Model> = models
            .into_iter()
            .filter(|model| !model.mesh.indices.is_empty())
            .collect();
        if models.is_empty() {
            return Err(SceneError::EmptyModel(name.to_string()));
        }

        // Prefix with the model name so two models can both ship a "Material"
        let material_names: Vec<String> = materials
            .iter()
            .enumerate()
            .map(|(i, mtl)| {
                if mtl.name.is_empty() {
                    format!("{}/material_{}", name, i)
                } else {
                    format!("{}/{}", name, mtl.name)
                }
            })
            .collect();

        let materials = materials
            .iter()
            .zip(&material_names)
            .map(|(mtl, material_name)| {
                let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                Material::new(
                    material_name,
                    [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
                    0.0, // MTL has no metallic term
                    1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
                )
            })
            .collect();

        let meshes = models
            .into_iter()
            .enumerate()
            .map(|(i, model)| {
                let mesh = model.mesh;
                let normals = if mesh.normals.len() == mesh.positions.len() {
                    mesh.normals
                } else {
                    Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
                };
                let mesh_name = if model.name.is_empty() {
                    format!("{}_{}", name, i)
                } else {
                    model.name
                };

                let mut our_mesh = Mesh::new(
                    mesh_name,
                    &mesh.positions,
                    &normals,
                    &mesh.texcoords,
                    mesh.indices,
                );
                our_mesh.material_id = mesh
                    .material_id
                    .and_then(|id| material_names.get(id).cloned());
                our_mesh
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            meshes,
            materials,
        })
    }
}

/// Spawns one loader thread per model
pub struct ModelLoader;

impl ModelLoader {
    pub fn spawn(requests: Vec<(ModelSlot, PathBuf)>, proxy: EventLoopProxy<SceneEvent>) {
        for (slot, path) in requests {
            let proxy = proxy.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("load-{}", slot.name()))
                .spawn(move || {
                    let result = load_model(&path);
                    if proxy
                        .send_event(SceneEvent::ModelLoaded { slot, result })
                        .is_err()
                    {
                        log::debug!("Event loop closed before {} finished loading", slot.name());
                    }
                });

            if let Err(err) = spawned {
                log::warn!("Could not start loader for {}: {}", slot.name(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_KEYS: &str = "\
o a
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
o Enter
v 2 0 0
v 3 0 0
v 3 0 1
f 5 6 7
";

    #[test]
    fn test_groups_become_named_meshes() {
        let model = LoadedModel::from_obj_str("keyboard", TWO_KEYS).unwrap();

        assert_eq!(model.name, "keyboard");
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].name, "a");
        assert_eq!(model.meshes[1].name, "Enter");
        // The quad is triangulated
        assert_eq!(model.meshes[0].index_count(), 6);
        assert!(model.materials.is_empty());
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let model = LoadedModel::from_obj_str("keyboard", TWO_KEYS).unwrap();
        let normal = model.meshes[1].vertices()[0].normal;
        let length = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        assert!((length - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_model(Path::new("no/such/model.obj"));
        assert!(matches!(result, Err(SceneError::ModelLoad { .. })));
    }

    #[test]
    fn test_empty_obj_is_an_error() {
        let result = LoadedModel::from_obj_str("empty", "# nothing here\n");
        assert!(matches!(result, Err(SceneError::EmptyModel(_))));
    }

    #[test]
    fn test_objects_without_faces_are_dropped() {
        let obj = format!("o Marker\nv 9 9 9\n{}", TWO_KEYS);
        let model = LoadedModel::from_obj_str("keyboard", &obj).unwrap();

        assert_eq!(model.meshes.len(), 2);
        assert!(model.meshes.iter().all(|mesh| mesh.index_count() > 0));
        assert!(model.meshes.iter().all(|mesh| mesh.name != "Marker"));
    }
}
