//! Material system
//!
//! Materials are stored in [`MaterialManager`] and meshes reference them by
//! name. Every material owns a uniform buffer and a texture; materials without
//! an image sample a 1x1 white texture so a single pipeline draws everything.

use std::collections::HashMap;
use wgpu::Device;

use super::texture_resource::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    _padding: [f32; 3],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Creates the layout shared by all material bind groups (group 2)
///
/// Binding 0 is the uniform, 1 the texture and 2 its sampler.
pub fn create_material_layout(device: &Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::uniform())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
        .create(device, "Material Bind Group Layout")
}

/// CPU copy of an RGBA8 image waiting to be uploaded
struct TextureSource {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

struct MaterialGpu {
    ubo: MaterialUBO,
    texture: TextureResource,
    bind_group: wgpu::BindGroup,
}

/// Surface description shared by every mesh that references it
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],

    texture: Option<TextureSource>,
    texture_dirty: bool,
    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [0.8, 0.8, 0.8, 1.0], 0.0, 0.5)
    }
}

impl Material {
    /// Creates a new material
    ///
    /// # Arguments
    /// * `name` - Unique name for this material
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            emissive: [0.0, 0.0, 0.0],
            texture: None,
            texture_dirty: false,
            gpu: None,
        }
    }

    /// Replaces the material's image; uploaded on the next GPU sync.
    ///
    /// `pixels` holds `width * height` RGBA8 texels, top row first. A buffer of
    /// the wrong size is rejected and the previous image kept.
    pub fn set_texture_rgba(&mut self, width: u32, height: u32, pixels: Vec<u8>) {
        if width == 0 || height == 0 || pixels.len() != (width * height * 4) as usize {
            log::warn!(
                "Ignoring {}x{} texture for '{}' with {} bytes",
                width,
                height,
                self.name,
                pixels.len()
            );
            return;
        }
        self.texture = Some(TextureSource {
            width,
            height,
            pixels,
        });
        self.texture_dirty = true;
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// True when the image changed since the last upload
    pub fn needs_upload(&self) -> bool {
        self.texture_dirty || self.gpu.is_none()
    }

    fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            emissive: self.emissive,
            metallic: self.metallic,
            roughness: self.roughness,
            _padding: [0.0; 3],
        }
    }

    /// Creates or refreshes the GPU side of this material
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        let size_changed = match (&self.gpu, &self.texture) {
            (Some(gpu), Some(source)) => {
                gpu.texture.width() != source.width || gpu.texture.height() != source.height
            }
            (Some(gpu), None) => gpu.texture.width() != 1 || gpu.texture.height() != 1,
            (None, _) => true,
        };

        if size_changed {
            let texture = match &self.texture {
                Some(source) => TextureResource::create_from_rgba_data_with_filter(
                    device,
                    queue,
                    &source.pixels,
                    source.width,
                    source.height,
                    &format!("{} Texture", self.name),
                    wgpu::FilterMode::Linear,
                ),
                None => TextureResource::create_white(
                    device,
                    queue,
                    &format!("{} White Texture", self.name),
                ),
            };
            let ubo = MaterialUBO::new(device);
            let bind_group = BindGroupBuilder::new(layout)
                .resource(ubo.binding_resource())
                .texture(&texture.view)
                .sampler(&texture.sampler)
                .create(device, &format!("{} Material Bind Group", self.name));

            self.gpu = Some(MaterialGpu {
                ubo,
                texture,
                bind_group,
            });
        } else if self.texture_dirty {
            if let (Some(gpu), Some(source)) = (&self.gpu, &self.texture) {
                gpu.texture.write_rgba(queue, &source.pixels);
            }
        }
        self.texture_dirty = false;

        let uniform = self.uniform();
        if let Some(gpu) = &mut self.gpu {
            gpu.ubo.update_content(queue, uniform);
        }
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// Manages all materials in the scene
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material: Material,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            default_material: Material::default(),
        }
    }

    /// Adds a material, replacing any existing one with the same name
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Gets material for a mesh with fallback to default
    pub fn get_material_for_object(&self, material_id: Option<&MaterialId>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or(&self.default_material)
    }

    /// Uploads new materials and changed textures
    pub fn update_all_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        self.default_material
            .update_gpu_resources(device, queue, layout);
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_or_missing_id_falls_back_to_default() {
        let mut manager = MaterialManager::new();
        manager.add_material(Material::new("keyboard/Keys", [0.1, 0.1, 0.1, 1.0], 0.0, 0.8));

        let keys = "keyboard/Keys".to_string();
        let missing = "keyboard/Nope".to_string();
        assert_eq!(manager.get_material_for_object(Some(&keys)).name, "keyboard/Keys");
        assert_eq!(manager.get_material_for_object(Some(&missing)).name, "default");
        assert_eq!(manager.get_material_for_object(None).name, "default");
    }

    #[test]
    fn test_texture_marks_material_for_upload() {
        let mut material = Material::new("screen_canvas", [1.0; 4], 0.0, 1.0);
        assert!(!material.has_texture());

        material.set_texture_rgba(2, 2, vec![255; 16]);
        assert!(material.has_texture());
        assert!(material.needs_upload());
    }

    #[test]
    fn test_mismatched_texture_size_is_ignored() {
        let mut material = Material::new("screen_canvas", [1.0; 4], 0.0, 1.0);
        material.set_texture_rgba(4, 4, vec![0; 10]);
        assert!(!material.has_texture());
    }

    #[test]
    fn test_parameters_are_clamped() {
        let material = Material::new("m", [1.0; 4], 2.0, -1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }
}
