//! Global uniform bindings for camera and scene data
//!
//! Manages the uniform buffer and bind group for per-frame state shared by
//! every mesh: camera matrices, the ambient term and the point lights.

use crate::{
    config::LightRig,
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Point lights beyond this count are ignored
pub const MAX_POINT_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    /// xyz position, w range (0 = unbounded)
    pub position_range: [f32; 4],
    /// rgb color, w intensity
    pub color_intensity: [f32; 4],
}

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// rgb color, w intensity
    ambient: [f32; 4],
    /// x holds the number of active point lights
    light_count: [u32; 4],
    point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
}

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, lights: &LightRig) -> Self {
        let mut point_lights = [PointLightUniform::default(); MAX_POINT_LIGHTS];
        for (slot, light) in point_lights.iter_mut().zip(&lights.point_lights) {
            *slot = PointLightUniform {
                position_range: [light.position[0], light.position[1], light.position[2], light.range],
                color_intensity: [light.color[0], light.color[1], light.color[2], light.intensity],
            };
        }

        let ambient = lights.ambient;
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            ambient: [ambient.color[0], ambient.color[1], ambient.color[2], ambient.intensity],
            light_count: [lights.point_lights.len().min(MAX_POINT_LIGHTS) as u32, 0, 0, 0],
            point_lights,
        }
    }

    pub fn light_count(&self) -> u32 {
        self.light_count[0]
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Writes this frame's camera and lights into the global uniform buffer
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    lights: &LightRig,
) {
    ubo.update_content(queue, GlobalUBOContent::new(camera, lights));
}

/// Bind group layout and bind group for the global uniforms (group 0)
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointLight;

    #[test]
    fn test_default_rig_packs_ambient_and_two_lights() {
        let content = GlobalUBOContent::new(CameraUniform::default(), &LightRig::default());

        assert_eq!(content.light_count(), 2);
        assert_eq!(content.ambient, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(content.point_lights[0].position_range, [1.0, 0.2, 0.0, 30.0]);
        assert_eq!(content.point_lights[1].position_range, [-3.0, 0.2, 0.0, 0.0]);
        assert_eq!(content.point_lights[1].color_intensity[3], 10.0);
    }

    #[test]
    fn test_extra_lights_are_dropped() {
        let rig = LightRig {
            point_lights: vec![PointLight::default(); 6],
            ..Default::default()
        };
        let content = GlobalUBOContent::new(CameraUniform::default(), &rig);
        assert_eq!(content.light_count() as usize, MAX_POINT_LIGHTS);
    }

    #[test]
    fn test_layout_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }
}
