//! WGPU-based rendering engine for the desk scene
//!
//! Owns the surface, device and queue, the depth buffer, the global uniforms
//! and the scene pipeline. A frame is one main pass over every visible mesh
//! followed by an optional overlay callback (the imgui debug window).

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::{
    config::LightRig,
    error::{Result, SceneError},
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            material::create_material_layout,
            texture_resource::TextureResource,
        },
        scene::{object::DrawMesh, scene::Scene},
    },
    wgpu_utils::{binding_builder::BindGroupLayoutBuilder, binding_types, BindGroupLayoutWithDesc},
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

const SCENE_PIPELINE: &str = "Scene";
const SCENE_SHADER: &str = "scene";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    transform_layout: BindGroupLayoutWithDesc,
    material_layout: BindGroupLayoutWithDesc,
    clear_color: wgpu::Color,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `background` - Clear colour (linear RGB)
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        background: [f64; 3],
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|err| SceneError::Gpu(format!("cannot create surface: {}", err)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| SceneError::Gpu(format!("no suitable adapter: {}", err)))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| SceneError::Gpu(format!("cannot open device: {}", err)))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Lighting is computed in linear space; let the surface encode sRGB
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| SceneError::Gpu("surface reports no formats".to_string()))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?} on {}",
            config.width,
            config.height,
            format,
            adapter.get_info().name
        );

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);

        let transform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Transform Bind Group Layout");
        let material_layout = create_material_layout(&device);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader(SCENE_SHADER, include_str!("scene.wgsl"));
        pipeline_manager.register_pipeline(
            SCENE_PIPELINE,
            PipelineConfig::default_with_shader(SCENE_SHADER)
                .with_label("Scene Pipeline")
                // Imported meshes do not agree on winding
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_color_format(format)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    transform_layout.layout.clone(),
                    material_layout.layout.clone(),
                ]),
        );
        pipeline_manager.create_all_pipelines()?;

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            transform_layout,
            material_layout,
            clear_color: wgpu::Color {
                r: background[0],
                g: background[1],
                b: background[2],
                a: 1.0,
            },
        })
    }

    /// Renders a frame with an optional overlay drawn on top
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped; so is
    /// a frame whose texture timed out. Other surface errors are returned.
    pub fn render_frame<F>(&mut self, scene: &Scene, overlay: Option<F>) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.pipeline(SCENE_PIPELINE) {
                render_pass.set_pipeline(pipeline);

                for object in scene.objects().filter(|object| object.visible) {
                    for mesh in &object.meshes {
                        let material = scene
                            .materials()
                            .get_material_for_object(mesh.material_id.as_ref());

                        match material.get_bind_group() {
                            Some(material_bind_group) => {
                                render_pass.set_bind_group(2, material_bind_group, &[]);
                                render_pass.draw_mesh(mesh);
                            }
                            None => log::trace!(
                                "Skipping '{}' - material '{}' has no GPU resources",
                                mesh.name,
                                material.name
                            ),
                        }
                    }
                }
            }
        }

        if let Some(overlay) = overlay {
            overlay(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Writes this frame's camera and lights to the global uniform buffer
    pub fn update(&mut self, camera_uniform: CameraUniform, lights: &LightRig) {
        update_global_ubo(&mut self.global_ubo, &self.queue, camera_uniform, lights);
    }

    /// Creates missing mesh/material GPU resources and uploads changes
    pub fn sync_scene(&self, scene: &mut Scene) {
        scene.sync_gpu(
            &self.device,
            &self.queue,
            &self.transform_layout.layout,
            &self.material_layout,
        );
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero-sized (minimised) windows are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
