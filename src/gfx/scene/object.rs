use cgmath::{Matrix4, Vector3, Zero};
use wgpu::Device;

use super::vertex::Vertex3D;
use crate::gfx::resources::material::MaterialId;

// GPU resources owned by a single mesh
pub struct MeshGpuResources {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

/// A named node of a model: geometry, a local offset and a material
pub struct Mesh {
    pub name: String,
    pub offset: Vector3<f32>,
    pub material_id: Option<MaterialId>,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    index_count: u32,
    gpu_resources: Option<MeshGpuResources>, // None until init_gpu_resources called
}

impl Mesh {
    /// Builds a mesh from flat OBJ-style arrays.
    ///
    /// `tex_coords` may be empty; OBJ texture coordinates (v up) are flipped to
    /// the texture convention (v down).
    pub fn new(
        name: impl Into<String>,
        positions: &[f32],
        normals: &[f32],
        tex_coords: &[f32],
        indices: Vec<u32>,
    ) -> Self {
        let vertex_count = positions.len() / 3;
        let mut vertices = Vec::with_capacity(vertex_count);
        for i in 0..vertex_count {
            let normal = if normals.len() >= (i + 1) * 3 {
                [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]]
            } else {
                [0.0, 1.0, 0.0]
            };
            let tex_coords = if tex_coords.len() >= (i + 1) * 2 {
                [tex_coords[i * 2], 1.0 - tex_coords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            };
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal,
                tex_coords,
            });
        }

        Self {
            name: name.into(),
            offset: Vector3::zero(),
            material_id: None,
            index_count: indices.len() as u32,
            vertices,
            indices,
            gpu_resources: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn gpu_resources(&self) -> Option<&MeshGpuResources> {
        self.gpu_resources.as_ref()
    }

    // Helper function to calculate smooth normals if OBJ doesn't have them
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];

        let position = |index: usize| {
            positions
                .get(index * 3..index * 3 + 3)
                .map(|p| Vector3::new(p[0], p[1], p[2]))
        };

        for triangle in indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            // Triangles referencing missing vertices contribute nothing
            let (Some(v0), Some(v1), Some(v2)) = (position(i0), position(i1), position(i2)) else {
                continue;
            };

            // Unnormalised: larger faces weigh more
            let face_normal = (v1 - v0).cross(v2 - v0);

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal.x;
                normals[vertex_idx * 3 + 1] += face_normal.y;
                normals[vertex_idx * 3 + 2] += face_normal.z;
            }
        }

        for i in 0..vertex_count {
            let length = (normals[i * 3].powi(2)
                + normals[i * 3 + 1].powi(2)
                + normals[i * 3 + 2].powi(2))
            .sqrt();
            if length > 0.0 {
                normals[i * 3] /= length;
                normals[i * 3 + 1] /= length;
                normals[i * 3 + 2] /= length;
            }
        }

        normals
    }

    fn init_gpu_resources(
        &mut self,
        device: &Device,
        transform_layout: &wgpu::BindGroupLayout,
        model: Matrix4<f32>,
    ) {
        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        // cgmath matrices are already column-major for GPU
        let transform_data: &[f32; 16] = model.as_ref();
        let transform_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Transform Buffer", self.name)),
                contents: bytemuck::cast_slice(transform_data),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Transform Bind Group", self.name)),
            layout: transform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(MeshGpuResources {
            vertex_buffer,
            index_buffer,
            transform_buffer,
            transform_bind_group,
        });
    }

    fn write_transform(&self, queue: &wgpu::Queue, model: Matrix4<f32>) {
        if let Some(gpu_resources) = &self.gpu_resources {
            let transform_data: &[f32; 16] = model.as_ref();
            queue.write_buffer(
                &gpu_resources.transform_buffer,
                0,
                bytemuck::cast_slice(transform_data),
            );
        }
    }
}

/// A loaded model placed in the world
pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub position: Vector3<f32>,
    pub visible: bool,
}

impl Object {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            position: Vector3::zero(),
            visible: true,
        }
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
    }

    /// World matrix of one of this object's meshes
    pub fn mesh_transform(&self, mesh: &Mesh) -> Matrix4<f32> {
        self.transform() * Matrix4::from_translation(mesh.offset)
    }

    pub fn find_mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn find_mesh_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|mesh| mesh.name == name)
    }

    pub fn mesh_names(&self) -> impl Iterator<Item = &str> {
        self.meshes.iter().map(|mesh| mesh.name.as_str())
    }

    /// Creates buffers for meshes that have none yet
    pub fn init_gpu_resources(&mut self, device: &Device, transform_layout: &wgpu::BindGroupLayout) {
        let transform = self.transform();
        for mesh in self.meshes.iter_mut() {
            if mesh.gpu_resources.is_none() {
                let model = transform * Matrix4::from_translation(mesh.offset);
                mesh.init_gpu_resources(device, transform_layout, model);
            }
        }
    }

    /// Writes every mesh's world matrix to its uniform buffer
    pub fn update_transforms(&self, queue: &wgpu::Queue) {
        for mesh in &self.meshes {
            mesh.write_transform(queue, self.mesh_transform(mesh));
        }
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        let Some(gpu_resources) = &mesh.gpu_resources else {
            return; // Skip drawing if not uploaded
        };

        self.set_bind_group(1, &gpu_resources.transform_bind_group, &[]);
        self.set_vertex_buffer(0, gpu_resources.vertex_buffer.slice(..));
        self.set_index_buffer(gpu_resources.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(name: &str) -> Mesh {
        Mesh::new(
            name,
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[],
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_tex_coords_are_flipped_to_texture_space() {
        let mesh = triangle("tri");
        assert_eq!(mesh.vertices()[0].tex_coords, [0.0, 1.0]);
        assert_eq!(mesh.vertices()[2].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn test_face_normals_point_out_of_ccw_triangle() {
        let normals = Mesh::calculate_face_normals(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2],
        );
        assert_eq!(&normals[0..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_face_normals_skip_out_of_range_triangles() {
        let normals = Mesh::calculate_face_normals(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2, 0, 1, 7],
        );
        assert_eq!(normals.len(), 9);
        assert_eq!(&normals[0..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_mesh_transform_combines_position_and_offset() {
        let mut object = Object::new("keyboard", vec![triangle("a")]);
        object.set_position(Vector3::new(0.0, -0.2, 0.0));
        object.meshes[0].offset.y -= 0.002;

        let world = object.mesh_transform(&object.meshes[0]);
        assert!((world.w.y - (-0.202)).abs() < 1e-6);
    }

    #[test]
    fn test_find_mesh_by_name() {
        let mut object = Object::new("keyboard", vec![triangle("a"), triangle("Enter")]);
        assert!(object.find_mesh("Enter").is_some());
        assert!(object.find_mesh("b").is_none());
        assert!(object.find_mesh_mut("a").is_some());
        assert_eq!(object.mesh_names().collect::<Vec<_>>(), vec!["a", "Enter"]);
    }
}
