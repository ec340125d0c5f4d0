//! # Mesh Picking
//!
//! Ray casting from the cursor into the scene, used to find where a click lands
//! on the screen mesh.
//!
//! ## How it works
//!
//! 1. **Mouse to Ray**: Convert window coordinates to a world-space ray
//! 2. **Broad phase**: Test the ray against the mesh's world bounding box
//! 3. **Narrow phase**: Test every triangle and keep the nearest hit, whose
//!    barycentric coordinates give the texture coordinate under the cursor
//!
//! ## Usage
//!
//! ```no_run
//! use desk_scene::gfx::picking::ObjectPicker;
//! # fn demo(camera: &desk_scene::gfx::camera::OrbitCamera, screen: &desk_scene::gfx::scene::object::Object) {
//! let picker = ObjectPicker::new();
//! let ray = picker.screen_to_ray((400.0, 300.0), (800.0, 600.0), camera);
//! if let Some(hit) = picker.pick_mesh(&ray, screen, "Screen") {
//!     println!("uv under cursor: {:?}", hit.uv);
//! }
//! # }
//! ```

use cgmath::{ElementWise, EuclideanSpace, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::{camera::orbit_camera::OrbitCamera, scene::object::Object};

/// Rays parallel to a triangle within this tolerance miss it
const EPSILON: f32 = 1e-7;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Bounds of a set of points
    pub fn from_points(points: impl IntoIterator<Item = Vector3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        Some(Self::new(min, max))
    }

    /// Grows the box by `margin` on every side so flat meshes still get hit
    pub fn inflate(&self, margin: f32) -> Self {
        let margin = Vector3::new(margin, margin, margin);
        Self::new(self.min - margin, self.max + margin)
    }

    /// Slab test. Returns the distance to the entry point (or exit point when
    /// the origin is inside), or None if the ray misses.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }
}

/// Intersection of a ray with a triangle (Möller–Trumbore)
///
/// Returns `(t, u, v)`: the distance along the ray and the barycentric weights
/// of `v1` and `v2`. Hits behind the origin are rejected; both faces count.
pub fn ray_triangle(
    ray: &Ray,
    v0: Vector3<f32>,
    v1: Vector3<f32>,
    v2: Vector3<f32>,
) -> Option<(f32, f32, f32)> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some((t, u, v))
}

/// Nearest intersection of a ray with a mesh
#[derive(Debug, Clone, Copy)]
pub struct MeshHit {
    /// Distance from the ray origin
    pub distance: f32,
    /// World space intersection point
    pub point: Vector3<f32>,
    /// Interpolated texture coordinate (origin top-left)
    pub uv: [f32; 2],
}

/// Casts rays from the camera into the scene
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectPicker;

impl ObjectPicker {
    pub fn new() -> Self {
        Self
    }

    /// Convert window coordinates (pixels, origin top-left) to a world-space ray
    pub fn screen_to_ray(
        &self,
        screen_pos: (f32, f32),
        screen_size: (f32, f32),
        camera: &OrbitCamera,
    ) -> Ray {
        let (mouse_x, mouse_y) = screen_pos;
        let (screen_width, screen_height) = screen_size;

        let ndc_x = (2.0 * mouse_x) / screen_width - 1.0;
        let ndc_y = 1.0 - (2.0 * mouse_y) / screen_height; // Flip Y axis

        let eye = cgmath::Point3::from_vec(camera.eye);
        let target = cgmath::Point3::from_vec(camera.target);
        let view_matrix = Matrix4::look_at_rh(eye, target, camera.up);
        let proj_matrix =
            cgmath::perspective(camera.fovy, camera.aspect, camera.znear, camera.zfar);

        let inv_view_proj = (proj_matrix * view_matrix)
            .invert()
            .unwrap_or(Matrix4::from_scale(1.0));

        // OpenGL clip space: near plane at -1, far plane at 1
        let world_near = inv_view_proj * Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
        let world_far = inv_view_proj * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near_3d = world_near.truncate() / world_near.w;
        let far_3d = world_far.truncate() / world_far.w;

        Ray::new(near_3d, far_3d - near_3d)
    }

    /// Casts `ray` against the mesh called `mesh_name` inside `object`
    pub fn pick_mesh(&self, ray: &Ray, object: &Object, mesh_name: &str) -> Option<MeshHit> {
        let mesh = object.find_mesh(mesh_name)?;
        let transform = object.mesh_transform(mesh);

        let world: Vec<Vector3<f32>> = mesh
            .vertices()
            .iter()
            .map(|vertex| {
                let [x, y, z] = vertex.position;
                let p = transform * Vector4::new(x, y, z, 1.0);
                p.truncate() / p.w
            })
            .collect();

        let bounds = Aabb::from_points(world.iter().copied())?.inflate(1e-4);
        bounds.intersect_ray(ray)?;

        let mut nearest: Option<MeshHit> = None;
        for triangle in mesh.indices().chunks_exact(3) {
            let [i0, i1, i2] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            let (Some(&p0), Some(&p1), Some(&p2)) = (world.get(i0), world.get(i1), world.get(i2))
            else {
                continue;
            };

            let Some((t, u, v)) = ray_triangle(ray, p0, p1, p2) else {
                continue;
            };
            if nearest.is_some_and(|hit| hit.distance <= t) {
                continue;
            }

            let vertices = mesh.vertices();
            let w = 1.0 - u - v;
            let uv0 = vertices[i0].tex_coords;
            let uv1 = vertices[i1].tex_coords;
            let uv2 = vertices[i2].tex_coords;
            nearest = Some(MeshHit {
                distance: t,
                point: ray.point_at(t),
                uv: [
                    w * uv0[0] + u * uv1[0] + v * uv2[0],
                    w * uv0[1] + u * uv1[1] + v * uv2[1],
                ],
            });
        }

        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{camera::OrbitCameraBounds, scene::object::Mesh};
    use cgmath::Zero;

    /// Unit quad in the z = 0 plane, uv (0,0) at the top-left corner
    fn screen_quad() -> Object {
        let mesh = Mesh::new(
            "Screen",
            &[-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.5, 0.5, 0.0, -0.5, 0.5, 0.0],
            &[],
            &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            vec![0, 1, 2, 0, 2, 3],
        );
        Object::new("screen", vec![mesh])
    }

    fn front_camera() -> OrbitCamera {
        OrbitCamera::from_position(
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::zero(),
            OrbitCameraBounds::default(),
            800.0 / 600.0,
        )
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points([
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(-1.0, -1.0, -1.0),
        ])
        .unwrap();

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!((aabb.intersect_ray(&ray).unwrap() - 4.0).abs() < 1e-5);

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_ray_triangle_hit_and_miss() {
        let v0 = Vector3::new(0.0, 0.0, 0.0);
        let v1 = Vector3::new(1.0, 0.0, 0.0);
        let v2 = Vector3::new(0.0, 1.0, 0.0);

        let ray = Ray::new(Vector3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let (t, u, v) = ray_triangle(&ray, v0, v1, v2).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
        assert!((u - 0.25).abs() < 1e-5);
        assert!((v - 0.25).abs() < 1e-5);

        let outside = Ray::new(Vector3::new(0.8, 0.8, 1.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray_triangle(&outside, v0, v1, v2).is_none());

        let behind = Ray::new(Vector3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(ray_triangle(&behind, v0, v1, v2).is_none());
    }

    #[test]
    fn test_center_of_viewport_hits_middle_of_screen() {
        let picker = ObjectPicker::new();
        let ray = picker.screen_to_ray((400.0, 300.0), (800.0, 600.0), &front_camera());

        let hit = picker.pick_mesh(&ray, &screen_quad(), "Screen").unwrap();
        assert!((hit.distance - 1.9).abs() < 1e-3);
        assert!((hit.uv[0] - 0.5).abs() < 1e-3);
        assert!((hit.uv[1] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_upper_left_of_quad_maps_to_upper_left_texels() {
        let picker = ObjectPicker::new();
        let mut screen = screen_quad();
        screen.set_position(Vector3::new(0.2, 0.0, 0.0));
        // World point (0.0, 0.25, 0.0) lies left of and above the quad centre
        let ray = Ray::new(Vector3::new(0.0, 0.25, 2.0), Vector3::new(0.0, 0.0, -1.0));

        let hit = picker.pick_mesh(&ray, &screen, "Screen").unwrap();
        assert!((hit.uv[0] - 0.3).abs() < 1e-4);
        assert!((hit.uv[1] - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_corner_of_viewport_misses_and_unknown_mesh_is_none() {
        let picker = ObjectPicker::new();
        let camera = front_camera();

        let corner = picker.screen_to_ray((0.0, 0.0), (800.0, 600.0), &camera);
        assert!(picker.pick_mesh(&corner, &screen_quad(), "Screen").is_none());

        let center = picker.screen_to_ray((400.0, 300.0), (800.0, 600.0), &camera);
        assert!(picker.pick_mesh(&center, &screen_quad(), "Bezel").is_none());
    }
}
