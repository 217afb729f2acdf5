//! Vertex/instance layouts and primitive meshes
//!
//! Every box in the scene is one unit cube and every ball one unit sphere,
//! stretched by the instance's model matrix.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::scene::MeshNode;
use crate::physics::Shape;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-instance model matrix (column-major) and colour
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Instance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl Instance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn from_node(node: &MeshNode) -> Self {
        let scale = match node.shape {
            Shape::Cuboid { size } => size,
            Shape::Ball { radius } => Vec3::splat(radius),
        };
        let model =
            Mat4::from_scale_rotation_translation(scale, node.pose.rotation, node.pose.position);
        Self {
            model: model.to_cols_array_2d(),
            color: node.color,
        }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

/// Cube spanning -0.5..0.5 with flat per-face normals
pub fn unit_cube() -> MeshData {
    // (normal, u axis, v axis) per face; u x v == normal keeps CCW winding
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];

    let mut mesh = MeshData::default();
    for (normal, u, v) in FACES {
        let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
        let base = mesh.vertices.len() as u16;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = n * 0.5 + u * su + v * sv;
            mesh.vertices.push(Vertex::new(p.to_array(), normal));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// UV sphere of radius 1 with `segments` longitudes and half as many latitudes
pub fn unit_sphere(segments: u32) -> MeshData {
    let lon = segments.max(3);
    let lat = (segments / 2).max(2);
    let mut mesh = MeshData::default();

    for i in 0..=lat {
        let theta = i as f32 / lat as f32 * std::f32::consts::PI;
        let (sin_t, cos_t) = theta.sin_cos();
        for j in 0..=lon {
            let phi = j as f32 / lon as f32 * std::f32::consts::TAU;
            let (sin_p, cos_p) = phi.sin_cos();
            let p = [sin_t * cos_p, cos_t, sin_t * sin_p];
            mesh.vertices.push(Vertex::new(p, p));
        }
    }

    let row = lon + 1;
    for i in 0..lat {
        for j in 0..lon {
            let a = (i * row + j) as u16;
            let b = a + row as u16;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Pose;

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = unit_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(cube.vertices[tri[k] as usize].position));
            let face_normal = (b - a).cross(c - a);
            let normal = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_sphere_vertices_on_unit_radius() {
        let sphere = unit_sphere(16);
        assert!(!sphere.indices.is_empty());
        assert!(sphere.indices.iter().all(|i| (*i as usize) < sphere.vertices.len()));
        for v in &sphere.vertices {
            assert!((Vec3::from(v.position).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_instance_scales_by_shape() {
        let node = MeshNode {
            shape: Shape::Cuboid {
                size: Vec3::new(2.0, 4.0, 6.0),
            },
            color: [1.0; 4],
            pose: Pose::at(Vec3::new(1.0, 2.0, 3.0)),
        };
        let model = Mat4::from_cols_array_2d(&Instance::from_node(&node).model);
        let corner = model.transform_point3(Vec3::splat(0.5));
        assert!((corner - Vec3::new(2.0, 4.0, 6.0)).length() < 1e-5);
    }
}
