//! WebGPU rendering module
//!
//! The scene graph is plain data the simulation writes into; the mesh
//! pipeline draws it as instanced unit cubes and spheres.

pub mod mesh;
pub mod mesh_pipeline;
pub mod scene;

pub use mesh_pipeline::MeshRenderState;
pub use scene::{MeshNode, NodeId, SceneGraph};
