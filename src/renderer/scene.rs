//! Scene graph
//!
//! Flat list of primitive meshes keyed by id. Iteration is in id order so the
//! draw order is stable between frames.

use std::collections::BTreeMap;

use crate::physics::{Pose, Shape};

/// Handle to a mesh in the scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A primitive mesh with a flat colour
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub shape: Shape,
    pub color: [f32; 4],
    pub pose: Pose,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, MeshNode>,
    next_id: u32,
    /// Clear colour
    pub background: [f32; 4],
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            background: crate::rgb(0xbfd1e5),
        }
    }

    pub fn add(&mut self, node: MeshNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<MeshNode> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&MeshNode> {
        self.nodes.get(&id)
    }

    pub fn set_pose(&mut self, id: NodeId, pose: Pose) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pose = pose;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MeshNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ball() -> MeshNode {
        MeshNode {
            shape: Shape::Ball { radius: 1.0 },
            color: [1.0; 4],
            pose: Pose::IDENTITY,
        }
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut scene = SceneGraph::new();
        let a = scene.add(ball());
        scene.remove(a);
        let b = scene.add(ball());
        assert_ne!(a, b);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_set_pose_on_removed_node_is_ignored() {
        let mut scene = SceneGraph::new();
        let a = scene.add(ball());
        scene.remove(a);
        scene.set_pose(a, Pose::at(Vec3::ONE));
        assert!(scene.get(a).is_none());
    }
}
