//! Retained scene graph shared with the renderer
//!
//! The simulation owns every visual node through a move-only [`NodeHandle`].
//! The renderer reads node transforms each frame and mirrors add/remove calls
//! from [`SceneGraph::drain_changes`].

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Stable node identifier (for the renderer's mirror)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// What a node represents (selects the renderer's material)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Player,
    Obstacle,
    SpiralDecal,
    BounceActor,
    BouncePlatform,
    OscillateActor,
    ZoomHalo,
}

/// Visual state of a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Vec3,
    /// Full size in world units
    pub scale: Vec2,
    pub alpha: f32,
    pub tint: Vec3,
}

/// Ownership token for a node
///
/// Not `Clone`: the holder is the only one able to release the node.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a node handle must be released back to the scene"]
pub struct NodeHandle(NodeId);

impl NodeHandle {
    pub fn id(&self) -> NodeId {
        self.0
    }
}

/// Structural change for the renderer to mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added(NodeId, NodeKind),
    Removed(NodeId),
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    changes: Vec<SceneChange>,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and hand out its ownership token
    pub fn spawn(&mut self, kind: NodeKind, pos: Vec3, scale: Vec2) -> NodeHandle {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            Node {
                kind,
                pos,
                scale,
                alpha: 1.0,
                tint: Vec3::ONE,
            },
        );
        self.changes.push(SceneChange::Added(id, kind));
        NodeHandle(id)
    }

    /// Remove a node, consuming its token
    pub fn release(&mut self, handle: NodeHandle) {
        if self.nodes.remove(&handle.0).is_some() {
            self.changes.push(SceneChange::Removed(handle.0));
        } else {
            log::warn!("Released unknown node {:?}", handle.0);
        }
    }

    /// Mutable access for the node's owner
    pub fn node_mut(&mut self, handle: &NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(&handle.0)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Move a node (no-op for unknown handles)
    pub fn set_pos(&mut self, handle: &NodeHandle, pos: Vec3) {
        if let Some(node) = self.node_mut(handle) {
            node.pos = pos;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|n| n.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Take the add/remove log accumulated since the last call
    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}
