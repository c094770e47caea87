//! Reference implementations of every [`NodeKind`].
//!
//! [`register_builtin_nodes`] fills a [`NodeRegistry`] with them, and
//! [`memory_scene`] returns an empty [`MemoryScene`] that can evaluate rigs
//! built from them.

mod distance_between;
mod float;
mod ik_handle;
mod matrix;
mod transform_node;

pub use distance_between::*;
pub use float::*;
pub use ik_handle::*;
pub use matrix::*;
pub use transform_node::*;

use rig_graph_core::{memory_scene::MemoryScene, node::NodeRegistry, scene::NodeKind};

pub fn register_builtin_nodes(registry: &mut NodeRegistry) {
    registry
        .register(NodeKind::Transform, || Box::new(TransformNode::transform()))
        .register(NodeKind::Joint, || Box::new(TransformNode::joint()))
        .register(NodeKind::BlendMatrix, || Box::new(BlendMatrixNode::new()))
        .register(NodeKind::MultMatrix, || Box::new(MultMatrixNode::new()))
        .register(NodeKind::InverseMatrix, || Box::new(InverseMatrixNode::new()))
        .register(NodeKind::ComposeMatrix, || Box::new(ComposeMatrixNode::new()))
        .register(NodeKind::DecomposeMatrix, || {
            Box::new(DecomposeMatrixNode::new())
        })
        .register(NodeKind::AimMatrix, || Box::new(AimMatrixNode::new()))
        .register(NodeKind::IkHandle, || Box::new(IkHandleNode::new()))
        .register(NodeKind::DistanceBetween, || {
            Box::new(DistanceBetweenNode::new())
        })
        .register(NodeKind::AddF64, || Box::new(AddF64::new()))
        .register(NodeKind::SubF64, || Box::new(SubF64::new()))
        .register(NodeKind::MulF64, || Box::new(MulF64::new()))
        .register(NodeKind::DivF64, || Box::new(DivF64::new()))
        .register(NodeKind::ClampF64, || Box::new(ClampF64::new()))
        .register(NodeKind::ReverseF64, || Box::new(ReverseF64::new()));
}

/// An empty in-memory scene able to create every builtin node kind.
pub fn memory_scene() -> MemoryScene {
    let mut registry = NodeRegistry::default();
    register_builtin_nodes(&mut registry);
    MemoryScene::new(registry)
}
