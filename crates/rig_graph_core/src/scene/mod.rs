//! The scene backend contract rigs are built against.
//!
//! A [`Scene`] is a dataflow graph of typed nodes. Nodes expose attributes
//! ("plugs") that can be read, written and connected; transforms and joints
//! additionally form a parent/child hierarchy. Outputs are recomputed on
//! demand whenever something upstream changed.

mod attribute;
mod node_kind;
mod plug;

pub use attribute::*;
pub use node_kind::*;
pub use plug::*;

use bevy::math::{DMat4, DQuat, DVec3};

use crate::{
    edge_data::DataValue,
    errors::SceneResult,
};

/// Attribute names shared by every transform and joint.
pub mod attrs {
    pub const TRANSLATE: &str = "translate";
    pub const ROTATE: &str = "rotate";
    pub const SCALE: &str = "scale";
    pub const SHEAR: &str = "shear";
    pub const ROTATE_ORDER: &str = "rotate_order";
    pub const VISIBILITY: &str = "visibility";
    pub const JOINT_ORIENT: &str = "joint_orient";
    /// Multi message input used to publish a node into a component folder.
    pub const RECEIVER: &str = "receiver";

    pub const MATRIX: &str = "matrix";
    pub const WORLD_MATRIX: &str = "world_matrix";
    pub const WORLD_INVERSE_MATRIX: &str = "world_inverse_matrix";
    pub const PARENT_MATRIX: &str = "parent_matrix";
    pub const PARENT_INVERSE_MATRIX: &str = "parent_inverse_matrix";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    World,
    Local,
}

pub trait Scene {
    /// Creates a node. Names are unique within a scene.
    fn create_node(&mut self, kind: NodeKind, name: &str) -> SceneResult<NodeRef>;

    fn create_transform(&mut self, name: &str) -> SceneResult<NodeRef> {
        self.create_node(NodeKind::Transform, name)
    }

    fn create_joint(&mut self, name: &str) -> SceneResult<NodeRef> {
        self.create_node(NodeKind::Joint, name)
    }

    fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn find(&self, name: &str) -> Option<NodeRef>;
    fn node_name(&self, node: NodeRef) -> SceneResult<String>;
    fn node_kind(&self, node: NodeRef) -> SceneResult<NodeKind>;

    fn add_attribute(&mut self, node: NodeRef, attribute: AttributeSpec) -> SceneResult<()>;
    fn has_attribute(&self, node: NodeRef, attr: &str) -> bool;

    /// Drives `target` from `source`, replacing any previous incoming
    /// connection of `target`.
    fn connect(&mut self, source: Plug, target: Plug) -> SceneResult<()>;
    /// Removes every connection into or out of `plug` and its elements.
    fn disconnect_all(&mut self, plug: Plug) -> SceneResult<()>;
    fn source(&self, target: Plug) -> SceneResult<Option<Plug>>;
    fn destinations(&self, source: Plug) -> SceneResult<Vec<Plug>>;
    /// Indices of a multi plug that hold a value or a connection.
    fn multi_indices(&self, plug: Plug) -> SceneResult<Vec<usize>>;

    fn get(&self, plug: Plug) -> SceneResult<DataValue>;
    fn set(&mut self, plug: Plug, value: DataValue) -> SceneResult<()>;

    /// Moves `child` under `parent` (or to the world), preserving its world
    /// matrix.
    fn parent(&mut self, child: NodeRef, parent: Option<NodeRef>) -> SceneResult<()>;
    fn parent_of(&self, node: NodeRef) -> SceneResult<Option<NodeRef>>;
    fn list_children(&self, node: NodeRef) -> SceneResult<Vec<NodeRef>>;

    fn xform(&self, node: NodeRef, space: Space) -> SceneResult<DMat4>;
    /// Writes the transform channels of `node` so that its matrix in `space`
    /// becomes `matrix`.
    fn set_xform(&mut self, node: NodeRef, matrix: DMat4, space: Space) -> SceneResult<()>;
}

/// Typed shorthands over [`Scene::get`] and [`Scene::set`].
pub trait SceneExt: Scene {
    fn get_f64(&self, plug: Plug) -> SceneResult<f64> {
        self.get(plug)?.as_f64()
    }

    fn get_bool(&self, plug: Plug) -> SceneResult<bool> {
        self.get(plug)?.as_bool()
    }

    fn get_vec3(&self, plug: Plug) -> SceneResult<DVec3> {
        self.get(plug)?.as_vec3()
    }

    fn get_quat(&self, plug: Plug) -> SceneResult<DQuat> {
        self.get(plug)?.as_quat()
    }

    fn get_matrix(&self, plug: Plug) -> SceneResult<DMat4> {
        self.get(plug)?.as_matrix()
    }

    fn set_value(&mut self, plug: Plug, value: impl Into<DataValue>) -> SceneResult<()> {
        self.set(plug, value.into())
    }

    fn world_matrix(&self, node: NodeRef) -> SceneResult<DMat4> {
        self.xform(node, Space::World)
    }
}

impl<S: Scene + ?Sized> SceneExt for S {}
