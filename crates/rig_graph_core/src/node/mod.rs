//! Evaluable node types.

mod context;
mod registry;

pub use context::*;
pub use registry::*;

use std::fmt::Debug;

use bevy::reflect::Reflect;
use indexmap::IndexMap;

use crate::{
    edge_data::{DataSpec, DataValue},
    errors::SceneResult,
};

pub trait NodeLike: NodeLikeClone + Send + Sync + Debug + 'static {
    /// Declares the input and output pins of this node.
    fn spec(&self, ctx: SpecContext) -> SceneResult<()>;
    /// Computes every output from the inputs.
    fn update(&self, ctx: NodeContext) -> SceneResult<()>;

    /// The name of this node.
    fn display_name(&self) -> String;
}

pub trait NodeLikeClone {
    fn clone_node_like(&self) -> Box<dyn NodeLike>;
}

impl<T> NodeLikeClone for T
where
    T: 'static + NodeLike + Clone,
{
    fn clone_node_like(&self) -> Box<dyn NodeLike> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn NodeLike> {
    fn clone(&self) -> Self {
        self.clone_node_like()
    }
}

#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct PinSpec {
    pub spec: DataSpec,
    pub default: DataValue,
    pub multi: bool,
}

impl PinSpec {
    pub fn new(spec: DataSpec) -> Self {
        Self {
            spec,
            default: DataValue::default_from_spec(spec),
            multi: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeSpec {
    pub inputs: IndexMap<String, PinSpec>,
    pub outputs: IndexMap<String, PinSpec>,
}

impl NodeSpec {
    pub fn of(node: &dyn NodeLike) -> SceneResult<Self> {
        let mut spec = Self::default();
        node.spec(SpecContext::new(&mut spec))?;
        Ok(spec)
    }
}
