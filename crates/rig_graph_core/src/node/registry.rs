use bevy::platform::collections::HashMap;

use super::NodeLike;
use crate::{
    errors::{SceneError, SceneResult},
    scene::NodeKind,
};

pub type NodeConstructor = fn() -> Box<dyn NodeLike>;

/// Maps every [`NodeKind`] to the implementation evaluated for it.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    constructors: HashMap<NodeKind, NodeConstructor>,
}

impl NodeRegistry {
    pub fn register(&mut self, kind: NodeKind, constructor: NodeConstructor) -> &mut Self {
        self.constructors.insert(kind, constructor);
        self
    }

    pub fn instantiate(&self, kind: NodeKind) -> SceneResult<Box<dyn NodeLike>> {
        self.constructors
            .get(&kind)
            .map(|constructor| constructor())
            .ok_or(SceneError::UnregisteredKind(kind))
    }

    pub fn is_registered(&self, kind: NodeKind) -> bool {
        self.constructors.contains_key(&kind)
    }
}
