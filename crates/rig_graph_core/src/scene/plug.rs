use std::fmt::Display;

use bevy::{math::DVec3, reflect::Reflect};
use serde::{Deserialize, Serialize};

/// Handle to a node living in a [`Scene`](super::Scene).
#[derive(
    Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeRef(u32);

impl NodeRef {
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn plug(&self, id: impl Into<PlugId>) -> Plug {
        Plug {
            node: *self,
            id: id.into(),
        }
    }
}

#[derive(
    Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(&self) -> DVec3 {
        match self {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Attribute of a node, optionally narrowed to one element of a multi
/// attribute and/or one component of a vector attribute.
#[derive(Reflect, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlugId {
    pub attr: String,
    pub index: Option<usize>,
    pub axis: Option<Axis>,
}

impl PlugId {
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            index: None,
            axis: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    /// The same plug with the vector component selection dropped.
    pub fn without_axis(&self) -> Self {
        Self {
            axis: None,
            ..self.clone()
        }
    }
}

impl From<&str> for PlugId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlugId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Display for PlugId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.attr)?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        if let Some(axis) = self.axis {
            write!(f, ".{}", axis.suffix())?;
        }
        Ok(())
    }
}

#[derive(Reflect, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plug {
    pub node: NodeRef,
    pub id: PlugId,
}

impl Plug {
    pub fn at(self, index: usize) -> Self {
        Self {
            id: self.id.at(index),
            ..self
        }
    }

    pub fn axis(self, axis: Axis) -> Self {
        Self {
            id: self.id.axis(axis),
            ..self
        }
    }

    pub fn without_axis(&self) -> Self {
        Self {
            node: self.node,
            id: self.id.without_axis(),
        }
    }

    pub fn attr(&self) -> &str {
        &self.id.attr
    }
}
