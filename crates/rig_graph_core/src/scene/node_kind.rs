use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

/// Every type of node a scene backend can create.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Transform,
    Joint,
    BlendMatrix,
    MultMatrix,
    InverseMatrix,
    ComposeMatrix,
    DecomposeMatrix,
    AimMatrix,
    IkHandle,
    DistanceBetween,
    AddF64,
    SubF64,
    MulF64,
    DivF64,
    ClampF64,
    ReverseF64,
}

impl NodeKind {
    /// Transforms and joints take part in the hierarchy.
    pub fn is_transform(&self) -> bool {
        matches!(self, NodeKind::Transform | NodeKind::Joint)
    }
}
