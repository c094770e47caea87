//! # Rig Graph Core
//!
//! Value types and the host-agnostic scene model used to build character
//! rigs as dataflow graphs of matrix operations.
//!
//! - [`parameters`]: validated, mirrorable values (sides, names, colors,
//!   matrices) that configure rig components.
//! - [`scene`]: the [`Scene`](scene::Scene) backend contract, with typed
//!   [`NodeRef`](scene::NodeRef) / [`Plug`](scene::Plug) handles.
//! - [`node`]: the [`NodeLike`](node::NodeLike) trait implemented by every
//!   evaluable node type and the registry mapping node kinds to them.
//! - [`memory_scene`]: an in-process scene backend with lazy evaluation.
//! - [`transform`]: rotate orders and transform (de)composition.

pub mod edge_data;
pub mod errors;
pub mod memory_scene;
pub mod node;
pub mod parameters;
pub mod scene;
pub mod transform;

pub mod prelude {
    pub use crate::edge_data::{DataSpec, DataValue};
    pub use crate::errors::{GraphValidationError, ParameterError, SceneError, SceneResult};
    pub use crate::memory_scene::MemoryScene;
    pub use crate::node::{NodeContext, NodeLike, NodeRegistry, SpecContext};
    pub use crate::parameters::{
        Color, Index, Matrix, Name, Parameter, Side, UnsignedFloat, Vector,
    };
    pub use crate::scene::{
        AttributeSpec, Axis, NodeKind, NodeRef, Plug, PlugId, Scene, SceneExt, Space, attrs,
    };
    pub use crate::transform::{Decomposed, InterpolateLinear, RotateOrder, TransformChannels};
}
