//! # Rig Graph
//!
//! Builds animatable character rigs from placement guides. Each
//! [`Component`](component::Component) reads its guides from a
//! [`Scene`](rig_graph_core::scene::Scene), creates controllers, joints and
//! the matrix blend network driving them, and publishes the result in a
//! folder other components can connect to.
//!
//! - [`constraint`]: the multi source matrix blend constraint.
//! - [`component`]: the component model and the component catalogue.
//! - [`builder`]: whole rigs, with mirrored components and connections.
//! - [`serial`]: RON documents for builders and guide placement.

pub mod builder;
pub mod component;
pub mod connection;
pub mod constraint;
pub mod controller;
pub mod errors;
pub mod guide;
pub mod serial;

pub mod prelude {
    pub use crate::builder::{BuiltRig, ComponentBuilder};
    pub use crate::component::{
        Arm, BuiltComponent, Clavicle, Component, ComponentKind, FkChain, Hand, Leg, LegGuides,
        Limb, LimbConfig, LimbGuides, OneCtrl, StorageKind, owner_of,
    };
    pub use crate::connection::{Connection, StorageRef};
    pub use crate::constraint::{ConstraintFlags, ConstraintTarget, MatrixSource, matrix_constraint};
    pub use crate::errors::{RigError, RigResult};
    pub use crate::guide::Guide;
    pub use crate::serial::{GuideSnapshot, RigDocument};
    pub use rig_graph_builtin_nodes::memory_scene;
    pub use rig_graph_core::prelude::*;
}
