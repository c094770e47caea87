//! Wiring between the published collections of built components.

use bevy::log::debug;
use indexmap::IndexMap;
use rig_graph_core::scene::{NodeRef, Scene};
use serde::{Deserialize, Serialize};

use crate::{
    component::{BuiltComponent, StorageKind},
    constraint::{ConstraintFlags, ConstraintTarget, MatrixSource, matrix_constraint},
    errors::{RigError, RigResult},
};

/// One entry of a component collection, addressed by builder key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageRef {
    pub component: String,
    pub storage: StorageKind,
    #[serde(default)]
    pub index: usize,
}

impl StorageRef {
    pub fn new(component: impl Into<String>, storage: StorageKind, index: usize) -> Self {
        Self {
            component: component.into(),
            storage,
            index,
        }
    }

    pub fn outputs(component: impl Into<String>, index: usize) -> Self {
        Self::new(component, StorageKind::Outputs, index)
    }

    pub fn inputs(component: impl Into<String>, index: usize) -> Self {
        Self::new(component, StorageKind::Inputs, index)
    }

    fn resolve(
        &self,
        connection: &str,
        components: &IndexMap<String, BuiltComponent>,
    ) -> RigResult<(NodeRef, String)> {
        let built = components
            .get(&self.component)
            .ok_or_else(|| RigError::MissingComponent {
                connection: connection.to_string(),
                component: self.component.clone(),
            })?;
        Ok((built.entry(self.storage, self.index)?, built.name.clone()))
    }
}

/// Constrains one component entry to one or more others.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub sources: Vec<StorageRef>,
    pub target: StorageRef,
    #[serde(default = "default_flags")]
    pub flags: ConstraintFlags,
    /// Also wire the mirrored components.
    #[serde(default)]
    pub bilateral: bool,
}

fn default_flags() -> ConstraintFlags {
    ConstraintFlags::ALL.with_offset()
}

impl Connection {
    pub fn new(sources: Vec<StorageRef>, target: StorageRef) -> Self {
        Self {
            sources,
            target,
            flags: default_flags(),
            bilateral: false,
        }
    }

    pub fn with_flags(self, flags: ConstraintFlags) -> Self {
        Self { flags, ..self }
    }

    pub fn bilateral(self) -> Self {
        Self {
            bilateral: true,
            ..self
        }
    }

    /// Builder keys of every component this connection touches.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .chain(std::iter::once(&self.target))
            .map(|entry| entry.component.as_str())
    }

    /// Resolves every entry first, so a bad reference leaves the scene
    /// untouched, then wires the constraint.
    pub fn build(
        &self,
        name: &str,
        scene: &mut dyn Scene,
        components: &IndexMap<String, BuiltComponent>,
    ) -> RigResult<NodeRef> {
        let sources = self
            .sources
            .iter()
            .map(|source| Ok(MatrixSource::Transform(source.resolve(name, components)?.0)))
            .collect::<RigResult<Vec<_>>>()?;
        let (target, target_name) = self.target.resolve(name, components)?;

        debug!("Connecting {} sources into {target_name}", sources.len());
        matrix_constraint(
            scene,
            &format!("{name}_{target_name}_blend"),
            &sources,
            ConstraintTarget::Transform(target),
            self.flags,
        )
    }
}
