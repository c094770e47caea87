use bevy::math::{DMat4, DVec3};
use rig_graph_core::{
    parameters::Matrix,
    scene::{Axis, NodeRef, Scene, SceneExt, Space},
};
use serde::{Deserialize, Serialize};

use crate::errors::{RigError, RigResult};

/// A placement transform authored in the scene before the rig is built.
///
/// A mirrored guide reads the same scene node, reflected to the other side
/// of the character.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guide {
    pub name: String,
    #[serde(default)]
    pub mirror: bool,
}

impl Guide {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mirror: false,
        }
    }

    /// Creates the guide node at `world`.
    pub fn create(scene: &mut dyn Scene, name: &str, world: DMat4) -> RigResult<Self> {
        let node = scene.create_transform(name)?;
        scene.set_xform(node, world, Space::World)?;
        Ok(Self::new(name))
    }

    pub fn mirrored(&self) -> Self {
        Self {
            name: self.name.clone(),
            mirror: !self.mirror,
        }
    }

    pub fn node(&self, scene: &dyn Scene) -> RigResult<NodeRef> {
        scene
            .find(&self.name)
            .ok_or_else(|| RigError::MissingGuide(self.name.clone()))
    }

    /// World matrix as found in the scene, mirrored if flagged.
    pub fn raw_matrix(&self, scene: &dyn Scene) -> RigResult<Matrix> {
        let world = Matrix::from_dmat4(scene.world_matrix(self.node(scene)?)?);
        Ok(if self.mirror {
            world.mirror_axis(Axis::X)
        } else {
            world
        })
    }

    /// World matrix with unit basis vectors.
    pub fn matrix(&self, scene: &dyn Scene) -> RigResult<DMat4> {
        Ok(self.raw_matrix(scene)?.normalize().to_dmat4())
    }

    pub fn position(&self, scene: &dyn Scene) -> RigResult<DVec3> {
        Ok(self.raw_matrix(scene)?.translation())
    }

    /// Mean length of the basis vectors, i.e. the uniform scale the author
    /// gave the guide.
    pub fn size(&self, scene: &dyn Scene) -> RigResult<f64> {
        let matrix = self.raw_matrix(scene)?;
        Ok(Axis::ALL
            .iter()
            .map(|axis| matrix.basis(*axis).length())
            .sum::<f64>()
            / 3.)
    }
}
