//! The matrix blend constraint every component is wired with.

use bevy::{log::debug, math::DMat4};
use rig_graph_builtin_nodes::BlendMatrixNode;
use rig_graph_core::scene::{NodeKind, NodeRef, Plug, Scene, SceneExt, attrs};
use serde::{Deserialize, Serialize};

use crate::errors::RigResult;

/// Where a constraint slot reads its world matrix from.
#[derive(Clone, Debug, PartialEq)]
pub enum MatrixSource {
    /// The world matrix of a transform.
    Transform(NodeRef),
    /// Any matrix valued plug.
    Plug(Plug),
    /// A constant.
    Value(DMat4),
}

impl MatrixSource {
    fn plug(&self) -> Option<Plug> {
        match self {
            MatrixSource::Transform(node) => Some(node.plug(attrs::WORLD_MATRIX)),
            MatrixSource::Plug(plug) => Some(plug.clone()),
            MatrixSource::Value(_) => None,
        }
    }

    fn matrix(&self, scene: &dyn Scene) -> RigResult<DMat4> {
        Ok(match self {
            MatrixSource::Transform(node) => scene.world_matrix(*node)?,
            MatrixSource::Plug(plug) => scene.get_matrix(plug.clone())?,
            MatrixSource::Value(matrix) => *matrix,
        })
    }
}

impl From<NodeRef> for MatrixSource {
    fn from(node: NodeRef) -> Self {
        MatrixSource::Transform(node)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintTarget {
    /// Drives the transform channels selected by the flags.
    Transform(NodeRef),
    /// Receives the blended result matrix.
    Plug(Plug),
}

impl From<NodeRef> for ConstraintTarget {
    fn from(node: NodeRef) -> Self {
        ConstraintTarget::Transform(node)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintFlags {
    pub translate: bool,
    pub rotate: bool,
    pub scale: bool,
    pub shear: bool,
    /// Freeze the current source to child offset when wiring.
    pub maintain_offset: bool,
}

impl ConstraintFlags {
    /// Every channel, no offset.
    pub const ALL: Self = Self {
        translate: true,
        rotate: true,
        scale: true,
        shear: true,
        maintain_offset: false,
    };

    pub fn with_offset(self) -> Self {
        Self {
            maintain_offset: true,
            ..self
        }
    }
}

impl Default for ConstraintFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Creates a [`BlendMatrixNode`] named `name` blending `sources` onto
/// `target`, and returns it so its blender can be driven.
///
/// Source `i` occupies slot `i`. The node's parent inverse follows the
/// target's parent, so the result lands in the target's local space wherever
/// the sources live. Joint targets also feed their joint orient back, so the
/// joint ends up on the blended matrix despite its baked orientation.
pub fn matrix_constraint(
    scene: &mut dyn Scene,
    name: &str,
    sources: &[MatrixSource],
    target: ConstraintTarget,
    flags: ConstraintFlags,
) -> RigResult<NodeRef> {
    let view: &dyn Scene = scene;
    let child_world = match &target {
        ConstraintTarget::Transform(node) => view.world_matrix(*node)?,
        ConstraintTarget::Plug(plug) => view.get_matrix(plug.clone())?,
    };
    let slots = sources
        .iter()
        .map(|source| {
            let world = source.matrix(view)?;
            let offset = if flags.maintain_offset {
                world.inverse() * child_world
            } else {
                DMat4::IDENTITY
            };
            Ok((source.plug(), world, offset))
        })
        .collect::<RigResult<Vec<_>>>()?;

    let blend = scene.create_node(NodeKind::BlendMatrix, name)?;
    debug!("Constraining {target:?} to {} sources through {name}", sources.len());

    for (index, (plug, world, offset)) in slots.into_iter().enumerate() {
        let slot = blend.plug(BlendMatrixNode::MATRIX_IN).at(index);
        match plug {
            Some(plug) => scene.connect(plug, slot)?,
            None => scene.set_value(slot, world)?,
        }
        scene.set_value(blend.plug(BlendMatrixNode::OFFSET).at(index), offset)?;
    }

    match target {
        ConstraintTarget::Plug(plug) => {
            scene.connect(blend.plug(BlendMatrixNode::RESULT), plug)?;
        }
        ConstraintTarget::Transform(child) => {
            scene.connect(
                child.plug(attrs::PARENT_INVERSE_MATRIX),
                blend.plug(BlendMatrixNode::PARENT_INVERSE),
            )?;
            scene.connect(
                child.plug(attrs::ROTATE_ORDER),
                blend.plug(BlendMatrixNode::ROTATE_ORDER),
            )?;
            if scene.node_kind(child)? == NodeKind::Joint {
                scene.connect(
                    child.plug(attrs::JOINT_ORIENT),
                    blend.plug(BlendMatrixNode::JOINT_ORIENT),
                )?;
            }

            for (enabled, output, channel) in [
                (flags.translate, BlendMatrixNode::TRANSLATE, attrs::TRANSLATE),
                (flags.rotate, BlendMatrixNode::ROTATE, attrs::ROTATE),
                (flags.scale, BlendMatrixNode::SCALE, attrs::SCALE),
                (flags.shear, BlendMatrixNode::SHEAR, attrs::SHEAR),
            ] {
                if enabled {
                    scene.connect(blend.plug(output), child.plug(channel))?;
                }
            }
        }
    }

    Ok(blend)
}

#[cfg(test)]
mod tests {
    use bevy::math::{DQuat, DVec3};
    use rig_graph_builtin_nodes::memory_scene;
    use rig_graph_core::{memory_scene::MemoryScene, scene::Space};

    use super::*;
    use crate::controller::{create_group, create_placed_joint};

    fn placed(scene: &mut MemoryScene, name: &str, world: DMat4) -> NodeRef {
        create_group(scene, name, world, None).unwrap()
    }

    #[test]
    fn single_source_passes_through() {
        let mut scene = memory_scene();
        let source_world = DMat4::from_scale_rotation_translation(
            DVec3::new(1., 2., 1.),
            DQuat::from_rotation_z(0.8),
            DVec3::new(1., 5., -2.),
        );
        let source = placed(&mut scene, "source", source_world);
        let parent = placed(
            &mut scene,
            "parent",
            DMat4::from_rotation_translation(DQuat::from_rotation_x(1.2), DVec3::X),
        );
        let child = create_group(&mut scene, "child", DMat4::IDENTITY, Some(parent)).unwrap();

        matrix_constraint(
            &mut scene,
            "child_blend",
            &[source.into()],
            child.into(),
            ConstraintFlags::ALL,
        )
        .unwrap();
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(source_world, 1e-9));

        let moved = DMat4::from_translation(DVec3::new(0., -3., 4.));
        scene.set_xform(source, moved, Space::World).unwrap();
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(moved, 1e-9));
    }

    #[test]
    fn two_sources_blend_by_slot() {
        let mut scene = memory_scene();
        let a = DMat4::from_rotation_translation(DQuat::IDENTITY, DVec3::new(0., 0., 0.));
        let b = DMat4::from_rotation_translation(
            DQuat::from_rotation_y(1.),
            DVec3::new(4., 2., 0.),
        );
        let source_a = placed(&mut scene, "a", a);
        let source_b = placed(&mut scene, "b", b);
        let child = placed(&mut scene, "child", DMat4::IDENTITY);

        let blend = matrix_constraint(
            &mut scene,
            "child_blend",
            &[source_a.into(), source_b.into()],
            child.into(),
            ConstraintFlags::ALL,
        )
        .unwrap();
        let blender = blend.plug(BlendMatrixNode::BLENDER);

        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(a, 1e-9));

        scene.set_value(blender.clone(), 1.).unwrap();
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(b, 1e-9));

        scene.set_value(blender.clone(), 0.5).unwrap();
        let halfway = scene.world_matrix(child).unwrap();
        let expected = DMat4::from_rotation_translation(
            DQuat::IDENTITY.slerp(DQuat::from_rotation_y(1.), 0.5),
            DVec3::new(2., 1., 0.),
        );
        assert!(halfway.abs_diff_eq(expected, 1e-9));

        // Past the last slot the blend stays on the last source.
        scene.set_value(blender, 5.).unwrap();
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(b, 1e-9));
    }

    #[test]
    fn maintained_offset_keeps_child_in_place() {
        let mut scene = memory_scene();
        let source = placed(&mut scene, "source", DMat4::from_rotation_z(0.5));
        let child_world = DMat4::from_rotation_translation(
            DQuat::from_rotation_x(0.2),
            DVec3::new(0., 3., 0.),
        );
        let child = create_placed_joint(&mut scene, "child", child_world, None).unwrap();

        matrix_constraint(
            &mut scene,
            "child_blend",
            &[source.into()],
            child.into(),
            ConstraintFlags::ALL.with_offset(),
        )
        .unwrap();
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(child_world, 1e-9));

        let source_world = DMat4::from_rotation_z(1.5);
        scene.set_xform(source, source_world, Space::World).unwrap();
        let expected = source_world * DMat4::from_rotation_z(0.5).inverse() * child_world;
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(expected, 1e-9));
    }

    #[test]
    fn plug_targets_receive_the_result() {
        let mut scene = memory_scene();
        let inverse = scene.create_node(NodeKind::InverseMatrix, "inverse").unwrap();
        let target = inverse.plug("input_matrix");
        let value = DMat4::from_translation(DVec3::new(1., 2., 3.));

        matrix_constraint(
            &mut scene,
            "blend",
            &[MatrixSource::Value(value)],
            ConstraintTarget::Plug(target.clone()),
            ConstraintFlags::ALL,
        )
        .unwrap();
        assert!(scene.get_matrix(target).unwrap().abs_diff_eq(value, 1e-9));
    }
}
