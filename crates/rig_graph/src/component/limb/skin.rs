use bevy::math::{DMat4, DQuat};
use rig_graph_builtin_nodes::{BlendMatrixNode, DecomposeMatrixNode, MultMatrixNode};
use rig_graph_core::{
    scene::{Axis, NodeKind, NodeRef, SceneExt, attrs},
    transform::{Decomposed, RotateOrder},
};

use super::LimbPlan;
use crate::{
    component::BuildContext,
    constraint::ConstraintFlags,
    errors::RigResult,
};

/// Segment interpolated skin joints along both limb segments.
///
/// Each segment gets a start and an end frame. Roll about the bone is kept
/// off the start frame and put on the end frame, so the joints blended in
/// between spread the twist along the segment. The first segment measures
/// its start against a static rest frame and splits bend (Y, Z) from roll
/// (X) with an XYZ decomposition. The second starts on the mid joint and
/// reads the end joint's roll with a ZYX decomposition.
pub fn build_skin(
    ctx: &mut BuildContext,
    plan: &LimbPlan,
    root: NodeRef,
    result: [NodeRef; 3],
) -> RigResult<Vec<NodeRef>> {
    // Segment A: start -> mid.
    let rest = ctx.group("skin_a_rest", plan.frames[0], Some(root))?;
    let start_a = ctx.group("skin_a_start", plan.frames[0], Some(root))?;
    let relative_a = ctx.node(NodeKind::MultMatrix, "skin_a_relative")?;
    ctx.scene.connect(
        result[0].plug(attrs::WORLD_MATRIX),
        relative_a.plug(MultMatrixNode::MATRIX_IN).at(0),
    )?;
    ctx.scene.connect(
        rest.plug(attrs::WORLD_INVERSE_MATRIX),
        relative_a.plug(MultMatrixNode::MATRIX_IN).at(1),
    )?;
    let decompose_a = ctx.node(NodeKind::DecomposeMatrix, "skin_a_decompose")?;
    ctx.scene.connect(
        relative_a.plug(MultMatrixNode::RESULT),
        decompose_a.plug(DecomposeMatrixNode::INPUT),
    )?;
    ctx.scene.set_value(
        decompose_a.plug(DecomposeMatrixNode::ROTATE_ORDER),
        RotateOrder::Xyz.to_index(),
    )?;
    for axis in [Axis::Y, Axis::Z] {
        ctx.scene.connect(
            decompose_a.plug(DecomposeMatrixNode::ROTATE).axis(axis),
            start_a.plug(attrs::ROTATE).axis(axis),
        )?;
    }

    let end_a = ctx.group(
        "skin_a_end",
        with_rotation_of(plan.frames[0], plan.frames[1]),
        Some(start_a),
    )?;
    ctx.scene.connect(
        result[1].plug(attrs::TRANSLATE),
        end_a.plug(attrs::TRANSLATE),
    )?;
    ctx.scene.connect(
        decompose_a.plug(DecomposeMatrixNode::ROTATE).axis(Axis::X),
        end_a.plug(attrs::ROTATE).axis(Axis::X),
    )?;

    // Segment B: mid -> end.
    let start_b = ctx.group("skin_b_start", plan.frames[1], Some(result[1]))?;
    let end_b = ctx.group(
        "skin_b_end",
        with_rotation_of(plan.frames[1], plan.frames[2]),
        Some(start_b),
    )?;
    let rest_b = Decomposed::from_matrix(plan.frames[1].inverse() * plan.frames[2]).rotate;
    let relative_b = ctx.node(NodeKind::MultMatrix, "skin_b_relative")?;
    ctx.scene.connect(
        result[2].plug(attrs::WORLD_MATRIX),
        relative_b.plug(MultMatrixNode::MATRIX_IN).at(0),
    )?;
    ctx.scene.connect(
        result[1].plug(attrs::WORLD_INVERSE_MATRIX),
        relative_b.plug(MultMatrixNode::MATRIX_IN).at(1),
    )?;
    ctx.scene.set_value(
        relative_b.plug(MultMatrixNode::MATRIX_IN).at(2),
        DMat4::from_quat(rest_b.inverse()),
    )?;
    let decompose_b = ctx.node(NodeKind::DecomposeMatrix, "skin_b_decompose")?;
    ctx.scene.connect(
        relative_b.plug(MultMatrixNode::RESULT),
        decompose_b.plug(DecomposeMatrixNode::INPUT),
    )?;
    ctx.scene.set_value(
        decompose_b.plug(DecomposeMatrixNode::ROTATE_ORDER),
        RotateOrder::Zyx.to_index(),
    )?;
    ctx.scene.connect(
        result[2].plug(attrs::TRANSLATE),
        end_b.plug(attrs::TRANSLATE),
    )?;
    ctx.scene.connect(
        decompose_b.plug(DecomposeMatrixNode::ROTATE).axis(Axis::X),
        end_b.plug(attrs::ROTATE).axis(Axis::X),
    )?;

    let sections = [plan.config.first_section, plan.config.second_section];
    let mut joints = segment_joints(ctx, "skin_a", root, [start_a, end_a], sections[0])?;
    joints.extend(segment_joints(ctx, "skin_b", root, [start_b, end_b], sections[1])?);
    Ok(joints)
}

/// `position`'s translation with `frame`'s rotation.
fn with_rotation_of(frame: DMat4, position: DMat4) -> DMat4 {
    DMat4::from_cols(frame.x_axis, frame.y_axis, frame.z_axis, position.w_axis)
}

/// `sections + 1` joints evenly blended from `ends[0]` to `ends[1]`.
fn segment_joints(
    ctx: &mut BuildContext,
    prefix: &str,
    parent: NodeRef,
    ends: [NodeRef; 2],
    sections: u32,
) -> RigResult<Vec<NodeRef>> {
    let view = ctx.view();
    let start = Decomposed::from_matrix(view.world_matrix(ends[0])?);
    let end = Decomposed::from_matrix(view.world_matrix(ends[1])?);

    (0..=sections)
        .map(|i| {
            let blender = f64::from(i) / f64::from(sections);
            let rest = Decomposed {
                translate: start.translate.lerp(end.translate, blender),
                rotate: DQuat::slerp(start.rotate, end.rotate, blender),
                ..start
            };
            let joint = ctx.joint(&format!("{prefix}{i}"), rest.compose(), Some(parent))?;
            let blend = ctx.constraint(
                &format!("{prefix}{i}_blend"),
                &[ends[0].into(), ends[1].into()],
                joint,
                ConstraintFlags::ALL,
            )?;
            ctx.scene
                .set_value(blend.plug(BlendMatrixNode::BLENDER), blender)?;
            Ok(joint)
        })
        .collect()
}
