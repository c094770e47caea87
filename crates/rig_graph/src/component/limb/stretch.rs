use rig_graph_builtin_nodes::{
    AddF64, BlendMatrixNode, ClampF64, ComposeMatrixNode, DistanceBetweenNode, DivF64,
    MulF64, MultMatrixNode,
};
use rig_graph_core::scene::{Axis, NodeKind, NodeRef, Plug, SceneExt, attrs};

use crate::{component::BuildContext, errors::RigResult};

/// What the stretch network reads.
pub struct StretchInputs {
    /// Static transform at the limb start. Distances are measured in its
    /// space.
    pub root: NodeRef,
    pub pole: NodeRef,
    pub end: NodeRef,
    /// Signed rest translations of the mid and end joints.
    pub rest: [f64; 2],
    pub min_stretch: Plug,
    pub max_stretch: Plug,
    /// 0 stretches both segments evenly, 1 pins the mid joint to the pole.
    pub pv_lock: Plug,
    pub offsets: [Plug; 2],
}

/// Builds the stretch network and returns the plugs carrying the signed
/// translations for the mid and end joints.
///
/// In stretch mode the start to end distance over the rest length gives a
/// ratio, clamped to `[min_stretch, max_stretch]`, that scales both rest
/// lengths. In lock mode the segments measure start to pole and pole to end
/// instead. The two modes cross-fade by `pv_lock`; the user offsets are
/// added afterwards and the rest signs reapplied.
pub fn build_stretch(ctx: &mut BuildContext, inputs: &StretchInputs) -> RigResult<[Plug; 2]> {
    let lengths = inputs.rest.map(f64::abs);

    let end_local = local_matrix(ctx, "stretch_end_local", inputs.end, inputs.root)?;
    let pole_local = local_matrix(ctx, "stretch_pole_local", inputs.pole, inputs.root)?;

    let reach = distance(ctx, "stretch_distance", None, end_local.clone())?;
    let ratio = ctx.node(NodeKind::DivF64, "stretch_ratio")?;
    ctx.scene.connect(reach, ratio.plug(DivF64::INPUT_1))?;
    ctx.scene
        .set_value(ratio.plug(DivF64::INPUT_2), lengths[0] + lengths[1])?;

    let clamp = ctx.node(NodeKind::ClampF64, "stretch_clamp")?;
    ctx.scene
        .connect(ratio.plug(DivF64::OUTPUT), clamp.plug(ClampF64::INPUT))?;
    ctx.scene
        .connect(inputs.min_stretch.clone(), clamp.plug(ClampF64::CLAMP_MIN))?;
    ctx.scene
        .connect(inputs.max_stretch.clone(), clamp.plug(ClampF64::CLAMP_MAX))?;

    let stretch_mode = ctx.node(NodeKind::ComposeMatrix, "stretch_mode")?;
    let lock_mode = ctx.node(NodeKind::ComposeMatrix, "lock_mode")?;
    let lock_lengths = [
        distance(ctx, "lock_distance_a", None, pole_local.clone())?,
        distance(ctx, "lock_distance_b", Some(pole_local), end_local)?,
    ];

    for (segment, (axis, length)) in [Axis::X, Axis::Y].into_iter().zip(lengths).enumerate() {
        let scaled = ctx.node(NodeKind::MulF64, &format!("stretch_length{segment}"))?;
        ctx.scene
            .connect(clamp.plug(ClampF64::OUTPUT), scaled.plug(MulF64::INPUT_1))?;
        ctx.scene.set_value(scaled.plug(MulF64::INPUT_2), length)?;
        ctx.scene.connect(
            scaled.plug(MulF64::OUTPUT),
            stretch_mode.plug(ComposeMatrixNode::TRANSLATE).axis(axis),
        )?;
        ctx.scene.connect(
            lock_lengths[segment].clone(),
            lock_mode.plug(ComposeMatrixNode::TRANSLATE).axis(axis),
        )?;
    }

    let blend = ctx.node(NodeKind::BlendMatrix, "stretch_blend")?;
    for (index, mode) in [stretch_mode, lock_mode].into_iter().enumerate() {
        ctx.scene.connect(
            mode.plug(ComposeMatrixNode::OUTPUT),
            blend.plug(BlendMatrixNode::MATRIX_IN).at(index),
        )?;
    }
    ctx.scene
        .connect(inputs.pv_lock.clone(), blend.plug(BlendMatrixNode::BLENDER))?;

    Ok([
        signed_length(ctx, blend, inputs, 0, Axis::X)?,
        signed_length(ctx, blend, inputs, 1, Axis::Y)?,
    ])
}

/// Blended length of one segment plus its user offset, with the rest sign
/// restored.
fn signed_length(
    ctx: &mut BuildContext,
    blend: NodeRef,
    inputs: &StretchInputs,
    segment: usize,
    axis: Axis,
) -> RigResult<Plug> {
    let offset = ctx.node(NodeKind::AddF64, &format!("stretch_offset{segment}"))?;
    ctx.scene.connect(
        blend.plug(BlendMatrixNode::TRANSLATE).axis(axis),
        offset.plug(AddF64::INPUT_1),
    )?;
    ctx.scene
        .connect(inputs.offsets[segment].clone(), offset.plug(AddF64::INPUT_2))?;

    let signed = ctx.node(NodeKind::MulF64, &format!("stretch_signed{segment}"))?;
    ctx.scene
        .connect(offset.plug(AddF64::OUTPUT), signed.plug(MulF64::INPUT_1))?;
    ctx.scene.set_value(
        signed.plug(MulF64::INPUT_2),
        if inputs.rest[segment] < 0. { -1. } else { 1. },
    )?;
    Ok(signed.plug(MulF64::OUTPUT))
}

/// `node` world matrix in the space of `space`.
fn local_matrix(
    ctx: &mut BuildContext,
    suffix: &str,
    node: NodeRef,
    space: NodeRef,
) -> RigResult<Plug> {
    let mult = ctx.node(NodeKind::MultMatrix, suffix)?;
    ctx.scene.connect(
        node.plug(attrs::WORLD_MATRIX),
        mult.plug(MultMatrixNode::MATRIX_IN).at(0),
    )?;
    ctx.scene.connect(
        space.plug(attrs::WORLD_INVERSE_MATRIX),
        mult.plug(MultMatrixNode::MATRIX_IN).at(1),
    )?;
    Ok(mult.plug(MultMatrixNode::RESULT))
}

/// Distance between the origins of two matrices, the first defaulting to
/// identity.
fn distance(
    ctx: &mut BuildContext,
    suffix: &str,
    from: Option<Plug>,
    to: Plug,
) -> RigResult<Plug> {
    let node = ctx.node(NodeKind::DistanceBetween, suffix)?;
    if let Some(from) = from {
        ctx.scene
            .connect(from, node.plug(DistanceBetweenNode::MATRIX_1))?;
    }
    ctx.scene
        .connect(to, node.plug(DistanceBetweenNode::MATRIX_2))?;
    Ok(node.plug(DistanceBetweenNode::DISTANCE))
}
