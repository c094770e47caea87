use bevy::{
    log::warn,
    math::{DMat4, DQuat, DVec3},
    reflect::{Reflect, std_traits::ReflectDefault},
};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
    transform::{Decomposed, RotateOrder, orient_to_quat},
};

use serde::{Deserialize, Serialize};

use crate::frame_alignment;

/// Solver used by [`IkHandleNode`]: single chain, or rotate plane with a
/// pole vector.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IkSolver {
    SingleChain,
    #[default]
    RotatePlane,
}

impl IkSolver {
    pub fn to_index(self) -> i64 {
        match self {
            IkSolver::SingleChain => 0,
            IkSolver::RotatePlane => 1,
        }
    }

    pub fn from_index(index: i64) -> Self {
        match index {
            0 => IkSolver::SingleChain,
            _ => IkSolver::RotatePlane,
        }
    }
}

/// Two-bone IK over a start, mid and end joint.
///
/// The chain is read from the joints' translates and orients, expressed
/// under `parent_matrix` (the world matrix of the start joint's parent).
/// The outputs are the rotate channels (XYZ order) that put the end joint on
/// the target, bending in the plane through the pole vector for the rotate
/// plane solver or the rest plane for the single chain solver.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct IkHandleNode;

impl IkHandleNode {
    pub const PARENT_MATRIX: &'static str = "parent_matrix";
    pub const START_TRANSLATE: &'static str = "start_translate";
    pub const START_ORIENT: &'static str = "start_orient";
    pub const MID_TRANSLATE: &'static str = "mid_translate";
    pub const MID_ORIENT: &'static str = "mid_orient";
    pub const END_TRANSLATE: &'static str = "end_translate";
    pub const TARGET_MATRIX: &'static str = "target_matrix";
    pub const POLE_MATRIX: &'static str = "pole_matrix";
    pub const SOLVER: &'static str = "solver";
    pub const TWIST: &'static str = "twist";

    pub const START_ROTATE: &'static str = "start_rotate";
    pub const MID_ROTATE: &'static str = "mid_rotate";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for IkHandleNode {
    fn display_name(&self) -> String {
        "IK Handle".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let parent = ctx.data_back(Self::PARENT_MATRIX)?.as_matrix()?;
        let start_orient = orient_to_quat(ctx.data_back(Self::START_ORIENT)?.as_vec3()?);
        let mid_orient = orient_to_quat(ctx.data_back(Self::MID_ORIENT)?.as_vec3()?);

        let start = parent
            * DMat4::from_rotation_translation(
                start_orient,
                ctx.data_back(Self::START_TRANSLATE)?.as_vec3()?,
            );
        let mid = start
            * DMat4::from_rotation_translation(
                mid_orient,
                ctx.data_back(Self::MID_TRANSLATE)?.as_vec3()?,
            );
        let end = mid.transform_point3(ctx.data_back(Self::END_TRANSLATE)?.as_vec3()?);

        let target = ctx.data_back(Self::TARGET_MATRIX)?.as_matrix()?.w_axis.truncate();
        let pole = match IkSolver::from_index(ctx.data_back(Self::SOLVER)?.as_int()?) {
            IkSolver::SingleChain => None,
            IkSolver::RotatePlane => {
                Some(ctx.data_back(Self::POLE_MATRIX)?.as_matrix()?.w_axis.truncate())
            }
        };
        let twist = ctx.data_back(Self::TWIST)?.as_f64()?;

        let (root_swing, mid_swing) = two_bone_ik(
            start.w_axis.truncate(),
            mid.w_axis.truncate(),
            end,
            target,
            pole,
            twist,
        );

        let parent_rotation = Decomposed::from_matrix(parent).rotate;
        let start_world = root_swing * Decomposed::from_matrix(start).rotate;
        let mid_world = mid_swing * root_swing * Decomposed::from_matrix(mid).rotate;

        let start_rotate = start_orient.inverse() * parent_rotation.inverse() * start_world;
        let mid_rotate = mid_orient.inverse() * start_world.inverse() * mid_world;

        ctx.set_data_fwd(
            Self::START_ROTATE,
            RotateOrder::Xyz.to_euler(start_rotate.normalize()),
        );
        ctx.set_data_fwd(
            Self::MID_ROTATE,
            RotateOrder::Xyz.to_euler(mid_rotate.normalize()),
        );
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::PARENT_MATRIX, DataSpec::Matrix)
            .add_input_data(Self::START_TRANSLATE, DataSpec::Vec3)
            .add_input_data(Self::START_ORIENT, DataSpec::Vec3)
            .add_input_data(Self::MID_TRANSLATE, DataSpec::Vec3)
            .add_input_data(Self::MID_ORIENT, DataSpec::Vec3)
            .add_input_data(Self::END_TRANSLATE, DataSpec::Vec3)
            .add_input_data(Self::TARGET_MATRIX, DataSpec::Matrix)
            .add_input_data(Self::POLE_MATRIX, DataSpec::Matrix)
            .add_input_default(Self::SOLVER, IkSolver::default().to_index())
            .add_input_data(Self::TWIST, DataSpec::F64);

        ctx.add_output_data(Self::START_ROTATE, DataSpec::Vec3)
            .add_output_data(Self::MID_ROTATE, DataSpec::Vec3);
        Ok(())
    }
}

/// World space rotations to apply to the root joint, and then to the mid
/// joint, so that the end reaches `target` (as far as the bone lengths
/// allow).
///
/// Adapted from https://blog.littlepolygon.com/posts/twobone/
pub fn two_bone_ik(
    root: DVec3,
    mid: DVec3,
    end: DVec3,
    target: DVec3,
    pole: Option<DVec3>,
    twist: f64,
) -> (DQuat, DQuat) {
    // compute bone lengths
    let upper_len = root.distance(mid);
    let lower_len = mid.distance(end);
    if upper_len <= f64::EPSILON || lower_len <= f64::EPSILON {
        warn!("IK chain has a zero-length bone, leaving it unsolved");
        return (DQuat::IDENTITY, DQuat::IDENTITY);
    }

    // compute input planar basis vectors
    let to_end = (end - root).normalize_or(mid - root);
    let in_pole_vec = (mid - root)
        .reject_from(to_end)
        .try_normalize()
        .unwrap_or_else(|| {
            warn!("IK chain is straight at rest, bending along an arbitrary axis");
            to_end.any_orthonormal_vector()
        });

    // compute final planar basis vectors
    let to_target_offset = target - root;
    let to_target = to_target_offset.try_normalize().unwrap_or(to_end);
    let to_target_dist = to_target_offset
        .length()
        .clamp((upper_len - lower_len).abs(), upper_len + lower_len);

    let to_target_swing = DQuat::from_rotation_arc(to_end, to_target);
    let swung_pole_vec = to_target_swing * in_pole_vec;
    let out_pole_vec = match pole {
        Some(pole) => (pole - root)
            .reject_from(to_target)
            .try_normalize()
            .unwrap_or(swung_pole_vec),
        None => swung_pole_vec,
    };
    let out_pole_vec = DQuat::from_axis_angle(to_target, twist) * out_pole_vec;

    // apply law of cosines to get middle joint angle
    let cos_angle = ((to_target_dist * to_target_dist + upper_len * upper_len
        - lower_len * lower_len)
        / (2. * upper_len * to_target_dist))
        .clamp(-1., 1.);
    let angle = cos_angle.acos();

    // compute final joint positions
    let out_mid = root
        + upper_len * cos_angle * to_target
        + upper_len * angle.sin() * out_pole_vec;
    let out_end = root + to_target * to_target_dist;

    // compute final rotations, keeping the bend plane normal in step
    let in_normal = to_end.cross(in_pole_vec);
    let out_normal = to_target.cross(out_pole_vec);
    let root_swing = frame_alignment(mid - root, in_normal, out_mid - root, out_normal);

    let swung_end = root + root_swing * (end - root);
    let mid_swing = frame_alignment(
        swung_end - out_mid,
        out_normal,
        out_end - out_mid,
        out_normal,
    );

    (root_swing, mid_swing)
}
