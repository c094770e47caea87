use bevy::{
    log::warn,
    math::{DMat3, DQuat, DVec3},
    reflect::{Reflect, std_traits::ReflectDefault},
};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
    transform::Decomposed,
};

/// Rotates `input_matrix` in place so that its primary axis points at the
/// primary target and its secondary axis leans towards the secondary target.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct AimMatrixNode;

impl AimMatrixNode {
    pub const INPUT: &'static str = "input_matrix";
    pub const PRIMARY_TARGET: &'static str = "primary_target_matrix";
    pub const PRIMARY_AXIS: &'static str = "primary_input_axis";
    pub const SECONDARY_TARGET: &'static str = "secondary_target_matrix";
    pub const SECONDARY_AXIS: &'static str = "secondary_input_axis";
    pub const OUTPUT: &'static str = "output_matrix";

    pub fn new() -> Self {
        Self
    }
}

/// Rotation taking the `(primary, secondary)` local frame onto the given
/// world directions. The secondary directions only need to be off the
/// primary ones.
pub fn frame_alignment(
    local_primary: DVec3,
    local_secondary: DVec3,
    world_primary: DVec3,
    world_secondary: DVec3,
) -> DQuat {
    frame(world_primary, world_secondary) * frame(local_primary, local_secondary).inverse()
}

fn frame(primary: DVec3, secondary: DVec3) -> DQuat {
    let x = primary.normalize_or(DVec3::X);
    let y = secondary
        .reject_from(x)
        .try_normalize()
        .unwrap_or_else(|| x.any_orthonormal_vector());
    DQuat::from_mat3(&DMat3::from_cols(x, y, x.cross(y))).normalize()
}

impl NodeLike for AimMatrixNode {
    fn display_name(&self) -> String {
        "Aim Matrix".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let input = Decomposed::from_matrix(ctx.data_back(Self::INPUT)?.as_matrix()?);
        let primary_target = ctx.data_back(Self::PRIMARY_TARGET)?.as_matrix()?;
        let secondary_target = ctx.data_back(Self::SECONDARY_TARGET)?.as_matrix()?;
        let primary_axis = ctx.data_back(Self::PRIMARY_AXIS)?.as_vec3()?;
        let secondary_axis = ctx.data_back(Self::SECONDARY_AXIS)?.as_vec3()?;

        let position = input.translate;
        let aim = primary_target.w_axis.truncate() - position;
        let up = secondary_target.w_axis.truncate() - position;

        let rotate = if aim.length_squared() <= f64::EPSILON {
            warn!("Aim target coincides with the aimed matrix, keeping its rotation");
            input.rotate
        } else {
            let up = if up.cross(aim).length_squared() <= f64::EPSILON {
                input.rotate * secondary_axis
            } else {
                up
            };
            frame_alignment(primary_axis, secondary_axis, aim, up)
        };

        let aimed = Decomposed { rotate, ..input };
        ctx.set_data_fwd(Self::OUTPUT, aimed.compose());
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::INPUT, DataSpec::Matrix)
            .add_input_data(Self::PRIMARY_TARGET, DataSpec::Matrix)
            .add_input_default(Self::PRIMARY_AXIS, DVec3::X)
            .add_input_data(Self::SECONDARY_TARGET, DataSpec::Matrix)
            .add_input_default(Self::SECONDARY_AXIS, DVec3::Y)
            .add_output_data(Self::OUTPUT, DataSpec::Matrix);
        Ok(())
    }
}
