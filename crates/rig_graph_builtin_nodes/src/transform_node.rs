use bevy::{
    math::DVec3,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
    scene::attrs,
    transform::{RotateOrder, TransformChannels},
};

/// A transform or skeleton joint in the scene hierarchy.
///
/// Parent matrices are answered by the scene straight from the hierarchy;
/// the node still writes them so every output is available after an
/// update.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct TransformNode {
    pub joint: bool,
}

impl TransformNode {
    pub const TRANSLATE: &'static str = attrs::TRANSLATE;
    pub const ROTATE: &'static str = attrs::ROTATE;
    pub const SCALE: &'static str = attrs::SCALE;
    pub const SHEAR: &'static str = attrs::SHEAR;
    pub const ROTATE_ORDER: &'static str = attrs::ROTATE_ORDER;
    pub const VISIBILITY: &'static str = attrs::VISIBILITY;
    pub const JOINT_ORIENT: &'static str = attrs::JOINT_ORIENT;
    pub const RECEIVER: &'static str = attrs::RECEIVER;

    pub const MATRIX: &'static str = attrs::MATRIX;
    pub const WORLD_MATRIX: &'static str = attrs::WORLD_MATRIX;
    pub const WORLD_INVERSE_MATRIX: &'static str = attrs::WORLD_INVERSE_MATRIX;
    pub const PARENT_MATRIX: &'static str = attrs::PARENT_MATRIX;
    pub const PARENT_INVERSE_MATRIX: &'static str = attrs::PARENT_INVERSE_MATRIX;

    pub fn transform() -> Self {
        Self { joint: false }
    }

    pub fn joint() -> Self {
        Self { joint: true }
    }
}

impl NodeLike for TransformNode {
    fn display_name(&self) -> String {
        if self.joint { "Joint" } else { "Transform" }.into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let joint_orient = if self.joint {
            Some(ctx.data_back(Self::JOINT_ORIENT)?.as_vec3()?)
        } else {
            None
        };
        let channels = TransformChannels {
            translate: ctx.data_back(Self::TRANSLATE)?.as_vec3()?,
            rotate: ctx.data_back(Self::ROTATE)?.as_vec3()?,
            rotate_order: RotateOrder::from_index(ctx.data_back(Self::ROTATE_ORDER)?.as_int()?),
            scale: ctx.data_back(Self::SCALE)?.as_vec3()?,
            shear: ctx.data_back(Self::SHEAR)?.as_vec3()?,
            joint_orient,
        };

        let local = channels.local_matrix();
        let parent = ctx.parent_world_matrix()?;
        let world = parent * local;

        ctx.set_data_fwd(Self::MATRIX, local);
        ctx.set_data_fwd(Self::WORLD_MATRIX, world);
        ctx.set_data_fwd(Self::WORLD_INVERSE_MATRIX, world.inverse());
        ctx.set_data_fwd(Self::PARENT_MATRIX, parent);
        ctx.set_data_fwd(Self::PARENT_INVERSE_MATRIX, parent.inverse());
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::TRANSLATE, DataSpec::Vec3)
            .add_input_data(Self::ROTATE, DataSpec::Vec3)
            .add_input_default(Self::SCALE, DVec3::ONE)
            .add_input_data(Self::SHEAR, DataSpec::Vec3)
            .add_input_data(Self::ROTATE_ORDER, DataSpec::Int)
            .add_input_default(Self::VISIBILITY, true)
            .add_input_multi(Self::RECEIVER, DataSpec::Message);
        if self.joint {
            ctx.add_input_data(Self::JOINT_ORIENT, DataSpec::Vec3);
        }

        ctx.add_output_data(Self::MATRIX, DataSpec::Matrix)
            .add_output_data(Self::WORLD_MATRIX, DataSpec::Matrix)
            .add_output_data(Self::WORLD_INVERSE_MATRIX, DataSpec::Matrix)
            .add_output_data(Self::PARENT_MATRIX, DataSpec::Matrix)
            .add_output_data(Self::PARENT_INVERSE_MATRIX, DataSpec::Matrix);
        Ok(())
    }
}
