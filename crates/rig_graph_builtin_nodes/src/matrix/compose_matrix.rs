use bevy::{
    math::DVec3,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
    transform::{RotateOrder, TransformChannels},
};

#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct ComposeMatrixNode;

impl ComposeMatrixNode {
    pub const TRANSLATE: &'static str = "translate";
    pub const ROTATE: &'static str = "rotate";
    pub const ROTATE_ORDER: &'static str = "rotate_order";
    pub const SCALE: &'static str = "scale";
    pub const SHEAR: &'static str = "shear";
    pub const OUTPUT: &'static str = "output_matrix";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for ComposeMatrixNode {
    fn display_name(&self) -> String {
        "Compose Matrix".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let channels = TransformChannels {
            translate: ctx.data_back(Self::TRANSLATE)?.as_vec3()?,
            rotate: ctx.data_back(Self::ROTATE)?.as_vec3()?,
            rotate_order: RotateOrder::from_index(ctx.data_back(Self::ROTATE_ORDER)?.as_int()?),
            scale: ctx.data_back(Self::SCALE)?.as_vec3()?,
            shear: ctx.data_back(Self::SHEAR)?.as_vec3()?,
            joint_orient: None,
        };
        ctx.set_data_fwd(Self::OUTPUT, channels.local_matrix());
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::TRANSLATE, DataSpec::Vec3)
            .add_input_data(Self::ROTATE, DataSpec::Vec3)
            .add_input_data(Self::ROTATE_ORDER, DataSpec::Int)
            .add_input_default(Self::SCALE, DVec3::ONE)
            .add_input_data(Self::SHEAR, DataSpec::Vec3)
            .add_output_data(Self::OUTPUT, DataSpec::Matrix);
        Ok(())
    }
}
