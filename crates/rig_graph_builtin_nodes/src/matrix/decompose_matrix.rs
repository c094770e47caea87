use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
    transform::{Decomposed, RotateOrder},
};

#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct DecomposeMatrixNode;

impl DecomposeMatrixNode {
    pub const INPUT: &'static str = "input_matrix";
    pub const ROTATE_ORDER: &'static str = "rotate_order";

    pub const TRANSLATE: &'static str = "translate";
    pub const ROTATE: &'static str = "rotate";
    pub const SCALE: &'static str = "scale";
    pub const SHEAR: &'static str = "shear";
    pub const QUAT: &'static str = "quat";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for DecomposeMatrixNode {
    fn display_name(&self) -> String {
        "Decompose Matrix".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let input = ctx.data_back(Self::INPUT)?.as_matrix()?;
        let rotate_order = RotateOrder::from_index(ctx.data_back(Self::ROTATE_ORDER)?.as_int()?);
        let decomposed = Decomposed::from_matrix(input);

        ctx.set_data_fwd(Self::TRANSLATE, decomposed.translate);
        ctx.set_data_fwd(Self::ROTATE, rotate_order.to_euler(decomposed.rotate));
        ctx.set_data_fwd(Self::SCALE, decomposed.scale);
        ctx.set_data_fwd(Self::SHEAR, decomposed.shear);
        ctx.set_data_fwd(Self::QUAT, decomposed.rotate);
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::INPUT, DataSpec::Matrix)
            .add_input_data(Self::ROTATE_ORDER, DataSpec::Int);

        ctx.add_output_data(Self::TRANSLATE, DataSpec::Vec3)
            .add_output_data(Self::ROTATE, DataSpec::Vec3)
            .add_output_data(Self::SCALE, DataSpec::Vec3)
            .add_output_data(Self::SHEAR, DataSpec::Vec3)
            .add_output_data(Self::QUAT, DataSpec::Quat);
        Ok(())
    }
}
