use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
};

#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct InverseMatrixNode;

impl InverseMatrixNode {
    pub const INPUT: &'static str = "input_matrix";
    pub const OUTPUT: &'static str = "output_matrix";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for InverseMatrixNode {
    fn display_name(&self) -> String {
        "Inverse Matrix".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let input = ctx.data_back(Self::INPUT)?.as_matrix()?;
        ctx.set_data_fwd(Self::OUTPUT, input.inverse());
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::INPUT, DataSpec::Matrix)
            .add_output_data(Self::OUTPUT, DataSpec::Matrix);
        Ok(())
    }
}
