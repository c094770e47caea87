use bevy::{
    math::DMat4,
    reflect::{Reflect, std_traits::ReflectDefault},
};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
};

/// Chains transforms: `matrix_in[0]` is applied first, then `matrix_in[1]`,
/// and so on.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct MultMatrixNode;

impl MultMatrixNode {
    pub const MATRIX_IN: &'static str = "matrix_in";
    pub const RESULT: &'static str = "result";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for MultMatrixNode {
    fn display_name(&self) -> String {
        "× Mult Matrix".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let mut result = DMat4::IDENTITY;
        for (_, matrix) in ctx.data_back_multi(Self::MATRIX_IN)? {
            result = matrix.as_matrix()? * result;
        }
        ctx.set_data_fwd(Self::RESULT, result);
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_multi(Self::MATRIX_IN, DataSpec::Matrix)
            .add_output_data(Self::RESULT, DataSpec::Matrix);
        Ok(())
    }
}
