use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
};

#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct DivF64;

impl DivF64 {
    pub const INPUT_1: &'static str = "in_a";
    pub const INPUT_2: &'static str = "in_b";
    pub const OUTPUT: &'static str = "out";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for DivF64 {
    fn display_name(&self) -> String {
        "÷ Divide".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let input_1 = ctx.data_back(Self::INPUT_1)?.as_f64()?;
        let input_2 = ctx.data_back(Self::INPUT_2)?.as_f64()?;
        ctx.set_data_fwd(Self::OUTPUT, input_1 / input_2);
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::INPUT_1, DataSpec::F64)
            .add_input_default(Self::INPUT_2, 1.)
            .add_output_data(Self::OUTPUT, DataSpec::F64);
        Ok(())
    }
}
