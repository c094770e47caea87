use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
};

/// `1 - in`, used to show one of two mutually exclusive rigs.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct ReverseF64;

impl ReverseF64 {
    pub const INPUT: &'static str = "in";
    pub const OUTPUT: &'static str = "out";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for ReverseF64 {
    fn display_name(&self) -> String {
        "Reverse".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let input = ctx.data_back(Self::INPUT)?.as_f64()?;
        ctx.set_data_fwd(Self::OUTPUT, 1. - input);
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::INPUT, DataSpec::F64)
            .add_output_data(Self::OUTPUT, DataSpec::F64);
        Ok(())
    }
}
