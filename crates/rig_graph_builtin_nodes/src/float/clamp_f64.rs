use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
};

#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct ClampF64;

impl ClampF64 {
    pub const INPUT: &'static str = "in";
    pub const CLAMP_MIN: &'static str = "min";
    pub const CLAMP_MAX: &'static str = "max";
    pub const OUTPUT: &'static str = "out";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for ClampF64 {
    fn display_name(&self) -> String {
        "Clamp".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let input = ctx.data_back(Self::INPUT)?.as_f64()?;
        let min = ctx.data_back(Self::CLAMP_MIN)?.as_f64()?;
        let max = ctx.data_back(Self::CLAMP_MAX)?.as_f64()?;
        // Inverted ranges resolve to the upper bound.
        ctx.set_data_fwd(Self::OUTPUT, input.max(min).min(max));
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::INPUT, DataSpec::F64)
            .add_input_data(Self::CLAMP_MIN, DataSpec::F64)
            .add_input_default(Self::CLAMP_MAX, 1.)
            .add_output_data(Self::OUTPUT, DataSpec::F64);
        Ok(())
    }
}
