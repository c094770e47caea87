use bevy::reflect::{Reflect, std_traits::ReflectDefault};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
};

/// Distance between `point1` in the space of `in_matrix1` and `point2` in
/// the space of `in_matrix2`.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct DistanceBetweenNode;

impl DistanceBetweenNode {
    pub const POINT_1: &'static str = "point1";
    pub const MATRIX_1: &'static str = "in_matrix1";
    pub const POINT_2: &'static str = "point2";
    pub const MATRIX_2: &'static str = "in_matrix2";
    pub const DISTANCE: &'static str = "distance";

    pub fn new() -> Self {
        Self
    }
}

impl NodeLike for DistanceBetweenNode {
    fn display_name(&self) -> String {
        "Distance Between".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let point_1 = ctx
            .data_back(Self::MATRIX_1)?
            .as_matrix()?
            .transform_point3(ctx.data_back(Self::POINT_1)?.as_vec3()?);
        let point_2 = ctx
            .data_back(Self::MATRIX_2)?
            .as_matrix()?
            .transform_point3(ctx.data_back(Self::POINT_2)?.as_vec3()?);
        ctx.set_data_fwd(Self::DISTANCE, point_1.distance(point_2));
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_data(Self::POINT_1, DataSpec::Vec3)
            .add_input_data(Self::MATRIX_1, DataSpec::Matrix)
            .add_input_data(Self::POINT_2, DataSpec::Vec3)
            .add_input_data(Self::MATRIX_2, DataSpec::Matrix)
            .add_output_data(Self::DISTANCE, DataSpec::F64);
        Ok(())
    }
}
