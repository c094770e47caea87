use bevy::{
    log::warn,
    math::{DMat4, DVec3},
    reflect::{Reflect, std_traits::ReflectDefault},
};
use rig_graph_core::{
    edge_data::DataSpec,
    errors::SceneResult,
    node::{NodeContext, NodeLike, SpecContext},
    transform::{Decomposed, InterpolateLinear, RotateOrder, orient_to_quat},
};

/// Blends between consecutive matrix slots selected by a scalar blender.
///
/// Every populated `matrix_in[i]` is a slot, taken in index order. A slot
/// contributes `parent_inverse * matrix_in[i] * offset[i]`, which puts the
/// result in the local space of whatever the node drives. With a blender of
/// `b`, slots `floor(b)` and `floor(b) + 1` are interpolated by the
/// fractional part of `b`; both indices stop at the last slot, and negative
/// blenders read as zero.
///
/// The rotation outputs are expressed after `joint_orient`, so that they can
/// drive the rotate channels of a joint directly.
#[derive(Reflect, Clone, Debug, Default)]
#[reflect(Default)]
#[type_path = "rig_graph::builtin_nodes"]
pub struct BlendMatrixNode;

impl BlendMatrixNode {
    pub const MATRIX_IN: &'static str = "matrix_in";
    pub const OFFSET: &'static str = "offset";
    pub const BLENDER: &'static str = "blender";
    pub const PARENT_INVERSE: &'static str = "parent_inverse";
    pub const JOINT_ORIENT: &'static str = "joint_orient";
    pub const ROTATE_ORDER: &'static str = "rotate_order";

    pub const RESULT: &'static str = "result";
    pub const TRANSLATE: &'static str = "translate";
    pub const ROTATE: &'static str = "rotate";
    pub const SCALE: &'static str = "scale";
    pub const SHEAR: &'static str = "shear";
    pub const QUAT: &'static str = "quat";

    pub fn new() -> Self {
        Self
    }
}

/// Interpolates the two slots selected by `blender`.
pub fn blend_slots(slots: &[Decomposed], blender: f64) -> Decomposed {
    let Some(last) = slots.len().checked_sub(1) else {
        return Decomposed::IDENTITY;
    };
    let blender = blender.max(0.);
    let floor = blender.floor();
    let t = blender - floor;

    let a = (floor as usize).min(last);
    let b = (floor as usize).saturating_add(1).min(last);
    if blender > last as f64 {
        warn!(
            "Blender {blender} is past the last of {} slots, reading slots {a} and {b}",
            slots.len()
        );
    }

    slots[a].interpolate_linear(&slots[b], t)
}

impl NodeLike for BlendMatrixNode {
    fn display_name(&self) -> String {
        "Blend Matrix".into()
    }

    fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
        let parent_inverse = ctx.data_back(Self::PARENT_INVERSE)?.as_matrix()?;
        let mut indices = ctx.indices_back(Self::MATRIX_IN)?;
        if indices.is_empty() {
            // Unset slot 0 reads as an identity pair.
            indices.push(0);
        }

        let slots = indices
            .into_iter()
            .map(|index| {
                let matrix = ctx.data_back_at(Self::MATRIX_IN, index)?.as_matrix()?;
                let offset = ctx.data_back_at(Self::OFFSET, index)?.as_matrix()?;
                Ok(Decomposed::from_matrix(parent_inverse * matrix * offset))
            })
            .collect::<SceneResult<Vec<_>>>()?;

        let blender = ctx.data_back(Self::BLENDER)?.as_f64()?;
        let blended = blend_slots(&slots, blender);

        let orient = orient_to_quat(ctx.data_back(Self::JOINT_ORIENT)?.as_vec3()?);
        let rotate_order = RotateOrder::from_index(ctx.data_back(Self::ROTATE_ORDER)?.as_int()?);
        let rotation = (orient.inverse() * blended.rotate).normalize();

        ctx.set_data_fwd(Self::RESULT, blended.compose());
        ctx.set_data_fwd(Self::TRANSLATE, blended.translate);
        ctx.set_data_fwd(Self::ROTATE, rotate_order.to_euler(rotation));
        ctx.set_data_fwd(Self::SCALE, blended.scale);
        ctx.set_data_fwd(Self::SHEAR, blended.shear);
        ctx.set_data_fwd(Self::QUAT, rotation);
        Ok(())
    }

    fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
        ctx.add_input_multi(Self::MATRIX_IN, DataSpec::Matrix)
            .add_input_multi(Self::OFFSET, DataSpec::Matrix)
            .add_input_data(Self::BLENDER, DataSpec::F64)
            .add_input_default(Self::PARENT_INVERSE, DMat4::IDENTITY)
            .add_input_default(Self::JOINT_ORIENT, DVec3::ZERO)
            .add_input_data(Self::ROTATE_ORDER, DataSpec::Int);

        ctx.add_output_data(Self::RESULT, DataSpec::Matrix)
            .add_output_data(Self::TRANSLATE, DataSpec::Vec3)
            .add_output_data(Self::ROTATE, DataSpec::Vec3)
            .add_output_data(Self::SCALE, DataSpec::Vec3)
            .add_output_data(Self::SHEAR, DataSpec::Vec3)
            .add_output_data(Self::QUAT, DataSpec::Quat);
        Ok(())
    }
}
