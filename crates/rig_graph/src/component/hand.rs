use rig_graph_builtin_nodes::MulF64;
use rig_graph_core::scene::{Axis, NodeKind, NodeRef, SceneExt, attrs};
use serde::{Deserialize, Serialize};

use super::{BuildContext, ComponentBody, StorageKind};
use crate::{
    constraint::ConstraintFlags,
    controller::{ControllerShape, add_float_attribute},
    errors::{RigError, RigResult},
    guide::Guide,
};

pub const CURL: &str = "curl";
pub const SPREAD: &str = "spread";
pub const CURL_WEIGHT: &str = "curl_weight";

/// A root controller and one FK chain per finger. The root carries `curl`,
/// which bends every finger segment by its own weight, and `spread`, which
/// fans the fingers out from the middle one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    pub root: Guide,
    /// Finger segment guides, from the thumb side.
    pub fingers: Vec<Vec<Guide>>,
}

impl Hand {
    pub fn new(root: Guide, fingers: Vec<Vec<Guide>>) -> Self {
        Self { root, fingers }
    }
}

impl ComponentBody for Hand {
    fn mirrored(&self) -> Self {
        Self {
            root: self.root.mirrored(),
            fingers: self
                .fingers
                .iter()
                .map(|finger| finger.iter().map(Guide::mirrored).collect())
                .collect(),
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        if self.fingers.is_empty() || self.fingers.iter().any(Vec::is_empty) {
            return Err(RigError::InvalidComponent(
                ctx.display_name().to_string(),
                "every finger needs at least one guide".into(),
            ));
        }

        let root_world = self.root.matrix(ctx.view())?;
        let root = ctx.controller("root", root_world, None, ControllerShape::Square)?;
        let curl = add_float_attribute(ctx.scene, root.ctrl, CURL, 0., None, None)?;
        let spread = add_float_attribute(ctx.scene, root.ctrl, SPREAD, 0., None, None)?;
        ctx.publish(StorageKind::Inputs, root.npo);
        ctx.publish(StorageKind::Interfaces, root.ctrl);

        let middle = (self.fingers.len() - 1) as f64 / 2.;
        for (f, finger) in self.fingers.iter().enumerate() {
            let mut parent_ctrl = root.ctrl;
            let mut parent_joint: Option<NodeRef> = None;
            for (s, guide) in finger.iter().enumerate() {
                let name = format!("finger{f}_{s}");
                let world = guide.matrix(ctx.view())?;

                let offset = ctx.group(&format!("{name}_offset"), world, Some(parent_ctrl))?;
                let bend = ctx.group(&format!("{name}_curl"), world, Some(offset))?;
                let controller = ctx.controller(&name, world, Some(bend), ControllerShape::Circle)?;

                let weight =
                    add_float_attribute(ctx.scene, controller.ctrl, CURL_WEIGHT, 1., None, None)?;
                let weighted = ctx.node(NodeKind::MulF64, &format!("{name}_curl_weighted"))?;
                ctx.scene
                    .connect(curl.clone(), weighted.plug(MulF64::INPUT_1))?;
                ctx.scene.connect(weight, weighted.plug(MulF64::INPUT_2))?;
                ctx.scene.connect(
                    weighted.plug(MulF64::OUTPUT),
                    bend.plug(attrs::ROTATE).axis(Axis::Z),
                )?;

                if s == 0 {
                    let fan = ctx.node(NodeKind::MulF64, &format!("{name}_spread"))?;
                    ctx.scene.connect(spread.clone(), fan.plug(MulF64::INPUT_1))?;
                    ctx.scene
                        .set_value(fan.plug(MulF64::INPUT_2), f as f64 - middle)?;
                    ctx.scene.connect(
                        fan.plug(MulF64::OUTPUT),
                        bend.plug(attrs::ROTATE).axis(Axis::Y),
                    )?;
                }

                let joint = ctx.joint(&format!("{name}_jnt"), world, parent_joint)?;
                ctx.constraint(
                    &format!("{name}_blend"),
                    &[controller.ctrl.into()],
                    joint,
                    ConstraintFlags::ALL,
                )?;

                ctx.publish(StorageKind::Interfaces, controller.ctrl);
                ctx.publish(StorageKind::Outputs, joint);
                ctx.publish(StorageKind::Influencers, joint);
                parent_ctrl = controller.ctrl;
                parent_joint = Some(joint);
            }
        }
        Ok(())
    }
}
