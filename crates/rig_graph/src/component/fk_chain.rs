use serde::{Deserialize, Serialize};

use super::{BuildContext, ComponentBody, StorageKind};
use crate::{
    constraint::ConstraintFlags,
    controller::ControllerShape,
    errors::{RigError, RigResult},
    guide::Guide,
};

/// Nested controllers, one per guide, each driving a joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FkChain {
    pub guides: Vec<Guide>,
    #[serde(default)]
    pub shape: ControllerShape,
}

impl FkChain {
    pub fn new(guides: Vec<Guide>) -> Self {
        Self {
            guides,
            shape: ControllerShape::default(),
        }
    }
}

impl ComponentBody for FkChain {
    fn mirrored(&self) -> Self {
        Self {
            guides: self.guides.iter().map(Guide::mirrored).collect(),
            shape: self.shape,
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        if self.guides.is_empty() {
            return Err(RigError::InvalidComponent(
                ctx.display_name().to_string(),
                "an fk chain needs at least one guide".into(),
            ));
        }

        let mut parent_ctrl = None;
        let mut parent_joint = None;
        for (i, guide) in self.guides.iter().enumerate() {
            let world = guide.matrix(ctx.view())?;
            let controller = ctx.controller(&format!("fk{i}"), world, parent_ctrl, self.shape)?;
            let joint = ctx.joint(&format!("fk{i}_jnt"), world, parent_joint)?;
            ctx.constraint(
                &format!("fk{i}_blend"),
                &[controller.ctrl.into()],
                joint,
                ConstraintFlags::ALL,
            )?;

            if i == 0 {
                ctx.publish(StorageKind::Inputs, controller.npo);
            }
            ctx.publish(StorageKind::Interfaces, controller.ctrl);
            ctx.publish(StorageKind::Outputs, controller.ctrl);
            ctx.publish(StorageKind::Influencers, joint);
            parent_ctrl = Some(controller.ctrl);
            parent_joint = Some(joint);
        }
        Ok(())
    }
}
