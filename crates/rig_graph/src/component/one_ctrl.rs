use serde::{Deserialize, Serialize};

use super::{BuildContext, ComponentBody, StorageKind};
use crate::{
    constraint::ConstraintFlags, controller::ControllerShape, errors::RigResult, guide::Guide,
};

/// A single controller driving a single joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneCtrl {
    pub guide: Guide,
    #[serde(default)]
    pub shape: ControllerShape,
}

impl OneCtrl {
    pub fn new(guide: Guide) -> Self {
        Self {
            guide,
            shape: ControllerShape::default(),
        }
    }
}

impl ComponentBody for OneCtrl {
    fn mirrored(&self) -> Self {
        Self {
            guide: self.guide.mirrored(),
            shape: self.shape,
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let world = self.guide.matrix(ctx.view())?;
        let controller = ctx.controller("main", world, None, self.shape)?;
        let joint = ctx.joint("jnt", world, None)?;
        ctx.constraint(
            "jnt_blend",
            &[controller.ctrl.into()],
            joint,
            ConstraintFlags::ALL,
        )?;

        ctx.publish(StorageKind::Inputs, controller.npo);
        ctx.publish(StorageKind::Outputs, controller.ctrl);
        ctx.publish(StorageKind::Interfaces, controller.ctrl);
        ctx.publish(StorageKind::Influencers, joint);
        Ok(())
    }
}
