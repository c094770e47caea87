use serde::{Deserialize, Serialize};

use super::{
    BuildContext, ComponentBody, StorageKind,
    limb::{LimbConfig, LimbGuides, build_limb},
};
use crate::errors::RigResult;

/// A limb with a wrist output, optionally with a world aligned IK
/// controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    /// Shoulder, elbow and wrist.
    pub guides: LimbGuides,
    #[serde(default)]
    pub config: LimbConfig,
    #[serde(default)]
    pub ik_world_aligned: bool,
}

impl Arm {
    pub fn new(guides: LimbGuides) -> Self {
        Self {
            guides,
            config: LimbConfig::default(),
            ik_world_aligned: false,
        }
    }
}

impl ComponentBody for Arm {
    fn mirrored(&self) -> Self {
        Self {
            guides: self.guides.mirrored(),
            ..self.clone()
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let rig = build_limb(ctx, &self.guides, &self.config, self.ik_world_aligned)?;
        rig.publish(ctx);

        let wrist = ctx.group("wrist", rig.plan.frames[2], Some(rig.result.joints[2]))?;
        ctx.publish(StorageKind::Outputs, wrist);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{DMat4, DVec3};
    use rig_graph_builtin_nodes::memory_scene;
    use rig_graph_core::{
        parameters::{Index, Name, Side},
        scene::{Scene, SceneExt},
    };

    use super::*;
    use crate::{
        component::{Component, ComponentKind},
        guide::Guide,
    };

    #[test]
    fn wrist_is_the_first_output() {
        let mut scene = memory_scene();
        let mut guide = |name: &str, position: DVec3| {
            Guide::create(&mut scene, name, DMat4::from_translation(position)).unwrap()
        };
        let guides = LimbGuides::new(
            guide("shoulder", DVec3::new(1., 15., 0.)),
            guide("elbow", DVec3::new(4., 15., -0.3)),
            guide("wrist", DVec3::new(7., 15., 0.)),
        );
        let arm = Arm {
            ik_world_aligned: true,
            ..Arm::new(guides)
        };
        let built = Component::new(
            Name::new("arm").unwrap(),
            Side::L,
            Index::new(0).unwrap(),
            ComponentKind::Arm(arm),
        )
        .build(&mut scene)
        .unwrap();

        let wrist = built.entry(StorageKind::Outputs, 0).unwrap();
        assert_eq!(scene.node_name(wrist).unwrap(), "arm_L_0_wrist");
        assert!(
            scene
                .world_matrix(wrist)
                .unwrap()
                .w_axis
                .truncate()
                .abs_diff_eq(DVec3::new(7., 15., 0.), 1e-9)
        );

        let ik = scene.find("arm_L_0_ik_ctrl").unwrap();
        let ik_world = scene.world_matrix(ik).unwrap();
        assert!(ik_world.x_axis.truncate().abs_diff_eq(DVec3::X, 1e-12));
        assert_eq!(built.storage(StorageKind::Outputs).len(), 4);
    }
}
