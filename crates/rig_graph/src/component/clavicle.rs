use bevy::math::{DMat4, DVec3};
use rig_graph_builtin_nodes::AimMatrixNode;
use rig_graph_core::{
    parameters::Side,
    scene::{NodeKind, SceneExt, attrs},
};
use serde::{Deserialize, Serialize};

use super::{BuildContext, ComponentBody, StorageKind};
use crate::{
    constraint::{ConstraintFlags, MatrixSource},
    controller::ControllerShape,
    errors::{RigError, RigResult},
    guide::Guide,
};

/// A single joint aimed from the clavicle guide at a controller placed on
/// the shoulder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clavicle {
    pub clavicle: Guide,
    pub shoulder: Guide,
}

impl Clavicle {
    pub fn new(clavicle: Guide, shoulder: Guide) -> Self {
        Self { clavicle, shoulder }
    }
}

/// Frame at `origin` whose X axis points along `aim`, with Y leaning
/// towards `up`.
fn aim_frame(origin: DVec3, aim: DVec3, up: DVec3) -> DMat4 {
    let x = aim.normalize();
    let y = up
        .reject_from(x)
        .try_normalize()
        .unwrap_or_else(|| x.any_orthonormal_vector());
    DMat4::from_cols(
        x.extend(0.),
        y.extend(0.),
        x.cross(y).extend(0.),
        origin.extend(1.),
    )
}

impl ComponentBody for Clavicle {
    fn mirrored(&self) -> Self {
        Self {
            clavicle: self.clavicle.mirrored(),
            shoulder: self.shoulder.mirrored(),
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let guide = self.clavicle.matrix(ctx.view())?;
        let start = guide.w_axis.truncate();
        let end = self.shoulder.position(ctx.view())?;
        let size = self.clavicle.size(ctx.view())?;
        if start.distance_squared(end) <= f64::EPSILON {
            return Err(RigError::InvalidComponent(
                ctx.display_name().to_string(),
                "clavicle and shoulder guides overlap".into(),
            ));
        }

        // Right side frames point back at the body.
        let sign = if ctx.component.side == Side::R { -1. } else { 1. };
        let root_world = aim_frame(start, sign * (end - start), guide.y_axis.truncate());
        let mut ctrl_world = root_world;
        ctrl_world.w_axis = end.extend(1.);
        let mut up_world = root_world;
        up_world.w_axis = (start + root_world.y_axis.truncate() * size).extend(1.);

        let root = ctx.group("root", root_world, None)?;
        let controller = ctx.controller("main", ctrl_world, Some(root), ControllerShape::Sphere)?;
        let up = ctx.group("up", up_world, Some(root))?;

        let aim = ctx.node(NodeKind::AimMatrix, "aim")?;
        ctx.scene
            .connect(root.plug(attrs::WORLD_MATRIX), aim.plug(AimMatrixNode::INPUT))?;
        ctx.scene.connect(
            controller.ctrl.plug(attrs::WORLD_MATRIX),
            aim.plug(AimMatrixNode::PRIMARY_TARGET),
        )?;
        ctx.scene
            .set_value(aim.plug(AimMatrixNode::PRIMARY_AXIS), DVec3::new(sign, 0., 0.))?;
        ctx.scene.connect(
            up.plug(attrs::WORLD_MATRIX),
            aim.plug(AimMatrixNode::SECONDARY_TARGET),
        )?;

        let joint = ctx.joint("jnt", root_world, None)?;
        ctx.constraint(
            "jnt_blend",
            &[MatrixSource::Plug(aim.plug(AimMatrixNode::OUTPUT))],
            joint,
            ConstraintFlags::ALL,
        )?;

        ctx.publish(StorageKind::Inputs, root);
        ctx.publish(StorageKind::Interfaces, controller.ctrl);
        ctx.publish(StorageKind::Outputs, joint);
        ctx.publish(StorageKind::Influencers, joint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rig_graph_builtin_nodes::memory_scene;
    use rig_graph_core::{
        memory_scene::MemoryScene,
        parameters::{Index, Name},
        scene::{Axis, Scene},
    };

    use super::*;
    use crate::component::{Component, ComponentKind};

    fn clavicle(scene: &mut MemoryScene, side: Side) -> Component {
        let clavicle =
            Guide::create(scene, "clavicle", DMat4::from_translation(DVec3::new(0.5, 14., 0.)))
                .unwrap();
        let shoulder =
            Guide::create(scene, "shoulder", DMat4::from_translation(DVec3::new(2., 14., 0.)))
                .unwrap();
        let component = Component::new(
            Name::new("clavicle").unwrap(),
            Side::L,
            Index::new(0).unwrap(),
            ComponentKind::Clavicle(Clavicle::new(clavicle, shoulder)),
        );
        match side {
            Side::R => component.mirror().unwrap(),
            _ => component,
        }
    }

    fn joint_world(scene: &MemoryScene, name: &str) -> DMat4 {
        scene.world_matrix(scene.find(name).unwrap()).unwrap()
    }

    #[test]
    fn joint_follows_the_controller() {
        let mut scene = memory_scene();
        clavicle(&mut scene, Side::L).build(&mut scene).unwrap();

        let rest = joint_world(&scene, "clavicle_L_0_jnt");
        assert!(rest.abs_diff_eq(DMat4::from_translation(DVec3::new(0.5, 14., 0.)), 1e-9));

        let ctrl = scene.find("clavicle_L_0_main_ctrl").unwrap();
        scene
            .set_value(ctrl.plug(attrs::TRANSLATE).axis(Axis::Y), 1.5)
            .unwrap();

        let aimed = joint_world(&scene, "clavicle_L_0_jnt");
        let expected = DVec3::new(1.5, 1.5, 0.).normalize();
        assert!(aimed.x_axis.truncate().abs_diff_eq(expected, 1e-9));
        assert!(aimed.w_axis.truncate().abs_diff_eq(DVec3::new(0.5, 14., 0.), 1e-9));
    }

    #[test]
    fn mirrored_frame_points_at_the_body() {
        let mut scene = memory_scene();
        let built = clavicle(&mut scene, Side::R).build(&mut scene).unwrap();
        assert_eq!(built.name, "clavicle_R_0");

        let rest = joint_world(&scene, "clavicle_R_0_jnt");
        assert!(rest.w_axis.truncate().abs_diff_eq(DVec3::new(-0.5, 14., 0.), 1e-9));
        assert!(rest.x_axis.truncate().abs_diff_eq(DVec3::X, 1e-9));

        // Mirrored frames are turned half a turn about X, so a negative
        // channel raises the right shoulder.
        let ctrl = scene.find("clavicle_R_0_main_ctrl").unwrap();
        scene
            .set_value(ctrl.plug(attrs::TRANSLATE).axis(Axis::Y), -1.5)
            .unwrap();
        let aimed = joint_world(&scene, "clavicle_R_0_jnt");
        let expected = DVec3::new(1.5, -1.5, 0.).normalize();
        assert!(aimed.x_axis.truncate().abs_diff_eq(expected, 1e-9));
    }
}
