use bevy::{
    log::debug,
    math::{DMat4, DVec3},
};
use rig_graph_builtin_nodes::{ClampF64, MulF64, SubF64};
use rig_graph_core::scene::{Axis, NodeKind, NodeRef, Plug, SceneExt, attrs};
use serde::{Deserialize, Serialize};

use super::{
    BuildContext, ComponentBody, StorageKind,
    limb::{
        IkControls, LimbConfig, LimbGuides, LimbPlan, LimbRig, build_fk, build_ik_controls,
        build_ik_solver, build_main, build_result, build_skin, switch_constraint,
    },
};
use crate::{
    controller::{ControllerShape, add_float_attribute},
    errors::{RigError, RigResult},
    guide::Guide,
};

pub const ROLL: &str = "roll";
pub const ROLL_BREAK: &str = "roll_break";

/// Stands in for the open ends of the roll ranges.
const ROLL_LIMIT: f64 = 1e6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegGuides {
    pub hip: Guide,
    pub knee: Guide,
    pub ankle: Guide,
    pub ball: Guide,
    pub toe: Guide,
    pub heel: Guide,
}

impl LegGuides {
    pub fn mirrored(&self) -> Self {
        Self {
            hip: self.hip.mirrored(),
            knee: self.knee.mirrored(),
            ankle: self.ankle.mirrored(),
            ball: self.ball.mirrored(),
            toe: self.toe.mirrored(),
            heel: self.heel.mirrored(),
        }
    }

    fn limb(&self) -> LimbGuides {
        LimbGuides::new(self.hip.clone(), self.knee.clone(), self.ankle.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootConfig {
    /// Roll, in radians, at which the foot stops rolling on the ball and
    /// starts rolling on the toe tip.
    pub roll_break: f64,
}

impl Default for FootConfig {
    fn default() -> Self {
        Self { roll_break: 0.6 }
    }
}

/// A limb with a reverse foot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub guides: LegGuides,
    #[serde(default)]
    pub config: LimbConfig,
    #[serde(default)]
    pub foot: FootConfig,
}

impl Leg {
    pub fn new(guides: LegGuides) -> Self {
        Self {
            guides,
            config: LimbConfig::default(),
            foot: FootConfig::default(),
        }
    }
}

/// Reverse foot pivots.
pub struct FootRig {
    pub ankle: NodeRef,
    pub toe: NodeRef,
    pub ball_frame: DMat4,
}

/// Foot frame: X from heel to toe on the ground plane, Y up.
fn foot_frame(heel: DVec3, toe: DVec3) -> Option<DMat4> {
    let forward = (toe - heel).reject_from(DVec3::Y).try_normalize()?;
    Some(DMat4::from_cols(
        forward.extend(0.),
        DVec3::Y.extend(0.),
        forward.cross(DVec3::Y).extend(0.),
        DVec3::ZERO.extend(1.),
    ))
}

fn at(frame: DMat4, position: DVec3) -> DMat4 {
    DMat4::from_cols(frame.x_axis, frame.y_axis, frame.z_axis, position.extend(1.))
}

/// A placed group with a rolling group at identity under it. Returns the
/// rolling group.
fn pivot(
    ctx: &mut BuildContext,
    name: &str,
    world: DMat4,
    parent: NodeRef,
) -> RigResult<NodeRef> {
    let placed = ctx.group(&format!("{name}_pivot"), world, Some(parent))?;
    ctx.group(&format!("{name}_roll"), world, Some(placed))
}

/// Drives `pivot.rotate.z` with the negated `value`.
fn drive_roll(ctx: &mut BuildContext, name: &str, value: Plug, pivot: NodeRef) -> RigResult<()> {
    let negate = ctx.node(NodeKind::MulF64, &format!("{name}_roll_negate"))?;
    ctx.scene.connect(value, negate.plug(MulF64::INPUT_1))?;
    ctx.scene.set_value(negate.plug(MulF64::INPUT_2), -1.)?;
    ctx.scene.connect(
        negate.plug(MulF64::OUTPUT),
        pivot.plug(attrs::ROTATE).axis(Axis::Z),
    )?;
    Ok(())
}

fn clamp(
    ctx: &mut BuildContext,
    name: &str,
    value: Plug,
    min: f64,
    max: f64,
) -> RigResult<NodeRef> {
    let clamp = ctx.node(NodeKind::ClampF64, name)?;
    ctx.scene.connect(value, clamp.plug(ClampF64::INPUT))?;
    ctx.scene.set_value(clamp.plug(ClampF64::CLAMP_MIN), min)?;
    ctx.scene.set_value(clamp.plug(ClampF64::CLAMP_MAX), max)?;
    Ok(clamp)
}

/// Heel, toe tip and ball pivots under the IK controller, rolled by the
/// `roll` attribute: negative rolls on the heel, up to `roll_break` on the
/// ball and beyond it on the toe tip. The ankle pivot at the end of the
/// chain becomes the IK target.
pub fn build_foot(
    ctx: &mut BuildContext,
    plan: &LimbPlan,
    guides: &LegGuides,
    foot: &FootConfig,
    controls: &IkControls,
) -> RigResult<FootRig> {
    debug!("{}: reverse foot", ctx.display_name());
    let scene = ctx.view();
    let heel = guides.heel.position(scene)?;
    let toe = guides.toe.position(scene)?;
    let ball = guides.ball.position(scene)?;
    let frame = foot_frame(heel, toe).ok_or_else(|| {
        RigError::InvalidLimb(
            ctx.display_name().to_string(),
            "heel and toe guides are vertically aligned".into(),
        )
    })?;

    let ik = controls.ik.ctrl;
    let roll = add_float_attribute(ctx.scene, ik, ROLL, 0., None, None)?;
    let roll_break =
        add_float_attribute(ctx.scene, ik, ROLL_BREAK, foot.roll_break, Some(0.), None)?;

    let heel_roll = pivot(ctx, "heel", at(frame, heel), ik)?;
    let toe_roll = pivot(ctx, "toe", at(frame, toe), heel_roll)?;
    let ball_roll = pivot(ctx, "ball", at(frame, ball), toe_roll)?;
    let ankle = ctx.group("ankle_pivot", plan.frames[2], Some(ball_roll))?;

    let heel_amount = clamp(ctx, "heel_roll_clamp", roll.clone(), -ROLL_LIMIT, 0.)?;
    drive_roll(ctx, "heel", heel_amount.plug(ClampF64::OUTPUT), heel_roll)?;

    let ball_amount = clamp(ctx, "ball_roll_clamp", roll.clone(), 0., 0.)?;
    ctx.scene
        .connect(roll_break.clone(), ball_amount.plug(ClampF64::CLAMP_MAX))?;
    drive_roll(ctx, "ball", ball_amount.plug(ClampF64::OUTPUT), ball_roll)?;

    let past_break = ctx.node(NodeKind::SubF64, "toe_roll_past_break")?;
    ctx.scene.connect(roll, past_break.plug(SubF64::INPUT_1))?;
    ctx.scene
        .connect(roll_break, past_break.plug(SubF64::INPUT_2))?;
    let toe_amount = clamp(
        ctx,
        "toe_roll_clamp",
        past_break.plug(SubF64::OUTPUT),
        0.,
        ROLL_LIMIT,
    )?;
    drive_roll(ctx, "toe", toe_amount.plug(ClampF64::OUTPUT), toe_roll)?;

    Ok(FootRig {
        ankle,
        toe: toe_roll,
        ball_frame: at(frame, ball),
    })
}

impl ComponentBody for Leg {
    fn mirrored(&self) -> Self {
        Self {
            guides: self.guides.mirrored(),
            ..self.clone()
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let plan = LimbPlan::from_guides(ctx, &self.guides.limb(), &self.config)?;
        let main = build_main(ctx, &plan)?;
        let controls = build_ik_controls(ctx, &plan, &main, false)?;
        let foot = build_foot(ctx, &plan, &self.guides, &self.foot, &controls)?;
        let ik = build_ik_solver(ctx, &plan, &main, &controls, foot.ankle)?;
        let fk = build_fk(ctx, &plan, &main)?;
        let result = build_result(ctx, &plan, &main, &ik, &fk)?;
        let skin = build_skin(ctx, &plan, main.root, result.joints)?;

        let fk_toe = ctx.controller(
            "fk_toe",
            foot.ball_frame,
            Some(fk.ctrls[2].ctrl),
            ControllerShape::Circle,
        )?;
        let ik_ball = ctx.group("ik_ball", foot.ball_frame, Some(foot.toe))?;
        let result_ball = ctx.joint("result_ball", foot.ball_frame, Some(result.joints[2]))?;
        switch_constraint(
            ctx,
            "result_ball_blend",
            [fk_toe.ctrl, ik_ball],
            result_ball,
            &main.switch,
        )?;

        let rig = LimbRig {
            plan,
            main,
            controls,
            ik,
            fk,
            result,
            skin,
        };
        rig.publish(ctx);
        ctx.publish(StorageKind::Interfaces, fk_toe.ctrl);
        ctx.publish(StorageKind::Outputs, result_ball);
        ctx.publish(StorageKind::Influencers, result_ball);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rig_graph_builtin_nodes::memory_scene;
    use rig_graph_core::{
        memory_scene::MemoryScene,
        parameters::{Index, Name, Side},
        scene::Scene,
    };

    use super::*;
    use crate::component::{Component, ComponentKind, limb::SWITCH_FK_IK};

    fn leg(scene: &mut MemoryScene, side: Side) -> Component {
        let mut guide = |name: &str, position: DVec3| {
            Guide::create(scene, name, DMat4::from_translation(position)).unwrap()
        };
        let guides = LegGuides {
            hip: guide("hip", DVec3::new(1., 10., 0.)),
            knee: guide("knee", DVec3::new(1., 5.5, 0.5)),
            ankle: guide("ankle", DVec3::new(1., 1., 0.)),
            ball: guide("ball", DVec3::new(1., 0.2, 1.2)),
            toe: guide("toe", DVec3::new(1., 0., 2.)),
            heel: guide("heel", DVec3::new(1., 0., -0.5)),
        };
        Component::new(
            Name::new("leg").unwrap(),
            side,
            Index::new(0).unwrap(),
            ComponentKind::Leg(Leg::new(guides)),
        )
    }

    fn find(scene: &MemoryScene, name: &str) -> NodeRef {
        scene.find(name).unwrap()
    }

    fn position(scene: &MemoryScene, node: NodeRef) -> DVec3 {
        scene.world_matrix(node).unwrap().w_axis.truncate()
    }

    #[test]
    fn rolling_on_the_ball_raises_the_ankle() {
        let mut scene = memory_scene();
        let built = leg(&mut scene, Side::L).build(&mut scene).unwrap();
        let ik = find(&scene, "leg_L_0_ik_ctrl");
        let ankle = find(&scene, "leg_L_0_ankle_pivot");
        let ball = find(&scene, "leg_L_0_ball_roll");

        let rest = position(&scene, ankle);
        assert!(rest.abs_diff_eq(DVec3::new(1., 1., 0.), 1e-9));

        scene.set_value(ik.plug(ROLL), 0.3).unwrap();
        assert!(position(&scene, ankle).y > rest.y + 0.1);
        assert!(
            (scene
                .get_f64(ball.plug(attrs::ROTATE).axis(Axis::Z))
                .unwrap()
                + 0.3)
                .abs()
                < 1e-12
        );

        // Past the break the toe tip takes the rest of the roll.
        scene.set_value(ik.plug(ROLL), 1.).unwrap();
        let toe = find(&scene, "leg_L_0_toe_roll");
        assert!(
            (scene.get_f64(toe.plug(attrs::ROTATE).axis(Axis::Z)).unwrap() + 0.4).abs() < 1e-12
        );

        let ball_joint = built.entry(StorageKind::Outputs, 0).unwrap();
        assert_eq!(scene.node_name(ball_joint).unwrap(), "leg_L_0_result_ball");
    }

    #[test]
    fn ik_chain_follows_the_ankle_pivot() {
        let mut scene = memory_scene();
        leg(&mut scene, Side::L).build(&mut scene).unwrap();
        let settings = find(&scene, "leg_L_0_settings_ctrl");
        scene.set_value(settings.plug(SWITCH_FK_IK), 1.).unwrap();
        scene
            .set_value(find(&scene, "leg_L_0_ik_ctrl").plug(ROLL), 0.3)
            .unwrap();

        let ankle = position(&scene, find(&scene, "leg_L_0_ankle_pivot"));
        let end = position(&scene, find(&scene, "leg_L_0_result2"));
        assert!(end.abs_diff_eq(ankle, 1e-6));
    }

    #[test]
    fn mirrored_leg_builds_on_the_other_side() {
        let mut scene = memory_scene();
        let mirrored = leg(&mut scene, Side::L).mirror().unwrap();
        mirrored.build(&mut scene).unwrap();

        let ankle = position(&scene, find(&scene, "leg_R_0_ankle_pivot"));
        assert!(ankle.abs_diff_eq(DVec3::new(-1., 1., 0.), 1e-9));
    }
}
