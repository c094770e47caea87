//! The three joint IK/FK limb.
//!
//! A limb is built by a fixed pipeline of phase functions over a
//! [`LimbPlan`]. [`Limb`] runs them in order; arms and legs reuse the same
//! phases and add their own in between.

mod skin;
mod stretch;

pub use skin::*;
pub use stretch::*;

use bevy::{
    log::debug,
    math::{DMat4, DVec3},
};
use rig_graph_builtin_nodes::{BlendMatrixNode, IkHandleNode, IkSolver, ReverseF64};
use rig_graph_core::scene::{Axis, NodeKind, NodeRef, Plug, attrs};
use serde::{Deserialize, Serialize};

use super::{BuildContext, ComponentBody, StorageKind};
use crate::{
    constraint::{ConstraintFlags, MatrixSource},
    controller::{Controller, ControllerShape, add_float_attribute},
    errors::{RigError, RigResult},
    guide::Guide,
};

pub const SWITCH_FK_IK: &str = "switch_fk_ik";
pub const MIN_STRETCH: &str = "min_stretch";
pub const MAX_STRETCH: &str = "max_stretch";
pub const PV_LOCK: &str = "pv_lock";
pub const OFF_STRETCH_A: &str = "off_stretch_a";
pub const OFF_STRETCH_B: &str = "off_stretch_b";
pub const TWIST: &str = "twist";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbGuides {
    pub start: Guide,
    pub mid: Guide,
    pub end: Guide,
}

impl LimbGuides {
    pub fn new(start: Guide, mid: Guide, end: Guide) -> Self {
        Self { start, mid, end }
    }

    pub fn mirrored(&self) -> Self {
        Self {
            start: self.start.mirrored(),
            mid: self.mid.mirrored(),
            end: self.end.mirrored(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimbConfig {
    /// Skin joints between the start and mid joints, excluding the first.
    pub first_section: u32,
    /// Skin joints between the mid and end joints, excluding the first.
    pub second_section: u32,
    /// Pole vector distance from the mid guide, in mid guide sizes.
    pub pv_distance: f64,
    pub min_stretch: f64,
    pub max_stretch: f64,
    pub solver: IkSolver,
}

impl Default for LimbConfig {
    fn default() -> Self {
        Self {
            first_section: 2,
            second_section: 2,
            pv_distance: 1.,
            min_stretch: 1.,
            max_stretch: 1.5,
            solver: IkSolver::default(),
        }
    }
}

/// Placement pole vector: in the plane of the three points, out from `mid`
/// perpendicular to the start to end line. `None` when the points are
/// collinear.
pub fn pole_vector_matrix(start: DVec3, mid: DVec3, end: DVec3, distance: f64) -> Option<DMat4> {
    let line = (end - start).try_normalize()?;
    let foot = start + line * (mid - start).dot(line);
    let out = (mid - foot).try_normalize()?;
    let normal = line.cross(out).try_normalize()?;
    Some(DMat4::from_cols(
        out.extend(0.),
        normal.cross(out).extend(0.),
        normal.extend(0.),
        (mid + out * distance).extend(1.),
    ))
}

/// Everything the limb phases derive from the guides, computed once.
#[derive(Clone, Debug, PartialEq)]
pub struct LimbPlan {
    /// Joint frames: X down the bone, Z the bend plane normal.
    pub frames: [DMat4; 3],
    /// Signed rest translation of the mid and end joints along X.
    pub rest: [f64; 2],
    pub pole: DMat4,
    pub config: LimbConfig,
}

impl LimbPlan {
    pub fn new(
        name: &str,
        guides: [DMat4; 3],
        pole_size: f64,
        config: &LimbConfig,
    ) -> RigResult<Self> {
        let invalid = |reason: &str| RigError::InvalidLimb(name.to_string(), reason.to_string());
        if config.pv_distance < 0. || config.min_stretch < 0. || config.max_stretch < 0. {
            return Err(invalid("pole distance and stretch limits must not be negative"));
        }
        if config.first_section == 0 || config.second_section == 0 {
            return Err(invalid("sections need at least one span"));
        }

        let [a, b, c] = guides.map(|guide| guide.w_axis.truncate());
        let (ab, bc) = (b - a, c - b);
        let normal = ab
            .cross(bc)
            .try_normalize()
            .ok_or_else(|| invalid("guides are collinear or coincide"))?;
        let normal = if normal.dot(guides[0].z_axis.truncate()) < 0. {
            -normal
        } else {
            normal
        };
        // Chains whose guides point back along the bone keep negative
        // translations, as on the mirrored side.
        let sign = if ab.dot(guides[0].x_axis.truncate()) < 0. {
            -1.
        } else {
            1.
        };

        let frame = |bone: DVec3, position: DVec3| {
            let x = bone.normalize() * sign;
            DMat4::from_cols(
                x.extend(0.),
                normal.cross(x).extend(0.),
                normal.extend(0.),
                position.extend(1.),
            )
        };
        let pole = pole_vector_matrix(a, b, c, pole_size * config.pv_distance)
            .ok_or_else(|| invalid("guides are collinear"))?;

        Ok(Self {
            frames: [frame(ab, a), frame(bc, b), frame(bc, c)],
            rest: [sign * ab.length(), sign * bc.length()],
            pole,
            config: config.clone(),
        })
    }

    pub fn from_guides(
        ctx: &BuildContext,
        guides: &LimbGuides,
        config: &LimbConfig,
    ) -> RigResult<Self> {
        let scene = ctx.view();
        Self::new(
            ctx.display_name(),
            [
                guides.start.matrix(scene)?,
                guides.mid.matrix(scene)?,
                guides.end.matrix(scene)?,
            ],
            guides.mid.size(scene)?,
            config,
        )
    }

    pub fn position(&self, index: usize) -> DVec3 {
        self.frames[index].w_axis.truncate()
    }
}

pub struct LimbMain {
    pub root: NodeRef,
    pub settings: Controller,
    pub switch: Plug,
    pub min_stretch: Plug,
    pub max_stretch: Plug,
    pub pv_lock: Plug,
    pub off_stretch: [Plug; 2],
}

pub struct IkControls {
    pub ik: Controller,
    pub pv: Controller,
    pub twist: Plug,
}

pub struct IkChain {
    pub joints: [NodeRef; 3],
    pub handle: NodeRef,
}

pub struct FkChainCtrls {
    pub ctrls: [Controller; 3],
}

pub struct ResultChain {
    pub joints: [NodeRef; 3],
    pub free: Controller,
}

/// Root group and the settings controller carrying the switch and stretch
/// attributes.
pub fn build_main(ctx: &mut BuildContext, plan: &LimbPlan) -> RigResult<LimbMain> {
    debug!("{}: main controls", ctx.display_name());
    let root = ctx.group("root", plan.frames[0], None)?;
    let settings = ctx.controller(
        "settings",
        plan.frames[0],
        Some(root),
        ControllerShape::Cross,
    )?;

    let node = settings.ctrl;
    let config = &plan.config;
    let switch = add_float_attribute(ctx.scene, node, SWITCH_FK_IK, 0., Some(0.), Some(1.))?;
    let min_stretch =
        add_float_attribute(ctx.scene, node, MIN_STRETCH, config.min_stretch, Some(0.), None)?;
    let max_stretch =
        add_float_attribute(ctx.scene, node, MAX_STRETCH, config.max_stretch, Some(0.), None)?;
    let pv_lock = add_float_attribute(ctx.scene, node, PV_LOCK, 0., Some(0.), Some(1.))?;
    let off_a = add_float_attribute(ctx.scene, node, OFF_STRETCH_A, 0., None, None)?;
    let off_b = add_float_attribute(ctx.scene, node, OFF_STRETCH_B, 0., None, None)?;

    Ok(LimbMain {
        root,
        settings,
        switch,
        min_stretch,
        max_stretch,
        pv_lock,
        off_stretch: [off_a, off_b],
    })
}

/// The IK end controller and the pole vector controller, both outside the
/// root so they stay in world space.
pub fn build_ik_controls(
    ctx: &mut BuildContext,
    plan: &LimbPlan,
    main: &LimbMain,
    world_aligned: bool,
) -> RigResult<IkControls> {
    debug!("{}: ik controls", ctx.display_name());
    let ik_world = if world_aligned {
        DMat4::from_translation(plan.position(2))
    } else {
        plan.frames[2]
    };
    let ik = ctx.controller("ik", ik_world, None, ControllerShape::Cube)?;
    let pv = ctx.controller("pv", plan.pole, None, ControllerShape::Diamond)?;
    let twist = add_float_attribute(ctx.scene, ik.ctrl, TWIST, 0., None, None)?;

    for npo in [ik.npo, pv.npo] {
        ctx.scene
            .connect(main.switch.clone(), npo.plug(attrs::VISIBILITY))?;
    }
    Ok(IkControls { ik, pv, twist })
}

/// IK joints, the two bone handle aiming the chain at `target`, and the
/// stretch network driving the mid and end joints along their bones.
pub fn build_ik_solver(
    ctx: &mut BuildContext,
    plan: &LimbPlan,
    main: &LimbMain,
    controls: &IkControls,
    target: NodeRef,
) -> RigResult<IkChain> {
    debug!("{}: ik solver", ctx.display_name());
    let ik0 = ctx.joint("ik0", plan.frames[0], Some(main.root))?;
    let ik1 = ctx.joint("ik1", plan.frames[1], Some(ik0))?;
    let ik2 = ctx.joint("ik2", plan.frames[2], Some(ik1))?;

    let handle = ctx.node(NodeKind::IkHandle, "ik_handle")?;
    for (source, pin) in [
        (ik0.plug(attrs::PARENT_MATRIX), IkHandleNode::PARENT_MATRIX),
        (ik0.plug(attrs::TRANSLATE), IkHandleNode::START_TRANSLATE),
        (ik0.plug(attrs::JOINT_ORIENT), IkHandleNode::START_ORIENT),
        (ik1.plug(attrs::TRANSLATE), IkHandleNode::MID_TRANSLATE),
        (ik1.plug(attrs::JOINT_ORIENT), IkHandleNode::MID_ORIENT),
        (ik2.plug(attrs::TRANSLATE), IkHandleNode::END_TRANSLATE),
        (target.plug(attrs::WORLD_MATRIX), IkHandleNode::TARGET_MATRIX),
        (controls.pv.ctrl.plug(attrs::WORLD_MATRIX), IkHandleNode::POLE_MATRIX),
        (controls.twist.clone(), IkHandleNode::TWIST),
    ] {
        ctx.scene.connect(source, handle.plug(pin))?;
    }
    ctx.scene.set(
        handle.plug(IkHandleNode::SOLVER),
        plan.config.solver.to_index().into(),
    )?;
    ctx.scene
        .connect(handle.plug(IkHandleNode::START_ROTATE), ik0.plug(attrs::ROTATE))?;
    ctx.scene
        .connect(handle.plug(IkHandleNode::MID_ROTATE), ik1.plug(attrs::ROTATE))?;

    ctx.constraint(
        "ik2_orient",
        &[target.into()],
        ik2,
        ConstraintFlags {
            translate: false,
            scale: false,
            shear: false,
            ..ConstraintFlags::ALL.with_offset()
        },
    )?;

    let stretch_root = ctx.group("stretch_root", plan.frames[0], Some(main.root))?;
    let lengths = build_stretch(
        ctx,
        &StretchInputs {
            root: stretch_root,
            pole: controls.pv.ctrl,
            end: target,
            rest: plan.rest,
            min_stretch: main.min_stretch.clone(),
            max_stretch: main.max_stretch.clone(),
            pv_lock: main.pv_lock.clone(),
            offsets: main.off_stretch.clone(),
        },
    )?;
    let [length_a, length_b] = lengths;
    ctx.scene
        .connect(length_a, ik1.plug(attrs::TRANSLATE).axis(Axis::X))?;
    ctx.scene
        .connect(length_b, ik2.plug(attrs::TRANSLATE).axis(Axis::X))?;

    Ok(IkChain {
        joints: [ik0, ik1, ik2],
        handle,
    })
}

/// Three nested FK controllers under the settings controller, hidden while
/// the limb is in IK.
pub fn build_fk(
    ctx: &mut BuildContext,
    plan: &LimbPlan,
    main: &LimbMain,
) -> RigResult<FkChainCtrls> {
    debug!("{}: fk controls", ctx.display_name());
    let fk0 = ctx.controller(
        "fk0",
        plan.frames[0],
        Some(main.settings.ctrl),
        ControllerShape::Circle,
    )?;
    let fk1 = ctx.controller("fk1", plan.frames[1], Some(fk0.ctrl), ControllerShape::Circle)?;
    let fk2 = ctx.controller("fk2", plan.frames[2], Some(fk1.ctrl), ControllerShape::Circle)?;

    let reverse = ctx.node(NodeKind::ReverseF64, "fk_visibility")?;
    ctx.scene
        .connect(main.switch.clone(), reverse.plug(ReverseF64::INPUT))?;
    ctx.scene.connect(
        reverse.plug(ReverseF64::OUTPUT),
        fk0.npo.plug(attrs::VISIBILITY),
    )?;

    Ok(FkChainCtrls {
        ctrls: [fk0, fk1, fk2],
    })
}

/// Blends `sources` onto `target` by the FK/IK switch.
pub fn switch_constraint(
    ctx: &mut BuildContext,
    suffix: &str,
    sources: [NodeRef; 2],
    target: NodeRef,
    switch: &Plug,
) -> RigResult<NodeRef> {
    let blend = ctx.constraint(
        suffix,
        &[sources[0].into(), sources[1].into()],
        target,
        ConstraintFlags::ALL,
    )?;
    ctx.scene
        .connect(switch.clone(), blend.plug(BlendMatrixNode::BLENDER))?;
    Ok(blend)
}

/// Result joints blending FK and IK. The mid joint follows a free controller
/// whose zero group does the blending, so it can be offset by hand.
pub fn build_result(
    ctx: &mut BuildContext,
    plan: &LimbPlan,
    main: &LimbMain,
    ik: &IkChain,
    fk: &FkChainCtrls,
) -> RigResult<ResultChain> {
    debug!("{}: result chain", ctx.display_name());
    let result0 = ctx.joint("result0", plan.frames[0], Some(main.root))?;
    let result1 = ctx.joint("result1", plan.frames[1], Some(result0))?;
    let result2 = ctx.joint("result2", plan.frames[2], Some(result1))?;

    switch_constraint(
        ctx,
        "result0_blend",
        [fk.ctrls[0].ctrl, ik.joints[0]],
        result0,
        &main.switch,
    )?;

    let free = ctx.controller("free", plan.frames[1], Some(main.root), ControllerShape::Sphere)?;
    switch_constraint(
        ctx,
        "free_blend",
        [fk.ctrls[1].ctrl, ik.joints[1]],
        free.npo,
        &main.switch,
    )?;
    ctx.constraint(
        "result1_blend",
        &[MatrixSource::Transform(free.ctrl)],
        result1,
        ConstraintFlags::ALL,
    )?;

    switch_constraint(
        ctx,
        "result2_blend",
        [fk.ctrls[2].ctrl, ik.joints[2]],
        result2,
        &main.switch,
    )?;

    Ok(ResultChain {
        joints: [result0, result1, result2],
        free,
    })
}

/// The nodes of a built limb, for bodies that extend it.
pub struct LimbRig {
    pub plan: LimbPlan,
    pub main: LimbMain,
    pub controls: IkControls,
    pub ik: IkChain,
    pub fk: FkChainCtrls,
    pub result: ResultChain,
    pub skin: Vec<NodeRef>,
}

impl LimbRig {
    /// Publishes the limb collections. Result joints go out end first.
    pub fn publish(&self, ctx: &mut BuildContext) {
        ctx.publish(StorageKind::Inputs, self.main.root);
        for interface in [
            self.main.settings.ctrl,
            self.controls.ik.ctrl,
            self.controls.pv.ctrl,
        ]
        .into_iter()
        .chain(self.fk.ctrls.iter().map(|fk| fk.ctrl))
        {
            ctx.publish(StorageKind::Interfaces, interface);
        }
        for joint in self.result.joints {
            ctx.publish(StorageKind::Outputs, joint);
        }
        for joint in &self.skin {
            ctx.publish(StorageKind::Influencers, *joint);
        }
    }
}

/// Builds a limb whose IK target is the IK controller itself.
pub fn build_limb(
    ctx: &mut BuildContext,
    guides: &LimbGuides,
    config: &LimbConfig,
    world_aligned: bool,
) -> RigResult<LimbRig> {
    let plan = LimbPlan::from_guides(ctx, guides, config)?;
    let main = build_main(ctx, &plan)?;
    let controls = build_ik_controls(ctx, &plan, &main, world_aligned)?;
    let ik = build_ik_solver(ctx, &plan, &main, &controls, controls.ik.ctrl)?;
    let fk = build_fk(ctx, &plan, &main)?;
    let result = build_result(ctx, &plan, &main, &ik, &fk)?;
    let skin = build_skin(ctx, &plan, main.root, result.joints)?;
    Ok(LimbRig {
        plan,
        main,
        controls,
        ik,
        fk,
        result,
        skin,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limb {
    pub guides: LimbGuides,
    #[serde(default)]
    pub config: LimbConfig,
}

impl Limb {
    pub fn new(guides: LimbGuides) -> Self {
        Self {
            guides,
            config: LimbConfig::default(),
        }
    }
}

impl ComponentBody for Limb {
    fn mirrored(&self) -> Self {
        Self {
            guides: self.guides.mirrored(),
            config: self.config.clone(),
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let rig = build_limb(ctx, &self.guides, &self.config, false)?;
        rig.publish(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::DVec3;
    use rig_graph_builtin_nodes::memory_scene;
    use rig_graph_core::{
        memory_scene::MemoryScene,
        parameters::{Index, Matrix, Name, Side},
        scene::{Scene, SceneExt, Space},
    };

    use super::*;
    use crate::component::{Component, ComponentKind};

    const START: DVec3 = DVec3::new(1., 15., 0.);

    fn guides(scene: &mut MemoryScene) -> LimbGuides {
        let mut guide = |name: &str, position: DVec3| {
            Guide::create(scene, name, DMat4::from_translation(position)).unwrap()
        };
        LimbGuides::new(
            guide("shoulder_guide", START),
            guide("elbow_guide", DVec3::new(4., 15., -0.3)),
            guide("wrist_guide", DVec3::new(7., 15., 0.)),
        )
    }

    fn arm(guides: LimbGuides, config: LimbConfig) -> Component {
        Component::new(
            Name::new("arm").unwrap(),
            Side::L,
            Index::new(0).unwrap(),
            ComponentKind::Limb(Limb { guides, config }),
        )
    }

    fn node(scene: &MemoryScene, suffix: &str) -> NodeRef {
        side_node(scene, Side::L, suffix)
    }

    fn side_node(scene: &MemoryScene, side: Side, suffix: &str) -> NodeRef {
        scene.find(&format!("arm_{side}_0_{suffix}")).unwrap()
    }

    /// Builds an arm allowed to stretch to twice its length on `side`.
    /// Returns the sign the side gives to x positions and rest lengths.
    fn stretchy_arm(scene: &mut MemoryScene, side: Side) -> f64 {
        let guides = guides(scene);
        let config = LimbConfig {
            max_stretch: 2.,
            ..Default::default()
        };
        let component = arm(guides, config);
        if side == Side::L {
            component.build(scene).unwrap();
            1.
        } else {
            component.mirror().unwrap().build(scene).unwrap();
            -1.
        }
    }

    fn place(scene: &mut MemoryScene, node: NodeRef, position: DVec3) {
        scene
            .set_xform(node, DMat4::from_translation(position), Space::World)
            .unwrap();
    }

    fn translate_x(scene: &MemoryScene, node: NodeRef) -> f64 {
        scene
            .get_f64(node.plug(attrs::TRANSLATE).axis(Axis::X))
            .unwrap()
    }

    fn position(scene: &MemoryScene, node: NodeRef) -> DVec3 {
        scene.world_matrix(node).unwrap().w_axis.truncate()
    }

    #[test]
    fn plan_frames_follow_the_bones() {
        let frames = [START, DVec3::new(4., 15., -0.3), DVec3::new(7., 15., 0.)]
            .map(DMat4::from_translation);
        let plan = LimbPlan::new("arm", frames, 1., &LimbConfig::default()).unwrap();

        let bone = DVec3::new(3., 0., -0.3);
        assert!((plan.rest[0] - bone.length()).abs() < 1e-12);
        assert!(
            plan.frames[0]
                .x_axis
                .truncate()
                .abs_diff_eq(bone.normalize(), 1e-12)
        );
        assert!((plan.frames[1].determinant() - 1.).abs() < 1e-12);

        let mirrored =
            frames.map(|frame| Matrix::from_dmat4(frame).mirror_axis(Axis::X).to_dmat4());
        let plan = LimbPlan::new("arm", mirrored, 1., &LimbConfig::default()).unwrap();
        assert!(plan.rest[0] < 0. && plan.rest[1] < 0.);
        assert!((plan.frames[2].determinant() - 1.).abs() < 1e-12);
    }

    #[test]
    fn collinear_guides_are_rejected() {
        let frames = [0., 1., 2.].map(|x| DMat4::from_translation(DVec3::new(x, 0., 0.)));
        assert!(matches!(
            LimbPlan::new("arm", frames, 1., &LimbConfig::default()),
            Err(RigError::InvalidLimb(..))
        ));
    }

    #[test]
    fn pole_vector_sits_in_the_plane() {
        let (a, b, c) = (DVec3::ZERO, DVec3::new(1., 0., -0.5), DVec3::new(2., 0., 0.));
        let pole = pole_vector_matrix(a, b, c, 3.).unwrap();
        let position = pole.w_axis.truncate();
        assert!(position.abs_diff_eq(DVec3::new(1., 0., -3.5), 1e-12));
        assert!((pole.determinant() - 1.).abs() < 1e-12);
        assert!(pole_vector_matrix(a, DVec3::X, c, 3.).is_none());
    }

    #[test]
    fn stretch_scales_and_clamps_segments() {
        let mut scene = memory_scene();
        let guides = guides(&mut scene);
        let config = LimbConfig {
            max_stretch: 2.,
            ..Default::default()
        };
        arm(guides, config).build(&mut scene).unwrap();

        let (ik1, ik2, ik) = (node(&scene, "ik1"), node(&scene, "ik2"), node(&scene, "ik_ctrl"));
        let rest = [translate_x(&scene, ik1), translate_x(&scene, ik2)];
        let bone = DVec3::new(3., 0., -0.3).length();
        assert!((rest[0] - bone).abs() < 1e-9);
        assert!((rest[1] - bone).abs() < 1e-9);
        let total = rest[0] + rest[1];

        for (reach, factor) in [(1.5, 1.5), (3., 2.)] {
            let target = START + DVec3::X * reach * total;
            scene
                .set_xform(ik, DMat4::from_translation(target), Space::World)
                .unwrap();
            assert!((translate_x(&scene, ik1) - factor * rest[0]).abs() < 1e-9);
            assert!((translate_x(&scene, ik2) - factor * rest[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn stretch_keeps_the_rest_sign_on_both_sides() {
        let bone = DVec3::new(3., 0., -0.3).length();
        for side in [Side::L, Side::R] {
            let mut scene = memory_scene();
            let sign = stretchy_arm(&mut scene, side);
            let ik1 = side_node(&scene, side, "ik1");
            let ik2 = side_node(&scene, side, "ik2");
            assert!((translate_x(&scene, ik1) - sign * bone).abs() < 1e-9);

            let target = START + DVec3::X * 1.5 * 2. * bone;
            let ik = side_node(&scene, side, "ik_ctrl");
            place(&mut scene, ik, target * DVec3::new(sign, 1., 1.));
            assert!((translate_x(&scene, ik1) - sign * 1.5 * bone).abs() < 1e-9);
            assert!((translate_x(&scene, ik2) - sign * 1.5 * bone).abs() < 1e-9);
        }
    }

    #[test]
    fn pole_lock_cross_fades_before_the_offsets() {
        let bone = DVec3::new(3., 0., -0.3).length();
        let pole = DVec3::new(1., 15., -4.);
        let target = START + DVec3::X * 1.5 * 2. * bone;
        let stretched = 1.5 * bone;
        let locked = [START.distance(pole), pole.distance(target)];

        for side in [Side::L, Side::R] {
            let mut scene = memory_scene();
            let sign = stretchy_arm(&mut scene, side);
            let flip = DVec3::new(sign, 1., 1.);
            let pv = side_node(&scene, side, "pv_ctrl");
            let ik = side_node(&scene, side, "ik_ctrl");
            place(&mut scene, pv, pole * flip);
            place(&mut scene, ik, target * flip);

            let settings = side_node(&scene, side, "settings_ctrl");
            let joints = [side_node(&scene, side, "ik1"), side_node(&scene, side, "ik2")];
            let check = |scene: &MemoryScene, expected: [f64; 2]| {
                for (joint, length) in joints.into_iter().zip(expected) {
                    assert!((translate_x(scene, joint) - sign * length).abs() < 1e-9);
                }
            };

            scene.set_value(settings.plug(PV_LOCK), 1.).unwrap();
            check(&scene, locked);
            // The mid joint sits on the pole, the end joint on the target.
            assert!((locked[0] - 4.).abs() < 1e-12);

            scene.set_value(settings.plug(PV_LOCK), 0.5).unwrap();
            let halfway = locked.map(|length| (length + stretched) / 2.);
            check(&scene, halfway);

            scene.set_value(settings.plug(OFF_STRETCH_A), 0.25).unwrap();
            scene.set_value(settings.plug(OFF_STRETCH_B), -0.1).unwrap();
            check(&scene, [halfway[0] + 0.25, halfway[1] - 0.1]);
        }
    }

    #[test]
    fn ik_result_reaches_the_controller() {
        let mut scene = memory_scene();
        let guides = guides(&mut scene);
        arm(guides, LimbConfig::default()).build(&mut scene).unwrap();

        let settings = node(&scene, "settings_ctrl");
        scene
            .set_value(settings.plug(SWITCH_FK_IK), 1.)
            .unwrap();
        let target = DVec3::new(5., 13., 1.);
        scene
            .set_xform(
                node(&scene, "ik_ctrl"),
                DMat4::from_translation(target),
                Space::World,
            )
            .unwrap();

        let end = position(&scene, node(&scene, "result2"));
        assert!(end.abs_diff_eq(target, 1e-6));
        assert!(position(&scene, node(&scene, "result0")).abs_diff_eq(START, 1e-9));
    }

    #[test]
    fn fk_drives_results_and_skin() {
        let mut scene = memory_scene();
        let guides = guides(&mut scene);
        let built = arm(guides, LimbConfig::default())
            .build(&mut scene)
            .unwrap();

        scene
            .set_value(
                node(&scene, "fk0_ctrl").plug(attrs::ROTATE),
                DVec3::new(0.3, 0.2, 0.4),
            )
            .unwrap();
        scene
            .set_value(
                node(&scene, "fk1_ctrl").plug(attrs::ROTATE),
                DVec3::new(0.5, 0., -0.6),
            )
            .unwrap();

        assert_eq!(
            scene.parent_of(node(&scene, "fk0_npo")).unwrap(),
            Some(node(&scene, "settings_ctrl"))
        );

        let results = ["result0", "result1", "result2"].map(|name| node(&scene, name));
        for (result, fk) in results.iter().zip(["fk0_ctrl", "fk1_ctrl", "fk2_ctrl"]) {
            assert!(
                scene
                    .world_matrix(*result)
                    .unwrap()
                    .abs_diff_eq(scene.world_matrix(node(&scene, fk)).unwrap(), 1e-9)
            );
        }

        let [p0, p1, p2] = results.map(|result| position(&scene, result));
        let skin = |name: &str| position(&scene, node(&scene, name));
        assert!(skin("skin_a0").abs_diff_eq(p0, 1e-9));
        assert!(skin("skin_a1").abs_diff_eq((p0 + p1) / 2., 1e-9));
        assert!(skin("skin_a2").abs_diff_eq(p1, 1e-9));
        assert!(skin("skin_b0").abs_diff_eq(p1, 1e-9));
        assert!(skin("skin_b2").abs_diff_eq(p2, 1e-9));

        // Results go out end first, skin joints are the influencers.
        let mut outputs = results.to_vec();
        outputs.reverse();
        assert_eq!(built.storage(StorageKind::Outputs), outputs.as_slice());
        assert_eq!(built.storage(StorageKind::Influencers).len(), 6);
    }
}
