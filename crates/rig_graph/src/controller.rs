//! Animator-facing controllers, placement groups and joints.

use bevy::math::{DMat4, DVec3};
use rig_graph_core::{
    parameters::Color,
    scene::{AttributeSpec, NodeRef, Plug, Scene, SceneExt, Space, attrs},
    transform::{Decomposed, quat_to_orient},
};
use serde::{Deserialize, Serialize};

use crate::errors::RigResult;

pub const SHAPE: &str = "shape";
pub const DISPLAY_COLOR: &str = "display_color";
pub const SHAPE_SIZE: &str = "shape_size";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerShape {
    #[default]
    Circle,
    Square,
    Cube,
    Sphere,
    Arrow,
    Cross,
    Diamond,
}

impl ControllerShape {
    pub fn to_index(self) -> i64 {
        self as i64
    }
}

#[derive(Clone, Debug)]
pub struct ControllerSpec {
    pub name: String,
    pub world: DMat4,
    pub parent: Option<NodeRef>,
    pub shape: ControllerShape,
    pub color: Color,
    pub size: f64,
}

/// A controller and the zero group ("npo") above it. The controller sits at
/// identity under the group, so its channels read zero at rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controller {
    pub npo: NodeRef,
    pub ctrl: NodeRef,
}

/// Creates a transform at `world`, under `parent` when given.
pub fn create_group(
    scene: &mut dyn Scene,
    name: &str,
    world: DMat4,
    parent: Option<NodeRef>,
) -> RigResult<NodeRef> {
    let group = scene.create_transform(name)?;
    if parent.is_some() {
        scene.parent(group, parent)?;
    }
    scene.set_xform(group, world, Space::World)?;
    Ok(group)
}

pub fn create_controller(scene: &mut dyn Scene, spec: &ControllerSpec) -> RigResult<Controller> {
    let npo = create_group(scene, &format!("{}_npo", spec.name), spec.world, spec.parent)?;
    let ctrl = create_group(scene, &format!("{}_ctrl", spec.name), spec.world, Some(npo))?;

    let [r, g, b] = spec.color.to_linear();
    scene.add_attribute(ctrl, AttributeSpec::new(SHAPE, spec.shape.to_index()))?;
    scene.add_attribute(ctrl, AttributeSpec::new(DISPLAY_COLOR, DVec3::new(r, g, b)))?;
    scene.add_attribute(ctrl, AttributeSpec::new(SHAPE_SIZE, spec.size).with_min(0.))?;

    Ok(Controller { npo, ctrl })
}

/// Creates a joint at `world` whose rest orientation lives in its joint
/// orient, leaving its rotate channels at zero.
pub fn create_placed_joint(
    scene: &mut dyn Scene,
    name: &str,
    world: DMat4,
    parent: Option<NodeRef>,
) -> RigResult<NodeRef> {
    let joint = scene.create_joint(name)?;
    if parent.is_some() {
        scene.parent(joint, parent)?;
    }
    let parent_world = match parent {
        Some(parent) => scene.world_matrix(parent)?,
        None => DMat4::IDENTITY,
    };
    let local = Decomposed::from_matrix(parent_world.inverse() * world);
    scene.set_value(joint.plug(attrs::JOINT_ORIENT), quat_to_orient(local.rotate))?;
    scene.set_xform(joint, world, Space::World)?;
    Ok(joint)
}

/// Adds a keyable scalar attribute and returns its plug.
pub fn add_float_attribute(
    scene: &mut dyn Scene,
    node: NodeRef,
    name: &str,
    default: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> RigResult<Plug> {
    let mut attribute = AttributeSpec::new(name, default).keyable();
    attribute.min = min;
    attribute.max = max;
    scene.add_attribute(node, attribute)?;
    Ok(node.plug(name))
}

#[cfg(test)]
mod tests {
    use bevy::math::DQuat;
    use rig_graph_builtin_nodes::memory_scene;

    use super::*;

    #[test]
    fn controller_reads_zero_at_rest() {
        let mut scene = memory_scene();
        let world = DMat4::from_rotation_translation(
            DQuat::from_rotation_x(0.4),
            DVec3::new(1., 2., 3.),
        );
        let controller = create_controller(
            &mut scene,
            &ControllerSpec {
                name: "arm_L_0_fk0".into(),
                world,
                parent: None,
                shape: ControllerShape::Cube,
                color: Color::BLUE,
                size: 2.,
            },
        )
        .unwrap();

        assert!(scene.world_matrix(controller.ctrl).unwrap().abs_diff_eq(world, 1e-9));
        assert!(
            scene
                .get_vec3(controller.ctrl.plug(attrs::TRANSLATE))
                .unwrap()
                .abs_diff_eq(DVec3::ZERO, 1e-9)
        );
        assert_eq!(
            scene.get(controller.ctrl.plug(SHAPE)).unwrap().as_int().unwrap(),
            ControllerShape::Cube.to_index()
        );
        assert!(scene.exists("arm_L_0_fk0_npo"));
    }

    #[test]
    fn placed_joint_keeps_rotation_in_orient() {
        let mut scene = memory_scene();
        let parent = create_group(
            &mut scene,
            "parent",
            DMat4::from_rotation_z(0.3),
            None,
        )
        .unwrap();
        let world = DMat4::from_rotation_translation(
            DQuat::from_rotation_y(1.1),
            DVec3::new(0., 2., 0.),
        );
        let joint = create_placed_joint(&mut scene, "joint", world, Some(parent)).unwrap();

        assert!(scene.world_matrix(joint).unwrap().abs_diff_eq(world, 1e-9));
        assert!(
            scene
                .get_vec3(joint.plug(attrs::ROTATE))
                .unwrap()
                .abs_diff_eq(DVec3::ZERO, 1e-9)
        );
    }

    #[test]
    fn float_attributes_are_clamped() {
        let mut scene = memory_scene();
        let node = scene.create_transform("settings").unwrap();
        let plug =
            add_float_attribute(&mut scene, node, "switch_fk_ik", 0., Some(0.), Some(1.)).unwrap();
        scene.set_value(plug.clone(), 3.).unwrap();
        assert_eq!(scene.get_f64(plug).unwrap(), 1.);
    }
}
