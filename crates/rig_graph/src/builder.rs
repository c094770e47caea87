//! Builds a whole rig: a named set of components, their mirrors and the
//! connections between them.

use bevy::log::info;
use indexmap::IndexMap;
use rig_graph_core::scene::{NodeRef, Scene};
use serde::{Deserialize, Serialize};

use crate::{
    component::{BuiltComponent, Component},
    connection::Connection,
    errors::{RigError, RigResult},
};

/// Name of the transform every component folder is parented under.
pub const RIG_FOLDER: &str = "rig";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentBuilder {
    #[serde(default)]
    pub components: IndexMap<String, Component>,
    #[serde(default)]
    pub connections: IndexMap<String, Connection>,
}

/// Handles produced by [`ComponentBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltRig {
    pub folder: NodeRef,
    pub primary: IndexMap<String, BuiltComponent>,
    /// Mirrors of the bilateral components, under the same keys.
    pub mirrored: IndexMap<String, BuiltComponent>,
    /// Blend nodes per connection; two for bilateral connections.
    pub connections: IndexMap<String, Vec<NodeRef>>,
}

impl ComponentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, key: impl Into<String>, component: Component) -> &mut Self {
        self.components.insert(key.into(), component);
        self
    }

    pub fn add_connection(&mut self, key: impl Into<String>, connection: Connection) -> &mut Self {
        self.connections.insert(key.into(), connection);
        self
    }

    /// Checks that every connection references a component, and a bilateral
    /// one when the connection is bilateral.
    fn validate(&self) -> RigResult<()> {
        for (name, connection) in &self.connections {
            for key in connection.components() {
                let found = self
                    .components
                    .get(key)
                    .is_some_and(|component| !connection.bilateral || component.bilateral);
                if !found {
                    return Err(RigError::MissingComponent {
                        connection: name.clone(),
                        component: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn build(&self, scene: &mut dyn Scene) -> RigResult<BuiltRig> {
        self.validate()?;
        info!(
            "Building rig with {} components and {} connections",
            self.components.len(),
            self.connections.len()
        );

        let folder = match scene.find(RIG_FOLDER) {
            Some(folder) => folder,
            None => scene.create_transform(RIG_FOLDER)?,
        };

        let mut primary = IndexMap::new();
        let mut mirrored = IndexMap::new();
        for (key, component) in &self.components {
            let built = component.build(scene)?;
            scene.parent(built.folder, Some(folder))?;
            primary.insert(key.clone(), built);

            if component.bilateral {
                let built = component.mirror()?.build(scene)?;
                scene.parent(built.folder, Some(folder))?;
                mirrored.insert(key.clone(), built);
            }
        }

        let mut connections = IndexMap::new();
        for (name, connection) in &self.connections {
            let mut blends = vec![connection.build(name, scene, &primary)?];
            if connection.bilateral {
                blends.push(connection.build(name, scene, &mirrored)?);
            }
            connections.insert(name.clone(), blends);
        }

        Ok(BuiltRig {
            folder,
            primary,
            mirrored,
            connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{DMat4, DVec3};
    use rig_graph_builtin_nodes::{BlendMatrixNode, memory_scene};
    use rig_graph_core::{
        memory_scene::MemoryScene,
        parameters::{Index, Name, Side},
        scene::{SceneExt, attrs},
    };

    use super::*;
    use crate::{
        component::{Arm, ComponentKind, Leg, LegGuides, LimbGuides, OneCtrl, StorageKind},
        connection::StorageRef,
        guide::Guide,
    };

    fn guide(scene: &mut MemoryScene, name: &str, position: DVec3) -> Guide {
        Guide::create(scene, name, DMat4::from_translation(position)).unwrap()
    }

    fn arm_and_leg(scene: &mut MemoryScene) -> ComponentBuilder {
        let arm = LimbGuides::new(
            guide(scene, "shoulder", DVec3::new(2., 14., 0.)),
            guide(scene, "elbow", DVec3::new(5., 14., -0.5)),
            guide(scene, "wrist", DVec3::new(8., 14., 0.)),
        );
        let leg = LegGuides {
            hip: guide(scene, "hip", DVec3::new(1., 10., 0.)),
            knee: guide(scene, "knee", DVec3::new(1., 5.5, 0.5)),
            ankle: guide(scene, "ankle", DVec3::new(1., 1., 0.)),
            ball: guide(scene, "ball", DVec3::new(1., 0.2, 1.2)),
            toe: guide(scene, "toe", DVec3::new(1., 0., 2.)),
            heel: guide(scene, "heel", DVec3::new(1., 0., -0.5)),
        };

        let mut builder = ComponentBuilder::new();
        builder
            .add_component(
                "arm",
                Component::new(
                    Name::new("arm").unwrap(),
                    Side::L,
                    Index::new(0).unwrap(),
                    ComponentKind::Arm(Arm::new(arm)),
                )
                .bilateral(),
            )
            .add_component(
                "leg",
                Component::new(
                    Name::new("leg").unwrap(),
                    Side::L,
                    Index::new(0).unwrap(),
                    ComponentKind::Leg(Leg::new(leg)),
                )
                .bilateral(),
            )
            .add_connection(
                "arm_to_leg",
                Connection::new(
                    vec![StorageRef::outputs("arm", 0)],
                    StorageRef::inputs("leg", 0),
                )
                .bilateral(),
            );
        builder
    }

    #[test]
    fn bilateral_connection_wires_each_side() {
        let mut scene = memory_scene();
        let rig = arm_and_leg(&mut scene).build(&mut scene).unwrap();

        assert_eq!(rig.primary["leg"].name, "leg_L_0");
        assert_eq!(rig.mirrored["leg"].name, "leg_R_0");
        for built in rig.primary.values().chain(rig.mirrored.values()) {
            assert_eq!(scene.parent_of(built.folder).unwrap(), Some(rig.folder));
        }

        let blends = &rig.connections["arm_to_leg"];
        assert_eq!(blends.len(), 2);
        for (blend, side) in blends.iter().zip([&rig.primary, &rig.mirrored]) {
            let arm_output = side["arm"].entry(StorageKind::Outputs, 0).unwrap();
            let leg_input = side["leg"].entry(StorageKind::Inputs, 0).unwrap();

            let source = scene
                .source(blend.plug(BlendMatrixNode::MATRIX_IN).at(0))
                .unwrap();
            assert_eq!(source, Some(arm_output.plug(attrs::WORLD_MATRIX)));
            assert_eq!(
                scene.source(leg_input.plug(attrs::TRANSLATE)).unwrap(),
                Some(blend.plug(BlendMatrixNode::TRANSLATE))
            );

            // Offsets are kept, so nothing moves at rest.
            let offset = scene
                .get_matrix(blend.plug(BlendMatrixNode::OFFSET).at(0))
                .unwrap();
            assert!(!offset.abs_diff_eq(DMat4::IDENTITY, 1e-9));
        }

        let hip = |name: &str| {
            let node = scene.find(name).unwrap();
            scene.world_matrix(node).unwrap().w_axis.truncate()
        };
        assert!(hip("leg_L_0_root").abs_diff_eq(DVec3::new(1., 10., 0.), 1e-9));
        assert!(hip("leg_R_0_root").abs_diff_eq(DVec3::new(-1., 10., 0.), 1e-9));
    }

    #[test]
    fn missing_components_fail_before_building() {
        let mut scene = memory_scene();
        let head = guide(&mut scene, "head", DVec3::new(0., 16., 0.));
        let mut builder = ComponentBuilder::new();
        builder
            .add_component(
                "head",
                Component::new(
                    Name::new("head").unwrap(),
                    Side::C,
                    Index::new(0).unwrap(),
                    ComponentKind::OneCtrl(OneCtrl::new(head)),
                ),
            )
            .add_connection(
                "neck",
                Connection::new(
                    vec![StorageRef::outputs("spine", 0)],
                    StorageRef::inputs("head", 0),
                ),
            );
        let count = scene.node_count();

        assert_eq!(
            builder.build(&mut scene),
            Err(RigError::MissingComponent {
                connection: "neck".into(),
                component: "spine".into(),
            })
        );
        assert_eq!(scene.node_count(), count);
        assert!(!scene.exists(RIG_FOLDER));
    }

    #[test]
    fn bilateral_connections_need_bilateral_components() {
        let mut scene = memory_scene();
        let mut builder = arm_and_leg(&mut scene);
        builder.components["leg"].bilateral = false;

        assert!(matches!(
            builder.build(&mut scene),
            Err(RigError::MissingComponent { component, .. }) if component == "leg"
        ));
    }
}
