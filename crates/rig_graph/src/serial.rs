//! RON persistence for rig descriptions and guide placement.

use std::io::{Read, Write};

use bevy::log::info;
use indexmap::IndexMap;
use rig_graph_core::{
    parameters::Matrix,
    scene::{Scene, SceneExt, Space},
};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::{
    builder::ComponentBuilder,
    errors::{RigError, RigResult},
};

/// A persisted [`ComponentBuilder`]. Components are written as externally
/// tagged variants of their kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigDocument {
    pub version: u32,
    pub builder: ComponentBuilder,
}

impl RigDocument {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(builder: ComponentBuilder) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            builder,
        }
    }

    pub fn to_ron(builder: &ComponentBuilder) -> RigResult<String> {
        Ok(ron::ser::to_string_pretty(
            &Self::new(builder.clone()),
            PrettyConfig::default(),
        )?)
    }

    pub fn from_ron(source: &str) -> RigResult<ComponentBuilder> {
        ron::de::from_str::<Self>(source)?.into_builder()
    }

    pub fn write(&self, writer: impl Write) -> RigResult<()> {
        ron::Options::default().to_io_writer_pretty(writer, self, PrettyConfig::default())?;
        Ok(())
    }

    pub fn read(reader: impl Read) -> RigResult<ComponentBuilder> {
        ron::de::from_reader::<_, Self>(reader)?.into_builder()
    }

    fn into_builder(self) -> RigResult<ComponentBuilder> {
        if self.version != Self::CURRENT_VERSION {
            return Err(RigError::UnsupportedVersion(self.version));
        }
        Ok(self.builder)
    }
}

/// World matrices of guides, by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideSnapshot {
    pub guides: IndexMap<String, Matrix>,
}

impl GuideSnapshot {
    pub fn capture<S: AsRef<str>>(
        scene: &dyn Scene,
        names: impl IntoIterator<Item = S>,
    ) -> RigResult<Self> {
        let mut guides = IndexMap::new();
        for name in names {
            let name = name.as_ref();
            let node = scene
                .find(name)
                .ok_or_else(|| RigError::MissingGuide(name.to_string()))?;
            guides.insert(name.to_string(), Matrix::from_dmat4(scene.world_matrix(node)?));
        }
        Ok(Self { guides })
    }

    /// Places every guide, creating the ones the scene lacks.
    pub fn apply(&self, scene: &mut dyn Scene) -> RigResult<()> {
        info!("Placing {} guides", self.guides.len());
        for (name, matrix) in &self.guides {
            let node = match scene.find(name) {
                Some(node) => node,
                None => scene.create_transform(name)?,
            };
            scene.set_xform(node, matrix.to_dmat4(), Space::World)?;
        }
        Ok(())
    }

    pub fn to_ron(&self) -> RigResult<String> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn from_ron(source: &str) -> RigResult<Self> {
        Ok(ron::de::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{DMat4, DQuat, DVec3};
    use rig_graph_builtin_nodes::memory_scene;
    use rig_graph_core::parameters::{Color, Index, Name, Side};

    use super::*;
    use crate::{
        component::{
            Clavicle, Component, ComponentKind, FkChain, Hand, Leg, LegGuides, Limb, LimbConfig,
            LimbGuides, OneCtrl,
        },
        connection::{Connection, StorageRef},
        constraint::ConstraintFlags,
        controller::ControllerShape,
        guide::Guide,
    };

    fn component(name: &str, side: Side, kind: ComponentKind) -> Component {
        Component::new(Name::new(name).unwrap(), side, Index::new(0).unwrap(), kind)
    }

    fn builder() -> ComponentBuilder {
        let limb = LimbGuides::new(
            Guide::new("shoulder"),
            Guide::new("elbow"),
            Guide::new("wrist"),
        );
        let leg = LegGuides {
            hip: Guide::new("hip"),
            knee: Guide::new("knee"),
            ankle: Guide::new("ankle"),
            ball: Guide::new("ball"),
            toe: Guide::new("toe"),
            heel: Guide::new("heel"),
        };
        let mut builder = ComponentBuilder::new();
        builder
            .add_component(
                "root",
                component(
                    "root",
                    Side::C,
                    ComponentKind::OneCtrl(OneCtrl {
                        guide: Guide::new("root"),
                        shape: ControllerShape::Square,
                    }),
                ),
            )
            .add_component(
                "spine",
                component(
                    "spine",
                    Side::C,
                    ComponentKind::FkChain(FkChain::new(vec![
                        Guide::new("spine0"),
                        Guide::new("spine1"),
                    ])),
                ),
            )
            .add_component(
                "limb",
                component(
                    "limb",
                    Side::L,
                    ComponentKind::Limb(Limb {
                        guides: limb,
                        config: LimbConfig {
                            pv_distance: 2.5,
                            first_section: 4,
                            ..LimbConfig::default()
                        },
                    }),
                )
                .with_color(Color::RED)
                .bilateral(),
            )
            .add_component(
                "leg",
                component("leg", Side::R, ComponentKind::Leg(Leg::new(leg))),
            )
            .add_component(
                "hand",
                component(
                    "hand",
                    Side::L,
                    ComponentKind::Hand(Hand::new(
                        Guide::new("hand"),
                        vec![vec![Guide::new("index0"), Guide::new("index1")]],
                    )),
                ),
            )
            .add_component(
                "clavicle",
                component(
                    "clavicle",
                    Side::L,
                    ComponentKind::Clavicle(Clavicle::new(
                        Guide::new("clavicle"),
                        Guide::new("shoulder"),
                    )),
                ),
            )
            .add_connection(
                "spine_to_limb",
                Connection::new(
                    vec![StorageRef::outputs("spine", 0), StorageRef::outputs("root", 0)],
                    StorageRef::inputs("limb", 0),
                )
                .with_flags(ConstraintFlags {
                    scale: false,
                    ..ConstraintFlags::ALL
                }),
            );
        builder
    }

    #[test]
    fn builder_round_trips() {
        let builder = builder();
        let text = RigDocument::to_ron(&builder).unwrap();
        assert!(text.contains("Clavicle("));
        assert_eq!(RigDocument::from_ron(&text).unwrap(), builder);

        let mut bytes = Vec::new();
        RigDocument::new(builder.clone()).write(&mut bytes).unwrap();
        assert_eq!(RigDocument::read(bytes.as_slice()).unwrap(), builder);
    }

    #[test]
    fn optional_fields_use_defaults() {
        let text = r#"(
            version: 1,
            builder: (
                components: {
                    "head": (
                        name: "head",
                        side: "C",
                        index: 0,
                        kind: OneCtrl((guide: (name: "head"))),
                    ),
                },
            ),
        )"#;
        let builder = RigDocument::from_ron(text).unwrap();
        let head = &builder.components["head"];
        assert_eq!(head.color, Color::default());
        assert!(!head.bilateral);
        assert!(builder.connections.is_empty());
    }

    #[test]
    fn invalid_documents_are_rejected() {
        let future = RigDocument {
            version: 7,
            builder: ComponentBuilder::new(),
        };
        let text = ron::ser::to_string(&future).unwrap();
        assert_eq!(
            RigDocument::from_ron(&text),
            Err(RigError::UnsupportedVersion(7))
        );

        let bad_name = r#"(version: 1, builder: (components: {"x": (name: "1x", side: "C", index: 0, kind: OneCtrl((guide: (name: "x"))))}))"#;
        assert!(matches!(
            RigDocument::from_ron(bad_name),
            Err(RigError::Document(_))
        ));
    }

    #[test]
    fn guide_snapshot_restores_placement() {
        let mut scene = memory_scene();
        let world = DMat4::from_rotation_translation(
            DQuat::from_rotation_y(0.4),
            DVec3::new(1., 2., 3.),
        );
        Guide::create(&mut scene, "hip", world).unwrap();
        let snapshot = GuideSnapshot::capture(&scene, ["hip"]).unwrap();
        let text = snapshot.to_ron().unwrap();

        let mut other = memory_scene();
        GuideSnapshot::from_ron(&text).unwrap().apply(&mut other).unwrap();
        let hip = other.find("hip").unwrap();
        assert!(other.world_matrix(hip).unwrap().abs_diff_eq(world, 1e-9));

        assert_eq!(
            GuideSnapshot::capture(&scene, ["knee"]),
            Err(RigError::MissingGuide("knee".into()))
        );
    }
}
