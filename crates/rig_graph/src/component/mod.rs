//! The component model: a parameterised piece of rig that builds its nodes
//! into the scene and publishes them in named collections.

mod arm;
mod clavicle;
mod fk_chain;
mod hand;
mod leg;
pub mod limb;
mod one_ctrl;

pub use arm::*;
pub use clavicle::*;
pub use fk_chain::*;
pub use hand::*;
pub use leg::*;
pub use limb::{Limb, LimbConfig, LimbGuides};
pub use one_ctrl::*;

use bevy::{log::info, math::DMat4};
use rig_graph_core::{
    parameters::{Color, Index, Name, Parameter, Side, UnsignedFloat},
    scene::{AttributeSpec, NodeKind, NodeRef, Scene, attrs},
};
use serde::{Deserialize, Serialize};

use crate::{
    constraint::{ConstraintFlags, ConstraintTarget, MatrixSource, matrix_constraint},
    controller::{
        Controller, ControllerShape, ControllerSpec, create_controller, create_group,
        create_placed_joint,
    },
    errors::{RigError, RigResult},
};

/// The collections a built component publishes on its folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StorageKind {
    /// Primary animator-facing controllers.
    Interfaces,
    /// Transforms other components may drive.
    Inputs,
    /// Transforms other components may follow. Newest first.
    Outputs,
    Controllers,
    /// Deforming joints.
    Influencers,
}

impl StorageKind {
    pub const ALL: [Self; 5] = [
        Self::Interfaces,
        Self::Inputs,
        Self::Outputs,
        Self::Controllers,
        Self::Influencers,
    ];

    /// Name of the folder attribute holding this collection.
    pub fn attr(self) -> &'static str {
        match self {
            StorageKind::Interfaces => "interfaces",
            StorageKind::Inputs => "inputs",
            StorageKind::Outputs => "outputs",
            StorageKind::Controllers => "controllers",
            StorageKind::Influencers => "influencers",
        }
    }

    pub fn from_attr(attr: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.attr() == attr)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Storage {
    pub interfaces: Vec<NodeRef>,
    pub inputs: Vec<NodeRef>,
    pub outputs: Vec<NodeRef>,
    pub controllers: Vec<NodeRef>,
    pub influencers: Vec<NodeRef>,
}

impl Storage {
    pub fn get(&self, kind: StorageKind) -> &[NodeRef] {
        match kind {
            StorageKind::Interfaces => &self.interfaces,
            StorageKind::Inputs => &self.inputs,
            StorageKind::Outputs => &self.outputs,
            StorageKind::Controllers => &self.controllers,
            StorageKind::Influencers => &self.influencers,
        }
    }

    /// Appends `node`, except for outputs which are inserted first.
    pub fn push(&mut self, kind: StorageKind, node: NodeRef) {
        match kind {
            StorageKind::Interfaces => self.interfaces.push(node),
            StorageKind::Inputs => self.inputs.push(node),
            StorageKind::Outputs => self.outputs.insert(0, node),
            StorageKind::Controllers => self.controllers.push(node),
            StorageKind::Influencers => self.influencers.push(node),
        }
    }
}

/// A component after [`Component::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltComponent {
    pub name: String,
    pub folder: NodeRef,
    pub storage: Storage,
    pub children: Vec<NodeRef>,
}

impl BuiltComponent {
    pub fn storage(&self, kind: StorageKind) -> &[NodeRef] {
        self.storage.get(kind)
    }

    pub fn entry(&self, kind: StorageKind, index: usize) -> RigResult<NodeRef> {
        self.storage(kind)
            .get(index)
            .copied()
            .ok_or_else(|| RigError::MissingStorageEntry {
                component: self.name.clone(),
                storage: kind,
                index,
            })
    }
}

/// Where a node was published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ownership {
    pub component: String,
    pub storage: StorageKind,
    pub index: usize,
}

/// Components publishing `node`, found through its `receiver` connections.
pub fn owner_of(scene: &dyn Scene, node: NodeRef) -> RigResult<Vec<Ownership>> {
    let receiver = node.plug(attrs::RECEIVER);
    let mut owners = Vec::new();
    for index in scene.multi_indices(receiver.clone())? {
        let Some(source) = scene.source(receiver.clone().at(index))? else {
            continue;
        };
        let (Some(storage), Some(index)) = (StorageKind::from_attr(source.attr()), source.id.index)
        else {
            continue;
        };
        owners.push(Ownership {
            component: scene.node_name(source.node)?,
            storage,
            index,
        });
    }
    Ok(owners)
}

/// The body of a component: what it builds from its guides.
pub trait ComponentBody {
    fn mirrored(&self) -> Self;
    fn build(&self, ctx: &mut BuildContext) -> RigResult<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ComponentKind {
    OneCtrl(OneCtrl),
    FkChain(FkChain),
    Limb(Limb),
    Arm(Arm),
    Leg(Leg),
    Hand(Hand),
    Clavicle(Clavicle),
}

impl ComponentKind {
    fn mirrored(&self) -> Self {
        match self {
            ComponentKind::OneCtrl(body) => ComponentKind::OneCtrl(body.mirrored()),
            ComponentKind::FkChain(body) => ComponentKind::FkChain(body.mirrored()),
            ComponentKind::Limb(body) => ComponentKind::Limb(body.mirrored()),
            ComponentKind::Arm(body) => ComponentKind::Arm(body.mirrored()),
            ComponentKind::Leg(body) => ComponentKind::Leg(body.mirrored()),
            ComponentKind::Hand(body) => ComponentKind::Hand(body.mirrored()),
            ComponentKind::Clavicle(body) => ComponentKind::Clavicle(body.mirrored()),
        }
    }

    fn build(&self, ctx: &mut BuildContext) -> RigResult<()> {
        match self {
            ComponentKind::OneCtrl(body) => body.build(ctx),
            ComponentKind::FkChain(body) => body.build(ctx),
            ComponentKind::Limb(body) => body.build(ctx),
            ComponentKind::Arm(body) => body.build(ctx),
            ComponentKind::Leg(body) => body.build(ctx),
            ComponentKind::Hand(body) => body.build(ctx),
            ComponentKind::Clavicle(body) => body.build(ctx),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: Name,
    pub side: Side,
    pub index: Index,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub size: UnsignedFloat,
    #[serde(default)]
    pub bilateral: bool,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(name: Name, side: Side, index: Index, kind: ComponentKind) -> Self {
        Self {
            name,
            side,
            index,
            color: Color::default(),
            size: UnsignedFloat::ONE,
            bilateral: false,
            kind,
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    pub fn with_size(self, size: UnsignedFloat) -> Self {
        Self { size, ..self }
    }

    pub fn bilateral(self) -> Self {
        Self {
            bilateral: true,
            ..self
        }
    }

    /// `"{name}_{side}_{index}"`, unique per scene.
    pub fn display_name(&self) -> String {
        format!("{}_{}_{}", self.name, self.side, self.index)
    }

    /// The same component on the other side of the character.
    pub fn mirror(&self) -> RigResult<Self> {
        let side = self
            .side
            .mirrored()
            .ok_or_else(|| RigError::NotMirrorable(self.display_name()))?;
        Ok(Self {
            name: self.name.clone(),
            side,
            index: self.index,
            color: self.color.mirror()?,
            size: self.size,
            bilateral: self.bilateral,
            kind: self.kind.mirrored(),
        })
    }

    /// Builds the component and its folder. Fails before touching the scene
    /// if the folder already exists.
    pub fn build(&self, scene: &mut dyn Scene) -> RigResult<BuiltComponent> {
        let display = self.display_name();
        if scene.exists(&display) {
            return Err(RigError::FolderExists(display));
        }
        info!("Building component {}", self.display_name());

        let mut ctx = BuildContext {
            scene,
            component: self,
            display,
            storage: Storage::default(),
            children: Vec::new(),
        };
        self.kind.build(&mut ctx)?;
        ctx.build_folder()
    }
}

/// Scene access and bookkeeping shared by every component body while it
/// builds. Nodes created without a parent become children of the folder.
pub struct BuildContext<'a> {
    pub scene: &'a mut dyn Scene,
    pub component: &'a Component,
    display: String,
    pub storage: Storage,
    pub children: Vec<NodeRef>,
}

impl BuildContext<'_> {
    pub fn display_name(&self) -> &str {
        &self.display
    }

    /// Read access to the scene.
    pub fn view(&self) -> &dyn Scene {
        &*self.scene
    }

    pub fn name(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.display)
    }

    pub fn publish(&mut self, kind: StorageKind, node: NodeRef) {
        self.storage.push(kind, node);
    }

    fn adopt(&mut self, node: NodeRef, parent: Option<NodeRef>) {
        if parent.is_none() {
            self.children.push(node);
        }
    }

    pub fn group(
        &mut self,
        suffix: &str,
        world: DMat4,
        parent: Option<NodeRef>,
    ) -> RigResult<NodeRef> {
        let name = self.name(suffix);
        let group = create_group(self.scene, &name, world, parent)?;
        self.adopt(group, parent);
        Ok(group)
    }

    /// A controller in the component color, registered as a controller.
    pub fn controller(
        &mut self,
        suffix: &str,
        world: DMat4,
        parent: Option<NodeRef>,
        shape: ControllerShape,
    ) -> RigResult<Controller> {
        let spec = ControllerSpec {
            name: self.name(suffix),
            world,
            parent,
            shape,
            color: self.component.color,
            size: self.component.size.get(),
        };
        let controller = create_controller(self.scene, &spec)?;
        self.adopt(controller.npo, parent);
        self.publish(StorageKind::Controllers, controller.ctrl);
        Ok(controller)
    }

    pub fn joint(
        &mut self,
        suffix: &str,
        world: DMat4,
        parent: Option<NodeRef>,
    ) -> RigResult<NodeRef> {
        let name = self.name(suffix);
        let joint = create_placed_joint(self.scene, &name, world, parent)?;
        self.adopt(joint, parent);
        Ok(joint)
    }

    /// A dependency node. These never join the hierarchy.
    pub fn node(&mut self, kind: NodeKind, suffix: &str) -> RigResult<NodeRef> {
        let name = self.name(suffix);
        Ok(self.scene.create_node(kind, &name)?)
    }

    pub fn constraint(
        &mut self,
        suffix: &str,
        sources: &[MatrixSource],
        target: impl Into<ConstraintTarget>,
        flags: ConstraintFlags,
    ) -> RigResult<NodeRef> {
        let name = self.name(suffix);
        matrix_constraint(self.scene, &name, sources, target.into(), flags)
    }

    /// Groups the children under the folder and publishes every collection
    /// as indexed message connections into each node's `receiver`.
    fn build_folder(self) -> RigResult<BuiltComponent> {
        let folder = self.scene.create_transform(&self.display)?;
        for child in &self.children {
            self.scene.parent(*child, Some(folder))?;
        }

        for kind in StorageKind::ALL {
            self.scene
                .add_attribute(folder, AttributeSpec::message_array(kind.attr()))?;
            for (index, node) in self.storage.get(kind).iter().enumerate() {
                let receiver = node.plug(attrs::RECEIVER);
                let next = self
                    .scene
                    .multi_indices(receiver.clone())?
                    .last()
                    .map_or(0, |last| last + 1);
                self.scene
                    .connect(folder.plug(kind.attr()).at(index), receiver.at(next))?;
            }
        }

        Ok(BuiltComponent {
            name: self.display,
            folder,
            storage: self.storage,
            children: self.children,
        })
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::DVec3;
    use rig_graph_builtin_nodes::memory_scene;

    use super::*;
    use crate::guide::Guide;

    fn one_ctrl(scene: &mut dyn Scene, side: Side) -> Component {
        let guide_name = format!("head_{side}_guide");
        if !scene.exists(&guide_name) {
            Guide::create(
                scene,
                &guide_name,
                DMat4::from_translation(DVec3::new(1., 10., 0.)),
            )
            .unwrap();
        }
        Component::new(
            Name::new("head").unwrap(),
            side,
            Index::new(0).unwrap(),
            ComponentKind::OneCtrl(OneCtrl::new(Guide::new(guide_name))),
        )
    }

    #[test]
    fn outputs_are_prepended() {
        let mut storage = Storage::default();
        let (a, b) = (NodeRef::from_index(1), NodeRef::from_index(2));
        storage.push(StorageKind::Outputs, a);
        storage.push(StorageKind::Outputs, b);
        storage.push(StorageKind::Inputs, a);
        storage.push(StorageKind::Inputs, b);
        assert_eq!(storage.outputs, vec![b, a]);
        assert_eq!(storage.inputs, vec![a, b]);
    }

    #[test]
    fn folder_publishes_storage() {
        let mut scene = memory_scene();
        let component = one_ctrl(&mut scene, Side::C);
        let built = component.build(&mut scene).unwrap();

        assert_eq!(built.name, "head_C_0");
        assert_eq!(scene.find("head_C_0"), Some(built.folder));
        for child in &built.children {
            assert_eq!(scene.parent_of(*child).unwrap(), Some(built.folder));
        }

        let ctrl = built.entry(StorageKind::Interfaces, 0).unwrap();
        let owners = owner_of(&scene, ctrl).unwrap();
        assert!(owners.contains(&Ownership {
            component: "head_C_0".into(),
            storage: StorageKind::Interfaces,
            index: 0,
        }));
        assert!(owners.contains(&Ownership {
            component: "head_C_0".into(),
            storage: StorageKind::Controllers,
            index: 0,
        }));
        assert_eq!(
            built.entry(StorageKind::Influencers, 3),
            Err(RigError::MissingStorageEntry {
                component: "head_C_0".into(),
                storage: StorageKind::Influencers,
                index: 3,
            })
        );
    }

    #[test]
    fn building_twice_fails_without_changes() {
        let mut scene = memory_scene();
        let component = one_ctrl(&mut scene, Side::L);
        component.build(&mut scene).unwrap();
        let count = scene.node_count();

        assert_eq!(
            component.build(&mut scene),
            Err(RigError::FolderExists("head_L_0".into()))
        );
        assert_eq!(scene.node_count(), count);
    }

    #[test]
    fn mirroring_flips_side_and_guides() {
        let mut scene = memory_scene();
        let component = one_ctrl(&mut scene, Side::L).with_color(Color::RED);
        let mirrored = component.mirror().unwrap();

        assert_eq!(mirrored.side, Side::R);
        assert_eq!(mirrored.color, Color::RED.mirror().unwrap());
        assert_eq!(mirrored.mirror().unwrap().kind, component.kind);

        let center = one_ctrl(&mut scene, Side::C);
        assert_eq!(
            center.mirror(),
            Err(RigError::NotMirrorable("head_C_0".into()))
        );
    }
}
