//! In-process [`Scene`] backend.
//!
//! Evaluation is pull based: reading an output evaluates the owning node,
//! which resolves its inputs (and through them, everything upstream). Node
//! outputs are cached until the next mutation of the scene.

use std::cell::RefCell;

use bevy::{log::debug, math::DMat4, platform::collections::HashMap};
use indexmap::IndexMap;

use crate::{
    edge_data::{DataSpec, DataValue},
    errors::{GraphValidationError, SceneError, SceneResult},
    node::{InputResolver, NodeContext, NodeLike, NodeRegistry, NodeSpec},
    scene::{
        AttributeSpec, Axis, NodeKind, NodeRef, Plug, PlugId, Scene, Space, attrs,
    },
    transform::{RotateOrder, TransformChannels},
};

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    kind: NodeKind,
    node: Box<dyn NodeLike>,
    spec: NodeSpec,
    dynamic: IndexMap<String, AttributeSpec>,
    /// Stored input values, keyed without axis selection.
    values: HashMap<PlugId, DataValue>,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

#[derive(Debug, Clone)]
struct AttrInfo {
    spec: DataSpec,
    default: DataValue,
    multi: bool,
    is_output: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl AttrInfo {
    fn clamp(&self, value: DataValue) -> DataValue {
        match value {
            DataValue::F64(mut v) => {
                if let Some(min) = self.min {
                    v = v.max(min);
                }
                if let Some(max) = self.max {
                    v = v.min(max);
                }
                DataValue::F64(v)
            }
            other => other,
        }
    }

    fn plug_spec(&self, id: &PlugId) -> DataSpec {
        if id.axis.is_some() {
            DataSpec::F64
        } else {
            self.spec
        }
    }
}

pub struct MemoryScene {
    registry: NodeRegistry,
    nodes: Vec<SceneNode>,
    names: HashMap<String, NodeRef>,
    /// Incoming connection of every driven plug, keyed by the target.
    edges: HashMap<Plug, Plug>,
    cache: RefCell<HashMap<NodeRef, HashMap<String, DataValue>>>,
    evaluating: RefCell<Vec<NodeRef>>,
}

impl MemoryScene {
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            names: HashMap::default(),
            edges: HashMap::default(),
            cache: RefCell::new(HashMap::default()),
            evaluating: RefCell::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        (0..self.nodes.len()).map(NodeRef::from_index)
    }

    pub fn connection_count(&self) -> usize {
        self.edges.len()
    }

    fn node(&self, node: NodeRef) -> SceneResult<&SceneNode> {
        self.nodes
            .get(node.index())
            .ok_or(SceneError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeRef) -> SceneResult<&mut SceneNode> {
        self.nodes
            .get_mut(node.index())
            .ok_or(SceneError::UnknownNode(node))
    }

    fn invalidate(&mut self) {
        self.cache.get_mut().clear();
    }

    fn attr_info(&self, node: NodeRef, attr: &str) -> SceneResult<AttrInfo> {
        let scene_node = self.node(node)?;
        if let Some(pin) = scene_node.spec.inputs.get(attr) {
            return Ok(AttrInfo {
                spec: pin.spec,
                default: pin.default,
                multi: pin.multi,
                is_output: false,
                min: None,
                max: None,
            });
        }
        if let Some(pin) = scene_node.spec.outputs.get(attr) {
            return Ok(AttrInfo {
                spec: pin.spec,
                default: pin.default,
                multi: pin.multi,
                is_output: true,
                min: None,
                max: None,
            });
        }
        if let Some(attribute) = scene_node.dynamic.get(attr) {
            return Ok(AttrInfo {
                spec: attribute.spec,
                default: attribute.default,
                multi: attribute.multi,
                is_output: false,
                min: attribute.min,
                max: attribute.max,
            });
        }
        Err(SceneError::UnknownPlug(node.plug(attr)))
    }

    /// Checks that `plug` addresses a value: an element of a multi
    /// attribute, or a plain attribute, optionally narrowed to one axis.
    fn validate(&self, plug: &Plug) -> SceneResult<AttrInfo> {
        let info = self.validate_partial(plug)?;
        if info.multi && plug.id.index.is_none() {
            return Err(GraphValidationError::MissingIndex(plug.clone()).into());
        }
        Ok(info)
    }

    /// Like [`Self::validate`], but a multi attribute may be addressed as a
    /// whole.
    fn validate_partial(&self, plug: &Plug) -> SceneResult<AttrInfo> {
        let info = self.attr_info(plug.node, plug.attr())?;
        if plug.id.index.is_some() && !info.multi {
            return Err(GraphValidationError::IndexOnSinglePlug(plug.clone()).into());
        }
        if plug.id.axis.is_some() && info.spec != DataSpec::Vec3 {
            return Err(GraphValidationError::AxisOnNonVector(plug.clone()).into());
        }
        Ok(info)
    }

    fn check_transform(&self, node: NodeRef) -> SceneResult<&SceneNode> {
        let scene_node = self.node(node)?;
        if scene_node.kind.is_transform() {
            Ok(scene_node)
        } else {
            Err(SceneError::NotATransform(node))
        }
    }

    fn indices(&self, node: NodeRef, attr: &str) -> SceneResult<Vec<usize>> {
        let scene_node = self.node(node)?;
        let mut indices: Vec<usize> = scene_node
            .values
            .keys()
            .filter(|id| id.attr == attr)
            .filter_map(|id| id.index)
            .chain(
                self.edges
                    .keys()
                    .filter(|target| target.node == node && target.attr() == attr)
                    .filter_map(|target| target.id.index),
            )
            .collect();
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }

    /// Value of any plug: inputs resolve through their connections, outputs
    /// evaluate the owning node.
    fn evaluate(&self, plug: &Plug) -> SceneResult<DataValue> {
        let info = self.attr_info(plug.node, plug.attr())?;
        if !info.is_output {
            return self.resolve_input(plug.node, &plug.id);
        }
        let value = self.output(plug.node, plug.attr())?;
        match plug.id.axis {
            Some(axis) => Ok(DataValue::F64(value.component(axis)?)),
            None => Ok(value),
        }
    }

    fn output(&self, node: NodeRef, attr: &str) -> SceneResult<DataValue> {
        // Parent matrices only depend on the hierarchy, never on the node's
        // own inputs, so they must not trigger an evaluation of the node.
        if self.node(node)?.kind.is_transform()
            && (attr == attrs::PARENT_MATRIX || attr == attrs::PARENT_INVERSE_MATRIX)
        {
            let parent = self.parent_world_matrix(node)?;
            return Ok(DataValue::Matrix(if attr == attrs::PARENT_MATRIX {
                parent
            } else {
                parent.inverse()
            }));
        }

        let cached = self
            .cache
            .borrow()
            .get(&node)
            .and_then(|outputs| outputs.get(attr))
            .copied();
        if let Some(value) = cached {
            return Ok(value);
        }

        self.compute(node)?;
        self.cache
            .borrow()
            .get(&node)
            .and_then(|outputs| outputs.get(attr))
            .copied()
            .ok_or_else(|| SceneError::OutputMissing(node.plug(attr)))
    }

    fn compute(&self, node: NodeRef) -> SceneResult<()> {
        if self.evaluating.borrow().contains(&node) {
            return Err(SceneError::Cycle(node));
        }
        let scene_node = self.node(node)?;

        self.evaluating.borrow_mut().push(node);
        let mut outputs = HashMap::default();
        let result = scene_node
            .node
            .update(NodeContext::new(node, self, &mut outputs));
        self.evaluating.borrow_mut().pop();
        result?;

        self.cache.borrow_mut().insert(node, outputs);
        Ok(())
    }

    fn store(&mut self, plug: &Plug, value: DataValue) -> SceneResult<()> {
        self.node_mut(plug.node)?
            .values
            .insert(plug.id.without_axis(), value);
        Ok(())
    }
}

impl InputResolver for MemoryScene {
    fn resolve_input(&self, node: NodeRef, id: &PlugId) -> SceneResult<DataValue> {
        let info = self.attr_info(node, &id.attr)?;
        let whole = id.without_axis();

        let mut value = self
            .node(node)?
            .values
            .get(&whole)
            .copied()
            .unwrap_or(info.default);

        if let Some(source) = self.edges.get(&node.plug(whole.clone())) {
            value = self.evaluate(source)?.coerce(info.spec)?;
        }

        if info.spec == DataSpec::Vec3 {
            for axis in Axis::ALL {
                if let Some(source) = self.edges.get(&node.plug(whole.clone().axis(axis))) {
                    let component = self.evaluate(source)?.as_f64()?;
                    value = value.with_component(axis, component)?;
                }
            }
        }

        let value = info.clamp(value);
        match id.axis {
            Some(axis) => Ok(DataValue::F64(value.component(axis)?)),
            None => Ok(value),
        }
    }

    fn input_indices(&self, node: NodeRef, attr: &str) -> SceneResult<Vec<usize>> {
        self.indices(node, attr)
    }

    fn parent_world_matrix(&self, node: NodeRef) -> SceneResult<DMat4> {
        match self.node(node)?.parent {
            Some(parent) => self.output(parent, attrs::WORLD_MATRIX)?.as_matrix(),
            None => Ok(DMat4::IDENTITY),
        }
    }
}

impl Scene for MemoryScene {
    fn create_node(&mut self, kind: NodeKind, name: &str) -> SceneResult<NodeRef> {
        if self.names.contains_key(name) {
            return Err(SceneError::NameCollision(name.to_string()));
        }
        let node = self.registry.instantiate(kind)?;
        let spec = NodeSpec::of(node.as_ref())?;
        let node_ref = NodeRef::from_index(self.nodes.len());

        debug!("Creating {} node {name:?}", node.display_name());
        self.nodes.push(SceneNode {
            name: name.to_string(),
            kind,
            node,
            spec,
            dynamic: IndexMap::new(),
            values: HashMap::default(),
            parent: None,
            children: Vec::new(),
        });
        self.names.insert(name.to_string(), node_ref);
        self.invalidate();
        Ok(node_ref)
    }

    fn find(&self, name: &str) -> Option<NodeRef> {
        self.names.get(name).copied()
    }

    fn node_name(&self, node: NodeRef) -> SceneResult<String> {
        Ok(self.node(node)?.name.clone())
    }

    fn node_kind(&self, node: NodeRef) -> SceneResult<NodeKind> {
        Ok(self.node(node)?.kind)
    }

    fn add_attribute(&mut self, node: NodeRef, attribute: AttributeSpec) -> SceneResult<()> {
        if self.has_attribute(node, &attribute.name) {
            return Err(SceneError::AttributeExists(node, attribute.name));
        }
        let scene_node = self.node_mut(node)?;
        scene_node
            .dynamic
            .insert(attribute.name.clone(), attribute);
        self.invalidate();
        Ok(())
    }

    fn has_attribute(&self, node: NodeRef, attr: &str) -> bool {
        self.attr_info(node, attr).is_ok()
    }

    fn connect(&mut self, source: Plug, target: Plug) -> SceneResult<()> {
        let source_info = self.validate(&source)?;
        let target_info = self.validate(&target)?;
        if target_info.is_output {
            return Err(GraphValidationError::TargetIsOutput(target).into());
        }

        let source_spec = source_info.plug_spec(&source.id);
        let target_spec = target_info.plug_spec(&target.id);
        if !target_spec.accepts(source_spec) {
            return Err(GraphValidationError::InconsistentPinTypes(
                source,
                target,
                source_spec,
                target_spec,
            )
            .into());
        }

        self.edges.insert(target, source);
        self.invalidate();
        Ok(())
    }

    fn disconnect_all(&mut self, plug: Plug) -> SceneResult<()> {
        self.validate_partial(&plug)?;
        let covers = |other: &Plug| {
            other.node == plug.node
                && other.attr() == plug.attr()
                && plug.id.index.is_none_or(|i| other.id.index == Some(i))
                && plug.id.axis.is_none_or(|a| other.id.axis == Some(a))
        };
        self.edges
            .retain(|target, source| !covers(target) && !covers(source));
        self.invalidate();
        Ok(())
    }

    fn source(&self, target: Plug) -> SceneResult<Option<Plug>> {
        self.validate_partial(&target)?;
        Ok(self.edges.get(&target).cloned())
    }

    fn destinations(&self, source: Plug) -> SceneResult<Vec<Plug>> {
        self.validate_partial(&source)?;
        let mut destinations: Vec<Plug> = self
            .edges
            .iter()
            .filter(|(_, s)| **s == source)
            .map(|(target, _)| target.clone())
            .collect();
        destinations.sort_by_key(|plug| (plug.node, plug.id.attr.clone(), plug.id.index, plug.id.axis));
        Ok(destinations)
    }

    fn multi_indices(&self, plug: Plug) -> SceneResult<Vec<usize>> {
        self.validate_partial(&plug)?;
        self.indices(plug.node, plug.attr())
    }

    fn get(&self, plug: Plug) -> SceneResult<DataValue> {
        self.validate(&plug)?;
        self.evaluate(&plug)
    }

    fn set(&mut self, plug: Plug, value: DataValue) -> SceneResult<()> {
        let info = self.validate(&plug)?;
        if info.is_output {
            return Err(GraphValidationError::TargetIsOutput(plug).into());
        }

        let value = match plug.id.axis {
            Some(axis) => {
                let current = self
                    .node(plug.node)?
                    .values
                    .get(&plug.id.without_axis())
                    .copied()
                    .unwrap_or(info.default);
                current.with_component(axis, value.as_f64()?)?
            }
            None => info.clamp(value.coerce(info.spec)?),
        };

        self.store(&plug, value)?;
        self.invalidate();
        Ok(())
    }

    fn parent(&mut self, child: NodeRef, parent: Option<NodeRef>) -> SceneResult<()> {
        self.check_transform(child)?;
        if let Some(parent) = parent {
            self.check_transform(parent)?;
            let mut ancestor = Some(parent);
            while let Some(current) = ancestor {
                if current == child {
                    return Err(SceneError::HierarchyCycle(child, parent));
                }
                ancestor = self.node(current)?.parent;
            }
        }

        let world = self.xform(child, Space::World)?;

        if let Some(previous) = self.node(child)?.parent {
            self.node_mut(previous)?.children.retain(|c| *c != child);
        }
        self.node_mut(child)?.parent = parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(child);
        }
        self.invalidate();

        self.set_xform(child, world, Space::World)
    }

    fn parent_of(&self, node: NodeRef) -> SceneResult<Option<NodeRef>> {
        Ok(self.node(node)?.parent)
    }

    fn list_children(&self, node: NodeRef) -> SceneResult<Vec<NodeRef>> {
        Ok(self.node(node)?.children.clone())
    }

    fn xform(&self, node: NodeRef, space: Space) -> SceneResult<DMat4> {
        self.check_transform(node)?;
        let attr = match space {
            Space::World => attrs::WORLD_MATRIX,
            Space::Local => attrs::MATRIX,
        };
        self.output(node, attr)?.as_matrix()
    }

    fn set_xform(&mut self, node: NodeRef, matrix: DMat4, space: Space) -> SceneResult<()> {
        let kind = self.check_transform(node)?.kind;
        let local = match space {
            Space::World => self.parent_world_matrix(node)?.inverse() * matrix,
            Space::Local => matrix,
        };

        let rotate_order = RotateOrder::from_index(
            self.resolve_input(node, &PlugId::new(attrs::ROTATE_ORDER))?
                .as_int()?,
        );
        let joint_orient = match kind {
            NodeKind::Joint => Some(
                self.resolve_input(node, &PlugId::new(attrs::JOINT_ORIENT))?
                    .as_vec3()?,
            ),
            _ => None,
        };
        let channels = TransformChannels::from_local_matrix(local, rotate_order, joint_orient);

        for (attr, value) in [
            (attrs::TRANSLATE, channels.translate),
            (attrs::ROTATE, channels.rotate),
            (attrs::SCALE, channels.scale),
            (attrs::SHEAR, channels.shear),
        ] {
            self.store(&node.plug(attr), DataValue::Vec3(value))?;
        }
        self.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::SpecContext,
        scene::SceneExt,
    };

    #[derive(Clone, Debug, Default)]
    struct Sum;

    impl Sum {
        const INPUT: &'static str = "in";
        const VECTOR: &'static str = "vector";
        const OUTPUT: &'static str = "out";
    }

    impl NodeLike for Sum {
        fn spec(&self, mut ctx: SpecContext) -> SceneResult<()> {
            ctx.add_input_multi(Self::INPUT, DataSpec::F64)
                .add_input_data(Self::VECTOR, DataSpec::Vec3)
                .add_output_data(Self::OUTPUT, DataSpec::F64);
            Ok(())
        }

        fn update(&self, mut ctx: NodeContext) -> SceneResult<()> {
            let mut total = 0.;
            for (_, value) in ctx.data_back_multi(Self::INPUT)? {
                total += value.as_f64()?;
            }
            let vector = ctx.data_back(Self::VECTOR)?.as_vec3()?;
            ctx.set_data_fwd(Self::OUTPUT, total + vector.x + vector.y + vector.z);
            Ok(())
        }

        fn display_name(&self) -> String {
            "Sum".into()
        }
    }

    fn scene() -> MemoryScene {
        let mut registry = NodeRegistry::default();
        registry.register(NodeKind::AddF64, || Box::new(Sum));
        MemoryScene::new(registry)
    }

    #[test]
    fn outputs_follow_upstream_changes() {
        let mut scene = scene();
        let a = scene.create_node(NodeKind::AddF64, "a").unwrap();
        let b = scene.create_node(NodeKind::AddF64, "b").unwrap();
        scene.set_value(a.plug(Sum::INPUT).at(0), 2.).unwrap();
        scene.set_value(a.plug(Sum::INPUT).at(3), 3.).unwrap();
        scene
            .connect(a.plug(Sum::OUTPUT), b.plug(Sum::INPUT).at(1))
            .unwrap();
        assert_eq!(scene.get_f64(b.plug(Sum::OUTPUT)).unwrap(), 5.);

        scene.set_value(a.plug(Sum::INPUT).at(0), 10.).unwrap();
        assert_eq!(scene.get_f64(b.plug(Sum::OUTPUT)).unwrap(), 13.);
        assert_eq!(scene.multi_indices(a.plug(Sum::INPUT)).unwrap(), vec![0, 3]);
    }

    #[test]
    fn axis_connections_override_components() {
        let mut scene = scene();
        let a = scene.create_node(NodeKind::AddF64, "a").unwrap();
        let b = scene.create_node(NodeKind::AddF64, "b").unwrap();
        scene.set_value(a.plug(Sum::INPUT).at(0), 4.).unwrap();
        scene
            .set_value(b.plug(Sum::VECTOR), bevy::math::DVec3::new(1., 1., 1.))
            .unwrap();
        scene
            .connect(a.plug(Sum::OUTPUT), b.plug(Sum::VECTOR).axis(Axis::Y))
            .unwrap();
        assert_eq!(
            scene.get_f64(b.plug(Sum::VECTOR).axis(Axis::Y)).unwrap(),
            4.
        );
        assert_eq!(scene.get_f64(b.plug(Sum::OUTPUT)).unwrap(), 6.);
    }

    #[test]
    fn connecting_replaces_previous_source() {
        let mut scene = scene();
        let a = scene.create_node(NodeKind::AddF64, "a").unwrap();
        let b = scene.create_node(NodeKind::AddF64, "b").unwrap();
        let c = scene.create_node(NodeKind::AddF64, "c").unwrap();
        let target = c.plug(Sum::INPUT).at(0);
        scene.connect(a.plug(Sum::OUTPUT), target.clone()).unwrap();
        scene.connect(b.plug(Sum::OUTPUT), target.clone()).unwrap();
        assert_eq!(scene.source(target).unwrap(), Some(b.plug(Sum::OUTPUT)));
        assert!(scene.destinations(a.plug(Sum::OUTPUT)).unwrap().is_empty());
    }

    #[test]
    fn invalid_connections_are_rejected() {
        let mut scene = scene();
        let a = scene.create_node(NodeKind::AddF64, "a").unwrap();
        let b = scene.create_node(NodeKind::AddF64, "b").unwrap();
        assert!(matches!(
            scene.connect(a.plug(Sum::OUTPUT), b.plug(Sum::OUTPUT)),
            Err(SceneError::Validation(GraphValidationError::TargetIsOutput(_)))
        ));
        assert!(matches!(
            scene.connect(a.plug(Sum::OUTPUT), b.plug(Sum::VECTOR)),
            Err(SceneError::Validation(
                GraphValidationError::InconsistentPinTypes(..)
            ))
        ));
        assert!(matches!(
            scene.connect(a.plug(Sum::OUTPUT), b.plug(Sum::INPUT)),
            Err(SceneError::Validation(GraphValidationError::MissingIndex(_)))
        ));
        assert!(matches!(
            scene.get(a.plug(Sum::OUTPUT).axis(Axis::X)),
            Err(SceneError::Validation(GraphValidationError::AxisOnNonVector(_)))
        ));
        assert!(matches!(
            scene.create_node(NodeKind::AddF64, "a"),
            Err(SceneError::NameCollision(_))
        ));
        assert!(matches!(
            scene.create_node(NodeKind::BlendMatrix, "blend"),
            Err(SceneError::UnregisteredKind(NodeKind::BlendMatrix))
        ));
    }

    #[test]
    fn cycles_are_reported() {
        let mut scene = scene();
        let a = scene.create_node(NodeKind::AddF64, "a").unwrap();
        let b = scene.create_node(NodeKind::AddF64, "b").unwrap();
        scene
            .connect(a.plug(Sum::OUTPUT), b.plug(Sum::INPUT).at(0))
            .unwrap();
        scene
            .connect(b.plug(Sum::OUTPUT), a.plug(Sum::INPUT).at(0))
            .unwrap();
        assert!(matches!(
            scene.get(b.plug(Sum::OUTPUT)),
            Err(SceneError::Cycle(_))
        ));
    }

    #[test]
    fn dynamic_attributes_clamp() {
        let mut scene = scene();
        let a = scene.create_node(NodeKind::AddF64, "a").unwrap();
        scene
            .add_attribute(
                a,
                AttributeSpec::new("blend", 0.).with_min(0.).with_max(1.),
            )
            .unwrap();
        scene.set_value(a.plug("blend"), 4.).unwrap();
        assert_eq!(scene.get_f64(a.plug("blend")).unwrap(), 1.);
        assert!(matches!(
            scene.add_attribute(a, AttributeSpec::new("blend", 0.)),
            Err(SceneError::AttributeExists(..))
        ));
    }
}
