use bevy::{math::DMat4, platform::collections::HashMap};

use super::{NodeSpec, PinSpec};
use crate::{
    edge_data::{DataSpec, DataValue},
    errors::{SceneError, SceneResult},
    scene::{NodeRef, PlugId},
};

pub struct SpecContext<'a> {
    spec: &'a mut NodeSpec,
}

impl<'a> SpecContext<'a> {
    pub fn new(spec: &'a mut NodeSpec) -> Self {
        Self { spec }
    }

    pub fn add_input_data(&mut self, pin: impl Into<String>, spec: DataSpec) -> &mut Self {
        self.spec.inputs.insert(pin.into(), PinSpec::new(spec));
        self
    }

    /// Input whose unconnected, unset value is `default`.
    pub fn add_input_default(
        &mut self,
        pin: impl Into<String>,
        default: impl Into<DataValue>,
    ) -> &mut Self {
        let default = default.into();
        self.spec.inputs.insert(
            pin.into(),
            PinSpec {
                spec: default.spec(),
                default,
                multi: false,
            },
        );
        self
    }

    pub fn add_input_multi(&mut self, pin: impl Into<String>, spec: DataSpec) -> &mut Self {
        self.spec.inputs.insert(
            pin.into(),
            PinSpec {
                multi: true,
                ..PinSpec::new(spec)
            },
        );
        self
    }

    pub fn add_output_data(&mut self, pin: impl Into<String>, spec: DataSpec) -> &mut Self {
        self.spec.outputs.insert(pin.into(), PinSpec::new(spec));
        self
    }
}

/// Read access to the resolved inputs of a node during evaluation.
pub trait InputResolver {
    fn resolve_input(&self, node: NodeRef, id: &PlugId) -> SceneResult<DataValue>;
    fn input_indices(&self, node: NodeRef, attr: &str) -> SceneResult<Vec<usize>>;
    /// World matrix of the hierarchy parent, identity for roots.
    fn parent_world_matrix(&self, node: NodeRef) -> SceneResult<DMat4>;
}

pub struct NodeContext<'a> {
    pub node: NodeRef,
    inputs: &'a dyn InputResolver,
    outputs: &'a mut HashMap<String, DataValue>,
}

impl<'a> NodeContext<'a> {
    pub fn new(
        node: NodeRef,
        inputs: &'a dyn InputResolver,
        outputs: &'a mut HashMap<String, DataValue>,
    ) -> Self {
        Self {
            node,
            inputs,
            outputs,
        }
    }

    pub fn data_back(&self, pin: &str) -> SceneResult<DataValue> {
        self.inputs.resolve_input(self.node, &PlugId::new(pin))
    }

    pub fn data_back_at(&self, pin: &str, index: usize) -> SceneResult<DataValue> {
        self.inputs
            .resolve_input(self.node, &PlugId::new(pin).at(index))
    }

    /// Every populated element of a multi input, in index order.
    pub fn data_back_multi(&self, pin: &str) -> SceneResult<Vec<(usize, DataValue)>> {
        self.inputs
            .input_indices(self.node, pin)?
            .into_iter()
            .map(|index| Ok((index, self.data_back_at(pin, index)?)))
            .collect()
    }

    /// Populated indices of a multi input, in order.
    pub fn indices_back(&self, pin: &str) -> SceneResult<Vec<usize>> {
        self.inputs.input_indices(self.node, pin)
    }

    pub fn parent_world_matrix(&self) -> SceneResult<DMat4> {
        self.inputs.parent_world_matrix(self.node)
    }

    pub fn set_data_fwd(&mut self, pin: &str, value: impl Into<DataValue>) {
        self.outputs.insert(pin.to_string(), value.into());
    }

    pub fn missing_output(&self, pin: &str) -> SceneError {
        SceneError::OutputMissing(self.node.plug(pin))
    }
}
