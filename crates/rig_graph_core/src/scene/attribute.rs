use bevy::reflect::Reflect;
use serde::{Deserialize, Serialize};

use crate::edge_data::{DataSpec, DataValue};

/// An attribute added to a node after creation.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub spec: DataSpec,
    pub default: DataValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub keyable: bool,
    pub multi: bool,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, default: impl Into<DataValue>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            spec: default.spec(),
            default,
            min: None,
            max: None,
            keyable: false,
            multi: false,
        }
    }

    /// A multi attribute of message plugs.
    pub fn message_array(name: impl Into<String>) -> Self {
        Self {
            multi: true,
            ..Self::new(name, DataValue::Message)
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn keyable(mut self) -> Self {
        self.keyable = true;
        self
    }

    /// Restricts a scalar value to the attribute range.
    pub fn clamp(&self, value: DataValue) -> DataValue {
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
}
