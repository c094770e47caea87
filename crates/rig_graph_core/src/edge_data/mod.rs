use bevy::{
    math::{DMat4, DQuat, DVec3},
    reflect::{Reflect, std_traits::ReflectDefault},
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{SceneError, SceneResult},
    scene::Axis,
};

/// Type of the values flowing along a plug.
#[derive(Reflect, Default, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[reflect(Default)]
pub enum DataSpec {
    #[default]
    F64,
    Bool,
    Int,
    Vec3,
    Quat,
    Matrix,
    /// Carries no value; used to publish relationships between nodes.
    Message,
}

impl DataSpec {
    pub fn is_scalar(&self) -> bool {
        matches!(self, DataSpec::F64 | DataSpec::Bool | DataSpec::Int)
    }

    /// Whether a plug of type `self` can be driven by a plug of type `source`.
    pub fn accepts(&self, source: DataSpec) -> bool {
        *self == source || (self.is_scalar() && source.is_scalar())
    }
}

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    F64(f64),
    Bool(bool),
    Int(i64),
    Vec3(DVec3),
    Quat(DQuat),
    Matrix(DMat4),
    Message,
}

impl DataValue {
    pub fn default_from_spec(spec: DataSpec) -> Self {
        match spec {
            DataSpec::F64 => DataValue::F64(0.),
            DataSpec::Bool => DataValue::Bool(false),
            DataSpec::Int => DataValue::Int(0),
            DataSpec::Vec3 => DataValue::Vec3(DVec3::ZERO),
            DataSpec::Quat => DataValue::Quat(DQuat::IDENTITY),
            DataSpec::Matrix => DataValue::Matrix(DMat4::IDENTITY),
            DataSpec::Message => DataValue::Message,
        }
    }

    pub fn spec(&self) -> DataSpec {
        self.into()
    }

    /// Scalars are interconvertible: booleans read as 0/1, floats truncate
    /// towards zero when read as integers and are true when non-zero.
    pub fn as_f64(&self) -> SceneResult<f64> {
        match self {
            DataValue::F64(v) => Ok(*v),
            DataValue::Bool(v) => Ok(if *v { 1. } else { 0. }),
            DataValue::Int(v) => Ok(*v as f64),
            other => Err(mismatch(DataSpec::F64, other)),
        }
    }

    pub fn as_bool(&self) -> SceneResult<bool> {
        match self {
            DataValue::Bool(v) => Ok(*v),
            DataValue::F64(v) => Ok(*v != 0.),
            DataValue::Int(v) => Ok(*v != 0),
            other => Err(mismatch(DataSpec::Bool, other)),
        }
    }

    pub fn as_int(&self) -> SceneResult<i64> {
        match self {
            DataValue::Int(v) => Ok(*v),
            DataValue::F64(v) => Ok(v.trunc() as i64),
            DataValue::Bool(v) => Ok(*v as i64),
            other => Err(mismatch(DataSpec::Int, other)),
        }
    }

    pub fn as_vec3(&self) -> SceneResult<DVec3> {
        match self {
            DataValue::Vec3(v) => Ok(*v),
            other => Err(mismatch(DataSpec::Vec3, other)),
        }
    }

    pub fn as_quat(&self) -> SceneResult<DQuat> {
        match self {
            DataValue::Quat(v) => Ok(*v),
            other => Err(mismatch(DataSpec::Quat, other)),
        }
    }

    pub fn as_matrix(&self) -> SceneResult<DMat4> {
        match self {
            DataValue::Matrix(v) => Ok(*v),
            other => Err(mismatch(DataSpec::Matrix, other)),
        }
    }

    /// Converts the value to `spec`, which must accept this value's type.
    pub fn coerce(self, spec: DataSpec) -> SceneResult<Self> {
        Ok(match spec {
            DataSpec::F64 => DataValue::F64(self.as_f64()?),
            DataSpec::Bool => DataValue::Bool(self.as_bool()?),
            DataSpec::Int => DataValue::Int(self.as_int()?),
            _ if spec == self.spec() => self,
            _ => return Err(mismatch(spec, &self)),
        })
    }

    pub fn component(&self, axis: Axis) -> SceneResult<f64> {
        Ok(self.as_vec3()?[axis.index()])
    }

    pub fn with_component(self, axis: Axis, value: f64) -> SceneResult<Self> {
        let mut vector = self.as_vec3()?;
        vector[axis.index()] = value;
        Ok(DataValue::Vec3(vector))
    }
}

fn mismatch(expected: DataSpec, found: &DataValue) -> SceneError {
    SceneError::MismatchedDataType(format!("{expected:?}"), format!("{:?}", found.spec()))
}

impl Default for DataValue {
    fn default() -> Self {
        Self::F64(0.)
    }
}

impl From<&DataValue> for DataSpec {
    fn from(value: &DataValue) -> Self {
        match value {
            DataValue::F64(_) => DataSpec::F64,
            DataValue::Bool(_) => DataSpec::Bool,
            DataValue::Int(_) => DataSpec::Int,
            DataValue::Vec3(_) => DataSpec::Vec3,
            DataValue::Quat(_) => DataSpec::Quat,
            DataValue::Matrix(_) => DataSpec::Matrix,
            DataValue::Message => DataSpec::Message,
        }
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<DVec3> for DataValue {
    fn from(value: DVec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<DQuat> for DataValue {
    fn from(value: DQuat) -> Self {
        Self::Quat(value)
    }
}

impl From<DMat4> for DataValue {
    fn from(value: DMat4) -> Self {
        Self::Matrix(value)
    }
}
