use std::fmt;

use bevy::{math::DVec3, reflect::Reflect};
use serde::{Deserialize, Serialize};

use super::Parameter;
use crate::{errors::ParameterError, scene::Axis};

/// Distinguishes several components sharing a name and side.
#[derive(
    Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Index(u32);

impl Index {
    pub fn new(value: i64) -> Result<Self, ParameterError> {
        Self::check(&value)?;
        u32::try_from(value)
            .map(Self)
            .map_err(|_| ParameterError::NegativeIndex(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Parameter for Index {
    type Value = i64;

    fn check(value: &i64) -> Result<(), ParameterError> {
        if *value < 0 {
            Err(ParameterError::NegativeIndex(*value))
        } else {
            Ok(())
        }
    }

    fn mirror(&self) -> Result<Self, ParameterError> {
        Ok(*self)
    }
}

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Index {
    type Error = ParameterError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Index> for i64 {
    fn from(value: Index) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finite number that is never negative: sizes, distances, lengths.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct UnsignedFloat(f64);

impl UnsignedFloat {
    pub const ONE: Self = Self(1.);

    pub fn new(value: f64) -> Result<Self, ParameterError> {
        Self::check(&value)?;
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for UnsignedFloat {
    fn default() -> Self {
        Self::ONE
    }
}

impl Parameter for UnsignedFloat {
    type Value = f64;

    fn check(value: &f64) -> Result<(), ParameterError> {
        if value.is_finite() && *value >= 0. {
            Ok(())
        } else {
            Err(ParameterError::InvalidUnsignedFloat(*value))
        }
    }

    fn mirror(&self) -> Result<Self, ParameterError> {
        Ok(*self)
    }
}

impl TryFrom<f64> for UnsignedFloat {
    type Error = ParameterError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UnsignedFloat> for f64 {
    fn from(value: UnsignedFloat) -> Self {
        value.0
    }
}

/// A 3d vector; mirroring reflects it through the plane normal to X.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vector([f64; 3]);

impl Vector {
    pub fn new(value: [f64; 3]) -> Result<Self, ParameterError> {
        Self::check(&value)?;
        Ok(Self(value))
    }

    pub fn to_dvec3(self) -> DVec3 {
        DVec3::from_array(self.0)
    }

    pub fn mirror_axis(self, axis: Axis) -> Self {
        let mut value = self.0;
        value[axis.index()] *= -1.;
        Self(value)
    }
}

impl Parameter for Vector {
    type Value = [f64; 3];

    fn check(value: &[f64; 3]) -> Result<(), ParameterError> {
        if value.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ParameterError::NonFiniteMatrix)
        }
    }

    fn mirror(&self) -> Result<Self, ParameterError> {
        Ok(self.mirror_axis(Axis::X))
    }
}

impl TryFrom<[f64; 3]> for Vector {
    type Error = ParameterError;

    fn try_from(value: [f64; 3]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Vector> for [f64; 3] {
    fn from(value: Vector) -> Self {
        value.0
    }
}

impl From<DVec3> for Vector {
    fn from(value: DVec3) -> Self {
        Self(value.to_array())
    }
}
