use bevy::{
    math::{DMat4, DVec3},
    reflect::Reflect,
};
use serde::{Deserialize, Serialize};

use super::Parameter;
use crate::{errors::ParameterError, scene::Axis};

/// An affine 4x4 matrix stored as 16 floats in row-major order, with the
/// basis vectors in rows 0..3 and the translation in row 3.
///
/// This is exactly the column-major layout of [`DMat4`], so conversions are
/// free; see [`Matrix::to_dmat4`].
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 16]", into = "[f64; 16]")]
pub struct Matrix([f64; 16]);

impl Matrix {
    pub const IDENTITY: Self = Self([
        1., 0., 0., 0., //
        0., 1., 0., 0., //
        0., 0., 1., 0., //
        0., 0., 0., 1., //
    ]);

    pub fn new(value: [f64; 16]) -> Result<Self, ParameterError> {
        Self::check(&value)?;
        Ok(Self(value))
    }

    pub fn from_slice(value: &[f64]) -> Result<Self, ParameterError> {
        let array: [f64; 16] =
            value
                .try_into()
                .map_err(|_| ParameterError::WrongLength {
                    expected: 16,
                    found: value.len(),
                })?;
        Self::new(array)
    }

    pub fn from_dmat4(matrix: DMat4) -> Self {
        Self(matrix.to_cols_array())
    }

    pub fn to_dmat4(self) -> DMat4 {
        DMat4::from_cols_array(&self.0)
    }

    pub fn values(&self) -> &[f64; 16] {
        &self.0
    }

    pub fn translation(&self) -> DVec3 {
        DVec3::new(self.0[12], self.0[13], self.0[14])
    }

    pub fn basis(&self, axis: Axis) -> DVec3 {
        let row = axis.index() * 4;
        DVec3::new(self.0[row], self.0[row + 1], self.0[row + 2])
    }

    /// Reflects the matrix through the plane normal to `axis` and negates
    /// the three basis vectors, so the result is a proper rotation again.
    ///
    /// Only the translation component along `axis` and, in every basis row,
    /// the two components off `axis` change sign; mirroring twice is exact.
    #[must_use]
    pub fn mirror_axis(&self, axis: Axis) -> Self {
        let k = axis.index();
        let mut value = self.0;
        value[12 + k] *= -1.;
        for row in 0..3 {
            for column in (0..3).filter(|column| *column != k) {
                value[row * 4 + column] *= -1.;
            }
        }
        Self(value)
    }

    /// Unit-length basis vectors. Degenerate (zero) rows are left untouched.
    #[must_use]
    pub fn normalize(&self) -> Self {
        let mut value = self.0;
        for row in 0..3 {
            let start = row * 4;
            let length = DVec3::new(value[start], value[start + 1], value[start + 2]).length();
            if length > f64::EPSILON {
                for column in 0..3 {
                    value[start + column] /= length;
                }
            }
        }
        Self(value)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Parameter for Matrix {
    type Value = [f64; 16];

    fn check(value: &[f64; 16]) -> Result<(), ParameterError> {
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

impl TryFrom<[f64; 16]> for Matrix {
    type Error = ParameterError;

    fn try_from(value: [f64; 16]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Matrix> for [f64; 16] {
    fn from(value: Matrix) -> Self {
        value.0
    }
}

impl From<DMat4> for Matrix {
    fn from(value: DMat4) -> Self {
        Self::from_dmat4(value)
    }
}
