use bevy::{
    math::{DQuat, DVec3, EulerRot},
    reflect::Reflect,
};
use serde::{Deserialize, Serialize};

/// Order in which the three Euler rotations are applied. `Xyz` rotates
/// about X first, then Y, then Z (all about fixed parent axes).
#[derive(
    Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum RotateOrder {
    #[default]
    Xyz,
    Yzx,
    Zxy,
    Xzy,
    Yxz,
    Zyx,
}

impl RotateOrder {
    pub const ALL: [Self; 6] = [
        Self::Xyz,
        Self::Yzx,
        Self::Zxy,
        Self::Xzy,
        Self::Yxz,
        Self::Zyx,
    ];

    /// Position of this order in [`RotateOrder::ALL`], which is how it is
    /// stored on integer plugs.
    pub fn to_index(self) -> i64 {
        Self::ALL.iter().position(|o| *o == self).unwrap_or(0) as i64
    }

    pub fn from_index(index: i64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    /// Applying rotations `a, b, c` in this order about fixed axes is the
    /// same as an intrinsic rotation `c, b, a`, which is what glam names.
    fn intrinsic(self) -> EulerRot {
        match self {
            Self::Xyz => EulerRot::ZYX,
            Self::Yzx => EulerRot::XZY,
            Self::Zxy => EulerRot::YXZ,
            Self::Xzy => EulerRot::YZX,
            Self::Yxz => EulerRot::ZXY,
            Self::Zyx => EulerRot::XYZ,
        }
    }

    /// Indices into an `(x, y, z)` vector of the angles in application order.
    fn axes(self) -> [usize; 3] {
        match self {
            Self::Xyz => [0, 1, 2],
            Self::Yzx => [1, 2, 0],
            Self::Zxy => [2, 0, 1],
            Self::Xzy => [0, 2, 1],
            Self::Yxz => [1, 0, 2],
            Self::Zyx => [2, 1, 0],
        }
    }

    /// Builds a rotation from `(x, y, z)` angles in radians.
    pub fn to_quat(self, angles: DVec3) -> DQuat {
        let [a, b, c] = self.axes();
        DQuat::from_euler(self.intrinsic(), angles[c], angles[b], angles[a])
    }

    /// Extracts `(x, y, z)` angles in radians.
    pub fn to_euler(self, rotation: DQuat) -> DVec3 {
        let [a, b, c] = self.axes();
        let (first, second, third) = rotation.to_euler(self.intrinsic());
        let mut angles = DVec3::ZERO;
        angles[c] = first;
        angles[b] = second;
        angles[a] = third;
        angles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xyz_applies_x_first() {
        let angles = DVec3::new(0.4, -0.7, 1.2);
        let expected = DQuat::from_rotation_z(angles.z)
            * DQuat::from_rotation_y(angles.y)
            * DQuat::from_rotation_x(angles.x);
        assert!(RotateOrder::Xyz
            .to_quat(angles)
            .abs_diff_eq(expected, 1e-12));
    }

    #[test]
    fn euler_extraction_matches_construction() {
        let angles = DVec3::new(0.3, 0.5, -0.9);
        for order in RotateOrder::ALL {
            let extracted = order.to_euler(order.to_quat(angles));
            assert!(extracted.abs_diff_eq(angles, 1e-9), "{order:?}");
            assert_eq!(RotateOrder::from_index(order.to_index()), order);
        }
    }
}
