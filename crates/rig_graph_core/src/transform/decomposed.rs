use bevy::{
    math::{DMat3, DMat4, DQuat, DVec3},
    reflect::Reflect,
};
use serde::{Deserialize, Serialize};

/// Translate, rotate, scale and shear channels of an affine matrix.
///
/// The matrix is `T * R * Sh * S`, where `Sh` is the upper triangular shear
/// with `shear = (xy, xz, yz)`.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decomposed {
    pub translate: DVec3,
    pub rotate: DQuat,
    pub scale: DVec3,
    pub shear: DVec3,
}

impl Default for Decomposed {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Decomposed {
    pub const IDENTITY: Self = Self {
        translate: DVec3::ZERO,
        rotate: DQuat::IDENTITY,
        scale: DVec3::ONE,
        shear: DVec3::ZERO,
    };

    pub fn compose(&self) -> DMat4 {
        let rotation = DMat3::from_quat(self.rotate);
        let shear = DMat3::from_cols(
            DVec3::X,
            DVec3::new(self.shear.x, 1., 0.),
            DVec3::new(self.shear.y, self.shear.z, 1.),
        );
        let linear = rotation * shear * DMat3::from_diagonal(self.scale);
        DMat4::from_mat3_translation(linear, self.translate)
    }

    /// Gram-Schmidt decomposition. A negative determinant is absorbed by
    /// the Z scale so that `rotate` is always a proper rotation.
    pub fn from_matrix(matrix: DMat4) -> Self {
        let translate = matrix.w_axis.truncate();
        let c0 = matrix.x_axis.truncate();
        let c1 = matrix.y_axis.truncate();
        let c2 = matrix.z_axis.truncate();

        let sx = c0.length();
        let r0 = c0.try_normalize().unwrap_or(DVec3::X);

        let xy_scaled = r0.dot(c1);
        let c1_perp = c1 - xy_scaled * r0;
        let sy = c1_perp.length();
        let r1 = c1_perp
            .try_normalize()
            .unwrap_or_else(|| r0.any_orthonormal_vector());

        let xz_scaled = r0.dot(c2);
        let yz_scaled = r1.dot(c2);
        let c2_perp = c2 - xz_scaled * r0 - yz_scaled * r1;
        let mut sz = c2_perp.length();
        let mut r2 = c2_perp.try_normalize().unwrap_or_else(|| r0.cross(r1));

        if r0.cross(r1).dot(r2) < 0. {
            r2 = -r2;
            sz = -sz;
        }

        let shear = DVec3::new(
            safe_div(xy_scaled, sy),
            safe_div(xz_scaled, sz),
            safe_div(yz_scaled, sz),
        );
        let rotate = DQuat::from_mat3(&DMat3::from_cols(r0, r1, r2)).normalize();

        Self {
            translate,
            rotate,
            scale: DVec3::new(sx, sy, sz),
            shear,
        }
    }

    /// Same transform, without the translation.
    #[must_use]
    pub fn without_translation(mut self) -> Self {
        self.translate = DVec3::ZERO;
        self
    }
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() > f64::EPSILON {
        numerator / denominator
    } else {
        0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_recovers_composed_channels() {
        let channels = Decomposed {
            translate: DVec3::new(1., -2., 3.),
            rotate: DQuat::from_euler(bevy::math::EulerRot::XYZ, 0.2, 0.4, -0.6),
            scale: DVec3::new(2., 0.5, 1.5),
            shear: DVec3::new(0.25, -0.1, 0.3),
        };
        let recovered = Decomposed::from_matrix(channels.compose());
        assert!(recovered.translate.abs_diff_eq(channels.translate, 1e-12));
        assert!(recovered.rotate.abs_diff_eq(channels.rotate, 1e-12));
        assert!(recovered.scale.abs_diff_eq(channels.scale, 1e-12));
        assert!(recovered.shear.abs_diff_eq(channels.shear, 1e-12));
    }

    #[test]
    fn negative_determinant_goes_into_z_scale() {
        let mirrored = DMat4::from_scale(DVec3::new(1., 1., -1.));
        let decomposed = Decomposed::from_matrix(mirrored);
        assert_eq!(decomposed.scale, DVec3::new(1., 1., -1.));
        assert!(decomposed.rotate.abs_diff_eq(DQuat::IDENTITY, 1e-12));
    }
}
