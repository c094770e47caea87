use bevy::math::{DMat4, DQuat, DVec3, EulerRot};

use super::{Decomposed, RotateOrder};

/// The keyable channels of a transform or joint.
///
/// The local matrix is `T * R * Sh * S` for transforms and
/// `T * JO * R * Sh * S` for joints, where the joint orient `JO` is an XYZ
/// Euler rotation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TransformChannels {
    pub translate: DVec3,
    pub rotate: DVec3,
    pub rotate_order: RotateOrder,
    pub scale: DVec3,
    pub shear: DVec3,
    pub joint_orient: Option<DVec3>,
}

impl TransformChannels {
    pub fn local_matrix(&self) -> DMat4 {
        let rotation = self.orient_quat() * self.rotate_order.to_quat(self.rotate);
        Decomposed {
            translate: self.translate,
            rotate: rotation,
            scale: self.scale,
            shear: self.shear,
        }
        .compose()
    }

    /// Channels producing `local`, keeping the given rotate order and joint
    /// orient.
    pub fn from_local_matrix(
        local: DMat4,
        rotate_order: RotateOrder,
        joint_orient: Option<DVec3>,
    ) -> Self {
        let decomposed = Decomposed::from_matrix(local);
        let orient = joint_orient.map_or(DQuat::IDENTITY, orient_to_quat);
        let rotation = (orient.inverse() * decomposed.rotate).normalize();
        Self {
            translate: decomposed.translate,
            rotate: rotate_order.to_euler(rotation),
            rotate_order,
            scale: decomposed.scale,
            shear: decomposed.shear,
            joint_orient,
        }
    }

    pub fn orient_quat(&self) -> DQuat {
        self.joint_orient.map_or(DQuat::IDENTITY, orient_to_quat)
    }
}

/// Joint orients always use the XYZ rotate order.
pub fn orient_to_quat(orient: DVec3) -> DQuat {
    DQuat::from_euler(EulerRot::ZYX, orient.z, orient.y, orient.x)
}

pub fn quat_to_orient(rotation: DQuat) -> DVec3 {
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    DVec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_orient_is_applied_before_rotation() {
        let orient = DVec3::new(0., 0., std::f64::consts::FRAC_PI_2);
        let channels = TransformChannels {
            rotate: DVec3::new(std::f64::consts::FRAC_PI_2, 0., 0.),
            scale: DVec3::ONE,
            joint_orient: Some(orient),
            ..Default::default()
        };
        let expected = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2)
            * DQuat::from_rotation_x(std::f64::consts::FRAC_PI_2);
        let local = channels.local_matrix();
        assert!(
            DQuat::from_mat4(&local).abs_diff_eq(expected, 1e-12)
                || DQuat::from_mat4(&local).abs_diff_eq(-expected, 1e-12)
        );

        let recovered =
            TransformChannels::from_local_matrix(local, RotateOrder::Xyz, Some(orient));
        assert!(recovered.rotate.abs_diff_eq(channels.rotate, 1e-9));
    }

    #[test]
    fn orient_conversion_round_trips() {
        let orient = DVec3::new(0.3, -0.2, 1.1);
        assert!(quat_to_orient(orient_to_quat(orient)).abs_diff_eq(orient, 1e-12));
    }
}
