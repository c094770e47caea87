use bevy::math::{DQuat, DVec3};

use super::Decomposed;

pub trait InterpolateLinear {
    fn interpolate_linear(&self, other: &Self, f: f64) -> Self;
}

impl InterpolateLinear for f64 {
    fn interpolate_linear(&self, other: &Self, f: f64) -> Self {
        self + (other - self) * f
    }
}

impl InterpolateLinear for DVec3 {
    fn interpolate_linear(&self, other: &Self, f: f64) -> Self {
        self.lerp(*other, f)
    }
}

impl InterpolateLinear for DQuat {
    fn interpolate_linear(&self, other: &Self, f: f64) -> Self {
        self.slerp(*other, f)
    }
}

/// Channel-wise: rotation is slerped, everything else is lerped.
impl InterpolateLinear for Decomposed {
    fn interpolate_linear(&self, other: &Self, f: f64) -> Self {
        Self {
            translate: self.translate.interpolate_linear(&other.translate, f),
            rotate: self.rotate.interpolate_linear(&other.rotate, f),
            scale: self.scale.interpolate_linear(&other.scale, f),
            shear: self.shear.interpolate_linear(&other.shear, f),
        }
    }
}
