//! Validated value types used to describe components and guides.
//!
//! Every type checks its invariant when constructed (directly or while
//! deserializing), so a value that exists is always valid. Each type also
//! knows how it changes when the rig is mirrored to the other side.

mod color;
mod matrix;
mod name;
mod scalar;
mod side;

pub use color::*;
pub use matrix::*;
pub use name::*;
pub use scalar::*;
pub use side::*;

use crate::errors::ParameterError;

pub trait Parameter: Sized {
    type Value;

    /// Validates a raw value against the invariant of this parameter type.
    fn check(value: &Self::Value) -> Result<(), ParameterError>;

    /// The value this parameter takes on the opposite side of the rig.
    fn mirror(&self) -> Result<Self, ParameterError>;
}
