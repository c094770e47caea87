//! Transform arithmetic shared by the scene model and the node library.

mod channels;
mod decomposed;
mod interpolation;
mod rotate_order;

pub use channels::*;
pub use decomposed::*;
pub use interpolation::*;
pub use rotate_order::*;
