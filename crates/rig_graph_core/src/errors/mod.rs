mod parameter_error;
mod scene_error;
mod validation_error;

pub use parameter_error::*;
pub use scene_error::*;
pub use validation_error::*;
