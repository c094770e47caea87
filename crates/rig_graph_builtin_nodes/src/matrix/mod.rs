pub mod aim_matrix;
pub mod blend_matrix;
pub mod compose_matrix;
pub mod decompose_matrix;
pub mod inverse_matrix;
pub mod mult_matrix;

pub use aim_matrix::*;
pub use blend_matrix::*;
pub use compose_matrix::*;
pub use decompose_matrix::*;
pub use inverse_matrix::*;
pub use mult_matrix::*;
