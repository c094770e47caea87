pub mod add_f64;
pub mod clamp_f64;
pub mod div_f64;
pub mod mul_f64;
pub mod reverse_f64;
pub mod sub_f64;

pub use add_f64::*;
pub use clamp_f64::*;
pub use div_f64::*;
pub use mul_f64::*;
pub use reverse_f64::*;
pub use sub_f64::*;
