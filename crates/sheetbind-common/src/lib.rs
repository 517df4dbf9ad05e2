pub mod axis;
pub mod value;

pub use axis::*;
pub use value::*;
