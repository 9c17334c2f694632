pub use crate::placement::*;

#[cfg(feature = "plotters")]
pub use crate::plotting::*;
