pub mod cluster;
pub mod layer;
pub mod markers;
pub mod overlay;
pub mod surface;

pub use cluster::*;
pub use layer::*;
pub use markers::*;
pub use overlay::*;
pub use surface::*;

#[cfg(test)]
pub(crate) mod testing;
