pub mod legend;
pub mod record;
pub mod status;
pub mod store;

pub use legend::*;
pub use record::*;
pub use status::*;
pub use store::*;
