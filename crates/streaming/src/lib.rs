pub mod config;
pub mod error;
pub mod protocol;
pub mod reconcile;
pub mod row;

pub use config::*;
pub use error::*;
pub use protocol::*;
pub use reconcile::*;
pub use row::*;
