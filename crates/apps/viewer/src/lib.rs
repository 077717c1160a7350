pub mod app;
pub mod config;
pub mod surface;
pub mod transport;

pub use app::*;
pub use config::*;
pub use surface::*;
pub use transport::*;
