pub mod aggregate;
pub mod config;
pub mod error;
pub mod identity;
pub mod io;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod sync;

pub use error::{Result, RollupError};
