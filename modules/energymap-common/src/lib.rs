pub mod config;
pub mod error;
pub mod types;

pub use config::LocatorConfig;
pub use error::EnergyMapError;
pub use types::*;
