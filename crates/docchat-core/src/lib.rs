pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::DocchatConfig;
pub use error::{DocchatError, Result};
pub use types::*;
