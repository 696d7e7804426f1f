pub mod config;
pub mod error;
pub mod types;

pub use config::SahayakConfig;
pub use error::{Result, SahayakError};
pub use types::*;
