pub mod config;
pub mod error;
pub mod ratio;
pub mod types;

pub use config::BattleConfig;
pub use error::{BattleError, Result};
