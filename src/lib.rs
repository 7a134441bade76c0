pub mod config;
pub mod env;
pub mod error;
pub mod exploration;
pub mod logging;
pub mod qtable;
pub mod report;
pub mod trainer;

pub use error::{LakeError, Result};
