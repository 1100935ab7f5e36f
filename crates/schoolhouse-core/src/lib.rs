pub mod config;
pub mod error;

pub use config::SchoolhouseConfig;
pub use error::{Result, SchoolhouseError};
