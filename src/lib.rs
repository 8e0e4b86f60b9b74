pub mod cli;
pub mod audio;
pub mod content;
pub mod config;
pub mod error;
pub mod models;
pub mod logging;
pub mod navigation;

pub use error::*;
pub use models::*;
