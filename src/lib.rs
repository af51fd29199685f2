pub mod config;
pub mod models;
pub mod image;
pub mod storage;
pub mod web;
pub mod utils;

pub use config::Config;
pub use utils::error::VisionError;

pub type Result<T> = std::result::Result<T, VisionError>;
