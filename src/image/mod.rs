pub mod annotate;
pub mod loader;
pub mod preprocess;

pub use loader::ImageLoader;
