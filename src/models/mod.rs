pub mod classifier;
pub mod detector;
pub mod registry;

pub use classifier::{Diagnosis, GlaucomaClassifier};
pub use detector::{Detection, OpticDiscDetector};
pub use registry::{ModelRegistry, ModelStats};
