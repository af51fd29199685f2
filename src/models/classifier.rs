use crate::image::preprocess;
use crate::utils::error::VisionError;
use crate::{Config, Result};
use image::RgbImage;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;

const INPUT_SIZE: u32 = 224;
const NUM_CLASSES: usize = 2;

/// Outcome of one glaucoma screening pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnosis {
    /// True when the positive (glaucoma) class wins the softmax.
    pub is_positive: bool,
    /// Softmax probability of the predicted class, as a percentage in [0, 100].
    pub confidence: f32,
}

/// Binary glaucoma classifier (ResNet-50 export with a two-class head).
pub struct GlaucomaClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_size: u32,
}

impl GlaucomaClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.classifier_model_path();

        if !model_path.exists() {
            return Err(VisionError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!(
            "Loading glaucoma classification model from: {}",
            model_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(&model_path)?;

        if session.inputs.is_empty() || session.outputs.is_empty() {
            return Err(VisionError::ModelLoad(
                "Classification model has no inputs or outputs".to_string(),
            ));
        }

        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        tracing::info!(
            "Classification model input: '{}', output: '{}'",
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size: INPUT_SIZE,
        })
    }

    /// Resizes and normalizes the image, runs one forward pass, and reduces
    /// the two logits to a label and percentage confidence.
    pub fn predict(&self, image: &RgbImage) -> Result<Diagnosis> {
        let input = preprocess::classifier_tensor(image, self.input_size);
        let input_tensor = Tensor::from_array(input)?;

        let logits = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(&self.output_name) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(VisionError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != 1 || shape[1] != NUM_CLASSES {
            return Err(VisionError::Inference(format!(
                "Unexpected classification output shape: {:?}. Expected [1, {}]",
                shape, NUM_CLASSES
            )));
        }

        let probabilities = softmax2(logits[[0, 0]], logits[[0, 1]]);
        let (predicted, probability) = if probabilities[1] > probabilities[0] {
            (1, probabilities[1])
        } else {
            (0, probabilities[0])
        };

        let diagnosis = Diagnosis {
            is_positive: predicted == 1,
            confidence: probability * 100.0,
        };

        tracing::debug!(
            "Glaucoma prediction: class={}, confidence={:.2}%",
            predicted,
            diagnosis.confidence
        );
        Ok(diagnosis)
    }
}

/// Numerically stable softmax over two logits.
fn softmax2(a: f32, b: f32) -> [f32; 2] {
    let max = a.max(b);
    let ea = (a - max).exp();
    let eb = (b - max).exp();
    let sum = ea + eb;
    [ea / sum, eb / sum]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let [p0, p1] = softmax2(1.3, -0.7);
        assert!((p0 + p1 - 1.0).abs() < 1e-6);
        assert!(p0 > p1);
    }

    #[test]
    fn softmax_of_equal_logits_is_half() {
        let [p0, p1] = softmax2(2.5, 2.5);
        assert!((p0 - 0.5).abs() < 1e-6);
        assert!((p1 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let [p0, p1] = softmax2(1000.0, -1000.0);
        assert!(p0.is_finite() && p1.is_finite());
        assert!((p0 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn winning_probability_is_at_least_half() {
        // The reported confidence is the max of a two-way softmax, so the
        // percentage always lands in [50, 100].
        for (a, b) in [(0.0f32, 0.0f32), (3.0, -1.0), (-2.0, 5.0)] {
            let probs = softmax2(a, b);
            let max = probs[0].max(probs[1]);
            assert!((0.5..=1.0).contains(&max));
        }
    }
}
