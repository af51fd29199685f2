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
use serde::Serialize;

const DEFAULT_INPUT_SIZE: u32 = 640;
const CONF_THRESHOLD: f32 = 0.25;
const IOU_THRESHOLD: f32 = 0.45;

/// One detected optic disc region, serialized with the wire field names.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Pixel coordinates [x1, y1, x2, y2] in the original image
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
    pub confidence: Option<f32>,
    #[serde(rename = "class")]
    pub label: Option<String>,
}

/// YOLO-style optic disc detector backed by an ONNX session.
pub struct OpticDiscDetector {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_size: u32,
    conf_threshold: f32,
    iou_threshold: f32,
    labels: Vec<String>,
}

/// Decoded candidate box in original-image coordinates, before NMS.
#[derive(Debug, Clone)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: usize,
}

impl OpticDiscDetector {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.detector_model_path();

        if !model_path.exists() {
            return Err(VisionError::ModelLoad(format!(
                "Detection model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading optic disc detection model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(&model_path)?;

        if session.inputs.is_empty() || session.outputs.is_empty() {
            return Err(VisionError::ModelLoad(
                "Detection model has no inputs or outputs".to_string(),
            ));
        }

        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        tracing::info!(
            "Detection model input: '{}', output: '{}'",
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_size: DEFAULT_INPUT_SIZE,
            conf_threshold: CONF_THRESHOLD,
            iou_threshold: IOU_THRESHOLD,
            labels: vec!["optic_disc".to_string()],
        })
    }

    /// Runs one forward pass and returns all surviving detections, with boxes
    /// clamped to the image bounds.
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (orig_w, orig_h) = image.dimensions();

        let input = preprocess::detector_tensor(image, self.input_size);
        let input_tensor = Tensor::from_array(input)?;

        let prediction = {
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

        let candidates = decode_predictions(
            &prediction.view(),
            self.conf_threshold,
            self.input_size,
            orig_w,
            orig_h,
        )?;
        let kept = non_max_suppression(candidates, self.iou_threshold);

        let detections: Vec<Detection> = kept
            .into_iter()
            .filter_map(|c| self.to_detection(c, orig_w, orig_h))
            .collect();

        tracing::debug!("Detected {} optic disc regions", detections.len());
        Ok(detections)
    }

    /// Converts a candidate to the wire format, dropping boxes that collapse
    /// after clamping to the image bounds.
    fn to_detection(&self, c: Candidate, width: u32, height: u32) -> Option<Detection> {
        let (w, h) = (width as i32, height as i32);
        let x1 = (c.x1.round() as i32).clamp(0, w - 1);
        let y1 = (c.y1.round() as i32).clamp(0, h - 1);
        let x2 = (c.x2.round() as i32).clamp(0, w);
        let y2 = (c.y2.round() as i32).clamp(0, h);

        if x1 >= x2 || y1 >= y2 {
            return None;
        }

        Some(Detection {
            bbox: [x1, y1, x2, y2],
            confidence: Some(c.score),
            label: Some(self.label_for(c.class_id)),
        })
    }

    fn label_for(&self, class_id: usize) -> String {
        label_for(&self.labels, class_id)
    }
}

/// Validated label lookup; out-of-range ids fall back to the numeric id.
fn label_for(labels: &[String], class_id: usize) -> String {
    labels
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| class_id.to_string())
}

/// Decodes a YOLOv8-layout prediction tensor `[1, 4 + classes, anchors]` into
/// candidate boxes in original-image coordinates.
fn decode_predictions(
    prediction: &ndarray::ArrayViewD<f32>,
    conf_threshold: f32,
    input_size: u32,
    orig_w: u32,
    orig_h: u32,
) -> Result<Vec<Candidate>> {
    let shape = prediction.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] < 5 {
        return Err(VisionError::Inference(format!(
            "Unexpected detection output shape: {:?}. Expected [1, 4+classes, anchors]",
            shape
        )));
    }

    let attrs = shape[1];
    let anchors = shape[2];
    let scale_x = orig_w as f32 / input_size as f32;
    let scale_y = orig_h as f32 / input_size as f32;

    let mut candidates = Vec::new();

    for a in 0..anchors {
        let mut best_score = 0.0f32;
        let mut best_class = 0usize;
        for c in 4..attrs {
            let score = prediction[[0, c, a]];
            if score > best_score {
                best_score = score;
                best_class = c - 4;
            }
        }

        if best_score < conf_threshold {
            continue;
        }

        let cx = prediction[[0, 0, a]];
        let cy = prediction[[0, 1, a]];
        let w = prediction[[0, 2, a]];
        let h = prediction[[0, 3, a]];

        candidates.push(Candidate {
            x1: (cx - w / 2.0) * scale_x,
            y1: (cy - h / 2.0) * scale_y,
            x2: (cx + w / 2.0) * scale_x,
            y2: (cy + h / 2.0) * scale_y,
            score: best_score,
            class_id: best_class,
        });
    }

    Ok(candidates)
}

/// Greedy class-aware non-maximum suppression.
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();

    while !candidates.is_empty() {
        let best = candidates.remove(0);
        candidates.retain(|c| c.class_id != best.class_id || iou(&best, c) < iou_threshold);
        kept.push(best);
    }

    kept
}

fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
