//! BlazeFace (short range) face detection via `ort`.
//!
//! Finds the face box the mesh crop is built around. Outputs are the 896
//! anchor regressors `[1, 896, 16]` and logits `[1, 896, 1]`.

use std::path::Path;

use crate::attention::domain::face_detector::{FaceBox, FaceDetector};
use crate::shared::frame::Frame;

use super::onnx_session::{load_session, sigmoid};

const INPUT_SIZE: u32 = 128;
const NMS_IOU_THRESHOLD: f64 = 0.3;
const NUM_ANCHORS: usize = 896;
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::info!("face detector {} loaded", model_path.display());
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let input = ort::value::Tensor::from_array(preprocess(frame))?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() < 2 {
            return Err(format!("face detector expected 2 outputs, got {}", outputs.len()).into());
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let logits = outputs[1].try_extract_array::<f32>()?;
        let regressors: Vec<f32> = regressors.iter().copied().collect();
        let logits: Vec<f32> = logits.iter().copied().collect();

        let mut boxes = decode(
            &regressors,
            &logits,
            &self.anchors,
            self.confidence,
            frame.width(),
            frame.height(),
        );
        Ok(nms(&mut boxes, NMS_IOU_THRESHOLD))
    }
}

/// Nearest-neighbour resize to 128x128, NCHW in [0, 1].
fn preprocess(frame: &Frame) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = INPUT_SIZE as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Anchor centres for the 16x16 (2 per cell) and 8x8 (6 per cell) grids.
fn generate_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for (stride, per_cell) in [(8usize, 2usize), (16, 6)] {
        let grid = INPUT_SIZE as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let centre = [
                    (x as f32 + 0.5) / grid as f32,
                    (y as f32 + 0.5) / grid as f32,
                ];
                anchors.extend(std::iter::repeat(centre).take(per_cell));
            }
        }
    }
    anchors
}

/// Turns anchor regressions into frame-pixel boxes, clamped to the frame.
fn decode(
    regressors: &[f32],
    logits: &[f32],
    anchors: &[[f32; 2]],
    confidence: f64,
    width: u32,
    height: u32,
) -> Vec<FaceBox> {
    let (fw, fh) = (width as f64, height as f64);
    let input = INPUT_SIZE as f64;
    let mut boxes = Vec::new();

    for (i, (&logit, anchor)) in logits.iter().zip(anchors).enumerate() {
        let score = sigmoid(logit) as f64;
        if score < confidence {
            continue;
        }
        let Some(r) = regressors.get(i * REGRESSOR_STRIDE..i * REGRESSOR_STRIDE + 4) else {
            break;
        };

        let cx = anchor[0] as f64 + r[0] as f64 / input;
        let cy = anchor[1] as f64 + r[1] as f64 / input;
        let w = r[2] as f64 / input;
        let h = r[3] as f64 / input;

        let x1 = ((cx - w / 2.0) * fw).max(0.0);
        let y1 = ((cy - h / 2.0) * fh).max(0.0);
        let x2 = ((cx + w / 2.0) * fw).min(fw);
        let y2 = ((cy + h / 2.0) * fh).min(fh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        boxes.push(FaceBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            score,
        });
    }
    boxes
}

/// Greedy non-maximum suppression; survivors come back best score first.
fn nms(boxes: &mut [FaceBox], iou_threshold: f64) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in boxes.iter() {
        if keep.iter().all(|k| iou(k, candidate) <= iou_threshold) {
            keep.push(*candidate);
        }
    }
    keep
}

fn iou(a: &FaceBox, b: &FaceBox) -> f64 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    inter / (a.width * a.height + b.width * b.height - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn face_box(x: f64, y: f64, side: f64, score: f64) -> FaceBox {
        FaceBox {
            x,
            y,
            width: side,
            height: side,
            score,
        }
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let frame = Frame::filled(200, 100, [255, 255, 255], 0);
        let tensor = preprocess(&frame);
        assert_eq!(tensor.shape(), &[1, 3, 128, 128]);
        assert_abs_diff_eq!(tensor[[0, 2, 64, 64]], 1.0);
    }

    #[test]
    fn test_anchor_count_and_range() {
        let anchors = generate_anchors();
        assert_eq!(anchors.len(), NUM_ANCHORS);
        assert!(anchors
            .iter()
            .all(|a| a[0] > 0.0 && a[0] < 1.0 && a[1] > 0.0 && a[1] < 1.0));
    }

    #[test]
    fn test_decode_maps_anchor_box_to_frame_pixels() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let mut regressors = vec![0.0; 2 * REGRESSOR_STRIDE];
        // Box shifted 12.8 input px right, 32 px wide and tall.
        regressors[..4].copy_from_slice(&[12.8, 0.0, 32.0, 32.0]);
        let logits = [5.0, -5.0];

        let boxes = decode(&regressors, &logits, &anchors, 0.5, 640, 480);

        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        assert_abs_diff_eq!(b.width, 0.25 * 640.0, epsilon = 1e-4);
        assert_abs_diff_eq!(b.height, 0.25 * 480.0, epsilon = 1e-4);
        assert_abs_diff_eq!(b.center().0, 0.6 * 640.0, epsilon = 1e-4);
        assert_abs_diff_eq!(b.center().1, 240.0, epsilon = 1e-4);
    }

    #[test]
    fn test_decode_clamps_to_frame() {
        let anchors = vec![[0.0, 0.0]];
        let mut regressors = vec![0.0; REGRESSOR_STRIDE];
        regressors[2] = 64.0;
        regressors[3] = 64.0;
        let boxes = decode(&regressors, &[5.0], &anchors, 0.5, 100, 100);
        assert_abs_diff_eq!(boxes[0].x, 0.0);
        assert_abs_diff_eq!(boxes[0].width, 25.0, epsilon = 1e-4);
    }

    #[test]
    fn test_nms_suppresses_overlap_and_orders_by_score() {
        let mut boxes = vec![
            face_box(5.0, 5.0, 100.0, 0.7),
            face_box(300.0, 300.0, 50.0, 0.8),
            face_box(0.0, 0.0, 100.0, 0.9),
        ];
        let kept = nms(&mut boxes, 0.3);
        assert_eq!(kept.len(), 2);
        assert_abs_diff_eq!(kept[0].score, 0.9);
        assert_abs_diff_eq!(kept[1].score, 0.8);
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        assert!(OnnxBlazefaceDetector::new(Path::new("/nonexistent/face.onnx"), 0.5).is_err());
    }
}
