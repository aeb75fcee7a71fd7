//! Face-mesh landmark extraction with ONNX Runtime via `ort`.
//!
//! Two stages: a [`FaceDetector`] finds the face, then a MediaPipe-style
//! landmark model runs on an expanded square crop around it. The mesh model
//! takes one square RGB input in [0, 1] (NHWC or NCHW) and produces a flat
//! `N * 3` landmark tensor in input pixels plus a single face-presence logit.

use std::path::Path;

use crate::attention::domain::face_detector::FaceDetector;
use crate::attention::domain::face_roi::FaceRoi;
use crate::attention::domain::landmark_set::{LandmarkSet, Point3, FACE_MESH_POINTS};
use crate::attention::domain::landmark_source::LandmarkSource;
use crate::shared::constants::{FACE_MESH_INPUT_SIZE, FACE_PRESENCE_THRESHOLD, FACE_ROI_SCALE};
use crate::shared::frame::Frame;

use super::onnx_session::{load_session, sigmoid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TensorLayout {
    Nhwc,
    Nchw,
}

pub struct OnnxFaceMeshSource {
    session: ort::session::Session,
    detector: Box<dyn FaceDetector>,
    input_size: u32,
    layout: TensorLayout,
    presence_threshold: f64,
    roi_scale: f64,
}

impl OnnxFaceMeshSource {
    pub fn new(
        model_path: &Path,
        detector: Box<dyn FaceDetector>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;

        let shape: Option<Vec<i64>> = session.inputs().first().and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                Some(shape.iter().copied().collect())
            } else {
                None
            }
        });
        let (input_size, layout) = shape
            .as_deref()
            .map(input_geometry)
            .unwrap_or((FACE_MESH_INPUT_SIZE, TensorLayout::Nhwc));

        log::info!(
            "face mesh model {} loaded ({input_size}x{input_size}, {layout:?})",
            model_path.display()
        );

        Ok(Self {
            session,
            detector,
            input_size,
            layout,
            presence_threshold: FACE_PRESENCE_THRESHOLD,
            roi_scale: FACE_ROI_SCALE,
        })
    }
}

impl LandmarkSource for OnnxFaceMeshSource {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
        let Some(face) = self.detector.detect(frame)?.into_iter().next() else {
            return Ok(None);
        };
        let roi = FaceRoi::around(&face, self.roi_scale);

        let input = ort::value::Tensor::from_array(preprocess(frame, &roi, self.input_size, self.layout))?;
        let outputs = self.session.run(ort::inputs![input])?;

        let mut landmarks = None;
        let mut presence = None;
        for i in 0..outputs.len() {
            let array = outputs[i].try_extract_array::<f32>()?;
            let data: Vec<f32> = array.iter().copied().collect();
            match data.len() {
                1 => presence = Some(data[0]),
                n if n >= FACE_MESH_POINTS * 3 && n % 3 == 0 => landmarks = Some(data),
                _ => {}
            }
        }
        let landmarks = landmarks.ok_or("face mesh model produced no landmark tensor")?;

        if let Some(logit) = presence {
            let score = sigmoid(logit) as f64;
            if score < self.presence_threshold {
                log::debug!("frame {}: face presence {score:.2} below threshold", frame.index());
                return Ok(None);
            }
        }

        let points = to_frame_points(&landmarks, &roi, self.input_size, frame.width());
        Ok(Some(LandmarkSet::new(points)?))
    }
}

/// Reads square input size and channel order from a 4-D input shape.
/// Dynamic dimensions (negative) fall back to the default size.
fn input_geometry(shape: &[i64]) -> (u32, TensorLayout) {
    if shape.len() != 4 {
        return (FACE_MESH_INPUT_SIZE, TensorLayout::Nhwc);
    }
    let (layout, side) = if shape[3] == 3 {
        (TensorLayout::Nhwc, shape[1])
    } else {
        (TensorLayout::Nchw, shape[2])
    };
    let size = if side > 0 {
        side as u32
    } else {
        FACE_MESH_INPUT_SIZE
    };
    (size, layout)
}

/// Nearest-neighbour resample of `roi` to `size x size`, scaled to [0, 1].
/// Parts of the crop outside the frame stay black.
fn preprocess(frame: &Frame, roi: &FaceRoi, size: u32, layout: TensorLayout) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as f64;
    let src_w = frame.width() as f64;
    let s = size as usize;
    let step = roi.side / size as f64;

    let mut tensor = match layout {
        TensorLayout::Nhwc => ndarray::Array4::<f32>::zeros((1, s, s, 3)),
        TensorLayout::Nchw => ndarray::Array4::<f32>::zeros((1, 3, s, s)),
    };

    for y in 0..s {
        let src_y = (roi.y + (y as f64 + 0.5) * step).floor();
        if src_y < 0.0 || src_y >= src_h {
            continue;
        }
        for x in 0..s {
            let src_x = (roi.x + (x as f64 + 0.5) * step).floor();
            if src_x < 0.0 || src_x >= src_w {
                continue;
            }
            for c in 0..3 {
                let v = src[[src_y as usize, src_x as usize, c]] as f32 / 255.0;
                match layout {
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = v,
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = v,
                }
            }
        }
    }

    tensor
}

fn to_frame_points(raw: &[f32], roi: &FaceRoi, input_size: u32, frame_width: u32) -> Vec<Point3> {
    raw.chunks_exact(3)
        .map(|p| roi.to_frame(p[0] as f64, p[1] as f64, p[2] as f64, input_size, frame_width))
        .collect()
}
