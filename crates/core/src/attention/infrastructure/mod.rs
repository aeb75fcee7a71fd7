pub mod onnx_blazeface_detector;
pub mod onnx_face_mesh_source;
mod onnx_session;
