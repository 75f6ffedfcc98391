//! Live camera capture with a face highlight overlay.
//!
//! Layers follow the same split everywhere: `domain` holds the traits and
//! plain types, `infrastructure` binds them to ffmpeg, ONNX Runtime or the
//! terminal, and `pipeline` wires the pieces into a running session.

pub mod capture;
pub mod detection;
pub mod overlay;
pub mod permission;
pub mod pipeline;
pub mod shared;
