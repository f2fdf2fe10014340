//! WebGPU rendering module
//!
//! Uses SDF (Signed Distance Fields) for all rendering in the fragment shader.
//! [`projector`] is shared with pointer input and the DOM face overlays.

pub mod projector;
pub mod sdf_pipeline;

pub use projector::Letterbox;
pub use sdf_pipeline::SdfRenderState;
