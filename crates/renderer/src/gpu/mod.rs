//! GPU side of the gallery.
//!
//! - `context` owns the wgpu instance, device and surface and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` turns wrapped GLSL into the quad pipelines every pass uses.
//! - `uniforms` mirrors the `DrawParams` block shared by vertex and fragment
//!   stages.
//! - `targets` allocates the input image, the sample target and the slot
//!   textures.
//! - `readback` copies the sample target back to the CPU.
//! - `state` glues everything together: it renders formulas into slots and
//!   draws the visible tiles each frame.

mod context;
mod pipeline;
mod readback;
mod state;
mod targets;
mod uniforms;

pub(crate) use state::GpuState;
