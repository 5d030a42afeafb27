//! Renderer crate for Filtrandmill.
//!
//! The crate glues the gallery window, the `wgpu` pipelines and the formula
//! shader wrapping together. The overall flow is:
//!
//! ```text
//!   filtrandmill CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                          │
//!                          └─▶ fixed tick ─▶ ScrollAnimator
//!                                         └▶ GallerySlotManager ─▶ GpuState::render_formula()
//! ```
//!
//! Each formula becomes a GLSL fragment shader (see `compile`). It is drawn
//! twice: once into a tiny float target whose pixels are read back to find
//! the per-channel range, then into the slot texture with that range mapped
//! onto `[0, 1]` (see `normalize`).

mod compile;
mod gpu;
mod normalize;
mod types;
mod window;

use anyhow::Result;

pub use normalize::{channel_correction, NormalizationParams};
pub use types::{RenderError, RendererConfig};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the gallery window and blocks until the user closes it.
    ///
    /// Fails when no window or GPU can be set up, or when the input image
    /// cannot be loaded.
    pub fn run(&mut self) -> Result<()> {
        window::run_window(self.config.clone())
    }
}
