use std::path::PathBuf;
use std::time::Duration;

use gallery::{GridLayout, ScrollSettings};

/// Immutable configuration passed to the renderer at start-up.
///
/// The binary builds this from `gallery.toml` plus CLI overrides.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub window_size: (u32, u32),
    pub title: String,
    /// Image every formula samples; its width sets the square render size.
    pub input_image: PathBuf,
    pub layout: GridLayout,
    pub rows_in_memory: usize,
    pub scroll: ScrollSettings,
    /// Fixed simulation step for scrolling and slot bookkeeping.
    pub tick_interval: Duration,
    /// Touchpad pixels that count as one wheel line.
    pub pixels_per_line: f32,
    /// Edge of the square sample pass used to estimate each formula's range.
    pub sample_size: u32,
    pub max_operators: usize,
    pub seed: u64,
    pub preview_formulas: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_size: (1280, 900),
            title: "Filtrandmill".to_string(),
            input_image: PathBuf::from("test.bmp"),
            layout: GridLayout::default(),
            rows_in_memory: 5,
            scroll: ScrollSettings::default(),
            tick_interval: Duration::from_secs(1) / 120,
            pixels_per_line: 40.0,
            sample_size: 4,
            max_operators: formula::MAX_OPERATORS,
            seed: 0,
            preview_formulas: false,
        }
    }
}

/// Why a single gallery image could not be produced. None of these stop the
/// gallery; the formula is dropped and the slot stays free.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("formula shader rejected: {0}")]
    Compile(String),
    #[error("render target rejected the pass: {0}")]
    Target(String),
    #[error("sample readback failed: {0}")]
    Readback(String),
    #[error("slot {0} has no backing texture")]
    UnknownSlot(usize),
}
