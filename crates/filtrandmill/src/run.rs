use anyhow::Result;
use gallery::{GridLayout, ScrollSettings};
use galleryconfig::GalleryConfig;
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::config::{self, apply_overrides};
use crate::paths::AppPaths;

const DEFAULT_LOG_FILTER: &str = "warn,filtrandmill=info,renderer=info,gallery=info,\
naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";

pub fn run(args: RunArgs) -> Result<()> {
    let config = effective_config(&args)?;
    let seed = config.generator.seed.unwrap_or_else(rand::random);
    let renderer_config = renderer_config(&config, seed);
    tracing::info!(
        image = %renderer_config.input_image.display(),
        seed,
        width = renderer_config.window_size.0,
        height = renderer_config.window_size.1,
        "starting filtrandmill gallery"
    );

    let mut renderer = Renderer::new(renderer_config);
    renderer.run()
}

/// Prints the configuration `run` would use, overrides included.
pub fn print_config(args: &RunArgs) -> Result<()> {
    let config = effective_config(args)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

pub fn initialise_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn effective_config(args: &RunArgs) -> Result<GalleryConfig> {
    let paths = AppPaths::discover()?;
    let loaded = config::load(args.config.as_deref(), &paths)?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        source = ?loaded.source,
        "resolved filtrandmill configuration"
    );
    let mut config = loaded.config;
    apply_overrides(&mut config, args)?;
    Ok(config)
}

pub fn renderer_config(config: &GalleryConfig, seed: u64) -> RendererConfig {
    let layout = GridLayout {
        images_per_row: config.layout.images_per_row,
        row_height: config.layout.row_height,
        column_stride: config.layout.column_stride,
        tile_size: config.layout.tile_size,
    };
    let scroll = ScrollSettings {
        row_height: config.layout.row_height,
        stop_threshold: config.scroll.stop_threshold,
        damping: config.scroll.damping,
        springback: config.scroll.springback,
        wheel_gain: config.scroll.wheel_gain,
        wheel_acceleration: config.scroll.wheel_acceleration,
    };

    RendererConfig {
        window_size: (config.window.width, config.window.height),
        title: config.window.title.clone(),
        input_image: config.input.image.clone(),
        layout,
        rows_in_memory: config.layout.rows_in_memory,
        scroll,
        tick_interval: config.scroll.tick_interval,
        pixels_per_line: config.scroll.pixels_per_line,
        sample_size: config.render.sample_size,
        max_operators: config.generator.max_operators,
        seed,
        preview_formulas: config.render.preview_formulas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_renderer_defaults() {
        let mapped = renderer_config(&GalleryConfig::default(), 0);
        let defaults = RendererConfig::default();

        assert_eq!(mapped.window_size, defaults.window_size);
        assert_eq!(mapped.title, defaults.title);
        assert_eq!(mapped.input_image, defaults.input_image);
        assert_eq!(mapped.layout, defaults.layout);
        assert_eq!(mapped.rows_in_memory, defaults.rows_in_memory);
        assert_eq!(mapped.scroll, defaults.scroll);
        assert_eq!(mapped.tick_interval, defaults.tick_interval);
        assert_eq!(mapped.sample_size, defaults.sample_size);
        assert_eq!(mapped.max_operators, defaults.max_operators);
        assert!(!mapped.preview_formulas);
    }

    #[test]
    fn scroll_rows_follow_layout_rows() {
        let mut config = GalleryConfig::default();
        config.layout.row_height = 180.0;
        let mapped = renderer_config(&config, 7);

        assert_eq!(mapped.layout.row_height, 180.0);
        assert_eq!(mapped.scroll.row_height, 180.0);
        assert_eq!(mapped.seed, 7);
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
