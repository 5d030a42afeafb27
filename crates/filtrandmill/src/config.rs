use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use galleryconfig::GalleryConfig;

use crate::cli::{parse_window_size, RunArgs};
use crate::paths::AppPaths;

/// The configuration in effect plus the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GalleryConfig,
    pub source: Option<PathBuf>,
}

/// `--config` must exist; the discovered `gallery.toml` is optional and its
/// absence means defaults.
pub fn load(explicit: Option<&Path>, paths: &AppPaths) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
        });
    }

    let discovered = paths.config_file();
    if discovered.is_file() {
        let config = read_config(&discovered)?;
        return Ok(LoadedConfig {
            config,
            source: Some(discovered),
        });
    }

    tracing::debug!(
        path = %discovered.display(),
        "no configuration file found; using defaults"
    );
    Ok(LoadedConfig {
        config: GalleryConfig::default(),
        source: None,
    })
}

fn read_config(path: &Path) -> Result<GalleryConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    let mut config = GalleryConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load configuration at {}", path.display()))?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}

/// Folds command-line overrides into `config` and re-validates it.
pub fn apply_overrides(config: &mut GalleryConfig, args: &RunArgs) -> Result<()> {
    if let Some(image) = &args.image {
        config.input.image = image.clone();
    }
    if let Some(seed) = args.seed {
        config.generator.seed = Some(seed);
    }
    if let Some(size) = &args.size {
        let (width, height) = parse_window_size(size).map_err(anyhow::Error::msg)?;
        config.window.width = width;
        config.window.height = height;
    }
    if args.preview_formulas {
        config.render.preview_formulas = true;
    }
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;
    Ok(())
}
