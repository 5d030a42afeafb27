use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories_next::ProjectDirs;
use galleryconfig::CONFIG_FILE_NAME;

/// Points the gallery at a config directory other than the platform default.
pub const ENV_CONFIG_DIR: &str = "FILTRANDMILL_CONFIG_DIR";

/// Where filtrandmill looks for `gallery.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> anyhow::Result<Self> {
        Self::resolve(std::env::var_os(ENV_CONFIG_DIR), platform_config_dir)
    }

    /// An empty override counts as unset.
    fn resolve(
        override_dir: Option<OsString>,
        fallback: impl FnOnce() -> Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config_dir = match override_dir.filter(|dir| !dir.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => fallback().context("no home directory to keep gallery settings in")?,
        };
        Ok(Self::at(config_dir))
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "Filtrandmill", "Filtrandmill").map(|dirs| dirs.config_dir().into())
}
