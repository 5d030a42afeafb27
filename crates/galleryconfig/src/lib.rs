//! `gallery.toml`: user-facing settings for the filtrandmill gallery.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. [`GalleryConfig::from_toml_str`] parses and validates.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

pub const CONFIG_VERSION: u32 = 1;
pub const CONFIG_FILE_NAME: &str = "gallery.toml";

/// Hard cap on operators per expression; the generator never exceeds it.
pub const MAX_OPERATORS_LIMIT: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialise(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub version: u32,
    pub input: InputConfig,
    pub window: WindowConfig,
    pub layout: LayoutConfig,
    pub scroll: ScrollConfig,
    pub generator: GeneratorConfig,
    pub render: RenderConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            input: InputConfig::default(),
            window: WindowConfig::default(),
            layout: LayoutConfig::default(),
            scroll: ScrollConfig::default(),
            generator: GeneratorConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Source image every formula samples. Its width sets the render size.
    pub image: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from("test.bmp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 900,
            title: "Filtrandmill".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub images_per_row: usize,
    pub rows_in_memory: usize,
    pub row_height: f32,
    pub column_stride: f32,
    pub tile_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            images_per_row: 4,
            rows_in_memory: 5,
            row_height: 300.0,
            column_stride: 270.0,
            tile_size: 256.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    pub stop_threshold: f32,
    pub damping: f32,
    pub springback: f32,
    pub wheel_gain: f32,
    pub wheel_acceleration: f32,
    /// Pixels scrolled per wheel line for touchpads reporting pixel deltas.
    pub pixels_per_line: f32,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub tick_interval: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            stop_threshold: 0.01,
            damping: 0.97,
            springback: 0.9,
            wheel_gain: 5.0,
            wheel_acceleration: 1.1,
            pixels_per_line: 40.0,
            tick_interval: default_tick_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub max_operators: usize,
    /// Fixed RNG seed; unset draws one from the OS at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_operators: MAX_OPERATORS_LIMIT,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Edge length of the square sample pass used to estimate output range.
    pub sample_size: u32,
    /// Show the hand-written preview formulas in the first slots.
    pub preview_formulas: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_size: 4,
            preview_formulas: false,
        }
    }
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1) / 120
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl GalleryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GalleryConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Makes a relative input image path relative to `base` instead of the
    /// working directory.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.input.image.is_relative() {
            self.input.image = base.join(&self.input.image);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        if self.input.image.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("input.image may not be empty".into()));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }

        let layout = &self.layout;
        if layout.images_per_row == 0 {
            return Err(ConfigError::Invalid(
                "layout.images_per_row must be at least 1".into(),
            ));
        }
        if layout.rows_in_memory < 2 {
            return Err(ConfigError::Invalid(format!(
                "layout.rows_in_memory must be at least 2, got {}",
                layout.rows_in_memory
            )));
        }
        for (name, value) in [
            ("layout.row_height", layout.row_height),
            ("layout.column_stride", layout.column_stride),
            ("layout.tile_size", layout.tile_size),
        ] {
            ensure_positive(name, value)?;
        }

        let scroll = &self.scroll;
        if !(scroll.damping > 0.0 && scroll.damping < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scroll.damping must be between 0 and 1 (exclusive), got {}",
                scroll.damping
            )));
        }
        if !(scroll.springback > 0.0 && scroll.springback < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scroll.springback must be between 0 and 1 (exclusive), got {}",
                scroll.springback
            )));
        }
        for (name, value) in [
            ("scroll.stop_threshold", scroll.stop_threshold),
            ("scroll.wheel_gain", scroll.wheel_gain),
            ("scroll.wheel_acceleration", scroll.wheel_acceleration),
            ("scroll.pixels_per_line", scroll.pixels_per_line),
        ] {
            ensure_positive(name, value)?;
        }
        if scroll.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "scroll.tick_interval must be greater than zero".into(),
            ));
        }

        if self.generator.max_operators > MAX_OPERATORS_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "generator.max_operators may not exceed {MAX_OPERATORS_LIMIT}, got {}",
                self.generator.max_operators
            )));
        }

        if self.render.sample_size == 0 {
            return Err(ConfigError::Invalid(
                "render.sample_size must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

fn ensure_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[input]
image = "images/lena.png"

[window]
width = 1920
height = 1080

[layout]
images_per_row = 6
rows_in_memory = 8

[scroll]
damping = 0.95
tick_interval = "5ms"

[generator]
max_operators = 8
seed = 1234

[render]
preview_formulas = true
"#;

    #[test]
    fn parses_sample_config() {
        let config = GalleryConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.input.image, PathBuf::from("images/lena.png"));
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.title, "Filtrandmill");
        assert_eq!(config.layout.images_per_row, 6);
        assert_eq!(config.layout.row_height, 300.0);
        assert_eq!(config.scroll.damping, 0.95);
        assert_eq!(config.scroll.tick_interval, Duration::from_millis(5));
        assert_eq!(config.generator.seed, Some(1234));
        assert!(config.render.preview_formulas);
        assert_eq!(config.render.sample_size, 4);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = GalleryConfig::from_toml_str("").unwrap();
        assert_eq!(config, GalleryConfig::default());
        assert_eq!(config.layout.images_per_row, 4);
        assert_eq!(config.layout.rows_in_memory, 5);
        assert_eq!(config.scroll.tick_interval, Duration::from_secs(1) / 120);
    }

    #[test]
    fn numeric_tick_interval_is_seconds() {
        let config = GalleryConfig::from_toml_str("[scroll]\ntick_interval = 0.5\n").unwrap();
        assert_eq!(config.scroll.tick_interval, Duration::from_millis(500));
    }

    #[test]
    fn rejects_too_few_rows_in_memory() {
        let err = GalleryConfig::from_toml_str("[layout]\nrows_in_memory = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_operator_cap_above_limit() {
        let err = GalleryConfig::from_toml_str("[generator]\nmax_operators = 17\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_damping_outside_unit_interval() {
        for damping in ["1.0", "0.0", "-0.5"] {
            let input = format!("[scroll]\ndamping = {damping}\n");
            let err = GalleryConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{damping}");
        }
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = GalleryConfig::from_toml_str("[layout]\ncolumns = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_future_version() {
        let err = GalleryConfig::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = GalleryConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("tick_interval = \"5ms\""));
        let reparsed = GalleryConfig::from_toml_str(&text).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn relative_image_resolves_against_base() {
        let mut config = GalleryConfig::default();
        config.resolve_paths(Path::new("/etc/filtrandmill"));
        assert_eq!(
            config.input.image,
            PathBuf::from("/etc/filtrandmill/test.bmp")
        );

        config.input.image = PathBuf::from("/abs/photo.png");
        config.resolve_paths(Path::new("/etc/filtrandmill"));
        assert_eq!(config.input.image, PathBuf::from("/abs/photo.png"));
    }
}
