use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Motion gate tuning. The defaults reproduce the reference gate:
/// 21x21 blur, binarize above 30, fire on more than 5000 changed pixels.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_pixel_threshold")]
    pub pixel_threshold: u64,
    #[serde(default = "default_blur_kernel")]
    pub blur_kernel: u32,
    #[serde(default = "default_diff_threshold")]
    pub diff_threshold: u8,
    /// Scale `pixel_threshold` by frame area relative to 640x480.
    #[serde(default)]
    pub scale_to_resolution: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompressionConfig {
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_preset")]
    pub preset: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessingConfig {
    /// Stop a pass after this many frames. Unset means the whole video.
    #[serde(default)]
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: default_pixel_threshold(),
            blur_kernel: default_blur_kernel(),
            diff_threshold: default_diff_threshold(),
            scale_to_resolution: false,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            confidence: default_confidence(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            crf: default_crf(),
            preset: default_preset(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file is `Ok(None)` so the caller
    /// can report the fallback once logging is up.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.detector.confidence) {
            return Err(ConfigError::Invalid(format!(
                "detector.confidence must be within [0, 1], got {}",
                self.detector.confidence
            )));
        }
        if self.motion.blur_kernel == 0 || self.motion.blur_kernel % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "motion.blur_kernel must be a positive odd number, got {}",
                self.motion.blur_kernel
            )));
        }
        if !matches!(self.compression.codec.as_str(), "h264" | "h265") {
            return Err(ConfigError::Invalid(format!(
                "compression.codec must be 'h264' or 'h265', got '{}'",
                self.compression.codec
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_pixel_threshold() -> u64 {
    5000
}
fn default_blur_kernel() -> u32 {
    21
}
fn default_diff_threshold() -> u8 {
    30
}
fn default_endpoint() -> String {
    "http://127.0.0.1:8000/detect".into()
}
fn default_confidence() -> f32 {
    0.5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_codec() -> String {
    "h264".into()
}
fn default_crf() -> u32 {
    23
}
fn default_preset() -> String {
    "veryfast".into()
}
fn default_log_level() -> String {
    "info".into()
}
