//! Renderer and station configuration.
//!
//! Configuration is a JSON document; every key is optional:
//!
//! ```json
//! {
//!   "capture": { "fps": 25.0, "frames_per_block": 256 },
//!   "overlay": { "max_separation_deg": 90.0, "line_color": [0, 0, 255, 192] }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OverlayError, Result};

/// How the overlay is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Segments whose start point lies this far or farther from the pointing
    /// centre are not drawn. Degrees, within `[0, 180]`.
    pub max_separation_deg: f64,
    /// RGBA line colour. The alpha channel sets line opacity; the background
    /// stays fully transparent.
    pub line_color: [u8; 4],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_separation_deg: 90.0,
            line_color: [0, 0, 255, 192],
        }
    }
}

impl OverlayConfig {
    pub fn validate(&self) -> Result<()> {
        let sep = self.max_separation_deg;
        if !sep.is_finite() || !(0.0..=180.0).contains(&sep) {
            return Err(OverlayError::InvalidParameter(format!(
                "max_separation_deg must be within [0, 180], got {}",
                sep
            )));
        }
        Ok(())
    }
}

/// Capture settings of the station that recorded the FF files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frames per second of the camera.
    pub fps: f64,
    /// Number of video frames compressed into one FF file.
    pub frames_per_block: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 25.0,
            frames_per_block: 256,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(OverlayError::InvalidParameter(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub overlay: OverlayConfig,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::data_unavailable(path, e))?;
        let config: Config =
            serde_json::from_str(&data).map_err(|e| OverlayError::data_unavailable(path, e))?;
        config.capture.validate()?;
        config.overlay.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
