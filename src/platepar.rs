//! Camera calibration ("platepar") records.
//!
//! Platepars are stored as JSON. A recalibration run writes one file holding
//! an object keyed by the source image file name, each value a platepar:
//!
//! ```json
//! {
//!   "FF_XX0001_20240812_213015_123_0012288.fits": {
//!     "X_res": 1280, "Y_res": 720, "RA_d": 284.1, "dec_d": 41.9,
//!     "F_scale": 7.9, "pos_angle_ref": 12.5, "JD": 2460535.39,
//!     "distortion_type": "radial5-odd", "x_poly_rev": [0.01, -0.02, -0.05, 0.004, 0.0]
//!   }
//! }
//! ```
//!
//! Keys not listed on [`Platepar`] are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OverlayError, Result};

/// Calibration of one camera: resolution, pointing, plate scale and distortion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platepar {
    #[serde(rename = "X_res")]
    pub x_res: u32,
    #[serde(rename = "Y_res")]
    pub y_res: u32,
    /// Right ascension of the optical centre at the reference time, degrees.
    #[serde(rename = "RA_d")]
    pub ra_d: f64,
    /// Declination of the optical centre, degrees.
    #[serde(rename = "dec_d")]
    pub dec_d: f64,
    /// Plate scale in pixels per degree.
    #[serde(rename = "F_scale")]
    pub f_scale: f64,
    /// Rotation of celestial north from image up, degrees, counter-clockwise.
    #[serde(default)]
    pub pos_angle_ref: f64,
    /// Julian date at which `ra_d` was measured.
    #[serde(rename = "JD", default)]
    pub jd: Option<f64>,
    #[serde(default)]
    pub station_code: Option<String>,
    /// Distortion model name, e.g. `radial3-odd`.
    #[serde(default)]
    pub distortion_type: String,
    /// Sky-to-image distortion coefficients `[x0, y0, k1, k2, k3]`,
    /// normalized by half the image width.
    #[serde(default)]
    pub x_poly_rev: Vec<f64>,
    #[serde(default)]
    pub refraction: bool,
}

impl Platepar {
    /// Minimal platepar with no rotation, no reference time and no distortion.
    pub fn new(x_res: u32, y_res: u32, ra_d: f64, dec_d: f64, f_scale: f64) -> Self {
        Self {
            x_res,
            y_res,
            ra_d,
            dec_d,
            f_scale,
            pos_angle_ref: 0.0,
            jd: None,
            station_code: None,
            distortion_type: String::new(),
            x_poly_rev: Vec::new(),
            refraction: false,
        }
    }

    /// Check the fields the renderer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.x_res == 0 || self.y_res == 0 {
            return Err(OverlayError::InvalidParameter(format!(
                "platepar resolution must be positive, got {}x{}",
                self.x_res, self.y_res
            )));
        }
        if !self.f_scale.is_finite() || self.f_scale == 0.0 {
            return Err(OverlayError::InvalidParameter(format!(
                "platepar F_scale must be finite and nonzero, got {}",
                self.f_scale
            )));
        }
        if !self.ra_d.is_finite() || !self.dec_d.is_finite() {
            return Err(OverlayError::InvalidParameter(format!(
                "platepar pointing must be finite, got RA {} Dec {}",
                self.ra_d, self.dec_d
            )));
        }
        Ok(())
    }

    /// Force a square output resolution.
    ///
    /// Matches the behaviour of the existing overlay tool: the plate scale is
    /// halved, refraction is turned off and the distortion model is reset.
    pub fn override_resolution(&mut self, resolution: u32) -> Result<()> {
        if resolution == 0 {
            return Err(OverlayError::InvalidParameter(
                "resolution override must be positive".to_string(),
            ));
        }
        self.x_res = resolution;
        self.y_res = resolution;
        self.f_scale *= 0.5;
        self.refraction = false;
        self.reset_distortion_parameters();
        Ok(())
    }

    /// Zero every distortion coefficient, keeping the model type.
    pub fn reset_distortion_parameters(&mut self) {
        self.x_poly_rev.iter_mut().for_each(|c| *c = 0.0);
    }
}

/// Platepars keyed by the image file name they were fitted on.
#[derive(Debug, Clone)]
pub struct PlateparSet {
    path: PathBuf,
    entries: HashMap<String, Platepar>,
}

impl PlateparSet {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::data_unavailable(path, e))?;
        let set = Self::from_json(&data, path)?;
        info!("Loaded {} platepars from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse a platepar set; `origin` is only used in error messages.
    pub fn from_json(data: &str, origin: &Path) -> Result<Self> {
        let entries: HashMap<String, Platepar> =
            serde_json::from_str(data).map_err(|e| OverlayError::data_unavailable(origin, e))?;
        Ok(Self {
            path: origin.to_path_buf(),
            entries,
        })
    }

    /// Look up the platepar for an image, by base file name.
    pub fn get(&self, image: &str) -> Result<&Platepar> {
        let name = Path::new(image)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(image);
        self.entries
            .get(name)
            .ok_or_else(|| OverlayError::CalibrationMissing {
                image: name.to_string(),
                path: self.path.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
