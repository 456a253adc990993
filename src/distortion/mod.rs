//! Lens distortion applied between the ideal pinhole image and the detector.
//!
//! Platepars describe distortion with a model name and a coefficient list.
//! Only the odd radial family is supported:
//!
//! | `distortion_type` | radial terms used |
//! |-------------------|-------------------|
//! | `radial3-odd`     | k1                |
//! | `radial5-odd`     | k1, k2            |
//! | `radial7-odd`     | k1, k2, k3        |
//!
//! `x_poly_rev` holds `[x0, y0, k1, k2, k3]`, all normalized by half the image
//! width. `(x0, y0)` is the offset of the distortion centre from the image centre.
//! There are no aspect or asymmetry terms, and polynomial models such as
//! `poly3+radial` are rejected unless all their coefficients are zero.

pub mod radial;

pub use radial::RadialDistortion;

use crate::error::{OverlayError, Result};
use crate::platepar::Platepar;

/// Lens distortion model in pixel units, relative to the distortion centre.
#[derive(Debug, Clone, Default)]
pub enum Distortion {
    #[default]
    None,
    /// r_distorted = r × (1 + k1·r² + k2·r⁴ + k3·r⁶).
    Radial(RadialDistortion),
}

impl Distortion {
    /// Build the distortion model described by a platepar.
    ///
    /// Returns the model and the distortion-centre offset in pixels. All-zero
    /// coefficients yield [`Distortion::None`] whatever the model name.
    pub fn from_platepar(pp: &Platepar) -> Result<(Self, [f64; 2])> {
        let coeffs = &pp.x_poly_rev;
        if coeffs.iter().all(|&c| c == 0.0) {
            return Ok((Distortion::None, [0.0, 0.0]));
        }

        let n_terms = match pp.distortion_type.as_str() {
            "radial3-odd" => 1,
            "radial5-odd" => 2,
            "radial7-odd" => 3,
            other => {
                return Err(OverlayError::InvalidParameter(format!(
                    "unsupported distortion type '{}' (expected radial3-odd, radial5-odd or radial7-odd)",
                    other
                )))
            }
        };

        let scale = pp.x_res as f64 / 2.0;
        let coeff = |i: usize| coeffs.get(i).copied().unwrap_or(0.0);
        let offset = [coeff(0) * scale, coeff(1) * scale];
        let terms: Vec<f64> = (0..n_terms).map(|i| coeff(2 + i)).collect();

        let radial = RadialDistortion::from_normalized(&terms, scale);
        let model = if radial.is_zero() {
            Distortion::None
        } else {
            Distortion::Radial(radial)
        };
        Ok((model, offset))
    }

    /// Ideal (pinhole) → observed pixel coordinates.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Distortion::None => (x, y),
            Distortion::Radial(r) => r.distort(x, y),
        }
    }

    /// Observed → ideal pixel coordinates.
    pub fn undistort(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Distortion::None => (x, y),
            Distortion::Radial(r) => r.undistort(x, y),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Distortion::None)
    }
}
