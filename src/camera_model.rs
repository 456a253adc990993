//! Camera intrinsics: focal length, distortion centre, parity, and distortion.
//!
//! Maps between tangent-plane coordinates and centred pixel coordinates.
//!
//! # Coordinate conventions
//!
//! - **Pixel coordinates**: origin at the image centre, +X right, +Y down.
//! - **Tangent-plane coordinates** `(ξ, η)`: gnomonic standard coordinates
//!   (unitless, `tan` of the angle from the optical axis), already rotated
//!   into the camera frame, with η pointing *down* the image.
//!
//! # Pipeline
//!
//! ```text
//! tangent plane → multiply by f → apply parity → distort → add crpix → pixel
//! pixel → subtract crpix → undistort → apply parity → divide by f → tangent plane
//! ```

use crate::distortion::Distortion;
use crate::error::Result;
use crate::platepar::Platepar;

#[derive(Debug, Clone)]
pub struct CameraModel {
    /// Focal length in pixels.
    pub focal_length_px: f64,
    /// Distortion centre offset from the geometric image centre, `[x, y]` pixels.
    pub crpix: [f64; 2],
    /// Mirror the x axis. Sky images have east to the left, so platepar
    /// cameras set this.
    pub parity_flip: bool,
    pub distortion: Distortion,
}

impl CameraModel {
    /// Intrinsics described by a platepar.
    ///
    /// `F_scale` is pixels per degree at the optical axis, which makes the
    /// focal length `F_scale · 180/π` pixels.
    pub fn from_platepar(pp: &Platepar) -> Result<Self> {
        let (distortion, crpix) = Distortion::from_platepar(pp)?;
        Ok(Self {
            focal_length_px: pp.f_scale.to_degrees(),
            crpix,
            parity_flip: true,
            distortion,
        })
    }

    pub fn tanplane_to_pixel(&self, xi: f64, eta: f64) -> (f64, f64) {
        let x = xi * self.focal_length_px;
        let y = eta * self.focal_length_px;
        let x = if self.parity_flip { -x } else { x };
        let (dx, dy) = self.distortion.distort(x, y);
        (dx + self.crpix[0], dy + self.crpix[1])
    }

    pub fn pixel_to_tanplane(&self, px: f64, py: f64) -> (f64, f64) {
        let x = px - self.crpix[0];
        let y = py - self.crpix[1];
        let (ux, uy) = self.distortion.undistort(x, y);
        let ux = if self.parity_flip { -ux } else { ux };
        (ux / self.focal_length_px, uy / self.focal_length_px)
    }
}
