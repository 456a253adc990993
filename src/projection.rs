//! Sky-to-pixel projection.
//!
//! The renderer only depends on the [`SkyProjector`] trait, so any mapping
//! from (RA, Dec, time, platepar) to pixels can be plugged in. Closures with
//! the signature `Fn(&[f64], &[f64], f64, &Platepar) -> (Vec<f64>, Vec<f64>)`
//! implement the trait directly, which keeps synthetic projectors in tests short.
//!
//! [`PlateparProjector`] is the projector used for real platepars:
//!
//! ```text
//! (RA, Dec) → gnomonic (ξ, η) about the pointing centre at `jd`
//!           → rotate by pos_angle_ref → camera model → image pixels
//! ```
//!
//! Image pixels have their origin at the top-left corner; the optical centre is
//! at `(X_res / 2, Y_res / 2)`.

use nalgebra::{Rotation2, Vector2};
use tracing::debug;

use crate::camera_model::CameraModel;
use crate::capture::gmst_deg;
use crate::error::Result;
use crate::platepar::Platepar;

/// Vectorized sky-to-pixel mapping under a calibration at a given time.
///
/// Implementations must be pure: projecting points one at a time or in one
/// batch gives identical results. Positions outside the valid domain of the
/// model come back as non-finite coordinates.
pub trait SkyProjector {
    /// Map RA/Dec (degrees) to image pixel coordinates `(x, y)`.
    fn project(
        &self,
        ra_deg: &[f64],
        dec_deg: &[f64],
        jd: f64,
        platepar: &Platepar,
    ) -> Result<(Vec<f64>, Vec<f64>)>;
}

impl<F> SkyProjector for F
where
    F: Fn(&[f64], &[f64], f64, &Platepar) -> (Vec<f64>, Vec<f64>),
{
    fn project(
        &self,
        ra_deg: &[f64],
        dec_deg: &[f64],
        jd: f64,
        platepar: &Platepar,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        Ok(self(ra_deg, dec_deg, jd, platepar))
    }
}

/// Great-circle distance between two sky positions, in degrees.
///
/// Spherical law of cosines; inputs in degrees.
pub fn angular_separation_deg(ra1_deg: f64, dec1_deg: f64, ra2_deg: f64, dec2_deg: f64) -> f64 {
    let (sd1, cd1) = dec1_deg.to_radians().sin_cos();
    let (sd2, cd2) = dec2_deg.to_radians().sin_cos();
    let cos_dra = (ra1_deg - ra2_deg).to_radians().cos();
    (sd1 * sd2 + cd1 * cd2 * cos_dra).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Gnomonic projection for fixed (non-tracking) platepar cameras.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlateparProjector;

impl PlateparProjector {
    /// RA/Dec (degrees) of the optical axis at `jd`.
    ///
    /// The camera is fixed to the ground, so the sky turns under it: the
    /// centre's RA advances with sidereal time since the platepar's reference
    /// `JD`. Without a reference time the platepar is taken as valid at `jd`.
    pub fn pointing_at(&self, platepar: &Platepar, jd: f64) -> (f64, f64) {
        let ra = match platepar.jd {
            Some(jd_ref) => platepar.ra_d + gmst_deg(jd) - gmst_deg(jd_ref),
            None => platepar.ra_d,
        };
        (ra.rem_euclid(360.0), platepar.dec_d)
    }

    /// Inverse mapping: image pixels back to RA/Dec in degrees.
    pub fn unproject(
        &self,
        x: &[f64],
        y: &[f64],
        jd: f64,
        platepar: &Platepar,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let cam = CameraModel::from_platepar(platepar)?;
        let (ra0, dec0) = self.pointing_at(platepar, jd);
        let rot = Rotation2::new(platepar.pos_angle_ref.to_radians());
        let (cx, cy) = image_centre(platepar);

        Ok(x.iter()
            .zip(y)
            .map(|(&px, &py)| {
                let (u, w) = cam.pixel_to_tanplane(px - cx, py - cy);
                let v = rot.inverse_transform_vector(&Vector2::new(u, -w));
                let (ra, dec) = deproject_gnomonic(ra0.to_radians(), dec0.to_radians(), v.x, v.y);
                (ra.to_degrees().rem_euclid(360.0), dec.to_degrees())
            })
            .unzip())
    }
}

impl SkyProjector for PlateparProjector {
    fn project(
        &self,
        ra_deg: &[f64],
        dec_deg: &[f64],
        jd: f64,
        platepar: &Platepar,
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let cam = CameraModel::from_platepar(platepar)?;
        if platepar.refraction {
            debug!("Platepar requests refraction; positions are projected without it");
        }

        let (ra0, dec0) = self.pointing_at(platepar, jd);
        let (ra0, dec0) = (ra0.to_radians(), dec0.to_radians());
        let rot = Rotation2::new(platepar.pos_angle_ref.to_radians());
        let (cx, cy) = image_centre(platepar);

        Ok(ra_deg
            .iter()
            .zip(dec_deg)
            .map(|(&ra, &dec)| {
                match project_gnomonic(ra0, dec0, ra.to_radians(), dec.to_radians()) {
                    Some((xi, eta)) => {
                        let v = rot * Vector2::new(xi, eta);
                        // Camera frame has η pointing down the image
                        let (px, py) = cam.tanplane_to_pixel(v.x, -v.y);
                        (cx + px, cy + py)
                    }
                    None => (f64::NAN, f64::NAN),
                }
            })
            .unzip())
    }
}

fn image_centre(platepar: &Platepar) -> (f64, f64) {
    (platepar.x_res as f64 / 2.0, platepar.y_res as f64 / 2.0)
}

/// Standard coordinates (ξ east, η north) of a point about a tangent point.
/// All angles in radians. Points on or behind the tangent plane have no image.
fn project_gnomonic(ra0: f64, dec0: f64, ra: f64, dec: f64) -> Option<(f64, f64)> {
    let (sd0, cd0) = dec0.sin_cos();
    let (sd, cd) = dec.sin_cos();
    let (sda, cda) = (ra - ra0).sin_cos();

    let cos_c = sd0 * sd + cd0 * cd * cda;
    if !(cos_c > 0.0) {
        return None;
    }
    let xi = cd * sda / cos_c;
    let eta = (cd0 * sd - sd0 * cd * cda) / cos_c;
    Some((xi, eta))
}

fn deproject_gnomonic(ra0: f64, dec0: f64, xi: f64, eta: f64) -> (f64, f64) {
    let rho = xi.hypot(eta);
    if rho < 1e-15 {
        return (ra0, dec0);
    }
    let (sd0, cd0) = dec0.sin_cos();
    let (sc, cc) = rho.atan().sin_cos();
    let dec = (cc * sd0 + eta * sc * cd0 / rho).clamp(-1.0, 1.0).asin();
    let ra = ra0 + (xi * sc).atan2(rho * cd0 * cc - eta * sd0 * sc);
    (ra, dec)
}
