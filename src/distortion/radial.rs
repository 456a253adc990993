//! Odd-order radial distortion: r_d = r × (1 + k1·r² + k2·r⁴ + k3·r⁶).
//!
//! Coefficients are stored in pixel units. Platepars carry them normalized by
//! half the image width; [`RadialDistortion::from_normalized`] converts.

/// Radial distortion with up to three odd-order terms.
///
/// The forward model maps ideal radius `r` to distorted radius:
///
/// ```text
/// r_d = r × (1 + k1·r² + k2·r⁴ + k3·r⁶)
/// ```
///
/// The inverse is found with Newton-Raphson.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialDistortion {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
}

impl RadialDistortion {
    pub fn new(k1: f64, k2: f64, k3: f64) -> Self {
        Self { k1, k2, k3 }
    }

    /// Build from coefficients expressed for radii normalized by `scale`.
    ///
    /// `terms` holds up to three values `[k1, k2, k3]`; missing terms are zero.
    pub fn from_normalized(terms: &[f64], scale: f64) -> Self {
        let term = |i: usize| terms.get(i).copied().unwrap_or(0.0);
        let s2 = scale * scale;
        Self {
            k1: term(0) / s2,
            k2: term(1) / (s2 * s2),
            k3: term(2) / (s2 * s2 * s2),
        }
    }

    fn scale_at(&self, r2: f64) -> f64 {
        let r4 = r2 * r2;
        1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r2 * r4
    }

    /// Forward distortion: ideal → distorted.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let s = self.scale_at(x * x + y * y);
        (x * s, y * s)
    }

    /// Inverse distortion: distorted → ideal.
    pub fn undistort(&self, x_d: f64, y_d: f64) -> (f64, f64) {
        let r_d = (x_d * x_d + y_d * y_d).sqrt();
        if r_d < 1e-12 {
            return (x_d, y_d);
        }

        let mut r = r_d;
        for _ in 0..20 {
            let r2 = r * r;
            let r4 = r2 * r2;
            let f = r * self.scale_at(r2) - r_d;
            let df = 1.0 + 3.0 * self.k1 * r2 + 5.0 * self.k2 * r4 + 7.0 * self.k3 * r2 * r4;

            let delta = f / df;
            r -= delta;
            if delta.abs() < 1e-12 {
                break;
            }
        }

        let s = r / r_d;
        (x_d * s, y_d * s)
    }

    pub fn is_zero(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.k3 == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undistort_inverts_distort() {
        // Mild barrel distortion on a 1280 px wide sensor
        let d = RadialDistortion::from_normalized(&[-0.05, 0.004, 0.0], 640.0);
        for &(x, y) in &[(100.0, 200.0), (500.0, 300.0), (0.0, 600.0), (-640.0, 360.0)] {
            let (xd, yd) = d.distort(x, y);
            let (xu, yu) = d.undistort(xd, yd);
            assert!(
                (xu - x).abs() < 1e-6 && (yu - y).abs() < 1e-6,
                "({}, {}) came back as ({}, {})",
                x,
                y,
                xu,
                yu
            );
        }
    }

    #[test]
    fn test_from_normalized_scaling() {
        let d = RadialDistortion::from_normalized(&[0.1], 100.0);
        assert!((d.k1 - 1e-5).abs() < 1e-18);
        assert_eq!(d.k2, 0.0);
        assert_eq!(d.k3, 0.0);
        // r = scale → normalized radius 1 → r_d = r (1 + k1)
        let (xd, _) = d.distort(100.0, 0.0);
        assert!((xd - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_origin_fixed() {
        let d = RadialDistortion::new(-1e-6, 1e-12, 0.0);
        assert_eq!(d.distort(0.0, 0.0), (0.0, 0.0));
        assert_eq!(d.undistort(0.0, 0.0), (0.0, 0.0));
        assert!(RadialDistortion::new(0.0, 0.0, 0.0).is_zero());
    }
}
