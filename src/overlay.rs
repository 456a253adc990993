//! Constellation overlay rendering.
//!
//! Projects every catalog line into the image of a calibrated camera and draws
//! the ones that start near the pointing centre onto a transparent RGBA canvas.
//!
//! Filtering looks only at the *start* of each line: a segment is drawn when
//! its "from" endpoint is strictly closer than `max_separation_deg` to the
//! platepar's `(RA_d, dec_d)`, even if its "to" endpoint lies far outside that
//! radius. Lines whose endpoints have no finite projection are skipped.
//!
//! Pixel coordinates are rounded half away from zero before drawing.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use tracing::{debug, info, warn};

use crate::capture::CaptureMoment;
use crate::catalogs::LineCatalog;
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::platepar::Platepar;
use crate::projection::{angular_separation_deg, SkyProjector};

/// A catalog line that survived filtering, in rounded pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSegment {
    /// Row of the line in the catalog.
    pub index: usize,
    pub from: (i64, i64),
    pub to: (i64, i64),
}

/// Render the constellation overlay for one exposure.
///
/// The canvas is `X_res` wide and `Y_res` tall, transparent except for the
/// drawn lines. Any resolution override must already be applied to
/// `platepar`.
pub fn render_constellation_overlay<P>(
    platepar: &Platepar,
    capture: CaptureMoment,
    catalog: &LineCatalog,
    config: &OverlayConfig,
    projector: &P,
) -> Result<RgbaImage>
where
    P: SkyProjector + ?Sized,
{
    let segments = project_segments(platepar, capture, catalog, config, projector)?;

    let mut canvas = RgbaImage::new(platepar.x_res, platepar.y_res);
    draw_segments(&mut canvas, &segments, Rgba(config.line_color));

    info!(
        "Rendered {} of {} constellation lines onto {}x{} canvas",
        segments.len(),
        catalog.len(),
        platepar.x_res,
        platepar.y_res
    );
    Ok(canvas)
}

/// Project and filter catalog lines without drawing them.
///
/// Returns the lines to draw, in catalog order.
pub fn project_segments<P>(
    platepar: &Platepar,
    capture: CaptureMoment,
    catalog: &LineCatalog,
    config: &OverlayConfig,
    projector: &P,
) -> Result<Vec<PixelSegment>>
where
    P: SkyProjector + ?Sized,
{
    platepar.validate()?;
    config.validate()?;
    // from_datetime does not range-check, so validate here as well
    let jd = CaptureMoment::new(capture.jd())?.jd();

    if catalog.is_empty() {
        return Ok(Vec::new());
    }

    let n = catalog.len();
    let (from_ra, from_dec): (Vec<f64>, Vec<f64>) = catalog
        .iter()
        .map(|s| (s.from_ra_deg, s.from_dec_deg))
        .unzip();
    let (to_ra, to_dec): (Vec<f64>, Vec<f64>) = catalog
        .iter()
        .map(|s| (s.to_ra_deg, s.to_dec_deg))
        .unzip();

    let (from_x, from_y) = projector.project(&from_ra, &from_dec, jd, platepar)?;
    let separations: Vec<f64> = from_ra
        .iter()
        .zip(&from_dec)
        .map(|(&ra, &dec)| angular_separation_deg(platepar.ra_d, platepar.dec_d, ra, dec))
        .collect();
    let (to_x, to_y) = projector.project(&to_ra, &to_dec, jd, platepar)?;

    if [from_x.len(), from_y.len(), to_x.len(), to_y.len()]
        .iter()
        .any(|&len| len != n)
    {
        warn!(
            "Projector returned coordinate arrays of unexpected length for {} points",
            n
        );
    }
    let coord = |v: &[f64], i: usize| v.get(i).copied().unwrap_or(f64::NAN);

    let mut segments = Vec::new();
    let mut n_far = 0usize;
    let mut n_undefined = 0usize;
    for i in 0..n {
        if !(separations[i] < config.max_separation_deg) {
            n_far += 1;
            continue;
        }

        let from = (coord(&from_x, i), coord(&from_y, i));
        let to = (coord(&to_x, i), coord(&to_y, i));
        if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
            n_undefined += 1;
            debug!("Skipping line: {}", OverlayError::ProjectionUndefined { index: i });
            continue;
        }

        segments.push(PixelSegment {
            index: i,
            from: (round_px(from.0), round_px(from.1)),
            to: (round_px(to.0), round_px(to.1)),
        });
    }

    debug!(
        "{} lines kept, {} beyond {} deg, {} without a projection",
        segments.len(),
        n_far,
        config.max_separation_deg,
        n_undefined
    );
    Ok(segments)
}

/// Endpoints further than this many canvas sizes outside the canvas are
/// pulled in along the line before rasterization.
const CLIP_MARGIN_FACTOR: f64 = 16.0;

/// Draw one-pixel lines onto `canvas`.
///
/// Lines are handed to the rasterizer as they are, which skips pixels outside
/// the canvas. Only endpoints far beyond the canvas are moved in along the
/// line first, so the pixels of every line keep the slope of the original.
pub fn draw_segments(canvas: &mut RgbaImage, segments: &[PixelSegment], color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let margin = CLIP_MARGIN_FACTOR * w.max(h) as f64;
    let lo = (-margin, -margin);
    let hi = ((w - 1) as f64 + margin, (h - 1) as f64 + margin);

    for seg in segments {
        let p0 = (seg.from.0 as f64, seg.from.1 as f64);
        let p1 = (seg.to.0 as f64, seg.to.1 as f64);
        if let Some((a, b)) = clip_to_box(p0, p1, lo, hi) {
            draw_line_segment_mut(
                canvas,
                (a.0 as f32, a.1 as f32),
                (b.0 as f32, b.1 as f32),
                color,
            );
        }
    }
}

/// Round half away from zero, saturating at the `i64` range.
fn round_px(v: f64) -> i64 {
    v.round() as i64
}

type Point = (f64, f64);

/// Liang-Barsky clip of a segment to the box `[lo, hi]`.
///
/// Returns `None` when no part of the segment lies inside. Endpoints already
/// inside the box are returned unchanged.
fn clip_to_box(p0: Point, p1: Point, lo: Point, hi: Point) -> Option<(Point, Point)> {
    let dx = p1.0 - p0.0;
    let dy = p1.1 - p0.1;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, p0.0 - lo.0),
        (dx, hi.0 - p0.0),
        (-dy, p0.1 - lo.1),
        (dy, hi.1 - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| (p0.0 + t * dx, p0.1 + t * dy);
    let a = if t0 == 0.0 { p0 } else { at(t0) };
    let b = if t1 == 1.0 { p1 } else { at(t1) };
    Some((a, b))
}
