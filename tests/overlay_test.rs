//! Integration tests: render overlays for synthetic and platepar projectors and
//! check the filtering and rasterization behaviour end to end.

use constellations::{
    angular_separation_deg, project_segments, render_constellation_overlay, CaptureMoment,
    LineCatalog, LineSegment, OverlayConfig, OverlayError, Platepar, PlateparProjector,
    PlateparSet, RenderCanvas, SkyProjector,
};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

const JD: f64 = 2460535.39;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
}

fn capture() -> CaptureMoment {
    CaptureMoment::new(JD).unwrap()
}

fn opaque_pixels(canvas: &RenderCanvas) -> usize {
    canvas.pixels().filter(|p| p[3] != 0).count()
}

fn single_line(from: (f64, f64), to: (f64, f64)) -> LineCatalog {
    LineCatalog::new(vec![LineSegment {
        from_ra_deg: from.0,
        from_dec_deg: from.1,
        to_ra_deg: to.0,
        to_dec_deg: to.1,
    }])
}

fn with_separation(max_separation_deg: f64) -> OverlayConfig {
    OverlayConfig {
        max_separation_deg,
        ..Default::default()
    }
}

/// Maps (RA, Dec) straight to (x, y); every finite input stays finite.
fn linear_projector(ra: &[f64], dec: &[f64], _jd: f64, _pp: &Platepar) -> (Vec<f64>, Vec<f64>) {
    (
        ra.iter().map(|r| r * 2.0).collect(),
        dec.iter().map(|d| 100.0 - d).collect(),
    )
}

#[test]
fn test_empty_catalog_is_transparent() {
    init_tracing();
    for (w, h) in [(640, 480), (17, 3), (1, 1)] {
        let pp = Platepar::new(w, h, 83.0, -1.0, 10.0);
        let canvas = render_constellation_overlay(
            &pp,
            capture(),
            &LineCatalog::default(),
            &OverlayConfig::default(),
            &PlateparProjector,
        )
        .unwrap();
        assert_eq!(canvas.dimensions(), (w, h));
        assert_eq!(canvas.as_raw().len(), (w * h * 4) as usize);
        assert_eq!(opaque_pixels(&canvas), 0);
    }
}

#[test]
fn test_line_at_pointing_centre_is_drawn() {
    init_tracing();
    let pp = Platepar::new(640, 480, 10.0, 20.0, 20.0);
    let catalog = single_line((10.0, 20.0), (15.0, 25.0));
    let config = with_separation(90.0);

    let canvas =
        render_constellation_overlay(&pp, capture(), &catalog, &config, &PlateparProjector)
            .unwrap();
    assert_eq!(canvas.dimensions(), (640, 480));

    let (x, y) = PlateparProjector
        .project(&[10.0, 15.0], &[20.0, 25.0], JD, &pp)
        .unwrap();
    let start = (x[0].round() as u32, y[0].round() as u32);
    let end = (x[1].round() as u32, y[1].round() as u32);
    assert_eq!(start, (320, 240));
    println!("Line drawn from {:?} to {:?}", start, end);

    assert_eq!(canvas.get_pixel(start.0, start.1).0, config.line_color);
    assert_eq!(canvas.get_pixel(end.0, end.1).0, config.line_color);
    assert!(opaque_pixels(&canvas) > 50);
}

#[test]
fn test_line_far_from_pointing_centre_is_skipped() {
    init_tracing();
    let pp = Platepar::new(640, 480, 170.0, -20.0, 20.0);
    let catalog = single_line((10.0, 20.0), (15.0, 25.0));

    let canvas = render_constellation_overlay(
        &pp,
        capture(),
        &catalog,
        &with_separation(10.0),
        &PlateparProjector,
    )
    .unwrap();
    assert_eq!(opaque_pixels(&canvas), 0);
}

#[test]
fn test_zero_separation_draws_nothing() {
    init_tracing();
    let catalog = LineCatalog::builtin();
    // Pointing exactly at Betelgeuse, the start of the first Orion line
    let pp = Platepar::new(800, 600, 88.8, 7.4, 8.0);

    let segs = project_segments(
        &pp,
        capture(),
        &catalog,
        &with_separation(0.0),
        &linear_projector,
    )
    .unwrap();
    assert!(segs.is_empty());

    let canvas = render_constellation_overlay(
        &pp,
        capture(),
        &catalog,
        &with_separation(0.0),
        &PlateparProjector,
    )
    .unwrap();
    assert_eq!(opaque_pixels(&canvas), 0);
}

#[test]
fn test_full_sky_separation_draws_every_finite_line() {
    init_tracing();
    let catalog = LineCatalog::builtin();
    let pp = Platepar::new(800, 600, 0.0, -90.0, 8.0);

    let segs = project_segments(
        &pp,
        capture(),
        &catalog,
        &with_separation(180.0),
        &linear_projector,
    )
    .unwrap();
    assert_eq!(segs.len(), catalog.len());
    for (i, seg) in segs.iter().enumerate() {
        assert_eq!(seg.index, i, "segments must stay in catalog order");
        let line = &catalog.segments()[i];
        assert_eq!(seg.from.0, (line.from_ra_deg * 2.0).round() as i64);
        assert_eq!(seg.to.1, (100.0 - line.to_dec_deg).round() as i64);
    }
}

#[test]
fn test_filter_uses_only_the_line_start() {
    init_tracing();
    let pp = Platepar::new(640, 480, 10.0, 20.0, 20.0);
    let config = with_separation(3.0);

    // Starts at the centre, ends 7 degrees away: drawn in full
    let outward = single_line((10.0, 20.0), (10.0, 27.0));
    let segs = project_segments(&pp, capture(), &outward, &config, &PlateparProjector).unwrap();
    assert_eq!(segs.len(), 1);

    // Same line reversed: start is beyond the threshold, so nothing is drawn
    let inward = single_line((10.0, 27.0), (10.0, 20.0));
    let segs = project_segments(&pp, capture(), &inward, &config, &PlateparProjector).unwrap();
    assert!(segs.is_empty());
}

#[test]
fn test_undefined_projection_skips_only_that_line() {
    init_tracing();
    let pp = Platepar::new(200, 200, 10.0, 20.0, 5.0);
    let catalog = LineCatalog::parse("10,20,15,25\n10,20,11,21\n").unwrap();
    let projector = |ra: &[f64], dec: &[f64], _jd: f64, _pp: &Platepar| {
        let x: Vec<f64> = ra.iter().map(|&r| r * 10.0).collect();
        let y: Vec<f64> = dec
            .iter()
            .map(|&d| if d == 25.0 { f64::INFINITY } else { d * 5.0 })
            .collect();
        (x, y)
    };

    let canvas = render_constellation_overlay(
        &pp,
        capture(),
        &catalog,
        &OverlayConfig::default(),
        &projector,
    )
    .unwrap();
    // Second line runs from (100, 100) to (110, 105)
    assert_ne!(canvas.get_pixel(100, 100)[3], 0);
    assert_ne!(canvas.get_pixel(110, 105)[3], 0);
    // The first line would have started at the same pixel and headed off to
    // (150, inf); nothing of it may appear to the right of the second line
    for x in 111..200 {
        for y in 0..200 {
            assert_eq!(canvas.get_pixel(x, y)[3], 0, "stray pixel at ({}, {})", x, y);
        }
    }
}

#[test]
fn test_undefined_start_skips_only_that_line() {
    init_tracing();
    let pp = Platepar::new(200, 200, 10.0, 20.0, 5.0);
    let catalog = LineCatalog::parse("10,20,11,21\n12,21,13,22\n14,20,15,21\n").unwrap();
    // Starts of the first and last lines have no image
    let projector = |ra: &[f64], dec: &[f64], _jd: f64, _pp: &Platepar| {
        let x: Vec<f64> = ra
            .iter()
            .map(|&r| if r == 10.0 { f64::NAN } else { r * 10.0 })
            .collect();
        let y: Vec<f64> = ra
            .iter()
            .zip(dec)
            .map(|(&r, &d)| if r == 14.0 { f64::NEG_INFINITY } else { d * 5.0 })
            .collect();
        (x, y)
    };

    let segs = project_segments(&pp, capture(), &catalog, &OverlayConfig::default(), &projector)
        .unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].index, 1);
    assert_eq!(segs[0].from, (120, 105));
    assert_eq!(segs[0].to, (130, 110));

    let canvas = render_constellation_overlay(
        &pp,
        capture(),
        &catalog,
        &OverlayConfig::default(),
        &projector,
    )
    .unwrap();
    assert!(opaque_pixels(&canvas) > 0);
    // Nothing is drawn where the skipped lines would have ended
    assert_eq!(canvas.get_pixel(110, 105)[3], 0);
    assert_eq!(canvas.get_pixel(150, 105)[3], 0);
}

#[test]
fn test_lines_leaving_the_canvas_are_clipped() {
    init_tracing();
    let pp = Platepar::new(64, 48, 0.0, 0.0, 1.0);
    let catalog = LineCatalog::parse("0,0,1,1\n").unwrap();
    let projector = |ra: &[f64], _dec: &[f64], _jd: f64, _pp: &Platepar| {
        let x: Vec<f64> = ra.iter().map(|&r| if r == 0.0 { -1e12 } else { 1e12 }).collect();
        (x, vec![20.4; ra.len()])
    };
    let canvas = render_constellation_overlay(
        &pp,
        capture(),
        &catalog,
        &OverlayConfig::default(),
        &projector,
    )
    .unwrap();
    assert_eq!(opaque_pixels(&canvas), 64);
    assert!((0..64).all(|x| canvas.get_pixel(x, 20)[3] == 192));
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let catalog = LineCatalog::builtin();
    let good = Platepar::new(640, 480, 10.0, 20.0, 20.0);

    let err = render_constellation_overlay(
        &good,
        capture(),
        &catalog,
        &with_separation(-1.0),
        &PlateparProjector,
    )
    .unwrap_err();
    assert!(matches!(err, OverlayError::InvalidParameter(_)));

    let bad = Platepar::new(640, 0, 10.0, 20.0, 20.0);
    let err = render_constellation_overlay(
        &bad,
        capture(),
        &catalog,
        &OverlayConfig::default(),
        &PlateparProjector,
    )
    .unwrap_err();
    assert!(matches!(err, OverlayError::InvalidParameter(_)));
}

#[test]
fn test_separation_symmetry() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..1000 {
        let a = (rng.random_range(0.0..360.0), rng.random_range(-90.0..90.0));
        let b = (rng.random_range(0.0..360.0), rng.random_range(-90.0..90.0));
        let ab = angular_separation_deg(a.0, a.1, b.0, b.1);
        let ba = angular_separation_deg(b.0, b.1, a.0, a.1);
        assert_eq!(ab, ba, "separation not symmetric for {:?} {:?}", a, b);
        assert!((0.0..=180.0).contains(&ab));
        assert!(angular_separation_deg(a.0, a.1, a.0, a.1) < 1e-5);
    }
}

#[test]
fn test_pointing_centre_projects_near_image_centre() {
    let json = format!(
        r#"{{"FF_XX0001_20240812_213015_123_0012288.fits": {{
            "X_res": 1280, "Y_res": 720, "RA_d": 284.1, "dec_d": 41.9, "F_scale": 7.9,
            "pos_angle_ref": 12.5, "JD": {}, "distortion_type": "radial5-odd",
            "x_poly_rev": [0.004, -0.003, -0.05, 0.004, 0.0]
        }}}}"#,
        JD
    );
    let set = PlateparSet::from_json(&json, std::path::Path::new("platepars.json")).unwrap();
    let pp = set.get("FF_XX0001_20240812_213015_123_0012288.fits").unwrap();

    let (x, y) = PlateparProjector
        .project(&[pp.ra_d], &[pp.dec_d], JD, pp)
        .unwrap();
    // Only the distortion-centre offset separates it from the image centre
    assert!((x[0] - 640.0).abs() < 3.0, "x = {}", x[0]);
    assert!((y[0] - 360.0).abs() < 3.0, "y = {}", y[0]);
}

#[test]
fn test_render_from_files() {
    init_tracing();
    let dir = std::env::temp_dir().join(format!("constellations-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let catalog_path = dir.join("lines.csv");
    std::fs::write(&catalog_path, "88.7929,7.4071,81.2828,6.3497\n85.1897,-1.9426,84.0534,-1.2019\n")
        .unwrap();
    let first = LineCatalog::load_from_file(&catalog_path).unwrap();
    let second = LineCatalog::load_from_file(&catalog_path).unwrap();
    assert_eq!(first, second);

    let platepar_path = dir.join("platepars.json");
    std::fs::write(
        &platepar_path,
        r#"{"FF_XX0001_20240105_220000_000_0000000.fits":
            {"X_res": 720, "Y_res": 576, "RA_d": 84.0, "dec_d": 2.0, "F_scale": 20.0}}"#,
    )
    .unwrap();
    let set = PlateparSet::load_from_file(&platepar_path).unwrap();
    let pp = set.get("FF_XX0001_20240105_220000_000_0000000.fits").unwrap();

    let canvas = render_constellation_overlay(
        pp,
        capture(),
        &first,
        &OverlayConfig::default(),
        &PlateparProjector,
    )
    .unwrap();
    assert_eq!(canvas.dimensions(), (720, 576));
    assert!(opaque_pixels(&canvas) > 0);

    let out = dir.join("overlay.png");
    canvas.save(&out).unwrap();
    let reloaded = image::open(&out).unwrap().to_rgba8();
    assert_eq!(reloaded, canvas);

    let missing = set.get("FF_XX0001_20240105_230000_000_0000000.fits");
    assert!(matches!(missing, Err(OverlayError::CalibrationMissing { .. })));

    std::fs::remove_dir_all(&dir).unwrap();
}
