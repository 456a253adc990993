//! Write a transparent PNG with constellation lines for one FF file.
//!
//! ```text
//! draw_constellations platepars_recalibrated.json FF_XX0001_20240812_213015_123_0012288.fits
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use constellations::{
    render_constellation_overlay, CaptureMoment, Config, LineCatalog, PlateparProjector,
    PlateparSet,
};

#[derive(Parser)]
#[command(name = "draw_constellations")]
#[command(about = "Draw constellation lines for a calibrated FF file")]
#[command(version)]
struct Cli {
    /// Platepar set (JSON object keyed by FF file name). Distortion must be
    /// `radial3-odd`, `radial5-odd` or `radial7-odd` with `x_poly_rev` laid out
    /// as `[x0, y0, k1, k2, k3]`
    platepars_file: PathBuf,

    /// FF file to draw the overlay for
    ff_file: PathBuf,

    /// Output PNG (default: FF file name with `_constellations.png`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Square output resolution; also halves the plate scale and resets distortion
    #[arg(short, long)]
    resolution: Option<u32>,

    /// JSON configuration with `capture` and `overlay` sections. This is not
    /// the station's RMS `.config` file; set `capture.frames_per_block` here
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Constellation line table (default: built-in table of all 88 constellations)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the maximum separation of a line start from the pointing centre, degrees
    #[arg(long)]
    max_separation: Option<f64>,
}

fn default_output(ff_file: &Path) -> PathBuf {
    let name = ff_file.to_string_lossy().into_owned();
    let stem = name.strip_suffix(".fits").unwrap_or(&name);
    PathBuf::from(format!("{}_constellations.png", stem))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = run(Cli::parse())?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// Render and save the overlay; returns the path written.
fn run(cli: Cli) -> anyhow::Result<PathBuf> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(sep) = cli.max_separation {
        config.overlay.max_separation_deg = sep;
    }

    let ff_name = cli
        .ff_file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid FF file path {}", cli.ff_file.display()))?;

    let platepars = PlateparSet::load_from_file(&cli.platepars_file)
        .with_context(|| format!("loading platepars {}", cli.platepars_file.display()))?;
    let mut platepar = platepars.get(ff_name)?.clone();
    if let Some(res) = cli.resolution {
        platepar.override_resolution(res)?;
    }

    let catalog = match &cli.catalog {
        Some(path) => LineCatalog::load_from_file(path)?,
        None => LineCatalog::builtin(),
    };

    let capture = CaptureMoment::from_ff_name(ff_name, &config.capture)?;
    let overlay = render_constellation_overlay(
        &platepar,
        capture,
        &catalog,
        &config.overlay,
        &PlateparProjector,
    )?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.ff_file));
    overlay
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output(Path::new("/data/FF_XX0001_20240812_213015_123_0012288.fits")),
            PathBuf::from("/data/FF_XX0001_20240812_213015_123_0012288_constellations.png")
        );
        assert_eq!(
            default_output(Path::new("FF499_20170626_020520_353_0005120.bin")),
            PathBuf::from("FF499_20170626_020520_353_0005120.bin_constellations.png")
        );
    }

    #[test]
    fn test_run_writes_overridden_resolution() {
        let dir = std::env::temp_dir().join(format!("draw-constellations-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let ff_name = "FF_XX0001_20240105_220000_000_0000000.fits";
        let platepars = dir.join("platepars_recalibrated.json");
        // Pointing at Alnilam, centre of Orion's belt
        std::fs::write(
            &platepars,
            format!(
                r#"{{"{}": {{"X_res": 1280, "Y_res": 720, "RA_d": 84.05, "dec_d": -1.2,
                    "F_scale": 8.0, "distortion_type": "radial5-odd",
                    "x_poly_rev": [0.01, -0.02, -0.05, 0.004, 0.0], "refraction": true}}}}"#,
                ff_name
            ),
        )
        .unwrap();

        let ff_file = dir.join(ff_name);
        let ff_arg = ff_file.to_string_lossy().into_owned();
        let pp_arg = platepars.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["draw_constellations", &pp_arg, &ff_arg, "-r", "256"]).unwrap();
        let output = run(cli).unwrap();
        assert_eq!(output, default_output(&ff_file));

        let img = image::open(&output).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (256, 256));
        let opaque = img.pixels().filter(|p| p[3] != 0).count();
        assert!(opaque > 0, "Orion should be drawn");
        assert!(img.pixels().all(|p| p[3] == 0 || p.0 == [0, 0, 255, 192]));

        // An image without a platepar entry is reported, not rendered
        let other = dir.join("FF_XX0001_20240105_230000_000_0000000.fits");
        let other_arg = other.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from(["draw_constellations", &pp_arg, &other_arg]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("no calibration"), "{}", err);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_help_describes_input_formats() {
        use clap::CommandFactory;
        let cmd = Cli::command();
        let help = |id: &str| {
            let arg = cmd.get_arguments().find(|a| a.get_id() == id).unwrap();
            arg.get_long_help()
                .or_else(|| arg.get_help())
                .map(|h| h.to_string())
                .unwrap_or_default()
        };
        assert!(help("config").contains("not the station's RMS `.config` file"));
        assert!(help("platepars_file").contains("[x0, y0, k1, k2, k3]"));
    }
}
