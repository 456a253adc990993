//! # constellations
//!
//! Draws constellation lines over meteor camera exposures.
//!
//! Given a camera calibration ([`Platepar`]) and the time of an exposure, the
//! crate projects a table of constellation line endpoints into the image and
//! rasterizes them onto a transparent RGBA canvas that can be composited over
//! the exposure.
//!
//! ## Example
//!
//! ```no_run
//! use constellations::{
//!     render_constellation_overlay, CaptureMoment, Config, LineCatalog, PlateparProjector,
//!     PlateparSet,
//! };
//!
//! let ff_name = "FF_XX0001_20240812_213015_123_0012288.fits";
//! let platepars = PlateparSet::load_from_file("platepars_recalibrated.json").unwrap();
//! let platepar = platepars.get(ff_name).unwrap().clone();
//!
//! let config = Config::default();
//! let capture = CaptureMoment::from_ff_name(ff_name, &config.capture).unwrap();
//! let catalog = LineCatalog::builtin();
//!
//! let overlay = render_constellation_overlay(
//!     &platepar,
//!     capture,
//!     &catalog,
//!     &config.overlay,
//!     &PlateparProjector,
//! )
//! .unwrap();
//! overlay.save("overlay.png").unwrap();
//! ```
//!
//! ## Pipeline
//!
//! 1. **Capture moment**: the middle of the FF block, as a Julian date
//! 2. **Projection**: all line starts, then all line ends, through a
//!    [`SkyProjector`] (the [`PlateparProjector`] for real cameras)
//! 3. **Filtering**: lines whose start is at least `max_separation_deg` from the
//!    platepar pointing centre, or that have no finite projection, are dropped
//! 4. **Rasterization**: one-pixel lines, clipped to the canvas

pub mod camera_model;
pub mod capture;
pub mod catalogs;
pub mod config;
pub mod distortion;
mod error;
pub mod overlay;
pub mod platepar;
pub mod projection;

pub use capture::CaptureMoment;
pub use catalogs::{LineCatalog, LineSegment};
pub use config::{CaptureConfig, Config, OverlayConfig};
pub use error::{OverlayError, Result};
pub use overlay::{draw_segments, project_segments, render_constellation_overlay, PixelSegment};
pub use platepar::{Platepar, PlateparSet};
pub use projection::{angular_separation_deg, PlateparProjector, SkyProjector};

/// Overlay canvas: `X_res` × `Y_res` RGBA pixels.
pub type RenderCanvas = image::RgbaImage;
