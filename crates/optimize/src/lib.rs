//! Decode, downscale and re-encode images into the canonical stored form.
//!
//! Every artifact is stored as a baseline JPEG ([`CANONICAL_EXTENSION`]).
//! [`optimize`] decodes any raster format the `image` crate can read,
//! shrinks it (never enlarges it) so that it fits inside
//! [`OptimizeOptions::max_dimensions`] with its aspect ratio intact, flattens
//! alpha/palette modes to RGB, and encodes at [`OptimizeOptions::quality`].
//!
//! The transform is lossy and one-way. Always optimize from the original
//! source bytes; optimizing a stored artifact again degrades it further.
//! Output size is bounded in pixels, not bytes: a tiny input may well come
//! out larger than it went in.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Cursor;
use tracing::instrument;

/// File extension of every artifact produced by [`optimize`].
pub const CANONICAL_EXTENSION: &str = "jpg";

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}
impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(&self, bound: Dimensions) -> bool {
        self.width <= bound.width && self.height <= bound.height
    }

    /// The largest size with the same aspect ratio that fits inside `bound`.
    /// Sizes that already fit are returned unchanged (never upscaled).
    /// Neither side ever rounds down to zero.
    ///
    /// A bound with a zero side can't hold any image; `self` is returned
    /// unchanged. [`OptimizeOptions::validate`] rejects such bounds.
    pub fn bounded_by(&self, bound: Dimensions) -> Dimensions {
        if self.fits_within(bound) || bound.width == 0 || bound.height == 0 {
            return *self;
        }
        let scale = f64::min(
            f64::from(bound.width) / f64::from(self.width),
            f64::from(bound.height) / f64::from(self.height),
        );
        // Float-to-int `as` saturates; the clamp keeps rounding inside the bound.
        let scaled = |side: u32, limit: u32| ((f64::from(side) * scale).round() as u32).clamp(1, limit);
        Dimensions {
            width: scaled(self.width, bound.width),
            height: scaled(self.height, bound.height),
        }
    }
}
impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOptions {
    pub max_dimensions: Dimensions,
    /// JPEG quality, 1..=100.
    pub quality: u8,
}
impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_dimensions: Dimensions::new(1200, 800),
            quality: 85,
        }
    }
}
impl OptimizeOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            exn::bail!(ErrorKind::InvalidOptions(format!("quality {} is outside 1..=100", self.quality)));
        }
        if self.max_dimensions.width == 0 || self.max_dimensions.height == 0 {
            exn::bail!(ErrorKind::InvalidOptions(format!("max dimensions {} has a zero side", self.max_dimensions)));
        }
        Ok(())
    }
}

/// Canonical encoded bytes plus the pixel size they decode to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimized {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Decode `raw`, bound it to `options.max_dimensions` and re-encode it as JPEG.
///
/// CPU-bound; async callers should run it on a blocking thread.
///
/// # Errors
/// - [`UnsupportedFormat`](ErrorKind::UnsupportedFormat) if `raw` isn't a
///   recognisable raster image.
/// - [`DecodeFailure`](ErrorKind::DecodeFailure) if it is, but can't be decoded.
/// - [`Encode`](ErrorKind::Encode) if JPEG encoding fails.
/// - [`InvalidOptions`](ErrorKind::InvalidOptions) for out-of-range options.
#[instrument(skip(raw), fields(input_bytes = raw.len()))]
pub fn optimize(raw: &[u8], options: &OptimizeOptions) -> Result<Optimized> {
    options.validate()?;
    let format = image::guess_format(raw).or_raise(|| ErrorKind::UnsupportedFormat)?;
    if !format.reading_enabled() {
        exn::bail!(ErrorKind::UnsupportedFormat);
    }
    let decoded = image::load_from_memory_with_format(raw, format).or_raise(|| ErrorKind::DecodeFailure)?;

    let source = Dimensions::new(decoded.width(), decoded.height());
    let target = source.bounded_by(options.max_dimensions);
    let resized = match target == source {
        true => decoded,
        false => decoded.resize_exact(target.width, target.height, FilterType::Lanczos3),
    };
    // JPEG has no alpha channel; palette and alpha modes are flattened.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, options.quality);
    rgb.write_with_encoder(encoder).or_raise(|| ErrorKind::Encode)?;
    tracing::debug!(?format, %source, %target, output_bytes = bytes.len(), "Image optimized");
    Ok(Optimized { bytes, dimensions: target })
}

/// Read the pixel size of encoded image bytes without decoding the pixels.
pub fn dimensions_of(encoded: &[u8]) -> Result<Dimensions> {
    let reader =
        ImageReader::new(Cursor::new(encoded)).with_guessed_format().or_raise(|| ErrorKind::UnsupportedFormat)?;
    if reader.format().is_none() {
        exn::bail!(ErrorKind::UnsupportedFormat);
    }
    let (width, height) = reader.into_dimensions().or_raise(|| ErrorKind::DecodeFailure)?;
    Ok(Dimensions::new(width, height))
}
