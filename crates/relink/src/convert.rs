//! Image conversion
//!
//! Re-encodes source images into their converted siblings, lossy at a
//! configurable quality by default or lossless on request. Existing siblings
//! are only replaced with consent, using the same confirm/auto state machine
//! as reference review: `y` overwrites one, `gg` overwrites this and every
//! later one, anything else leaves it alone.

use crate::document::converted_sibling;
use crate::errors::RelinkError;
use crate::policy::{ConfirmationChannel, PolicyState};
use image::DynamicImage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// WebP quality used when none is configured.
pub const DEFAULT_QUALITY: u8 = 80;

/// Encodes one image file into another.
pub trait ImageConverter {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), RelinkError>;
}

/// WebP encoder backed by libwebp.
///
/// `quality` (1-100) sets the lossy compression level; with `lossless` it
/// sets how hard the encoder works on size instead.
///
/// ```
/// use relink::convert::WebpConverter;
///
/// assert!(WebpConverter::new(75, false).is_ok());
/// assert!(WebpConverter::new(0, false).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WebpConverter {
    quality: u8,
    lossless: bool,
}

impl WebpConverter {
    pub fn new(quality: u8, lossless: bool) -> Result<Self, RelinkError> {
        if !(1..=100).contains(&quality) {
            return Err(RelinkError::InvalidConfig(format!(
                "Invalid WebP quality: {}. Expected a value from 1 to 100",
                quality
            )));
        }
        Ok(Self { quality, lossless })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn lossless(&self) -> bool {
        self.lossless
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, String> {
        let (width, height) = (image.width(), image.height());
        let quality = f32::from(self.quality);

        // libwebp only takes 8-bit RGB(A).
        let encoded = if image.color().has_alpha() {
            let pixels = image.to_rgba8();
            webp::Encoder::from_rgba(pixels.as_raw(), width, height)
                .encode_simple(self.lossless, quality)
        } else {
            let pixels = image.to_rgb8();
            webp::Encoder::from_rgb(pixels.as_raw(), width, height)
                .encode_simple(self.lossless, quality)
        };

        encoded
            .map(|memory| memory.to_vec())
            .map_err(|e| format!("WebP encoding failed: {:?}", e))
    }
}

impl Default for WebpConverter {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            lossless: false,
        }
    }
}

impl ImageConverter for WebpConverter {
    fn convert(&self, source: &Path, target: &Path) -> Result<(), RelinkError> {
        let encode_error = |message: String| RelinkError::Encode {
            path: source.to_path_buf(),
            message,
        };

        let decoded = image::open(source).map_err(|e| encode_error(e.to_string()))?;
        let buffer = self.encode(&decoded).map_err(encode_error)?;

        fs::write(target, &buffer).map_err(|source| RelinkError::Write {
            path: target.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvertReport {
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<ConvertFailure>,
}

/// Convert every image in `images` to its sibling.
///
/// `overwrite` is the starting policy for existing siblings: `Auto`
/// replaces them silently, `Confirming` asks `channel` about each one.
/// A failing image is recorded and the batch continues.
pub fn convert_all(
    images: &[PathBuf],
    converter: &dyn ImageConverter,
    mut overwrite: PolicyState,
    channel: &mut dyn ConfirmationChannel,
) -> Result<ConvertReport, RelinkError> {
    let mut report = ConvertReport::default();

    for image in images {
        let target = converted_sibling(image);

        if target.exists() && overwrite == PolicyState::Confirming {
            let decision = channel.confirm_overwrite(&target)?;
            overwrite = overwrite.after(decision);
            if !decision.applies() {
                debug!(image = %image.display(), "existing sibling kept");
                report.skipped.push(image.clone());
                continue;
            }
        }

        match converter.convert(image, &target) {
            Ok(()) => {
                info!(image = %image.display(), "converted");
                report.converted.push(target);
            }
            Err(e) => {
                warn!(image = %image.display(), "{}", e);
                report.failures.push(ConvertFailure {
                    path: image.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
