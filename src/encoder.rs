//! The symbol encoding seam.
//!
//! QR symbol encoding is an external capability. [`SymbolEncoder`] is the interface the
//! rest of the crate talks to; [`QrcodeEncoder`] is the built-in implementation backed by
//! the `qrcode` crate, and tests inject their own doubles. [`SymbolEncoderAdapter`] turns
//! either output shape of the capability into a tagged [`SymbolArtifact`].

use qrcode::QrCode;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::helper::{self, ModuleMatrix};
use crate::options::{EncodeOptions, GenerationOptions};

/// An injected QR encoding capability.
pub trait SymbolEncoder {
    /// Reports whether the capability can be used at all.
    ///
    /// # Errors
    ///
    /// [`Error::EncoderUnavailable`] when the capability is missing.
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Encodes `payload` into a displayable raster data URI.
    fn to_raster_data_uri(&self, payload: &str, options: &EncodeOptions) -> Result<String>;

    /// Encodes `payload` into SVG markup.
    fn to_markup(&self, payload: &str, options: &EncodeOptions) -> Result<String>;
}

impl<E: SymbolEncoder + ?Sized> SymbolEncoder for &E {
    fn check_available(&self) -> Result<()> {
        (**self).check_available()
    }

    fn to_raster_data_uri(&self, payload: &str, options: &EncodeOptions) -> Result<String> {
        (**self).to_raster_data_uri(payload, options)
    }

    fn to_markup(&self, payload: &str, options: &EncodeOptions) -> Result<String> {
        (**self).to_markup(payload, options)
    }
}

/// Encoder backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder;

impl QrcodeEncoder {
    pub fn new() -> Self {
        Self
    }

    fn module_matrix(payload: &str, options: &EncodeOptions) -> Result<ModuleMatrix> {
        let code = match options.error_correction {
            Some(level) => QrCode::with_error_correction_level(payload.as_bytes(), level.into()),
            None => QrCode::new(payload.as_bytes()),
        }
        .map_err(|e| Error::EncodeFailed(e.to_string()))?;

        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        ModuleMatrix::new(code.width(), modules)
            .ok_or_else(|| Error::EncodeFailed("encoder produced a non-square symbol".to_string()))
    }
}

impl SymbolEncoder for QrcodeEncoder {
    fn to_raster_data_uri(&self, payload: &str, options: &EncodeOptions) -> Result<String> {
        let matrix = Self::module_matrix(payload, options)?;
        let img = helper::to_image_buffer(&matrix, options);
        let png_bytes = helper::encode_png(&img)?;
        Ok(helper::png_data_uri(&png_bytes))
    }

    fn to_markup(&self, payload: &str, options: &EncodeOptions) -> Result<String> {
        let matrix = Self::module_matrix(payload, options)?;
        Ok(helper::to_svg_string(&matrix, options))
    }
}

/// Which shape of output to request from the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Raster,
    Vector,
}

/// One encoder output, produced per attempt and consumed by composition or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolArtifact {
    /// A displayable raster, as a `data:` URI.
    Raster(String),
    /// SVG markup.
    Vector(String),
}

impl SymbolArtifact {
    pub fn mode(&self) -> OutputMode {
        match self {
            Self::Raster(_) => OutputMode::Raster,
            Self::Vector(_) => OutputMode::Vector,
        }
    }
}

/// Normalizes calls into the injected encoder.
#[derive(Debug, Clone)]
pub struct SymbolEncoderAdapter<E> {
    encoder: E,
}

impl<E: SymbolEncoder> SymbolEncoderAdapter<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Forwards the capability's availability check.
    pub fn check_available(&self) -> Result<()> {
        self.encoder.check_available()
    }

    /// Encodes the options' payload in the requested mode.
    ///
    /// Pure with respect to session state.
    ///
    /// # Errors
    ///
    /// [`Error::EncoderUnavailable`] if the capability is missing, [`Error::EncodeFailed`]
    /// if the encoder rejects the payload or options.
    pub fn generate(
        &self,
        options: &GenerationOptions,
        mode: OutputMode,
    ) -> Result<SymbolArtifact> {
        self.generate_with(options.trimmed_payload(), &options.encode_options(), mode)
    }

    /// Like [`generate`](Self::generate) with an explicit encoder option set.
    pub fn generate_with(
        &self,
        payload: &str,
        options: &EncodeOptions,
        mode: OutputMode,
    ) -> Result<SymbolArtifact> {
        self.encoder.check_available()?;
        let artifact = match mode {
            OutputMode::Raster => self
                .encoder
                .to_raster_data_uri(payload, options)
                .map(SymbolArtifact::Raster),
            OutputMode::Vector => self
                .encoder
                .to_markup(payload, options)
                .map(SymbolArtifact::Vector),
        }
        .map_err(|e| match e {
            Error::EncoderUnavailable | Error::EncodeFailed(_) => e,
            other => Error::EncodeFailed(other.to_string()),
        });

        match &artifact {
            Ok(_) => debug!(?mode, width = options.width, "QR symbol encoded"),
            Err(e) => warn!(?mode, error = %e, "QR symbol encoding failed"),
        }
        artifact
    }
}
