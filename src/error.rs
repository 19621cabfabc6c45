//! Error types shared by every stage of the generation pipeline.

use thiserror::Error;

use crate::options::MAX_SIZE;

/// Errors produced while generating, compositing or exporting a QR code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The payload was empty or whitespace only.
    #[error("payload must not be empty")]
    EmptyPayload,

    /// The requested edge length is outside `1..=MAX_SIZE`.
    #[error("invalid size {0}px: must be between 1 and {max}", max = MAX_SIZE)]
    InvalidSize(u32),

    /// A color string could not be parsed.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// The QR encoding capability is missing from this runtime.
    #[error("QR encoder is not available")]
    EncoderUnavailable,

    /// The encoder rejected the payload or options.
    #[error("QR encoding failed: {0}")]
    EncodeFailed(String),

    /// Drawing the symbol or logo onto the surface failed.
    #[error("composition failed: {0}")]
    CompositionFailed(String),

    /// An export was requested before any generation succeeded.
    #[error("no QR code has been generated yet")]
    NoResultAvailable,

    /// Both the primary attempt and the fallback failed.
    #[error("generation failed (primary: {primary}; fallback: {fallback})")]
    GenerationFailed {
        /// Why the primary attempt failed.
        primary: Box<Error>,
        /// Why the fallback attempt failed.
        fallback: Box<Error>,
    },

    /// An uploaded logo could not be decoded as an image.
    #[error("logo could not be decoded: {0}")]
    LogoDecodeFailed(#[source] image::ImageError),

    /// The composed surface could not be written as PNG.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[source] image::ImageError),

    /// I/O error while reading a logo or delivering a download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a primary-path failure of this kind is retried by the fallback generator.
    #[must_use]
    pub fn escalates_to_fallback(&self) -> bool {
        matches!(self, Self::EncodeFailed(_) | Self::CompositionFailed(_))
    }

    /// Returns the single human-readable notification shown to the user.
    ///
    /// Diagnostic detail stays in [`Display`](std::fmt::Display) and the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyPayload => "Please enter a URL or text".to_string(),
            Self::InvalidSize(_) => {
                format!("Please choose a size between 1 and {MAX_SIZE} pixels")
            }
            Self::InvalidColor(value) => format!("\"{value}\" is not a valid color"),
            Self::EncoderUnavailable => {
                "QR code generator is not available. Please try again later.".to_string()
            }
            Self::NoResultAvailable => "Please generate a QR code first".to_string(),
            Self::LogoDecodeFailed(_) => "The selected logo could not be read".to_string(),
            Self::EncodeFailed(_)
            | Self::CompositionFailed(_)
            | Self::GenerationFailed { .. } => {
                "Error generating QR code. Please try again.".to_string()
            }
            Self::PngEncode(_) | Self::Io(_) => {
                "Error saving QR code. Please try again.".to_string()
            }
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_encode_and_composition_failures_escalate() {
        assert!(Error::EncodeFailed("bad".into()).escalates_to_fallback());
        assert!(Error::CompositionFailed("bad".into()).escalates_to_fallback());
        assert!(!Error::EncoderUnavailable.escalates_to_fallback());
        assert!(!Error::NoResultAvailable.escalates_to_fallback());
        assert!(!Error::EmptyPayload.escalates_to_fallback());
    }

    #[test]
    fn test_generation_failed_keeps_both_causes() {
        let err = Error::GenerationFailed {
            primary: Box::new(Error::EncodeFailed("primary".into())),
            fallback: Box::new(Error::CompositionFailed("fallback".into())),
        };
        let text = err.to_string();
        assert!(text.contains("primary"));
        assert!(text.contains("fallback"));
        assert_eq!(err.user_message(), "Error generating QR code. Please try again.");
    }
}
