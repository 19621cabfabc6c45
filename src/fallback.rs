//! The single fallback tier.
//!
//! Runs only after the primary attempt failed. It shares nothing with that attempt:
//! the raster is encoded again with the reduced option set (no error correction level,
//! so the encoder default applies) and composed onto a surface pre-filled with the
//! background color. There is no tier after this one.

use tracing::{info, warn};

use crate::compositor::{self, ComposedResult};
use crate::encoder::{OutputMode, SymbolEncoder, SymbolEncoderAdapter};
use crate::error::Result;
use crate::logo::LogoAsset;
use crate::options::GenerationOptions;

/// Re-encodes and re-composes `options` independently of any earlier attempt.
///
/// # Errors
///
/// Whatever the encode or compose step reports; the caller treats it as terminal.
pub fn generate_fallback<E: SymbolEncoder>(
    adapter: &SymbolEncoderAdapter<E>,
    options: &GenerationOptions,
    logo: Option<&LogoAsset>,
) -> Result<ComposedResult> {
    info!(size = options.size, "trying fallback generation");

    let encode_options = options.encode_options().reduced();
    let result = adapter
        .generate_with(options.trimmed_payload(), &encode_options, OutputMode::Raster)
        .and_then(|artifact| compositor::decode_symbol(&artifact))
        .and_then(|symbol| {
            compositor::compose_with_backdrop(
                &symbol,
                options.size,
                logo,
                options.background,
                Some(options.background),
            )
        });

    if let Err(e) = &result {
        warn!(error = %e, "fallback generation failed");
    }
    result
}
