//! Draws the encoded symbol and the optional logo onto the final square surface.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::encoder::SymbolArtifact;
use crate::error::{Error, Result};
use crate::helper;
use crate::logo::LogoAsset;
use crate::options::Color;

/// Pixels of backing plate drawn around each side of the logo.
pub const LOGO_PLATE_INSET: u32 = 5;

/// Edge of the logo box is a fifth (20%) of the image edge.
const LOGO_EDGE_DIVISOR: u32 = 5;

/// The finished raster: exactly `size x size` pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedResult {
    surface: RgbaImage,
}

impl ComposedResult {
    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.surface.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn into_image(self) -> RgbaImage {
        self.surface
    }
}

/// Where the logo lands on a surface of a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlacement {
    /// Top-left corner on both axes.
    pub origin: u32,
    /// Edge length of the logo box, `floor(size * 0.20)`.
    pub edge: u32,
}

impl LogoPlacement {
    /// Backing plate bounds as `(x0, y0, x1, y1)`, end-exclusive and clipped to the surface.
    pub fn plate_bounds(&self, size: u32) -> (u32, u32, u32, u32) {
        let start = self.origin.saturating_sub(LOGO_PLATE_INSET);
        let end = (self.origin + self.edge + LOGO_PLATE_INSET).min(size);
        (start, start, end, end)
    }
}

/// Computes the centered logo box for a surface of `size` pixels.
pub fn logo_placement(size: u32) -> LogoPlacement {
    let edge = size / LOGO_EDGE_DIVISOR;
    LogoPlacement {
        origin: (size - edge) / 2,
        edge,
    }
}

/// Decodes a raster artifact into a bitmap ready for [`compose`].
///
/// # Errors
///
/// [`Error::CompositionFailed`] for vector artifacts or undecodable rasters.
pub fn decode_symbol(artifact: &SymbolArtifact) -> Result<RgbaImage> {
    let SymbolArtifact::Raster(uri) = artifact else {
        return Err(Error::CompositionFailed(
            "vector symbols cannot be composited".to_string(),
        ));
    };
    let bytes = helper::decode_data_uri(uri)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::CompositionFailed(format!("symbol raster could not be decoded: {e}")))?;
    Ok(img.to_rgba8())
}

/// Composes the symbol, and the logo if any, onto a transparent `size x size` surface.
///
/// The logo sits on an opaque plate of `plate` color so it never touches modules.
pub fn compose(
    symbol: &RgbaImage,
    size: u32,
    logo: Option<&LogoAsset>,
    plate: Color,
) -> Result<ComposedResult> {
    compose_with_backdrop(symbol, size, logo, plate, None)
}

/// Like [`compose`], first filling the surface with `backdrop` when given.
pub fn compose_with_backdrop(
    symbol: &RgbaImage,
    size: u32,
    logo: Option<&LogoAsset>,
    plate: Color,
    backdrop: Option<Color>,
) -> Result<ComposedResult> {
    if size == 0 {
        return Err(Error::CompositionFailed("surface size must be positive".to_string()));
    }
    let (width, height) = symbol.dimensions();
    if width == 0 || width != height {
        return Err(Error::CompositionFailed(format!(
            "symbol raster must be square, got {width}x{height}"
        )));
    }

    let fill = backdrop.map_or(Rgba([0, 0, 0, 0]), Rgba::from);
    let mut surface = RgbaImage::from_pixel(size, size, fill);

    if width == size {
        imageops::overlay(&mut surface, symbol, 0, 0);
    } else {
        let scaled = imageops::resize(symbol, size, size, FilterType::Nearest);
        imageops::overlay(&mut surface, &scaled, 0, 0);
    }

    if let Some(logo) = logo {
        draw_logo(&mut surface, logo, plate);
    }

    debug!(size, with_logo = logo.is_some(), "QR code composed");
    Ok(ComposedResult { surface })
}

fn draw_logo(surface: &mut RgbaImage, logo: &LogoAsset, plate: Color) {
    let size = surface.width();
    let placement = logo_placement(size);
    if placement.edge == 0 {
        debug!(size, "surface too small for a logo, skipping overlay");
        return;
    }

    // The plate is always opaque, even for a translucent background.
    let (x0, y0, x1, y1) = placement.plate_bounds(size);
    let plate = Rgba([plate.r, plate.g, plate.b, u8::MAX]);
    for y in y0..y1 {
        for x in x0..x1 {
            surface.put_pixel(x, y, plate);
        }
    }

    let edge = placement.edge;
    let scaled = imageops::resize(logo.image(), edge, edge, FilterType::Triangle);
    let origin = i64::from(placement.origin);
    imageops::overlay(surface, &scaled, origin, origin);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FG: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const BG: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const LOGO: Rgba<u8> = Rgba([200, 30, 30, 255]);

    fn striped_symbol(edge: u32) -> RgbaImage {
        RgbaImage::from_fn(edge, edge, |x, _| if x % 2 == 0 { FG } else { BG })
    }

    // Resampling may round a channel by one.
    fn assert_logo_pixel(actual: &Rgba<u8>) {
        for (a, e) in actual.0.iter().zip(LOGO.0) {
            assert!(a.abs_diff(e) <= 1, "expected logo color, got {actual:?}");
        }
    }

    fn solid_logo() -> LogoAsset {
        LogoAsset::from_image(RgbaImage::from_pixel(37, 51, LOGO))
    }

    #[test]
    fn test_compose_without_logo_scales_symbol() {
        let result = compose(&striped_symbol(8), 64, None, Color::WHITE).unwrap();

        assert_eq!(result.size(), 64);
        assert_eq!(result.image().dimensions(), (64, 64));
        // Each source column covers 8 output columns.
        assert_eq!(*result.image().get_pixel(3, 10), FG);
        assert_eq!(*result.image().get_pixel(12, 10), BG);
    }

    #[test]
    fn test_logo_region_at_small_and_large_sizes() {
        for size in [64u32, 300, 1024] {
            let symbol = striped_symbol(size);
            let result = compose(&symbol, size, Some(&solid_logo()), Color::WHITE).unwrap();
            let placement = logo_placement(size);
            let img = result.image();
            let (origin, edge) = (placement.origin, placement.edge);

            assert_eq!(edge, size / 5);
            assert_eq!(origin, (size - edge) / 2);
            assert_logo_pixel(img.get_pixel(origin, origin));
            assert_logo_pixel(img.get_pixel(origin + edge - 1, origin + edge - 1));
            // Plate on every side, then modules again.
            assert_eq!(*img.get_pixel(origin - 1, origin + 1), BG);
            assert_eq!(*img.get_pixel(origin - LOGO_PLATE_INSET, origin), BG);
            assert_eq!(*img.get_pixel(origin + edge + LOGO_PLATE_INSET - 1, origin), BG);
            let outside = origin - LOGO_PLATE_INSET - 1;
            assert_eq!(img.get_pixel(outside, outside), symbol.get_pixel(outside, outside));
        }
    }

    #[test]
    fn test_plate_uses_configured_color() {
        let plate = Color::rgb(1, 2, 3);
        let result = compose(&striped_symbol(100), 100, Some(&solid_logo()), plate).unwrap();
        let placement = logo_placement(100);
        let corner = placement.origin - LOGO_PLATE_INSET;
        assert_eq!(*result.image().get_pixel(corner, corner), Rgba::from(plate));
    }

    #[test]
    fn test_plate_is_opaque_for_translucent_background() {
        let background: Color = "#ffffff80".parse().unwrap();
        let symbol = RgbaImage::from_pixel(100, 100, FG);
        let result = compose(&symbol, 100, Some(&solid_logo()), background).unwrap();
        let corner = logo_placement(100).origin - 3;

        assert_eq!(*result.image().get_pixel(corner, corner), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_tiny_surface_skips_logo() {
        let result = compose(&striped_symbol(4), 4, Some(&solid_logo()), Color::WHITE).unwrap();
        assert_eq!(result.image(), &striped_symbol(4));
    }

    #[test]
    fn test_backdrop_shows_through_transparent_symbol() {
        let symbol = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        let backdrop = Color::rgb(9, 9, 9);
        let result =
            compose_with_backdrop(&symbol, 10, None, Color::WHITE, Some(backdrop)).unwrap();
        assert_eq!(*result.image().get_pixel(5, 5), Rgba::from(backdrop));
    }

    #[test]
    fn test_rejects_bad_input() {
        let wide = RgbaImage::from_pixel(10, 5, FG);
        assert!(matches!(
            compose(&wide, 10, None, Color::WHITE),
            Err(Error::CompositionFailed(_))
        ));
        assert!(matches!(
            compose(&striped_symbol(4), 0, None, Color::WHITE),
            Err(Error::CompositionFailed(_))
        ));
        assert!(matches!(
            decode_symbol(&SymbolArtifact::Vector("<svg/>".into())),
            Err(Error::CompositionFailed(_))
        ));
        assert!(matches!(
            decode_symbol(&SymbolArtifact::Raster("data:image/png;base64,AAAA".into())),
            Err(Error::CompositionFailed(_))
        ));
    }

    #[test]
    fn test_identical_inputs_compose_identically() {
        let logo = solid_logo();
        let a = compose(&striped_symbol(33), 256, Some(&logo), Color::WHITE).unwrap();
        let b = compose(&striped_symbol(33), 256, Some(&logo), Color::WHITE).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn test_logo_box_is_centered_fifth(size in 1u32..=4096) {
            let placement = logo_placement(size);
            let edge = (f64::from(size) * 0.20).floor() as u32;
            prop_assert_eq!(placement.edge, edge);
            prop_assert_eq!(placement.origin, (size - edge) / 2);
            prop_assert!(placement.origin + placement.edge <= size);

            let (x0, y0, x1, y1) = placement.plate_bounds(size);
            prop_assert!(x0 <= placement.origin && y0 <= placement.origin);
            prop_assert!(x1 >= placement.origin + placement.edge && y1 <= size);
        }
    }
}
