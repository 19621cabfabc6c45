use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, Rgba, RgbaImage};
use tracing::trace;

use crate::error::{Error, Result};
use crate::options::EncodeOptions;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/*---- Module matrix ----*/

/// The square grid of dark and light modules produced by the symbol encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleMatrix {
    /// Builds a matrix from row-major module colors (`true` = dark).
    ///
    /// Returns `None` when `modules` is not `width * width` long.
    pub fn new(width: usize, modules: Vec<bool>) -> Option<Self> {
        (modules.len() == width * width).then_some(Self { width, modules })
    }

    /// Number of modules along one edge, quiet zone excluded.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules. Coordinates outside the symbol (the quiet zone)
    /// are light.
    pub fn get_module(&self, x: i64, y: i64) -> bool {
        let range = 0..self.width as i64;
        range.contains(&x)
            && range.contains(&y)
            && self.modules[y as usize * self.width + x as usize]
    }
}

/*---- Rendering ----*/

// Returns a string of SVG code for an image depicting the given module matrix,
// surrounded by `options.margin` light modules. The string always uses Unix newlines (\n).
pub fn to_svg_string(matrix: &ModuleMatrix, options: &EncodeOptions) -> String {
    let margin = options.margin as i64;
    let dimension = matrix.width() as i64 + margin * 2;
    let mut path = String::new();
    for y in 0..matrix.width() as i64 {
        for x in 0..matrix.width() as i64 {
            if matrix.get_module(x, y) {
                if !path.is_empty() {
                    path += " ";
                }
                path += &format!("M{},{}h1v1h-1z", x + margin, y + margin);
            }
        }
    }

    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {2} {2}\" shape-rendering=\"crispEdges\" stroke=\"none\">\n",
        options.width, options.height, dimension
    );
    result += &format!("\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n", options.light);
    result += &format!("\t<path d=\"{}\" fill=\"{}\"/>\n", path, options.dark);
    result += "</svg>\n";
    result
}

/// Rasterizes the matrix, quiet zone included, into exactly `width x height` pixels.
///
/// Each pixel samples the module under its top-left corner, so module edges land on the
/// same pixels for identical inputs.
pub fn to_image_buffer(matrix: &ModuleMatrix, options: &EncodeOptions) -> RgbaImage {
    let margin = i64::from(options.margin);
    let total = matrix.width() as u64 + 2 * u64::from(options.margin);
    let (width, height) = (options.width.max(1), options.height.max(1));
    let dark = Rgba::from(options.dark);
    let light = Rgba::from(options.light);

    ImageBuffer::from_fn(width, height, |x, y| {
        let qr_x = (u64::from(x) * total / u64::from(width)) as i64 - margin;
        let qr_y = (u64::from(y) * total / u64::from(height)) as i64 - margin;
        if matrix.get_module(qr_x, qr_y) {
            dark
        } else {
            light
        }
    })
}

/*---- PNG and data URIs ----*/

/// Encodes an RGBA surface as a PNG byte stream.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    PngEncoder::new(&mut png_bytes)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .map_err(Error::PngEncode)?;
    trace!(bytes = png_bytes.len(), "encoded PNG");
    Ok(png_bytes)
}

/// Wraps PNG bytes as a `data:image/png;base64,...` URI.
pub fn png_data_uri(png_bytes: &[u8]) -> String {
    format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png_bytes))
}

/// Extracts the image bytes of a base64 `data:` URI.
///
/// Any media type is accepted; the payload must be base64 encoded.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::CompositionFailed("symbol is not a data URI".to_string()))?;
    let (_, encoded) = rest
        .split_once(";base64,")
        .ok_or_else(|| Error::CompositionFailed("data URI is not base64 encoded".to_string()))?;
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::CompositionFailed(format!("invalid base64 in data URI: {e}")))
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Color, GenerationOptions};

    fn checkerboard(width: usize) -> ModuleMatrix {
        let modules = (0..width * width).map(|i| (i / width + i % width) % 2 == 0).collect();
        ModuleMatrix::new(width, modules).unwrap()
    }

    #[test]
    fn test_matrix_rejects_wrong_length() {
        assert!(ModuleMatrix::new(3, vec![false; 8]).is_none());
    }

    #[test]
    fn test_quiet_zone_is_light() {
        let matrix = checkerboard(3);
        assert!(matrix.get_module(0, 0));
        assert!(!matrix.get_module(-1, 0));
        assert!(!matrix.get_module(0, 3));
    }

    #[test]
    fn test_to_svg_string() {
        let options = GenerationOptions::new("x")
            .with_size(120)
            .with_colors(Color::rgb(255, 0, 0), Color::WHITE)
            .encode_options();
        let svg = to_svg_string(&checkerboard(3), &options);

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("width=\"120\" height=\"120\" viewBox=\"0 0 7 7\""));
        assert!(svg.contains("fill=\"#ff0000\""));
        assert!(svg.contains("M2,2h1v1h-1z M4,2h1v1h-1z"));
    }

    #[test]
    fn test_to_image_buffer() {
        // 3 modules + 2 * 1 margin = 5 modules across 50 pixels: 10 pixels per module.
        let options = GenerationOptions::new("x")
            .with_size(50)
            .with_margin(1)
            .encode_options();
        let img = to_image_buffer(&checkerboard(3), &options);

        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(*img.get_pixel(5, 5), Rgba::from(Color::WHITE));
        assert_eq!(*img.get_pixel(10, 10), Rgba::from(Color::BLACK));
        assert_eq!(*img.get_pixel(39, 10), Rgba::from(Color::BLACK));
        assert_eq!(*img.get_pixel(20, 10), Rgba::from(Color::WHITE));
    }

    #[test]
    fn test_data_uri() {
        let uri = png_data_uri(&[1, 2, 3]);
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap(), vec![1, 2, 3]);
        assert!(decode_data_uri("https://example.com/qr.png").is_err());
        assert!(decode_data_uri("data:image/png,raw").is_err());
    }
}
