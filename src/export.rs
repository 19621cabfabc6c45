//! PNG and SVG export, download naming and delivery.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::compositor::ComposedResult;
use crate::encoder::{OutputMode, SymbolArtifact, SymbolEncoder, SymbolEncoderAdapter};
use crate::error::{Error, Result};
use crate::helper;
use crate::options::GenerationOptions;

const FILENAME_PREFIX: &str = "qr-code-";

/// Download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A request to download the current result. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub format: ExportFormat,
    /// `qr-code-<timestamp>`, without extension.
    pub filename_base: String,
}

impl DownloadRequest {
    /// Names the download after `timestamp`, truncated to whole seconds with `:` as `-`.
    pub fn new(format: ExportFormat, timestamp: DateTime<Utc>) -> Self {
        let stamp = timestamp.format("%Y-%m-%dT%H-%M-%S");
        Self {
            format,
            filename_base: format!("{FILENAME_PREFIX}{stamp}"),
        }
    }

    /// A request stamped with the current time.
    pub fn now(format: ExportFormat) -> Self {
        Self::new(format, Utc::now())
    }

    pub fn filename(&self) -> String {
        format!("{}.{}", self.filename_base, self.format.extension())
    }
}

/// A named file ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadFile {
    pub fn new(request: &DownloadRequest, bytes: Vec<u8>) -> Self {
        Self {
            filename: request.filename(),
            mime_type: request.format.mime_type(),
            bytes,
        }
    }
}

/// Losslessly encodes the composed surface as PNG.
///
/// # Errors
///
/// [`Error::NoResultAvailable`] when nothing has been generated yet.
pub fn export_png(result: Option<&ComposedResult>) -> Result<Vec<u8>> {
    let result = result.ok_or(Error::NoResultAvailable)?;
    let bytes = helper::encode_png(result.image())?;
    debug!(size = result.size(), bytes = bytes.len(), "exported PNG");
    Ok(bytes)
}

/// Encodes `options` again in vector mode and returns the UTF-8 markup.
///
/// The composed raster is not used, so SVG exports never carry the logo. There is no
/// fallback tier for vector export.
pub fn export_svg<E: SymbolEncoder>(
    adapter: &SymbolEncoderAdapter<E>,
    options: &GenerationOptions,
) -> Result<Vec<u8>> {
    options.validate()?;
    match adapter.generate(options, OutputMode::Vector)? {
        SymbolArtifact::Vector(markup) => {
            debug!(bytes = markup.len(), "exported SVG");
            Ok(markup.into_bytes())
        }
        SymbolArtifact::Raster(_) => Err(Error::EncodeFailed(
            "encoder returned a raster for a vector request".to_string(),
        )),
    }
}

/// Where finished downloads are handed off.
pub trait DownloadSink {
    /// Delivers `file` to the user.
    fn deliver(&mut self, file: &DownloadFile) -> Result<()>;
}

/// Writes downloads into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, file: &DownloadFile) -> PathBuf {
        self.directory.join(&file.filename)
    }
}

impl Default for DirectorySink {
    fn default() -> Self {
        Self::new("generated")
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, file: &DownloadFile) -> Result<()> {
        // Check if the directory exists, create it if it doesn't
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)?;
        }
        let path = self.path_for(file);
        fs::write(&path, &file.bytes)?;
        info!(path = %path.display(), "download saved");
        Ok(())
    }
}

/// Keeps delivered downloads in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: Vec<DownloadFile>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, file: &DownloadFile) -> Result<()> {
        self.files.push(file.clone());
        Ok(())
    }
}
