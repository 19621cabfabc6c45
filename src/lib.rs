//! # qrsmith
//!
//! A Rust library for turning text or URLs into downloadable QR code images.
//!
//! `qrsmith` composes the encoded symbol onto a square canvas of a chosen size, optionally
//! places a logo in the center on a backing plate, and exports the result as PNG or SVG.
//! Symbol encoding itself is an injected capability: the built-in [`QrcodeEncoder`] uses
//! the `qrcode` crate, and any other [`SymbolEncoder`] can be plugged in instead.
//!
//! ## Features
//!
//! - Four error correction levels: L, M, Q, H.
//! - Custom foreground and background colors and quiet-zone margin.
//! - Center logo overlay sized to 20% of the image edge, on an opaque plate.
//! - One automatic fallback attempt when the primary encode or composition fails.
//! - Lossless PNG export of the composed image; SVG export straight from the encoder.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrsmith = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate a QR code with a logo and save it as PNG:
//!
//! ```no_run
//! use qrsmith::{DirectorySink, EcLevel, ExportFormat, GenerationOptions, QrcodeEncoder, Session};
//!
//! fn main() -> qrsmith::Result<()> {
//!     let mut session = Session::new(QrcodeEncoder::new());
//!     session.load_logo(&std::fs::read("logo.png")?)?;
//!
//!     let options = GenerationOptions::new("https://example.com")
//!         .with_size(512)
//!         .with_error_correction(EcLevel::Q)
//!         .with_colors("#ffa500".parse()?, "#ffffff".parse()?);
//!     session.generate(&options)?;
//!
//!     let file = session.download(ExportFormat::Png, &mut DirectorySink::new("output"))?;
//!     println!("saved {}", file.filename);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`options`]: generation options, colors and error correction levels.
//! - [`encoder`]: the symbol encoder seam and its `qrcode`-backed implementation.
//! - [`helper`]: module matrix rendering and PNG / data URI utilities.
//! - [`logo`]: logo decoding.
//! - [`compositor`]: symbol and logo composition.
//! - [`fallback`]: the single fallback generation tier.
//! - [`export`]: PNG / SVG export, file naming and delivery.
//! - [`session`]: the session tying it all together.

#![forbid(unsafe_code)]

pub mod compositor;
pub mod encoder;
pub mod export;
pub mod fallback;
pub mod helper;
pub mod logo;
pub mod options;
pub mod session;

mod error;

pub use compositor::ComposedResult;
pub use encoder::{
    OutputMode, QrcodeEncoder, SymbolArtifact, SymbolEncoder, SymbolEncoderAdapter,
};
pub use error::{Error, Result};
pub use export::{
    DirectorySink, DownloadFile, DownloadRequest, DownloadSink, ExportFormat, MemorySink,
};
pub use logo::LogoAsset;
pub use options::{Color, EcLevel, GenerationOptions};
pub use session::{GenerationState, Session, SessionEvent, SessionListener};
