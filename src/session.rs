//! The per-user session: current logo, the single live result and the generation state.
//!
//! Nothing here is global. Independent sessions never share a logo or result.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::compositor::{self, ComposedResult};
use crate::encoder::{OutputMode, SymbolEncoder, SymbolEncoderAdapter};
use crate::error::{Error, Result};
use crate::export::{self, DownloadFile, DownloadRequest, DownloadSink, ExportFormat};
use crate::fallback;
use crate::logo::LogoAsset;
use crate::options::GenerationOptions;

/// Where a generation request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationState {
    /// No generation in flight; the trigger is enabled.
    #[default]
    Idle,
    /// The primary attempt is running.
    Generating,
    /// The primary attempt failed and the fallback is running.
    Recovering,
}

/// Notifications for the UI-facing collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A generation started; the trigger is disabled.
    GenerationStarted,
    /// A new result is live and downloads are enabled.
    ResultReady { size: u32, recovered: bool },
    /// A user-visible failure message.
    Notification(String),
    /// The generation ended, whatever the outcome; the trigger is enabled again.
    GenerationFinished,
    LogoLoaded { width: u32, height: u32 },
    DownloadDelivered { filename: String },
}

/// Receives [`SessionEvent`]s.
pub trait SessionListener {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionListener for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event);
    }
}

/// The live result together with the options that produced it.
struct Published {
    result: ComposedResult,
    options: GenerationOptions,
}

/// Attempt phases of one generation.
enum Attempt {
    Primary,
    Recovering(Error),
}

/// A QR generation session around an injected encoder.
pub struct Session<E> {
    adapter: SymbolEncoderAdapter<E>,
    logo: Option<Arc<LogoAsset>>,
    published: Option<Published>,
    state: GenerationState,
    listener: Option<Box<dyn SessionListener>>,
}

impl<E> fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("has_logo", &self.logo.is_some())
            .field("has_result", &self.published.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: SymbolEncoder> Session<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            adapter: SymbolEncoderAdapter::new(encoder),
            logo: None,
            published: None,
            state: GenerationState::Idle,
            listener: None,
        }
    }

    /// Installs the listener that receives [`SessionEvent`]s.
    pub fn with_listener<L: SessionListener + 'static>(mut self, listener: L) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Whether the generate trigger is enabled.
    pub fn can_generate(&self) -> bool {
        self.state == GenerationState::Idle
    }

    /// The last successfully generated QR code.
    pub fn current_result(&self) -> Option<&ComposedResult> {
        self.published.as_ref().map(|p| &p.result)
    }

    /// The options the current result was generated with.
    pub fn current_options(&self) -> Option<&GenerationOptions> {
        self.published.as_ref().map(|p| &p.options)
    }

    pub fn logo(&self) -> Option<&LogoAsset> {
        self.logo.as_deref()
    }

    /// Decodes an uploaded logo and makes it the session's logo.
    ///
    /// On failure the previous logo stays in place and no notification is sent; the
    /// error is returned for callers that want it. Results composed earlier are never
    /// touched: only the next generation picks the new logo up.
    pub fn load_logo(&mut self, bytes: &[u8]) -> Result<()> {
        match LogoAsset::decode(bytes) {
            Ok(logo) => {
                self.set_logo(logo);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "ignoring logo that failed to decode");
                Err(e)
            }
        }
    }

    /// Replaces the session's logo with an already decoded one.
    pub fn set_logo(&mut self, logo: LogoAsset) {
        let (width, height) = logo.dimensions();
        info!(width, height, "logo loaded");
        self.logo = Some(Arc::new(logo));
        self.emit(SessionEvent::LogoLoaded { width, height });
    }

    pub fn clear_logo(&mut self) {
        self.logo = None;
    }

    /// Generates a QR code from a snapshot of `options` and the logo loaded right now.
    ///
    /// Runs the primary attempt and, if that fails with a recoverable error, exactly one
    /// fallback attempt. On success the new result replaces the live one; on failure the
    /// live result is left as it was. The state is back to [`GenerationState::Idle`]
    /// whatever the outcome.
    ///
    /// # Errors
    ///
    /// Invalid options and [`Error::EncoderUnavailable`] are returned before any attempt;
    /// [`Error::GenerationFailed`] when the fallback fails too.
    pub fn generate(&mut self, options: &GenerationOptions) -> Result<&ComposedResult> {
        if let Err(e) = options.validate() {
            debug!(error = %e, "generation rejected");
            self.emit(SessionEvent::Notification(e.user_message()));
            return Err(e);
        }

        let options = options.clone();
        let logo = self.logo.clone();
        debug!(size = options.size, level = %options.error_correction, margin = options.margin,
            with_logo = logo.is_some(), "generating QR code");

        self.state = GenerationState::Generating;
        self.emit(SessionEvent::GenerationStarted);

        let outcome = self.run_attempts(&options, logo.as_deref());

        self.state = GenerationState::Idle;
        let outcome = match outcome {
            Ok((result, recovered)) => {
                let size = result.size();
                self.published = Some(Published { result, options });
                self.emit(SessionEvent::ResultReady { size, recovered });
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "QR code generation failed");
                self.emit(SessionEvent::Notification(e.user_message()));
                Err(e)
            }
        };
        self.emit(SessionEvent::GenerationFinished);

        outcome?;
        self.current_result().ok_or(Error::NoResultAvailable)
    }

    fn run_attempts(
        &mut self,
        options: &GenerationOptions,
        logo: Option<&LogoAsset>,
    ) -> Result<(ComposedResult, bool)> {
        self.adapter.check_available()?;

        let mut attempt = Attempt::Primary;
        loop {
            attempt = match attempt {
                Attempt::Primary => match self.primary(options, logo) {
                    Ok(result) => return Ok((result, false)),
                    Err(e) if e.escalates_to_fallback() => {
                        warn!(error = %e, "primary generation failed");
                        self.state = GenerationState::Recovering;
                        Attempt::Recovering(e)
                    }
                    Err(e) => return Err(e),
                },
                Attempt::Recovering(primary) => {
                    return match fallback::generate_fallback(&self.adapter, options, logo) {
                        Ok(result) => Ok((result, true)),
                        Err(fallback) => Err(Error::GenerationFailed {
                            primary: Box::new(primary),
                            fallback: Box::new(fallback),
                        }),
                    };
                }
            };
        }
    }

    fn primary(
        &self,
        options: &GenerationOptions,
        logo: Option<&LogoAsset>,
    ) -> Result<ComposedResult> {
        let artifact = self.adapter.generate(options, OutputMode::Raster)?;
        let symbol = compositor::decode_symbol(&artifact)?;
        compositor::compose(&symbol, options.size, logo, options.background)
    }

    /// Exports the current result and hands it to `sink`, named after the current time.
    pub fn download<S: DownloadSink + ?Sized>(
        &mut self,
        format: ExportFormat,
        sink: &mut S,
    ) -> Result<DownloadFile> {
        self.download_at(format, sink, Utc::now())
    }

    /// Like [`download`](Self::download) with an explicit timestamp for the file name.
    ///
    /// PNG reads the live result; SVG encodes the live result's options again in vector
    /// mode, so it never includes the logo.
    ///
    /// # Errors
    ///
    /// [`Error::NoResultAvailable`] before the first successful generation, encoder
    /// errors for SVG, and whatever the sink reports.
    pub fn download_at<S: DownloadSink + ?Sized>(
        &mut self,
        format: ExportFormat,
        sink: &mut S,
        timestamp: DateTime<Utc>,
    ) -> Result<DownloadFile> {
        let request = DownloadRequest::new(format, timestamp);
        let outcome = self
            .export(format)
            .map(|bytes| DownloadFile::new(&request, bytes))
            .and_then(|file| sink.deliver(&file).map(|()| file));

        match outcome {
            Ok(file) => {
                info!(filename = %file.filename, bytes = file.bytes.len(), "download delivered");
                self.emit(SessionEvent::DownloadDelivered {
                    filename: file.filename.clone(),
                });
                Ok(file)
            }
            Err(e) => {
                error!(error = %e, %format, "download failed");
                let message = match (&e, format) {
                    (Error::EncodeFailed(_) | Error::EncoderUnavailable, ExportFormat::Svg) => {
                        "Error generating SVG. Please try again.".to_string()
                    }
                    _ => e.user_message(),
                };
                self.emit(SessionEvent::Notification(message));
                Err(e)
            }
        }
    }

    fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let published = self.published.as_ref().ok_or(Error::NoResultAvailable)?;
        match format {
            ExportFormat::Png => export::export_png(Some(&published.result)),
            ExportFormat::Svg => export::export_svg(&self.adapter, &published.options),
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_event(&event);
        }
    }
}
