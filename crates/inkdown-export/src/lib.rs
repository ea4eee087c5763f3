//! inkdown-export: staged, progress-reporting document export.
//!
//! The coordinator orchestrates external collaborators - a destination
//! picker and a rasterization backend - around the render pipeline. It is
//! synchronous, never debounced, and guarantees that no partial output
//! file survives a failure: the destination is only written after
//! rasterization succeeded.

pub mod host;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use inkdown_renderer::{RenderPipeline, ThemeId};

/// Safety-net budget for a stalled backend; part of the backend contract,
/// since the coordinator has no way to preempt a synchronous call.
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(60);

/// The pipeline stage an export failure is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    AcquireDestination,
    Render,
    Materialize,
    Rasterize,
    Write,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AcquireDestination => "acquire-destination",
            Self::Render => "render",
            Self::Materialize => "materialize",
            Self::Rasterize => "rasterize",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// A failed export, tagged with the stage that produced it.
///
/// User cancellation is not an error - see [`ExportOutcome::Cancelled`].
#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum ExportError {
    #[error("rasterization failed: {message}")]
    #[diagnostic(code(inkdown::export::rasterize))]
    Rasterize { message: String },

    #[error("failed to write {}: {source}", path.display())]
    #[diagnostic(code(inkdown::export::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn stage(&self) -> ExportStage {
        match self {
            Self::Rasterize { .. } => ExportStage::Rasterize,
            Self::Write { .. } => ExportStage::Write,
        }
    }
}

/// How an export call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The document was written to this path.
    Completed(PathBuf),
    /// The user backed out at the destination picker. Normal, not an error.
    Cancelled,
}

/// Receives `(percent, message)` progress tuples during an export.
///
/// Percentages are a UX contract, not a measurement; they only move
/// forward. The unit sink ignores them.
pub trait ProgressSink {
    fn progress(&mut self, percent: u8, message: &str);
}

impl ProgressSink for () {
    fn progress(&mut self, _percent: u8, _message: &str) {}
}

/// Asks the user where the exported document should go.
///
/// Implemented by the shell over its native save dialog. `None` means the
/// user cancelled.
pub trait DestinationPicker {
    fn pick(&mut self, suggested_file_name: &str) -> Option<PathBuf>;
}

/// Page geometry for the rasterizer.
#[derive(Debug, Clone)]
pub struct PageSetup {
    pub size: &'static str,
    pub margin_inches: f64,
    pub print_background: bool,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            size: "A4",
            margin_inches: 0.5,
            print_background: true,
        }
    }
}

/// Everything the backend needs to produce the binary document.
pub struct RasterizeRequest<'a> {
    pub host_html: &'a str,
    pub page: PageSetup,
    /// The backend must resolve - successfully or not - within this budget
    /// rather than hang the caller.
    pub timeout: Duration,
}

#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external print/rasterize backend, treated as a black box.
///
/// Owns its off-screen rendering surface; its lifecycle is scoped to the
/// call and must be torn down on both success and failure paths. May
/// report intermediate progress in the 40-80 band.
pub trait RenderBackend {
    fn rasterize(
        &mut self,
        request: &RasterizeRequest<'_>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>, BackendError>;
}

/// Orchestrates one export: pick, render, materialize, rasterize, write.
pub struct ExportCoordinator {
    timeout: Duration,
}

impl Default for ExportCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_EXPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Export `text` as a themed document.
    ///
    /// Always renders the complete current text - the debounce does not
    /// apply here. Progress starts only once the user has confirmed a
    /// destination.
    pub fn export(
        &self,
        pipeline: &RenderPipeline,
        text: &str,
        theme: ThemeId,
        source_file_name: Option<&str>,
        picker: &mut dyn DestinationPicker,
        backend: &mut dyn RenderBackend,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExportOutcome, ExportError> {
        let suggested = default_file_name(source_file_name);
        let Some(destination) = picker.pick(&suggested) else {
            tracing::debug!(target: "inkdown::export", "destination picker cancelled");
            return Ok(ExportOutcome::Cancelled);
        };

        tracing::info!(
            target: "inkdown::export",
            destination = %destination.display(),
            theme = theme.as_str(),
            "export started"
        );

        progress.progress(10, "Preparing export...");

        progress.progress(20, "Rendering markdown...");
        let markup = pipeline.render(text);

        progress.progress(30, "Generating document content...");
        let host_html = host::host_document(&markup, theme);

        progress.progress(40, "Loading content...");
        let request = RasterizeRequest {
            host_html: &host_html,
            page: PageSetup::default(),
            timeout: self.timeout,
        };
        let bytes = backend
            .rasterize(&request, progress)
            .map_err(|err| ExportError::Rasterize {
                message: err.message,
            })?;

        progress.progress(80, "Generating document file...");

        progress.progress(90, "Saving file...");
        if let Err(source) = fs::write(&destination, &bytes) {
            // Don't leave a truncated document behind.
            let _ = fs::remove_file(&destination);
            return Err(ExportError::Write {
                path: destination,
                source,
            });
        }

        progress.progress(100, "Export completed");
        tracing::info!(
            target: "inkdown::export",
            destination = %destination.display(),
            bytes = bytes.len(),
            "export completed"
        );
        Ok(ExportOutcome::Completed(destination))
    }
}

/// Suggested destination name, derived from the source file name.
fn default_file_name(source_file_name: Option<&str>) -> String {
    match source_file_name {
        Some(name) => {
            let stem = match name.rsplit_once('.') {
                Some((stem, _ext)) if !stem.is_empty() => stem,
                _ => name,
            };
            format!("{stem}.pdf")
        }
        None => "document.pdf".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPicker(Option<PathBuf>);

    impl DestinationPicker for FixedPicker {
        fn pick(&mut self, _suggested: &str) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    struct OkBackend;

    impl RenderBackend for OkBackend {
        fn rasterize(
            &mut self,
            request: &RasterizeRequest<'_>,
            progress: &mut dyn ProgressSink,
        ) -> Result<Vec<u8>, BackendError> {
            progress.progress(60, "Waiting for fonts...");
            progress.progress(70, "Preparing renderer...");
            Ok(request.host_html.as_bytes().to_vec())
        }
    }

    struct FailingBackend;

    impl RenderBackend for FailingBackend {
        fn rasterize(
            &mut self,
            _request: &RasterizeRequest<'_>,
            _progress: &mut dyn ProgressSink,
        ) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::new("surface crashed"))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Vec<(u8, String)>);

    impl ProgressSink for RecordingSink {
        fn progress(&mut self, percent: u8, message: &str) {
            self.0.push((percent, message.to_string()));
        }
    }

    fn run_export(
        picker: &mut dyn DestinationPicker,
        backend: &mut dyn RenderBackend,
        sink: &mut RecordingSink,
    ) -> Result<ExportOutcome, ExportError> {
        let pipeline = RenderPipeline::new();
        ExportCoordinator::new().export(
            &pipeline,
            "# Exported\n\nbody text",
            ThemeId::Default,
            Some("notes.md"),
            picker,
            backend,
            sink,
        )
    }

    #[test]
    fn cancelled_picker_is_a_normal_outcome() {
        let mut sink = RecordingSink::default();
        let outcome = run_export(&mut FixedPicker(None), &mut OkBackend, &mut sink)
            .expect("cancellation is not an error");
        assert_eq!(outcome, ExportOutcome::Cancelled);
        // Progress only starts after a destination is confirmed.
        assert!(sink.0.is_empty());
    }

    #[test]
    fn successful_export_writes_bytes_and_reports_stages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let destination = dir.path().join("notes.pdf");
        let mut sink = RecordingSink::default();

        let outcome = run_export(
            &mut FixedPicker(Some(destination.clone())),
            &mut OkBackend,
            &mut sink,
        )
        .expect("export succeeds");

        assert_eq!(outcome, ExportOutcome::Completed(destination.clone()));
        let written = fs::read_to_string(&destination).expect("file written");
        assert!(written.contains("<h1>Exported</h1>"));

        let percents: Vec<u8> = sink.0.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![10, 20, 30, 40, 60, 70, 80, 90, 100]);
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn backend_failure_leaves_no_output_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let destination = dir.path().join("notes.pdf");
        let mut sink = RecordingSink::default();

        let err = run_export(
            &mut FixedPicker(Some(destination.clone())),
            &mut FailingBackend,
            &mut sink,
        )
        .expect_err("backend failed");

        assert_eq!(err.stage(), ExportStage::Rasterize);
        assert!(!destination.exists());
    }

    #[test]
    fn write_failure_is_stage_tagged() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A destination inside a directory that does not exist.
        let destination = dir.path().join("missing").join("notes.pdf");
        let mut sink = RecordingSink::default();

        let err = run_export(
            &mut FixedPicker(Some(destination)),
            &mut OkBackend,
            &mut sink,
        )
        .expect_err("write failed");

        assert_eq!(err.stage(), ExportStage::Write);
    }

    #[test]
    fn suggested_name_derives_from_source() {
        assert_eq!(default_file_name(Some("notes.md")), "notes.pdf");
        assert_eq!(default_file_name(Some("archive.tar.gz")), "archive.tar.pdf");
        assert_eq!(default_file_name(Some("noext")), "noext.pdf");
        assert_eq!(default_file_name(None), "document.pdf");
    }
}
