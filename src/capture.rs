//! Multi-resolution snapshot capture over a scoped render session

use crate::output::{commit_png, png_dimensions};
use crate::{
    CaptureConfig, CaptureJob, DocumentRef, Error, FailurePolicy, RenderEngine, Resolution, Result,
    Settle,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Opens render sessions for one engine type with a fixed configuration.
pub struct SnapshotCapturer<E: RenderEngine> {
    config: CaptureConfig,
    _engine: PhantomData<fn() -> E>,
}

impl<E: RenderEngine> SnapshotCapturer<E> {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            _engine: PhantomData,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Launch an engine and load `document` into it.
    ///
    /// Any failure is reported as [`Error::RenderInitError`]; an engine that
    /// did start is shut down before returning.
    pub fn open(&self, document: &DocumentRef) -> Result<RenderSession<E>> {
        // Check the document before paying for a browser launch.
        document.locate()?;
        let engine = E::launch(&self.config).map_err(Error::into_render_init)?;
        self.open_with_engine(engine, document)
    }

    /// Load `document` into an engine the caller already started.
    pub fn open_with_engine(&self, engine: E, document: &DocumentRef) -> Result<RenderSession<E>> {
        let mut session = RenderSession {
            engine: Some(engine),
            config: self.config.clone(),
            document: document.to_string(),
        };

        let url = document.locate()?;
        let timeout = self.config.load_timeout();
        debug!("Loading {} (timeout {:?})", url, timeout);
        session
            .engine()?
            .load(url.as_str(), timeout)
            .map_err(Error::into_render_init)?;
        session.settle(self.config.window, self.config.load_settle);

        info!("Opened render session for {}", session.document);
        Ok(session)
    }

    /// Open a session, run every entry of `job`, and close the session.
    ///
    /// Only a failure to open is returned as `Err`; per-entry failures are
    /// in the report.
    pub fn run_job(&self, document: &DocumentRef, job: &CaptureJob) -> Result<JobReport> {
        let mut session = self.open(document)?;
        let report = session.run(job);
        session.close();
        Ok(report)
    }
}

/// A live engine with one document loaded.
///
/// The engine is released exactly once: by [`RenderSession::close`] or, if
/// that is never called, when the session is dropped.
pub struct RenderSession<E: RenderEngine> {
    engine: Option<E>,
    config: CaptureConfig,
    document: String,
}

impl<E: RenderEngine> RenderSession<E> {
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Resize to `resolution`, let the page settle, and write a PNG of the
    /// viewport to `destination`.
    pub fn capture(
        &mut self,
        resolution: Resolution,
        destination: &Path,
    ) -> Result<CaptureOutcome> {
        debug!("Resizing viewport to {}", resolution);
        self.engine()?
            .set_viewport(resolution)
            .map_err(Error::into_resize)?;
        self.settle(resolution, self.config.resize_settle);

        // Screenshots are clipped to the requested size, so only the page
        // itself can tell whether the resize took effect.
        let actual = self.engine()?.viewport().map_err(Error::into_resize)?;
        if actual != resolution {
            return Err(Error::ResizeError(format!(
                "requested {} but the viewport is {}",
                resolution, actual
            )));
        }

        let bytes = self
            .engine()?
            .capture_png(resolution)
            .map_err(Error::into_capture)?;

        let (width, height) = png_dimensions(&bytes)?;
        if (width, height) != (resolution.width(), resolution.height()) {
            return Err(Error::ResizeError(format!(
                "requested {} but the captured image is {}x{}",
                resolution, width, height
            )));
        }

        commit_png(destination, &bytes)?;
        info!("Saved {} snapshot to {}", resolution, destination.display());

        Ok(CaptureOutcome {
            resolution,
            destination: destination.to_path_buf(),
            bytes: bytes.len(),
        })
    }

    /// Capture every entry of `job` in order, honouring the configured
    /// failure policy.
    pub fn run(&mut self, job: &CaptureJob) -> JobReport {
        let mut entries = Vec::with_capacity(job.len());

        for (index, entry) in job.iter().enumerate() {
            let result = self.capture(entry.resolution, &entry.destination);
            if let Err(e) = &result {
                warn!("Entry {} ({}) failed: {}", index + 1, entry.resolution, e);
            }
            let failed = result.is_err();
            entries.push(EntryReport {
                index,
                resolution: entry.resolution,
                destination: entry.destination.clone(),
                result,
            });
            if failed && self.config.failure_policy == FailurePolicy::FailFast {
                break;
            }
        }

        JobReport {
            total: job.len(),
            entries,
        }
    }

    /// Release the engine. Shutdown errors are logged, not returned.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(engine) = self.engine.take() {
            match engine.close() {
                Ok(()) => info!("Closed render session for {}", self.document),
                Err(e) => warn!("Failed to close render session for {}: {}", self.document, e),
            }
        }
    }

    fn engine(&mut self) -> Result<&mut E> {
        self.engine
            .as_mut()
            .ok_or_else(|| Error::Other("render session already released".into()))
    }

    // Heuristic: no paint-complete signal is observed, see `Settle`.
    fn settle(&mut self, resolution: Resolution, settle: Settle) {
        match settle {
            Settle::Fixed(delay) => {
                if !delay.is_zero() {
                    debug!("Settling for {:?}", delay);
                    std::thread::sleep(delay);
                }
            }
            Settle::Poll { interval, timeout } => {
                let deadline = Instant::now() + timeout;
                loop {
                    let probe = match self.engine() {
                        Ok(engine) => engine.is_settled(resolution),
                        Err(e) => Err(e),
                    };
                    match probe {
                        Ok(true) => return,
                        Ok(false) => {}
                        Err(e) => {
                            warn!("Settle probe failed at {}: {}", resolution, e);
                            return;
                        }
                    }
                    if Instant::now() >= deadline {
                        warn!(
                            "Page did not settle at {} within {:?}; capturing anyway",
                            resolution, timeout
                        );
                        return;
                    }
                    std::thread::sleep(interval);
                }
            }
        }
    }
}

impl<E: RenderEngine> Drop for RenderSession<E> {
    fn drop(&mut self) {
        self.release();
    }
}

/// A snapshot that was written successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureOutcome {
    pub resolution: Resolution,
    pub destination: PathBuf,
    /// Size of the written PNG in bytes
    pub bytes: usize,
}

/// Result of one attempted job entry
#[derive(Debug)]
pub struct EntryReport {
    /// Position of the entry in the job, zero based
    pub index: usize,
    pub resolution: Resolution,
    pub destination: PathBuf,
    pub result: Result<CaptureOutcome>,
}

impl EntryReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for EntryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(_) => write!(f, "{} -> {}: ok", self.resolution, self.destination.display()),
            Err(e) => write!(f, "{} -> {}: {}", self.resolution, self.destination.display(), e),
        }
    }
}

/// Per-entry results of a job, in job order
#[derive(Debug)]
pub struct JobReport {
    /// Number of entries in the job, attempted or not
    pub total: usize,
    /// Attempted entries; shorter than `total` after a fail-fast abort
    pub entries: Vec<EntryReport>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.entries.len() == self.total && self.entries.iter().all(EntryReport::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| !e.is_ok())
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    pub fn skipped(&self) -> usize {
        self.total - self.entries.len()
    }
}
