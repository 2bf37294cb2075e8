//! iconshot
//!
//! Render one HTML document in a headless browser and capture PNG snapshots
//! of it at an ordered list of viewport sizes, typically to produce
//! application icons (512×512 and 192×192) from a single page.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Scoped sessions**: the render engine is released on every exit path
//! - **Atomic outputs**: a destination holds either its old content or a full image
//!
//! # Example
//!
//! ```no_run
//! use iconshot::{CaptureConfig, CaptureJob, DocumentRef};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let capturer = iconshot::new_capturer(CaptureConfig::default());
//! let document = DocumentRef::parse("icon.html")?;
//! let job = CaptureJob::icon_pair("public", "icon")?;
//!
//! let report = capturer.run_job(&document, &job)?;
//! for failure in report.failures() {
//!     eprintln!("{}", failure);
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod document;
pub mod job;
pub mod output;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use capture::{CaptureOutcome, EntryReport, JobReport, RenderSession, SnapshotCapturer};
pub use document::DocumentRef;
pub use job::{CaptureEntry, CaptureJob, Resolution};

/// How long to wait after a load or resize before capturing.
///
/// Neither strategy observes paint completion directly. `Fixed` is a blind
/// sleep; `Poll` asks the engine whether the page reports the requested
/// viewport and a complete document, and captures anyway once `timeout`
/// runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Fixed(Duration),
    Poll { interval: Duration, timeout: Duration },
}

impl Settle {
    pub fn none() -> Self {
        Settle::Fixed(Duration::ZERO)
    }
}

/// What a job does after an entry fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Attempt every entry and report all failures at the end
    #[default]
    ContinueOnError,
    /// Stop at the first failed entry
    FailFast,
}

/// Configuration for a capture session
///
/// The defaults mirror the icon workflow: the window starts at 512×512, the
/// page gets two seconds after loading and one second after each resize.
///
/// # Examples
///
/// ```
/// let cfg = iconshot::CaptureConfig::default();
/// assert_eq!(cfg.window, iconshot::Resolution::ICON_LARGE);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Window size the engine starts with
    pub window: Resolution,
    /// Upper bound on document navigation in milliseconds
    pub load_timeout_ms: u64,
    /// Wait applied after the document has loaded
    pub load_settle: Settle,
    /// Wait applied after each viewport change
    pub resize_settle: Settle,
    /// Whether one failed entry aborts the rest of the job
    pub failure_policy: FailurePolicy,
    /// Run Chrome with its sandbox enabled
    pub sandbox: bool,
    /// Explicit browser executable; discovered automatically when `None`
    pub chrome_path: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window: Resolution::ICON_LARGE,
            load_timeout_ms: 30000,
            load_settle: Settle::Fixed(Duration::from_secs(2)),
            resize_settle: Settle::Fixed(Duration::from_secs(1)),
            failure_policy: FailurePolicy::ContinueOnError,
            sandbox: true,
            chrome_path: None,
        }
    }
}

impl CaptureConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

/// The render surface a [`RenderSession`] drives.
///
/// Implementations own one browser page. Calls arrive strictly one at a
/// time: a resize is never issued while a capture is running.
pub trait RenderEngine {
    /// Start the engine with the given configuration
    fn launch(config: &CaptureConfig) -> Result<Self>
    where
        Self: Sized;

    /// Navigate to `url` and wait up to `timeout` for it to finish loading
    fn load(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Resize the viewport
    fn set_viewport(&mut self, resolution: Resolution) -> Result<()>;

    /// Whether the page has laid out at `resolution`. Engines without a
    /// way to tell report `true`.
    fn is_settled(&mut self, _resolution: Resolution) -> Result<bool> {
        Ok(true)
    }

    /// The viewport size the page currently lays out at
    fn viewport(&mut self) -> Result<Resolution>;

    /// Capture the top-left `resolution` area of the viewport as PNG bytes.
    /// The image has the requested size even if the viewport does not.
    fn capture_png(&mut self, resolution: Resolution) -> Result<Vec<u8>>;

    /// Shut the engine down
    fn close(self) -> Result<()>;
}

/// Create a capturer backed by headless Chrome
#[cfg(feature = "cdp")]
pub fn new_capturer(config: CaptureConfig) -> SnapshotCapturer<cdp::CdpEngine> {
    SnapshotCapturer::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.window.width(), 512);
        assert_eq!(config.load_settle, Settle::Fixed(Duration::from_secs(2)));
        assert_eq!(config.resize_settle, Settle::Fixed(Duration::from_secs(1)));
        assert_eq!(config.failure_policy, FailurePolicy::ContinueOnError);
        assert_eq!(config.load_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_settle_none() {
        assert_eq!(Settle::none(), Settle::Fixed(Duration::ZERO));
    }
}
