//! Chrome DevTools Protocol adapter implementation

use crate::{CaptureConfig, Error, RenderEngine, Resolution, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// CDP-based render engine (uses the `headless_chrome` crate)
///
/// This adapter launches a headless Chrome instance and drives a single tab.
/// The browser process is terminated when the engine is closed or dropped.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
}

impl RenderEngine for CdpEngine {
    fn launch(config: &CaptureConfig) -> Result<Self> {
        let window = config.window;
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .path(config.chrome_path.clone())
            .window_size(Some((window.width(), window.height())))
            .build()
            .map_err(|e| Error::RenderInitError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::RenderInitError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::RenderInitError(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser, tab })
    }

    fn load(&mut self, url: &str, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);

        self.tab
            .navigate_to(url)
            .map_err(|e| Error::RenderInitError(format!("Navigation to {} failed: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::RenderInitError(format!("Wait for navigation failed: {}", e)))?;

        Ok(())
    }

    fn set_viewport(&mut self, resolution: Resolution) -> Result<()> {
        // Headless windows have no browser chrome, so the window bounds are
        // the viewport.
        self.tab
            .set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(resolution.width() as f64),
                height: Some(resolution.height() as f64),
            })
            .map_err(|e| {
                Error::ResizeError(format!("Failed to resize window to {}: {}", resolution, e))
            })?;
        Ok(())
    }

    fn is_settled(&mut self, resolution: Resolution) -> Result<bool> {
        let expr = format!(
            "document.readyState === 'complete' && window.innerWidth === {} && window.innerHeight === {}",
            resolution.width(),
            resolution.height()
        );
        let eval = self.tab.evaluate(&expr, false)?;
        let settled = eval.value.and_then(|v| v.as_bool()).unwrap_or(false);
        debug!("Settle probe at {}: {}", resolution, settled);
        Ok(settled)
    }

    fn viewport(&mut self) -> Result<Resolution> {
        let eval = self
            .tab
            .evaluate("window.innerWidth + 'x' + window.innerHeight", false)?;
        let size = eval
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::ResizeError("viewport size is not readable".into()))?;
        size.parse()
            .map_err(|_| Error::ResizeError(format!("unexpected viewport size '{}'", size)))
    }

    fn capture_png(&mut self, resolution: Resolution) -> Result<Vec<u8>> {
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: resolution.width() as f64,
            height: resolution.height() as f64,
            scale: 1.0,
        };

        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::CaptureError(format!("Screenshot failed: {}", e)))
    }

    fn close(self) -> Result<()> {
        // Drop the tab before the browser so the child process exits promptly.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
