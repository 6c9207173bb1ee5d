//! Shared browser process and per-lookup isolated contexts.
//!
//! One Chromium process serves every lookup. Each lookup gets its own CDP
//! browser context (an incognito-style profile), so cookies and storage set
//! by one page are never visible to another.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{BrowserContextId, CloseParams};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use prospector_core::BrowserSettings;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::BrowserError;

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(20);

const CHROME_ARGS: [&str; 8] = [
    "--disable-background-networking",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-sync",
    "--mute-audio",
    "--no-default-browser-check",
    "--no-first-run",
];

struct Running {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

struct LaunchFailure {
    /// Value of the finished-launch counter when this failure was recorded.
    launch: u64,
    message: Arc<str>,
}

#[derive(Default)]
struct State {
    running: Option<Running>,
    last_failure: Option<LaunchFailure>,
}

/// Owner of the single shared browser process.
///
/// The process is launched on the first [`acquire`](Self::acquire) and
/// reused until [`close`](Self::close). When a launch fails, every caller
/// already waiting on it gets the same error; only an acquire that starts
/// after the failure tries to launch again.
pub struct SessionManager {
    settings: BrowserSettings,
    state: Mutex<State>,
    launches_finished: AtomicU64,
}

impl SessionManager {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(State::default()),
            launches_finished: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Returns the shared browser, launching it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Launch`] if Chromium cannot be started, or
    /// if a launch that was in flight when this call began has failed.
    pub async fn acquire(&self) -> Result<BrowserHandle, BrowserError> {
        let seen = self.launches_finished.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        if let Some(existing) = state.running.as_ref() {
            if !existing.handler.is_finished() {
                return Ok(BrowserHandle {
                    browser: Arc::clone(&existing.browser),
                });
            }
            tracing::warn!("browser connection closed unexpectedly; relaunching");
        }
        if let Some(failure) = state.last_failure.as_ref().filter(|f| f.launch > seen) {
            return Err(BrowserError::Launch(failure.message.to_string()));
        }

        let launched = self.launch().await;
        let finished = self.launches_finished.fetch_add(1, Ordering::AcqRel) + 1;
        match launched {
            Ok(started) => {
                let handle = BrowserHandle {
                    browser: Arc::clone(&started.browser),
                };
                state.running = Some(started);
                state.last_failure = None;
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "browser launch failed");
                state.running = None;
                state.last_failure = Some(LaunchFailure {
                    launch: finished,
                    message: launch_message(&e).into(),
                });
                Err(e)
            }
        }
    }

    /// Opens a fresh isolated context on the shared browser.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if the browser cannot be launched or the
    /// context cannot be created.
    pub async fn new_isolated_context(&self) -> Result<PageContext, BrowserError> {
        self.acquire().await?.new_isolated_context().await
    }

    pub async fn is_running(&self) -> bool {
        self.state
            .lock()
            .await
            .running
            .as_ref()
            .is_some_and(|r| !r.handler.is_finished())
    }

    /// Terminates the shared browser process. Safe to call when idle.
    pub async fn close(&self) {
        let Some(running) = self.state.lock().await.running.take() else {
            return;
        };
        if let Err(e) = running.browser.execute(CloseParams::default()).await {
            // The connection usually drops before Chromium acknowledges.
            tracing::debug!(error = %e, "browser close command did not complete");
        }
        running.handler.abort();
        tracing::info!("browser closed");
    }

    async fn launch(&self) -> Result<Running, BrowserError> {
        let config = self.browser_config()?;
        tracing::info!(
            headless = self.settings.headless,
            no_sandbox = self.settings.no_sandbox,
            "launching browser"
        );
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser handler stopped");
                    break;
                }
            }
        });

        Ok(Running {
            browser: Arc::new(browser),
            handler,
        })
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(self.settings.navigation_timeout_secs))
            .launch_timeout(LAUNCH_TIMEOUT)
            .args(CHROME_ARGS);
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if self.settings.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.settings.chrome_path {
            builder = builder.chrome_executable(path.clone());
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

fn launch_message(error: &BrowserError) -> String {
    match error {
        BrowserError::Launch(message) => message.clone(),
        other => other.to_string(),
    }
}

/// A cheap clone of the shared browser connection.
#[derive(Clone)]
pub struct BrowserHandle {
    browser: Arc<Browser>,
}

impl BrowserHandle {
    /// Creates a new browser context with a single blank page in it.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] if either the context or the page cannot be
    /// created; a half-created context is disposed.
    pub async fn new_isolated_context(&self) -> Result<PageContext, BrowserError> {
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(BrowserError::Page)?;

        match self.browser.new_page(target).await {
            Ok(page) => Ok(PageContext {
                page,
                context_id,
                browser: Arc::clone(&self.browser),
                runtime: tokio::runtime::Handle::current(),
                closed: false,
            }),
            Err(e) => {
                dispose_context(&self.browser, context_id).await;
                Err(e.into())
            }
        }
    }
}

/// One page inside its own browser context.
///
/// Call [`close`](Self::close) when done. If the context is dropped without
/// closing (an early return or a cancelled lookup), cleanup is spawned on
/// the runtime that created it.
pub struct PageContext {
    page: Page,
    context_id: BrowserContextId,
    browser: Arc<Browser>,
    runtime: tokio::runtime::Handle,
    closed: bool,
}

impl PageContext {
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Closes the page and disposes its browser context.
    pub async fn close(mut self) {
        self.closed = true;
        close_and_dispose(
            self.page.clone(),
            Arc::clone(&self.browser),
            self.context_id.clone(),
        )
        .await;
    }
}

impl Drop for PageContext {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        let browser = Arc::clone(&self.browser);
        let context_id = self.context_id.clone();
        self.runtime.spawn(async move {
            close_and_dispose(page, browser, context_id).await;
        });
    }
}

async fn close_and_dispose(page: Page, browser: Arc<Browser>, context_id: BrowserContextId) {
    if let Err(e) = page.close().await {
        tracing::debug!(error = %e, "failed to close page");
    }
    dispose_context(&browser, context_id).await;
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        tracing::debug!(error = %e, "failed to dispose browser context");
    }
}
