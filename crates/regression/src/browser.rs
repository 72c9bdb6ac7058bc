//! ChromiumDriver - real browser control over the DevTools protocol.
//!
//! Only compiled with the `browser` feature. Uses chromiumoxide for CDP,
//! one page per session, and an element registry that is cleared on every
//! navigation so stale handles fail loudly.

use crate::config::{BrowserConfig, BrowserKind, Timeouts};
use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{RegressionError, RegressionResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, EventJavascriptDialogClosed,
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::CallFunctionOnReturns;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Reports the outerHTML of whatever covers the element's centre, or null
const HIT_TEST_JS: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2); \
    if (!hit || hit === this || this.contains(hit)) { return null; } \
    return hit.outerHTML.slice(0, 160); \
}";

const SCROLL_CENTER_JS: &str =
    "function() { this.scrollIntoView({ block: 'center', inline: 'center' }); }";

const SCRIPT_CLICK_JS: &str = "function() { this.click(); }";

const IS_DISPLAYED_JS: &str = "function() { \
    const s = window.getComputedStyle(this); \
    const r = this.getBoundingClientRect(); \
    return s.display !== 'none' && s.visibility !== 'hidden' && r.width > 0 && r.height > 0; \
}";

/// Clears a controlled input through the native value setter
const CLEAR_JS: &str = "function() { \
    const proto = Object.getPrototypeOf(this); \
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
    setter.call(this, ''); \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
}";

fn cdp_error(e: impl std::fmt::Display) -> RegressionError {
    RegressionError::script(e.to_string())
}

fn stale(element: &ElementRef) -> RegressionError {
    RegressionError::script(format!("stale element reference: {element}"))
}

fn js_value(returns: CallFunctionOnReturns) -> RegressionResult<Option<serde_json::Value>> {
    if let Some(details) = returns.exception_details {
        return Err(RegressionError::script(details.text));
    }
    Ok(returns.result.value)
}

/// Driver backed by a Chromium page
pub struct ChromiumDriver {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    elements: Mutex<HashMap<u64, Element>>,
    next_id: AtomicU64,
    dialog_open: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
    page_load: Duration,
    click_timeout: Duration,
}

impl std::fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("page_load", &self.page_load)
            .field("dialog_open", &self.dialog_open.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl ChromiumDriver {
    /// Launch a local browser, or attach to `remote_url` for [`BrowserKind::Remote`]
    ///
    /// # Errors
    ///
    /// Returns [`RegressionError::BrowserLaunch`] if the browser cannot be
    /// started or reached.
    pub async fn launch(config: &BrowserConfig, timeouts: &Timeouts) -> RegressionResult<Self> {
        let launch_error = |e: &dyn std::fmt::Display| RegressionError::BrowserLaunch {
            message: e.to_string(),
        };

        let (browser, mut handler) = match config.kind {
            BrowserKind::Chrome => {
                let mut builder = CdpConfig::builder()
                    .window_size(config.window_width, config.window_height)
                    .request_timeout(timeouts.page_load());
                if !config.headless {
                    builder = builder.with_head();
                }
                if config.maximize {
                    builder = builder.arg("--start-maximized");
                }
                if !config.sandbox {
                    builder = builder.no_sandbox();
                }
                if let Some(ref path) = config.chromium_path {
                    builder = builder.chrome_executable(path);
                }
                let cdp_config = builder.build().map_err(|e| launch_error(&e))?;
                CdpBrowser::launch(cdp_config).await.map_err(|e| launch_error(&e))?
            }
            BrowserKind::Remote => {
                let url = config.remote_url.as_deref().ok_or_else(|| RegressionError::Config {
                    message: "remote browser requires remote_url".to_string(),
                })?;
                CdpBrowser::connect(url).await.map_err(|e| launch_error(&e))?
            }
        };

        let mut tasks = vec![tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        })];

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| launch_error(&e))?;

        let dialog_open = Arc::new(AtomicBool::new(false));
        let mut opened = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| launch_error(&e))?;
        let flag = Arc::clone(&dialog_open);
        tasks.push(tokio::spawn(async move {
            while let Some(event) = opened.next().await {
                debug!(message = %event.message, "dialog opened");
                flag.store(true, Ordering::SeqCst);
            }
        }));
        let mut closed = page
            .event_listener::<EventJavascriptDialogClosed>()
            .await
            .map_err(|e| launch_error(&e))?;
        let flag = Arc::clone(&dialog_open);
        tasks.push(tokio::spawn(async move {
            while closed.next().await.is_some() {
                flag.store(false, Ordering::SeqCst);
            }
        }));

        info!(kind = ?config.kind, headless = config.headless, "browser ready");
        Ok(Self {
            browser: Mutex::new(browser),
            page,
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            dialog_open,
            tasks,
            page_load: timeouts.page_load(),
            click_timeout: timeouts.short_wait(),
        })
    }

    async fn register(&self, found: Vec<Element>, locator: &Locator) -> Vec<ElementRef> {
        let mut elements = self.elements.lock().await;
        found
            .into_iter()
            .map(|element| {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = elements.insert(id, element);
                ElementRef::new(id, *locator)
            })
            .collect()
    }

    async fn call(&self, element: &ElementRef, function: &str) -> RegressionResult<Option<serde_json::Value>> {
        let elements = self.elements.lock().await;
        let target = elements.get(&element.id()).ok_or_else(|| stale(element))?;
        let returns = target
            .call_js_fn(function, false)
            .await
            .map_err(cdp_error)?;
        js_value(returns)
    }

    /// Run a click that may open a blocking dialog
    ///
    /// A confirm dialog holds the protocol response until it is handled, so a
    /// click that times out while a dialog is open has done its job.
    async fn bounded_click<F>(&self, element: &ElementRef, click: F) -> RegressionResult<()>
    where
        F: std::future::Future<Output = RegressionResult<()>> + Send,
    {
        match tokio::time::timeout(self.click_timeout, click).await {
            Ok(result) => result,
            Err(_) if self.dialog_open.load(Ordering::SeqCst) => Ok(()),
            Err(_) => Err(RegressionError::Timeout {
                what: format!("click on {element}"),
                ms: self.click_timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl Driver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> RegressionResult<()> {
        self.elements.lock().await.clear();
        self.dialog_open.store(false, Ordering::SeqCst);
        let nav_error = |message: String| RegressionError::Navigation {
            url: url.to_string(),
            message,
        };
        match tokio::time::timeout(self.page_load, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(nav_error(e.to_string())),
            Err(_) => Err(nav_error(format!(
                "page load exceeded {}ms",
                self.page_load.as_millis()
            ))),
        }
    }

    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> RegressionResult<Vec<ElementRef>> {
        let selector = locator.to_css();
        let found = match scope {
            None => self.page.find_elements(selector).await,
            Some(parent) => {
                let elements = self.elements.lock().await;
                let parent = elements.get(&parent.id()).ok_or_else(|| stale(parent))?;
                parent.find_elements(selector).await
            }
        };
        // querySelectorAll with no match is an empty list, not an error
        let found = found.map_err(cdp_error)?;
        Ok(self.register(found, locator).await)
    }

    async fn text(&self, element: &ElementRef) -> RegressionResult<String> {
        let elements = self.elements.lock().await;
        let target = elements.get(&element.id()).ok_or_else(|| stale(element))?;
        Ok(target.inner_text().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> RegressionResult<Option<String>> {
        let elements = self.elements.lock().await;
        let target = elements.get(&element.id()).ok_or_else(|| stale(element))?;
        target.attribute(name).await.map_err(cdp_error)
    }

    async fn is_displayed(&self, element: &ElementRef) -> RegressionResult<bool> {
        Ok(self
            .call(element, IS_DISPLAYED_JS)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn clear(&self, element: &ElementRef) -> RegressionResult<()> {
        let _ = self.call(element, CLEAR_JS).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> RegressionResult<()> {
        let elements = self.elements.lock().await;
        let target = elements.get(&element.id()).ok_or_else(|| stale(element))?;
        let _ = target.focus().await.map_err(cdp_error)?;
        let _ = target.type_str(text).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn scroll_into_view_center(&self, element: &ElementRef) -> RegressionResult<()> {
        let _ = self.call(element, SCROLL_CENTER_JS).await?;
        Ok(())
    }

    async fn native_click(&self, element: &ElementRef) -> RegressionResult<()> {
        if let Some(cover) = self.call(element, HIT_TEST_JS).await? {
            if let Some(cover) = cover.as_str() {
                return Err(RegressionError::ClickIntercepted {
                    locator: element.locator().to_string(),
                    message: format!("other element would receive the click: {cover}"),
                });
            }
        }
        let point = {
            let elements = self.elements.lock().await;
            let target = elements.get(&element.id()).ok_or_else(|| stale(element))?;
            target.clickable_point().await.map_err(cdp_error)?
        };
        let page = self.page.clone();
        self.bounded_click(element, async move {
            let _ = page.click(point).await.map_err(cdp_error)?;
            Ok(())
        })
        .await
    }

    async fn script_click(&self, element: &ElementRef) -> RegressionResult<()> {
        self.bounded_click(element, async {
            let _ = self.call(element, SCRIPT_CLICK_JS).await?;
            Ok(())
        })
        .await
    }

    async fn accept_dialog(&self) -> RegressionResult<()> {
        if !self.dialog_open.load(Ordering::SeqCst) {
            return Err(RegressionError::DialogAbsent);
        }
        let _ = self
            .page
            .execute(HandleJavaScriptDialogParams::new(true))
            .await
            .map_err(|_| RegressionError::DialogAbsent)?;
        self.dialog_open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn screenshot_png(&self) -> RegressionResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self
            .page
            .execute(params)
            .await
            .map_err(|e| RegressionError::Screenshot {
                message: e.to_string(),
            })?;

        use base64::Engine;
        base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(|e| RegressionError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn close(&self) -> RegressionResult<()> {
        self.elements.lock().await.clear();
        let mut browser = self.browser.lock().await;
        let result = browser.close().await.map(|_| ()).map_err(|e| RegressionError::BrowserLaunch {
            message: e.to_string(),
        });
        for task in &self.tasks {
            task.abort();
        }
        info!("browser closed");
        result
    }
}
