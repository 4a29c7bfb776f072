//! [`UiDriver`] over a Chromium page, via chromiumoxide.
//!
//! Every driver call is one `Runtime.evaluate` round trip. Elements are interned in
//! a page-side registry (`window.__harvestHandles`) and referenced from Rust by
//! numeric id; an id whose node was detached or collected reports as stale.

use std::fmt::Display;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use harvest_engine::{DriverError, ElementHandle, Locator, ScrollMetrics, UiDriver};
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::task::JoinHandle;

use super::config::BrowserSection;

const PRELUDE: &str = r#"
const reg = window.__harvestHandles
    || (window.__harvestHandles = { next: 1, byId: new Map(), ids: new WeakMap() });
const intern = (el) => {
    let id = reg.ids.get(el);
    if (id === undefined) {
        id = reg.next++;
        reg.ids.set(el, id);
        reg.byId.set(id, new WeakRef(el));
    }
    return id;
};
const lookup = (id) => {
    const ref = reg.byId.get(id);
    const el = ref && ref.deref();
    return el && el.isConnected ? el : null;
};
"#;

/// Page-side answer: either a value or the id of a handle that went stale.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Stale { stale: u64 },
    Ok { ok: T },
}

#[derive(Debug, Deserialize)]
struct Metrics {
    scroll_top: f64,
    scroll_height: f64,
    client_height: f64,
}

/// A launched browser with the target page open.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    driver: ChromiumDriver,
}

impl ChromiumSession {
    /// Launches Chromium on `profile_dir` and opens `url`.
    pub async fn launch(settings: &BrowserSection, profile_dir: &Path, url: &str) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .viewport(None)
            .arg("--start-maximized")
            .arg("--disable-extensions")
            .arg("--disable-notifications");
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    harvest_debug!("browser event error: {}", err);
                }
            }
        });

        let page = browser
            .new_page(url)
            .await
            .with_context(|| format!("failed to open {url}"))?;
        harvest_info!("opened {} in profile {:?}", url, profile_dir);

        Ok(Self {
            browser,
            handler,
            driver: ChromiumDriver { page },
        })
    }

    pub fn driver(&self) -> &ChromiumDriver {
        &self.driver
    }

    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            harvest_warn!("failed to close browser cleanly: {}", err);
        }
        if let Err(err) = self.browser.wait().await {
            harvest_debug!("browser process wait failed: {}", err);
        }
        self.handler.abort();
    }
}

pub struct ChromiumDriver {
    page: Page,
}

impl ChromiumDriver {
    async fn call<T: DeserializeOwned>(&self, body: &str) -> Result<T, DriverError> {
        let script = format!("(() => {{ {PRELUDE}\n{body} }})()");
        let reply: Reply<T> = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(protocol)?
            .into_value()
            .map_err(protocol)?;
        match reply {
            Reply::Ok { ok } => Ok(ok),
            Reply::Stale { stale } => Err(DriverError::Stale(stale)),
        }
    }

    /// Script fragment binding `el` to the element behind `element`, or bailing out
    /// with a stale reply.
    fn bind(element: ElementHandle) -> String {
        let id = element.id();
        format!("const el = lookup({id}); if (!el) {{ return {{ stale: {id} }}; }}")
    }
}

#[async_trait]
impl UiDriver for ChromiumDriver {
    async fn find_all(
        &self,
        scope: Option<ElementHandle>,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, DriverError> {
        let scope_id = match scope {
            Some(element) => element.id().to_string(),
            None => "null".to_string(),
        };
        let (selector, fragment) = match locator {
            Locator::Css(selector) => (selector.as_str(), None),
            Locator::Text { selector, fragment } => (selector.as_str(), Some(fragment.as_str())),
        };
        let body = format!(
            r#"
            const scopeId = {scope_id};
            const root = scopeId === null ? document : lookup(scopeId);
            if (!root) {{ return {{ stale: scopeId }}; }}
            let found = Array.from(root.querySelectorAll({selector}));
            const fragment = {fragment};
            if (fragment !== null) {{
                found = found.filter((el) => (el.innerText || el.textContent || "").includes(fragment));
                found = found.filter((el) => !found.some((other) => other !== el && el.contains(other)));
            }}
            return {{ ok: found.map(intern) }};
            "#,
            selector = js_literal(&selector),
            fragment = js_literal(&fragment),
        );
        let ids: Vec<u64> = self.call(&body).await?;
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let body = format!(
            "{} return {{ ok: el.getAttribute({}) }};",
            Self::bind(element),
            js_literal(&name)
        );
        self.call(&body).await
    }

    async fn text(&self, element: ElementHandle) -> Result<String, DriverError> {
        let body = format!(
            "{} return {{ ok: el.innerText || \"\" }};",
            Self::bind(element)
        );
        self.call(&body).await
    }

    async fn scroll_metrics(&self, element: ElementHandle) -> Result<ScrollMetrics, DriverError> {
        let body = format!(
            "{} return {{ ok: {{ scroll_top: el.scrollTop, scroll_height: el.scrollHeight, client_height: el.clientHeight }} }};",
            Self::bind(element)
        );
        let metrics: Metrics = self.call(&body).await?;
        Ok(ScrollMetrics {
            scroll_top: metrics.scroll_top,
            scroll_height: metrics.scroll_height,
            client_height: metrics.client_height,
        })
    }

    async fn set_scroll_top(&self, element: ElementHandle, top: f64) -> Result<(), DriverError> {
        let body = format!(
            "{} el.scrollTop = {top}; return {{ ok: null }};",
            Self::bind(element)
        );
        self.call::<()>(&body).await
    }

    async fn scroll_into_view(&self, element: ElementHandle) -> Result<(), DriverError> {
        let body = format!(
            "{} el.scrollIntoView({{ block: \"center\" }}); return {{ ok: null }};",
            Self::bind(element)
        );
        self.call::<()>(&body).await
    }

    async fn click(&self, element: ElementHandle) -> Result<(), DriverError> {
        let body = format!("{} el.click(); return {{ ok: null }};", Self::bind(element));
        self.call::<()>(&body).await
    }
}

/// JSON is valid JavaScript, so serde_json doubles as a literal escaper.
fn js_literal<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn protocol(err: impl Display) -> DriverError {
    DriverError::Protocol(err.to_string())
}
