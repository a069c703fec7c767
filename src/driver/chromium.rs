//! Chromium-backed implementation of [`FormDriver`].
//!
//! One launched browser, one page, for the whole sweep. Form fills and
//! button clicks go through injected JS (with a dispatched `input` event so
//! the page's own listeners fire); bar hovers use real pointer events via
//! element handles, because the chart library only shows its tooltip on a
//! genuine mouse move.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{BarHandle, ChartResponse, DriverError, FormDriver};
use crate::config::{Selectors, SettleDelays, SweepConfig};
use crate::grid::Coordinate;

pub struct ChromiumDriver {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    selectors: Selectors,
    delays: SettleDelays,
    /// Bar elements from the most recent classify; invalidated on submit.
    bars: Vec<Element>,
}

impl ChromiumDriver {
    /// Launch the browser, open the target page, and wait out the initial
    /// page-load settle.
    pub async fn launch(config: &SweepConfig) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder();
        if !config.browser.headless {
            builder = builder.with_head();
        }
        if let Some(binary) = &config.paths.browser_binary {
            builder = builder.chrome_executable(binary);
        }
        let browser_config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(url = %config.paths.page_url, "opening target page");
        let page = browser.new_page(config.paths.page_url.as_str()).await?;
        tokio::time::sleep(Duration::from_millis(config.delays.page_load_ms)).await;

        Ok(Self {
            browser,
            handler_task,
            page,
            selectors: config.selectors.clone(),
            delays: config.delays.clone(),
            bars: Vec::new(),
        })
    }

    async fn eval(&self, js: String) -> Result<serde_json::Value, DriverError> {
        self.page
            .evaluate(js)
            .await?
            .into_value::<serde_json::Value>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    /// Set an input's value and dispatch an `input` event so the page's
    /// listeners observe the change.
    async fn fill_input(&self, selector: &str, value: &str) -> Result<(), DriverError> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (!el) return {{ success: false }};
                el.value = '{}';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return {{ success: true }};
            }})()"#,
            escape(selector),
            escape(value),
        );
        let result = self.eval(js).await?;
        if !succeeded(&result) {
            return Err(DriverError::MissingElement(selector.to_string()));
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (el) {{ el.click(); return {{ success: true }}; }}
                return {{ success: false }};
            }})()"#,
            escape(selector),
        );
        let result = self.eval(js).await?;
        if !succeeded(&result) {
            return Err(DriverError::MissingElement(selector.to_string()));
        }
        Ok(())
    }

    async fn settle(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait::async_trait]
impl FormDriver for ChromiumDriver {
    async fn submit(&mut self, coord: Coordinate) -> Result<(), DriverError> {
        // Any bar handles from the previous cell are now meaningless.
        self.bars.clear();

        debug!(%coord, "submitting coordinate");
        let lat_selector = self.selectors.input_lat.clone();
        let lon_selector = self.selectors.input_lon.clone();
        self.fill_input(&lat_selector, &coord.lat.to_string()).await?;
        self.fill_input(&lon_selector, &coord.lon.to_string()).await?;
        self.settle(self.delays.input_settle_ms).await;

        let submit_selector = self.selectors.submit.clone();
        self.click(&submit_selector).await?;
        self.settle(self.delays.submit_settle_ms).await;
        Ok(())
    }

    async fn classify(&mut self) -> Result<ChartResponse, DriverError> {
        let marker_js = format!(
            "document.querySelector('{}') !== null",
            escape(&self.selectors.no_data)
        );
        let marker_present = self
            .eval(marker_js)
            .await?
            .as_bool()
            .unwrap_or(false);
        if marker_present {
            return Ok(ChartResponse::NoData);
        }

        // The chart only renders on the visualize click, not before.
        let visualize_selector = self.selectors.visualize.clone();
        self.click(&visualize_selector).await?;
        self.settle(self.delays.visualize_settle_ms).await;

        let bar_selector = format!("{} {}", self.selectors.chart, self.selectors.bar);
        self.bars = self.page.find_elements(bar_selector).await?;

        let bars = (0..self.bars.len()).map(BarHandle).collect();
        Ok(ChartResponse::SeriesPresent { bars })
    }

    async fn hover_bar(&mut self, bar: BarHandle) -> Result<(), DriverError> {
        let element = self
            .bars
            .get(bar.0)
            .ok_or(DriverError::StaleBar(bar.0))?;
        element.hover().await?;
        Ok(())
    }

    async fn read_tooltip(&mut self) -> Result<String, DriverError> {
        let element = self
            .page
            .find_element(self.selectors.tooltip.clone())
            .await
            .map_err(|_| DriverError::MissingElement(self.selectors.tooltip.clone()))?;
        let text = element
            .inner_text()
            .await?
            .ok_or(DriverError::EmptyTooltip)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DriverError::EmptyTooltip);
        }
        Ok(text.to_string())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.bars.clear();
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

fn succeeded(result: &serde_json::Value) -> bool {
    result
        .as_object()
        .and_then(|o| o.get("success"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}
