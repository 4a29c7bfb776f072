use std::time::Duration;

use harvest_core::{LabelRules, RunState};
use harvest_logging::{harvest_debug, harvest_info};

use crate::clock::Clock;
use crate::driver::{DriverError, ElementHandle, UiDriver};
use crate::selectors::Selectors;
use crate::wait::{wait_for_first, POLL_INTERVAL};
use crate::{EngineError, Round};

#[derive(Debug, Clone, PartialEq)]
pub struct PagerSettings {
    /// How long the outer container may take to render before the run is abandoned.
    pub container_wait: Duration,
    /// Pixels the outer list moves forward per advance.
    pub step: f64,
    pub settle: Duration,
    /// How long to look for a label's row when opening it.
    pub open_wait: Duration,
    pub open_settle: Duration,
    pub rules: LabelRules,
}

impl Default for PagerSettings {
    fn default() -> Self {
        Self {
            container_wait: Duration::from_secs(20),
            step: 1200.0,
            settle: Duration::from_millis(1200),
            open_wait: Duration::from_secs(20),
            open_settle: Duration::from_secs(2),
            rules: LabelRules::default(),
        }
    }
}

/// Walks the outer conversation list round by round.
pub struct OuterPager<'a> {
    driver: &'a dyn UiDriver,
    clock: &'a dyn Clock,
    selectors: &'a Selectors,
    settings: &'a PagerSettings,
}

impl<'a> OuterPager<'a> {
    pub fn new(
        driver: &'a dyn UiDriver,
        clock: &'a dyn Clock,
        selectors: &'a Selectors,
        settings: &'a PagerSettings,
    ) -> Self {
        Self {
            driver,
            clock,
            selectors,
            settings,
        }
    }

    /// Labels currently rendered in the outer list, in rendering order, with noise
    /// and in-round duplicates removed.
    pub async fn list_visible(&self) -> Result<Vec<String>, EngineError> {
        let container = self.container().await?;
        let titled = self.titled_rows(container).await?;
        Ok(self
            .settings
            .rules
            .filter_visible(titled.iter().map(|(title, _)| title.as_str())))
    }

    /// Scrolls the outer list forward by one step and lets it settle.
    pub async fn advance(&self) -> Result<(), EngineError> {
        let container = self.container().await?;
        let metrics = self.driver.scroll_metrics(container).await?;
        self.driver
            .set_scroll_top(container, metrics.scroll_top + self.settings.step)
            .await?;
        self.clock.sleep(self.settings.settle).await;
        Ok(())
    }

    /// One discovery round. An empty listing gets one advance and a second look
    /// before the list is declared exhausted.
    pub async fn next_round(&self, state: &RunState) -> Result<Round, EngineError> {
        let visible = self.list_visible().await?;
        harvest_debug!("outer list shows {} labels: {:?}", visible.len(), preview(&visible));
        let fresh = state.unprocessed(&visible);
        if !fresh.is_empty() {
            return Ok(Round::Fresh(fresh));
        }

        self.advance().await?;
        let fresh = state.unprocessed(&self.list_visible().await?);
        if fresh.is_empty() {
            harvest_info!("no unprocessed conversations left in the outer list");
            Ok(Round::Exhausted)
        } else {
            Ok(Round::Fresh(fresh))
        }
    }

    /// Opens the conversation whose title equals `label`.
    pub async fn open(&self, label: &str) -> Result<(), DriverError> {
        let start = self.clock.now();
        loop {
            let container = wait_for_first(
                self.driver,
                self.clock,
                None,
                &self.selectors.outer_container,
                self.settings.open_wait,
            )
            .await?;
            let titled = self.titled_rows(container).await?;
            let target = titled
                .into_iter()
                .find(|(title, _)| title.as_str() == label)
                .map(|(_, element)| element);

            if let Some(element) = target {
                self.driver.scroll_into_view(element).await?;
                self.driver.click(element).await?;
                self.clock.sleep(self.settings.open_settle).await;
                return Ok(());
            }

            let waited = self.clock.elapsed_since(start);
            if waited >= self.settings.open_wait {
                return Err(DriverError::NotFound {
                    locator: format!("outer row titled `{label}`"),
                    waited_ms: waited.as_millis(),
                });
            }
            self.clock.sleep(POLL_INTERVAL).await;
        }
    }

    async fn container(&self) -> Result<ElementHandle, EngineError> {
        let wait = self.settings.container_wait;
        wait_for_first(
            self.driver,
            self.clock,
            None,
            &self.selectors.outer_container,
            wait,
        )
        .await
        .map_err(|err| match err {
            DriverError::NotFound { .. } => EngineError::StructuralNotReady {
                what: "outer list container".to_string(),
                waited: wait,
            },
            other => EngineError::Driver(other),
        })
    }

    /// `(trimmed title, title element)` for each row that has a non-blank title.
    async fn titled_rows(
        &self,
        container: ElementHandle,
    ) -> Result<Vec<(String, ElementHandle)>, DriverError> {
        let rows = self
            .driver
            .find_all(Some(container), &self.selectors.outer_row)
            .await?;
        let mut titled = Vec::with_capacity(rows.len());
        for row in rows {
            match self.row_title(row).await {
                Ok(Some(found)) => titled.push(found),
                Ok(None) => {}
                Err(err) if err.is_stale() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(titled)
    }

    async fn row_title(
        &self,
        row: ElementHandle,
    ) -> Result<Option<(String, ElementHandle)>, DriverError> {
        let candidates = self
            .driver
            .find_all(Some(row), &self.selectors.outer_title)
            .await?;
        for element in candidates {
            let title = self
                .driver
                .attribute(element, &self.selectors.title_attribute)
                .await?
                .unwrap_or_default();
            let title = title.trim();
            if !title.is_empty() {
                return Ok(Some((title.to_string(), element)));
            }
        }
        Ok(None)
    }
}

fn preview(labels: &[String]) -> &[String] {
    &labels[..labels.len().min(8)]
}
