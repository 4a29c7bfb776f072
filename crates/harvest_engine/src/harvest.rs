use std::time::Duration;

use harvest_core::{row_preview, MediaKind, RecordSet};
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};

use crate::classify::{classify_row, row_meta};
use crate::clock::Clock;
use crate::driver::{DriverError, ElementHandle, UiDriver};
use crate::scroll::{ScrollBounds, ScrollDecision};
use crate::selectors::Selectors;
use crate::wait::wait_for_first;
use crate::{HarvestEnd, HarvestOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    /// How long the opened conversation may take to render its message list.
    pub region_wait: Duration,
    pub scroll: ScrollBounds,
    pub scroll_settle: Duration,
    /// Pause when already at the top, waiting for older messages to arrive.
    pub at_top_settle: Duration,
    /// Pause between bringing the load-more prompt into view and clicking it.
    pub click_settle: Duration,
    pub load_more_settle: Duration,
    pub load_more_reread: Duration,
    /// Iterations without a new record before the watchdog fires.
    pub stagnation_limit: usize,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            region_wait: Duration::from_secs(25),
            scroll: ScrollBounds::default(),
            scroll_settle: Duration::from_millis(1200),
            at_top_settle: Duration::from_millis(2500),
            click_settle: Duration::from_millis(300),
            load_more_settle: Duration::from_millis(2500),
            load_more_reread: Duration::from_millis(1800),
            stagnation_limit: 30,
        }
    }
}

/// Collects the messages of the currently open conversation.
pub struct ItemHarvester<'a> {
    driver: &'a dyn UiDriver,
    clock: &'a dyn Clock,
    selectors: &'a Selectors,
    settings: &'a HarvestSettings,
}

impl<'a> ItemHarvester<'a> {
    pub fn new(
        driver: &'a dyn UiDriver,
        clock: &'a dyn Clock,
        selectors: &'a Selectors,
        settings: &'a HarvestSettings,
    ) -> Self {
        Self {
            driver,
            clock,
            selectors,
            settings,
        }
    }

    /// Scrolls the open conversation back to its first message, collecting every
    /// record on the way.
    ///
    /// Ends with [`HarvestEnd::ReachedStart`] once a history-start notice renders,
    /// or [`HarvestEnd::TimedOut`] when `budget` runs out first; a timed-out outcome
    /// still carries what was seen, and callers must discard it.
    pub async fn harvest(
        &self,
        label: &str,
        budget: Duration,
    ) -> Result<HarvestOutcome, DriverError> {
        wait_for_first(
            self.driver,
            self.clock,
            None,
            &self.selectors.conversation_region,
            self.settings.region_wait,
        )
        .await?;
        let scroller = wait_for_first(
            self.driver,
            self.clock,
            None,
            &self.selectors.message_scroller,
            self.settings.region_wait,
        )
        .await?;

        let start = self.clock.now();
        let mut records = RecordSet::new(label);
        let mut iterations = 0;
        let mut load_more_clicks = 0;
        let mut stagnation_resets = 0;
        let mut idle = 0;
        let mut last_len = 0;

        let end = loop {
            if self.clock.elapsed_since(start) > budget {
                harvest_warn!(
                    "budget of {:?} exhausted with {} records seen; discarding them",
                    budget,
                    records.len()
                );
                break HarvestEnd::TimedOut;
            }
            iterations += 1;

            self.collect_literals(scroller, &mut records).await?;
            self.collect_media(scroller, &mut records).await?;

            if self.history_start_visible(scroller).await {
                harvest_info!("history start reached after {} iterations", iterations);
                break HarvestEnd::ReachedStart;
            }

            if self.click_load_older().await {
                load_more_clicks += 1;
                self.clock.sleep(self.settings.load_more_reread).await;
                continue;
            }

            self.scroll_step(scroller).await?;

            if records.len() == last_len {
                idle += 1;
            } else {
                idle = 0;
            }
            last_len = records.len();

            if idle >= self.settings.stagnation_limit {
                harvest_warn!(
                    "no new messages for {} iterations; the remote side is not loading more",
                    idle
                );
                stagnation_resets += 1;
                idle = 0;
            }
        };

        Ok(HarvestOutcome {
            records: records.into_records(),
            end,
            iterations,
            load_more_clicks,
            stagnation_resets,
            elapsed: self.clock.elapsed_since(start),
        })
    }

    async fn collect_literals(
        &self,
        scroller: ElementHandle,
        records: &mut RecordSet,
    ) -> Result<(), DriverError> {
        let elements = self
            .driver
            .find_all(Some(scroller), &self.selectors.message_meta)
            .await?;
        for element in elements {
            match self.read_literal(element).await {
                Ok((meta, text)) => {
                    records.insert_literal(&meta, &text);
                }
                Err(err) if err.is_stale() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    async fn read_literal(&self, element: ElementHandle) -> Result<(String, String), DriverError> {
        let meta = self
            .driver
            .attribute(element, &self.selectors.meta_attribute)
            .await?
            .unwrap_or_default();
        let text = self.driver.text(element).await?;
        Ok((meta, text))
    }

    async fn collect_media(
        &self,
        scroller: ElementHandle,
        records: &mut RecordSet,
    ) -> Result<(), DriverError> {
        let rows = self
            .driver
            .find_all(Some(scroller), &self.selectors.message_row)
            .await?;
        for row in rows {
            match self.read_media(row).await {
                Ok(Some((meta, kind, preview))) => {
                    records.insert_media(&meta, kind, &preview);
                }
                Ok(None) => {}
                Err(err) if err.is_stale() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    async fn read_media(
        &self,
        row: ElementHandle,
    ) -> Result<Option<(String, MediaKind, String)>, DriverError> {
        let row_text = self.driver.text(row).await?;
        let Some(kind) = classify_row(self.driver, self.selectors, row, &row_text).await? else {
            return Ok(None);
        };
        let meta = row_meta(self.driver, self.selectors, row).await?;
        Ok(Some((meta, kind, row_preview(&row_text))))
    }

    async fn history_start_visible(&self, scroller: ElementHandle) -> bool {
        for sentinel in &self.selectors.history_start_sentinels {
            match self.driver.find_all(Some(scroller), sentinel).await {
                Ok(found) if !found.is_empty() => return true,
                Ok(_) => {}
                Err(err) => harvest_debug!("sentinel check {} failed: {}", sentinel, err),
            }
        }
        false
    }

    /// Clicks the first "fetch older messages" prompt found. Any failure along the
    /// way counts as no prompt.
    async fn click_load_older(&self) -> bool {
        for prompt in &self.selectors.load_older_prompts {
            let found = match self.driver.find_all(None, prompt).await {
                Ok(found) => found,
                Err(err) => {
                    harvest_debug!("load-more lookup {} failed: {}", prompt, err);
                    continue;
                }
            };
            let Some(element) = found.first().copied() else {
                continue;
            };
            match self.activate(element).await {
                Ok(()) => {
                    harvest_info!("requested older messages from the phone");
                    return true;
                }
                Err(err) => {
                    harvest_debug!("load-more click failed: {}", err);
                    return false;
                }
            }
        }
        false
    }

    async fn activate(&self, element: ElementHandle) -> Result<(), DriverError> {
        self.driver.scroll_into_view(element).await?;
        self.clock.sleep(self.settings.click_settle).await;
        self.driver.click(element).await?;
        self.clock.sleep(self.settings.load_more_settle).await;
        Ok(())
    }

    async fn scroll_step(&self, scroller: ElementHandle) -> Result<(), DriverError> {
        let metrics = self.driver.scroll_metrics(scroller).await?;
        match self.settings.scroll.decide(&metrics) {
            ScrollDecision::ScrollTo(top) => {
                self.driver.set_scroll_top(scroller, top).await?;
                self.clock.sleep(self.settings.scroll_settle).await;
            }
            ScrollDecision::AtTop => {
                self.clock.sleep(self.settings.at_top_settle).await;
            }
        }
        Ok(())
    }
}
