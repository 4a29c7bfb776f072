use std::time::Duration;

use harvest_logging::harvest_trace;

use crate::clock::Clock;
use crate::driver::{DriverError, ElementHandle, Locator, UiDriver};

/// Interval between polls while waiting for an element to render.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Polls until `locator` matches at least one element below `scope`, or fails with
/// [`DriverError::NotFound`] once `budget` is spent. Stale scopes and transient
/// protocol errors are retried until the budget runs out.
pub async fn wait_for_all(
    driver: &dyn UiDriver,
    clock: &dyn Clock,
    scope: Option<ElementHandle>,
    locator: &Locator,
    budget: Duration,
) -> Result<Vec<ElementHandle>, DriverError> {
    let start = clock.now();
    loop {
        match driver.find_all(scope, locator).await {
            Ok(found) if !found.is_empty() => return Ok(found),
            Ok(_) => {}
            Err(err) => harvest_trace!("query {} failed while waiting: {}", locator, err),
        }
        let waited = clock.elapsed_since(start);
        if waited >= budget {
            return Err(DriverError::NotFound {
                locator: locator.to_string(),
                waited_ms: waited.as_millis(),
            });
        }
        clock.sleep(POLL_INTERVAL.min(budget - waited)).await;
    }
}

/// Like [`wait_for_all`] but yields only the first match.
pub async fn wait_for_first(
    driver: &dyn UiDriver,
    clock: &dyn Clock,
    scope: Option<ElementHandle>,
    locator: &Locator,
    budget: Duration,
) -> Result<ElementHandle, DriverError> {
    let found = wait_for_all(driver, clock, scope, locator, budget).await?;
    found.into_iter().next().ok_or_else(|| DriverError::NotFound {
        locator: locator.to_string(),
        waited_ms: budget.as_millis(),
    })
}
