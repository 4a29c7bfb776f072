use harvest_core::MediaKind;

use crate::driver::{DriverError, ElementHandle, UiDriver};
use crate::selectors::Selectors;

/// Decides whether a message row is a media item, checking signals in order:
/// audio marker, attachment controls, then embedded media in a row with no text.
pub async fn classify_row(
    driver: &dyn UiDriver,
    selectors: &Selectors,
    row: ElementHandle,
    row_text: &str,
) -> Result<Option<MediaKind>, DriverError> {
    if has_any(driver, row, &selectors.audio_marker).await? {
        return Ok(Some(MediaKind::Audio));
    }
    for control in &selectors.attachment_controls {
        if has_any(driver, row, control).await? {
            return Ok(Some(MediaKind::Attachment));
        }
    }
    if row_text.trim().is_empty() && has_any(driver, row, &selectors.embedded_media).await? {
        return Ok(Some(MediaKind::Attachment));
    }
    Ok(None)
}

/// Provenance annotation of the first descendant carrying one, or empty.
pub async fn row_meta(
    driver: &dyn UiDriver,
    selectors: &Selectors,
    row: ElementHandle,
) -> Result<String, DriverError> {
    let found = driver.find_all(Some(row), &selectors.message_meta).await?;
    match found.first() {
        Some(element) => Ok(driver
            .attribute(*element, &selectors.meta_attribute)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string()),
        None => Ok(String::new()),
    }
}

async fn has_any(
    driver: &dyn UiDriver,
    row: ElementHandle,
    locator: &crate::driver::Locator,
) -> Result<bool, DriverError> {
    Ok(!driver.find_all(Some(row), locator).await?.is_empty())
}
