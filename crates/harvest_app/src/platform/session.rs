use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use harvest_engine::{profile_dir_name, wait_for_first, Clock, Selectors, UiDriver};
use harvest_logging::harvest_info;

use super::config::AppConfig;

const PROFILE_ROOT_DIR: &str = "harvest_profiles";

/// Directory of the named persistent browser profile, created if missing.
pub fn profile_dir(config: &AppConfig, name: &str) -> Result<PathBuf> {
    let root = match &config.profile_root {
        Some(root) => root.clone(),
        None => dirs::home_dir()
            .context("could not determine the home directory for browser profiles")?
            .join(PROFILE_ROOT_DIR),
    };
    let dir = root.join(profile_dir_name(name));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create profile directory {}", dir.display()))?;
    Ok(dir)
}

/// Asks the operator to finish logging in, then waits for the conversation list.
pub async fn wait_for_login(
    driver: &dyn UiDriver,
    clock: &dyn Clock,
    selectors: &Selectors,
    config: &AppConfig,
) -> Result<()> {
    println!();
    println!("{}", "=".repeat(60));
    println!("Log in to WhatsApp Web in the browser window:");
    println!("  1) scan the QR code if asked");
    println!("  2) wait until the chat list has loaded");
    println!("  3) come back here and press ENTER");
    println!("{}", "=".repeat(60));
    prompt_line("Press ENTER when WhatsApp Web is ready...").await?;

    let wait = Duration::from_millis(config.browser.login_wait_ms);
    wait_for_first(driver, clock, None, &selectors.outer_container, wait)
        .await
        .map_err(|err| anyhow!("conversation list did not appear: {err}"))?;
    harvest_info!("conversation list is ready");
    Ok(())
}

/// Prints `prompt` and reads one line from stdin without blocking the runtime.
pub async fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt} ");
    io::stdout().flush().context("failed to flush stdout")?;
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .context("stdin reader task failed")?
    .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}
