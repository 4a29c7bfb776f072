//! RON settings file. Every field is optional; durations are in milliseconds.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use harvest_core::{ExclusionSet, LabelRules, RunLimits};
use harvest_engine::{HarvestSettings, Locator, PagerSettings, RunConfig, ScrollBounds, Selectors};
use harvest_logging::harvest_info;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "harvest.ron";
pub const DEFAULT_URL: &str = "https://web.whatsapp.com/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub url: String,
    /// Where exports are written. Defaults to the working directory.
    pub output_dir: Option<PathBuf>,
    /// Parent of the named browser profiles. Defaults to `~/harvest_profiles`.
    pub profile_root: Option<PathBuf>,
    pub browser: BrowserSection,
    pub limits: LimitsSection,
    /// Conversation titles never opened; compared case- and whitespace-insensitively.
    pub exclusions: Vec<String>,
    pub pager: PagerSection,
    pub harvest: HarvestSection,
    pub texts: TextSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            output_dir: None,
            profile_root: None,
            browser: BrowserSection::default(),
            limits: LimitsSection::default(),
            exclusions: Vec::new(),
            pager: PagerSection::default(),
            harvest: HarvestSection::default(),
            texts: TextSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// Chrome/Chromium binary; auto-detected when absent.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// How long the conversation list may take to appear after login is confirmed.
    pub login_wait_ms: u64,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            executable: None,
            headless: false,
            login_wait_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub quota: usize,
    pub max_rounds: usize,
    pub per_item_budget_ms: u64,
    pub deadline_ms: Option<u64>,
}

impl Default for LimitsSection {
    fn default() -> Self {
        let limits = RunLimits::default();
        Self {
            quota: limits.quota,
            max_rounds: limits.max_rounds,
            per_item_budget_ms: millis(limits.per_item_budget),
            deadline_ms: limits.deadline.map(millis),
        }
    }
}

impl LimitsSection {
    fn to_limits(&self) -> RunLimits {
        RunLimits {
            quota: self.quota,
            max_rounds: self.max_rounds,
            per_item_budget: Duration::from_millis(self.per_item_budget_ms),
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerSection {
    pub container_wait_ms: u64,
    pub step_px: f64,
    pub settle_ms: u64,
    pub open_wait_ms: u64,
    pub open_settle_ms: u64,
    pub max_label_chars: usize,
    /// Titles of non-conversation rows (folders, the app's own entry).
    pub reserved_labels: Vec<String>,
}

impl Default for PagerSection {
    fn default() -> Self {
        let pager = PagerSettings::default();
        Self {
            container_wait_ms: millis(pager.container_wait),
            step_px: pager.step,
            settle_ms: millis(pager.settle),
            open_wait_ms: millis(pager.open_wait),
            open_settle_ms: millis(pager.open_settle),
            max_label_chars: pager.rules.max_chars,
            reserved_labels: pager.rules.reserved,
        }
    }
}

impl PagerSection {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.step_px.is_finite() && self.step_px > 0.0,
            "pager.step_px must be a positive number, got {}",
            self.step_px
        );
        Ok(())
    }

    fn to_settings(&self) -> PagerSettings {
        PagerSettings {
            container_wait: Duration::from_millis(self.container_wait_ms),
            step: self.step_px,
            settle: Duration::from_millis(self.settle_ms),
            open_wait: Duration::from_millis(self.open_wait_ms),
            open_settle: Duration::from_millis(self.open_settle_ms),
            rules: LabelRules {
                max_chars: self.max_label_chars,
                reserved: self.reserved_labels.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSection {
    pub region_wait_ms: u64,
    pub scroll_ratio: f64,
    pub min_step_px: f64,
    pub max_step_px: f64,
    pub top_tolerance_px: f64,
    pub scroll_settle_ms: u64,
    pub at_top_settle_ms: u64,
    pub click_settle_ms: u64,
    pub load_more_settle_ms: u64,
    pub load_more_reread_ms: u64,
    pub stagnation_limit: usize,
}

impl Default for HarvestSection {
    fn default() -> Self {
        let harvest = HarvestSettings::default();
        Self {
            region_wait_ms: millis(harvest.region_wait),
            scroll_ratio: harvest.scroll.ratio,
            min_step_px: harvest.scroll.min_step,
            max_step_px: harvest.scroll.max_step,
            top_tolerance_px: harvest.scroll.top_tolerance,
            scroll_settle_ms: millis(harvest.scroll_settle),
            at_top_settle_ms: millis(harvest.at_top_settle),
            click_settle_ms: millis(harvest.click_settle),
            load_more_settle_ms: millis(harvest.load_more_settle),
            load_more_reread_ms: millis(harvest.load_more_reread),
            stagnation_limit: harvest.stagnation_limit,
        }
    }
}

impl HarvestSection {
    /// Rejects scroll bounds the adaptive step cannot clamp to.
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("scroll_ratio", self.scroll_ratio),
            ("min_step_px", self.min_step_px),
            ("max_step_px", self.max_step_px),
            ("top_tolerance_px", self.top_tolerance_px),
        ] {
            ensure!(value.is_finite(), "harvest.{name} must be a finite number, got {value}");
        }
        ensure!(
            self.scroll_ratio > 0.0,
            "harvest.scroll_ratio must be positive, got {}",
            self.scroll_ratio
        );
        ensure!(
            self.min_step_px > 0.0 && self.min_step_px <= self.max_step_px,
            "harvest.min_step_px ({}) must be positive and not above max_step_px ({})",
            self.min_step_px,
            self.max_step_px
        );
        ensure!(
            self.top_tolerance_px >= 0.0,
            "harvest.top_tolerance_px must not be negative"
        );
        Ok(())
    }

    fn to_settings(&self) -> HarvestSettings {
        HarvestSettings {
            region_wait: Duration::from_millis(self.region_wait_ms),
            scroll: ScrollBounds {
                ratio: self.scroll_ratio,
                min_step: self.min_step_px,
                max_step: self.max_step_px,
                top_tolerance: self.top_tolerance_px,
            },
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
            at_top_settle: Duration::from_millis(self.at_top_settle_ms),
            click_settle: Duration::from_millis(self.click_settle_ms),
            load_more_settle: Duration::from_millis(self.load_more_settle_ms),
            load_more_reread: Duration::from_millis(self.load_more_reread_ms),
            stagnation_limit: self.stagnation_limit,
        }
    }
}

/// Interface-language strings the harvester looks for. Absent entries keep the
/// built-in Spanish texts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSection {
    /// Notices shown at the very start of a conversation's history.
    pub history_start: Option<Vec<String>>,
    /// Prompt offering to fetch older messages from the phone.
    pub load_older: Option<String>,
}

impl TextSection {
    fn apply(&self, selectors: &mut Selectors) {
        if let Some(notices) = &self.history_start {
            selectors.history_start_sentinels = notices.iter().map(Locator::text).collect();
        }
        if let Some(prompt) = &self.load_older {
            selectors.load_older_prompts = vec![
                Locator::text_in("button", prompt.as_str()),
                Locator::text_in("div, span", prompt.as_str()),
            ];
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `./harvest.ron` when no path is given and that file exists.
    /// Falls back to defaults only when no file was asked for and none is present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    harvest_info!("no {} found; using built-in settings", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse settings in {}", path.display()))?;
        harvest_info!("loaded settings from {:?}", path);
        Ok(config)
    }

    /// Parses RON settings and rejects values the engine cannot run with.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = ron::from_str(content)?;
        config.pager.validate()?;
        config.harvest.validate()?;
        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Engine configuration for one run exporting to `output_name`.
    pub fn run_config(&self, output_name: String) -> RunConfig {
        let mut selectors = Selectors::default();
        self.texts.apply(&mut selectors);
        RunConfig {
            limits: self.limits.to_limits(),
            exclusions: ExclusionSet::new(&self.exclusions),
            pager: self.pager.to_settings(),
            harvest: self.harvest.to_settings(),
            selectors,
            output_name,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
