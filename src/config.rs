// src/config.rs
use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use envconfig::Envconfig;

#[derive(Debug, Clone, Envconfig)]
pub struct DashboardConfig {
    #[envconfig(from = "DASHBOARD_DATASET_PATH", default = "covid_19_clean_complete.csv")]
    pub dataset_path: PathBuf,
    #[envconfig(from = "DASHBOARD_DATE_FORMAT", default = "%Y-%m-%d")]
    pub date_format: String,
    #[envconfig(from = "DASHBOARD_TOP_N", default = "10")]
    pub top_n: usize,
    #[envconfig(from = "DASHBOARD_DARK_MODE", default = "true")]
    pub dark_mode: bool,
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: log::Level,
}

impl DashboardConfig {
    pub fn fetch() -> anyhow::Result<Self> {
        let cfg = Self::init_from_env().context("Failed to load dashboard config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        validate_date_format(&self.date_format)?;
        if self.top_n == 0 {
            bail!("DASHBOARD_TOP_N must be at least 1");
        }
        Ok(())
    }
}

pub fn load_config() -> anyhow::Result<DashboardConfig> {
    dotenv::dotenv()
        .map_err(|err| {
            eprintln!(".env file error: {err}");
            err
        })
        .ok();

    DashboardConfig::fetch()
}

fn validate_date_format(format: &str) -> anyhow::Result<()> {
    if format.trim().is_empty() {
        bail!("DASHBOARD_DATE_FORMAT must be set");
    }

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("DASHBOARD_DATE_FORMAT '{format}' is not a valid strftime format");
    }

    // the format must round-trip a date to be usable for parsing
    let sample = NaiveDate::from_ymd_opt(2020, 1, 22).context("invalid sample date")?;
    let mut rendered = String::new();
    if write!(rendered, "{}", sample.format(format)).is_err() {
        bail!("DASHBOARD_DATE_FORMAT '{format}' cannot render a calendar day");
    }
    let parsed = NaiveDate::parse_from_str(&rendered, format)
        .with_context(|| format!("DASHBOARD_DATE_FORMAT '{format}' cannot parse dates"))?;
    if parsed != sample {
        bail!("DASHBOARD_DATE_FORMAT '{format}' does not identify a calendar day");
    }

    Ok(())
}
