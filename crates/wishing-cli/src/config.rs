// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use wishing_app::{AccountId, Column, ColumnFilterSet, DEFAULT_PAGE_SIZE, PageSize};

pub const APP_NAME: &str = "wishing-well";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub view: View,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            data: Data::default(),
            view: View::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub history_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    pub page_size: Option<i64>,
    pub account: Option<String>,
    pub hidden: Option<Vec<String>>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE as i64),
            account: None,
            hidden: Some(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("WISHING_WELL_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set WISHING_WELL_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [data], [view], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(history_path) = &self.data.history_path
            && history_path.trim().is_empty()
        {
            bail!("data.history_path in {} must not be empty", path.display());
        }

        if let Some(page_size) = self.view.page_size
            && page_size <= 0
        {
            bail!(
                "view.page_size in {} must be positive, got {}",
                path.display(),
                page_size
            );
        }

        for entry in self.hidden_entries() {
            parse_filter_key(entry)
                .with_context(|| format!("invalid view.hidden entry in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level {
            level.parse::<tracing::Level>().map_err(|_| {
                anyhow!(
                    "log.level in {} must be one of trace, debug, info, warn, error; got {:?}",
                    path.display(),
                    level
                )
            })?;
        }

        Ok(())
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        match &self.data.history_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => default_history_path(),
        }
    }

    pub fn page_size(&self) -> Result<PageSize> {
        let raw = self.view.page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64);
        let size = usize::try_from(raw).with_context(|| format!("page size {raw} out of range"))?;
        Ok(PageSize::new(size)?)
    }

    pub fn preferred_account(&self) -> Option<AccountId> {
        self.view
            .account
            .as_deref()
            .map(str::trim)
            .filter(|account| !account.is_empty())
            .map(AccountId::from)
    }

    pub fn hidden_filters(&self) -> Result<Vec<(Column, String)>> {
        self.hidden_entries().map(parse_filter_key).collect()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    fn hidden_entries(&self) -> impl Iterator<Item = &str> {
        self.view.hidden.iter().flatten().map(String::as_str)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# wishing-well config\n# Place this file at: {}\n\nversion = 1\n\n[data]\n# Optional. Default is platform data dir (for example ~/.local/share/wishing-well/history.json)\n# history_path = \"/absolute/path/to/history.json\"\n\n[view]\npage_size = {}\n# account = \"700000001\"\n# Filter keys to switch off at startup, as column=key (columns: rarity, type, bannerType)\nhidden = []\n\n[log]\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
            DEFAULT_LOG_LEVEL,
        )
    }
}

pub fn app_data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set WISHING_WELL_DATA_PATH to the history file")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn default_history_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("WISHING_WELL_DATA_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    Ok(app_data_dir()?.join("history.json"))
}

/// Parses a `column=key` filter reference such as `rarity=3` or
/// `bannerType=301`.
pub fn parse_filter_key(raw: &str) -> Result<(Column, String)> {
    let (column, key) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("filter {raw:?} must look like column=key, for example rarity=3"))?;
    let column = Column::parse(column.trim()).ok_or_else(|| {
        anyhow!("unknown filter column {:?}; use rarity, type or bannerType", column.trim())
    })?;
    let key = key.trim();

    match ColumnFilterSet::default().canonical_key(column, key) {
        Some(canonical) => Ok((column, canonical)),
        None => bail!("filter key {key:?} is not valid for column {column}"),
    }
}
