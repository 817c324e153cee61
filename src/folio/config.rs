use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::folio::dates;
use crate::folio::paths::FolioPaths;

pub const DEFAULT_PHOTO: &str =
    "https://htb-mp-prod-public-storage.s3.eu-central-1.amazonaws.com/avatars/example.png";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioSiteConfig {
    pub brand: String,
    pub default_photo: String,
}

impl Default for FolioSiteConfig {
    fn default() -> Self {
        Self {
            brand: "V01".to_string(),
            default_photo: DEFAULT_PHOTO.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioSyncConfig {
    pub recent_limit: usize,
}

impl Default for FolioSyncConfig {
    fn default() -> Self {
        Self { recent_limit: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioDatesConfig {
    pub timezone: String,
    pub display_format: String,
}

impl Default for FolioDatesConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            display_format: "%B %d, %Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioAuditConfig {
    pub enabled: bool,
}

impl Default for FolioAuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FolioConfig {
    pub site: FolioSiteConfig,
    pub sync: FolioSyncConfig,
    pub dates: FolioDatesConfig,
    pub audit: FolioAuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialFolioConfig {
    site: Option<FolioSiteConfig>,
    sync: Option<FolioSyncConfig>,
    dates: Option<FolioDatesConfig>,
    audit: Option<FolioAuditConfig>,
}

impl FolioConfig {
    /// Today's date formatted for display, in the configured timezone.
    /// The timezone was checked by `load_config`; UTC covers hand-built configs.
    pub fn today(&self) -> String {
        let tz = dates::parse_timezone(&self.dates.timezone).unwrap_or(chrono_tz::UTC);
        dates::today(tz, &self.dates.display_format)
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &FolioConfig) -> Result<()> {
    if cfg.site.brand.trim().is_empty() {
        return Err(anyhow!("invalid site brand: cannot be empty"));
    }
    if cfg.sync.recent_limit == 0 {
        return Err(anyhow!("invalid recent limit: must be >= 1"));
    }
    dates::parse_timezone(&cfg.dates.timezone)?;
    if cfg.dates.display_format.trim().is_empty() {
        return Err(anyhow!("invalid date display format: cannot be empty"));
    }
    dates::check_display_format(&cfg.dates.display_format)?;
    Ok(())
}

fn resolve_config_path(paths: &FolioPaths) -> Option<PathBuf> {
    if let Ok(custom) = env::var("FOLIO_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let local = paths.base_dir.join("folio.toml");
    if local.exists() {
        return Some(local);
    }
    Some(dirs::config_dir()?.join("folio").join("folio.toml"))
}

fn merge_file_config(base: &mut FolioConfig, paths: &FolioPaths) -> Result<()> {
    let Some(path) = resolve_config_path(paths) else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialFolioConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse folio config {}: {err}", path.display()))?;
    if let Some(site) = parsed.site {
        base.site = site;
    }
    if let Some(sync) = parsed.sync {
        base.sync = sync;
    }
    if let Some(dates) = parsed.dates {
        base.dates = dates;
    }
    if let Some(audit) = parsed.audit {
        base.audit = audit;
    }
    Ok(())
}

pub fn load_config(paths: &FolioPaths) -> Result<FolioConfig> {
    let mut cfg = FolioConfig::default();
    merge_file_config(&mut cfg, paths)?;

    cfg.site.brand = env_or_string("FOLIO_BRAND", &cfg.site.brand);
    cfg.site.default_photo = env_or_string("FOLIO_DEFAULT_PHOTO", &cfg.site.default_photo);
    cfg.sync.recent_limit = env_or_usize("FOLIO_RECENT_LIMIT", cfg.sync.recent_limit);
    cfg.dates.timezone = env_or_string("FOLIO_TIMEZONE", &cfg.dates.timezone);
    cfg.dates.display_format = env_or_string("FOLIO_DATE_FORMAT", &cfg.dates.display_format);
    cfg.audit.enabled = env_or_bool("FOLIO_AUDIT_ENABLED", cfg.audit.enabled);

    validate(&cfg)?;
    Ok(cfg)
}
