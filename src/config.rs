use crate::model::{Platform, PlatformCounts};
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveTime;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".GrindLog";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_SUMMARY_TIME: &str = "23:55";
pub const DEFAULT_NOTIFY_BEFORE_MINUTES: u32 = 60;
const MIN_RECONCILE_SECONDS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub summary_time: String,
    pub daily_summary_enabled: bool,
    pub default_notify_before_minutes: u32,
    pub reconcile_seconds: u64,
    pub notifications_enabled: bool,
    pub default_targets: PlatformCounts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_root_dir().join("db").join("grindlog.db"),
            summary_time: DEFAULT_SUMMARY_TIME.to_string(),
            daily_summary_enabled: true,
            default_notify_before_minutes: DEFAULT_NOTIFY_BEFORE_MINUTES,
            reconcile_seconds: 30,
            notifications_enabled: true,
            default_targets: PlatformCounts::default(),
        }
    }
}

impl Config {
    pub fn root_dir() -> Result<PathBuf> {
        Ok(default_root_dir())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.reconcile_seconds = config.reconcile_seconds.max(MIN_RECONCILE_SECONDS);

        Ok(config)
    }

    /// Loads the config, writing defaults only when no config file exists yet.
    pub fn load_or_create() -> Result<Self> {
        let config = Self::load_or_create_at(&Self::config_path()?)?;
        config.ensure_bootstrap_files()?;
        Ok(config)
    }

    /// A file that exists but does not parse is an error and is left untouched.
    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from(config_path);
        }

        let config = Self::default();
        config.save_to(config_path)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir()?;
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        Ok(())
    }

    pub fn parse_summary_time(&self) -> Result<NaiveTime> {
        parse_hhmm(&self.summary_time)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let normalized = normalize_config_key(key);

        if let Some(platform) = target_platform(key) {
            let platform = platform.parse::<Platform>()?;
            let target = value
                .trim()
                .parse::<u32>()
                .map_err(|_| anyhow!("target.{} must be a non-negative number", platform.key()))?;
            self.default_targets.set(platform, target);
            return Ok(());
        }

        match normalized {
            "db_path" => {
                self.db_path = expand_home(value);
            }
            "summary_time" => {
                parse_hhmm(value)?;
                self.summary_time = value.to_string();
            }
            "daily_summary_enabled" => {
                self.daily_summary_enabled = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("daily_summary_enabled must be true/false"))?;
            }
            "default_notify_before_minutes" => {
                self.default_notify_before_minutes = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("default_notify_before_minutes must be a number"))?;
            }
            "reconcile_seconds" => {
                self.reconcile_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("reconcile_seconds must be a number"))?
                    .max(MIN_RECONCILE_SECONDS);
            }
            "notifications_enabled" => {
                self.notifications_enabled = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("notifications_enabled must be true/false"))?;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path|db.path, \
                     summary_time|summary.time, daily_summary_enabled|summary.enabled, \
                     default_notify_before_minutes|reminder.notify_before, \
                     reconcile_seconds|service.reconcile_seconds, \
                     notifications_enabled|notifications.enabled, target.<platform>"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        if let Some(platform) = target_platform(key) {
            return platform
                .parse::<Platform>()
                .ok()
                .map(|platform| self.default_targets.get(platform).to_string());
        }

        match normalize_config_key(key) {
            "db_path" => Some(self.db_path.display().to_string()),
            "summary_time" => Some(self.summary_time.clone()),
            "daily_summary_enabled" => Some(self.daily_summary_enabled.to_string()),
            "default_notify_before_minutes" => {
                Some(self.default_notify_before_minutes.to_string())
            }
            "reconcile_seconds" => Some(self.reconcile_seconds.to_string()),
            "notifications_enabled" => Some(self.notifications_enabled.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "db_path" | "db.path" => "db_path",
        "summary_time" | "summary.time" => "summary_time",
        "daily_summary_enabled" | "summary.enabled" => "daily_summary_enabled",
        "default_notify_before_minutes" | "reminder.notify_before" => {
            "default_notify_before_minutes"
        }
        "reconcile_seconds" | "service.reconcile_seconds" => "reconcile_seconds",
        "notifications_enabled" | "notifications.enabled" => "notifications_enabled",
        _ => key,
    }
}

fn target_platform(key: &str) -> Option<&str> {
    key.strip_prefix("target.")
        .or_else(|| key.strip_prefix("default_targets."))
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .with_context(|| format!("Invalid time format: {value}. Example: 23:55 (24-hour format)",))
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_hhmm};
    use crate::model::Platform;
    use tempfile::TempDir;

    #[test]
    fn set_and_get_round_trip() {
        let mut config = Config::default();

        config.set_value("summary.time", "22:15").expect("valid time");
        config.set_value("reminder.notify_before", "30").expect("valid minutes");
        config.set_value("notifications.enabled", "false").expect("valid bool");

        assert_eq!(config.get_value("summary_time").as_deref(), Some("22:15"));
        assert_eq!(
            config.get_value("default_notify_before_minutes").as_deref(),
            Some("30")
        );
        assert_eq!(config.get_value("notifications_enabled").as_deref(), Some("false"));
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_or_create_at(&path).expect("created");
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(Config::load_or_create_at(&path).expect("reloaded"), config);
    }

    #[test]
    fn corrupt_config_is_reported_and_kept() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ \"summary_time\": ").expect("write");

        let error = Config::load_or_create_at(&path).expect_err("parse error");
        assert!(error.to_string().contains("Failed to parse config file"));
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "{ \"summary_time\": "
        );
    }

    #[test]
    fn rejects_invalid_summary_time() {
        let mut config = Config::default();
        assert!(config.set_value("summary_time", "25:99").is_err());
        assert_eq!(config.summary_time, "23:55");
        assert!(parse_hhmm("9pm").is_err());
    }

    #[test]
    fn default_targets_by_platform_key() {
        let mut config = Config::default();
        config.set_value("target.cf", "3").expect("valid target");
        config
            .set_value("default_targets.leetcode", "2")
            .expect("valid target");

        assert_eq!(config.default_targets.get(Platform::Codeforces), 3);
        assert_eq!(config.default_targets.get(Platform::LeetCode), 2);
        assert_eq!(config.get_value("target.codeforces").as_deref(), Some("3"));
        assert!(config.set_value("target.topcoder", "1").is_err());
        assert!(config.set_value("target.leetcode", "-1").is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("api_port", "8080").is_err());
        assert_eq!(config.get_value("api_port"), None);
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.set_value("reconcile_seconds", "1").expect("valid seconds");
        assert_eq!(config.reconcile_seconds, 5);
        config.default_targets.set(Platform::CodeChef, 4);
        config.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "summary_time": "21:00" }"#).expect("write");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.summary_time, "21:00");
        assert_eq!(loaded.default_notify_before_minutes, 60);
        assert!(loaded.daily_summary_enabled);
    }
}
