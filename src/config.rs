use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Model name passed to the generative oracle.
    pub model: String,
    /// Year used to complete syllabus dates that omit one (e.g. "11-20").
    pub default_academic_year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub calendar_id: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Days before an exam to place study reminders, most distant first.
    pub offsets_days: Vec<i64>,
    pub enabled: bool,
}

impl ReminderConfig {
    /// Reminders run only when the config allows them and the invocation did
    /// not suppress them.
    pub fn effective(&self, suppress: bool) -> bool {
        self.enabled && !suppress
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self { model: "gemini-flash-latest".to_string(), default_academic_year: 2025 }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self { calendar_id: "primary".to_string(), time_zone: "America/Edmonton".to_string() }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self { offsets_days: vec![5, 2], enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            calendar: CalendarConfig::default(),
            reminders: ReminderConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Resolve the configured time zone against the tz database.
    pub fn time_zone(&self) -> Result<chrono_tz::Tz> {
        chrono_tz::Tz::from_str(&self.calendar.time_zone).map_err(|_| {
            anyhow::anyhow!("Unknown time zone in config: {}", self.calendar.time_zone)
        })
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "syllasync", "syllasync")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
