use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable holding the bot token.  Never stored in the file.
pub const TOKEN_ENV: &str = "TOKEN";
/// Environment variable overriding `schedule.timezone`.
pub const TIMEZONE_ENV: &str = "NESTBOT_TIMEZONE";

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Filled from `TOKEN` at load time.
    #[serde(skip)]
    pub token: Option<String>,
    /// Chat member statuses allowed to remove children from the roster.
    pub admin_statuses: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            admin_statuses: vec!["administrator".to_string(), "creator".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub children_file: String,
    pub events_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            children_file: "babies.json".to_string(),
            events_file: "events.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn children_path(&self) -> PathBuf {
        PathBuf::from(&self.children_file)
    }

    pub fn events_path(&self) -> PathBuf {
        PathBuf::from(&self.events_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA timezone name used for "today" and for the daily run.
    /// Falls back to UTC when the name is unrecognised.
    pub timezone: String,
    /// Local wall-clock time of the daily congratulation pass, `HH:MM`.
    pub daily_at: String,
    /// Fallback target chat for the daily pass until someone runs `/start`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Krasnoyarsk".to_string(),
            daily_at: "09:00".to_string(),
            chat_id: None,
        }
    }
}

impl ScheduleConfig {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            warn!(tz = %self.timezone, "unrecognised timezone — falling back to UTC");
            chrono_tz::UTC
        })
    }

    pub fn daily_time(&self) -> NaiveTime {
        NaiveTime::parse_from_str(self.daily_at.trim(), "%H:%M").unwrap_or_else(|_| {
            warn!(daily_at = %self.daily_at, "unparsable daily_at — falling back to 09:00");
            NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub birthday_window_days: i64,
    pub event_window_days: i64,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            birthday_window_days: 30,
            event_window_days: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub views: ViewsConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load the file at `path`, or defaults when it does not exist.
    ///
    /// Any other read failure and any parse failure is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file {}", path.display()));
            }
        };

        if let Ok(token) = env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.bot.token = Some(token.trim().to_string());
            }
        }

        if let Ok(tz) = env::var(TIMEZONE_ENV) {
            if !tz.is_empty() {
                config.schedule.timezone = tz;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    /// The bot token, or an error naming the variable to set.
    pub fn require_token(&self) -> Result<&str> {
        self.bot
            .token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("{TOKEN_ENV} is not set; export the bot token first"))
    }

    pub fn is_admin_status(&self, status: &str) -> bool {
        self.bot
            .admin_statuses
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(status))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sensible() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.storage.children_file, "babies.json");
        assert_eq!(cfg.storage.events_file, "events.json");
        assert_eq!(cfg.schedule.timezone, "Asia/Krasnoyarsk");
        assert_eq!(cfg.schedule.daily_at, "09:00");
        assert!(cfg.schedule.chat_id.is_none());
        assert_eq!(cfg.views.birthday_window_days, 30);
        assert_eq!(cfg.views.event_window_days, 14);
        assert_eq!(cfg.telemetry.log_level, "info");
    }

    #[test]
    fn admin_statuses_are_case_insensitive() {
        let cfg = AppConfig::default();
        assert!(cfg.is_admin_status("creator"));
        assert!(cfg.is_admin_status("Administrator"));
        assert!(!cfg.is_admin_status("member"));
        assert!(!cfg.is_admin_status("restricted"));
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(cfg.storage.children_file, "babies.json");
    }

    #[test]
    fn load_from_partial_toml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            r#"
[schedule]
daily_at = "08:30"
chat_id = -100500

[views]
event_window_days = 7
"#,
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.schedule.daily_at, "08:30");
        assert_eq!(cfg.schedule.chat_id, Some(-100500));
        assert_eq!(cfg.views.event_window_days, 7);
        assert_eq!(cfg.views.birthday_window_days, 30);
        assert_eq!(
            cfg.schedule.daily_time(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
    }

    #[test]
    fn load_from_unreadable_path_returns_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn load_from_invalid_toml_returns_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn save_and_reload_roundtrip_never_writes_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub/config.toml");

        let mut cfg = AppConfig::default();
        cfg.bot.token = Some("secret".to_string());
        cfg.storage.children_file = "/var/lib/nestbot/babies.json".to_string();
        cfg.schedule.chat_id = Some(42);

        cfg.save_to(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("secret"));

        let loaded: AppConfig = toml::from_str(&raw).unwrap();
        assert_eq!(loaded.storage.children_file, "/var/lib/nestbot/babies.json");
        assert_eq!(loaded.schedule.chat_id, Some(42));
        assert!(loaded.bot.token.is_none());
    }

    #[test]
    fn bad_timezone_and_time_fall_back() {
        let schedule = ScheduleConfig {
            timezone: "Mars/Olympus".to_string(),
            daily_at: "nine".to_string(),
            chat_id: None,
        };
        assert_eq!(schedule.tz(), chrono_tz::UTC);
        assert_eq!(schedule.daily_time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn known_timezone_parses() {
        assert_eq!(ScheduleConfig::default().tz(), chrono_tz::Asia::Krasnoyarsk);
    }

    #[test]
    fn require_token_errors_when_missing() {
        let cfg = AppConfig::default();
        let err = cfg.require_token().unwrap_err();
        assert!(err.to_string().contains("TOKEN"));

        let mut cfg = AppConfig::default();
        cfg.bot.token = Some("123:abc".to_string());
        assert_eq!(cfg.require_token().unwrap(), "123:abc");
    }
}
