//! Configuration loading and management

use anyhow::{Context, Result};
use reel_radar_domain::{
    PurgePolicy, PurgeScope, ReportDay,
    schedule::DailySchedule,
    usecases::{ClassifierConfig, IngestConfig, RenderConfig, ReportJobConfig},
    zone::{Zone, parse_timezone},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "REEL_RADAR";

/// Flat variable names that older deployments set, and the keys they map to
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("MIN_MOVIE_NAME_LENGTH", "detection.min_movie_name_length"),
    (
        "MAX_MOVIE_REQUESTS_PER_MESSAGE",
        "detection.max_movie_requests_per_message",
    ),
    ("REPORT_TIME_HOUR", "report.hour"),
    ("REPORT_TIME_MINUTE", "report.minute"),
    ("REPORT_CHANNEL_ID", "report.channel_id"),
    ("MAX_MESSAGE_LENGTH", "report.max_message_chars"),
    ("TIMEZONE", "general.timezone"),
];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,

    /// IANA zone or fixed UTC offset shared by day windows and the schedule
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_min_movie_name_length")]
    pub min_movie_name_length: usize,

    #[serde(default = "default_max_movie_requests_per_message")]
    pub max_movie_requests_per_message: usize,

    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_hour")]
    pub hour: u8,

    #[serde(default)]
    pub minute: u8,

    #[serde(default)]
    pub channel_id: Option<i64>,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default)]
    pub report_day: ReportDay,

    #[serde(default)]
    pub purge_policy: PurgePolicy,

    #[serde(default)]
    pub purge_scope: PurgeScope,

    #[serde(default)]
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./reel-radar.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_min_movie_name_length() -> usize {
    2
}

fn default_max_movie_requests_per_message() -> usize {
    5
}

fn default_ignore_patterns() -> Vec<String> {
    IngestConfig::default().ignore_patterns
}

fn default_report_hour() -> u8 {
    6
}

fn default_top_n() -> usize {
    10
}

fn default_max_message_chars() -> usize {
    4000
}

fn default_bot_token_env() -> String {
    "BOT_TOKEN".to_string()
}

fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
            dry_run: false,
            timezone: default_timezone(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_movie_name_length: default_min_movie_name_length(),
            max_movie_requests_per_message: default_max_movie_requests_per_message(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            hour: default_report_hour(),
            minute: 0,
            channel_id: None,
            top_n: default_top_n(),
            max_message_chars: default_max_message_chars(),
            report_day: ReportDay::default(),
            purge_policy: PurgePolicy::default(),
            purge_scope: PurgeScope::default(),
            footer: None,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            base_url: default_telegram_base_url(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and the process environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_path, std::env::vars().collect())
    }

    /// Load configuration from file and an explicit environment map
    ///
    /// Precedence, lowest first: defaults, file, `REEL_RADAR__*`, flat legacy
    /// variables such as `REPORT_TIME_HOUR`.
    pub fn load_with_env(config_path: Option<&Path>, env: HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        for (name, key) in LEGACY_ENV_KEYS {
            builder = builder
                .set_override_option(*key, env.get(*name).cloned())
                .with_context(|| format!("Invalid value in {}", name))?;
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(env)),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Parsed timezone
    pub fn zone(&self) -> Result<Zone> {
        parse_timezone(&self.general.timezone).context("Invalid general.timezone")
    }

    /// Daily report schedule in the configured timezone
    pub fn schedule(&self) -> Result<DailySchedule> {
        DailySchedule::new(self.report.hour, self.report.minute, self.zone()?)
            .context("Invalid report time")
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            min_title_length: self.detection.min_movie_name_length,
            max_titles_per_message: self.detection.max_movie_requests_per_message,
        }
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            ignore_patterns: self.detection.ignore_patterns.clone(),
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            max_message_chars: self.report.max_message_chars,
            footer: self.report.footer.clone(),
        }
    }

    /// Report job settings; `dry_run` is the CLI flag, OR-ed with the config
    pub fn report_job_config(&self, dry_run: bool) -> Result<ReportJobConfig> {
        Ok(ReportJobConfig {
            zone: self.zone()?,
            report_day: self.report.report_day,
            purge_policy: self.report.purge_policy,
            purge_scope: self.report.purge_scope,
            channel_id: self.report.channel_id,
            dry_run: dry_run || self.general.dry_run,
            top_n: self.report.top_n,
            render_config: self.render_config(),
        })
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# reel-radar configuration

[general]
state_db_path = "./reel-radar.sqlite"
log_level = "info"
dry_run = false
# UTC, an IANA name like "Asia/Kolkata", or an offset such as "+05:30"
timezone = "UTC"

[detection]
min_movie_name_length = 2
max_movie_requests_per_message = 5
# Messages matching any pattern are not stored
ignore_patterns = ["^/"]

[report]
hour = 6
minute = 0
# channel_id = -1001234567890
top_n = 10
max_message_chars = 4000
report_day = "previous"       # previous, current
purge_policy = "on_delivery"  # on_delivery, always, never
purge_scope = "report_input"  # report_input, window
# footer = "Made with reel-radar"

[telegram]
bot_token_env = "BOT_TOKEN"
base_url = "https://api.telegram.org"
poll_timeout_secs = 30
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_example_toml_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(parsed.report.hour, 6);
        assert_eq!(parsed.report.purge_policy, PurgePolicy::OnDelivery);
        assert_eq!(parsed.report.purge_scope, PurgeScope::ReportInput);
        assert_eq!(parsed.report.report_day, ReportDay::Previous);
        assert_eq!(parsed.detection.ignore_patterns, vec!["^/"]);
        assert_eq!(parsed.telegram.bot_token_env, "BOT_TOKEN");
        assert!(parsed.report.channel_id.is_none());
    }

    #[test]
    fn test_load_file_and_prefixed_env() {
        let file = write_config(
            r#"
[general]
timezone = "+05:30"

[report]
hour = 7
channel_id = -100123
purge_policy = "always"
"#,
        );

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env(&[("REEL_RADAR__REPORT__MINUTE", "45")]),
        )
        .unwrap();

        assert_eq!(config.report.hour, 7);
        assert_eq!(config.report.minute, 45);
        assert_eq!(config.report.channel_id, Some(-100123));
        assert_eq!(config.report.purge_policy, PurgePolicy::Always);
        assert_eq!(config.zone().unwrap(), Zone::Fixed(time::macros::offset!(+5:30)));
        assert_eq!(config.detection.max_movie_requests_per_message, 5);
    }

    #[test]
    fn test_legacy_flat_variables() {
        let file = write_config("[report]\nhour = 7\n");

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env(&[
                ("REPORT_TIME_HOUR", "21"),
                ("REPORT_TIME_MINUTE", "15"),
                ("MIN_MOVIE_NAME_LENGTH", "3"),
                ("REPORT_CHANNEL_ID", "-1009"),
                ("TIMEZONE", "-03:00"),
            ]),
        )
        .unwrap();

        assert_eq!(config.report.hour, 21);
        assert_eq!(config.report.minute, 15);
        assert_eq!(config.detection.min_movie_name_length, 3);
        assert_eq!(config.report.channel_id, Some(-1009));
        assert_eq!(config.general.timezone, "-03:00");
    }

    #[test]
    fn test_named_timezone_from_legacy_variable() {
        let config =
            AppConfig::load_with_env(None, env(&[("TIMEZONE", "Asia/Kolkata")])).unwrap();

        let zone = config.zone().unwrap();
        assert_eq!(zone.to_string(), "Asia/Kolkata");
        assert_eq!(config.schedule().unwrap().zone(), zone);
        assert_eq!(config.report_job_config(false).unwrap().zone, zone);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = AppConfig::load_with_env(
            Some(Path::new("/definitely/not/here/config.toml")),
            HashMap::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_schedule_is_rejected() {
        let mut config = AppConfig::default();
        config.report.hour = 25;
        assert!(config.schedule().is_err());

        config.report.hour = 6;
        config.general.timezone = "Mars/Olympus".to_string();
        assert!(config.schedule().is_err());
    }

    #[test]
    fn test_report_job_config_merges_dry_run() {
        let mut config = AppConfig::default();
        assert!(!config.report_job_config(false).unwrap().dry_run);
        assert!(config.report_job_config(true).unwrap().dry_run);

        config.general.dry_run = true;
        assert!(config.report_job_config(false).unwrap().dry_run);
    }
}
