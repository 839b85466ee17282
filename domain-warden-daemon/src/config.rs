//! Daemon configuration file.
//!
//! Every section is optional; missing keys take the engine defaults. Secrets can
//! be kept out of the file with `DOMAIN_WARDEN_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

use domain_warden_app::adapters::TelegramConfig;
use domain_warden_core::types::{
    LifecyclePolicy, SafeBrowsingConfig, ScannerConfig, ThreatIntelConfig, VirusTotalConfig,
};
use domain_warden_provider::PowerDnsConfig;

pub const DEFAULT_CONFIG_PATH: &str = "domain-warden.toml";
pub const CONFIG_PATH_ENV: &str = "DOMAIN_WARDEN_CONFIG";
const ENV_PREFIX: &str = "DOMAIN_WARDEN_";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scanner: ScannerConfig,
    pub lifecycle: LifecyclePolicy,
    pub threat_intel: ThreatIntelConfig,
    pub powerdns: PowerDnsConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, created on first start.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/domain-warden.db"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
    /// Daily rolling files in this directory instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            directory: None,
        }
    }
}

/// Config path: first CLI argument, then `$DOMAIN_WARDEN_CONFIG`, then the default.
pub fn resolve_path(arg: Option<String>, env: Option<String>) -> (PathBuf, bool) {
    match arg.or(env).filter(|p| !p.trim().is_empty()) {
        Some(path) => (PathBuf::from(path), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    }
}

impl DaemonConfig {
    /// Read and validate the file at `path`.
    ///
    /// A missing file is only an error when the path was given explicitly;
    /// otherwise the defaults are used.
    pub fn load(path: &Path, explicit: bool) -> anyhow::Result<Self> {
        let mut config = if path.exists() || explicit {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::parse(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Override secrets from `DOMAIN_WARDEN_<KEY>` variables.
    ///
    /// A threat-intel key without a config section enables the service with
    /// default settings.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).filter(|v| !v.is_empty());

        if let Some(key) = var("POWERDNS_API_KEY") {
            self.powerdns.api_key = key;
        }
        if let Some(key) = var("SAFE_BROWSING_API_KEY") {
            self.threat_intel
                .safe_browsing
                .get_or_insert_with(SafeBrowsingConfig::default)
                .api_key = key;
        }
        if let Some(key) = var("VIRUSTOTAL_API_KEY") {
            self.threat_intel
                .virus_total
                .get_or_insert_with(VirusTotalConfig::default)
                .api_key = key;
        }
        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scanner.batch_size == 0 {
            bail!("scanner.batch_size must be at least 1");
        }
        if self.scanner.max_concurrent_reconciles == 0 {
            bail!("scanner.max_concurrent_reconciles must be at least 1");
        }
        let lifecycle = &self.lifecycle;
        if lifecycle.suspend_after_days < 1 || lifecycle.delete_after_days <= lifecycle.suspend_after_days {
            bail!(
                "lifecycle: need 0 < suspend_after_days ({}) < delete_after_days ({})",
                lifecycle.suspend_after_days,
                lifecycle.delete_after_days
            );
        }
        if let Some(day) = lifecycle
            .warning_days
            .iter()
            .find(|d| **d < lifecycle.suspend_after_days || **d >= lifecycle.delete_after_days)
        {
            bail!("lifecycle.warning_days: day {day} is outside the suspension window");
        }
        if self.powerdns.api_url.trim().is_empty() {
            bail!("powerdns.api_url is required");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DaemonConfig::parse("").unwrap();
        assert_eq!(config.scanner, ScannerConfig::default());
        assert_eq!(config.lifecycle, LifecyclePolicy::default());
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.powerdns.server_id, "localhost");
        assert!(!config.telegram.is_configured());
        config.validate().unwrap();
    }

    #[test]
    fn sections_override_defaults() {
        let config = DaemonConfig::parse(
            r#"
            [database]
            path = "/var/lib/warden/warden.db"

            [logging]
            level = "debug,sea_orm=warn"
            format = "json"
            directory = "/var/log/warden"

            [scanner]
            interval_secs = 1800
            batch_size = 20

            [lifecycle]
            warning_days = [20, 27]

            [threat_intel.virus_total]
            api_key = "vt-key"
            daily_limit = 400

            [powerdns]
            api_url = "http://10.0.0.5:8081"
            api_key = "pdns-key"

            [telegram]
            bot_token = "123:abc"
            chat_id = "-100200"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/var/lib/warden/warden.db"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.directory, Some(PathBuf::from("/var/log/warden")));
        assert_eq!(config.scanner.interval_secs, 1800);
        assert_eq!(config.scanner.batch_pause_secs, 5);
        assert_eq!(config.lifecycle.warning_days, vec![20, 27]);
        assert_eq!(config.lifecycle.suspend_after_days, 7);

        let vt = config.threat_intel.virus_total.as_ref().unwrap();
        assert_eq!(vt.api_key, "vt-key");
        assert_eq!(vt.daily_limit, 400);
        assert_eq!(vt.min_interval_ms, 15_000);
        assert!(config.threat_intel.safe_browsing.is_none());

        assert_eq!(config.powerdns.api_url, "http://10.0.0.5:8081");
        assert!(config.telegram.is_configured());
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_secrets() {
        let env: HashMap<String, String> = [
            ("DOMAIN_WARDEN_POWERDNS_API_KEY", "from-env"),
            ("DOMAIN_WARDEN_SAFE_BROWSING_API_KEY", "sb-env"),
            ("DOMAIN_WARDEN_TELEGRAM_BOT_TOKEN", "999:env"),
            ("DOMAIN_WARDEN_VIRUSTOTAL_API_KEY", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut config = DaemonConfig::parse("[powerdns]\napi_key = \"from-file\"").unwrap();
        config.apply_env_overrides(|key| env.get(key).cloned());

        assert_eq!(config.powerdns.api_key, "from-env");
        assert_eq!(
            config.threat_intel.safe_browsing.as_ref().unwrap().api_key,
            "sb-env"
        );
        assert!(config.threat_intel.virus_total.is_none());
        assert_eq!(config.telegram.bot_token, "999:env");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = DaemonConfig::parse("[scanner]\nbatch_size = 0").unwrap();
        assert!(config.validate().is_err());

        let config =
            DaemonConfig::parse("[lifecycle]\nsuspend_after_days = 30\ndelete_after_days = 7").unwrap();
        assert!(config.validate().is_err());

        let config = DaemonConfig::parse("[lifecycle]\nwarning_days = [3]").unwrap();
        assert!(config.validate().is_err());

        assert!(DaemonConfig::parse("[scanner]\nbatch_size = \"many\"").is_err());
    }

    #[test]
    fn path_resolution_order() {
        let (path, explicit) = resolve_path(Some("a.toml".into()), Some("b.toml".into()));
        assert_eq!(path, PathBuf::from("a.toml"));
        assert!(explicit);

        let (path, explicit) = resolve_path(None, Some("b.toml".into()));
        assert_eq!(path, PathBuf::from("b.toml"));
        assert!(explicit);

        let (path, explicit) = resolve_path(None, None);
        assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!explicit);
    }

    #[test]
    fn load_reads_file_and_requires_explicit_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("warden.toml");
        std::fs::write(&path, "[scanner]\ninterval_secs = 600\n").unwrap();

        let config = DaemonConfig::load(&path, true).unwrap();
        assert_eq!(config.scanner.interval_secs, 600);

        let missing = tmp.path().join("missing.toml");
        assert!(DaemonConfig::load(&missing, true).is_err());
        assert!(DaemonConfig::load(&missing, false).is_ok());
    }
}
