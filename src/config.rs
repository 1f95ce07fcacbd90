//! Environment configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file). Invalid values are logged and replaced by their defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SCALER_PATH: &str = "models/scaler.json";
pub const DEFAULT_MODEL_PATH: &str = "models/model.json";
pub const DEFAULT_LOG_FILE: &str = "wastecast.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Stdout,
    File,
}

/// Logging settings, read before the subscriber is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub mode: LogMode,
    pub file: PathBuf,
    /// Problems found while reading the settings. Logged by the caller once
    /// the subscriber exists.
    pub warnings: Vec<String>,
}

impl LogSettings {
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let mode = match lookup("WASTECAST_LOG_MODE") {
            None => LogMode::Stdout,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "stdout" => LogMode::Stdout,
                "file" => LogMode::File,
                _ => {
                    warnings.push(format!(
                        "Invalid WASTECAST_LOG_MODE value '{raw}', using stdout"
                    ));
                    LogMode::Stdout
                }
            },
        };
        let file = lookup("WASTECAST_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Self {
            mode,
            file,
            warnings,
        }
    }
}

/// Server and artifact configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub scaler_path: PathBuf,
    pub model_path: PathBuf,
    pub require_signed_artifacts: bool,
    /// Base64 Ed25519 public key for the artifact manifest.
    pub artifact_pubkey_b64: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = lookup("PORT")
            .and_then(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| tracing::warn!("Invalid PORT value '{}': {}", s, e))
                    .ok()
            })
            .unwrap_or(DEFAULT_PORT);

        let host: IpAddr = lookup("HOST")
            .and_then(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| tracing::warn!("Invalid HOST value '{}': {}", s, e))
                    .ok()
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let scaler_path = lookup("WASTECAST_SCALER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCALER_PATH));
        let model_path = lookup("WASTECAST_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let require_signed_artifacts = lookup("WASTECAST_REQUIRE_SIGNED_ARTIFACTS")
            .and_then(|v| {
                let parsed = parse_bool(&v);
                if parsed.is_none() {
                    tracing::warn!(
                        "Invalid WASTECAST_REQUIRE_SIGNED_ARTIFACTS value '{}', using false",
                        v
                    );
                }
                parsed
            })
            .unwrap_or(false);

        let artifact_pubkey_b64 = match lookup("WASTECAST_ARTIFACT_PUBKEY_B64_FILE") {
            Some(path) => match std::fs::read_to_string(path.trim()) {
                Ok(content) => Some(content.trim().to_string()),
                Err(e) => {
                    tracing::warn!("Failed reading artifact pubkey file {}: {}", path, e);
                    None
                }
            },
            None => lookup("WASTECAST_ARTIFACT_PUBKEY_B64").map(|v| v.trim().to_string()),
        }
        .filter(|v| !v.is_empty());

        let config = Self {
            bind_addr: SocketAddr::new(host, port),
            scaler_path,
            model_path,
            require_signed_artifacts,
            artifact_pubkey_b64,
        };
        tracing::info!(
            "Configuration loaded: {} (scaler={:?}, model={:?}, require_signed={})",
            config.bind_addr,
            config.scaler_path,
            config.model_path,
            config.require_signed_artifacts
        );
        config
    }
}

/// `None` for anything that is not a recognised boolean.
fn parse_bool(value: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["1", "true", "yes", "on"];
    const FALSE: [&str; 5] = ["", "0", "false", "no", "off"];

    let value = value.trim();
    if TRUE.iter().any(|t| value.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| value.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.scaler_path, PathBuf::from(DEFAULT_SCALER_PATH));
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(!config.require_signed_artifacts);
        assert!(config.artifact_pubkey_b64.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("WASTECAST_SCALER_PATH", "/srv/scaler.json"),
            ("WASTECAST_MODEL_PATH", "/srv/model.json"),
            ("WASTECAST_REQUIRE_SIGNED_ARTIFACTS", "true"),
            ("WASTECAST_ARTIFACT_PUBKEY_B64", " abc= \n"),
        ]));
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.scaler_path, PathBuf::from("/srv/scaler.json"));
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert!(config.require_signed_artifacts);
        assert_eq!(config.artifact_pubkey_b64.as_deref(), Some("abc="));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("HOST", "not-an-ip"),
            ("PORT", "99999"),
            ("WASTECAST_REQUIRE_SIGNED_ARTIFACTS", "maybe"),
        ]));
        assert_eq!(config.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert!(!config.require_signed_artifacts);
    }

    #[test]
    fn test_pubkey_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pubkey.b64");
        std::fs::write(&path, "a2V5\n").expect("write");

        let path_str = path.to_string_lossy().to_string();
        let config = AppConfig::from_lookup(lookup_from(&[
            ("WASTECAST_ARTIFACT_PUBKEY_B64_FILE", path_str.as_str()),
            ("WASTECAST_ARTIFACT_PUBKEY_B64", "ignored"),
        ]));
        assert_eq!(config.artifact_pubkey_b64.as_deref(), Some("a2V5"));
    }

    #[test]
    fn test_log_settings() {
        let settings = LogSettings::from_lookup(lookup_from(&[]));
        assert_eq!(settings.mode, LogMode::Stdout);
        assert_eq!(settings.file, PathBuf::from(DEFAULT_LOG_FILE));

        let settings = LogSettings::from_lookup(lookup_from(&[
            ("WASTECAST_LOG_MODE", "file"),
            ("WASTECAST_LOG_FILE", "/var/log/wastecast.log"),
        ]));
        assert_eq!(settings.mode, LogMode::File);
        assert_eq!(settings.file, PathBuf::from("/var/log/wastecast.log"));
        assert!(settings.warnings.is_empty());

        let settings = LogSettings::from_lookup(lookup_from(&[("WASTECAST_LOG_MODE", "FILE")]));
        assert_eq!(settings.mode, LogMode::File);
    }

    #[test]
    fn test_invalid_log_mode_is_reported() {
        let settings = LogSettings::from_lookup(lookup_from(&[("WASTECAST_LOG_MODE", "syslog")]));
        assert_eq!(settings.mode, LogMode::Stdout);
        assert_eq!(settings.warnings.len(), 1);
        assert!(settings.warnings[0].contains("syslog"));
    }

    #[test]
    fn test_parse_bool() {
        for v in ["1", "true", "True", "TRUE", "yes", "On", " on \n"] {
            assert_eq!(parse_bool(v), Some(true), "{v:?}");
        }
        for v in ["", "0", "false", "False", "NO", "off"] {
            assert_eq!(parse_bool(v), Some(false), "{v:?}");
        }
        for v in ["maybe", "2", "enabled"] {
            assert_eq!(parse_bool(v), None, "{v:?}");
        }
    }

    #[test]
    fn test_require_signed_is_case_insensitive() {
        for v in ["True", "on", "YES"] {
            let config =
                AppConfig::from_lookup(lookup_from(&[("WASTECAST_REQUIRE_SIGNED_ARTIFACTS", v)]));
            assert!(config.require_signed_artifacts, "{v:?}");
        }
    }
}
