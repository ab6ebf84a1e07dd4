//! CLI configuration.
//!
//! Settings come from built-in defaults, then the TOML file in the platform
//! config directory, then `HOSTWATCH_*` environment variables. Global flags
//! override the merged result when the session is resolved.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use hostwatch_core::{ControllerConfig, ReconnectConfig, StatusFilter, TlsMode};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

const ENV_PREFIX: &str = "HOSTWATCH_";

// ── Settings ────────────────────────────────────────────────────────

/// Merged configuration file + environment settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Registry base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Seconds between snapshot reloads in `watch`. Zero disables them.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// First reconnect delay of the status stream.
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    /// Reconnect delay cap.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub insecure: bool,
    /// Extra CA certificate (PEM) trusted for the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: None,
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            output: default_output(),
            color: default_color(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_reconnect_base_ms() -> u64 {
    3_000
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

fn default_output() -> String {
    "table".into()
}

fn default_color() -> String {
    "auto".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "hostwatch", "hostwatch").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("hostwatch");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the default config file and the environment.
pub fn load_settings() -> Result<Settings, CliError> {
    load_settings_from(&config_path())
}

/// Load settings from `path` (missing files are skipped) and the environment.
pub fn load_settings_from(path: &Path) -> Result<Settings, CliError> {
    let settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(settings)
}

// ── Resolution ──────────────────────────────────────────────────────

/// Everything a command needs after flags and settings are merged.
#[derive(Debug, Clone)]
pub struct Session {
    pub controller: ControllerConfig,
    pub output: OutputFormat,
    pub color: ColorMode,
}

/// Output format and color mode, which don't need a server.
pub fn resolve_presentation(
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(OutputFormat, ColorMode), CliError> {
    let output = match global.output {
        Some(output) => output,
        None => parse_value_enum("output", &settings.output)?,
    };
    let color = match global.color {
        Some(color) => color,
        None => parse_value_enum("color", &settings.color)?,
    };
    Ok((output, color))
}

/// Translate settings + global flags into a session.
///
/// CLI flags take priority over environment and file values.
pub fn resolve_session(
    settings: &Settings,
    global: &GlobalOpts,
    filter: StatusFilter,
) -> Result<Session, CliError> {
    let (output, color) = resolve_presentation(settings, global)?;

    let server = global
        .server
        .as_deref()
        .or(settings.server.as_deref())
        .ok_or_else(|| CliError::NoServer {
            path: config_path().display().to_string(),
        })?;
    let url: url::Url = server.parse().map_err(|_| CliError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::Validation {
            field: "server".into(),
            reason: format!("expected an http(s) URL, got '{server}'"),
        });
    }

    let timeout = global.timeout.unwrap_or(settings.timeout);
    if timeout == 0 {
        return Err(CliError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }
    if settings.reconnect_base_ms == 0 {
        return Err(CliError::Validation {
            field: "reconnect_base_ms".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let ca_cert = global.ca_cert.as_ref().or(settings.ca_cert.as_ref());
    let tls = if global.insecure || settings.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(path) = ca_cert {
        TlsMode::CustomCa(path.clone())
    } else {
        TlsMode::System
    };

    let mut controller = ControllerConfig::new(url);
    controller.tls = tls;
    controller.timeout = Duration::from_secs(timeout);
    controller.refresh_interval = Duration::from_secs(settings.refresh_interval);
    controller.reconnect = ReconnectConfig {
        initial_delay: Duration::from_millis(settings.reconnect_base_ms),
        max_delay: Duration::from_millis(settings.reconnect_max_ms),
    };
    controller.filter = filter;

    Ok(Session {
        controller,
        output,
        color,
    })
}

fn parse_value_enum<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use hostwatch_core::HostStatus;
    use pretty_assertions::assert_eq;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["hostwatch"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["config", "path"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("/nonexistent/hostwatch/config.toml"))
            .extract::<Settings>()
            .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::string(
                "server = \"http://registry:8000\"\nrefresh_interval = 15\noutput = \"yaml\"",
            ))
            .extract()
            .unwrap();
        assert_eq!(settings.server.as_deref(), Some("http://registry:8000"));
        assert_eq!(settings.refresh_interval, 15);
        assert_eq!(settings.timeout, 30);
        assert_eq!(settings.output, "yaml");
    }

    #[test]
    fn flags_override_settings() {
        let settings = Settings {
            server: Some("http://from-file:8000".into()),
            output: "yaml".into(),
            ..Settings::default()
        };
        let global = global(&[
            "--server",
            "http://from-flag:9000",
            "-o",
            "json",
            "--timeout",
            "5",
            "-k",
        ]);

        let session =
            resolve_session(&settings, &global, StatusFilter::only(HostStatus::Active)).unwrap();
        assert_eq!(session.controller.url.as_str(), "http://from-flag:9000/");
        assert_eq!(session.controller.timeout, Duration::from_secs(5));
        assert_eq!(session.controller.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(session.controller.filter, StatusFilter::only(HostStatus::Active));
        assert_eq!(session.output, OutputFormat::Json);
    }

    #[test]
    fn settings_fill_in_missing_flags() {
        let settings = Settings {
            server: Some("http://registry:8000".into()),
            refresh_interval: 0,
            reconnect_base_ms: 250,
            reconnect_max_ms: 1_000,
            output: "json-compact".into(),
            color: "never".into(),
            ..Settings::default()
        };
        let session = resolve_session(&settings, &global(&[]), StatusFilter::ALL).unwrap();
        assert!(session.controller.refresh_interval.is_zero());
        assert_eq!(
            session.controller.reconnect.initial_delay,
            Duration::from_millis(250)
        );
        assert_eq!(session.controller.reconnect.max_delay, Duration::from_secs(1));
        assert_eq!(session.output, OutputFormat::JsonCompact);
        assert_eq!(session.color, ColorMode::Never);
    }

    #[test]
    fn ca_cert_selects_custom_trust() {
        let settings = Settings {
            server: Some("https://registry:8443".into()),
            ca_cert: Some(PathBuf::from("/etc/hostwatch/file-ca.pem")),
            ..Settings::default()
        };
        let session = resolve_session(&settings, &global(&[]), StatusFilter::ALL).unwrap();
        assert_eq!(
            session.controller.tls,
            TlsMode::CustomCa(PathBuf::from("/etc/hostwatch/file-ca.pem"))
        );

        let flagged = global(&["--ca-cert", "/tmp/flag-ca.pem"]);
        let session = resolve_session(&settings, &flagged, StatusFilter::ALL).unwrap();
        assert_eq!(
            session.controller.tls,
            TlsMode::CustomCa(PathBuf::from("/tmp/flag-ca.pem"))
        );

        let insecure = global(&["-k", "--ca-cert", "/tmp/flag-ca.pem"]);
        let session = resolve_session(&settings, &insecure, StatusFilter::ALL).unwrap();
        assert_eq!(session.controller.tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn missing_server_is_reported() {
        let err = resolve_session(&Settings::default(), &global(&[]), StatusFilter::ALL)
            .unwrap_err();
        assert!(matches!(err, CliError::NoServer { .. }), "{err:?}");
    }

    #[test]
    fn non_http_server_is_rejected() {
        let settings = Settings {
            server: Some("ftp://registry".into()),
            ..Settings::default()
        };
        let err = resolve_session(&settings, &global(&[]), StatusFilter::ALL).unwrap_err();
        assert!(
            matches!(err, CliError::Validation { ref field, .. } if field == "server"),
            "{err:?}"
        );
    }

    #[test]
    fn bad_output_setting_is_rejected() {
        let settings = Settings {
            output: "xml".into(),
            ..Settings::default()
        };
        let err = resolve_presentation(&settings, &global(&[])).unwrap_err();
        assert!(
            matches!(err, CliError::Validation { ref field, .. } if field == "output"),
            "{err:?}"
        );
    }
}
