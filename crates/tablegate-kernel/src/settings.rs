//! Gateway settings.
//!
//! Settings are layered with the `config` crate, later sources overriding
//! earlier ones:
//!
//! 1. built-in defaults ([`GatewaySettings::default`])
//! 2. an optional file, format detected from its extension
//! 3. environment variables prefixed `TABLEGATE__`, using `__` as the nesting
//!    separator (`TABLEGATE__REMOTE__API_KEY` → `remote.api_key`)
//!
//! `cache_expiry_secs` and the whole [`CoordinatorSettings`] block are
//! accepted and carried but nothing reads them: the gateway has no cache
//! and no cluster coordination.

use crate::error::SettingsError;
use config::{Config as Cfg, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Environment prefix for overrides.
pub const ENV_PREFIX: &str = "TABLEGATE";

// ─────────────────────────────────────────────────────────────────────────────
// Settings types
// ─────────────────────────────────────────────────────────────────────────────

/// Remote record service connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// API root; base and table segments are appended to it.
    pub base_url: String,
    /// Bearer token sent on every outbound call.
    pub api_key: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.airtable.com/v0".to_string(),
            api_key: String::new(),
        }
    }
}

/// Cluster coordination endpoint.  Loaded, never dialled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    pub endpoints: Vec<String>,
    pub dial_timeout_ms: u64,
    pub username: String,
    pub password: String,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            endpoints: vec!["localhost:2379".to_string()],
            dial_timeout_ms: 5_000,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Which [`RecordBackend`](crate::backend::RecordBackend) the binary serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote Airtable-style REST API.
    #[default]
    Airtable,
    /// Process-local tables, nothing persisted.
    Memory,
}

/// Top-level gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
    /// Per-call deadline applied to every backend call; `0` disables it.
    pub request_timeout_ms: u64,
    pub cache_expiry_secs: u64,
    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,
    pub backend: BackendKind,
    pub remote: RemoteSettings,
    pub coordinator: CoordinatorSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_ms: 30_000,
            cache_expiry_secs: 0,
            log_json: false,
            backend: BackendKind::Airtable,
            remote: RemoteSettings::default(),
            coordinator: CoordinatorSettings::default(),
        }
    }
}

impl GatewaySettings {
    /// Load settings from defaults, an optional file and the process
    /// environment.
    pub fn load(path: Option<&str>) -> Result<Self, SettingsError> {
        Self::from_sources(path, None)
    }

    /// Like [`load`](Self::load), but reads overrides from `env` instead of
    /// the process environment when given.
    pub fn from_sources(
        path: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        // Missing keys fall back through `#[serde(default)]`.
        let mut builder = Cfg::builder();

        if let Some(path) = path {
            let format = detect_format(path)?;
            let content = std::fs::read_to_string(path)?;
            builder = builder.add_source(File::from_str(&content, format));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder
            .build()
            .map_err(|e| SettingsError::Parse(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SettingsError::Parse(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Structural checks run after loading.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "host".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        let base_url = &self.remote.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SettingsError::Invalid {
                key: "remote.base_url".to_string(),
                reason: format!("'{base_url}' must start with http:// or https://"),
            });
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Detect a settings file format from its extension.
pub fn detect_format(path: &str) -> Result<FileFormat, SettingsError> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| SettingsError::UnsupportedFormat("no file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(SettingsError::UnsupportedFormat(ext.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_load_without_sources() {
        let settings = GatewaySettings::from_sources(None, env(&[])).unwrap();
        assert_eq!(settings, GatewaySettings::default());
        assert_eq!(settings.listen_addr(), "0.0.0.0:8080");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.toml");
        fs::write(
            &path,
            r#"
port = 9090
cache_expiry_secs = 60

[remote]
api_key = "pat-from-file"

[coordinator]
endpoints = ["etcd-1:2379", "etcd-2:2379"]
"#,
        )
        .unwrap();

        let settings =
            GatewaySettings::from_sources(Some(path.to_str().unwrap()), env(&[])).unwrap();
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.cache_expiry_secs, 60);
        assert_eq!(settings.remote.api_key, "pat-from-file");
        assert_eq!(settings.remote.base_url, "https://api.airtable.com/v0");
        assert_eq!(settings.coordinator.endpoints.len(), 2);
        assert_eq!(settings.coordinator.dial_timeout_ms, 5_000);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gateway.yaml");
        fs::write(&path, "port: 9090\nremote:\n  api_key: from-file\n").unwrap();

        let settings = GatewaySettings::from_sources(
            Some(path.to_str().unwrap()),
            env(&[
                ("TABLEGATE__PORT", "7070"),
                ("TABLEGATE__BACKEND", "memory"),
                ("TABLEGATE__REMOTE__API_KEY", "from-env"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.port, 7070);
        assert_eq!(settings.backend, BackendKind::Memory);
        assert_eq!(settings.remote.api_key, "from-env");
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let result = GatewaySettings::from_sources(
            None,
            env(&[("TABLEGATE__REMOTE__BASE_URL", "ftp://example.com")]),
        );
        assert!(matches!(result, Err(SettingsError::Invalid { ref key, .. }) if key == "remote.base_url"));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            detect_format("settings.ini"),
            Err(SettingsError::UnsupportedFormat(_))
        ));
        assert!(matches!(detect_format("settings.yml"), Ok(FileFormat::Yaml)));
    }
}
