use std::{env, fmt, fs, io, path, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracer::{HttpPinger, Pinger, TcpPinger, TracerConfig, config::DEFAULT_REFRESH_RATE};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to write config {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config path available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
    #[error("duplicate endpoint id: {0}")]
    DuplicateEndpoint(String),
    #[error("tracer refresh_rate_ms must be greater than 0")]
    ZeroRefreshRate,
    #[error(
        "endpoint {id}: timeout_ms ({timeout_ms}) must be lower than refresh_rate_ms \
         ({refresh_rate_ms}), otherwise its probes are canceled before they report"
    )]
    TimeoutExceedsRefreshRate { id: String, timeout_ms: u64, refresh_rate_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracer: Tracer,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracer {
    pub refresh_rate_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Tcp,
    Http,
}

/// One traced endpoint: `target` is `host:port` for tcp and a URL for http
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub kind: EndpointKind,
    pub target: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2000
}

impl Endpoint {
    /// Build the pinger tracing this endpoint
    pub fn pinger(&self) -> anyhow::Result<Arc<dyn Pinger>> {
        let timeout = Duration::from_millis(self.timeout_ms);
        let pinger: Arc<dyn Pinger> = match self.kind {
            EndpointKind::Tcp => Arc::new(TcpPinger::new(&self.id, &self.target, timeout)),
            EndpointKind::Http => Arc::new(HttpPinger::new(&self.id, &self.target, timeout)?),
        };
        Ok(pinger)
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/tracer/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("tracer/config.toml"))
}

impl Default for Tracer {
    fn default() -> Self {
        Self { refresh_rate_ms: DEFAULT_REFRESH_RATE.as_millis() as u64 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracer: Tracer::default(),
            endpoints: vec![Endpoint {
                id: "example".into(),
                kind: EndpointKind::Http,
                target: "https://example.com".into(),
                timeout_ms: default_timeout_ms(),
            }],
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointKind::Tcp => write!(f, "tcp"),
            EndpointKind::Http => write!(f, "http"),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_title_2 = write_title_indented(2);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Tracer")?;
        write_1(f, "Refresh Rate (ms)", &self.tracer.refresh_rate_ms)?;
        write_title_1(f, "Endpoints")?;
        for endpoint in &self.endpoints {
            write_title_2(f, &endpoint.id)?;
            write_2(f, "Kind", &endpoint.kind)?;
            write_2(f, "Target", &endpoint.target)?;
            write_2(f, "Timeout (ms)", &endpoint.timeout_ms)?;
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/tracer/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
            let config: Self = toml::from_str(raw_string.as_str())?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;
        let write_failed =
            |source: io::Error| Error::WriteFailed { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }

        fs::write(path, config_str).map_err(write_failed)
    }

    /// Check the settings the tracer cannot work with.
    ///
    /// A probe still running when the next batch starts is dropped, so every
    /// endpoint must time out within one refresh. Tracing the same id twice
    /// would silently drop the first endpoint.
    pub fn validate(&self) -> Result<(), Error> {
        let refresh_rate_ms = self.tracer.refresh_rate_ms;
        if refresh_rate_ms == 0 {
            return Err(Error::ZeroRefreshRate);
        }

        let mut seen = std::collections::HashSet::new();
        for endpoint in &self.endpoints {
            if !seen.insert(endpoint.id.as_str()) {
                return Err(Error::DuplicateEndpoint(endpoint.id.clone()));
            }
            if endpoint.timeout_ms >= refresh_rate_ms {
                return Err(Error::TimeoutExceedsRefreshRate {
                    id: endpoint.id.clone(),
                    timeout_ms: endpoint.timeout_ms,
                    refresh_rate_ms,
                });
            }
        }
        Ok(())
    }

    pub fn tracer_config(&self) -> TracerConfig {
        TracerConfig::builder()
            .refresh_rate(Duration::from_millis(self.tracer.refresh_rate_ms))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_is_written_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(Config::from_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_extension_is_normalized() {
        let expected = path::PathBuf::from("a/config.toml");

        assert_eq!(normalize_toml_path(path::Path::new("a/config")), expected);
        assert_eq!(normalize_toml_path(path::Path::new("a/config.json")), expected);
        assert_eq!(normalize_toml_path(path::Path::new("a/config.toml")), expected);
    }

    #[test]
    fn test_parse_endpoints() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[tracer]
refresh_rate_ms = 2500

[[endpoints]]
id = "db"
kind = "tcp"
target = "127.0.0.1:5432"

[[endpoints]]
id = "site"
kind = "http"
target = "https://example.com/health"
timeout_ms = 500
"#,
        )
        .unwrap();

        let config = Config::from_config(Some(&path)).unwrap();

        assert_eq!(config.tracer_config().refresh_rate, Duration::from_millis(2500));
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].kind, EndpointKind::Tcp);
        assert_eq!(config.endpoints[0].timeout_ms, 2000);
        assert_eq!(config.endpoints[1].timeout_ms, 500);

        let pinger = config.endpoints[1].pinger().unwrap();
        assert_eq!(pinger.id(), "site");
        assert_eq!(pinger.addr().to_string(), "https://example.com:443");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.tracer, Tracer::default());
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let endpoint = Endpoint {
            id: "dup".into(),
            kind: EndpointKind::Tcp,
            target: "127.0.0.1:1".into(),
            timeout_ms: 10,
        };
        let config =
            Config { tracer: Tracer::default(), endpoints: vec![endpoint.clone(), endpoint] };
        config.write_config(&path).unwrap();

        assert!(matches!(
            Config::from_config(Some(&path)),
            Err(Error::DuplicateEndpoint(id)) if id == "dup"
        ));
    }

    fn write_raw(dir: &tempfile::TempDir, raw: &str) -> path::PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, raw).unwrap();
        path
    }

    #[test]
    fn test_zero_refresh_rate_rejected() {
        let dir = tempdir().unwrap();
        let path = write_raw(&dir, "[tracer]\nrefresh_rate_ms = 0\n");

        assert!(matches!(Config::from_config(Some(&path)), Err(Error::ZeroRefreshRate)));
    }

    #[test]
    fn test_timeout_not_below_refresh_rate_rejected() {
        let dir = tempdir().unwrap();
        let path = write_raw(
            &dir,
            r#"
[tracer]
refresh_rate_ms = 1000

[[endpoints]]
id = "slow"
kind = "tcp"
target = "10.255.255.1:80"
timeout_ms = 1000
"#,
        );

        let err = Config::from_config(Some(&path)).unwrap_err();
        assert!(matches!(
            err,
            Error::TimeoutExceedsRefreshRate { ref id, timeout_ms: 1000, refresh_rate_ms: 1000 }
                if id == "slow"
        ));
    }

    #[test]
    fn test_refresh_override_is_validated() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Default endpoint times out after 2000ms
        config.tracer.refresh_rate_ms = 2000;
        assert!(matches!(config.validate(), Err(Error::TimeoutExceedsRefreshRate { .. })));

        config.tracer.refresh_rate_ms = 0;
        assert!(matches!(config.validate(), Err(Error::ZeroRefreshRate)));

        config.tracer.refresh_rate_ms = 2001;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_http_target() {
        let endpoint = Endpoint {
            id: "bad".into(),
            kind: EndpointKind::Http,
            target: "not a url".into(),
            timeout_ms: 10,
        };

        assert!(endpoint.pinger().is_err());
    }

    #[test]
    fn test_display_lists_endpoints() {
        let shown = Config::default().to_string();

        assert!(shown.contains("Refresh Rate (ms): 4000"));
        assert!(shown.contains("Target: https://example.com"));
    }
}
