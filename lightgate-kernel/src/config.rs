use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GateConfig {
    pub http: HttpConf,
    pub serial: SerialConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConf {
    pub bind: String,
    pub port: u16,
    pub static_dir: PathBuf, // index.html + authenticated.html
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SerialConf {
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
    pub signatures: Vec<String>, // substrings of the port description, case-sensitive
}

impl Default for HttpConf {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 5000,
            static_dir: PathBuf::from("."),
        }
    }
}

impl Default for SerialConf {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_ms: 2000,
            poll_interval_ms: 200,
            signatures: vec!["Arduino".into(), "CH340".into()],
        }
    }
}

impl HttpConf {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {addr}: {e}"))
    }
}

impl SerialConf {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Delay after opening the port; the board resets when DTR toggles.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Parses a YAML document; empty text means defaults.
pub fn parse_config(txt: &str) -> Result<GateConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(GateConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> GateConfig {
    let path = std::env::var("LIGHTGATE_CONFIG").unwrap_or_else(|_| "lightgate.yaml".into());
    load_config_from(&path).await
}

pub async fn load_config_from(path: impl AsRef<Path>) -> GateConfig {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "no config file, using defaults");
        return GateConfig::default();
    }
    let txt = match fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
            return GateConfig::default();
        }
    };
    parse_config(&txt).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "invalid config, using defaults");
        GateConfig::default()
    })
}
