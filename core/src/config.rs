use std::path::PathBuf;
use std::str::FromStr;
use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::registry::{BridgeRecord, Registry};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 2770;
pub const DEFAULT_COMPANION_DIR: &str = "../..";

// How a failed tool run reaches the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    // 200 with whatever stdout exists, failure or not
    #[default]
    Passthrough,
    // 502 with exit status and stderr
    Report,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passthrough" => Ok(Self::Passthrough),
            "report" => Ok(Self::Report),
            other => Err(anyhow!("Unknown failure policy '{}' (expected passthrough or report)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    pub companion_dir: PathBuf,
    pub registry_path: Option<PathBuf>,
    pub failure_policy: FailurePolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            companion_dir: PathBuf::from(DEFAULT_COMPANION_DIR),
            registry_path: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("BRIDGE_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("BRIDGE_PORT") {
            config.port = port.parse()
                .with_context(|| format!("BRIDGE_PORT must be a port number, got '{}'", port))?;
        }
        if let Some(dir) = lookup("COMPANION_DIR") {
            config.companion_dir = PathBuf::from(dir);
        }
        config.registry_path = lookup("BRIDGE_REGISTRY").map(PathBuf::from);
        if let Some(policy) = lookup("BRIDGE_FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    // Registry file when configured, built-in bridges otherwise
    pub async fn bridges(&self) -> Result<Vec<BridgeRecord>> {
        match &self.registry_path {
            Some(path) => {
                info!("Loading bridge registry from {}", path.display());
                Registry::load(path).await
            }
            None => Ok(Registry::builtin(&self.companion_dir)),
        }
    }
}
