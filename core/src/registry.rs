use serde::Deserialize;
use std::path::{Path, PathBuf};
use anyhow::{anyhow, Context, Result};
use tokio::fs;

// One bridge: which route answers, which query parameter it forwards,
// and which tool it runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BridgeRecord {
    pub name: String,
    pub route: String,   // Endpoint path segment, e.g. "screen"
    pub param: String,   // Query parameter and flag name, e.g. "user"
    pub program: PathBuf,

    // Arguments placed before --indent (an interpreter's script path, for instance)
    #[serde(default)]
    pub program_args: Vec<String>,

    pub page: PathBuf,   // Static HTML served at "/"
}

impl BridgeRecord {
    pub fn screen(companion_dir: &Path) -> Self {
        Self {
            name: "screen".to_string(),
            route: "screen".to_string(),
            param: "user".to_string(),
            program: companion_dir.join("tools").join("query-screen.py"),
            program_args: Vec::new(),
            page: PathBuf::from("pages/query-screen.html"),
        }
    }

    pub fn udevadm(companion_dir: &Path) -> Self {
        Self {
            name: "udevadm".to_string(),
            route: "udevadm".to_string(),
            param: "pattern".to_string(),
            program: companion_dir.join("tools").join("query-udevadm.py"),
            program_args: Vec::new(),
            page: PathBuf::from("pages/query-udevadm.html"),
        }
    }

    // The route must be one plain path segment: no axum captures or wildcards
    pub fn validate(&self) -> Result<()> {
        let plain = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if self.route.is_empty() || !self.route.chars().all(plain) {
            return Err(anyhow!("Bridge '{}' has invalid route '{}'", self.name, self.route));
        }
        if self.param.is_empty() {
            return Err(anyhow!("Bridge '{}' has no query parameter name", self.name));
        }
        Ok(())
    }
}

pub struct Registry;

impl Registry {
    pub fn builtin(companion_dir: &Path) -> Vec<BridgeRecord> {
        vec![
            BridgeRecord::screen(companion_dir),
            BridgeRecord::udevadm(companion_dir),
        ]
    }

    // Reads a JSON array of bridge records
    pub async fn load(path: &Path) -> Result<Vec<BridgeRecord>> {
        // 1. Read the JSON file
        let content = fs::read_to_string(path).await
            .with_context(|| format!("Failed to read registry at '{}'", path.display()))?;

        // 2. Parse it
        let bridges: Vec<BridgeRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid registry at '{}'", path.display()))?;

        // 3. Sanity check, missing files are only reported
        for bridge in &bridges {
            if !bridge.program.exists() {
                tracing::warn!("Bridge '{}' registered but tool not found at: {}", bridge.name, bridge.program.display());
            }
            if !bridge.page.exists() {
                tracing::warn!("Bridge '{}' registered but page not found at: {}", bridge.name, bridge.page.display());
            }
        }

        Ok(bridges)
    }

    pub fn find(bridges: Vec<BridgeRecord>, name: &str) -> Result<BridgeRecord> {
        let known: Vec<String> = bridges.iter().map(|b| b.name.clone()).collect();
        bridges
            .into_iter()
            .find(|b| b.name == name)
            .ok_or_else(|| anyhow!("No bridge named '{}' (known: {})", name, known.join(", ")))
    }
}
