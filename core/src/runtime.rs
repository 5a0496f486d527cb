use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

use crate::registry::BridgeRecord;

// Every tool is asked for indented JSON
pub const INDENT_FLAG: &str = "--indent=2";

// 1. The Invocation
// Program plus a discrete argument vector. Built per request, dropped once the
// process exits. No shell is involved, so the query value is one literal argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    // A present but empty value counts as absent
    pub fn for_bridge(bridge: &BridgeRecord, value: Option<&str>) -> Self {
        let mut args = bridge.program_args.clone();
        args.push(INDENT_FLAG.to_string());

        if let Some(v) = value.filter(|v| !v.is_empty()) {
            args.push(format!("--{}={}", bridge.param, v));
        }

        Self { program: bridge.program.clone(), args }
    }
}

// 2. What came back from the tool
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

// 3. The Runtime
// Shared by all requests; holds nothing mutable.
#[derive(Debug, Clone, Default)]
pub struct Runtime;

impl Runtime {
    pub fn new() -> Self {
        Self
    }

    // Runs the tool to completion. Only a failure to spawn is an error;
    // exit status and stderr are handed back for the caller to judge.
    pub async fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null());

        debug!("Spawning {} {:?}", invocation.program.display(), invocation.args);

        let output = command
            .output()
            .await
            .with_context(|| format!("Failed to run tool '{}'", invocation.program.display()))?;

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    // A bridge whose "tool" is a shell one-liner
    fn sh_bridge(param: &str, script: &str) -> BridgeRecord {
        BridgeRecord {
            name: "test".to_string(),
            route: "test".to_string(),
            param: param.to_string(),
            program: PathBuf::from("sh"),
            program_args: vec!["-c".to_string(), script.to_string(), "tool".to_string()],
            page: PathBuf::from("unused.html"),
        }
    }

    #[test]
    fn absent_value_yields_only_indent() {
        let bridge = BridgeRecord::udevadm(Path::new("../.."));
        let invocation = Invocation::for_bridge(&bridge, None);

        assert_eq!(invocation.program, PathBuf::from("../../tools/query-udevadm.py"));
        assert_eq!(invocation.args, vec!["--indent=2"]);
    }

    #[test]
    fn empty_value_is_treated_as_absent() {
        let bridge = BridgeRecord::screen(Path::new("../.."));
        let invocation = Invocation::for_bridge(&bridge, Some(""));
        assert_eq!(invocation.args, vec!["--indent=2"]);
    }

    #[test]
    fn value_becomes_named_flag() {
        let bridge = BridgeRecord::screen(Path::new("../.."));
        let invocation = Invocation::for_bridge(&bridge, Some("alice"));
        assert_eq!(invocation.args, vec!["--indent=2", "--user=alice"]);
    }

    #[test]
    fn leading_program_args_come_first() {
        let mut bridge = BridgeRecord::screen(Path::new("/opt/companion"));
        bridge.program = PathBuf::from("python3");
        bridge.program_args = vec!["/opt/companion/tools/query-screen.py".to_string()];

        let invocation = Invocation::for_bridge(&bridge, Some("pi"));
        assert_eq!(
            invocation.args,
            vec!["/opt/companion/tools/query-screen.py", "--indent=2", "--user=pi"]
        );
    }

    #[tokio::test]
    async fn run_captures_stdout_bytes_exactly() {
        let bridge = sh_bridge("user", r#"printf '{"screens":[]}'"#);
        let output = Runtime::new()
            .run(&Invocation::for_bridge(&bridge, Some("alice")))
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, br#"{"screens":[]}"#);
    }

    #[tokio::test]
    async fn run_passes_arguments_without_shell_expansion() {
        let bridge = sh_bridge("pattern", r#"printf '%s\n' "$@""#);
        let output = Runtime::new()
            .run(&Invocation::for_bridge(&bridge, Some("/dev/*; rm -rf $HOME")))
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "--indent=2\n--pattern=/dev/*; rm -rf $HOME\n"
        );
    }

    #[tokio::test]
    async fn run_reports_nonzero_exit_with_stderr() {
        let bridge = sh_bridge("user", "echo 'privileges required' >&2; exit 1");
        let output = Runtime::new()
            .run(&Invocation::for_bridge(&bridge, None))
            .await
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());
        assert_eq!(output.stderr, b"privileges required\n");
    }

    #[tokio::test]
    async fn run_missing_program_is_an_error() {
        let invocation = Invocation {
            program: PathBuf::from("/nonexistent/tools/query-screen.py"),
            args: vec![INDENT_FLAG.to_string()],
        };

        let err = Runtime::new().run(&invocation).await.unwrap_err();
        assert!(err.to_string().contains("Failed to run tool"));
    }
}
