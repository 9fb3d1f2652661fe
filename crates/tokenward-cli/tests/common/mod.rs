use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Isolated credential directories for one test.
pub struct Dirs {
    _root: TempDir,
    pub data: PathBuf,
    pub runtime: PathBuf,
}

impl Dirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let data = root.path().join("data");
        let runtime = root.path().join("runtime");
        Self {
            _root: root,
            data,
            runtime,
        }
    }

    pub fn data_file(&self) -> PathBuf {
        self.data.join("credentials.json")
    }

    pub fn runtime_file(&self) -> PathBuf {
        self.runtime.join("credentials.json")
    }
}

/// Run the CLI binary against `api_url` with isolated storage.
pub fn run_cli(args: &[&str], dirs: &Dirs, api_url: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tokenward"));
    cmd.args(args);
    cmd.env("TOKENWARD_API_URL", api_url);
    cmd.env("TOKENWARD_DATA_DIR", &dirs.data);
    cmd.env("TOKENWARD_RUNTIME_DIR", &dirs.runtime);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("TOKENWARD_PASSWORD");
    cmd.env_remove("TOKENWARD_TRAILING_SLASHES");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success.
pub fn run_cli_success(args: &[&str], dirs: &Dirs, api_url: &str) -> String {
    let output = run_cli(args, dirs, api_url);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str], dirs: &Dirs, api_url: &str) -> String {
    let output = run_cli(args, dirs, api_url);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn read_file(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
