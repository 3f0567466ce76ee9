#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::process::{Command, Stdio};

use modpack_lib::Config;
use tempfile::TempDir;

/// A throwaway project directory
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parent directories
    pub fn file(&self, path: &str, content: &str) -> &Self {
        let full = self.root().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
        self
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.root().join(path)).unwrap()
    }

    pub fn path(&self, path: &str) -> PathBuf {
        self.root().join(path)
    }

    /// Config with a single `main` entry
    pub fn config(&self, entry: &str) -> Config {
        Config::with_entry(self.root(), entry)
    }

    /// Write `modpack.toml` and load it back
    pub fn load_config(&self, toml: &str) -> Config {
        self.file("modpack.toml", toml);
        Config::load(self.path("modpack.toml")).unwrap()
    }
}

/// Execute a script with node, or `None` when node is not installed
pub fn run_node(script: &str) -> Option<String> {
    let available = Command::new("node")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("node not found, skipping runtime check");
        return None;
    }

    // Feed the script on stdin: `node -e` exposes builtin modules (e.g. `util`)
    // as globals, which would mask what the script itself defines.
    let mut child = Command::new("node")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Some(String::from_utf8(output.stdout).unwrap())
}
