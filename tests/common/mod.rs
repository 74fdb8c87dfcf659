//! Common test utilities for rust-sqlsync tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub dir: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Copy a fixture script into the temp directory and return its path
    pub fn with_fixture(fixture_name: &str) -> (Self, PathBuf) {
        let ctx = Self::new();
        let path = ctx.dir.join(fixture_name);
        fs::copy(fixture_path(fixture_name), &path).expect("Failed to copy fixture");
        (ctx, path)
    }

    /// Write a script into the temp directory and return its path
    pub fn write_script(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, content).expect("Failed to write script");
        path
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.dir.join(relative)).expect("Failed to read output")
    }

    /// Install a stand-in SqlPackage executable that copies `script` to the
    /// `/OutputPath:` it is given and exits with `exit_code`.
    #[cfg(unix)]
    pub fn fake_sqlpackage(&self, script: &Path, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.join("fake-sqlpackage");
        let body = format!(
            r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    /OutputPath:*) cp "{script}" "${{arg#/OutputPath:}}" ;;
    /TargetFile:*) : > "${{arg#/TargetFile:}}" ;;
  esac
done
if [ {code} -ne 0 ]; then
  echo "*** Could not deploy package." >&2
fi
exit {code}
"#,
            script = script.display(),
            code = exit_code
        );
        fs::write(&path, body).expect("Failed to write fake sqlpackage");
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("Failed to read fixture")
}

/// Names of the objects each `CREATE` header in `script` defines, in order
pub fn created_names(script: &str) -> Vec<String> {
    script
        .lines()
        .filter_map(|line| {
            let rest = line
                .strip_prefix("CREATE PROCEDURE ")
                .or_else(|| line.strip_prefix("CREATE FUNCTION "))?;
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(')
                .unwrap_or(rest.len());
            Some(rest[..end].to_string())
        })
        .collect()
}

/// Names of the objects each generated `DROP ... IF EXISTS` line removes, in order
pub fn dropped_names(script: &str) -> Vec<String> {
    script
        .lines()
        .filter_map(|line| {
            let rest = line
                .strip_prefix("DROP PROCEDURE IF EXISTS ")
                .or_else(|| line.strip_prefix("DROP FUNCTION IF EXISTS "))
                .or_else(|| line.strip_prefix("DROP TABLE IF EXISTS "))?;
            Some(rest.trim_end_matches(';').to_string())
        })
        .collect()
}
