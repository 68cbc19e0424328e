//! Path resolution for configuration and telemetry files

use std::path::{Path, PathBuf};

/// Overrides the home directory (used by tests and packaged deployments)
pub const HOME_ENV: &str = "HYBRIDAI_HOME";

/// Resolves standard paths under the hybridai home directory
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// `$HYBRIDAI_HOME` if set, otherwise `~/.hybridai`
    pub fn new() -> std::io::Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(root)));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::at(home.join(".hybridai")))
    }

    pub fn at(home: impl AsRef<Path>) -> Self {
        Self {
            home: home.as_ref().to_path_buf(),
        }
    }

    /// hybridai.json
    pub fn config_file(&self) -> PathBuf {
        self.home.join("hybridai.json")
    }

    pub fn telemetry_dir(&self) -> PathBuf {
        self.home.join("telemetry")
    }

    /// dispatch.jsonl
    pub fn dispatch_file(&self) -> PathBuf {
        self.telemetry_dir().join("dispatch.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_paths_env_override() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(HOME_ENV, dir.path());
        let paths = Paths::new().unwrap();
        std::env::remove_var(HOME_ENV);

        assert_eq!(paths.home, dir.path());
    }

    #[test]
    #[serial]
    fn test_paths_default_home() {
        std::env::remove_var(HOME_ENV);
        let paths = Paths::new().unwrap();
        assert!(paths.home.ends_with(".hybridai"));
    }

    #[test]
    fn test_file_locations() {
        let paths = Paths::at("/tmp/hybrid-home");
        assert!(paths.config_file().ends_with("hybridai.json"));
        assert!(paths.telemetry_dir().ends_with("hybrid-home/telemetry"));
        assert!(paths.dispatch_file().ends_with("telemetry/dispatch.jsonl"));
    }
}
