//! Tool settings (where scripts and templates live, how commands run)
//!
//! Read from an optional TOML file; every field has a default so an empty
//! file, or no file at all, gives a working configuration.

use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    /// Shell for `-c` command lines
    pub shell: String,
    /// Directory holding the install scripts
    pub scripts_dir: PathBuf,
    /// Directory holding the ingress and stack templates
    pub templates_dir: PathBuf,
    /// Rendered templates land here
    pub output_dir: PathBuf,
    /// Shell pipeline whose first output token becomes a secret value
    pub entropy_command: String,
    /// Per-step limit; unset means unlimited
    pub step_timeout_secs: Option<u64>,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            scripts_dir: PathBuf::from("scripts"),
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("tmp"),
            entropy_command: "head -c 16 /dev/urandom | shasum".to_string(),
            step_timeout_secs: None,
        }
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("failed to read settings {}: {source}", path.display()))]
    ReadSettings {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse settings {}: {source}", path.display()))]
    ParseSettings {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl BootstrapSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).context(ReadSettingsSnafu { path })?;
        toml::from_str(&content).context(ParseSettingsSnafu { path })
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }

    /// Path of a script inside `scripts_dir`
    pub fn script(&self, file_name: &str) -> PathBuf {
        self.scripts_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings: BootstrapSettings = toml::from_str("").unwrap();
        assert_eq!(settings, BootstrapSettings::default());
        assert_eq!(settings.step_timeout(), None);
    }

    #[test]
    fn test_partial_override() {
        let settings: BootstrapSettings = toml::from_str(
            r#"
shell = "/bin/bash"
scripts_dir = "/opt/ofc/scripts"
step_timeout_secs = 300
"#,
        )
        .unwrap();

        assert_eq!(settings.shell, "/bin/bash");
        assert_eq!(
            settings.script("install-openfaas.sh"),
            PathBuf::from("/opt/ofc/scripts/install-openfaas.sh")
        );
        assert_eq!(settings.step_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(settings.output_dir, PathBuf::from("tmp"));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "step_timeout_secs = \"soon\"").unwrap();

        let err = BootstrapSettings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::ParseSettings { .. }));
    }
}
