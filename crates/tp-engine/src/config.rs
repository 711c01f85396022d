// config.rs — Engine configuration.
//
// EngineConfig says where topology snapshots and the policy library live.
// `for_project()` gives the standard `.tp/` layout; `load()` additionally
// applies `.tp/engine.toml` when present. Every section of that file is
// optional, and relative paths resolve against the project root.
//
// ```toml
// [paths]
// topologies_dir = "infra/topologies"
// library = "infra/policies.yaml"
//
// [display]
// format = "json"
// ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How the CLI renders results.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Contents of `.tp/engine.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineSettings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathSettings {
    /// Directory of topology snapshot files.
    pub topologies_dir: Option<PathBuf>,
    /// Policy library file.
    pub library: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplaySettings {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Resolved engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    pub project_root: PathBuf,
    pub topologies_dir: PathBuf,
    pub library_path: PathBuf,
    pub format: OutputFormat,
}

impl EngineConfig {
    /// Standard `.tp/` layout for a project, ignoring any settings file.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let tp_dir = root.join(".tp");
        Self {
            topologies_dir: tp_dir.join("topologies"),
            library_path: tp_dir.join("library.yaml"),
            project_root: root,
            format: OutputFormat::default(),
        }
    }

    /// Path of the optional settings file.
    pub fn settings_path(project_root: &Path) -> PathBuf {
        project_root.join(".tp").join("engine.toml")
    }

    /// Standard layout with `.tp/engine.toml` applied on top.
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self, EngineError> {
        let root = project_root.as_ref();
        let path = Self::settings_path(root);
        if !path.exists() {
            return Ok(Self::for_project(root));
        }
        let data = fs::read_to_string(&path).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        let settings: EngineSettings =
            toml::from_str(&data).map_err(|source| EngineError::Config {
                path: path.clone(),
                source,
            })?;
        tracing::debug!("applied engine settings from {}", path.display());
        Ok(Self::for_project(root).with_settings(settings))
    }

    /// Apply settings over this config.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        if let Some(dir) = settings.paths.topologies_dir {
            self.topologies_dir = self.project_root.join(dir);
        }
        if let Some(library) = settings.paths.library {
            self.library_path = self.project_root.join(library);
        }
        self.format = settings.display.format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn standard_layout() {
        let config = EngineConfig::for_project("/work/acme");
        assert_eq!(
            config.topologies_dir,
            PathBuf::from("/work/acme/.tp/topologies")
        );
        assert_eq!(config.library_path, PathBuf::from("/work/acme/.tp/library.yaml"));
        assert_eq!(config.format, OutputFormat::Table);
    }

    #[test]
    fn load_without_settings_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config, EngineConfig::for_project(dir.path()));
    }

    #[test]
    fn settings_override_paths_and_format() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".tp")).unwrap();
        fs::write(
            EngineConfig::settings_path(dir.path()),
            "[paths]\ntopologies_dir = \"infra/topologies\"\n\n[display]\nformat = \"json\"\n",
        )
        .unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.topologies_dir, dir.path().join("infra/topologies"));
        assert_eq!(config.library_path, dir.path().join(".tp/library.yaml"));
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let settings = EngineSettings {
            paths: PathSettings {
                topologies_dir: None,
                library: Some(PathBuf::from("/etc/tp/library.yaml")),
            },
            display: DisplaySettings::default(),
        };
        let config = EngineConfig::for_project("/work").with_settings(settings);
        assert_eq!(config.library_path, PathBuf::from("/etc/tp/library.yaml"));
    }

    #[test]
    fn malformed_settings_is_config_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".tp")).unwrap();
        fs::write(EngineConfig::settings_path(dir.path()), "[display]\nformat = 7\n").unwrap();
        let err = EngineConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }
}
