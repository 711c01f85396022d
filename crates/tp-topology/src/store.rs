// store.rs — File-backed snapshot store.
//
// Topology snapshots live as one file per topology under a directory
// (`.tp/topologies/<topology_id>.yaml` by default). YAML and JSON are both
// accepted on read; writes are always YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::TopologyError;
use crate::policy::PolicyLibrary;
use crate::snapshot::{Topology, TopologySnapshot};

const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Reads and writes topology snapshots from a directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and validate the snapshot for `topology_id`.
    pub fn load(&self, topology_id: &str) -> Result<Topology, TopologyError> {
        self.load_snapshot(topology_id)?.validate()
    }

    /// Load the raw snapshot for `topology_id` without validating it.
    pub fn load_snapshot(&self, topology_id: &str) -> Result<TopologySnapshot, TopologyError> {
        check_id(topology_id)?;
        let path = self
            .find(topology_id)
            .ok_or_else(|| TopologyError::NotFound {
                topology_id: topology_id.to_string(),
                dir: self.dir.clone(),
            })?;
        let mut snapshot: TopologySnapshot = read_document(&path)?;
        if snapshot.topology_id.is_empty() {
            snapshot.topology_id = topology_id.to_string();
        } else if snapshot.topology_id != topology_id {
            return Err(TopologyError::TopologyIdMismatch {
                requested: topology_id.to_string(),
                found: snapshot.topology_id,
                path,
            });
        }
        tracing::info!(
            topology = %snapshot.topology_id,
            compartments = snapshot.compartments.len(),
            stacks = snapshot.stacks.len(),
            "loaded topology snapshot from {}",
            path.display()
        );
        Ok(snapshot)
    }

    /// Save a snapshot as `<dir>/<topology_id>.yaml`.
    pub fn save(&self, snapshot: &TopologySnapshot) -> Result<PathBuf, TopologyError> {
        check_id(&snapshot.topology_id)?;
        fs::create_dir_all(&self.dir).map_err(|source| TopologyError::IoError {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("{}.yaml", snapshot.topology_id));
        let yaml = serde_yaml::to_string(snapshot)?;
        fs::write(&path, yaml).map_err(|source| TopologyError::IoError {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// List all topology ids with a snapshot file, sorted.
    pub fn list(&self) -> Result<Vec<String>, TopologyError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| TopologyError::IoError {
            path: self.dir.clone(),
            source,
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TopologyError::IoError {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            let known = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| EXTENSIONS.contains(&ext));
            if known {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn find(&self, topology_id: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", topology_id, ext)))
            .find(|path| path.is_file())
    }
}

/// Ids become file stems, so they must be a single non-empty path component.
fn check_id(topology_id: &str) -> Result<(), TopologyError> {
    let valid = !topology_id.is_empty()
        && topology_id != "."
        && topology_id != ".."
        && !topology_id.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(TopologyError::InvalidTopologyId {
            topology_id: topology_id.to_string(),
        })
    }
}

/// Load a policy library document. A missing file yields an empty library.
pub fn load_library(path: &Path) -> Result<PolicyLibrary, TopologyError> {
    if !path.exists() {
        tracing::warn!("no policy library at {}; using empty library", path.display());
        return Ok(PolicyLibrary::default());
    }
    let library: PolicyLibrary = read_document(path)?;
    tracing::info!(
        policies = library.policies.len(),
        "loaded policy library from {}",
        path.display()
    );
    Ok(library)
}

/// Read a YAML or JSON document, chosen by file extension.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, TopologyError> {
    let data = fs::read_to_string(path).map_err(|source| TopologyError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&data).map_err(|source| TopologyError::JsonError {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_yaml::from_str(&data).map_err(|source| TopologyError::YamlError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::Compartment;
    use tempfile::tempdir;

    fn snapshot(id: &str) -> TopologySnapshot {
        TopologySnapshot {
            topology_id: id.to_string(),
            name: format!("{} estate", id),
            compartments: vec![Compartment::new("root", None)],
            blueprints: vec![],
            stacks: vec![],
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("topologies"));
        store.save(&snapshot("acme")).unwrap();

        let topology = store.load("acme").unwrap();
        assert_eq!(topology.name, "acme estate");
        assert!(topology.compartment("root").is_some());
    }

    #[test]
    fn load_missing_topology_is_not_found() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, TopologyError::NotFound { topology_id, .. } if topology_id == "ghost"));
    }

    #[test]
    fn reads_json_snapshot_and_fills_missing_id() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("lab.json"),
            r#"{"topology_id": "", "compartments": [{"id": "root"}]}"#,
        )
        .unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let topology = store.load("lab").unwrap();
        assert_eq!(topology.topology_id, "lab");
    }

    #[test]
    fn rejects_snapshot_declaring_another_id() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "topology_id: b\n").unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let err = store.load("a").unwrap_err();
        assert!(matches!(
            err,
            TopologyError::TopologyIdMismatch { requested, found, .. }
                if requested == "a" && found == "b"
        ));
    }

    #[test]
    fn rejects_ids_that_leave_the_store_dir() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("topologies"));
        fs::write(dir.path().join("outside.yaml"), "topology_id: outside\n").unwrap();

        for id in ["../outside", "nested/a", "..", ""] {
            let err = store.load(id).unwrap_err();
            assert!(
                matches!(err, TopologyError::InvalidTopologyId { .. }),
                "{id:?} was accepted"
            );
        }
        assert!(matches!(
            store.save(&snapshot("../escape")).unwrap_err(),
            TopologyError::InvalidTopologyId { .. }
        ));
    }

    #[test]
    fn list_returns_sorted_ids() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        store.save(&snapshot("zeta")).unwrap();
        store.save(&snapshot("alpha")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn list_on_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.yaml"), "compartments: [unterminated").unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let err = store.load("bad").unwrap_err();
        assert!(matches!(err, TopologyError::YamlError { .. }));
    }

    #[test]
    fn missing_library_is_empty() {
        let dir = tempdir().unwrap();
        let lib = load_library(&dir.path().join("library.yaml")).unwrap();
        assert!(lib.policies.is_empty());
    }
}
