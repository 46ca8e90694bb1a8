use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reconcile::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Current state file format
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// What craftform last wrote to the world, keyed by manifest address
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct State {
    pub version: u32,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub resources: BTreeMap<String, Record>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// State Implementation
// ============================================================================

impl State {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: State = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!(
            "Loaded {} recorded resources from {}",
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.version = STATE_VERSION;
        self.last_updated = Utc::now();
        self.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{Position, Reconciler, ResourceKind, ResourceSpec};

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(&dir.path().join("craftform.state.toml")).unwrap();
        assert!(state.resources.is_empty());
        assert_eq!(state.version, STATE_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("craftform.state.toml");

        let fill = ResourceSpec::fill(
            "minecraft:stone",
            Position::new(-2, 63, -2),
            Position::new(2, 63, 2),
        );
        let mut state = State::default();
        state
            .resources
            .insert("fill.floor".into(), Record::new(fill.compute_id(), fill));
        state.resources.insert(
            "block.beacon".into(),
            Reconciler::import(ResourceKind::Block, "block-0-64-0").unwrap(),
        );
        state.touch(&path).unwrap();

        let loaded = State::load(&path).unwrap();
        assert_eq!(loaded.resources, state.resources);
        assert!(loaded.resources["block.beacon"].is_imported());
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("craftform.state.toml");
        fs::write(
            &path,
            "version = 99\nlast_updated = \"2026-01-01T00:00:00Z\"\n",
        )
        .unwrap();

        assert!(State::load(&path).is_err());
    }
}
