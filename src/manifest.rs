//! Manifest - desired world state in TOML
//!
//! ```toml
//! [provider]
//! address = "localhost:25575"
//!
//! [[block]]
//! name = "beacon"
//! material = "minecraft:beacon"
//! position = { x = 0, y = 64, z = 0 }
//! ```
//!
//! Every attribute is optional at the TOML level so that a missing one is
//! reported against its resource address instead of as a parse error.

use anyhow::{Context, Result};
use reconcile::{Error, Position, ProviderSettings, ResourceKind, ResourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default, rename = "block")]
    pub blocks: Vec<BlockEntry>,

    #[serde(default, rename = "fill")]
    pub fills: Vec<FillEntry>,

    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityEntry>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionEntry {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub z: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockEntry {
    pub name: String,
    pub material: Option<String>,
    pub position: Option<PositionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FillEntry {
    pub name: String,
    pub material: Option<String>,
    pub start: Option<PositionEntry>,
    pub end: Option<PositionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityEntry {
    pub name: String,
    pub entity_type: Option<String>,
    pub position: Option<PositionEntry>,
}

impl Manifest {
    /// Load a manifest; a missing file is an error
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;

        let manifest = Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        log::debug!("Loaded manifest from {}", path.display());
        Ok(manifest)
    }

    /// Load a manifest if present, for commands that only need provider settings
    pub fn load_optional(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Manifest {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Desired specs keyed by `kind.name`, validated
    pub fn resources(&self) -> Result<BTreeMap<String, ResourceSpec>> {
        let mut resources = BTreeMap::new();

        for entry in &self.blocks {
            let address = address(ResourceKind::Block, &entry.name)?;
            let spec = ResourceSpec::block(
                required(&address, "material", entry.material.as_ref())?,
                position(&address, "position", entry.position.as_ref())?,
            );
            insert(&mut resources, address, spec)?;
        }

        for entry in &self.fills {
            let address = address(ResourceKind::Fill, &entry.name)?;
            let spec = ResourceSpec::fill(
                required(&address, "material", entry.material.as_ref())?,
                position(&address, "start", entry.start.as_ref())?,
                position(&address, "end", entry.end.as_ref())?,
            );
            insert(&mut resources, address, spec)?;
        }

        for entry in &self.entities {
            let address = address(ResourceKind::Entity, &entry.name)?;
            let spec = ResourceSpec::entity(
                required(&address, "entity_type", entry.entity_type.as_ref())?,
                position(&address, "position", entry.position.as_ref())?,
            );
            insert(&mut resources, address, spec)?;
        }

        Ok(resources)
    }
}

fn address(kind: ResourceKind, name: &str) -> Result<String> {
    if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
        return Err(Error::validation(
            format!("{kind} {name:?}"),
            "name",
            "must be non-empty without dots or whitespace",
        )
        .into());
    }
    Ok(format!("{kind}.{name}"))
}

fn required(address: &str, field: &'static str, value: Option<&String>) -> Result<String> {
    value
        .cloned()
        .ok_or_else(|| Error::missing(address, field).into())
}

fn position(address: &str, field: &'static str, value: Option<&PositionEntry>) -> Result<Position> {
    let entry = value.ok_or_else(|| Error::missing(address, field))?;
    let axis = |value: Option<i64>, axis: &str| {
        value.ok_or_else(|| Error::validation(address, field, format!("is missing `{axis}`")))
    };
    Ok(Position::new(
        axis(entry.x, "x")?,
        axis(entry.y, "y")?,
        axis(entry.z, "z")?,
    ))
}

fn insert(
    resources: &mut BTreeMap<String, ResourceSpec>,
    address: String,
    spec: ResourceSpec,
) -> Result<()> {
    spec.validate()
        .with_context(|| format!("Invalid resource {address}"))?;
    if resources.contains_key(&address) {
        anyhow::bail!("Duplicate resource {address}: names must be unique per kind");
    }
    resources.insert(address, spec);
    Ok(())
}
