//! Resource model: positions, identities, specs and recorded state
//!
//! A [`ResourceSpec`] is the desired state of one resource. A [`Record`] is
//! what the reconciler last wrote for it. The world itself is never read
//! back, so the record is the only notion of "current state" there is.

use crate::error::{Error, Result};
use crate::schema::{self, Schema};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Largest region vanilla servers accept in a single `fill`
pub const FILL_LIMIT: u128 = 32_768;

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(block|fill|entity)-(-?\d+)-(-?\d+)-(-?\d+)$")
        .expect("identity pattern is valid")
});

// ============================================================================
// Positions
// ============================================================================

/// Absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate by axis name (`x`, `y` or `z`)
    pub fn axis(&self, axis: &str) -> Option<i64> {
        match axis {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            _ => None,
        }
    }
}

/// Renders as command arguments: `x y z`
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// Axis-aligned volume between two corners, in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub start: Position,
    pub end: Position,
}

impl Region {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Number of blocks covered, corners inclusive, saturating at `u128::MAX`
    pub fn volume(&self) -> u128 {
        fn span(a: i64, b: i64) -> u128 {
            (i128::from(a) - i128::from(b)).unsigned_abs() + 1
        }
        span(self.start.x, self.end.x)
            .saturating_mul(span(self.start.y, self.end.y))
            .saturating_mul(span(self.start.z, self.end.z))
    }

    /// Whether a single vanilla `fill` can cover this region
    pub fn fits_single_fill(&self) -> bool {
        self.volume() <= FILL_LIMIT
    }
}

// ============================================================================
// Kinds and identity
// ============================================================================

/// Resource kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Block,
    Fill,
    Entity,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Block, Self::Fill, Self::Entity];

    /// Name used in manifests, addresses and ID prefixes
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Block => "block",
            ResourceKind::Fill => "fill",
            ResourceKind::Entity => "entity",
        }
    }

    /// Parse a kind from its exact lowercase name
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "block" => Some(ResourceKind::Block),
            "fill" => Some(ResourceKind::Fill),
            "entity" => Some(ResourceKind::Entity),
            _ => None,
        }
    }

    /// Attribute schema for this kind
    pub fn schema(&self) -> &'static Schema {
        match self {
            ResourceKind::Block => &schema::BLOCK,
            ResourceKind::Fill => &schema::FILL,
            ResourceKind::Entity => &schema::ENTITY,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable identity of a resource instance: `<kind>-<x>-<y>-<z>`.
///
/// Two resources of the same kind at the same identifying position share an
/// ID and therefore alias each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Derive the ID for a kind at its identifying position
    pub fn derive(kind: ResourceKind, position: Position) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            kind, position.x, position.y, position.z
        ))
    }

    /// Wrap a caller-supplied ID without checking it
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover kind and identifying position from a well-formed ID
    pub fn parse(&self) -> Option<(ResourceKind, Position)> {
        let caps = ID_PATTERN.captures(&self.0)?;
        let kind = ResourceKind::from_name(&caps[1])?;
        let x = caps[2].parse().ok()?;
        let y = caps[3].parse().ok()?;
        let z = caps[4].parse().ok()?;
        Some((kind, Position::new(x, y, z)))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Specs
// ============================================================================

/// Value of a schema attribute, borrowed from a spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    Text(&'a str),
    Integer(i64),
}

impl fmt::Display for AttributeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub material: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillSpec {
    pub material: String,
    pub start: Position,
    pub end: Position,
}

impl FillSpec {
    pub fn region(&self) -> Region {
        Region::new(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub entity_type: String,
    pub position: Position,
}

/// Desired state of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceSpec {
    Block(BlockSpec),
    Fill(FillSpec),
    Entity(EntitySpec),
}

impl ResourceSpec {
    pub fn block(material: impl Into<String>, position: Position) -> Self {
        Self::Block(BlockSpec {
            material: material.into(),
            position,
        })
    }

    pub fn fill(material: impl Into<String>, start: Position, end: Position) -> Self {
        Self::Fill(FillSpec {
            material: material.into(),
            start,
            end,
        })
    }

    pub fn entity(entity_type: impl Into<String>, position: Position) -> Self {
        Self::Entity(EntitySpec {
            entity_type: entity_type.into(),
            position,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Block(_) => ResourceKind::Block,
            Self::Fill(_) => ResourceKind::Fill,
            Self::Entity(_) => ResourceKind::Entity,
        }
    }

    pub fn schema(&self) -> &'static Schema {
        self.kind().schema()
    }

    /// Position the ID is derived from (a fill's start corner)
    pub fn identity_position(&self) -> Position {
        match self {
            Self::Block(block) => block.position,
            Self::Fill(fill) => fill.start,
            Self::Entity(entity) => entity.position,
        }
    }

    /// Deterministic identity; a pure function of kind and identifying position
    pub fn compute_id(&self) -> ResourceId {
        ResourceId::derive(self.kind(), self.identity_position())
    }

    /// Look up a schema attribute by dotted name
    pub fn attribute(&self, name: &str) -> Option<AttributeValue<'_>> {
        if let Some((group, axis)) = name.split_once('.') {
            let position = match (self, group) {
                (Self::Block(block), "position") => block.position,
                (Self::Fill(fill), "start") => fill.start,
                (Self::Fill(fill), "end") => fill.end,
                (Self::Entity(entity), "position") => entity.position,
                _ => return None,
            };
            return position.axis(axis).map(AttributeValue::Integer);
        }

        match (self, name) {
            (Self::Block(block), "material") => Some(AttributeValue::Text(&block.material)),
            (Self::Fill(fill), "material") => Some(AttributeValue::Text(&fill.material)),
            (Self::Entity(entity), "entity_type") => {
                Some(AttributeValue::Text(&entity.entity_type))
            }
            _ => None,
        }
    }

    /// Reject specs missing required attributes or carrying values that
    /// would break a command line
    pub fn validate(&self) -> Result<()> {
        let subject = format!("{} {}", self.kind(), self.compute_id());
        let required = self
            .schema()
            .attributes
            .iter()
            .filter(|a| a.required && !a.computed);

        for attribute in required {
            match self.attribute(attribute.name) {
                None => return Err(Error::missing(subject, attribute.name)),
                Some(AttributeValue::Text(text)) => {
                    validate_token(&subject, attribute.name, text)?;
                }
                Some(AttributeValue::Integer(_)) => {}
            }
        }

        Ok(())
    }

    /// Immutable attributes whose values differ between `self` and `new`
    pub fn replaced_attributes(&self, new: &ResourceSpec) -> Vec<&'static str> {
        if self.kind() != new.kind() {
            return vec!["kind"];
        }

        self.schema()
            .immutable_attributes()
            .filter(|a| self.attribute(a.name) != new.attribute(a.name))
            .map(|a| a.name)
            .collect()
    }

    /// True if going from `self` to `new` needs delete-then-create
    pub fn requires_replacement(&self, new: &ResourceSpec) -> bool {
        !self.replaced_attributes(new).is_empty()
    }

    /// One-line summary for plans and logs
    pub fn summary(&self) -> String {
        match self {
            Self::Block(block) => format!("{} at {}", block.material, block.position),
            Self::Fill(fill) => format!(
                "{} from {} to {} ({} blocks)",
                fill.material,
                fill.start,
                fill.end,
                fill.region().volume()
            ),
            Self::Entity(entity) => format!("{} at {}", entity.entity_type, entity.position),
        }
    }
}

/// A command argument must be a single non-empty token
pub(crate) fn validate_token(subject: &str, field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::validation(subject, field, "must not be empty"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::validation(
            subject,
            field,
            format!("must not contain whitespace or control characters: {value:?}"),
        ));
    }
    Ok(())
}

// ============================================================================
// Recorded state
// ============================================================================

/// Last state the reconciler successfully wrote for an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: ResourceId,
    pub kind: ResourceKind,
    /// `None` for imported instances whose attributes were never recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ResourceSpec>,
}

impl Record {
    pub fn new(id: ResourceId, spec: ResourceSpec) -> Self {
        Self {
            id,
            kind: spec.kind(),
            spec: Some(spec),
        }
    }

    /// Record for an instance adopted by ID only
    pub fn imported(kind: ResourceKind, id: ResourceId) -> Self {
        Self {
            id,
            kind,
            spec: None,
        }
    }

    pub fn is_imported(&self) -> bool {
        self.spec.is_none()
    }

    /// Immutable attributes that would change going to `desired`.
    ///
    /// Imported records have no attributes to compare; they are adopted in
    /// place when the stored ID is the one `desired` derives, and replaced
    /// otherwise.
    pub fn replaced_attributes(&self, desired: &ResourceSpec) -> Vec<&'static str> {
        match &self.spec {
            Some(spec) => spec.replaced_attributes(desired),
            None if self.kind != desired.kind() => vec!["kind"],
            None if self.id != desired.compute_id() => desired.schema().identity_attributes(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> ResourceSpec {
        ResourceSpec::block("minecraft:stone", Position::new(1, 2, 3))
    }

    #[test]
    fn test_compute_id() {
        assert_eq!(stone().compute_id().as_str(), "block-1-2-3");

        let fill = ResourceSpec::fill(
            "minecraft:dirt",
            Position::new(0, -60, 5),
            Position::new(-4, -58, 9),
        );
        assert_eq!(fill.compute_id().as_str(), "fill-0--60-5");

        let pig = ResourceSpec::entity("pig", Position::new(7, 64, -7));
        assert_eq!(pig.compute_id().as_str(), "entity-7-64--7");
    }

    #[test]
    fn test_kind_names_are_case_sensitive() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::from_name("Block"), None);
        assert_eq!(ResourceKind::from_name("FILL"), None);
    }

    #[test]
    fn test_id_is_stable_across_material_changes() {
        let gold = ResourceSpec::block("minecraft:gold_block", Position::new(1, 2, 3));
        assert_eq!(stone().compute_id(), gold.compute_id());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(
            ResourceId::from_raw("fill-0--60-5").parse(),
            Some((ResourceKind::Fill, Position::new(0, -60, 5)))
        );
        assert_eq!(
            ResourceId::from_raw("block--1--2--3").parse(),
            Some((ResourceKind::Block, Position::new(-1, -2, -3)))
        );
        assert_eq!(ResourceId::from_raw("block-1-2").parse(), None);
        assert_eq!(ResourceId::from_raw("chest-1-2-3").parse(), None);
        assert_eq!(ResourceId::from_raw("my-house").parse(), None);
    }

    #[test]
    fn test_validate() {
        assert!(stone().validate().is_ok());

        let err = ResourceSpec::block("", Position::default())
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("`material` must not be empty"));

        let err = ResourceSpec::block("minecraft:stone keep", Position::default())
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("whitespace"));

        let err = ResourceSpec::entity("pig\nkill @e", Position::default())
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("`entity_type`"));
    }

    #[test]
    fn test_material_change_is_in_place() {
        let gold = ResourceSpec::block("minecraft:gold_block", Position::new(1, 2, 3));
        assert!(!stone().requires_replacement(&gold));
    }

    #[test]
    fn test_position_change_requires_replacement() {
        let moved = ResourceSpec::block("minecraft:stone", Position::new(1, 5, 4));
        assert_eq!(
            stone().replaced_attributes(&moved),
            vec!["position.y", "position.z"]
        );
    }

    #[test]
    fn test_fill_end_change_requires_replacement() {
        let origin = Position::new(0, 0, 0);
        let a = ResourceSpec::fill("minecraft:dirt", origin, Position::new(2, 2, 2));
        let b = ResourceSpec::fill("minecraft:sand", origin, Position::new(2, 3, 2));
        assert_eq!(a.replaced_attributes(&b), vec!["end.y"]);
    }

    #[test]
    fn test_kind_change_requires_replacement() {
        let corner = Position::new(1, 2, 3);
        let fill = ResourceSpec::fill("minecraft:stone", corner, corner);
        assert_eq!(stone().replaced_attributes(&fill), vec!["kind"]);
    }

    #[test]
    fn test_entity_type_change_requires_replacement() {
        let pig = ResourceSpec::entity("pig", Position::new(0, 64, 0));
        let cow = ResourceSpec::entity("cow", Position::new(0, 64, 0));
        assert_eq!(pig.replaced_attributes(&cow), vec!["entity_type"]);
    }

    #[test]
    fn test_imported_record_adopts_matching_id() {
        let record = Record::imported(ResourceKind::Block, ResourceId::from_raw("block-1-2-3"));
        assert!(record.replaced_attributes(&stone()).is_empty());

        let elsewhere = ResourceSpec::block("minecraft:stone", Position::new(9, 9, 9));
        assert_eq!(
            record.replaced_attributes(&elsewhere),
            vec!["position.x", "position.y", "position.z"]
        );
    }

    #[test]
    fn test_region_volume() {
        let region = Region::new(Position::new(2, 0, 0), Position::new(0, 1, 0));
        assert_eq!(region.volume(), 6);
        assert!(region.fits_single_fill());

        let huge = Region::new(Position::new(0, 0, 0), Position::new(99, 99, 99));
        assert_eq!(huge.volume(), 1_000_000);
        assert!(!huge.fits_single_fill());
    }

    #[test]
    fn test_region_volume_saturates_at_extreme_corners() {
        let min = Position::new(i64::MIN, i64::MIN, i64::MIN);
        let max = Position::new(i64::MAX, i64::MAX, i64::MAX);
        let region = Region::new(min, max);
        assert_eq!(region.volume(), u128::MAX);
        assert!(!region.fits_single_fill());

        let wide = Region::new(
            Position::new(-(1 << 50), -(1 << 50), -(1 << 50)),
            Position::new(1 << 50, 1 << 50, 1 << 50),
        );
        assert_eq!(wide.volume(), u128::MAX);

        let fill = ResourceSpec::fill("minecraft:stone", min, max);
        assert!(fill.summary().contains(&u128::MAX.to_string()));
    }

    #[test]
    fn test_record_roundtrips_through_toml() {
        let record = Record::new(stone().compute_id(), stone());
        let text = toml::to_string(&record).unwrap();
        let back: Record = toml::from_str(&text).unwrap();
        assert_eq!(back, record);

        let imported = Record::imported(ResourceKind::Fill, ResourceId::from_raw("fill-0-0-0"));
        let text = toml::to_string(&imported).unwrap();
        assert!(!text.contains("spec"));
        let back: Record = toml::from_str(&text).unwrap();
        assert_eq!(back, imported);
    }
}
