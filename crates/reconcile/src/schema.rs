//! Attribute schema per resource kind
//!
//! The schema is the single source of truth for which attributes are
//! required, which are computed, and which can only change by replacing
//! the resource. Validation and replacement decisions in [`crate::model`]
//! walk these tables instead of hardcoding per-kind rules.

use crate::model::ResourceKind;
use serde::Serialize;

/// One attribute of a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Dotted attribute path, e.g. `position.x`
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Must be supplied by desired state
    pub required: bool,
    /// Filled in by the reconciler, retained across cycles once set
    pub computed: bool,
    /// A change forces delete-then-create
    pub requires_replace: bool,
}

impl Attribute {
    const fn mutable(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
            computed: false,
            requires_replace: false,
        }
    }

    const fn immutable(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
            computed: false,
            requires_replace: true,
        }
    }

    const fn computed(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: false,
            computed: true,
            requires_replace: false,
        }
    }
}

/// Schema of a resource kind
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Schema {
    pub kind: ResourceKind,
    pub description: &'static str,
    /// Attribute group the resource ID is derived from
    pub identity: &'static str,
    pub attributes: &'static [Attribute],
}

impl Schema {
    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&'static Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes flagged `requires_replace`
    pub fn immutable_attributes(&self) -> impl Iterator<Item = &'static Attribute> {
        self.attributes.iter().filter(|a| a.requires_replace)
    }

    /// Attributes the resource ID is derived from
    pub fn identity_attributes(&self) -> Vec<&'static str> {
        let prefix = self.identity;
        self.attributes
            .iter()
            .filter(|a| {
                a.name
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
            })
            .map(|a| a.name)
            .collect()
    }
}

const ID: Attribute = Attribute::computed(
    "id",
    "Identity derived from the identifying position, retained once set",
);

pub(crate) static BLOCK: Schema = Schema {
    kind: ResourceKind::Block,
    description: "A single block placed at a position",
    identity: "position",
    attributes: &[
        Attribute::mutable("material", "Namespaced block material, e.g. minecraft:stone"),
        Attribute::immutable("position.x", "X coordinate of the block"),
        Attribute::immutable("position.y", "Y coordinate of the block"),
        Attribute::immutable("position.z", "Z coordinate of the block"),
        ID,
    ],
};

pub(crate) static FILL: Schema = Schema {
    kind: ResourceKind::Fill,
    description: "An axis-aligned region filled with one material",
    identity: "start",
    attributes: &[
        Attribute::mutable("material", "Namespaced block material used for the whole region"),
        Attribute::immutable("start.x", "X coordinate of the first corner"),
        Attribute::immutable("start.y", "Y coordinate of the first corner"),
        Attribute::immutable("start.z", "Z coordinate of the first corner"),
        Attribute::immutable("end.x", "X coordinate of the opposite corner"),
        Attribute::immutable("end.y", "Y coordinate of the opposite corner"),
        Attribute::immutable("end.z", "Z coordinate of the opposite corner"),
        ID,
    ],
};

pub(crate) static ENTITY: Schema = Schema {
    kind: ResourceKind::Entity,
    description: "An entity summoned at a position and tagged with its ID",
    identity: "position",
    attributes: &[
        Attribute::immutable("entity_type", "Entity type, e.g. pig or minecraft:armor_stand"),
        Attribute::immutable("position.x", "X coordinate of the spawn point"),
        Attribute::immutable("position.y", "Y coordinate of the spawn point"),
        Attribute::immutable("position.z", "Z coordinate of the spawn point"),
        ID,
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_is_the_only_mutable_input() {
        for schema in [&BLOCK, &FILL] {
            let mutable: Vec<_> = schema
                .attributes
                .iter()
                .filter(|a| !a.requires_replace && !a.computed)
                .map(|a| a.name)
                .collect();
            assert_eq!(mutable, vec!["material"]);
        }
        assert_eq!(ENTITY.immutable_attributes().count(), 4);
    }

    #[test]
    fn test_identity_attributes() {
        assert_eq!(
            FILL.identity_attributes(),
            vec!["start.x", "start.y", "start.z"]
        );
        assert_eq!(
            BLOCK.identity_attributes(),
            vec!["position.x", "position.y", "position.z"]
        );
    }

    #[test]
    fn test_id_is_computed() {
        let id = BLOCK.attribute("id").unwrap();
        assert!(id.computed);
        assert!(!id.required);
        assert!(!id.requires_replace);
    }
}
