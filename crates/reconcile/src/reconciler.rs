//! Reconciler - lifecycle operations for one resource instance
//!
//! ```text
//!            create                 update (mutable attributes only)
//!   Absent ----------> Present <--------------------------------+
//!     ^                  |  |                                   |
//!     |      delete      |  +-----------------------------------+
//!     +------------------+
//!   Unknown ---import---> Present
//! ```
//!
//! The world cannot be queried, so "current state" is the last [`Record`]
//! this reconciler wrote. [`Reconciler::read`] hands it back untouched and
//! drift made outside this tool stays invisible.

use crate::channel::CommandChannel;
use crate::config::ProviderConfig;
use crate::emitter::{CommandEmitter, Mutation};
use crate::error::{Error, Result};
use crate::model::{Record, ResourceId, ResourceKind, ResourceSpec};
use crate::types::Operation;

/// Drives create/read/update/delete/import for resource instances.
///
/// Callers must serialize operations on the same instance.
pub struct Reconciler<'a> {
    emitter: CommandEmitter<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a ProviderConfig, channel: &'a dyn CommandChannel) -> Self {
        Self {
            emitter: CommandEmitter::new(config, channel),
        }
    }

    /// Create an instance. `id` is computed from the spec when not supplied.
    ///
    /// The record is returned only after every command succeeded.
    pub fn create(&self, spec: ResourceSpec, id: Option<ResourceId>) -> Result<Record> {
        spec.validate()?;
        warn_oversized(&spec);

        let id = id.unwrap_or_else(|| spec.compute_id());
        self.emitter
            .apply(Operation::Create, &creation(&spec, &id))?;

        log::info!("created {} {}", spec.kind(), id);
        Ok(Record::new(id, spec))
    }

    /// Return the recorded state as-is. Never sends a command, so no
    /// reconciler is needed.
    pub fn read(record: &Record) -> Record {
        log::debug!(
            "read {} {}: returning recorded state, the world cannot be queried",
            record.kind,
            record.id
        );
        record.clone()
    }

    /// Re-apply mutable attributes in place.
    ///
    /// Fails with [`Error::ReplacementRequired`] without sending anything
    /// when an immutable attribute differs; the caller has to delete and
    /// create instead. The stored ID is kept.
    pub fn update(&self, prior: &Record, desired: ResourceSpec) -> Result<Record> {
        desired.validate()?;

        let attributes = prior.replaced_attributes(&desired);
        if !attributes.is_empty() {
            return Err(Error::ReplacementRequired {
                kind: prior.kind,
                id: prior.id.clone(),
                attributes,
            });
        }

        warn_oversized(&desired);
        match in_place(&desired) {
            Some(mutation) => {
                self.emitter.apply(Operation::Update, &mutation)?;
                log::info!("updated {} {}", prior.kind, prior.id);
            }
            None => log::debug!("{} {} has nothing to re-apply", prior.kind, prior.id),
        }

        Ok(Record::new(prior.id.clone(), desired))
    }

    /// Clear an instance from the world.
    ///
    /// The record is consumed either way: there is no way to check whether
    /// the world was actually cleared, so a failed delete is reported and
    /// the instance is forgotten.
    pub fn delete(&self, record: Record) -> Result<()> {
        let result =
            removal(&record).and_then(|mutation| self.emitter.apply(Operation::Delete, &mutation));

        match &result {
            Ok(_) => log::info!("deleted {} {}", record.kind, record.id),
            Err(e) => log::warn!(
                "dropping {} {} from state although delete failed: {}",
                record.kind,
                record.id,
                e
            ),
        }
        result.map(|_| ())
    }

    /// Adopt an existing instance by ID, trusting that it exists.
    ///
    /// Nothing is sent and nothing is verified; attributes stay unknown
    /// until the next update records them.
    pub fn import(kind: ResourceKind, id: &str) -> Result<Record> {
        if id.trim().is_empty() {
            return Err(Error::validation(
                format!("{kind} import"),
                "id",
                "must not be empty",
            ));
        }

        let id = ResourceId::from_raw(id);
        match id.parse() {
            Some((parsed, _)) if parsed == kind => {}
            _ => log::warn!("{id} does not look like a {kind} ID, importing it as-is"),
        }

        log::info!("imported {kind} {id} without verification");
        Ok(Record::imported(kind, id))
    }
}

/// Mutation that brings a new instance into the world
pub(crate) fn creation(spec: &ResourceSpec, id: &ResourceId) -> Mutation {
    match spec {
        ResourceSpec::Block(block) => Mutation::PlaceBlock {
            position: block.position,
            material: block.material.clone(),
        },
        ResourceSpec::Fill(fill) => Mutation::Fill {
            region: fill.region(),
            material: fill.material.clone(),
        },
        ResourceSpec::Entity(entity) => Mutation::SummonEntity {
            entity_type: entity.entity_type.clone(),
            position: entity.position,
            tag: id.clone(),
        },
    }
}

/// Mutation that re-applies mutable attributes, if the kind has any
pub(crate) fn in_place(spec: &ResourceSpec) -> Option<Mutation> {
    match spec {
        ResourceSpec::Block(block) => Some(Mutation::PlaceBlock {
            position: block.position,
            material: block.material.clone(),
        }),
        ResourceSpec::Fill(fill) => Some(Mutation::Fill {
            region: fill.region(),
            material: fill.material.clone(),
        }),
        ResourceSpec::Entity(_) => None,
    }
}

/// Mutation that clears a recorded instance from the world
pub(crate) fn removal(record: &Record) -> Result<Mutation> {
    let subject = || format!("imported {} {}", record.kind, record.id);

    match &record.spec {
        Some(ResourceSpec::Block(block)) => Ok(Mutation::ClearBlock {
            position: block.position,
        }),
        Some(ResourceSpec::Fill(fill)) => Ok(Mutation::ClearFill {
            region: fill.region(),
        }),
        Some(ResourceSpec::Entity(entity)) => Ok(Mutation::RemoveEntity {
            entity_type: entity.entity_type.clone(),
            tag: record.id.clone(),
        }),
        // Imported: only a block can be located from its ID alone
        None => match (record.kind, record.id.parse()) {
            (ResourceKind::Block, Some((ResourceKind::Block, position))) => {
                Ok(Mutation::ClearBlock { position })
            }
            (ResourceKind::Block, _) => Err(Error::validation(
                subject(),
                "position",
                "is unknown and the ID does not encode one",
            )),
            (ResourceKind::Fill, _) => Err(Error::validation(
                subject(),
                "end",
                "is unknown until the resource has been applied once",
            )),
            (ResourceKind::Entity, _) => Err(Error::validation(
                subject(),
                "entity_type",
                "is unknown until the resource has been applied once",
            )),
        },
    }
}

fn warn_oversized(spec: &ResourceSpec) {
    if let ResourceSpec::Fill(fill) = spec {
        let region = fill.region();
        if !region.fits_single_fill() {
            log::warn!(
                "fill {} covers {} blocks; vanilla servers refuse more than {} per command",
                spec.compute_id(),
                region.volume(),
                crate::model::FILL_LIMIT
            );
        }
    }
}
