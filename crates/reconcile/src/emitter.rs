//! Command emitter - turns mutation intents into ordered world commands
//!
//! Every mutation renders to a fixed, ordered list of commands. They are
//! sent one at a time and the first failure stops the sequence. Steps that
//! already ran are not rolled back; the error says which step failed so the
//! caller knows how much of the mutation reached the world.

use crate::channel::{CommandChannel, check_reply};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::model::{Position, Region, ResourceId, ResourceKind};
use crate::types::Operation;

/// A change to the world, before it is rendered to commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Place or replace one block
    PlaceBlock { position: Position, material: String },
    /// Reset one block to the clear material
    ClearBlock { position: Position },
    /// Fill a region with one material
    Fill { region: Region, material: String },
    /// Reset a region to the clear material
    ClearFill { region: Region },
    /// Spawn an entity carrying `tag` as its custom name
    SummonEntity {
        entity_type: String,
        position: Position,
        tag: ResourceId,
    },
    /// Kill live entities named `tag`, then clear matching inventory items
    RemoveEntity { entity_type: String, tag: ResourceId },
}

impl Mutation {
    /// Resource kind this mutation acts on
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::PlaceBlock { .. } | Self::ClearBlock { .. } => ResourceKind::Block,
            Self::Fill { .. } | Self::ClearFill { .. } => ResourceKind::Fill,
            Self::SummonEntity { .. } | Self::RemoveEntity { .. } => ResourceKind::Entity,
        }
    }

    /// Render the ordered command list
    pub fn commands(&self, config: &ProviderConfig) -> Result<Vec<String>> {
        let commands = match self {
            Self::PlaceBlock { position, material } => vec![setblock(*position, material)],
            Self::ClearBlock { position } => vec![setblock(*position, config.clear_material())],
            Self::Fill { region, material } => vec![fill(region, material)],
            Self::ClearFill { region } => vec![fill(region, config.clear_material())],
            Self::SummonEntity {
                entity_type,
                position,
                tag,
            } => {
                let entity = namespaced(entity_type, config.entity_namespace());
                let name = name_tag(tag)?;
                vec![format!("summon {entity} {position} {{CustomName:{name}}}")]
            }
            Self::RemoveEntity { entity_type, tag } => {
                let entity = namespaced(entity_type, config.entity_namespace());
                let name = name_tag(tag)?;
                vec![
                    format!("kill @e[type={entity},nbt={{CustomName:{name}}}]"),
                    format!("clear @a {entity}{{display:{{Name:{name}}}}}"),
                ]
            }
        };
        Ok(commands)
    }
}

fn setblock(position: Position, material: &str) -> String {
    format!("setblock {position} {material} replace")
}

fn fill(region: &Region, material: &str) -> String {
    format!("fill {} {} {material} replace", region.start, region.end)
}

fn namespaced(entity_type: &str, namespace: &str) -> String {
    if entity_type.contains(':') {
        entity_type.to_string()
    } else {
        format!("{namespace}:{entity_type}")
    }
}

/// Quote an ID as a JSON text component inside a single-quoted SNBT string.
///
/// `serde_json` escapes `"` and `\` for the JSON layer; the SNBT layer then
/// needs `\` and `'` escaped. Control characters would end the command line
/// early, so they are refused outright.
pub fn name_tag(tag: &ResourceId) -> Result<String> {
    if tag.as_str().chars().any(char::is_control) {
        return Err(Error::validation(
            format!("entity tag {:?}", tag.as_str()),
            "id",
            "must not contain control characters",
        ));
    }

    let json = serde_json::json!({ "text": tag.as_str() }).to_string();
    let snbt = json.replace('\\', "\\\\").replace('\'', "\\'");
    Ok(format!("'{snbt}'"))
}

/// Sends rendered mutations through a channel
pub struct CommandEmitter<'a> {
    config: &'a ProviderConfig,
    channel: &'a dyn CommandChannel,
}

impl<'a> CommandEmitter<'a> {
    pub fn new(config: &'a ProviderConfig, channel: &'a dyn CommandChannel) -> Self {
        Self { config, channel }
    }

    /// Commands a mutation would send, without sending them
    pub fn render(&self, mutation: &Mutation) -> Result<Vec<String>> {
        mutation.commands(self.config)
    }

    /// Send a mutation's commands in order, stopping at the first failure.
    ///
    /// Returns the raw replies. They are logged and otherwise ignored.
    pub fn apply(&self, operation: Operation, mutation: &Mutation) -> Result<Vec<String>> {
        let kind = mutation.kind();
        let commands = self.render(mutation)?;
        let total = commands.len();
        let mut replies = Vec::with_capacity(total);

        for (index, command) in commands.into_iter().enumerate() {
            let step = index + 1;
            log::debug!("{operation} {kind} [{step}/{total}]: {command}");

            match self.channel.send(&command).and_then(check_reply) {
                Ok(reply) => {
                    if !reply.is_empty() {
                        log::trace!("reply: {reply}");
                    }
                    replies.push(reply);
                }
                Err(source) => {
                    if step > 1 {
                        log::warn!(
                            "{operation} {kind} stopped after {} of {total} commands; \
                             applied commands are not rolled back",
                            step - 1
                        );
                    }
                    return Err(Error::Channel {
                        operation,
                        kind,
                        step,
                        total,
                        command,
                        source,
                    });
                }
            }
        }

        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::RecordingChannel;
    use crate::error::ChannelError;

    fn config() -> ProviderConfig {
        ProviderConfig::new("localhost:25575", "secret")
    }

    fn pig_tag() -> ResourceId {
        ResourceId::from_raw("entity-1-64-1")
    }

    #[test]
    fn test_block_commands() {
        let config = config();
        let place = Mutation::PlaceBlock {
            position: Position::new(1, 2, 3),
            material: "minecraft:stone".into(),
        };
        assert_eq!(
            place.commands(&config).unwrap(),
            vec!["setblock 1 2 3 minecraft:stone replace"]
        );

        let clear = Mutation::ClearBlock {
            position: Position::new(1, 2, 3),
        };
        assert_eq!(
            clear.commands(&config).unwrap(),
            vec!["setblock 1 2 3 minecraft:air replace"]
        );
    }

    #[test]
    fn test_fill_commands() {
        let config = config().with_clear_material("minecraft:water");
        let region = Region::new(Position::new(-1, 60, 4), Position::new(3, 62, 0));

        let fill = Mutation::Fill {
            region,
            material: "minecraft:glass".into(),
        };
        assert_eq!(
            fill.commands(&config).unwrap(),
            vec!["fill -1 60 4 3 62 0 minecraft:glass replace"]
        );
        assert_eq!(
            Mutation::ClearFill { region }.commands(&config).unwrap(),
            vec!["fill -1 60 4 3 62 0 minecraft:water replace"]
        );
    }

    #[test]
    fn test_entity_commands() {
        let config = config();
        let summon = Mutation::SummonEntity {
            entity_type: "pig".into(),
            position: Position::new(1, 64, 1),
            tag: pig_tag(),
        };
        assert_eq!(
            summon.commands(&config).unwrap(),
            vec![r#"summon minecraft:pig 1 64 1 {CustomName:'{"text":"entity-1-64-1"}'}"#]
        );

        let remove = Mutation::RemoveEntity {
            entity_type: "modded:golem".into(),
            tag: pig_tag(),
        };
        assert_eq!(
            remove.commands(&config).unwrap(),
            vec![
                r#"kill @e[type=modded:golem,nbt={CustomName:'{"text":"entity-1-64-1"}'}]"#,
                r#"clear @a modded:golem{display:{Name:'{"text":"entity-1-64-1"}'}}"#,
            ]
        );
    }

    #[test]
    fn test_name_tag_escaping() {
        let tag = ResourceId::from_raw(r#"it's "quoted" \o/"#);
        assert_eq!(
            name_tag(&tag).unwrap(),
            r#"'{"text":"it\'s \\"quoted\\" \\\\o/"}'"#
        );

        let err = name_tag(&ResourceId::from_raw("pig\nop @a")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "id", .. }));
    }

    #[test]
    fn test_apply_sends_in_order() {
        let config = config();
        let channel = RecordingChannel::new();
        let emitter = CommandEmitter::new(&config, &channel);
        let remove = Mutation::RemoveEntity {
            entity_type: "pig".into(),
            tag: pig_tag(),
        };

        let replies = emitter.apply(Operation::Delete, &remove).unwrap();
        assert_eq!(replies.len(), 2);
        let sent = channel.sent();
        assert!(sent[0].starts_with("kill "));
        assert!(sent[1].starts_with("clear "));
    }

    #[test]
    fn test_first_failure_stops_sequence() {
        let config = config();
        let channel =
            RecordingChannel::failing_at(1, ChannelError::Transport("connection reset".into()));
        let emitter = CommandEmitter::new(&config, &channel);
        let remove = Mutation::RemoveEntity {
            entity_type: "pig".into(),
            tag: pig_tag(),
        };

        let err = emitter.apply(Operation::Delete, &remove).unwrap_err();
        assert_eq!(err.failed_step(), Some(1));
        assert_eq!(channel.sent().len(), 1);
    }

    #[test]
    fn test_second_step_failure_is_reported() {
        let config = config();
        let channel = RecordingChannel::failing_at(2, ChannelError::Transport("timed out".into()));
        let emitter = CommandEmitter::new(&config, &channel);
        let remove = Mutation::RemoveEntity {
            entity_type: "pig".into(),
            tag: pig_tag(),
        };

        match emitter.apply(Operation::Delete, &remove).unwrap_err() {
            Error::Channel {
                step,
                total,
                command,
                kind,
                ..
            } => {
                assert_eq!(step, 2);
                assert_eq!(total, 2);
                assert_eq!(kind, ResourceKind::Entity);
                assert!(command.starts_with("clear @a"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(channel.sent().len(), 2);
    }

    #[test]
    fn test_rejected_reply_fails_step() {
        let config = config();
        let channel =
            RecordingChannel::replying("Unknown or incomplete command, see below for error");
        let emitter = CommandEmitter::new(&config, &channel);
        let place = Mutation::PlaceBlock {
            position: Position::new(0, 0, 0),
            material: "minecraft:stone".into(),
        };

        let err = emitter.apply(Operation::Create, &place).unwrap_err();
        assert!(matches!(
            err,
            Error::Channel {
                source: ChannelError::Rejected { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_tag_sends_nothing() {
        let config = config();
        let channel = RecordingChannel::new();
        let emitter = CommandEmitter::new(&config, &channel);
        let summon = Mutation::SummonEntity {
            entity_type: "pig".into(),
            position: Position::default(),
            tag: ResourceId::from_raw("bad\ttag"),
        };

        assert!(emitter.apply(Operation::Create, &summon).is_err());
        assert!(channel.sent().is_empty());
    }
}
