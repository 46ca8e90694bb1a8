//! Command channel abstraction
//!
//! The channel is the only way to reach the world: one text command in, one
//! text reply out. Replies are success/failure signals, never state.

use crate::error::ChannelError;

/// Transport for world commands.
///
/// Implementations block until the reply (or a transport error) arrives.
/// Timeouts and cancellation are the implementation's business.
pub trait CommandChannel: Send + Sync {
    /// Send one command and return the raw reply text
    fn send(&self, command: &str) -> Result<String, ChannelError>;
}

/// Marker Minecraft appends to the echo of an unparsable command
const PARSE_ERROR_MARKER: &str = "<--[HERE]";

/// Reply prefixes for commands the server refused to run
const REJECTION_PREFIXES: &[&str] = &[
    "Unknown or incomplete command",
    "Incorrect argument for command",
];

/// Classify a raw reply.
///
/// Only syntax-level refusals count as failures. Semantic no-ops such as
/// "Could not set the block" (the block already matches) or "No entity was
/// found" are what idempotent re-application looks like, so they pass.
pub fn check_reply(reply: String) -> Result<String, ChannelError> {
    let trimmed = reply.trim_start();
    if trimmed.contains(PARSE_ERROR_MARKER)
        || REJECTION_PREFIXES.iter().any(|p| trimmed.starts_with(p))
    {
        return Err(ChannelError::Rejected { reply });
    }
    Ok(reply)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_replies_pass() {
        assert!(check_reply(String::new()).is_ok());
        assert!(check_reply("Changed the block at 1, 2, 3".into()).is_ok());
        assert!(check_reply("Could not set the block".into()).is_ok());
        assert!(check_reply("No entity was found".into()).is_ok());
    }

    #[test]
    fn test_syntax_errors_are_rejections() {
        let reply = "Unknown block type 'minecraft:stonee'...1 2 3 minecraft:stonee<--[HERE]";
        assert_eq!(
            check_reply(reply.to_string()),
            Err(ChannelError::Rejected {
                reply: reply.to_string()
            })
        );
        assert!(check_reply("Unknown or incomplete command, see below for error".into()).is_err());
    }

    #[test]
    fn test_incorrect_argument_is_rejection() {
        let reply = "Incorrect argument for command";
        assert_eq!(
            check_reply(reply.to_string()),
            Err(ChannelError::Rejected {
                reply: reply.to_string()
            })
        );
        assert!(check_reply("  Incorrect argument for command\n...".into()).is_err());
    }
}
