//! Error types for reconciliation.
//!
//! Errors fall into three groups: problems caught before any command is
//! sent ([`Error::Validation`]), commands the channel failed or the server
//! rejected ([`Error::Channel`]), and updates that would have to touch an
//! immutable attribute ([`Error::ReplacementRequired`]). None of them are
//! retried inside this crate.

use crate::model::{ResourceId, ResourceKind};
use crate::types::Operation;
use thiserror::Error;

/// Result type alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`crate::CommandChannel`] for a single command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The command never got a reply (connection, timeout, framing)
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered, but the answer is a command error
    #[error("command rejected by server: {reply}")]
    Rejected {
        /// Raw reply text
        reply: String,
    },
}

/// Errors that can occur while reconciling a resource.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete input, caught before any command is issued
    #[error("invalid {subject}: `{field}` {reason}")]
    Validation {
        /// What was being validated (resource address, kind, "provider")
        subject: String,
        /// Offending attribute or setting
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A command in a mutation failed
    #[error("{operation} {kind} failed at step {step}/{total} (`{command}`): {source}")]
    Channel {
        /// Lifecycle operation that issued the command
        operation: Operation,
        /// Resource kind being mutated
        kind: ResourceKind,
        /// 1-based index of the failing command
        step: usize,
        /// Number of commands in the mutation
        total: usize,
        /// The command text that failed
        command: String,
        /// Underlying channel failure
        #[source]
        source: ChannelError,
    },

    /// An update touched attributes that can only change by replacement
    #[error("{kind} {id} requires replacement: {} changed", attributes.join(", "))]
    ReplacementRequired {
        /// Resource kind
        kind: ResourceKind,
        /// Recorded identity of the instance
        id: ResourceId,
        /// Immutable attributes that differ
        attributes: Vec<&'static str>,
    },
}

impl Error {
    /// Shorthand for a validation error.
    pub fn validation(
        subject: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            subject: subject.into(),
            field,
            reason: reason.into(),
        }
    }

    /// Validation error for a required attribute that was not supplied.
    pub fn missing(subject: impl Into<String>, field: &'static str) -> Self {
        Self::validation(subject, field, "is required")
    }

    /// Whether the caller should fall back to delete-then-create.
    pub fn is_replacement_required(&self) -> bool {
        matches!(self, Self::ReplacementRequired { .. })
    }

    /// Failing step of a multi-command mutation, if this is a channel error.
    pub fn failed_step(&self) -> Option<usize> {
        match self {
            Self::Channel { step, .. } => Some(*step),
            _ => None,
        }
    }
}
