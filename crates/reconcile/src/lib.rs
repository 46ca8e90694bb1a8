//! # Reconcile
//!
//! Declarative block, fill and entity resources for a Minecraft world that
//! can only be reached through a write-only command channel.
//!
//! The world cannot be queried. Everything this crate knows about an
//! instance is the [`Record`] it wrote last time, so convergence means
//! comparing that record with the desired [`ResourceSpec`] and sending the
//! commands that close the gap.
//!
//! ## Core Concepts
//!
//! - **ResourceSpec**: Desired attributes of one block, fill region or entity
//! - **Record**: Last state written for an instance, or an imported ID
//! - **Reconciler**: Create, read, update, delete and import for one instance
//! - **CommandEmitter**: Renders a mutation to commands and sends them in order
//! - **Plan**: Ordered create/update/replace/delete entries for a manifest
//! - **Executor**: Applies a plan, keeping the record map in step
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{
//!     CommandChannel, ChannelError, Position, ProviderConfig, Reconciler, ResourceSpec,
//! };
//!
//! struct Stdout;
//!
//! impl CommandChannel for Stdout {
//!     fn send(&self, command: &str) -> Result<String, ChannelError> {
//!         println!("{command}");
//!         Ok(String::new())
//!     }
//! }
//!
//! let config = ProviderConfig::new("localhost:25575", "secret");
//! let reconciler = Reconciler::new(&config, &Stdout);
//!
//! let record = reconciler.create(
//!     ResourceSpec::block("minecraft:stone", Position::new(1, 2, 3)),
//!     None,
//! )?;
//! assert_eq!(record.id.as_str(), "block-1-2-3");
//! reconciler.delete(record)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandChannel`]: Sends one command and returns the reply
//! - [`ProgressCallback`]: Receives progress updates during apply
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! The transport and the terminal UI live outside this crate.

pub mod channel;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod model;
pub mod plan;
pub mod reconciler;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use channel::{CommandChannel, check_reply};
pub use config::{ProviderConfig, ProviderSettings};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use emitter::{CommandEmitter, Mutation};
pub use error::{ChannelError, Error, Result};
pub use executor::{execute, execute_simple};
pub use model::{
    AttributeValue, BlockSpec, EntitySpec, FillSpec, Position, Record, Region, ResourceId,
    ResourceKind, ResourceSpec,
};
pub use plan::{Action, Plan, PlanSummary, PlannedChange, find_aliases};
pub use reconciler::Reconciler;
pub use schema::{Attribute, Schema};
pub use types::{ApplyResult, ExecuteSummary, Operation};
