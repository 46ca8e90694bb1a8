//! Planning - compares recorded state with desired specs
//!
//! A plan is computed without touching the world. Each manifest address is
//! classified as create, update, replace, delete or unchanged from what the
//! state file recorded, and the entries are ordered so that removals land
//! before anything is written at the same coordinates.

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::model::{Record, ResourceId, ResourceKind, ResourceSpec};
use crate::reconciler::{creation, in_place, removal};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// What applying a plan entry will do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Remove a recorded instance no longer in the manifest
    Delete,
    /// Delete then create because immutable attributes changed
    Replace { attributes: Vec<&'static str> },
    /// Re-apply mutable attributes in place
    Update,
    /// Create a new instance
    Create,
    /// Recorded state matches the manifest
    NoChange,
}

impl Action {
    /// Classify the transition from `prior` to `desired`
    pub fn between(prior: Option<&Record>, desired: Option<&ResourceSpec>) -> Self {
        match (prior, desired) {
            (None, Some(_)) => Self::Create,
            (Some(_), None) => Self::Delete,
            (None, None) => Self::NoChange,
            (Some(record), Some(spec)) => {
                let attributes = record.replaced_attributes(spec);
                if !attributes.is_empty() {
                    Self::Replace { attributes }
                } else if record.spec.as_ref() == Some(spec) {
                    Self::NoChange
                } else {
                    Self::Update
                }
            }
        }
    }

    /// Plan marker, terraform style
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Delete => "-",
            Self::Replace { .. } => "-/+",
            Self::Update => "~",
            Self::Create => "+",
            Self::NoChange => " ",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange)
    }

    fn order(&self) -> u8 {
        match self {
            Self::Delete => 0,
            Self::Replace { .. } => 1,
            Self::Update => 2,
            Self::Create => 3,
            Self::NoChange => 4,
        }
    }
}

/// One manifest address and what will happen to it
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChange {
    /// `kind.name` address from the manifest
    pub address: String,
    #[serde(flatten)]
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired: Option<ResourceSpec>,
}

impl PlannedChange {
    pub fn kind(&self) -> ResourceKind {
        match (&self.desired, &self.prior) {
            (Some(spec), _) => spec.kind(),
            (None, Some(record)) => record.kind,
            // Unreachable through `Plan::build`; block is as good as any
            (None, None) => ResourceKind::Block,
        }
    }

    /// ID the instance has (or will have) after this change
    pub fn id(&self) -> Option<ResourceId> {
        match (&self.action, &self.prior, &self.desired) {
            (Action::Delete, Some(record), _) => Some(record.id.clone()),
            (Action::Update | Action::NoChange, Some(record), _) => Some(record.id.clone()),
            (_, _, Some(spec)) => Some(spec.compute_id()),
            _ => None,
        }
    }

    /// Commands applying this change would send, in order
    pub fn commands(&self, config: &ProviderConfig) -> Result<Vec<String>> {
        let mut mutations = Vec::new();

        match (&self.action, &self.prior, &self.desired) {
            (Action::Create, _, Some(spec)) => {
                mutations.push(creation(spec, &spec.compute_id()));
            }
            (Action::Update, _, Some(spec)) => mutations.extend(in_place(spec)),
            (Action::Replace { .. }, Some(record), Some(spec)) => {
                mutations.push(removal(record)?);
                mutations.push(creation(spec, &spec.compute_id()));
            }
            (Action::Delete, Some(record), _) => mutations.push(removal(record)?),
            _ => {}
        }

        let mut commands = Vec::new();
        for mutation in &mutations {
            commands.extend(mutation.commands(config)?);
        }
        Ok(commands)
    }
}

/// Summary counts for a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub additions: usize,
    pub updates: usize,
    pub replacements: usize,
    pub destructions: usize,
    pub unchanged: usize,
}

impl PlanSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.updates + self.replacements + self.destructions
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Ordered set of planned changes
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    /// Compare recorded state against the desired manifest
    pub fn build(
        recorded: &BTreeMap<String, Record>,
        desired: &BTreeMap<String, ResourceSpec>,
    ) -> Self {
        let addresses: BTreeSet<&String> = recorded.keys().chain(desired.keys()).collect();

        let changes = addresses
            .into_iter()
            .map(|address| {
                let prior = recorded.get(address);
                let spec = desired.get(address);
                PlannedChange {
                    address: address.clone(),
                    action: Action::between(prior, spec),
                    prior: prior.cloned(),
                    desired: spec.cloned(),
                }
            })
            .collect();

        Self::ordered(changes)
    }

    /// Plan that deletes every recorded instance
    pub fn destroy(recorded: &BTreeMap<String, Record>) -> Self {
        let changes = recorded
            .iter()
            .map(|(address, record)| PlannedChange {
                address: address.clone(),
                action: Action::Delete,
                prior: Some(record.clone()),
                desired: None,
            })
            .collect();

        Self::ordered(changes)
    }

    fn ordered(mut changes: Vec<PlannedChange>) -> Self {
        changes.sort_by(|a, b| {
            a.action
                .order()
                .cmp(&b.action.order())
                .then_with(|| a.address.cmp(&b.address))
        });
        Self { changes }
    }

    /// Filter plan to only include entries matching a target pattern
    ///
    /// Target format: "kind" or "kind.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (kind, name) = parse_target(t);
                Self {
                    changes: self
                        .changes
                        .into_iter()
                        .filter(|c| matches_filter(c, kind.as_deref(), name.as_deref()))
                        .collect(),
                }
            }
        }
    }

    /// Entries that change something
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(|c| c.action.is_change())
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.action {
                Action::Create => summary.additions += 1,
                Action::Update => summary.updates += 1,
                Action::Replace { .. } => summary.replacements += 1,
                Action::Delete => summary.destructions += 1,
                Action::NoChange => summary.unchanged += 1,
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Manifest addresses that derive the same ID.
///
/// Such resources act on the same coordinates and overwrite each other.
pub fn find_aliases(desired: &BTreeMap<String, ResourceSpec>) -> Vec<(ResourceId, Vec<String>)> {
    let mut by_id: BTreeMap<ResourceId, Vec<String>> = BTreeMap::new();
    for (address, spec) in desired {
        by_id
            .entry(spec.compute_id())
            .or_default()
            .push(address.clone());
    }
    by_id
        .into_iter()
        .filter(|(_, addresses)| addresses.len() > 1)
        .collect()
}

/// Parse a target string like "kind.name" into (kind, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.len() {
        1 => (Some(parts[0].to_string()), None),
        2 => (Some(parts[0].to_string()), Some(parts[1].to_string())),
        _ => (None, Some(target.to_string())),
    }
}

fn matches_filter(change: &PlannedChange, kind: Option<&str>, name: Option<&str>) -> bool {
    if let Some(k) = kind
        && change.kind().as_str() != k
    {
        return false;
    }

    if let Some(n) = name {
        let own_name = change
            .address
            .split_once('.')
            .map_or(change.address.as_str(), |(_, name)| name);
        if own_name != n {
            return false;
        }
    }

    true
}
