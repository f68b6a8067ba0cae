//! Three-way reconciliation of the remote inventory against local state
//!
//! Every photo ends up in exactly one bucket: already present (kept),
//! missing locally (fetched) or present locally but no longer listed
//! (deleted). Reconciliation is pure; the caller performs and logs the
//! destructive part.

use std::collections::{BTreeSet, HashSet};

use crate::app::inventory::Inventory;
use crate::app::models::{Identifier, PhotoDescriptor};

/// Snapshot of the identifiers present in the destination directory
pub type LocalState = HashSet<Identifier>;

/// Work needed to make the destination equal to the remote set
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Local files with no counterpart in the inventory, sorted
    pub to_delete: BTreeSet<Identifier>,
    /// Photos missing locally, in inventory order
    pub to_fetch: Vec<PhotoDescriptor>,
    /// Number of listed photos already present locally
    pub kept: usize,
}

impl SyncPlan {
    /// Whether the destination already matches the inventory
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_fetch.is_empty()
    }
}

/// Compute the delete set and fetch set
///
/// `to_delete = local - identifiers(inventory)` and `to_fetch` is the
/// inventory restricted to identifiers absent from `local`.
pub fn plan(inventory: &Inventory, local: &LocalState) -> SyncPlan {
    let mut listed: HashSet<&Identifier> = HashSet::with_capacity(inventory.len());
    let mut to_fetch = Vec::new();
    let mut kept = 0;

    for descriptor in inventory {
        let identifier = descriptor.identifier();
        listed.insert(identifier);
        if local.contains(identifier) {
            kept += 1;
        } else {
            to_fetch.push(descriptor.clone());
        }
    }

    let to_delete = local
        .iter()
        .filter(|identifier| !listed.contains(identifier))
        .cloned()
        .collect();

    SyncPlan {
        to_delete,
        to_fetch,
        kept,
    }
}
