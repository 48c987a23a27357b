//! Identity-preserving diff between a persisted child collection and the
//! collection a caller sent back after editing it.
//!
//! Children carry an integer id assigned by the database; `0` marks a child
//! that has never been stored. The diff is computed against an index of the
//! persisted ids built once per call, so its cost is linear in the size of
//! both collections.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// A child record addressed by its primary key.
pub trait Identified {
    /// The persisted id, or `0` when the record is new.
    fn id(&self) -> i64;
}

/// What to do with a caller-supplied id that matches no persisted row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIdPolicy {
    /// Store the record as a new row; the supplied id is discarded.
    #[default]
    Insert,
    /// Fail the whole operation with [`EngineError::KeyNotFound`].
    Reject,
}

/// The operations turning the persisted collection into the edited one.
///
/// Apply them in field order: deletes, then updates, then inserts.
#[derive(Debug, PartialEq)]
pub struct Reconciliation<T> {
    /// Persisted ids absent from the edited collection.
    pub deletes: Vec<i64>,
    /// Edited records whose id matches a persisted row.
    pub updates: Vec<T>,
    /// Records to store as new rows.
    pub inserts: Vec<T>,
}

impl<T> Reconciliation<T> {
    /// Number of rows that survive the reconciliation.
    pub fn surviving(&self) -> usize {
        self.updates.len() + self.inserts.len()
    }
}

/// Diff `incoming` against the ids in `persisted`.
///
/// `deletes` keeps the order of `persisted`; `updates` and `inserts` keep the
/// order of `incoming`. The same non-zero id sent twice is rejected.
pub fn reconcile<T: Identified>(
    persisted: &[i64],
    incoming: Vec<T>,
    policy: UnknownIdPolicy,
) -> ResultEngine<Reconciliation<T>> {
    let index: HashSet<i64> = persisted.iter().copied().collect();
    let mut matched: HashSet<i64> = HashSet::with_capacity(incoming.len());
    let mut updates = Vec::new();
    let mut inserts = Vec::new();

    for item in incoming {
        let id = item.id();
        if id == 0 {
            inserts.push(item);
            continue;
        }
        if index.contains(&id) {
            if !matched.insert(id) {
                return Err(EngineError::Validation(format!(
                    "id {id} appears more than once"
                )));
            }
            updates.push(item);
            continue;
        }
        match policy {
            UnknownIdPolicy::Insert => inserts.push(item),
            UnknownIdPolicy::Reject => {
                return Err(EngineError::KeyNotFound(format!("payment {id}")));
            }
        }
    }

    let deletes = persisted
        .iter()
        .copied()
        .filter(|id| !matched.contains(id))
        .collect();

    Ok(Reconciliation {
        deletes,
        updates,
        inserts,
    })
}
