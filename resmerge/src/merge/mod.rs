//! Merging ordered resource sets into one add/remove stream.
//!
//! The merger owns the sets in priority order (last added wins conflicts)
//! and turns their current state into consumer callbacks: one `add_item`
//! per winning key, one `remove_item` per retired item. Consumers decide
//! what a win means (the merged-tree writer compiles and serializes; a
//! test consumer just records).

pub mod snapshot;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::MergeError;
use crate::model::ResourceItem;
use crate::set::ResourceSet;

/// Receiver of one merge pass.
pub trait MergeConsumer {
    /// Called once before any item callback; resets per-pass state.
    fn start(&mut self) -> Result<(), MergeError>;

    /// The winning item for one key. Called for every live key, touched or
    /// not; incremental consumers filter on status themselves.
    fn add_item(&mut self, item: &Arc<ResourceItem>) -> Result<(), MergeError>;

    /// An item retired since the last merge, with the item now winning its
    /// key (if any key holder remains).
    fn remove_item(
        &mut self,
        removed: &Arc<ResourceItem>,
        replaced_by: Option<&Arc<ResourceItem>>,
    ) -> Result<(), MergeError>;
}

/// Merges resource sets in priority order.
pub struct ResourceMerger {
    sets: Vec<ResourceSet>,
}

impl ResourceMerger {
    /// Creates an empty merger.
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Appends a set. Later sets take priority over earlier ones.
    pub fn add_set(&mut self, set: ResourceSet) {
        self.sets.push(set);
    }

    /// The sets in priority order (lowest first).
    pub fn sets(&self) -> &[ResourceSet] {
        &self.sets
    }

    /// Mutable access for routing incremental file events.
    pub fn sets_mut(&mut self) -> &mut [ResourceSet] {
        &mut self.sets
    }

    /// Runs one merge pass into the consumer.
    ///
    /// Per key, the winner is the highest-priority live item; two live items
    /// under one key *within* one set are a duplicate conflict. When a
    /// removal leaves a lower-priority item winning, that item is touched so
    /// incremental consumers re-emit it.
    pub fn merge_to(&self, consumer: &mut dyn MergeConsumer) -> Result<(), MergeError> {
        consumer.start()?;

        // Per-set key → items, generated expansion just below its owner.
        let mut maps = Vec::new();
        for set in &self.sets {
            if let Some(generated) = set.generated_set() {
                maps.push(generated.data_map());
            }
            maps.push(set.data_map());
        }

        let keys: BTreeSet<&String> = maps.iter().flat_map(|m| m.keys()).collect();
        debug!(sets = self.sets.len(), keys = keys.len(), "merge pass");

        for key in keys {
            let mut winner: Option<Arc<ResourceItem>> = None;
            let mut removed_items: Vec<Arc<ResourceItem>> = Vec::new();

            for map in &maps {
                let Some(items) = map.get(key.as_str()) else {
                    continue;
                };
                let live: Vec<&Arc<ResourceItem>> =
                    items.iter().filter(|i| !i.is_removed()).collect();
                if live.len() > 1 {
                    return Err(duplicate_error(key, &live));
                }
                if let Some(item) = live.first() {
                    winner = Some(Arc::clone(item));
                }
                removed_items.extend(items.iter().filter(|i| i.is_removed()).cloned());
            }

            if !removed_items.is_empty() {
                if let Some(winner) = &winner {
                    // The surviving definition becomes visible again.
                    winner.set_touched();
                }
                for removed in &removed_items {
                    consumer.remove_item(removed, winner.as_ref())?;
                }
            }
            if let Some(winner) = &winner {
                consumer.add_item(winner)?;
            }
        }
        Ok(())
    }

    /// Drops removed items and resets statuses in every set.
    pub fn post_merge_cleanup(&mut self) {
        for set in &mut self.sets {
            set.post_merge_cleanup();
        }
    }
}

impl Default for ResourceMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate_error(key: &str, live: &[&Arc<ResourceItem>]) -> MergeError {
    let path_of = |item: &Arc<ResourceItem>| {
        item.source()
            .map(|f| f.path().to_path_buf())
            .unwrap_or_default()
    };
    MergeError::DuplicateResource {
        key: key.to_string(),
        first: path_of(live[0]),
        second: path_of(live[1]),
    }
}
