use std::collections::{HashMap, HashSet};

use tracing::warn;

/// An entity kept in an id-keyed, ordered collection.
pub(crate) trait Keyed {
    fn key(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeCounts {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Reconciles `current` against `incoming` records.
///
/// Entities whose id reappears are passed to `update` and kept (same object),
/// new ids are built with `create`, and ids missing from `incoming` are
/// dropped. Afterwards `current` is ordered as the ids appear in `incoming`.
/// A repeated id in `incoming` is skipped.
pub(crate) fn reconcile<T, R>(
    current: &mut Vec<T>,
    incoming: impl IntoIterator<Item = R>,
    key_of: impl Fn(&R) -> i64,
    mut update: impl FnMut(&T, R),
    mut create: impl FnMut(R) -> T,
) -> MergeCounts
where
    T: Keyed,
{
    let mut previous: HashMap<i64, T> = std::mem::take(current)
        .into_iter()
        .map(|e| (e.key(), e))
        .collect();
    let mut seen = HashSet::new();
    let mut counts = MergeCounts::default();

    for record in incoming {
        let id = key_of(&record);
        if !seen.insert(id) {
            warn!(id, "duplicate id in snapshot, keeping first occurrence");
            continue;
        }
        match previous.remove(&id) {
            Some(entity) => {
                update(&entity, record);
                current.push(entity);
                counts.updated += 1;
            }
            None => {
                current.push(create(record));
                counts.added += 1;
            }
        }
    }

    counts.removed = previous.len();
    counts
}
