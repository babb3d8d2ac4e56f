//! Join Resolver: in-memory hash join between a parent row set and the
//! rows that reference it by foreign key.
//!
//! Backend queries stay flat; the join happens here in O(n + m). Secondary
//! rows whose parent is missing (e.g. a FIR deleted after its accused rows
//! were entered) are dropped, not reported as errors.

use std::collections::HashMap;
use std::hash::Hash;

/// A secondary row paired with its parent. Both are borrowed; neither
/// input collection is modified.
#[derive(Debug)]
pub struct Joined<'a, P, S> {
    pub parent: &'a P,
    pub row: &'a S,
}

impl<P, S> Clone for Joined<'_, P, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, S> Copy for Joined<'_, P, S> {}

/// Map each row's key to the row. On duplicate keys the first row wins.
pub fn index_by<'a, P, K, F>(rows: &'a [P], key: F) -> HashMap<K, &'a P>
where
    K: Eq + Hash,
    F: Fn(&P) -> K,
{
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        index.entry(key(row)).or_insert(row);
    }
    index
}

/// Pair every secondary row with the primary row its foreign key names.
///
/// Output preserves secondary-row order and holds exactly one entry per
/// secondary row whose foreign key resolves.
pub fn resolve<'a, P, S, K, PK, FK>(
    primary: &'a [P],
    secondary: &'a [S],
    primary_key: PK,
    foreign_key: FK,
) -> Vec<Joined<'a, P, S>>
where
    K: Eq + Hash,
    PK: Fn(&P) -> K,
    FK: Fn(&S) -> K,
{
    if secondary.is_empty() {
        return Vec::new();
    }
    let index = index_by(primary, primary_key);
    secondary
        .iter()
        .filter_map(|row| {
            index
                .get(&foreign_key(row))
                .map(|parent| Joined { parent: *parent, row })
        })
        .collect()
}
