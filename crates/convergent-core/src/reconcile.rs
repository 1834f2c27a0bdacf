// ── List reconciliation ──
//
// Merges the user's ordered declaration with the service's authoritative
// collection. Matching is by business key only, never by position: a
// positional diff would reorder or overwrite the user's items as soon as
// the remote list drifts.
//
// Output order: matched items in declared order, then unmatched observed
// items in their remote order. Declared items the service has no record
// of are dropped. Pure; no I/O.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{BusinessKey, Keyed, RemoteItem};

/// Merge `declared` with `observed`, returning observed (authoritative)
/// values in the user's order with remote-only items at the tail.
///
/// When the service repeats a key, its last occurrence is the one kept.
pub fn reconcile<D, O>(declared: &[D], observed: &[O]) -> Vec<O>
where
    D: Keyed,
    O: Keyed<Key = D::Key> + Clone,
{
    let (merged, stats) = merge_by(declared, observed, D::business_key, O::business_key);
    if stats.dropped > 0 || stats.surfaced > 0 {
        warn!(
            dropped = stats.dropped,
            surfaced = stats.surfaced,
            "declared and observed collections differ"
        );
    }
    merged
}

/// The same merge for lists of plain values, where each value is its own
/// key (e.g. the AS numbers of one assignment).
pub fn reconcile_values<T>(declared: &[T], observed: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone + Debug,
{
    merge_by(declared, observed, T::clone, T::clone).0
}

/// Reorder the list attribute `name` of each merged item to follow the
/// declared item with the same key. Items nobody declared, and attributes
/// that are not lists on both sides, are left as the service returned them.
pub fn reconcile_nested(declared: &[RemoteItem], merged: &mut [RemoteItem], name: &str) {
    let by_key: HashMap<&BusinessKey, &RemoteItem> =
        declared.iter().map(|d| (&d.key, d)).collect();

    for item in merged {
        let Some(Value::Array(wanted)) = by_key.get(&item.key).and_then(|d| d.attribute(name))
        else {
            continue;
        };
        if let Some(Value::Array(actual)) = item.attributes.get_mut(name) {
            *actual = reconcile_json_values(wanted, actual);
        }
    }
}

// JSON values are not `Hash`; their compact text is.
fn reconcile_json_values(declared: &[Value], observed: &[Value]) -> Vec<Value> {
    let declared_keys: Vec<String> = declared.iter().map(Value::to_string).collect();
    let observed_keys: Vec<String> = observed.iter().map(Value::to_string).collect();
    let by_text: HashMap<&str, &Value> = observed_keys
        .iter()
        .map(String::as_str)
        .zip(observed)
        .collect();

    reconcile_values(&declared_keys, &observed_keys)
        .iter()
        .filter_map(|text| by_text.get(text.as_str()).map(|v| (*v).clone()))
        .collect()
}

#[derive(Debug, Default)]
struct MergeStats {
    dropped: usize,
    surfaced: usize,
}

fn merge_by<D, O, K>(
    declared: &[D],
    observed: &[O],
    declared_key: impl Fn(&D) -> K,
    observed_key: impl Fn(&O) -> K,
) -> (Vec<O>, MergeStats)
where
    O: Clone,
    K: Eq + Hash + Debug,
{
    // Later duplicates overwrite earlier ones.
    let mut unconsumed: HashMap<K, usize> = HashMap::with_capacity(observed.len());
    for (i, item) in observed.iter().enumerate() {
        unconsumed.insert(observed_key(item), i);
    }

    let mut merged = Vec::with_capacity(declared.len().max(observed.len()));
    let mut stats = MergeStats::default();

    for item in declared {
        let key = declared_key(item);
        match unconsumed.remove(&key) {
            Some(i) => merged.push(observed[i].clone()),
            None => {
                debug!(?key, "declared item has no remote counterpart, dropping");
                stats.dropped += 1;
            }
        }
    }

    // Tail: whatever was never claimed, in remote order. Only the winning
    // index of a duplicated key is emitted.
    for (i, item) in observed.iter().enumerate() {
        let key = observed_key(item);
        if unconsumed.get(&key) == Some(&i) {
            debug!(?key, "remote item was not declared, keeping at tail");
            stats.surfaced += 1;
            merged.push(item.clone());
        }
    }

    (merged, stats)
}
