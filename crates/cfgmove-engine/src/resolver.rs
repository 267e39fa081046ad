//! Rename batch resolution
//!
//! Takes a raw list of rename requests and produces the one list the rest of
//! the system consumes: ordered so parent-like renames come first,
//! cross-updated for parent/child interdependencies, with duplicate targets
//! removed and no-ops dropped. Requests from different layers never
//! interact. The resolved list is recomputed from scratch on every
//! orchestration pass.

use crate::types::RenameRequest;
use indexmap::IndexMap;

/// Resolve a raw rename batch into a list safe to apply in order
///
/// Requests are grouped by `config_path` and each group is resolved
/// independently:
///
/// 1. Order by ascending depth of `new_key`, tie-broken by ascending depth
///    of `original_key`, so shallower target renames are considered first.
/// 2. Cross-update each request against already-processed renames, and
///    retroactively rewrite emitted requests when a root profile is renamed
///    after its descendants were emitted. Child-first and parent-first
///    batches converge to the same output.
/// 3. Remove duplicate targets ([`remove_duplicate_renames`]).
/// 4. Drop requests that rename nothing.
#[must_use]
pub fn resolve_batch(requests: &[RenameRequest]) -> Vec<RenameRequest> {
    let mut groups: IndexMap<&str, Vec<RenameRequest>> = IndexMap::new();
    for request in requests {
        groups
            .entry(request.config_path.as_str())
            .or_default()
            .push(request.clone());
    }

    let mut resolved = Vec::with_capacity(requests.len());
    for (_, group) in groups {
        resolved.extend(resolve_group(group));
    }
    resolved
}

fn resolve_group(mut requests: Vec<RenameRequest>) -> Vec<RenameRequest> {
    requests.sort_by_key(|r| (depth(&r.new_key), depth(&r.original_key)));

    // Running map of processed original -> processed new, in order
    let mut processed: Vec<(String, String)> = Vec::new();
    let mut output: Vec<RenameRequest> = Vec::new();

    for request in requests {
        let mut original = request.original_key;
        let mut renamed = request.new_key;

        // A child request authored against the pre-rename parent name is
        // corrected to reference the already-renamed parent.
        if let Some(updated) = substitute_processed_prefix(&processed, &original) {
            original = updated;
        }
        if let Some(updated) = substitute_processed_prefix(&processed, &renamed) {
            renamed = updated;
        }

        // A root rename processed after its descendants were emitted
        // rewrites those entries in place ("child-first" batches).
        if depth(&original) == 1 && original != renamed {
            for earlier in &mut output {
                if let Some(updated) =
                    replace_segment_prefix(&earlier.original_key, &original, &renamed)
                {
                    earlier.original_key = updated;
                }
                if let Some(updated) =
                    replace_segment_prefix(&earlier.new_key, &original, &renamed)
                {
                    earlier.new_key = updated;
                }
            }
        }

        processed.push((original.clone(), renamed.clone()));
        output.push(RenameRequest {
            original_key: original,
            new_key: renamed,
            config_path: request.config_path,
        });
    }

    remove_duplicate_renames(output)
        .into_iter()
        .filter(|request| !request.is_noop())
        .collect()
}

/// Remove requests collapsing onto an already-claimed target
///
/// Requests are grouped by `(config_path, new_key)`. A group where every
/// `original_key` shares the same trailing segment is kept whole: those are
/// legitimately divergent sources collapsing to siblings with the same leaf
/// name. Otherwise only the request whose `original_key` is closest to root
/// survives — the broader rename is authoritative over a narrower, likely
/// stale, one.
#[must_use]
pub fn remove_duplicate_renames(requests: Vec<RenameRequest>) -> Vec<RenameRequest> {
    let mut groups: IndexMap<(&str, &str), Vec<usize>> = IndexMap::new();
    for (index, request) in requests.iter().enumerate() {
        groups
            .entry((request.config_path.as_str(), request.new_key.as_str()))
            .or_default()
            .push(index);
    }

    let mut keep = vec![true; requests.len()];
    for indices in groups.values().filter(|indices| indices.len() > 1) {
        let mut tails = indices
            .iter()
            .map(|&index| last_segment(&requests[index].original_key));
        let first_tail = tails.next().unwrap_or("");
        if tails.all(|tail| tail == first_tail) {
            continue;
        }
        if let Some(&winner) = indices
            .iter()
            .min_by_key(|&&index| depth(&requests[index].original_key))
        {
            for &index in indices {
                keep[index] = index == winner;
            }
        }
    }

    requests
        .into_iter()
        .zip(keep)
        .filter_map(|(request, kept)| kept.then_some(request))
        .collect()
}

/// Substitute the longest strict-prefix match from the processed map
fn substitute_processed_prefix(processed: &[(String, String)], key: &str) -> Option<String> {
    let segments: Vec<&str> = key.split('.').collect();
    for prefix_len in (1..segments.len()).rev() {
        let prefix = segments[..prefix_len].join(".");
        // Latest processed mapping wins
        if let Some((_, to)) = processed.iter().rev().find(|(from, _)| *from == prefix) {
            let mut updated = to.clone();
            for rest in &segments[prefix_len..] {
                updated.push('.');
                updated.push_str(rest);
            }
            return Some(updated);
        }
    }
    None
}

/// Rewrite the leading `from` segments of `key` to `to`, segment-aware
fn replace_segment_prefix(key: &str, from: &str, to: &str) -> Option<String> {
    let key_segments: Vec<&str> = key.split('.').collect();
    let from_segments: Vec<&str> = from.split('.').collect();
    if key_segments.len() < from_segments.len()
        || key_segments[..from_segments.len()] != from_segments[..]
    {
        return None;
    }
    let mut updated = to.to_string();
    for rest in &key_segments[from_segments.len()..] {
        updated.push('.');
        updated.push_str(rest);
    }
    Some(updated)
}

fn depth(key: &str) -> usize {
    key.split('.').count()
}

fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}
