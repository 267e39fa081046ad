//! Batch orchestration
//!
//! Drives a whole rename batch: resolve, then per rename guard → move/nest →
//! defaults repair, then rewrite and replay pending edits. Commit and
//! simulate run the exact same per-rename step against different stores, so
//! the preview cannot drift from the real mutation; only persistence and the
//! backing store differ.
//!
//! Error handling is two-tiered. Critical errors (occupied target, circular
//! reference) abort the batch immediately; renames already applied stay
//! applied, there is no rollback. Skippable errors (bad key, missing source
//! or layer) are logged, recorded in the report, and the batch continues.

use crate::error::MoveError;
use crate::guard;
use crate::types::{MoveReport, PendingChange, RenameMap, RenameRequest, SkippedRename};
use crate::{defaults, mover, pending, resolver};
use cfgmove_path::{ProfileId, StoragePath};
use cfgmove_store::{validate_store, ConfigStore, EphemeralStore, LayerContext};
use indexmap::IndexSet;

/// Result of a simulate pass
///
/// Holds the mutated snapshot alongside the report, so callers can render
/// the previewed tree (typically through
/// [`redacted_view`](crate::redact::redacted_view)) without the mutations
/// ever reaching the real store.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Snapshot the batch ran against
    pub store: EphemeralStore,

    /// What the batch did to the snapshot
    pub report: MoveReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Commit,
    Simulate,
}

/// Apply a rename batch and replay pending edits against the real store
///
/// The active layer is validated ([`validate_store`]) and the requests
/// resolved ([`resolver::resolve_batch`]) before anything runs. Each applied
/// rename is persisted before the next one starts, because later guard
/// checks read the mutated result of earlier renames. Pending `changes` and
/// `deletions` are rewritten against the resolved batch and replayed after
/// every rename has run.
///
/// # Errors
/// Returns a contract violation when the active layer is unreachable, or
/// the first critical error; everything applied up to that point stays
/// applied.
pub fn commit(
    store: &mut dyn ConfigStore,
    ctx: &LayerContext,
    requests: &[RenameRequest],
    changes: &[PendingChange],
    deletions: &[PendingChange],
) -> Result<MoveReport, MoveError> {
    validate_store(store, &ctx.resolve(&ctx.config_path))?;
    let requests = normalize_requests(ctx, requests);
    let changes = normalize_changes(ctx, changes);
    let deletions = normalize_changes(ctx, deletions);
    let resolved = resolver::resolve_batch(&requests);
    run(store, &resolved, &changes, &deletions, Mode::Commit)
}

/// Apply a rename batch and pending edits against an ephemeral snapshot
///
/// Same transformation rules as [`commit`], run against deep clones of the
/// involved layers; the source store is never touched and nothing is
/// persisted. Critical errors still surface, so a preview fails exactly
/// where the real run would.
///
/// # Errors
/// Returns a contract violation when the active layer is unreachable, or
/// the first critical error the batch would hit.
pub fn simulate(
    store: &dyn ConfigStore,
    ctx: &LayerContext,
    requests: &[RenameRequest],
    changes: &[PendingChange],
    deletions: &[PendingChange],
) -> Result<Simulation, MoveError> {
    validate_store(store, &ctx.resolve(&ctx.config_path))?;
    let requests = normalize_requests(ctx, requests);
    let changes = normalize_changes(ctx, changes);
    let deletions = normalize_changes(ctx, deletions);

    let mut involved: IndexSet<&str> = IndexSet::new();
    involved.insert(ctx.config_path.as_str());
    for request in &requests {
        involved.insert(request.config_path.as_str());
    }
    for change in changes.iter().chain(&deletions) {
        involved.insert(change.config_path.as_str());
    }

    let mut snapshot = EphemeralStore::snapshot(store, involved);
    let resolved = resolver::resolve_batch(&requests);
    let report = run(&mut snapshot, &resolved, &changes, &deletions, Mode::Simulate)?;
    Ok(Simulation {
        store: snapshot,
        report,
    })
}

fn run(
    store: &mut dyn ConfigStore,
    resolved: &[RenameRequest],
    changes: &[PendingChange],
    deletions: &[PendingChange],
    mode: Mode,
) -> Result<MoveReport, MoveError> {
    let mut report = MoveReport::default();

    for request in resolved {
        match apply_rename(store, request) {
            Ok(()) => {
                tracing::info!(
                    original = %request.original_key,
                    renamed = %request.new_key,
                    config_path = %request.config_path,
                    "profile renamed"
                );
                if mode == Mode::Commit {
                    if let Err(err) = store.persist(&request.config_path) {
                        let err = MoveError::from(err);
                        if err.is_critical() {
                            return Err(err);
                        }
                        tracing::warn!(
                            config_path = %request.config_path,
                            error = %err,
                            "persist failed after rename; continuing"
                        );
                    }
                }
                report.applied.push(request.clone());
            }
            Err(err) if err.is_critical() => return Err(err),
            Err(err) => {
                tracing::warn!(
                    original = %request.original_key,
                    renamed = %request.new_key,
                    config_path = %request.config_path,
                    error = %err,
                    "rename skipped"
                );
                report.skipped.push(SkippedRename {
                    request: request.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    // The full resolved batch drives the rewrite, not just the applied
    // renames: a rename whose source is absent was skipped because the
    // profile is itself a still-pending creation, and its queued edits must
    // land at the post-rename key.
    let renames = RenameMap::from_resolved(resolved);
    for change in changes {
        let rewritten = pending::rewrite_change(change, &renames);
        match store.layer_mut(&rewritten.config_path) {
            Ok(layer) => {
                pending::apply_change(layer, &rewritten);
                report.changes_applied += 1;
            }
            Err(err) => {
                tracing::warn!(
                    key = %rewritten.key,
                    config_path = %rewritten.config_path,
                    error = %err,
                    "pending change dropped"
                );
            }
        }
    }
    for deletion in deletions {
        let rewritten = pending::rewrite_change(deletion, &renames);
        match store.layer_mut(&rewritten.config_path) {
            Ok(layer) => {
                pending::apply_deletion(layer, &rewritten);
                report.deletions_applied += 1;
            }
            Err(err) => {
                tracing::warn!(
                    key = %rewritten.key,
                    config_path = %rewritten.config_path,
                    error = %err,
                    "pending deletion dropped"
                );
            }
        }
    }
    if mode == Mode::Commit && (report.changes_applied > 0 || report.deletions_applied > 0) {
        let mut persisted: IndexSet<&str> = IndexSet::new();
        for change in changes.iter().chain(deletions) {
            persisted.insert(change.config_path.as_str());
        }
        for config_path in persisted {
            if let Err(err) = store.persist(config_path) {
                tracing::warn!(
                    config_path,
                    error = %err,
                    "persist failed after pending replay; continuing"
                );
            }
        }
    }

    Ok(report)
}

/// One rename, commit and simulate alike
fn apply_rename(store: &mut dyn ConfigStore, request: &RenameRequest) -> Result<(), MoveError> {
    let original: ProfileId = request.original_key.parse()?;
    let renamed: ProfileId = request.new_key.parse()?;

    if guard::would_create_circular_reference(&original, &renamed) {
        return Err(MoveError::CircularReference {
            original: request.original_key.clone(),
            renamed: request.new_key.clone(),
        });
    }

    let layer = store.layer_mut(&request.config_path)?;
    if guard::is_nested_profile_creation(&original, &renamed) {
        mover::create_nested_profile_structure(layer, &original, &renamed)?;
    } else {
        let source = StoragePath::from(&original);
        let target = StoragePath::from(&renamed);
        mover::move_profile_in_place(layer, &source, &target)?;
    }

    // Defaults repair is best-effort and rides the step's final persist
    let repaired = defaults::repair(&layer.defaults, &original, &renamed);
    if repaired != layer.defaults {
        layer.defaults = repaired;
    }
    Ok(())
}

fn normalize_requests(ctx: &LayerContext, requests: &[RenameRequest]) -> Vec<RenameRequest> {
    requests
        .iter()
        .map(|request| {
            let mut normalized = request.clone();
            normalized.config_path = ctx.resolve(&request.config_path);
            normalized
        })
        .collect()
}

fn normalize_changes(ctx: &LayerContext, changes: &[PendingChange]) -> Vec<PendingChange> {
    changes
        .iter()
        .map(|change| {
            let mut normalized = change.clone();
            normalized.config_path = ctx.resolve(&change.config_path);
            normalized
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgmove_store::{ConfigLayer, MemoryStore, StoreError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const LAYER: &str = "/cfg/config.json";

    fn req(original: &str, renamed: &str) -> RenameRequest {
        RenameRequest::new(original, renamed, LAYER)
    }

    fn path(s: &str) -> StoragePath {
        let id: ProfileId = s.parse().unwrap();
        StoragePath::from(&id)
    }

    fn sample_store() -> MemoryStore {
        let layer = ConfigLayer::from_value(
            LAYER,
            &json!({
                "defaults": { "zosmf": "a" },
                "profiles": {
                    "a": {
                        "type": "zosmf",
                        "properties": { "host": "h" },
                        "secure": ["profiles.a.properties.host"]
                    },
                    "b": { "type": "tso" }
                }
            }),
        )
        .unwrap();
        let mut store = MemoryStore::new();
        store.insert_layer(layer);
        store
    }

    fn ctx() -> LayerContext {
        LayerContext::new(LAYER)
    }

    #[test]
    fn commit_applies_rename_and_persists() {
        let mut store = sample_store();
        let report = commit(&mut store, &ctx(), &[req("a", "renamed")], &[], &[]).unwrap();

        assert_eq!(report.applied, vec![req("a", "renamed")]);
        assert!(report.skipped.is_empty());

        let layer = store.layer(LAYER).unwrap();
        assert!(layer.node(&path("a")).is_none());
        assert!(layer.node(&path("renamed")).is_some());
        // Defaults followed the rename
        assert_eq!(layer.defaults.get("zosmf"), Some(&json!("renamed")));
        // Secret reference followed the rename
        assert_eq!(
            layer.node(&path("renamed")).unwrap().secure,
            vec!["profiles.renamed.properties.host"]
        );

        // Persisted state matches the live state
        assert_eq!(store.saved_layer(LAYER), Some(store.layer(LAYER).unwrap()));
    }

    #[test]
    fn commit_nests_root_profile_under_itself() {
        let mut store = sample_store();
        commit(&mut store, &ctx(), &[req("a", "a.child")], &[], &[]).unwrap();

        let layer = store.layer(LAYER).unwrap();
        let parent = layer.node(&path("a")).unwrap();
        assert_eq!(parent.profile_type.as_deref(), Some("zosmf"));
        let child = layer.node(&path("a.child")).unwrap();
        assert_eq!(child.properties.get("host"), Some(&json!("h")));
    }

    #[test]
    fn circular_reference_aborts_the_batch() {
        let mut store = sample_store();
        // The second request sorts after the circular one and never runs
        let result = commit(
            &mut store,
            &ctx(),
            &[req("a", "a.a"), req("b", "x.y.z")],
            &[],
            &[],
        );
        assert!(matches!(
            result,
            Err(MoveError::CircularReference { .. })
        ));
        assert!(store.layer(LAYER).unwrap().node(&path("b")).is_some());
    }

    #[test]
    fn occupied_target_aborts_the_batch() {
        let mut store = sample_store();
        let result = commit(&mut store, &ctx(), &[req("a", "b")], &[], &[]);
        assert!(matches!(result, Err(MoveError::TargetAlreadyExists(_))));
    }

    #[test]
    fn earlier_renames_stay_applied_after_abort() {
        let mut store = sample_store();
        let result = commit(
            &mut store,
            &ctx(),
            &[req("b", "renamed"), req("a", "a.a")],
            &[],
            &[],
        );
        assert!(result.is_err());
        // The first rename was applied and persisted before the abort
        assert!(store.layer(LAYER).unwrap().node(&path("renamed")).is_some());
        assert!(store
            .saved_layer(LAYER)
            .unwrap()
            .node(&path("renamed"))
            .is_some());
    }

    #[test]
    fn missing_source_is_skipped_and_batch_continues() {
        let mut store = sample_store();
        let report = commit(
            &mut store,
            &ctx(),
            &[req("ghost", "somewhere"), req("a", "renamed")],
            &[],
            &[],
        )
        .unwrap();

        assert_eq!(report.applied, vec![req("a", "renamed")]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].request, req("ghost", "somewhere"));
        assert!(report.skipped[0].reason.contains("not found"));
    }

    #[test]
    fn invalid_key_is_skipped() {
        let mut store = sample_store();
        let report = commit(&mut store, &ctx(), &[req("a..b", "x")], &[], &[]).unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn missing_layer_is_skipped() {
        let mut store = sample_store();
        let report = commit(
            &mut store,
            &ctx(),
            &[RenameRequest::new("a", "x", "/cfg/missing.json")],
            &[],
            &[],
        )
        .unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn pending_changes_are_rewritten_and_replayed() {
        let mut store = sample_store();
        let change = PendingChange::new("profiles.a.properties.port", LAYER).with_value(json!(443));
        let report = commit(&mut store, &ctx(), &[req("a", "renamed")], &[change], &[]).unwrap();
        assert_eq!(report.changes_applied, 1);

        let layer = store.layer(LAYER).unwrap();
        assert_eq!(
            layer.node(&path("renamed")).unwrap().properties.get("port"),
            Some(&json!(443))
        );
        // The edit landed at the new location only
        assert!(layer.node(&path("a")).is_none());
        // Replayed edits reach the persisted snapshot
        assert_eq!(store.saved_layer(LAYER), Some(store.layer(LAYER).unwrap()));
    }

    #[test]
    fn rename_of_pending_creation_still_rewrites_changes() {
        // "new" does not exist yet: its creation is itself queued. The
        // rename is skipped, but the queued edit must follow it so the
        // profile materializes at the post-rename key.
        let mut store = sample_store();
        let change =
            PendingChange::new("profiles.new.properties.host", LAYER).with_value(json!("h"));
        let report = commit(
            &mut store,
            &ctx(),
            &[req("new", "created")],
            &[change],
            &[],
        )
        .unwrap();

        assert!(report.applied.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.changes_applied, 1);

        let layer = store.layer(LAYER).unwrap();
        assert!(layer.node(&path("new")).is_none());
        assert_eq!(
            layer.node(&path("created")).unwrap().properties.get("host"),
            Some(&json!("h"))
        );
    }

    #[test]
    fn simulate_rewrites_changes_for_skipped_pending_creations() {
        let store = sample_store();
        let change =
            PendingChange::new("profiles.new.properties.host", LAYER).with_value(json!("h"));
        let simulation = simulate(
            &store,
            &ctx(),
            &[req("new", "created")],
            &[change],
            &[],
        )
        .unwrap();

        let preview = simulation.store.layer(LAYER).unwrap();
        assert!(preview.node(&path("new")).is_none());
        assert!(preview.node(&path("created")).is_some());
    }

    #[test]
    fn pending_deletions_are_rewritten_and_replayed() {
        let mut store = sample_store();
        let deletion = PendingChange::new("profiles.a.properties.host", LAYER);
        let report =
            commit(&mut store, &ctx(), &[req("a", "renamed")], &[], &[deletion]).unwrap();
        assert_eq!(report.deletions_applied, 1);

        let layer = store.layer(LAYER).unwrap();
        assert!(layer
            .node(&path("renamed"))
            .unwrap()
            .properties
            .is_empty());
    }

    #[test]
    fn home_spelling_lands_on_the_active_layer() {
        let layer = ConfigLayer::from_value(
            "/home/user/config.json",
            &json!({ "profiles": { "a": { "type": "t" } } }),
        )
        .unwrap();
        let mut store = MemoryStore::new();
        store.insert_layer(layer);

        let ctx = LayerContext::new("/home/user/config.json").with_home_dir("/home/user");
        let report = commit(
            &mut store,
            &ctx,
            &[RenameRequest::new("a", "renamed", "~/config.json")],
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(report.applied.len(), 1);
        assert!(store
            .layer("/home/user/config.json")
            .unwrap()
            .node(&path("renamed"))
            .is_some());
    }

    #[test]
    fn simulate_never_touches_the_source_store() {
        let store = sample_store();
        let simulation = simulate(&store, &ctx(), &[req("a", "renamed")], &[], &[]).unwrap();

        // Preview shows the rename
        let preview = simulation.store.layer(LAYER).unwrap();
        assert!(preview.node(&path("renamed")).is_some());
        // Source unchanged, nothing persisted
        assert!(store.layer(LAYER).unwrap().node(&path("a")).is_some());
        assert!(store.saved_layer(LAYER).is_none());
    }

    #[test]
    fn simulate_surfaces_critical_errors() {
        let store = sample_store();
        let result = simulate(&store, &ctx(), &[req("a", "b")], &[], &[]);
        assert!(matches!(result, Err(MoveError::TargetAlreadyExists(_))));
    }

    #[test]
    fn simulate_and_commit_agree() {
        let requests = [req("a", "x.y"), req("b", "b2")];
        let change = PendingChange::new("profiles.a.properties.port", LAYER).with_value(json!(1));

        let source = sample_store();
        let simulation = simulate(
            &source,
            &ctx(),
            &requests,
            std::slice::from_ref(&change),
            &[],
        )
        .unwrap();

        let mut store = sample_store();
        let report = commit(&mut store, &ctx(), &requests, &[change], &[]).unwrap();

        assert_eq!(simulation.report, report);
        assert_eq!(
            simulation.store.layer(LAYER).unwrap().to_value(),
            store.layer(LAYER).unwrap().to_value()
        );
    }

    #[test]
    fn unreachable_active_layer_is_a_contract_violation() {
        let mut store = MemoryStore::new();
        let result = commit(&mut store, &ctx(), &[req("a", "b")], &[], &[]);
        assert!(matches!(
            result,
            Err(MoveError::Store(StoreError::ContractViolation(_)))
        ));

        let result = simulate(&store, &ctx(), &[req("a", "b")], &[], &[]);
        assert!(matches!(
            result,
            Err(MoveError::Store(StoreError::ContractViolation(_)))
        ));
    }

    #[test]
    fn empty_batch_is_an_empty_report() {
        let mut store = sample_store();
        let report = commit(&mut store, &ctx(), &[], &[], &[]).unwrap();
        assert!(report.is_empty());
        assert!(store.saved_layer(LAYER).is_none());
    }
}
