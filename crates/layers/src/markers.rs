use std::collections::{BTreeMap, BTreeSet};

use foundation::MarkerId;
use runtime::Revision;
use store::{StoreChange, StoreState};
use tracing::debug;

use crate::layer::{Layer, LayerId};
use crate::surface::{MarkerSpec, MarkerSurface};

struct LiveMarker<H> {
    handle: H,
    drawn: MarkerSpec,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Keeps exactly one visual marker per placeable visible id.
///
/// Owns only surface handles and a snapshot of what each marker currently
/// shows; record data stays in the store.
pub struct MarkerPresenter<S: MarkerSurface> {
    layer: LayerId,
    surface: S,
    live: BTreeMap<MarkerId, LiveMarker<S::Handle>>,
    synced: Revision,
}

impl<S: MarkerSurface> MarkerPresenter<S> {
    pub fn new(layer: LayerId, surface: S) -> Self {
        Self {
            layer,
            surface,
            live: BTreeMap::new(),
            synced: Revision::ZERO,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn live_ids(&self) -> impl Iterator<Item = &MarkerId> {
        self.live.keys()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Store revision this presenter last reconciled against.
    pub fn synced_revision(&self) -> Revision {
        self.synced
    }

    /// Store observer entry point.
    pub fn on_store_change(&mut self, state: &StoreState, change: &StoreChange) {
        match change {
            StoreChange::Visibility | StoreChange::Records(_) | StoreChange::Snapshot(_) => {
                self.sync(state);
            }
            StoreChange::Status(_) | StoreChange::Legend => self.synced = state.revision(),
        }
    }

    /// Diffs the store against live markers: create missing, tear down
    /// stale, update changed in place.
    pub fn sync(&mut self, state: &StoreState) -> SyncReport {
        let mut report = SyncReport::default();
        let mut targets = BTreeSet::new();

        for id in state.visible_ids() {
            if !targets.insert(id.clone()) {
                continue;
            }
            // Absent or unplaced records draw nothing, rather than a pin at (0, 0).
            let Some(spec) = state.record(id.as_str()).and_then(MarkerSpec::from_record) else {
                targets.remove(id);
                continue;
            };

            match self.live.get_mut(id) {
                None => {
                    let handle = self.surface.create(self.layer, &spec);
                    self.live.insert(id.clone(), LiveMarker { handle, drawn: spec });
                    report.created += 1;
                }
                Some(marker) if marker.drawn != spec => {
                    self.surface.update(self.layer, &mut marker.handle, &spec);
                    self.surface.notify_changed(self.layer, &marker.handle);
                    marker.drawn = spec;
                    report.updated += 1;
                }
                Some(_) => {}
            }
        }

        let stale: Vec<MarkerId> = self
            .live
            .keys()
            .filter(|id| !targets.contains(*id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(marker) = self.live.remove(&id) {
                self.surface.remove(self.layer, marker.handle);
                report.removed += 1;
            }
        }

        self.synced = state.revision();
        if !report.is_empty() {
            debug!(
                layer = self.layer.0,
                created = report.created,
                updated = report.updated,
                removed = report.removed,
                "markers synced"
            );
        }
        report
    }

    /// Tears down every live marker.
    pub fn clear(&mut self) -> usize {
        let live = std::mem::take(&mut self.live);
        let count = live.len();
        for (_, marker) in live {
            self.surface.remove(self.layer, marker.handle);
        }
        count
    }
}

impl<S: MarkerSurface> Layer for MarkerPresenter<S> {
    fn id(&self) -> LayerId {
        self.layer
    }
}
