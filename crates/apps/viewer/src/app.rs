use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use foundation::{LocationFix, MarkerId};
use layers::{Layer, LayerId, MarkerPresenter, MarkerSurface, OverlayPresenter, OverlaySurface};
use runtime::{MetricsSnapshot, SubscriptionId};
use store::{RecordStore, Verification};
use streaming::{decode_frame, Applied, Reconciler, StyleConfig, Submission, SurveyRow, TransportEvent};
use tracing::{debug, info, warn};

/// A running map session: one store, one reconciler, and the presenters
/// subscribed to the store.
///
/// Created by [`FieldMap::start`] and torn down by [`FieldMap::stop`]; there
/// is no process-wide state.
pub struct FieldMap<M: MarkerSurface + 'static, O: OverlaySurface + 'static> {
    store: RecordStore,
    reconciler: Reconciler,
    markers: Rc<RefCell<MarkerPresenter<M>>>,
    overlay: Rc<RefCell<OverlayPresenter<O>>>,
    subscriptions: Vec<SubscriptionId>,
    /// Last source row seen per id, for prefilling edit submissions.
    rows: BTreeMap<MarkerId, SurveyRow>,
}

impl<M: MarkerSurface + 'static, O: OverlaySurface + 'static> FieldMap<M, O> {
    pub fn start(style: StyleConfig, layer: LayerId, markers: M, overlay: O) -> Self {
        let mut store = RecordStore::with_legend(style.legend.clone());
        let markers = Rc::new(RefCell::new(MarkerPresenter::new(layer, markers)));
        let overlay = Rc::new(RefCell::new(OverlayPresenter::new(overlay)));

        overlay.borrow_mut().render(store.state());
        markers.borrow_mut().sync(store.state());

        let m = markers.clone();
        let o = overlay.clone();
        let subscriptions = vec![
            store.subscribe(move |state, change| m.borrow_mut().on_store_change(state, change)),
            store.subscribe(move |state, change| o.borrow_mut().on_store_change(state, change)),
        ];

        info!(layer = layer.0, "field map started");
        Self {
            store,
            reconciler: Reconciler::new(style),
            markers,
            overlay,
            subscriptions,
            rows: BTreeMap::new(),
        }
    }

    pub fn layer(&self) -> LayerId {
        self.markers.borrow().id()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn markers(&self) -> std::cell::Ref<'_, MarkerPresenter<M>> {
        self.markers.borrow()
    }

    pub fn overlay(&self) -> std::cell::Ref<'_, OverlayPresenter<O>> {
        self.overlay.borrow()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.reconciler.metrics()
    }

    /// Applies one transport event. Presenters have re-synced by the time
    /// this returns.
    pub fn handle(&mut self, event: &TransportEvent) -> Applied {
        let applied = self.reconciler.apply(&mut self.store, event);
        for (id, row) in &applied.rows {
            self.rows.insert(id.clone(), row.clone());
        }
        applied
    }

    /// Decodes and applies one socket text frame. Undecodable frames are
    /// logged and skipped.
    pub fn handle_frame(&mut self, text: &str) -> Option<Applied> {
        match decode_frame(text) {
            Ok(event) => Some(self.handle(&event)),
            Err(err) => {
                warn!(error = %err, "skipping undecodable frame");
                None
            }
        }
    }

    pub fn on_location_found(&mut self, fix: LocationFix) {
        self.overlay.borrow_mut().on_location_found(fix);
    }

    pub fn on_location_error(&mut self, message: &str) {
        self.overlay.borrow_mut().on_location_error(message);
    }

    /// Edit form prefilled from the record and the row it came from.
    pub fn draft_submission(&self, id: &str) -> Option<Submission> {
        let record = self.store.record(id)?;
        let row = self.rows.get(id);
        let (lat, lon) = if record.is_placeable() {
            (Some(record.latitude), Some(record.longitude))
        } else {
            (None, None)
        };
        Some(Submission {
            row: record.id.clone(),
            lat,
            lon,
            verified: record.verification == Verification::Verified,
            markings: row.is_some_and(SurveyRow::markings_flag),
            signal: row.is_some_and(SurveyRow::signal_flag),
            other: row
                .and_then(|r| r.other_features.clone())
                .unwrap_or_default(),
        })
    }

    /// Encodes a submission for the outbound socket. Nothing local changes:
    /// the edit shows up once the server broadcasts it back.
    pub fn submit(&self, submission: &Submission) -> Result<String, serde_json::Error> {
        debug!(row = %submission.row, "submission queued");
        submission.to_frame()
    }

    /// Detaches the presenters and removes every live marker.
    pub fn stop(&mut self) -> usize {
        for id in self.subscriptions.drain(..) {
            self.store.unsubscribe(id);
        }
        let removed = self.markers.borrow_mut().clear();
        info!(removed, "field map stopped");
        removed
    }
}
