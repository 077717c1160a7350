use foundation::MarkerId;
use runtime::{Metrics, MetricsSnapshot};
use serde_json::Value;
use store::{ConnectionStatus, RecordStore};
use tracing::{debug, info, warn};

use crate::config::StyleConfig;
use crate::error::{PayloadError, json_kind};
use crate::protocol::TransportEvent;
use crate::row::SurveyRow;

/// Summary of what one transport event did to the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Applied {
    /// Rows merged, in payload order.
    pub rows: Vec<(MarkerId, SurveyRow)>,
    pub visibility_replaced: bool,
    pub removed: Vec<MarkerId>,
    pub status: Option<ConnectionStatus>,
}

/// Translates transport events into Record Store calls.
///
/// Holds no synchronization state of its own: everything it learns goes
/// into the store. Payload problems are logged and dropped, never returned.
#[derive(Debug, Default)]
pub struct Reconciler {
    style: StyleConfig,
    metrics: Metrics,
}

impl Reconciler {
    pub fn new(style: StyleConfig) -> Self {
        Self {
            style,
            metrics: Metrics::new(),
        }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn apply(&mut self, store: &mut RecordStore, event: &TransportEvent) -> Applied {
        self.metrics.inc_counter(event_counter(event), 1);

        let result = match event {
            TransportEvent::Connect => Ok(self.on_status(store, ConnectionStatus::Connected)),
            TransportEvent::Disconnect => {
                Ok(self.on_status(store, ConnectionStatus::Disconnected))
            }
            TransportEvent::AllData(payload) => self.on_full_data(store, payload),
            TransportEvent::DataUpdated(payload) => self.on_update(store, payload),
            TransportEvent::DataRemoved(payload) => self.on_removal(store, payload),
            TransportEvent::DataResponse(payload) => {
                info!(%payload, "data response");
                Ok(Applied::default())
            }
            TransportEvent::Unknown { name, .. } => {
                debug!(event = %name, "ignoring unknown event");
                Ok(Applied::default())
            }
        };

        let applied = result.unwrap_or_else(|err| {
            warn!(event = event.name(), error = %err, "dropping malformed payload");
            self.metrics.inc_counter("payload_errors", 1);
            Applied::default()
        });

        self.metrics
            .inc_counter("rows_merged", applied.rows.len() as u64);
        self.metrics
            .set_gauge("visible_ids", store.visible_ids().len() as i64);
        applied
    }

    fn on_status(&mut self, store: &mut RecordStore, status: ConnectionStatus) -> Applied {
        info!(%status, "connection status");
        store.set_status(status);
        Applied {
            status: Some(status),
            ..Applied::default()
        }
    }

    /// Full snapshot: merge every row, then make exactly these rows visible.
    /// An empty or absent payload leaves the store untouched.
    pub fn on_full_data(
        &mut self,
        store: &mut RecordStore,
        payload: &Value,
    ) -> Result<Applied, PayloadError> {
        let rows = parse_rows(payload)?;
        if rows.is_empty() {
            debug!("empty snapshot ignored");
            return Ok(Applied::default());
        }

        store.apply_snapshot(
            rows.iter()
                .map(|(id, row)| (id.clone(), row.to_attributes(&self.style))),
        );
        debug!(rows = rows.len(), "snapshot applied");

        Ok(Applied {
            rows,
            visibility_replaced: true,
            ..Applied::default()
        })
    }

    /// Merge-only update. Never changes which ids are visible: a row first
    /// seen here stays hidden until a snapshot lists it.
    pub fn on_update(
        &mut self,
        store: &mut RecordStore,
        payload: &Value,
    ) -> Result<Applied, PayloadError> {
        let rows = parse_rows(payload)?;
        self.merge_rows(store, &rows);
        debug!(rows = rows.len(), "update applied");
        Ok(Applied {
            rows,
            ..Applied::default()
        })
    }

    pub fn on_removal(
        &mut self,
        store: &mut RecordStore,
        payload: &Value,
    ) -> Result<Applied, PayloadError> {
        let offsets = parse_offsets(payload)?;
        let removed = store.remove_by_offsets(&offsets);
        if removed.len() < offsets.len() {
            debug!(
                requested = offsets.len(),
                removed = removed.len(),
                "some removal offsets were out of range"
            );
        }
        Ok(Applied {
            removed,
            ..Applied::default()
        })
    }

    fn merge_rows(&self, store: &mut RecordStore, rows: &[(MarkerId, SurveyRow)]) {
        store.merge_batch(
            rows.iter()
                .map(|(id, row)| (id.clone(), row.to_attributes(&self.style))),
        );
    }
}

fn event_counter(event: &TransportEvent) -> &'static str {
    match event {
        TransportEvent::Connect => "events.connect",
        TransportEvent::Disconnect => "events.disconnect",
        TransportEvent::AllData(_) => "events.all_data",
        TransportEvent::DataUpdated(_) => "events.data_updated",
        TransportEvent::DataRemoved(_) => "events.data_removed",
        TransportEvent::DataResponse(_) => "events.data_response",
        TransportEvent::Unknown { .. } => "events.unknown",
    }
}

/// Payloads arrive either as JSON text or already decoded by the transport.
fn decode_payload(payload: &Value) -> Result<Option<Value>, PayloadError> {
    match payload {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => Ok(Some(serde_json::from_str(text)?)),
        other => Ok(Some(other.clone())),
    }
}

/// Rows keyed by row-key, or a positional array (keys "0", "1", ...).
/// One non-object row rejects the whole payload. Rows under an empty key
/// cannot be addressed and are dropped.
pub fn parse_rows(payload: &Value) -> Result<Vec<(MarkerId, SurveyRow)>, PayloadError> {
    let entries: Vec<(String, Value)> = match decode_payload(payload)? {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map.into_iter().collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(ix, v)| (ix.to_string(), v))
            .collect(),
        Some(other) => {
            return Err(PayloadError::Shape {
                expected: "object or array of rows",
                found: json_kind(&other),
            });
        }
    };

    let mut rows = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let Value::Object(fields) = value else {
            return Err(PayloadError::Row { key });
        };
        if key.is_empty() {
            warn!("dropping row with an empty key");
            continue;
        }
        rows.push((MarkerId::from(key), SurveyRow::from_json(&fields)));
    }
    Ok(rows)
}

pub fn parse_offsets(payload: &Value) -> Result<Vec<i64>, PayloadError> {
    let items = match decode_payload(payload)? {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(n @ Value::Number(_)) => vec![n],
        Some(other) => {
            return Err(PayloadError::Shape {
                expected: "array of offsets",
                found: json_kind(&other),
            });
        }
    };

    items
        .iter()
        .map(|item| {
            item.as_i64()
                .or_else(|| {
                    item.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .ok_or_else(|| PayloadError::Offset(item.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::Color;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use store::Verification;

    fn ids(list: &[&str]) -> Vec<MarkerId> {
        list.iter().map(|s| MarkerId::from(*s)).collect()
    }

    fn snapshot_text() -> Value {
        Value::String(
            json!({
                "r1": {"Latitude": 45, "Longitude": -71, "Verified Status": "Y"},
                "r2": {"Latitude": "41.5", "Longitude": "-71.3", "Verified Status": "N",
                       "Pedestrian Markings": "zebra"},
            })
            .to_string(),
        )
    }

    #[test]
    fn snapshot_populates_records_and_visibility() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        let applied = rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));

        assert!(applied.visibility_replaced);
        assert_eq!(store.visible_ids(), ids(&["r1", "r2"]).as_slice());

        let r1 = store.record("r1").unwrap();
        assert_eq!(r1.icon.background_color, Color::named("green"));
        assert_eq!(r1.verification, Verification::Verified);
        assert!(r1.is_placeable());

        let r2 = store.record("r2").unwrap();
        assert_eq!(r2.icon.background_color, Color::named("blue"));
        assert_eq!(r2.icon.icon_class, "fa-times");
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));
        let first = store.state().clone();
        rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));
        assert_eq!(store.state(), &first);
    }

    #[test]
    fn empty_row_keys_never_become_visible() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        let applied = rec.apply(
            &mut store,
            &TransportEvent::AllData(json!({
                "": {"Latitude": 1, "Longitude": 2},
                "r1": {"Latitude": 3, "Longitude": 4},
            })),
        );

        assert_eq!(store.visible_ids(), ids(&["r1"]).as_slice());
        let orphans: Vec<&MarkerId> = store
            .visible_ids()
            .iter()
            .filter(|id| store.record(id.as_str()).is_none())
            .collect();
        assert!(orphans.is_empty());
        assert_eq!(applied.rows.len(), 1);
    }

    #[test]
    fn snapshot_reaches_observers_in_one_notification() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |state, _| {
            let placed = state
                .visible_ids()
                .iter()
                .all(|id| state.record(id.as_str()).is_some());
            sink.borrow_mut().push((state.visible_ids().len(), placed));
        });

        rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));
        assert_eq!(*seen.borrow(), vec![(2, true)]);
    }

    #[test]
    fn positional_array_snapshot_uses_indices_as_keys() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        rec.apply(
            &mut store,
            &TransportEvent::AllData(json!([{"Latitude": 1, "Longitude": 2}, {"Notes": "x"}])),
        );
        assert_eq!(store.visible_ids(), ids(&["0", "1"]).as_slice());
        assert!(store.record("1").unwrap().popup_content.ends_with("Notes: x"));
    }

    #[test]
    fn empty_or_malformed_payloads_are_no_ops() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));
        let before = store.state().clone();

        for payload in [
            Value::Null,
            json!(""),
            json!("{}"),
            json!({}),
            json!("{not json"),
            json!(17),
            json!({"r9": "not a row"}),
        ] {
            rec.apply(&mut store, &TransportEvent::AllData(payload.clone()));
            rec.apply(&mut store, &TransportEvent::DataUpdated(payload));
        }
        rec.apply(&mut store, &TransportEvent::DataRemoved(json!(["x"])));

        assert_eq!(store.state(), &before);
        let snap = rec.metrics();
        assert!(snap.counters.contains(&("payload_errors", 7)));
    }

    #[test]
    fn update_merges_without_touching_visibility() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));

        let applied = rec.apply(
            &mut store,
            &TransportEvent::DataUpdated(json!({
                "r2": {"Verified Status": "Y"},
                "r3": {"Latitude": 1, "Longitude": 1},
            })),
        );

        assert_eq!(applied.rows.len(), 2);
        assert!(!applied.visibility_replaced);
        assert_eq!(store.visible_ids(), ids(&["r1", "r2"]).as_slice());

        let r2 = store.record("r2").unwrap();
        assert_eq!(r2.icon.background_color, Color::named("green"));
        // coordinates not in the update are kept
        assert_eq!(r2.latitude, 41.5);
        // new id exists but is not visible
        assert!(store.record("r3").is_some());
    }

    #[test]
    fn removal_uses_offsets_from_the_end() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        rec.apply(&mut store, &TransportEvent::AllData(snapshot_text()));

        let applied = rec.apply(&mut store, &TransportEvent::DataRemoved(json!([-1])));
        assert_eq!(applied.removed, ids(&["r2"]));
        assert_eq!(store.visible_ids(), ids(&["r1"]).as_slice());

        // out of range: silently ignored
        let applied = rec.apply(&mut store, &TransportEvent::DataRemoved(json!("[-5]")));
        assert!(applied.removed.is_empty());
        assert_eq!(store.visible_ids(), ids(&["r1"]).as_slice());
    }

    #[test]
    fn lifecycle_events_set_status() {
        let mut store = RecordStore::new();
        let mut rec = Reconciler::default();
        assert_eq!(store.status(), ConnectionStatus::Unknown);
        rec.apply(&mut store, &TransportEvent::Connect);
        assert_eq!(store.status(), ConnectionStatus::Connected);
        rec.apply(&mut store, &TransportEvent::DataResponse(json!({"ok": true})));
        rec.apply(&mut store, &TransportEvent::Disconnect);
        assert_eq!(store.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn offsets_accept_integral_floats_only() {
        assert_eq!(parse_offsets(&json!([-1, -2.0])).unwrap(), vec![-1, -2]);
        assert_eq!(parse_offsets(&json!(-3)).unwrap(), vec![-3]);
        assert!(parse_offsets(&json!([-1.5])).is_err());
        assert!(parse_offsets(&json!({"a": 1})).is_err());
    }
}
