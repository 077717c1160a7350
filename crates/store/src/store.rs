use std::collections::{BTreeMap, BTreeSet};

use foundation::MarkerId;
use runtime::{ObserverList, Revision, SubscriptionId};

use crate::legend::Legend;
use crate::record::{AttributeSet, MarkerRecord};
use crate::status::ConnectionStatus;

/// What a committed mutation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// The visible-id sequence was replaced or shortened.
    Visibility,
    /// These records were created or had at least one field change.
    Records(Vec<MarkerId>),
    /// A full snapshot: these records changed and the visible-id sequence
    /// was replaced, in one step.
    Snapshot(Vec<MarkerId>),
    Status(ConnectionStatus),
    Legend,
}

/// Read-only view of the store handed to observers.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoreState {
    records: BTreeMap<MarkerId, MarkerRecord>,
    visible: Vec<MarkerId>,
    status: ConnectionStatus,
    legend: Legend,
    revision: Revision,
}

impl StoreState {
    pub fn record(&self, id: &str) -> Option<&MarkerRecord> {
        self.records.get(id)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn visible_ids(&self) -> &[MarkerId] {
        &self.visible
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }
}

/// Authoritative marker data plus the ordered set of ids meant to be shown.
///
/// Records are never deleted: dropping an id from the visible sequence keeps
/// its record around so a later snapshot can show it again.
///
/// Every mutation that changes state bumps the revision and then notifies
/// subscribers synchronously, so an observer always sees exactly the state
/// left by the mutation that woke it.
#[derive(Debug, Default)]
pub struct RecordStore {
    state: StoreState,
    observers: ObserverList<StoreState, StoreChange>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legend(legend: Legend) -> Self {
        let mut store = Self::new();
        store.state.legend = legend;
        store
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn record(&self, id: &str) -> Option<&MarkerRecord> {
        self.state.record(id)
    }

    pub fn visible_ids(&self) -> &[MarkerId] {
        self.state.visible_ids()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status
    }

    pub fn legend(&self) -> &Legend {
        &self.state.legend
    }

    pub fn revision(&self) -> Revision {
        self.state.revision
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&StoreState, &StoreChange) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Replaces the visible-id sequence wholesale.
    pub fn set_all(&mut self, ids: impl IntoIterator<Item = MarkerId>) {
        let ids: Vec<MarkerId> = ids.into_iter().collect();
        if ids == self.state.visible {
            return;
        }
        self.state.visible = ids;
        self.commit(StoreChange::Visibility);
    }

    /// Creates or merges one record. Empty ids are ignored.
    pub fn merge_attributes(&mut self, id: MarkerId, partial: &AttributeSet) -> bool {
        self.merge_batch([(id, partial.clone())]) > 0
    }

    /// Merges several rows and notifies once. Returns the number of records
    /// that were created or changed.
    pub fn merge_batch(
        &mut self,
        rows: impl IntoIterator<Item = (MarkerId, AttributeSet)>,
    ) -> usize {
        let (changed, _) = self.merge_rows(rows);
        let count = changed.len();
        if count > 0 {
            self.commit(StoreChange::Records(changed));
        }
        count
    }

    /// Merges every row, then makes exactly the merged ids visible, in row
    /// order. Observers are notified once, after both steps.
    ///
    /// Rows with an empty id are skipped entirely, so every visible id has a
    /// record. Returns the number of records that were created or changed.
    pub fn apply_snapshot(
        &mut self,
        rows: impl IntoIterator<Item = (MarkerId, AttributeSet)>,
    ) -> usize {
        let (changed, accepted) = self.merge_rows(rows);
        let count = changed.len();
        let visibility_changed = accepted != self.state.visible;
        if visibility_changed {
            self.state.visible = accepted;
        }

        match (visibility_changed, count > 0) {
            (true, _) => self.commit(StoreChange::Snapshot(changed)),
            (false, true) => self.commit(StoreChange::Records(changed)),
            (false, false) => {}
        }
        count
    }

    /// Returns the created-or-changed ids and every accepted id, both in row
    /// order. Does not notify.
    fn merge_rows(
        &mut self,
        rows: impl IntoIterator<Item = (MarkerId, AttributeSet)>,
    ) -> (Vec<MarkerId>, Vec<MarkerId>) {
        let mut changed = Vec::new();
        let mut accepted = Vec::new();
        let mut seen = BTreeSet::new();
        for (id, partial) in rows {
            if id.is_empty() {
                continue;
            }
            let created = !self.state.records.contains_key(id.as_str());
            let record = self
                .state
                .records
                .entry(id.clone())
                .or_insert_with(|| MarkerRecord::new(id.clone()));
            let modified = record.merge(&partial);
            if (created || modified) && seen.insert(id.clone()) {
                changed.push(id.clone());
            }
            accepted.push(id);
        }
        (changed, accepted)
    }

    /// Removes visible ids addressed from the end of the sequence.
    ///
    /// Each offset resolves to `len + offset`, where `len` is the sequence
    /// length when the call starts; results outside `0..len` are ignored. All
    /// resolved positions are removed together. Returns the removed ids in
    /// sequence order.
    pub fn remove_by_offsets(&mut self, offsets: &[i64]) -> Vec<MarkerId> {
        let len = self.state.visible.len() as i64;
        let mut targets: Vec<usize> = offsets
            .iter()
            .filter_map(|offset| {
                let index = len.checked_add(*offset)?;
                (0..len).contains(&index).then_some(index as usize)
            })
            .collect();
        if targets.is_empty() {
            return Vec::new();
        }
        targets.sort_unstable();
        targets.dedup();

        let mut removed: Vec<MarkerId> = targets
            .iter()
            .rev()
            .map(|&index| self.state.visible.remove(index))
            .collect();
        removed.reverse();

        self.commit(StoreChange::Visibility);
        removed
    }

    /// Returns `true` if the status changed.
    pub fn set_status(&mut self, status: ConnectionStatus) -> bool {
        if self.state.status == status {
            return false;
        }
        self.state.status = status;
        self.commit(StoreChange::Status(status));
        true
    }

    pub fn set_legend(&mut self, legend: Legend) {
        if self.state.legend == legend {
            return;
        }
        self.state.legend = legend;
        self.commit(StoreChange::Legend);
    }

    fn commit(&mut self, change: StoreChange) {
        self.state.revision = self.state.revision.next();
        self.observers.notify(&self.state, &change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::LegendEntry;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids(list: &[&str]) -> Vec<MarkerId> {
        list.iter().map(|s| MarkerId::from(*s)).collect()
    }

    fn store_with_visible(list: &[&str]) -> RecordStore {
        let mut store = RecordStore::new();
        store.set_all(ids(list));
        store
    }

    #[test]
    fn set_all_preserves_given_order() {
        let store = store_with_visible(&["c", "a", "b"]);
        assert_eq!(store.visible_ids(), ids(&["c", "a", "b"]).as_slice());
    }

    #[test]
    fn remove_last_by_negative_offset() {
        let mut store = store_with_visible(&["a", "b", "c", "d"]);
        let removed = store.remove_by_offsets(&[-1]);
        assert_eq!(removed, ids(&["d"]));
        assert_eq!(store.visible_ids(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn out_of_range_offset_is_a_no_op() {
        let mut store = store_with_visible(&["a", "b", "c"]);
        let rev = store.revision();
        assert!(store.remove_by_offsets(&[-5]).is_empty());
        assert!(store.remove_by_offsets(&[0, 3, i64::MAX]).is_empty());
        assert_eq!(store.visible_ids(), ids(&["a", "b", "c"]).as_slice());
        assert_eq!(store.revision(), rev);
    }

    #[test]
    fn offsets_in_one_call_resolve_against_the_starting_length() {
        let mut store = store_with_visible(&["a", "b", "c", "d"]);
        let removed = store.remove_by_offsets(&[-1, -3, -1]);
        assert_eq!(removed, ids(&["b", "d"]));
        assert_eq!(store.visible_ids(), ids(&["a", "c"]).as_slice());

        // A later call sees the shortened sequence.
        store.remove_by_offsets(&[-1]);
        assert_eq!(store.visible_ids(), ids(&["a"]).as_slice());
    }

    #[test]
    fn removal_keeps_the_record() {
        let mut store = store_with_visible(&["a"]);
        store.merge_attributes(MarkerId::from("a"), &AttributeSet::new().with_popup("x"));
        store.remove_by_offsets(&[-1]);
        assert!(store.visible_ids().is_empty());
        assert_eq!(store.record("a").map(|r| r.popup_content.as_str()), Some("x"));
    }

    #[test]
    fn merge_creates_then_merges() {
        let mut store = RecordStore::new();
        let id = MarkerId::from("r1");
        assert!(store.merge_attributes(id.clone(), &AttributeSet::new().with_position(45.0, -71.0)));
        assert!(store.merge_attributes(id.clone(), &AttributeSet::new().with_background("green")));

        let r = store.record("r1").unwrap();
        assert_eq!(r.latitude, 45.0);
        assert_eq!(r.icon.background_color.as_str(), "green");
        // merging a record into existence does not make it visible
        assert!(store.visible_ids().is_empty());
    }

    #[test]
    fn empty_id_is_ignored() {
        let mut store = RecordStore::new();
        assert!(!store.merge_attributes(MarkerId::default(), &AttributeSet::new().with_popup("x")));
        assert_eq!(store.state().record_count(), 0);
        assert_eq!(store.revision(), Revision::ZERO);
    }

    #[test]
    fn observers_see_state_left_by_each_mutation() {
        let mut store = RecordStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |state, change| {
            sink.borrow_mut()
                .push((state.revision(), state.visible_ids().len(), change.clone()));
        });

        store.merge_attributes(MarkerId::from("a"), &AttributeSet::new().with_popup("p"));
        store.set_all(ids(&["a", "b"]));
        store.remove_by_offsets(&[-1]);
        store.set_status(ConnectionStatus::Connected);
        store.set_status(ConnectionStatus::Connected);

        assert_eq!(
            *log.borrow(),
            vec![
                (Revision(1), 0, StoreChange::Records(ids(&["a"]))),
                (Revision(2), 2, StoreChange::Visibility),
                (Revision(3), 1, StoreChange::Visibility),
                (Revision(4), 1, StoreChange::Status(ConnectionStatus::Connected)),
            ]
        );
    }

    #[test]
    fn unchanged_mutations_do_not_notify() {
        let mut store = store_with_visible(&["a"]);
        store.merge_attributes(MarkerId::from("a"), &AttributeSet::new().with_popup("p"));
        let rev = store.revision();

        store.set_all(ids(&["a"]));
        store.merge_attributes(MarkerId::from("a"), &AttributeSet::new().with_popup("p"));
        store.set_legend(store.legend().clone());

        assert_eq!(store.revision(), rev);
    }

    #[test]
    fn snapshot_notifies_once_with_the_final_state() {
        let mut store = store_with_visible(&["old"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |state, change| {
            sink.borrow_mut().push((
                change.clone(),
                state.visible_ids().to_vec(),
                state.record("b").is_some(),
            ));
        });

        let count = store.apply_snapshot([
            (MarkerId::from("a"), AttributeSet::new().with_popup("a")),
            (MarkerId::from("b"), AttributeSet::new().with_popup("b")),
        ]);

        assert_eq!(count, 2);
        assert_eq!(
            *log.borrow(),
            vec![(StoreChange::Snapshot(ids(&["a", "b"])), ids(&["a", "b"]), true)]
        );
    }

    #[test]
    fn snapshot_skips_empty_ids_everywhere() {
        let mut store = RecordStore::new();
        store.apply_snapshot([
            (MarkerId::default(), AttributeSet::new().with_position(1.0, 2.0)),
            (MarkerId::from("r1"), AttributeSet::new().with_position(3.0, 4.0)),
        ]);
        assert_eq!(store.visible_ids(), ids(&["r1"]).as_slice());
        assert!(
            store
                .visible_ids()
                .iter()
                .all(|id| store.record(id.as_str()).is_some())
        );
    }

    #[test]
    fn repeated_snapshot_is_silent() {
        let mut store = RecordStore::new();
        let rows = || [(MarkerId::from("a"), AttributeSet::new().with_popup("a"))];
        store.apply_snapshot(rows());
        let rev = store.revision();
        assert_eq!(store.apply_snapshot(rows()), 0);
        assert_eq!(store.revision(), rev);
    }

    #[test]
    fn snapshot_with_same_ids_reports_only_records() {
        let mut store = RecordStore::new();
        store.apply_snapshot([(MarkerId::from("a"), AttributeSet::new().with_popup("1"))]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |_, change| sink.borrow_mut().push(change.clone()));

        store.apply_snapshot([(MarkerId::from("a"), AttributeSet::new().with_popup("2"))]);
        assert_eq!(*log.borrow(), vec![StoreChange::Records(ids(&["a"]))]);
    }

    #[test]
    fn legend_replacement_notifies_once() {
        let mut store = RecordStore::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        store.subscribe(move |_, change| {
            if *change == StoreChange::Legend {
                *h.borrow_mut() += 1;
            }
        });
        store.set_legend(Legend::new(vec![LegendEntry::new("Verified", "green")]));
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(store.legend().entries().len(), 1);
    }
}
