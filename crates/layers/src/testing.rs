use std::collections::BTreeMap;

use foundation::{LatLng, MarkerId};
use store::LegendEntry;

use crate::layer::LayerId;
use crate::surface::{MarkerSpec, MarkerSurface, OverlaySurface};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Create(MarkerId),
    Update(MarkerId),
    Remove(MarkerId),
    Refresh(MarkerId),
}

/// Surface fake that keeps the markers it was asked to draw.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next: u64,
    pub markers: BTreeMap<u64, MarkerSpec>,
    pub ops: Vec<Op>,
    pub status_text: Vec<String>,
    pub legends: Vec<Vec<LegendEntry>>,
    pub locations: Vec<(LatLng, f64)>,
    pub alerts: Vec<String>,
}

impl RecordingSurface {
    pub fn drawn_ids(&self) -> Vec<MarkerId> {
        let mut ids: Vec<MarkerId> = self.markers.values().map(|m| m.id.clone()).collect();
        ids.sort();
        ids
    }
}

impl MarkerSurface for RecordingSurface {
    type Handle = u64;

    fn create(&mut self, _layer: LayerId, spec: &MarkerSpec) -> u64 {
        self.next += 1;
        self.markers.insert(self.next, spec.clone());
        self.ops.push(Op::Create(spec.id.clone()));
        self.next
    }

    fn update(&mut self, _layer: LayerId, handle: &mut u64, spec: &MarkerSpec) {
        self.markers.insert(*handle, spec.clone());
        self.ops.push(Op::Update(spec.id.clone()));
    }

    fn remove(&mut self, _layer: LayerId, handle: u64) {
        if let Some(spec) = self.markers.remove(&handle) {
            self.ops.push(Op::Remove(spec.id));
        }
    }

    fn notify_changed(&mut self, _layer: LayerId, handle: &u64) {
        if let Some(spec) = self.markers.get(handle) {
            self.ops.push(Op::Refresh(spec.id.clone()));
        }
    }
}

impl OverlaySurface for RecordingSurface {
    fn set_status_text(&mut self, text: &str) {
        self.status_text.push(text.to_string());
    }

    fn set_legend(&mut self, entries: &[LegendEntry]) {
        self.legends.push(entries.to_vec());
    }

    fn show_location(&mut self, center: LatLng, radius_m: f64) {
        self.locations.push((center, radius_m));
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}
