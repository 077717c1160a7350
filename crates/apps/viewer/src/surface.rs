//! Headless map surface: every marker and overlay operation becomes a
//! structured log line, and the drawn state is kept for inspection.

use std::collections::BTreeMap;

use foundation::LatLng;
use layers::{ClusterStatus, LayerId, MarkerSpec, MarkerSurface, OverlaySurface};
use store::LegendEntry;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct LogSurface {
    next_handle: u64,
    markers: BTreeMap<u64, (LayerId, MarkerSpec)>,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn drawn(&self) -> impl Iterator<Item = &MarkerSpec> {
        self.markers.values().map(|(_, spec)| spec)
    }

    /// Aggregate status of everything drawn on `layer`, as one cluster.
    pub fn cluster_status(&self, layer: LayerId) -> ClusterStatus {
        ClusterStatus::aggregate(
            self.markers
                .values()
                .filter(|(l, _)| *l == layer)
                .map(|(_, spec)| spec.verification),
        )
    }
}

impl MarkerSurface for LogSurface {
    type Handle = u64;

    fn create(&mut self, layer: LayerId, spec: &MarkerSpec) -> u64 {
        self.next_handle += 1;
        if !spec.position.in_range() {
            warn!(id = %spec.id, lat = spec.position.lat, lng = spec.position.lng, "marker outside WGS84 range");
        }
        debug!(
            layer = layer.0,
            id = %spec.id,
            lat = spec.position.lat,
            lng = spec.position.lng,
            color = %spec.icon.background_color,
            icon = %spec.icon.css_classes(),
            "marker created"
        );
        self.markers.insert(self.next_handle, (layer, spec.clone()));
        self.next_handle
    }

    fn update(&mut self, layer: LayerId, handle: &mut u64, spec: &MarkerSpec) {
        debug!(
            layer = layer.0,
            id = %spec.id,
            lat = spec.position.lat,
            lng = spec.position.lng,
            color = %spec.icon.background_color,
            "marker updated"
        );
        self.markers.insert(*handle, (layer, spec.clone()));
    }

    fn remove(&mut self, layer: LayerId, handle: u64) {
        match self.markers.remove(&handle) {
            Some((_, spec)) => debug!(layer = layer.0, id = %spec.id, "marker removed"),
            None => warn!(layer = layer.0, handle, "remove for unknown marker handle"),
        }
    }

    fn notify_changed(&mut self, layer: LayerId, handle: &u64) {
        if self.markers.contains_key(handle) {
            let status = self.cluster_status(layer);
            debug!(layer = layer.0, cluster = %status, "cluster refreshed");
        }
    }
}

#[derive(Debug, Default)]
pub struct LogOverlay {
    status_text: String,
    legend: Vec<LegendEntry>,
    location: Option<(LatLng, f64)>,
    alerts: Vec<String>,
}

impl LogOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn location(&self) -> Option<(LatLng, f64)> {
        self.location
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}

impl OverlaySurface for LogOverlay {
    fn set_status_text(&mut self, text: &str) {
        info!(status = text, "status overlay");
        self.status_text = text.to_string();
    }

    fn set_legend(&mut self, entries: &[LegendEntry]) {
        for entry in entries {
            debug!(label = %entry.label, color = %entry.color, "legend swatch");
        }
        self.legend = entries.to_vec();
    }

    fn show_location(&mut self, center: LatLng, radius_m: f64) {
        info!(lat = center.lat, lng = center.lng, radius_m, "your reported location");
        self.location = Some((center, radius_m));
    }

    fn alert(&mut self, message: &str) {
        warn!(alert = message, "user alert");
        self.alerts.push(message.to_string());
    }
}
