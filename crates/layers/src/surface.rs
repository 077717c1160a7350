//! Capability boundary between the presenters and a concrete map library.
//!
//! The presenters never see library types: an adapter implements these traits
//! over whatever marker, cluster-group and control objects the host provides.

use foundation::{LatLng, MarkerId};
use store::{IconOptions, LegendEntry, MarkerRecord, Verification};

use crate::layer::LayerId;

/// Everything a visual marker shows, captured at the time it was drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub id: MarkerId,
    pub position: LatLng,
    pub icon: IconOptions,
    pub popup_content: String,
    pub verification: Verification,
}

impl MarkerSpec {
    /// `None` while the record has no usable position.
    pub fn from_record(record: &MarkerRecord) -> Option<Self> {
        if !record.is_placeable() {
            return None;
        }
        Some(Self {
            id: record.id.clone(),
            position: record.position(),
            icon: record.icon.clone(),
            popup_content: record.popup_content.clone(),
            verification: record.verification,
        })
    }
}

pub trait MarkerSurface {
    type Handle;

    /// Places a new marker and attaches it to `layer`.
    fn create(&mut self, layer: LayerId, spec: &MarkerSpec) -> Self::Handle;

    /// Moves/restyles an existing marker in place.
    fn update(&mut self, layer: LayerId, handle: &mut Self::Handle, spec: &MarkerSpec);

    /// Detaches the marker from `layer`; the handle is consumed.
    fn remove(&mut self, layer: LayerId, handle: Self::Handle);

    /// Tells the clustering layer that this marker's cluster-relevant
    /// representation changed, so aggregate cluster icons get recomputed.
    fn notify_changed(&mut self, layer: LayerId, handle: &Self::Handle);
}

/// On-map controls that are not markers.
pub trait OverlaySurface {
    fn set_status_text(&mut self, text: &str);
    fn set_legend(&mut self, entries: &[LegendEntry]);
    /// Shows (or moves) the "you are here" circle.
    fn show_location(&mut self, center: LatLng, radius_m: f64);
    /// Blocking user notification.
    fn alert(&mut self, message: &str);
}
