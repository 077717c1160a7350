use foundation::LocationFix;
use store::{ConnectionStatus, Legend, StoreChange, StoreState};
use tracing::warn;

use crate::surface::OverlaySurface;

/// Binds the connection status and the legend to on-map controls, and
/// carries the host's geolocation feedback.
///
/// Status and legend are independent one-way bindings: each is rendered at
/// start and re-rendered only when its own value changes.
pub struct OverlayPresenter<O: OverlaySurface> {
    surface: O,
    status: Option<ConnectionStatus>,
    legend: Option<Legend>,
    location: Option<LocationFix>,
}

impl<O: OverlaySurface> OverlayPresenter<O> {
    pub fn new(surface: O) -> Self {
        Self {
            surface,
            status: None,
            legend: None,
            location: None,
        }
    }

    pub fn surface(&self) -> &O {
        &self.surface
    }

    pub fn location(&self) -> Option<LocationFix> {
        self.location
    }

    /// Initial render of both bindings.
    pub fn render(&mut self, state: &StoreState) {
        self.render_status(state.status());
        self.render_legend(state.legend());
    }

    pub fn on_store_change(&mut self, state: &StoreState, change: &StoreChange) {
        match change {
            StoreChange::Status(status) => self.render_status(*status),
            StoreChange::Legend => self.render_legend(state.legend()),
            StoreChange::Visibility | StoreChange::Records(_) | StoreChange::Snapshot(_) => {}
        }
    }

    fn render_status(&mut self, status: ConnectionStatus) {
        if self.status == Some(status) {
            return;
        }
        self.surface.set_status_text(status.as_str());
        self.status = Some(status);
    }

    fn render_legend(&mut self, legend: &Legend) {
        if self.legend.as_ref() == Some(legend) {
            return;
        }
        self.surface.set_legend(legend.entries());
        self.legend = Some(legend.clone());
    }

    pub fn on_location_found(&mut self, fix: LocationFix) {
        self.surface
            .show_location(fix.position, fix.display_radius_m());
        self.location = Some(fix);
    }

    /// Geolocation failures are shown to the user and otherwise ignored.
    pub fn on_location_error(&mut self, message: &str) {
        warn!(reason = message, "geolocation failed");
        self.surface.alert(message);
    }
}
