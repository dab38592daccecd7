//! At most one open tool at a time

use log::info;

use crate::capture::map::{MapEvent, MapSurface};
use crate::capture::session::ToolSession;
use crate::capture::tool::ToolKind;
use crate::extraction::{Product, RawExtractionRequest, Resolution};
use crate::place::Geometry;

/// Owns the map and the single optional [`ToolSession`]
///
/// `activate` and `deactivate` are the only ways a session comes or goes, and
/// every user action is forwarded to the open session, if any.
#[derive(Debug)]
pub struct ToolArbiter<M: MapSurface> {
    map: M,
    session: Option<ToolSession>,
}

impl<M: MapSurface> ToolArbiter<M> {
    pub fn new(map: M) -> Self {
        Self { map, session: None }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// Gives the map back, closing any open tool first
    pub fn into_map(mut self) -> M {
        self.deactivate();
        self.map
    }

    pub fn active(&self) -> Option<ToolKind> {
        self.session.as_ref().map(ToolSession::kind)
    }

    pub fn session(&self) -> Option<&ToolSession> {
        self.session.as_ref()
    }

    /// Opens `kind`, closing whatever was open; toggles it off if it already was
    ///
    /// Returns the tool that is open afterwards.
    pub fn activate(&mut self, kind: ToolKind) -> Option<ToolKind> {
        let previous = self.active();
        self.deactivate();
        if previous == Some(kind) {
            return None;
        }

        info!("Activating {}", kind);
        self.session = Some(ToolSession::open(kind, &mut self.map));
        Some(kind)
    }

    /// Closes the open tool, if any
    pub fn deactivate(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close(&mut self.map);
            info!("Deactivated {}", session.kind());
        }
    }

    pub fn dispatch(&mut self, event: &MapEvent) {
        if let Some(session) = self.session.as_mut() {
            session.handle(&mut self.map, event);
        }
    }

    pub fn select_row(&mut self, row: usize) {
        if let Some(session) = self.session.as_mut() {
            session.select_row(&mut self.map, row);
        }
    }

    pub fn set_row_text(&mut self, row: usize, lon: &str, lat: &str) {
        if let Some(session) = self.session.as_mut() {
            session.set_row_text(&mut self.map, row, lon, lat);
        }
    }

    pub fn delete_row(&mut self, row: usize) {
        if let Some(session) = self.session.as_mut() {
            session.delete_row(&mut self.map, row);
        }
    }

    pub fn add_row(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.add_row(&mut self.map);
        }
    }

    pub fn select_product(&mut self, product: Product) {
        if let Some(session) = self.session.as_mut() {
            session.select_product(product);
        }
    }

    pub fn select_resolution(&mut self, resolution: Resolution) {
        if let Some(session) = self.session.as_mut() {
            session.select_resolution(resolution);
        }
    }

    /// The bounding box's raw request, when its confirm gate is open
    pub fn confirm(&self) -> Option<RawExtractionRequest> {
        self.session.as_ref().and_then(ToolSession::confirm)
    }

    /// Shows a resolved place on the open place tool
    pub fn show_place(&mut self, geometry: Geometry) {
        if let Some(session) = self.session.as_mut() {
            session.show_place(&mut self.map, geometry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::map::{EventKind, InMemoryMap};
    use crate::capture::Point;

    fn arbiter() -> ToolArbiter<InMemoryMap> {
        ToolArbiter::new(InMemoryMap::new())
    }

    #[test]
    fn test_switching_leaves_no_residue() {
        for a in ToolKind::ALL {
            for b in ToolKind::ALL {
                if a == b {
                    continue;
                }
                let mut arbiter = arbiter();
                arbiter.activate(a);
                arbiter.dispatch(&MapEvent::Click(Point::new(5.0, 52.0)));
                arbiter.dispatch(&MapEvent::Click(Point::new(5.1, 52.1)));
                let place = Geometry::rectangle(Point::new(4.0, 51.0), Point::new(4.1, 51.1));
                arbiter.show_place(place);

                assert_eq!(arbiter.activate(b), Some(b));
                let map = arbiter.map();
                let session = arbiter.session().unwrap();
                assert_eq!(map.listener_count(), session.listeners().count());
                assert_eq!(map.marker_count(), 0, "{:?} -> {:?}", a, b);
                let own_layers = usize::from(session.preview().is_some());
                assert_eq!(map.layer_count(), own_layers, "{:?} -> {:?}", a, b);
                assert_eq!(map.source_count(), own_layers, "{:?} -> {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_activate_same_tool_toggles_off() {
        let mut arbiter = arbiter();
        assert_eq!(arbiter.activate(ToolKind::BoundingBox), Some(ToolKind::BoundingBox));
        assert_eq!(arbiter.activate(ToolKind::BoundingBox), None);
        assert_eq!(arbiter.active(), None);
        assert!(arbiter.map().is_clean());
    }

    #[test]
    fn test_one_keyboard_listener_across_switches() {
        let mut arbiter = arbiter();
        let sequence = [
            ToolKind::PointSet,
            ToolKind::Polyline,
            ToolKind::BoundingBox,
            ToolKind::PointSet,
        ];
        for kind in sequence {
            arbiter.activate(kind);
            arbiter.select_row(0);
            arbiter.select_row(0);
            assert_eq!(arbiter.map().listeners_of(EventKind::KeyDown), 1);
        }
    }

    #[test]
    fn test_forwarding_without_session_is_noop() {
        let mut arbiter = arbiter();
        arbiter.dispatch(&MapEvent::Click(Point::new(5.0, 52.0)));
        arbiter.select_row(0);
        arbiter.set_row_text(0, "5", "52");
        arbiter.delete_row(0);
        arbiter.add_row();
        arbiter.select_product(Product::Dsm);
        assert!(arbiter.confirm().is_none());
        assert!(arbiter.map().is_clean());

        arbiter.deactivate();
        arbiter.deactivate();
    }

    #[test]
    fn test_bounding_box_to_request() {
        let mut arbiter = arbiter();
        arbiter.activate(ToolKind::BoundingBox);
        arbiter.dispatch(&MapEvent::Click(Point::new(5.1, 52.1)));
        assert!(arbiter.confirm().is_none());
        arbiter.dispatch(&MapEvent::Click(Point::new(5.0, 52.0)));
        arbiter.select_resolution(Resolution::OneMetre);

        let raw = arbiter.confirm().unwrap();
        assert_eq!(raw.resolution, "1.0 m");
        assert_eq!(raw.x1.unwrap().to_string(), "5.100000");

        let map = arbiter.into_map();
        assert!(map.is_clean());
    }
}
