//! The map capabilities the drawing tools rely on
//!
//! The rendering library itself is external. Tools only talk to it through
//! [`MapSurface`], so any host can drive them: a browser map, a desktop widget
//! or the [`InMemoryMap`] used by the tests.

use std::collections::BTreeMap;

use crate::place::{Bounds, Geometry};
use crate::projection::Coordinate;

/// Handle of a registered event listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Handle of a point marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Event kinds a tool can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    PointerMove,
    KeyDown,
}

/// Keys the drawing tools react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

impl Key {
    /// Maps a DOM-style key name
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Input delivered by the host to the active tool
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Click at a display coordinate
    Click(Coordinate),
    /// Pointer moved to a display coordinate
    PointerMove(Coordinate),
    KeyDown(Key),
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::Click(_) => EventKind::Click,
            MapEvent::PointerMove(_) => EventKind::PointerMove,
            MapEvent::KeyDown(_) => EventKind::KeyDown,
        }
    }
}

/// Dash style of a line layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDash {
    /// In-progress geometry
    Dashed,
    /// Frozen geometry
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
}

/// Paint properties of a line layer
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f64,
    pub dash: LineDash,
}

/// What a tool can ask of the map
///
/// Removal of anything that no longer exists must be a no-op, so teardown can
/// run without knowing what is still present.
pub trait MapSurface {
    fn add_source(&mut self, id: &str, data: Geometry);
    fn set_source_data(&mut self, id: &str, data: Geometry);
    fn remove_source(&mut self, id: &str);
    fn has_source(&self, id: &str) -> bool;

    fn add_line_layer(&mut self, id: &str, source: &str, style: LineStyle);
    fn remove_layer(&mut self, id: &str);
    fn has_layer(&self, id: &str) -> bool;
    fn set_line_dash(&mut self, layer: &str, dash: LineDash);

    fn subscribe(&mut self, kind: EventKind) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId);

    fn add_marker(&mut self, at: Coordinate, color: &'static str) -> MarkerId;
    fn move_marker(&mut self, id: MarkerId, to: Coordinate);
    fn remove_marker(&mut self, id: MarkerId);

    fn set_cursor(&mut self, cursor: Cursor);
    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    pub source: String,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    pub color: &'static str,
}

/// A map that only records what was asked of it
#[derive(Debug, Default)]
pub struct InMemoryMap {
    sources: BTreeMap<String, Geometry>,
    layers: BTreeMap<String, LineLayer>,
    listeners: BTreeMap<ListenerId, EventKind>,
    markers: BTreeMap<MarkerId, Marker>,
    cursor: Cursor,
    fitted: Option<(Bounds, u32)>,
    next_id: u64,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn source_data(&self, id: &str) -> Option<&Geometry> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LineLayer> {
        self.layers.get(id)
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Last `fit_bounds` request
    pub fn fitted(&self) -> Option<(Bounds, u32)> {
        self.fitted
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners_of(&self, kind: EventKind) -> usize {
        self.listeners.values().filter(|&&k| k == kind).count()
    }

    /// True when nothing any tool added is left on the map
    pub fn is_clean(&self) -> bool {
        self.sources.is_empty()
            && self.layers.is_empty()
            && self.listeners.is_empty()
            && self.markers.is_empty()
            && self.cursor == Cursor::Default
    }
}

impl MapSurface for InMemoryMap {
    fn add_source(&mut self, id: &str, data: Geometry) {
        self.sources.insert(id.to_string(), data);
    }

    fn set_source_data(&mut self, id: &str, data: Geometry) {
        if let Some(slot) = self.sources.get_mut(id) {
            *slot = data;
        }
    }

    fn remove_source(&mut self, id: &str) {
        self.sources.remove(id);
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_line_layer(&mut self, id: &str, source: &str, style: LineStyle) {
        self.layers.insert(
            id.to_string(),
            LineLayer {
                source: source.to_string(),
                style,
            },
        );
    }

    fn remove_layer(&mut self, id: &str) {
        self.layers.remove(id);
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    fn set_line_dash(&mut self, layer: &str, dash: LineDash) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.style.dash = dash;
        }
    }

    fn subscribe(&mut self, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.insert(id, kind);
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn add_marker(&mut self, at: Coordinate, color: &'static str) -> MarkerId {
        let id = MarkerId(self.next_id());
        self.markers.insert(id, Marker { position: at, color });
        id
    }

    fn move_marker(&mut self, id: MarkerId, to: Coordinate) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.position = to;
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.fitted = Some((bounds, padding));
    }
}
