//! The live state of one open drawing tool

use log::debug;

use crate::capture::buffer::GeometryBuffer;
use crate::capture::map::{
    Cursor, EventKind, Key, LineDash, ListenerId, MapEvent, MapSurface, MarkerId,
};
use crate::capture::panel::Panel;
use crate::capture::tool::{AdvancePolicy, PreviewKind, ToolDescriptor, ToolKind};
use crate::capture::Point;
use crate::extraction::{Product, RawExtractionRequest, Resolution};
use crate::place::Geometry;

const MARKER_COLOR: &str = "red";
const FIT_PADDING: u32 = 50;

/// Where the user is in the drawing flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No row selected; map clicks are ignored
    Idle,
    /// Clicks fill `row`; with `drawing` set the preview follows the pointer
    RowSelected { row: usize, drawing: bool },
}

/// Every listener a session registered, so teardown can release them all
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listeners {
    pub click: Option<ListenerId>,
    pub pointer_move: Option<ListenerId>,
    pub key_down: Option<ListenerId>,
}

impl Listeners {
    fn register<M: MapSurface>(map: &mut M, descriptor: &ToolDescriptor) -> Self {
        if !descriptor.takes_map_input() {
            return Self::default();
        }
        Self {
            click: Some(map.subscribe(EventKind::Click)),
            pointer_move: descriptor
                .pointer_move
                .then(|| map.subscribe(EventKind::PointerMove)),
            key_down: Some(map.subscribe(EventKind::KeyDown)),
        }
    }

    fn release<M: MapSurface>(&mut self, map: &mut M) {
        for id in [self.click.take(), self.pointer_move.take(), self.key_down.take()]
            .into_iter()
            .flatten()
        {
            map.unsubscribe(id);
        }
    }

    /// True if events of this kind reach the session
    pub fn handles(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Click => self.click.is_some(),
            EventKind::PointerMove => self.pointer_move.is_some(),
            EventKind::KeyDown => self.key_down.is_some(),
        }
    }

    pub fn count(&self) -> usize {
        [self.click, self.pointer_move, self.key_down]
            .iter()
            .flatten()
            .count()
    }
}

/// A source and the line layer drawing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLayer {
    pub source_id: &'static str,
    pub layer_id: &'static str,
}

impl PreviewLayer {
    fn remove<M: MapSurface>(&self, map: &mut M) {
        if map.has_layer(self.layer_id) {
            map.remove_layer(self.layer_id);
        }
        if map.has_source(self.source_id) {
            map.remove_source(self.source_id);
        }
    }
}

/// One open tool: its geometry, panel and everything it put on the map
///
/// All map mutation goes through the `&mut M` handed in by the owner, and
/// [`ToolSession::close`] removes everything the session added.
#[derive(Debug)]
pub struct ToolSession {
    descriptor: ToolDescriptor,
    buffer: GeometryBuffer,
    panel: Panel,
    state: SessionState,
    listeners: Listeners,
    preview: Option<PreviewLayer>,
    markers: Vec<Option<MarkerId>>,
}

impl ToolSession {
    /// Opens a tool: registers its listeners, adds its preview layer and selects the first row
    pub fn open<M: MapSurface>(kind: ToolKind, map: &mut M) -> Self {
        let descriptor = kind.descriptor();
        let buffer = GeometryBuffer::new(kind);
        let panel = Panel::new(descriptor.title, buffer.len());
        let listeners = Listeners::register(map, &descriptor);

        let preview = match (descriptor.preview, descriptor.preview_ids) {
            (PreviewKind::Line | PreviewKind::Rectangle, Some(ids)) => {
                let empty = match descriptor.preview {
                    PreviewKind::Line => Geometry::LineString(Vec::new()),
                    _ => Geometry::empty_polygon(),
                };
                map.add_source(ids.source, empty);
                map.add_line_layer(ids.layer, ids.source, descriptor.preview.style());
                Some(PreviewLayer {
                    source_id: ids.source,
                    layer_id: ids.layer,
                })
            }
            _ => None,
        };

        let state = if buffer.is_empty() {
            SessionState::Idle
        } else {
            map.set_cursor(Cursor::Crosshair);
            SessionState::RowSelected {
                row: 0,
                drawing: descriptor.advance.draws_continuously(),
            }
        };

        debug!("Opened {} with {} listeners", descriptor.title, listeners.count());
        Self {
            markers: vec![None; buffer.len()],
            descriptor,
            buffer,
            panel,
            state,
            listeners,
            preview,
        }
    }

    /// Releases listeners, preview layers and markers; safe to call twice
    pub fn close<M: MapSurface>(&mut self, map: &mut M) {
        self.listeners.release(map);
        if let Some(preview) = self.preview.take() {
            preview.remove(map);
        }
        for marker in self.markers.iter_mut().filter_map(Option::take) {
            map.remove_marker(marker);
        }
        map.set_cursor(Cursor::Default);
        self.state = SessionState::Idle;
        debug!("Closed {}", self.descriptor.title);
    }

    pub fn kind(&self) -> ToolKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn buffer(&self) -> &GeometryBuffer {
        &self.buffer
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn preview(&self) -> Option<PreviewLayer> {
        self.preview
    }

    pub fn marker(&self, row: usize) -> Option<MarkerId> {
        self.markers.get(row).copied().flatten()
    }

    pub fn selected_row(&self) -> Option<usize> {
        match self.state {
            SessionState::RowSelected { row, .. } => Some(row),
            SessionState::Idle => None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, SessionState::RowSelected { drawing: true, .. })
    }

    /// Delivers a map or keyboard event; events without a listener are dropped
    pub fn handle<M: MapSurface>(&mut self, map: &mut M, event: &MapEvent) {
        if !self.listeners.handles(event.kind()) {
            return;
        }
        match event {
            MapEvent::Click(point) => self.on_click(map, *point),
            MapEvent::PointerMove(point) => self.on_pointer_move(map, *point),
            MapEvent::KeyDown(Key::Escape) => self.on_escape(map),
            MapEvent::KeyDown(Key::Other(_)) => {}
        }
    }

    fn on_click<M: MapSurface>(&mut self, map: &mut M, point: Point) {
        let SessionState::RowSelected { row, .. } = self.state else {
            return;
        };
        if !point.is_valid_lonlat() {
            return;
        }

        self.buffer.set(row, Some(point));
        self.panel.show_point(row, point);
        if self.descriptor.preview == PreviewKind::Markers {
            self.place_marker(map, row, point);
        }

        match self.descriptor.advance {
            AdvancePolicy::AppendAtEnd => {
                if row + 1 == self.buffer.len() {
                    let next = self.push_row();
                    self.select(map, next, false);
                }
            }
            AdvancePolicy::AppendAndDraw => {
                let next = self.trailing_empty_row();
                self.select(map, next, true);
            }
            AdvancePolicy::NextCorner => {
                if row + 1 < self.buffer.len() {
                    self.select(map, row + 1, true);
                } else {
                    self.freeze(map);
                }
            }
            AdvancePolicy::None => {}
        }
        self.redraw(map);
    }

    fn on_pointer_move<M: MapSurface>(&mut self, map: &mut M, cursor: Point) {
        if !self.is_drawing() {
            return;
        }
        let Some(preview) = self.preview else {
            return;
        };
        let data = match self.descriptor.preview {
            PreviewKind::Rectangle => match self.buffer.get(0) {
                Some(first) => Geometry::rectangle(first, cursor),
                None => return,
            },
            PreviewKind::Line => {
                let mut points = self.buffer.points();
                if points.is_empty() {
                    return;
                }
                points.push(cursor);
                Geometry::line_string(&points)
            }
            _ => return,
        };
        map.set_source_data(preview.source_id, data);
    }

    fn on_escape<M: MapSurface>(&mut self, map: &mut M) {
        self.deselect(map);
        if self.descriptor.preview == PreviewKind::Line {
            self.set_dash(map, LineDash::Solid);
        }
        self.redraw(map);
    }

    /// Selects a row for map input, or deselects it if it already is
    pub fn select_row<M: MapSurface>(&mut self, map: &mut M, row: usize) {
        if row >= self.buffer.len() {
            return;
        }
        if self.selected_row() == Some(row) {
            self.deselect(map);
            return;
        }
        self.select(map, row, false);
        if self.descriptor.preview == PreviewKind::Rectangle {
            self.set_dash(map, LineDash::Dashed);
        }
        self.redraw(map);
    }

    /// Applies typed text; the slot is cleared unless both fields are valid
    pub fn set_row_text<M: MapSurface>(&mut self, map: &mut M, row: usize, lon: &str, lat: &str) {
        if row >= self.buffer.len() {
            return;
        }
        self.panel.set_text(row, lon, lat);
        let point = self.panel.row(row).and_then(|r| r.point());
        self.buffer.set(row, point);

        if self.descriptor.preview == PreviewKind::Markers {
            match point {
                Some(point) => self.place_marker(map, row, point),
                None => self.remove_marker(map, row),
            }
        }

        // A typed last corner ends drawing just like a clicked one
        let drawing_here = self.state == SessionState::RowSelected { row, drawing: true };
        if self.descriptor.advance == AdvancePolicy::NextCorner
            && drawing_here
            && point.is_some()
            && row + 1 == self.buffer.len()
        {
            self.freeze(map);
        }
        self.redraw(map);
    }

    /// Deletes a row of a point set or polyline and renumbers the rest
    pub fn delete_row<M: MapSurface>(&mut self, map: &mut M, row: usize) {
        if !self.descriptor.deletable_rows || row >= self.buffer.len() {
            return;
        }
        self.remove_marker(map, row);
        self.buffer.remove(row);
        self.panel.remove_row(row);
        self.markers.remove(row);

        match self.state {
            SessionState::RowSelected { row: selected, .. } if selected == row => {
                self.deselect(map)
            }
            SessionState::RowSelected { row: selected, drawing } if selected > row => {
                self.state = SessionState::RowSelected {
                    row: selected - 1,
                    drawing,
                };
            }
            _ => {}
        }
        if self.buffer.is_empty() {
            self.push_row();
        }
        self.redraw(map);
    }

    /// Selects the trailing empty row, appending one if needed
    ///
    /// On a polyline this resumes drawing after Escape.
    pub fn add_row<M: MapSurface>(&mut self, map: &mut M) {
        if !self.descriptor.deletable_rows {
            return;
        }
        let row = self.trailing_empty_row();
        let drawing = self.descriptor.advance.draws_continuously();
        self.select(map, row, drawing);
        if drawing {
            self.set_dash(map, LineDash::Dashed);
        }
        self.redraw(map);
    }

    pub fn select_product(&mut self, product: Product) {
        if self.descriptor.extraction {
            self.panel.product = product;
        }
    }

    pub fn select_resolution(&mut self, resolution: Resolution) {
        if self.descriptor.extraction {
            self.panel.resolution = resolution;
        }
    }

    /// True once both bounding box corners hold a point
    pub fn confirm_enabled(&self) -> bool {
        self.descriptor.extraction && self.buffer.is_complete()
    }

    /// The raw extraction request, if the confirm gate is open
    pub fn confirm(&self) -> Option<RawExtractionRequest> {
        if !self.confirm_enabled() {
            return None;
        }
        let (first, second) = (self.panel.row(0)?, self.panel.row(1)?);
        Some(RawExtractionRequest::from_text(
            (first.lon.as_str(), first.lat.as_str()),
            (second.lon.as_str(), second.lat.as_str()),
            self.panel.product.as_str(),
            self.panel.resolution.label(),
        ))
    }

    /// Replaces the place outline and zooms the map to it
    pub fn show_place<M: MapSurface>(&mut self, map: &mut M, geometry: Geometry) {
        let Some(ids) = self.descriptor.preview_ids else {
            return;
        };
        if self.descriptor.preview != PreviewKind::Outline {
            return;
        }

        let outline = PreviewLayer {
            source_id: ids.source,
            layer_id: ids.layer,
        };
        outline.remove(map);

        let bounds = geometry.bounds();
        map.add_source(outline.source_id, geometry);
        map.add_line_layer(outline.layer_id, outline.source_id, self.descriptor.preview.style());
        self.preview = Some(outline);

        if let Some(bounds) = bounds {
            map.fit_bounds(bounds, FIT_PADDING);
        }
    }

    fn push_row(&mut self) -> usize {
        let index = match self.buffer.push_empty() {
            Some(index) => index,
            None => self.buffer.len().saturating_sub(1),
        };
        self.panel.push_row();
        self.markers.push(None);
        index
    }

    /// Index of the last row if it is empty, otherwise of a newly appended one
    fn trailing_empty_row(&mut self) -> usize {
        if self.buffer.last_is_empty() {
            self.buffer.len() - 1
        } else {
            self.push_row()
        }
    }

    /// Stops following the pointer and draws the shape solid
    fn freeze<M: MapSurface>(&mut self, map: &mut M) {
        self.set_dash(map, LineDash::Solid);
        self.deselect(map);
    }

    fn select<M: MapSurface>(&mut self, map: &mut M, row: usize, drawing: bool) {
        self.state = SessionState::RowSelected { row, drawing };
        map.set_cursor(Cursor::Crosshair);
        debug!("{}: row {} selected (drawing: {})", self.descriptor.title, row, drawing);
    }

    fn deselect<M: MapSurface>(&mut self, map: &mut M) {
        self.state = SessionState::Idle;
        map.set_cursor(Cursor::Default);
    }

    fn set_dash<M: MapSurface>(&self, map: &mut M, dash: LineDash) {
        if let Some(preview) = self.preview {
            map.set_line_dash(preview.layer_id, dash);
        }
    }

    fn place_marker<M: MapSurface>(&mut self, map: &mut M, row: usize, point: Point) {
        match self.markers.get(row).copied().flatten() {
            Some(id) => map.move_marker(id, point),
            None => {
                let id = map.add_marker(point, MARKER_COLOR);
                if let Some(slot) = self.markers.get_mut(row) {
                    *slot = Some(id);
                }
            }
        }
    }

    fn remove_marker<M: MapSurface>(&mut self, map: &mut M, row: usize) {
        if let Some(id) = self.markers.get_mut(row).and_then(Option::take) {
            map.remove_marker(id);
        }
    }

    /// Redraws the preview from the committed slots only
    fn redraw<M: MapSurface>(&self, map: &mut M) {
        let Some(preview) = self.preview else {
            return;
        };
        let data = match self.descriptor.preview {
            PreviewKind::Line => Geometry::line_string(&self.buffer.points()),
            PreviewKind::Rectangle => match self.buffer.corners() {
                Some((a, b)) => Geometry::rectangle(a, b),
                None => Geometry::empty_polygon(),
            },
            PreviewKind::Markers | PreviewKind::Outline => return,
        };
        map.set_source_data(preview.source_id, data);
    }
}
