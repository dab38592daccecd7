//! Headless drawing tools
//!
//! Each tool is a [`ToolSession`] configured by a [`ToolDescriptor`]. The
//! [`ToolArbiter`] keeps at most one of them open and routes user input to it.
//! The map itself is abstracted behind [`MapSurface`].

pub mod arbiter;
pub mod buffer;
pub mod map;
pub mod panel;
pub mod session;
pub mod tool;

/// A point in the display reference system
pub type Point = crate::projection::Coordinate;

pub use arbiter::ToolArbiter;
pub use buffer::GeometryBuffer;
pub use map::{
    Cursor, EventKind, InMemoryMap, Key, LineDash, LineStyle, ListenerId, MapEvent, MapSurface,
    MarkerId,
};
pub use panel::{Panel, PanelRow};
pub use session::{Listeners, PreviewLayer, SessionState, ToolSession};
pub use tool::{AdvancePolicy, PreviewKind, PreviewIds, SlotPolicy, ToolDescriptor, ToolKind};
