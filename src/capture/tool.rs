//! Static description of each drawing tool

use std::fmt;

use crate::capture::map::{LineDash, LineStyle};

/// The mutually exclusive tools a user can open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    PointSet,
    Polyline,
    BoundingBox,
    Place,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::PointSet,
        ToolKind::Polyline,
        ToolKind::BoundingBox,
        ToolKind::Place,
    ];

    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            ToolKind::PointSet => ToolDescriptor {
                kind: self,
                title: "Query Points",
                slots: SlotPolicy::Unbounded,
                advance: AdvancePolicy::AppendAtEnd,
                preview: PreviewKind::Markers,
                deletable_rows: true,
                extraction: false,
                pointer_move: false,
                preview_ids: None,
            },
            ToolKind::Polyline => ToolDescriptor {
                kind: self,
                title: "Query Profile",
                slots: SlotPolicy::Unbounded,
                advance: AdvancePolicy::AppendAndDraw,
                preview: PreviewKind::Line,
                deletable_rows: true,
                extraction: false,
                pointer_move: true,
                preview_ids: Some(PreviewIds {
                    source: "draw-line-source",
                    layer: "draw-line-layer",
                }),
            },
            ToolKind::BoundingBox => ToolDescriptor {
                kind: self,
                title: "Query Bounding Box",
                slots: SlotPolicy::Fixed(2),
                advance: AdvancePolicy::NextCorner,
                preview: PreviewKind::Rectangle,
                deletable_rows: false,
                extraction: true,
                pointer_move: true,
                preview_ids: Some(PreviewIds {
                    source: "draw-bbox-source",
                    layer: "draw-bbox-layer",
                }),
            },
            ToolKind::Place => ToolDescriptor {
                kind: self,
                title: "Query Place",
                slots: SlotPolicy::Fixed(0),
                advance: AdvancePolicy::None,
                preview: PreviewKind::Outline,
                deletable_rows: false,
                extraction: false,
                pointer_move: false,
                preview_ids: Some(PreviewIds {
                    source: "municipality",
                    layer: "municipality-outline",
                }),
            },
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().title)
    }
}

/// How many geometry slots a tool has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Exactly this many rows, never added or removed
    Fixed(usize),
    /// Starts with one row and grows as points are placed
    Unbounded,
}

impl SlotPolicy {
    pub fn initial_rows(&self) -> usize {
        match self {
            SlotPolicy::Fixed(n) => *n,
            SlotPolicy::Unbounded => 1,
        }
    }
}

/// Where the selection goes after a map click fills a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// Filling the last row appends an empty one and selects it
    AppendAtEnd,
    /// Always move to a trailing empty row and keep following the pointer
    AppendAndDraw,
    /// Move to the next corner while drawing; the last corner freezes the shape
    NextCorner,
    /// The tool takes no clicks
    None,
}

impl AdvancePolicy {
    /// The selected row follows the pointer from the moment the tool opens
    /// and again whenever the user adds a row
    pub fn draws_continuously(&self) -> bool {
        *self == AdvancePolicy::AppendAndDraw
    }
}

/// How the tool's geometry is drawn on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// One marker per filled row
    Markers,
    /// Open path through the filled rows
    Line,
    /// Rectangle spanned by the two corners
    Rectangle,
    /// Outline of a resolved place
    Outline,
}

impl PreviewKind {
    pub fn style(&self) -> LineStyle {
        match self {
            PreviewKind::Outline => LineStyle {
                color: "#FF0000",
                width: 2.0,
                dash: LineDash::Solid,
            },
            _ => LineStyle {
                color: "#ff0000",
                width: 3.0,
                dash: LineDash::Dashed,
            },
        }
    }
}

/// Map source and layer a tool draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewIds {
    pub source: &'static str,
    pub layer: &'static str,
}

/// Everything that distinguishes one tool from another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub kind: ToolKind,
    pub title: &'static str,
    pub slots: SlotPolicy,
    pub advance: AdvancePolicy,
    pub preview: PreviewKind,
    /// Rows can be added and deleted by the user
    pub deletable_rows: bool,
    /// The panel offers product and resolution and confirms an extraction
    pub extraction: bool,
    /// The tool follows the pointer while drawing
    pub pointer_move: bool,
    pub preview_ids: Option<PreviewIds>,
}

impl ToolDescriptor {
    /// Tools that take map input listen for clicks and the keyboard
    pub fn takes_map_input(&self) -> bool {
        self.advance != AdvancePolicy::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptors() {
        let bbox = ToolKind::BoundingBox.descriptor();
        assert_eq!(bbox.slots.initial_rows(), 2);
        assert!(!bbox.deletable_rows);
        assert!(bbox.extraction);
        assert_eq!(bbox.preview_ids.unwrap().layer, "draw-bbox-layer");

        let points = ToolKind::PointSet.descriptor();
        assert_eq!(points.slots.initial_rows(), 1);
        assert!(points.preview_ids.is_none());
        assert!(!points.extraction);

        assert!(!points.advance.draws_continuously());
        assert!(ToolKind::Polyline.descriptor().advance.draws_continuously());
        assert!(!bbox.advance.draws_continuously());

        let place = ToolKind::Place.descriptor();
        assert!(!place.takes_map_input());
        assert_eq!(place.preview.style().width, 2.0);
        assert_eq!(place.preview.style().dash, LineDash::Solid);
    }

    #[test]
    fn test_titles_are_distinct() {
        let titles: HashSet<_> = ToolKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(titles.len(), ToolKind::ALL.len());
    }
}
