//! View model of a tool's side panel

use crate::extraction::{Product, Resolution};
use crate::capture::Point;

/// Formats a coordinate the way rows display it
pub fn format_coordinate(value: f64) -> String {
    format!("{:.6}", value)
}

/// Parses one typed coordinate field
pub fn parse_coordinate(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One input row: a label and the longitude/latitude text as shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub label: String,
    pub lon: String,
    pub lat: String,
}

impl PanelRow {
    fn empty(number: usize) -> Self {
        Self {
            label: row_label(number),
            lon: String::new(),
            lat: String::new(),
        }
    }

    /// The point the row's text describes, if both fields are valid
    pub fn point(&self) -> Option<Point> {
        Point::checked_lonlat(parse_coordinate(&self.lon)?, parse_coordinate(&self.lat)?)
    }
}

fn row_label(number: usize) -> String {
    format!("Point {}", number)
}

/// Rows plus, for the bounding box, the product and resolution selectors
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: &'static str,
    rows: Vec<PanelRow>,
    pub product: Product,
    pub resolution: Resolution,
}

impl Panel {
    pub fn new(title: &'static str, rows: usize) -> Self {
        Self {
            title,
            rows: (1..=rows).map(PanelRow::empty).collect(),
            product: Product::Dtm,
            resolution: Resolution::HalfMetre,
        }
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&PanelRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self) -> usize {
        self.rows.push(PanelRow::empty(self.rows.len() + 1));
        self.rows.len() - 1
    }

    /// Removes a row and renumbers the remaining labels
    pub fn remove_row(&mut self, index: usize) {
        if index < self.rows.len() {
            self.rows.remove(index);
            for (i, row) in self.rows.iter_mut().enumerate() {
                row.label = row_label(i + 1);
            }
        }
    }

    pub fn set_text(&mut self, index: usize, lon: &str, lat: &str) {
        if let Some(row) = self.rows.get_mut(index) {
            row.lon = lon.to_string();
            row.lat = lat.to_string();
        }
    }

    /// Shows a placed point with six decimals
    pub fn show_point(&mut self, index: usize, point: Point) {
        self.set_text(index, &format_coordinate(point.lon()), &format_coordinate(point.lat()));
    }
}
