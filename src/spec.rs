//! Plain records handed over by the content extractor.

use serde::Deserialize;

use crate::config::{Layout, deserialize_layout};
use crate::error::ContentShapeError;

/// A merge instruction in the coordinate space of its table section
/// (header spans count rows from the first header row, body spans from the
/// first body row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct SpanEntry {
    pub row: usize,
    pub col: usize,
    #[serde(default = "one")]
    pub colspan: usize,
    #[serde(default = "one")]
    pub rowspan: usize,
}

fn one() -> usize {
    1
}

impl SpanEntry {
    pub fn new(row: usize, col: usize, colspan: usize, rowspan: usize) -> Self {
        Self {
            row,
            col,
            colspan,
            rowspan,
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.colspan <= 1 && self.rowspan <= 1
    }

    pub(crate) fn offset_rows(self, by: usize) -> Self {
        Self {
            row: self.row + by,
            ..self
        }
    }

    /// Inclusive `(end_row, end_col)` after clamping to a `rows × cols` grid.
    pub fn clamped_end(&self, rows: usize, cols: usize) -> (usize, usize) {
        let end_r = (self.row + self.rowspan.max(1) - 1).min(rows.saturating_sub(1));
        let end_c = (self.col + self.colspan.max(1) - 1).min(cols.saturating_sub(1));
        (end_r, end_c)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    pub id: Option<String>,
    pub label: String,
    pub title: String,
    #[serde(alias = "header_rows")]
    pub headers: Vec<Vec<String>>,
    #[serde(alias = "body_rows")]
    pub rows: Vec<Vec<String>>,
    #[serde(alias = "header_span_matrix")]
    pub header_spans: Vec<SpanEntry>,
    #[serde(alias = "body_span_matrix", alias = "spans")]
    pub body_spans: Vec<SpanEntry>,
    #[serde(deserialize_with = "deserialize_layout")]
    pub layout: Option<Layout>,
    /// Distance between a floating table and surrounding text, in cm.
    pub wrap_distance: Option<f64>,
}

impl TableSpec {
    /// Name used in logs and warnings.
    pub fn display_name(&self) -> String {
        match (self.label.trim(), self.title.trim()) {
            ("", "") => self.id.clone().unwrap_or_else(|| "unnamed table".to_string()),
            (label, "") => label.to_string(),
            ("", title) => title.to_string(),
            (label, title) => format!("{label} {title}"),
        }
    }

    /// Memoization key for the layout decision. Carries the identifying
    /// fields and the column count the decision is derived from, so two
    /// tables only share a key when they would decide alike.
    pub fn key(&self) -> String {
        format!(
            "table:{}|{}|{}#{}",
            self.id.as_deref().unwrap_or(""),
            self.label,
            self.title,
            self.column_count()
        )
    }

    pub fn total_rows(&self) -> usize {
        self.headers.len() + self.rows.len()
    }

    /// Widest row among headers, body and the starting cells of spans.
    pub fn column_count(&self) -> usize {
        let cells = self
            .headers
            .iter()
            .chain(self.rows.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let spans = self
            .header_spans
            .iter()
            .chain(self.body_spans.iter())
            .map(|s| s.col + 1)
            .max()
            .unwrap_or(0);
        cells.max(spans)
    }

    /// Header rows followed by body rows, each right-padded to `cols`.
    pub fn grid_text(&self, cols: usize) -> Vec<Vec<&str>> {
        self.headers
            .iter()
            .chain(self.rows.iter())
            .map(|row| {
                (0..cols)
                    .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                    .collect()
            })
            .collect()
    }

    /// `true` for every column that has no non-blank text in any row.
    pub fn empty_columns(&self, cols: usize) -> Vec<bool> {
        (0..cols)
            .map(|c| {
                self.headers
                    .iter()
                    .chain(self.rows.iter())
                    .all(|row| row.get(c).is_none_or(|t| t.trim().is_empty()))
            })
            .collect()
    }

    /// Header spans followed by body spans, in grid coordinates and scan
    /// order.
    pub fn grid_spans(&self) -> Vec<SpanEntry> {
        let offset = self.headers.len();
        self.header_spans
            .iter()
            .copied()
            .chain(self.body_spans.iter().map(|s| s.offset_rows(offset)))
            .collect()
    }

    /// Rejects zero-sized spans and spans that overlap each other once
    /// clamped to a `total_rows × cols` grid. Spans starting outside the
    /// grid are left for the merger to skip, single-cell spans are no-ops.
    pub fn validate_spans(&self, cols: usize) -> Result<(), ContentShapeError> {
        let rows = self.total_rows();
        let spans = self.grid_spans();
        let mut rects: Vec<(SpanEntry, (usize, usize, usize, usize))> = Vec::new();
        for span in spans {
            if span.colspan == 0 || span.rowspan == 0 {
                return Err(ContentShapeError::ZeroSpan(span));
            }
            if span.row >= rows || span.col >= cols || span.is_single_cell() {
                continue;
            }
            let (end_r, end_c) = span.clamped_end(rows, cols);
            let rect = (span.row, span.col, end_r, end_c);
            if let Some((first, _)) = rects.iter().find(|(_, other)| rects_overlap(*other, rect)) {
                return Err(ContentShapeError::OverlappingSpans {
                    first: *first,
                    second: span,
                });
            }
            rects.push((span, rect));
        }
        Ok(())
    }
}

pub(crate) fn rects_overlap(a: (usize, usize, usize, usize), b: (usize, usize, usize, usize)) -> bool {
    a.0 <= b.2 && b.0 <= a.2 && a.1 <= b.3 && b.1 <= a.3
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FigureSpec {
    pub id: Option<String>,
    pub label: String,
    pub caption: String,
    /// Image reference as written in the source (`xlink:href`).
    #[serde(alias = "image", alias = "href")]
    pub image_ref: String,
    pub alt_text: String,
    #[serde(deserialize_with = "deserialize_layout")]
    pub layout: Option<Layout>,
    /// Replaces the global wide threshold for this figure only.
    pub threshold: Option<f64>,
}

impl FigureSpec {
    pub fn display_name(&self) -> String {
        if !self.label.trim().is_empty() {
            self.label.trim().to_string()
        } else if let Some(id) = self.id.as_deref().filter(|s| !s.is_empty()) {
            id.to_string()
        } else {
            self.image_ref.clone()
        }
    }

    /// Memoization key for the layout decision: identity, image and
    /// threshold override.
    pub fn key(&self) -> String {
        let threshold = self.threshold.map(|t| t.to_string()).unwrap_or_default();
        format!(
            "fig:{}|{}@{}",
            self.id.as_deref().unwrap_or(""),
            self.image_ref,
            threshold
        )
    }
}
