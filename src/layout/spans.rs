//! Applies row/column merge instructions over a table that already holds
//! its text.

use crate::backend::{Alignment, CellStyle, DocumentBackend, TableId};
use crate::error::{Warning, Warnings};
use crate::spec::{SpanEntry, rects_overlap};

/// Shape of the rendered grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
    /// Leading rows that are header rows.
    pub header_rows: usize,
}

impl GridShape {
    pub fn cell_style(&self, row: usize, col: usize) -> CellStyle {
        CellStyle {
            bold: row < self.header_rows,
            alignment: if col == 0 {
                Alignment::Left
            } else {
                Alignment::Center
            },
        }
    }
}

pub struct SpanMerger<'a, B: DocumentBackend + ?Sized> {
    backend: &'a mut B,
    table: TableId,
    shape: GridShape,
    name: &'a str,
    warnings: &'a mut Warnings,
    applied: Vec<(usize, usize, usize, usize)>,
}

impl<'a, B: DocumentBackend + ?Sized> SpanMerger<'a, B> {
    pub fn new(
        backend: &'a mut B,
        table: TableId,
        shape: GridShape,
        name: &'a str,
        warnings: &'a mut Warnings,
    ) -> Self {
        Self {
            backend,
            table,
            shape,
            name,
            warnings,
            applied: Vec::new(),
        }
    }

    /// Applies `spans` (grid coordinates) in order and returns how many
    /// were merged. A span overlapping one applied earlier is skipped, so
    /// the first applied span wins.
    pub fn apply_all(&mut self, spans: &[SpanEntry]) -> usize {
        let mut merged = 0;
        for span in spans {
            if self.apply(*span) {
                merged += 1;
            }
        }
        merged
    }

    /// Horizontal merge first, then vertical. Out-of-grid extents are
    /// truncated to the grid edge and reported.
    pub fn apply(&mut self, span: SpanEntry) -> bool {
        let GridShape { rows, cols, .. } = self.shape;
        if span.colspan == 0 || span.rowspan == 0 {
            self.skip(span, "zero colspan or rowspan");
            return false;
        }
        if span.row >= rows || span.col >= cols {
            self.skip(span, "starts outside the grid");
            return false;
        }
        if span.is_single_cell() {
            return false;
        }

        let (end_r, end_c) = span.clamped_end(rows, cols);
        let rect = (span.row, span.col, end_r, end_c);
        if self.applied.iter().any(|done| rects_overlap(*done, rect)) {
            self.skip(span, "overlaps an earlier span");
            return false;
        }
        if end_r + 1 < span.row + span.rowspan || end_c + 1 < span.col + span.colspan {
            self.warnings.push(Warning::MergeClamped {
                table: self.name.to_string(),
                requested: span,
                end_row: end_r,
                end_col: end_c,
            });
        }

        let (r, c) = (span.row, span.col);
        if end_c > c {
            let cells: Vec<(usize, usize)> = (c..=end_c).map(|col| (r, col)).collect();
            self.consolidate(&cells);
            self.merge((r, c), (r, end_c));
        }
        if end_r > r {
            // The master already spans c..=end_c, so the rows below are
            // scanned across that full width.
            let cells: Vec<(usize, usize)> = std::iter::once((r, c))
                .chain((r + 1..=end_r).flat_map(|row| (c..=end_c).map(move |col| (row, col))))
                .collect();
            self.consolidate(&cells);
            self.merge((r, c), (end_r, c));
        }

        log::debug!("{}: merged ({r}, {c})..=({end_r}, {end_c})", self.name);
        self.applied.push(rect);
        true
    }

    fn skip(&mut self, span: SpanEntry, reason: &str) {
        self.warnings.push(Warning::SpanSkipped {
            table: self.name.to_string(),
            span,
            reason: reason.to_string(),
        });
    }

    /// Moves the first non-blank text into the master (`cells[0]`) when
    /// the master is blank, then clears every other cell.
    fn consolidate(&mut self, cells: &[(usize, usize)]) {
        let Some((&master, rest)) = cells.split_first() else {
            return;
        };
        let master_text = self.text_at(master);
        if master_text.trim().is_empty() {
            let survivor = rest
                .iter()
                .map(|&cell| self.text_at(cell))
                .find(|t| !t.trim().is_empty());
            if let Some(text) = survivor {
                if let Err(e) = self
                    .backend
                    .set_cell_text(self.table, master.0, master.1, &text)
                {
                    self.warnings.backend("set_cell_text", e);
                }
            }
        }
        for &(row, col) in rest {
            if let Err(e) = self.backend.set_cell_text(self.table, row, col, "") {
                self.warnings.backend("set_cell_text", e);
            }
        }
    }

    fn text_at(&mut self, (row, col): (usize, usize)) -> String {
        match self.backend.cell_text(self.table, row, col) {
            Ok(text) => text,
            Err(e) => {
                self.warnings.backend("cell_text", e);
                String::new()
            }
        }
    }

    fn merge(&mut self, from: (usize, usize), to: (usize, usize)) {
        if let Err(e) = self.backend.merge_cells(self.table, from, to) {
            self.warnings.backend("merge_cells", e);
            return;
        }
        let style = self.shape.cell_style(from.0, from.1);
        if let Err(e) = self.backend.style_cell(self.table, from.0, from.1, style) {
            self.warnings.backend("style_cell", e);
        }
    }
}
