use std::path::{Path, PathBuf};

pub use crate::backend::{Alignment, ColumnsConfig};

use crate::backend::{
    BackendError, CellStyle, DocumentBackend, ParagraphId, PictureId, SectionId, TableId,
};
use crate::config::{Orientation, PageAttributes, SectionBreakType};
use crate::image_info::{HeaderProbe, ImageProbe};
use crate::units::{CM_PER_INCH, EMU_PER_CM, Emu, Twips};

/// Resolution used for pictures without DPI or JFIF density metadata when
/// computing their intrinsic size.
const NATIVE_DEFAULT_DPI: f64 = 72.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VMerge {
    None,
    Restart,
    Continue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectionProperties {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub header_margin: f64,
    pub footer_margin: f64,
    pub gutter: f64,
    pub orientation: Orientation,
    pub different_first_page: bool,
    /// Header/footer reuse the previous section's when linked.
    pub header_linked: bool,
    pub footer_linked: bool,
    pub break_type: SectionBreakType,
    pub columns: ColumnsConfig,
    pub page_number_start: Option<u32>,
}

impl SectionProperties {
    pub fn from_attributes(attrs: &PageAttributes) -> Self {
        Self {
            page_width: attrs.page_width,
            page_height: attrs.page_height,
            margin_top: attrs.margin_top,
            margin_bottom: attrs.margin_bottom,
            margin_left: attrs.margin_left,
            margin_right: attrs.margin_right,
            header_margin: attrs.header_distance,
            footer_margin: attrs.footer_distance,
            gutter: attrs.gutter,
            orientation: attrs.orientation,
            different_first_page: false,
            header_linked: true,
            footer_linked: true,
            break_type: attrs.start_type,
            columns: ColumnsConfig {
                count: 1,
                spacing: Twips(0),
            },
            page_number_start: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub style: Option<String>,
    pub runs: Vec<Run>,
    pub alignment: Alignment,
    pub picture: Option<usize>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    pub path: PathBuf,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub width: Emu,
    pub height: Emu,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub bold: bool,
    pub alignment: Alignment,
    pub grid_span: usize,
    pub row_span: usize,
    pub v_merge: VMerge,
    /// Top-left cell of the merged area this cell is part of.
    pub merged_into: Option<(usize, usize)>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            text: String::new(),
            bold: false,
            alignment: Alignment::Left,
            grid_span: 1,
            row_span: 1,
            v_merge: VMerge::None,
            merged_into: None,
        }
    }
}

pub struct TableRow {
    pub cells: Vec<TableCell>,
}

pub struct Table {
    pub style: Option<String>,
    pub col_widths: Vec<Twips>,
    pub wrap_distance: Option<Twips>,
    pub rows: Vec<TableRow>,
}

impl Table {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            style: None,
            col_widths: vec![Twips(0); cols],
            wrap_distance: None,
            rows: (0..rows)
                .map(|_| TableRow {
                    cells: vec![TableCell::default(); cols],
                })
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_widths.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row)?.cells.get(col)
    }

    /// The cell that owns `(row, col)`: itself, or the top-left cell of the
    /// merged area covering it.
    fn anchor(&self, row: usize, col: usize) -> Result<(usize, usize), BackendError> {
        let cell = self
            .cell(row, col)
            .ok_or(BackendError::CellOutOfRange { row, col })?;
        Ok(cell.merged_into.unwrap_or((row, col)))
    }

    fn anchor_mut(&mut self, row: usize, col: usize) -> Result<&mut TableCell, BackendError> {
        let (r, c) = self.anchor(row, col)?;
        self.rows
            .get_mut(r)
            .and_then(|row| row.cells.get_mut(c))
            .ok_or(BackendError::CellOutOfRange { row: r, col: c })
    }

    /// Merged areas are rectangles, so a merge that cuts through an existing
    /// one grows until it contains it.
    fn expand_to_merged(&self, mut rect: (usize, usize, usize, usize)) -> (usize, usize, usize, usize) {
        loop {
            let before = rect;
            for r in rect.0..=rect.2 {
                for c in rect.1..=rect.3 {
                    let Some(cell) = self.cell(r, c) else {
                        continue;
                    };
                    let (ar, ac) = cell.merged_into.unwrap_or((r, c));
                    let Some(anchor) = self.cell(ar, ac) else {
                        continue;
                    };
                    rect.0 = rect.0.min(ar);
                    rect.1 = rect.1.min(ac);
                    rect.2 = rect.2.max(ar + anchor.row_span - 1);
                    rect.3 = rect.3.max(ac + anchor.grid_span - 1);
                }
            }
            if rect == before {
                return rect;
            }
        }
    }

    fn merge(&mut self, from: (usize, usize), to: (usize, usize)) -> Result<(), BackendError> {
        let rows = self.row_count();
        let cols = self.col_count();
        for &(row, col) in &[from, to] {
            if row >= rows || col >= cols {
                return Err(BackendError::CellOutOfRange { row, col });
            }
        }
        let rect = self.expand_to_merged((
            from.0.min(to.0),
            from.1.min(to.1),
            from.0.max(to.0),
            from.1.max(to.1),
        ));
        let (r0, c0, r1, c1) = rect;
        if r0 == r1 && c0 == c1 {
            return Ok(());
        }

        // Content of absorbed cells moves into the anchor.
        let mut moved: Vec<String> = Vec::new();
        for r in r0..=r1 {
            for c in c0..=c1 {
                if (r, c) == (r0, c0) {
                    continue;
                }
                let cell = &mut self.rows[r].cells[c];
                if cell.merged_into.is_none() && !cell.text.trim().is_empty() {
                    moved.push(std::mem::take(&mut cell.text));
                }
                cell.text.clear();
                cell.grid_span = 1;
                cell.row_span = 1;
                cell.merged_into = Some((r0, c0));
                cell.v_merge = if r > r0 { VMerge::Continue } else { VMerge::None };
            }
        }

        let anchor = &mut self.rows[r0].cells[c0];
        anchor.merged_into = None;
        anchor.grid_span = c1 - c0 + 1;
        anchor.row_span = r1 - r0 + 1;
        anchor.v_merge = if r1 > r0 { VMerge::Restart } else { VMerge::None };
        for text in moved {
            if !anchor.text.is_empty() {
                anchor.text.push('\n');
            }
            anchor.text.push_str(&text);
        }
        Ok(())
    }
}

pub enum Block {
    Paragraph(usize),
    Table(usize),
}

pub struct Section {
    pub properties: SectionProperties,
    pub blocks: Vec<Block>,
}

/// In-memory document tree. Content is always appended to the last section.
pub struct Document {
    pub sections: Vec<Section>,
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
    pub pictures: Vec<Picture>,
}

impl Document {
    /// A document with one section laid out from `attrs`.
    pub fn new(attrs: &PageAttributes) -> Self {
        Self {
            sections: vec![Section {
                properties: SectionProperties::from_attributes(attrs),
                blocks: Vec::new(),
            }],
            paragraphs: Vec::new(),
            tables: Vec::new(),
            pictures: Vec::new(),
        }
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0)
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&Paragraph> {
        self.paragraphs.get(id.0)
    }

    pub fn picture(&self, id: PictureId) -> Option<&Picture> {
        self.pictures.get(id.0)
    }

    pub fn section(&self, id: SectionId) -> Result<&SectionProperties, BackendError> {
        self.sections
            .get(id.0)
            .map(|s| &s.properties)
            .ok_or(BackendError::UnknownSection(id.0))
    }

    fn section_mut(&mut self, id: SectionId) -> Result<&mut SectionProperties, BackendError> {
        self.sections
            .get_mut(id.0)
            .map(|s| &mut s.properties)
            .ok_or(BackendError::UnknownSection(id.0))
    }

    /// Plain text of every paragraph in document order, tables excluded.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .filter_map(|b| match b {
                Block::Paragraph(i) => self.paragraphs.get(*i).map(Paragraph::text),
                Block::Table(_) => None,
            })
            .collect()
    }

    fn push_block(&mut self, block: Block) {
        if let Some(section) = self.sections.last_mut() {
            section.blocks.push(block);
        }
    }

    fn table_mut(&mut self, id: TableId) -> Result<&mut Table, BackendError> {
        self.tables
            .get_mut(id.0)
            .ok_or(BackendError::UnknownTable(id.0))
    }

    fn table_ref(&self, id: TableId) -> Result<&Table, BackendError> {
        self.tables.get(id.0).ok_or(BackendError::UnknownTable(id.0))
    }

    fn paragraph_mut(&mut self, id: ParagraphId) -> Result<&mut Paragraph, BackendError> {
        self.paragraphs
            .get_mut(id.0)
            .ok_or(BackendError::UnknownParagraph(id.0))
    }
}

impl DocumentBackend for Document {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn add_section(&mut self, start: SectionBreakType) -> Result<SectionId, BackendError> {
        let properties = match self.sections.last() {
            Some(prev) => SectionProperties {
                break_type: start,
                different_first_page: false,
                header_linked: true,
                footer_linked: true,
                page_number_start: None,
                ..prev.properties.clone()
            },
            None => SectionProperties::from_attributes(&PageAttributes::default()),
        };
        self.sections.push(Section {
            properties,
            blocks: Vec::new(),
        });
        Ok(SectionId(self.sections.len() - 1))
    }

    fn columns(&self, id: SectionId) -> Result<ColumnsConfig, BackendError> {
        Ok(self.section(id)?.columns)
    }

    fn set_columns(&mut self, id: SectionId, columns: ColumnsConfig) -> Result<(), BackendError> {
        self.section_mut(id)?.columns = columns;
        Ok(())
    }

    fn set_header_footer_linked(
        &mut self,
        id: SectionId,
        linked: bool,
    ) -> Result<(), BackendError> {
        let props = self.section_mut(id)?;
        props.header_linked = linked;
        props.footer_linked = linked;
        Ok(())
    }

    fn set_different_first_page(&mut self, id: SectionId, on: bool) -> Result<(), BackendError> {
        self.section_mut(id)?.different_first_page = on;
        Ok(())
    }

    fn set_page_number_start(&mut self, id: SectionId, start: u32) -> Result<(), BackendError> {
        self.section_mut(id)?.page_number_start = Some(start);
        Ok(())
    }

    fn add_paragraph(&mut self, style: Option<&str>) -> Result<ParagraphId, BackendError> {
        self.paragraphs.push(Paragraph {
            style: style.map(str::to_string),
            runs: Vec::new(),
            alignment: Alignment::Left,
            picture: None,
        });
        let idx = self.paragraphs.len() - 1;
        self.push_block(Block::Paragraph(idx));
        Ok(ParagraphId(idx))
    }

    fn add_run(&mut self, para: ParagraphId, text: &str, bold: bool) -> Result<(), BackendError> {
        self.paragraph_mut(para)?.runs.push(Run {
            text: text.to_string(),
            bold,
        });
        Ok(())
    }

    fn set_paragraph_alignment(
        &mut self,
        para: ParagraphId,
        alignment: Alignment,
    ) -> Result<(), BackendError> {
        self.paragraph_mut(para)?.alignment = alignment;
        Ok(())
    }

    fn add_table(&mut self, rows: usize, cols: usize) -> Result<TableId, BackendError> {
        if rows == 0 || cols == 0 {
            return Err(BackendError::Other(format!(
                "a table needs at least one cell, got {rows}x{cols}"
            )));
        }
        self.tables.push(Table::new(rows, cols));
        let idx = self.tables.len() - 1;
        self.push_block(Block::Table(idx));
        Ok(TableId(idx))
    }

    fn set_table_style(&mut self, table: TableId, style: &str) -> Result<(), BackendError> {
        self.table_mut(table)?.style = Some(style.to_string());
        Ok(())
    }

    fn set_column_widths(&mut self, table: TableId, widths: &[Twips]) -> Result<(), BackendError> {
        let t = self.table_mut(table)?;
        if widths.len() != t.col_count() {
            return Err(BackendError::Other(format!(
                "{} widths for {} columns",
                widths.len(),
                t.col_count()
            )));
        }
        t.col_widths = widths.to_vec();
        Ok(())
    }

    fn set_wrap_distance(&mut self, table: TableId, distance: Twips) -> Result<(), BackendError> {
        self.table_mut(table)?.wrap_distance = Some(distance);
        Ok(())
    }

    fn cell_text(&self, table: TableId, row: usize, col: usize) -> Result<String, BackendError> {
        let t = self.table_ref(table)?;
        let (r, c) = t.anchor(row, col)?;
        t.cell(r, c)
            .map(|cell| cell.text.clone())
            .ok_or(BackendError::CellOutOfRange { row: r, col: c })
    }

    fn set_cell_text(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        text: &str,
    ) -> Result<(), BackendError> {
        self.table_mut(table)?.anchor_mut(row, col)?.text = text.to_string();
        Ok(())
    }

    fn style_cell(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        style: CellStyle,
    ) -> Result<(), BackendError> {
        let cell = self.table_mut(table)?.anchor_mut(row, col)?;
        cell.bold = style.bold;
        cell.alignment = style.alignment;
        Ok(())
    }

    fn merge_cells(
        &mut self,
        table: TableId,
        from: (usize, usize),
        to: (usize, usize),
    ) -> Result<(), BackendError> {
        self.table_mut(table)?.merge(from, to)
    }

    fn add_picture(&mut self, path: &Path) -> Result<PictureId, BackendError> {
        let info = HeaderProbe
            .probe(path)
            .map_err(|e| BackendError::Picture(format!("{}: {e}", path.display())))?;
        if info.pixel_width == 0 || info.pixel_height == 0 {
            return Err(BackendError::Picture(format!(
                "{}: zero-sized image",
                path.display()
            )));
        }
        let (dpi_x, dpi_y) = info.density().unwrap_or((NATIVE_DEFAULT_DPI, NATIVE_DEFAULT_DPI));
        let emu_per_inch = EMU_PER_CM * CM_PER_INCH;
        let width = Emu((info.pixel_width as f64 / dpi_x * emu_per_inch).round() as u64);
        let height = Emu((info.pixel_height as f64 / dpi_y * emu_per_inch).round() as u64);

        self.pictures.push(Picture {
            path: path.to_path_buf(),
            pixel_width: info.pixel_width,
            pixel_height: info.pixel_height,
            width,
            height,
        });
        let pic_idx = self.pictures.len() - 1;
        let para = self.add_paragraph(None)?;
        self.paragraph_mut(para)?.picture = Some(pic_idx);
        Ok(PictureId(pic_idx))
    }

    fn picture_size(&self, picture: PictureId) -> Result<(Emu, Emu), BackendError> {
        self.pictures
            .get(picture.0)
            .map(|p| (p.width, p.height))
            .ok_or(BackendError::UnknownPicture(picture.0))
    }

    fn set_picture_size(
        &mut self,
        picture: PictureId,
        width: Emu,
        height: Emu,
    ) -> Result<(), BackendError> {
        let pic = self
            .pictures
            .get_mut(picture.0)
            .ok_or(BackendError::UnknownPicture(picture.0))?;
        pic.width = width;
        pic.height = height;
        Ok(())
    }
}
