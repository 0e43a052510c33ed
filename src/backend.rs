//! The document capability the layout engine writes into. [`crate::model::Document`]
//! is the in-memory implementation; any other store of sections, paragraphs,
//! tables and pictures can be plugged in by implementing [`DocumentBackend`].
//! Section properties are reached through narrow setters so a backend keeps
//! its own representation.

use std::path::Path;

use thiserror::Error;

use crate::config::SectionBreakType;
use crate::units::{Emu, Twips};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SectionId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParagraphId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PictureId(pub usize);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("no section {0}")]
    UnknownSection(usize),

    #[error("no paragraph {0}")]
    UnknownParagraph(usize),

    #[error("no table {0}")]
    UnknownTable(usize),

    #[error("no picture {0}")]
    UnknownPicture(usize),

    #[error("cell ({row}, {col}) is outside the table")]
    CellOutOfRange { row: usize, col: usize },

    #[error("cannot merge: {0}")]
    InvalidMerge(String),

    #[error("cannot load picture: {0}")]
    Picture(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnsConfig {
    pub count: u32,
    pub spacing: Twips,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellStyle {
    pub bold: bool,
    pub alignment: Alignment,
}

pub trait DocumentBackend {
    fn section_count(&self) -> usize;

    /// Appends a section; content added afterwards lands in it.
    fn add_section(&mut self, start: SectionBreakType) -> Result<SectionId, BackendError>;

    fn columns(&self, id: SectionId) -> Result<ColumnsConfig, BackendError>;

    fn set_columns(&mut self, id: SectionId, columns: ColumnsConfig) -> Result<(), BackendError>;

    /// Linked header/footer reuse the previous section's.
    fn set_header_footer_linked(&mut self, id: SectionId, linked: bool)
    -> Result<(), BackendError>;

    fn set_different_first_page(&mut self, id: SectionId, on: bool) -> Result<(), BackendError>;

    fn set_page_number_start(&mut self, id: SectionId, start: u32) -> Result<(), BackendError>;

    fn add_paragraph(&mut self, style: Option<&str>) -> Result<ParagraphId, BackendError>;

    fn add_run(&mut self, para: ParagraphId, text: &str, bold: bool) -> Result<(), BackendError>;

    fn set_paragraph_alignment(
        &mut self,
        para: ParagraphId,
        alignment: Alignment,
    ) -> Result<(), BackendError>;

    fn add_table(&mut self, rows: usize, cols: usize) -> Result<TableId, BackendError>;

    fn set_table_style(&mut self, table: TableId, style: &str) -> Result<(), BackendError>;

    fn set_column_widths(&mut self, table: TableId, widths: &[Twips]) -> Result<(), BackendError>;

    fn set_wrap_distance(&mut self, table: TableId, distance: Twips) -> Result<(), BackendError>;

    fn cell_text(&self, table: TableId, row: usize, col: usize) -> Result<String, BackendError>;

    fn set_cell_text(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        text: &str,
    ) -> Result<(), BackendError>;

    fn style_cell(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        style: CellStyle,
    ) -> Result<(), BackendError>;

    /// Merges the rectangle spanned by two corner cells (inclusive) into one
    /// addressable cell anchored at the top-left corner.
    fn merge_cells(
        &mut self,
        table: TableId,
        from: (usize, usize),
        to: (usize, usize),
    ) -> Result<(), BackendError>;

    /// Inserts a picture in its own paragraph at its intrinsic size.
    fn add_picture(&mut self, path: &Path) -> Result<PictureId, BackendError>;

    fn picture_size(&self, picture: PictureId) -> Result<(Emu, Emu), BackendError>;

    fn set_picture_size(
        &mut self,
        picture: PictureId,
        width: Emu,
        height: Emu,
    ) -> Result<(), BackendError>;
}
