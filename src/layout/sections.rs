//! Section bookkeeping: column setup, header/footer linkage, page-number
//! restarts and the continuous-section bracket around wide content.

use crate::backend::{BackendError, ColumnsConfig, DocumentBackend, SectionId};
use crate::config::{PageAttributes, SectionBreakType};
use crate::units::Twips;

/// Column setup to restore once a wide insert is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WideBracket {
    pub wide_section: SectionId,
    pub restore: ColumnsConfig,
}

pub struct PageLayoutManager {
    attrs: PageAttributes,
}

impl PageLayoutManager {
    pub fn new(attrs: PageAttributes) -> Self {
        Self { attrs }
    }

    pub fn attributes(&self) -> &PageAttributes {
        &self.attrs
    }

    /// Appends sections until there are at least `n`.
    pub fn ensure_sections<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
        n: usize,
    ) -> Result<(), BackendError> {
        while doc.section_count() < n {
            let id = doc.add_section(self.attrs.start_type)?;
            self.link_header_footer(doc, id.0)?;
        }
        Ok(())
    }

    pub fn current_section<B: DocumentBackend + ?Sized>(&self, doc: &B) -> Option<SectionId> {
        doc.section_count().checked_sub(1).map(SectionId)
    }

    pub fn section<B: DocumentBackend + ?Sized>(&self, doc: &B, index: usize) -> Option<SectionId> {
        (index < doc.section_count()).then_some(SectionId(index))
    }

    /// Appends a section starting with `start` and links its header/footer.
    pub fn add_section<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
        start: SectionBreakType,
    ) -> Result<SectionId, BackendError> {
        let id = doc.add_section(start)?;
        self.link_header_footer(doc, id.0)?;
        Ok(id)
    }

    pub fn set_columns<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
        section: SectionId,
        count: u32,
        spacing: Twips,
    ) -> Result<(), BackendError> {
        doc.set_columns(
            section,
            ColumnsConfig {
                count: count.max(1),
                spacing,
            },
        )
    }

    /// Section 0 takes the different-first-page flag from the page
    /// attributes; section 1 gets its own header/footer; later sections
    /// inherit from their predecessor.
    pub fn link_header_footer<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
        index: usize,
    ) -> Result<(), BackendError> {
        let id = SectionId(index);
        match index {
            0 => doc.set_different_first_page(id, self.attrs.different_first_page),
            1 => doc.set_header_footer_linked(id, false),
            _ => doc.set_header_footer_linked(id, true),
        }
    }

    pub fn restart_page_number<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
        section: SectionId,
        start: u32,
    ) -> Result<(), BackendError> {
        doc.set_page_number_start(section, start)
    }

    /// Opens a continuous single-column section for wide content. Returns
    /// `None` when the current flow is already single-column.
    pub fn open_wide<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
    ) -> Result<Option<WideBracket>, BackendError> {
        self.ensure_sections(doc, 1)?;
        let current = SectionId(doc.section_count() - 1);
        let restore = doc.columns(current)?;
        if restore.count <= 1 {
            return Ok(None);
        }
        let wide_section = self.add_section(doc, SectionBreakType::Continuous)?;
        self.set_columns(doc, wide_section, 1, Twips(0))?;
        log::debug!(
            "wide insert: section {} opened (restoring {} columns)",
            wide_section.0,
            restore.count
        );
        Ok(Some(WideBracket {
            wide_section,
            restore,
        }))
    }

    /// Continues the narrow flow after a wide insert.
    pub fn close_wide<B: DocumentBackend + ?Sized>(
        &self,
        doc: &mut B,
        bracket: WideBracket,
    ) -> Result<SectionId, BackendError> {
        let id = self.add_section(doc, SectionBreakType::Continuous)?;
        self.set_columns(doc, id, bracket.restore.count, bracket.restore.spacing)?;
        Ok(id)
    }
}
