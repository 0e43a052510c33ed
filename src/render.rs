use std::path::Path;
use std::time::Instant;

use crate::assets::{AssetResolver, DocumentContext, FsAssetResolver, locate};
use crate::backend::{Alignment, BackendError, DocumentBackend, PictureId, SectionId, TableId};
use crate::config::{Layout, LayoutConfig, PageAttributes, SectionBreakType};
use crate::error::{ContentShapeError, Error, Warning, Warnings};
use crate::image_info::{HeaderProbe, ImageProbe};
use crate::jats::{Article, BodyBlock};
use crate::layout::columns::{PageGeometry, allocate_column_widths};
use crate::layout::figure::{FigureLayoutResolver, LayoutCache};
use crate::layout::scale::{FitMode, fit_picture, picture_bounds};
use crate::layout::sections::{PageLayoutManager, WideBracket};
use crate::layout::spans::{GridShape, SpanMerger};
use crate::spec::{FigureSpec, TableSpec};
use crate::units::{Emu, Twips};

#[derive(Debug, Default)]
pub struct RenderReport {
    pub warnings: Vec<Warning>,
    pub tables_rendered: usize,
    pub tables_skipped: usize,
    pub figures_rendered: usize,
    pub placeholders: usize,
}

/// Builds one document: validates page geometry up front, then renders
/// items one at a time. A failing item degrades on its own and is recorded
/// in the report; only configuration errors abort.
pub struct LayoutEngine<'a, B: DocumentBackend> {
    doc: B,
    sections: PageLayoutManager,
    geometry: PageGeometry,
    config: LayoutConfig,
    ctx: DocumentContext,
    assets: &'a dyn AssetResolver,
    probe: &'a dyn ImageProbe,
    cache: LayoutCache,
    warnings: Warnings,
    report: RenderReport,
    started: Instant,
}

impl<B: DocumentBackend> LayoutEngine<'static, B> {
    /// Engine resolving images from the file system and measuring them
    /// with [`HeaderProbe`].
    pub fn new(
        doc: B,
        attrs: PageAttributes,
        config: LayoutConfig,
        ctx: DocumentContext,
    ) -> Result<Self, Error> {
        Self::with_collaborators(doc, attrs, config, ctx, &FsAssetResolver, &HeaderProbe)
    }
}

impl<'a, B: DocumentBackend> LayoutEngine<'a, B> {
    pub fn with_collaborators(
        mut doc: B,
        attrs: PageAttributes,
        config: LayoutConfig,
        ctx: DocumentContext,
        assets: &'a dyn AssetResolver,
        probe: &'a dyn ImageProbe,
    ) -> Result<Self, Error> {
        attrs.validate()?;
        config.validate()?;
        let geometry = PageGeometry::new(&attrs, &config);
        if geometry.narrow_width() <= 0.0 {
            return Err(Error::Configuration(format!(
                "column spacing {} twips leaves no room for {} columns in {:.2} cm",
                config.column_spacing.0, config.body_columns, geometry.content_width
            )));
        }

        let sections = PageLayoutManager::new(attrs);
        sections.ensure_sections(&mut doc, 1)?;
        sections.link_header_footer(&mut doc, 0)?;

        log::debug!(
            "page geometry: content {:.3}x{:.3} cm, narrow column {:.3} cm",
            geometry.content_width,
            geometry.content_height,
            geometry.narrow_width()
        );

        Ok(Self {
            doc,
            sections,
            geometry,
            config,
            ctx,
            assets,
            probe,
            cache: LayoutCache::default(),
            warnings: Warnings::default(),
            report: RenderReport::default(),
            started: Instant::now(),
        })
    }

    pub fn document(&self) -> &B {
        &self.doc
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn layout_cache(&self) -> &LayoutCache {
        &self.cache
    }

    pub fn page_layout(&self) -> &PageLayoutManager {
        &self.sections
    }

    /// Switches to the multi-column body flow with a continuous section.
    pub fn begin_body(&mut self) -> Option<SectionId> {
        let id = self.start_section(SectionBreakType::Continuous)?;
        let (count, spacing) = (self.config.body_columns, self.config.column_spacing);
        if let Err(e) = self.sections.set_columns(&mut self.doc, id, count, spacing) {
            self.warnings.backend("set_columns", e);
        }
        Some(id)
    }

    pub fn start_section(&mut self, start: SectionBreakType) -> Option<SectionId> {
        match self.sections.add_section(&mut self.doc, start) {
            Ok(id) => Some(id),
            Err(e) => {
                self.warnings.backend("add_section", e);
                None
            }
        }
    }

    pub fn restart_page_numbering(&mut self, start: u32) -> bool {
        let Some(current) = self.sections.current_section(&self.doc) else {
            return false;
        };
        match self.sections.restart_page_number(&mut self.doc, current, start) {
            Ok(()) => true,
            Err(e) => {
                self.warnings.backend("restart_page_number", e);
                false
            }
        }
    }

    pub fn render_paragraph(&mut self, text: &str, style: Option<&str>) -> bool {
        let style = style.unwrap_or(self.config.body_style.as_str()).to_string();
        self.styled_paragraph(text, &style, false, Alignment::Justify)
    }

    pub fn render_heading(&mut self, text: &str, level: u32) -> bool {
        let style = format!("Heading {}", level.clamp(1, 9));
        self.styled_paragraph(text, &style, true, Alignment::Left)
    }

    fn styled_paragraph(&mut self, text: &str, style: &str, bold: bool, align: Alignment) -> bool {
        match self.try_paragraph(&[(text, bold)], style, align) {
            Ok(()) => true,
            Err(e) => {
                self.warnings.backend("add_paragraph", e);
                false
            }
        }
    }

    fn try_paragraph(
        &mut self,
        runs: &[(&str, bool)],
        style: &str,
        align: Alignment,
    ) -> Result<(), BackendError> {
        let para = self.doc.add_paragraph(Some(style))?;
        for (text, bold) in runs {
            self.doc.add_run(para, text, *bold)?;
        }
        self.doc.set_paragraph_alignment(para, align)
    }

    /// Bold label followed by the caption text.
    fn caption(&mut self, label: &str, text: &str) {
        let (label, text) = (label.trim(), text.trim());
        let runs: Vec<(&str, bool)> = match (label, text) {
            ("", "") => return,
            (l, "") => vec![(l, true)],
            ("", t) => vec![(t, false)],
            (l, t) => vec![(l, true), (" ", false), (t, false)],
        };
        let style = self.config.caption_style.clone();
        if let Err(e) = self.try_paragraph(&runs, &style, Alignment::Left) {
            self.warnings.backend("caption", e);
        }
    }

    /// Explicit layout, then a cached decision, then column count.
    pub fn table_layout(&mut self, spec: &TableSpec) -> Layout {
        if let Some(layout) = spec.layout {
            return layout;
        }
        let key = spec.key();
        if let Some(layout) = self.cache.get(&key) {
            return layout;
        }
        let layout = if spec.column_count() > self.config.narrow_table_max_columns {
            Layout::Wide
        } else {
            Layout::Narrow
        };
        self.cache.insert(key, layout);
        layout
    }

    pub fn figure_layout(&mut self, spec: &FigureSpec) -> Layout {
        let asset = locate(self.assets, &spec.image_ref, &self.ctx);
        self.figure_layout_at(spec, asset.as_deref())
    }

    fn figure_layout_at(&mut self, spec: &FigureSpec, asset: Option<&Path>) -> Layout {
        FigureLayoutResolver::new(self.geometry, &self.config, self.assets, self.probe, &self.ctx)
            .resolve_located(spec, asset, &mut self.cache, &mut self.warnings)
    }

    fn open_wide(&mut self, layout: Layout) -> Option<WideBracket> {
        if layout != Layout::Wide {
            return None;
        }
        match self.sections.open_wide(&mut self.doc) {
            Ok(bracket) => bracket,
            Err(e) => {
                self.warnings.backend("open_wide", e);
                None
            }
        }
    }

    fn close_wide(&mut self, bracket: Option<WideBracket>) {
        if let Some(bracket) = bracket {
            if let Err(e) = self.sections.close_wide(&mut self.doc, bracket) {
                self.warnings.backend("close_wide", e);
            }
        }
    }

    fn skip_table(&mut self, name: String, reason: ContentShapeError) -> bool {
        self.warnings.push(Warning::TableSkipped {
            table: name,
            reason,
        });
        self.report.tables_skipped += 1;
        false
    }

    /// Renders caption and grid. Returns `false` when the table was skipped.
    pub fn render_table(&mut self, spec: &TableSpec) -> bool {
        let name = spec.display_name();
        let cols = spec.column_count();
        if cols == 0 {
            return self.skip_table(name, ContentShapeError::NoColumns);
        }
        let rows = spec.total_rows();
        if rows == 0 {
            return self.skip_table(name, ContentShapeError::NoRows);
        }
        if self.config.strict_spans {
            if let Err(e) = spec.validate_spans(cols) {
                return self.skip_table(name, e);
            }
        }

        let layout = self.table_layout(spec);
        log::debug!("{name}: {rows}x{cols}, {} placement", layout.as_str());
        let bracket = self.open_wide(layout);

        self.caption(&spec.label, &spec.title);
        let rendered = match self.doc.add_table(rows, cols) {
            Ok(table) => {
                self.fill_table(table, spec, layout, GridShape {
                    rows,
                    cols,
                    header_rows: spec.headers.len(),
                });
                true
            }
            Err(e) => {
                self.warnings.backend("add_table", e);
                false
            }
        };

        self.close_wide(bracket);
        if rendered {
            self.report.tables_rendered += 1;
        }
        rendered
    }

    fn fill_table(&mut self, table: TableId, spec: &TableSpec, layout: Layout, shape: GridShape) {
        if let Err(e) = self.doc.set_table_style(table, &self.config.table_style) {
            self.warnings.backend("set_table_style", e);
        }

        let plan = allocate_column_widths(
            self.geometry.table_width(layout),
            &spec.empty_columns(shape.cols),
            self.config.min_empty_column_width,
        );
        if let Err(e) = self.doc.set_column_widths(table, &plan.widths) {
            self.warnings.backend("set_column_widths", e);
        }

        if let Some(distance) = spec.wrap_distance {
            if let Err(e) = self.doc.set_wrap_distance(table, Twips::from_cm(distance)) {
                self.warnings.backend("set_wrap_distance", e);
            }
        }

        for (r, row) in spec.grid_text(shape.cols).into_iter().enumerate() {
            for (c, text) in row.into_iter().enumerate() {
                if !text.is_empty() {
                    if let Err(e) = self.doc.set_cell_text(table, r, c, text) {
                        self.warnings.backend("set_cell_text", e);
                    }
                }
                if let Err(e) = self.doc.style_cell(table, r, c, shape.cell_style(r, c)) {
                    self.warnings.backend("style_cell", e);
                }
            }
        }

        let name = spec.display_name();
        let spans = spec.grid_spans();
        SpanMerger::new(&mut self.doc, table, shape, &name, &mut self.warnings).apply_all(&spans);
    }

    /// Renders picture (or its alt-text placeholder) and caption.
    pub fn render_figure(&mut self, spec: &FigureSpec) -> bool {
        let name = spec.display_name();
        // located once, for both the placement decision and the insert
        let asset = locate(self.assets, &spec.image_ref, &self.ctx);
        let layout = self.figure_layout_at(spec, asset.as_deref());
        let bracket = self.open_wide(layout);

        let picture = match asset {
            Some(path) => match self.doc.add_picture(&path) {
                Ok(pic) => Some(pic),
                Err(e) => {
                    self.warnings.backend("add_picture", e);
                    None
                }
            },
            None => None,
        };
        match picture {
            Some(pic) => self.scale_picture(pic, layout, &name),
            None => self.placeholder(spec, &name),
        }
        self.caption(&spec.label, &spec.caption);

        self.close_wide(bracket);
        self.report.figures_rendered += 1;
        true
    }

    fn scale_picture(&mut self, pic: PictureId, layout: Layout, name: &str) {
        let (w, h) = match self.doc.picture_size(pic) {
            Ok(size) => size,
            Err(e) => {
                self.warnings.backend("picture_size", e);
                return;
            }
        };
        let bounds = picture_bounds(&self.geometry, layout, self.config.caption_reserve_cm);
        let fit = fit_picture((w.to_cm(), h.to_cm()), bounds);
        let (new_w, new_h) = match fit.mode {
            FitMode::Unchanged => return,
            FitMode::Scaled(scale) => {
                log::debug!("{name}: picture scaled by {scale:.3}");
                (Emu::from_cm(fit.width), Emu::from_cm(fit.height))
            }
            FitMode::WidthClamped => {
                if fit.width == w.to_cm() {
                    return;
                }
                self.warnings.push(Warning::PictureClamped {
                    figure: name.to_string(),
                });
                (Emu::from_cm(fit.width), h)
            }
        };
        if let Err(e) = self.doc.set_picture_size(pic, new_w, new_h) {
            self.warnings.backend("set_picture_size", e);
        }
    }

    fn placeholder(&mut self, spec: &FigureSpec, name: &str) {
        let text = if spec.alt_text.trim().is_empty() {
            format!("[image: {}]", spec.image_ref)
        } else {
            format!("[image: {}]", spec.alt_text.trim())
        };
        let style = self.config.placeholder_style.clone();
        if self.styled_paragraph(&text, &style, false, Alignment::Center) {
            self.report.placeholders += 1;
            self.warnings.push(Warning::PlaceholderInserted {
                figure: name.to_string(),
            });
        }
    }

    /// Front matter in the opening single-column section, the body in the
    /// multi-column flow.
    pub fn render_article(&mut self, article: &Article) {
        if !article.title.is_empty() {
            let style = "Title";
            self.styled_paragraph(&article.title, style, true, Alignment::Center);
        }
        if !article.authors.is_empty() {
            let authors = article.authors.join(", ");
            self.styled_paragraph(&authors, "Authors", false, Alignment::Center);
        }
        if !article.abstract_paragraphs.is_empty() {
            self.render_heading("Abstract", 1);
            for p in &article.abstract_paragraphs {
                self.render_paragraph(p, Some("Abstract"));
            }
        }

        self.begin_body();
        for block in &article.body {
            match block {
                BodyBlock::Heading { text, level } => {
                    self.render_heading(text, *level);
                }
                BodyBlock::Paragraph(text) => {
                    self.render_paragraph(text, None);
                }
                BodyBlock::Table(table) => {
                    self.render_table(table);
                }
                BodyBlock::Figure(fig) => {
                    self.render_figure(fig);
                }
            }
        }
    }

    pub fn finish(mut self) -> (B, RenderReport) {
        self.report.warnings = self.warnings.into_vec();
        log::info!(
            "layout: {} tables ({} skipped), {} figures ({} placeholders), {} warnings in {:.1}ms",
            self.report.tables_rendered,
            self.report.tables_skipped,
            self.report.figures_rendered,
            self.report.placeholders,
            self.report.warnings.len(),
            self.started.elapsed().as_secs_f64() * 1000.0,
        );
        (self.doc, self.report)
    }
}
