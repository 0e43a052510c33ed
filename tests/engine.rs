mod common;

use std::cell::Cell;
use std::path::{Path, PathBuf};

use jats_layout::assets::{AssetLocation, AssetResolver, DocumentContext};
use jats_layout::config::{Layout, LayoutConfig, PageAttributes};
use jats_layout::image_info::HeaderProbe;
use jats_layout::model::{Alignment, Block, Document};
use jats_layout::units::Twips;
use jats_layout::{ContentShapeError, Error, FigureSpec, LayoutEngine, SpanEntry, TableSpec, Warning};

use common::row;

fn engine(assets: &Path) -> LayoutEngine<'static, Document> {
    common::init_logging();
    let attrs = PageAttributes::default();
    let doc = Document::new(&attrs);
    LayoutEngine::new(doc, attrs, LayoutConfig::default(), DocumentContext::new(assets))
        .expect("valid configuration")
}

fn results_table() -> TableSpec {
    TableSpec {
        id: Some("t1".into()),
        label: "Table 1".into(),
        title: "Results.".into(),
        headers: vec![row(&["Group", "", "Score"])],
        rows: vec![row(&["A", "1", "0.5"]), row(&["B", "2"])],
        header_spans: vec![SpanEntry::new(0, 0, 2, 1)],
        body_spans: vec![],
        layout: None,
        wrap_distance: Some(0.5),
    }
}

#[test]
fn non_positive_page_width_is_fatal() {
    let attrs = PageAttributes {
        page_width: 0.0,
        ..PageAttributes::default()
    };
    let doc = Document::new(&PageAttributes::default());
    let result = LayoutEngine::new(doc, attrs, LayoutConfig::default(), DocumentContext::default());
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn margins_wider_than_page_are_fatal() {
    let attrs = PageAttributes {
        margin_left: 11.0,
        margin_right: 11.0,
        ..PageAttributes::default()
    };
    let doc = Document::new(&PageAttributes::default());
    let result = LayoutEngine::new(doc, attrs, LayoutConfig::default(), DocumentContext::default());
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn invalid_config_is_fatal() {
    let attrs = PageAttributes::default();
    let config = LayoutConfig {
        wide_threshold: 0.0,
        ..LayoutConfig::default()
    };
    let result = LayoutEngine::new(Document::new(&attrs), attrs, config, DocumentContext::default());
    assert!(matches!(result, Err(Error::Configuration(_))));
}

#[test]
fn narrow_table_renders_caption_grid_and_merges() {
    let dir = common::scratch_dir("engine-table");
    let mut engine = engine(&dir);
    engine.begin_body();
    assert!(engine.render_table(&results_table()));
    let (doc, report) = engine.finish();

    assert_eq!(report.tables_rendered, 1);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    // no wide bracket for a three-column table
    assert_eq!(doc.sections.len(), 2);

    let texts = doc.paragraph_texts();
    assert_eq!(texts, vec!["Table 1 Results.".to_string()]);

    let table = &doc.tables[0];
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.col_count(), 3);
    assert_eq!(table.style.as_deref(), Some("Table Grid"));
    assert_eq!(table.wrap_distance, Some(Twips::from_cm(0.5)));

    let narrow = Twips::from_cm((17.0 - 300.0 / 567.0) / 2.0).0 as u64;
    let total: u64 = table.col_widths.iter().map(|w| w.0 as u64).sum();
    assert!(total.abs_diff(narrow) <= 1);

    let master = table.cell(0, 0).unwrap();
    assert_eq!(master.text, "Group");
    assert_eq!(master.grid_span, 2);
    assert!(master.bold);
    assert_eq!(master.alignment, Alignment::Left);

    let body = table.cell(1, 2).unwrap();
    assert_eq!(body.text, "0.5");
    assert!(!body.bold);
    assert_eq!(body.alignment, Alignment::Center);
    assert_eq!(table.cell(2, 2).unwrap().text, "");
}

#[test]
fn wide_table_is_bracketed_by_continuous_sections() {
    let dir = common::scratch_dir("engine-wide");
    let mut engine = engine(&dir);
    engine.begin_body();
    let mut spec = results_table();
    spec.layout = Some(Layout::Wide);
    assert!(engine.render_table(&spec));
    let (doc, _) = engine.finish();

    assert_eq!(doc.sections.len(), 4);
    assert_eq!(doc.sections[2].properties.columns.count, 1);
    assert!(matches!(doc.sections[2].blocks.last(), Some(Block::Table(0))));
    assert_eq!(doc.sections[3].properties.columns.count, 2);

    let total: u64 = doc.tables[0].col_widths.iter().map(|w| w.0 as u64).sum();
    assert_eq!(total, Twips::from_cm(17.0).0 as u64);
}

#[test]
fn many_columns_go_wide_without_explicit_layout() {
    let dir = common::scratch_dir("engine-many");
    let mut engine = engine(&dir);
    let spec = TableSpec {
        label: "Table 2".into(),
        rows: vec![row(&["a", "b", "c", "d", "e", "f"])],
        ..TableSpec::default()
    };
    assert_eq!(engine.table_layout(&spec), Layout::Wide);
    assert_eq!(engine.layout_cache().get(&spec.key()), Some(Layout::Wide));
}

#[test]
fn empty_column_gets_minimum_width() {
    let dir = common::scratch_dir("engine-empty");
    let mut engine = engine(&dir);
    let spec = TableSpec {
        label: "Table 3".into(),
        headers: vec![row(&["", "Value", ""])],
        rows: vec![row(&["", "1", " "])],
        layout: Some(Layout::Wide),
        ..TableSpec::default()
    };
    assert!(engine.render_table(&spec));
    let (doc, _) = engine.finish();
    let widths = &doc.tables[0].col_widths;
    let wmin = LayoutConfig::default().min_empty_column_width;
    assert_eq!(widths[0], wmin);
    assert_eq!(widths[2], wmin);
    assert_eq!(widths[1].0, Twips::from_cm(17.0).0 - 2 * wmin.0);
}

#[test]
fn table_without_columns_is_skipped() {
    let dir = common::scratch_dir("engine-skip");
    let mut engine = engine(&dir);
    let spec = TableSpec {
        label: "Table 4".into(),
        headers: vec![vec![]],
        ..TableSpec::default()
    };
    assert!(!engine.render_table(&spec));
    assert!(engine.render_paragraph("after the table", None));
    let (doc, report) = engine.finish();

    assert_eq!(report.tables_skipped, 1);
    assert!(doc.tables.is_empty());
    assert_eq!(
        report.warnings,
        vec![Warning::TableSkipped {
            table: "Table 4".into(),
            reason: ContentShapeError::NoColumns,
        }]
    );
    assert_eq!(doc.paragraph_texts(), vec!["after the table".to_string()]);
}

#[test]
fn overlapping_spans_reject_the_table() {
    let dir = common::scratch_dir("engine-overlap");
    let mut engine = engine(&dir);
    let mut spec = results_table();
    spec.body_spans = vec![SpanEntry::new(0, 0, 2, 2), SpanEntry::new(1, 1, 2, 1)];
    assert!(!engine.render_table(&spec));
    let (doc, report) = engine.finish();
    assert!(doc.tables.is_empty());
    assert!(matches!(
        &report.warnings[..],
        [Warning::TableSkipped {
            reason: ContentShapeError::OverlappingSpans { .. },
            ..
        }]
    ));
}

#[test]
fn lenient_spans_keep_first_applied() {
    let dir = common::scratch_dir("engine-lenient");
    let attrs = PageAttributes::default();
    let config = LayoutConfig {
        strict_spans: false,
        ..LayoutConfig::default()
    };
    let mut engine =
        LayoutEngine::new(Document::new(&attrs), attrs, config, DocumentContext::new(&dir)).unwrap();
    let mut spec = results_table();
    spec.body_spans = vec![SpanEntry::new(0, 0, 2, 2), SpanEntry::new(1, 1, 2, 1)];
    assert!(engine.render_table(&spec));
    let (doc, report) = engine.finish();

    let t = &doc.tables[0];
    assert_eq!(t.cell(1, 0).unwrap().grid_span, 2);
    assert_eq!(t.cell(1, 0).unwrap().row_span, 2);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::SpanSkipped { .. })));
}

#[test]
fn unresolvable_figure_becomes_wide_placeholder() {
    let dir = common::scratch_dir("engine-placeholder");
    let mut engine = engine(&dir);
    engine.begin_body();
    let spec = FigureSpec {
        id: Some("fig1".into()),
        label: "Figure 1".into(),
        caption: "Missing.".into(),
        image_ref: "absent.png".into(),
        alt_text: "A scatter plot".into(),
        layout: None,
        threshold: None,
    };
    assert!(engine.render_figure(&spec));
    let (doc, report) = engine.finish();

    assert_eq!(report.placeholders, 1);
    assert_eq!(doc.sections.len(), 4, "placeholder still rendered wide");
    assert_eq!(
        doc.paragraph_texts(),
        vec!["[image: A scatter plot]".to_string(), "Figure 1 Missing.".to_string()]
    );
    assert!(report
        .warnings
        .contains(&Warning::AssetUnresolved { href: "absent.png".into() }));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::PlaceholderInserted { .. })));
}

#[test]
fn oversized_figure_is_scaled_into_its_column() {
    let dir = common::scratch_dir("engine-figure");
    common::write_png(&dir.join("big.png"), 3000, 1500);
    let mut engine = engine(&dir);
    engine.begin_body();
    let spec = FigureSpec {
        label: "Figure 2".into(),
        image_ref: "big.png".into(),
        layout: Some(Layout::Narrow),
        ..FigureSpec::default()
    };
    assert!(engine.render_figure(&spec));
    let narrow = engine.geometry().narrow_width();
    let (doc, report) = engine.finish();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let pic = &doc.pictures[0];
    assert!((pic.width.to_cm() - narrow).abs() < 1e-3);
    let ratio = pic.width.0 as f64 / pic.height.0 as f64;
    assert!((ratio - 2.0).abs() < 1e-3);
    assert_eq!(doc.sections.len(), 2);
}

#[test]
fn records_deserialize_from_plain_maps() {
    let table: TableSpec = serde_json::from_value(serde_json::json!({
        "label": "Table 5",
        "title": "From JSON",
        "header_rows": [["a", "b"]],
        "body_rows": [["1", "2"], ["3"]],
        "header_spans": [{"row": 0, "col": 0, "colspan": 2}],
        "layout": "NARROW"
    }))
    .unwrap();
    assert_eq!(table.layout, Some(Layout::Narrow));
    assert_eq!(table.header_spans, vec![SpanEntry::new(0, 0, 2, 1)]);
    assert_eq!(table.column_count(), 2);

    let fig: FigureSpec = serde_json::from_value(serde_json::json!({
        "label": "Figure 3",
        "href": "f3.png",
        "layout": "auto",
        "threshold": 0.8
    }))
    .unwrap();
    assert_eq!(fig.image_ref, "f3.png");
    assert_eq!(fig.layout, None);
    assert_eq!(fig.threshold, Some(0.8));

    let config: LayoutConfig = serde_json::from_value(serde_json::json!({
        "default_dpi": 72.0,
        "column_spacing": 425
    }))
    .unwrap();
    assert_eq!(config.default_dpi, 72.0);
    assert_eq!(config.column_spacing, Twips(425));
    assert_eq!(config.body_columns, 2);

    let attrs: PageAttributes = serde_json::from_value(serde_json::json!({
        "page_width": 21.59,
        "orientation": "landscape",
        "start_type": "odd_page"
    }))
    .unwrap();
    assert_eq!(attrs.page_width, 21.59);
    assert_eq!(attrs.page_height, 29.7);
}

#[test]
fn page_numbering_restarts_on_current_section() {
    let dir = common::scratch_dir("engine-pages");
    let mut engine = engine(&dir);
    let body = engine.begin_body().unwrap();
    assert!(engine.restart_page_numbering(1));
    let doc = engine.document();
    assert_eq!(doc.section(body).unwrap().page_number_start, Some(1));
}

#[test]
fn unlabeled_tables_keep_their_own_layout() {
    let dir = common::scratch_dir("engine-unlabeled");
    let mut engine = engine(&dir);
    let small = TableSpec {
        rows: vec![row(&["a", "b"])],
        ..TableSpec::default()
    };
    let big = TableSpec {
        rows: vec![row(&["a", "b", "c", "d", "e", "f", "g", "h"])],
        ..TableSpec::default()
    };
    assert_eq!(engine.table_layout(&small), Layout::Narrow);
    assert_eq!(engine.table_layout(&big), Layout::Wide);
    assert_eq!(engine.table_layout(&small), Layout::Narrow);
    assert_eq!(engine.layout_cache().len(), 2);
}

#[test]
fn span_starting_past_the_grid_keeps_the_table() {
    let dir = common::scratch_dir("engine-outside");
    let mut engine = engine(&dir);
    let spec = TableSpec {
        label: "Table 6".into(),
        rows: vec![row(&["a", "b"]), row(&["c", "d"])],
        body_spans: vec![SpanEntry::new(5, 0, 2, 1)],
        ..TableSpec::default()
    };
    assert!(engine.render_table(&spec));
    let (doc, report) = engine.finish();

    assert_eq!(report.tables_rendered, 1);
    assert_eq!(report.tables_skipped, 0);
    assert_eq!(doc.tables[0].cell(1, 1).unwrap().text, "d");
    assert!(matches!(
        &report.warnings[..],
        [Warning::SpanSkipped { .. }]
    ));
}

#[test]
fn zero_minimum_column_width_is_fatal() {
    let attrs = PageAttributes::default();
    let config = LayoutConfig {
        min_empty_column_width: Twips(0),
        ..LayoutConfig::default()
    };
    let result = LayoutEngine::new(Document::new(&attrs), attrs, config, DocumentContext::default());
    assert!(matches!(result, Err(Error::Configuration(_))));
}

/// Serves every reference as a remote URL from one cached file, counting
/// fetches.
struct RemoteOnly {
    cached: PathBuf,
    fetches: Cell<usize>,
}

impl AssetResolver for RemoteOnly {
    fn resolve(&self, href: &str, _assets_dir: &Path) -> Option<AssetLocation> {
        Some(AssetLocation::Remote(format!("https://example.org/{href}")))
    }

    fn fetch(&self, _url: &str, _cache_dir: &Path) -> Option<PathBuf> {
        self.fetches.set(self.fetches.get() + 1);
        Some(self.cached.clone())
    }
}

#[test]
fn remote_figure_is_fetched_once() {
    common::init_logging();
    let dir = common::scratch_dir("engine-remote");
    let cached = dir.join("remote.png");
    common::write_png(&cached, 40, 20);
    let resolver = RemoteOnly {
        cached,
        fetches: Cell::new(0),
    };

    let attrs = PageAttributes::default();
    let ctx = DocumentContext::new(&dir).with_cache_dir(&dir);
    let mut engine = LayoutEngine::with_collaborators(
        Document::new(&attrs),
        attrs,
        LayoutConfig::default(),
        ctx,
        &resolver,
        &HeaderProbe,
    )
    .unwrap();
    engine.begin_body();
    let spec = FigureSpec {
        label: "Figure 4".into(),
        image_ref: "remote.png".into(),
        ..FigureSpec::default()
    };
    assert!(engine.render_figure(&spec));
    let (doc, report) = engine.finish();

    assert_eq!(resolver.fetches.get(), 1);
    assert_eq!(doc.pictures.len(), 1);
    assert_eq!(report.placeholders, 0);
}
