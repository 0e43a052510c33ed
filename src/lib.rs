mod error;

pub mod assets;
pub mod backend;
pub mod config;
pub mod image_info;
pub mod jats;
pub mod layout;
pub mod model;
pub mod render;
pub mod spec;
pub mod units;

pub use config::{Layout, LayoutConfig, PageAttributes, SectionBreakType};
pub use error::{ContentShapeError, Error, Warning, Warnings};
pub use render::{LayoutEngine, RenderReport};
pub use spec::{FigureSpec, SpanEntry, TableSpec};

use std::path::Path;
use std::time::Instant;

use assets::DocumentContext;
use model::Document;

/// Extracts an article from JATS XML and lays it out into an in-memory
/// document with images resolved against `assets_dir`.
pub fn layout_jats_article(
    xml: &str,
    assets_dir: &Path,
    attrs: PageAttributes,
    config: LayoutConfig,
) -> Result<(Document, RenderReport), Error> {
    let t0 = Instant::now();

    let article = jats::parse_article(xml)?;
    let t_parse = t0.elapsed();

    let doc = Document::new(&attrs);
    let mut engine = LayoutEngine::new(doc, attrs, config, DocumentContext::new(assets_dir))?;
    engine.render_article(&article);
    let (doc, report) = engine.finish();
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, layout={:.1}ms, total={:.1}ms ({} sections)",
        t_parse.as_secs_f64() * 1000.0,
        (t_total - t_parse).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.sections.len(),
    );

    Ok((doc, report))
}

/// Same as [`layout_jats_article`], reading the XML from `input`.
pub fn layout_jats_file(
    input: &Path,
    assets_dir: &Path,
    attrs: PageAttributes,
    config: LayoutConfig,
) -> Result<(Document, RenderReport), Error> {
    let xml = std::fs::read_to_string(input).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, input.display()),
        ))
    })?;
    layout_jats_article(&xml, assets_dir, attrs, config)
}
