//! Pulls the records the layout engine consumes out of a JATS article:
//! title, authors, abstract, body headings and paragraphs, `<table-wrap>`
//! and `<fig>`. No schema validation is attempted; unknown elements are
//! walked for nested content and otherwise ignored.

use std::collections::HashSet;

use roxmltree::Node;

use crate::config::Layout;
use crate::error::Error;
use crate::spec::{FigureSpec, SpanEntry, TableSpec};

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Upper bound for `colspan`, as in HTML table processing.
const MAX_COLSPAN: usize = 1000;

#[derive(Clone, Debug, PartialEq)]
pub enum BodyBlock {
    Heading { text: String, level: u32 },
    Paragraph(String),
    Table(TableSpec),
    Figure(FigureSpec),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Article {
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_paragraphs: Vec<String>,
    pub body: Vec<BodyBlock>,
}

impl Article {
    pub fn tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.body.iter().filter_map(|b| match b {
            BodyBlock::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn figures(&self) -> impl Iterator<Item = &FigureSpec> {
        self.body.iter().filter_map(|b| match b {
            BodyBlock::Figure(f) => Some(f),
            _ => None,
        })
    }
}

pub fn parse_article(xml: &str) -> Result<Article, Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(xml, options)?;
    let root = doc.root_element();

    let title = find(root, "article-title")
        .map(|n| node_text(n))
        .unwrap_or_default();

    let authors: Vec<String> = root
        .descendants()
        .filter(|n| is(*n, "contrib") && n.attribute("contrib-type").is_none_or(|t| t == "author"))
        .filter_map(author_name)
        .collect();

    let abstract_paragraphs: Vec<String> = find(root, "abstract")
        .map(|abs| {
            abs.descendants()
                .filter(|n| is(*n, "p"))
                .map(node_text)
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut body = Vec::new();
    if let Some(body_node) = find(root, "body") {
        walk(body_node, 1, &mut body);
    }
    if let Some(floats) = find(root, "floats-group") {
        walk(floats, 1, &mut body);
    }

    log::debug!(
        "parsed article '{}': {} body blocks, {} abstract paragraphs",
        title,
        body.len(),
        abstract_paragraphs.len()
    );

    Ok(Article {
        title,
        authors,
        abstract_paragraphs,
        body,
    })
}

fn is(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn find<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| is(*n, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(*n, name))
}

fn author_name(contrib: Node) -> Option<String> {
    if let Some(name) = find(contrib, "name") {
        let given = child(name, "given-names").map(node_text).unwrap_or_default();
        let surname = child(name, "surname").map(node_text).unwrap_or_default();
        let full = format!("{given} {surname}").trim().to_string();
        return (!full.is_empty()).then_some(full);
    }
    find(contrib, "string-name")
        .or_else(|| find(contrib, "collab"))
        .map(node_text)
        .filter(|t| !t.is_empty())
}

/// Text of `node` with whitespace collapsed, skipping floats embedded in it.
fn node_text(node: Node) -> String {
    let mut raw = String::new();
    collect_text(node, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: Node, out: &mut String) {
    for c in node.children() {
        if c.is_text() {
            out.push_str(c.text().unwrap_or(""));
        } else if c.is_element() {
            match c.tag_name().name() {
                "fig" | "table-wrap" | "fig-group" | "table-wrap-group" => {}
                "break" => out.push(' '),
                _ => collect_text(c, out),
            }
        }
    }
}

fn walk(node: Node, level: u32, out: &mut Vec<BodyBlock>) {
    for c in node.children().filter(Node::is_element) {
        match c.tag_name().name() {
            "sec" => {
                if let Some(title) = child(c, "title").map(node_text).filter(|t| !t.is_empty()) {
                    out.push(BodyBlock::Heading { text: title, level });
                }
                walk(c, level + 1, out);
            }
            "title" | "label" => {}
            "p" => {
                let text = node_text(c);
                if !text.is_empty() {
                    out.push(BodyBlock::Paragraph(text));
                }
                // floats anchored inside the paragraph follow it
                walk_floats(c, out);
            }
            "fig" => out.push(BodyBlock::Figure(parse_fig(c))),
            "table-wrap" => match parse_table_wrap(c) {
                Some(table) => out.push(BodyBlock::Table(table)),
                None => log::warn!(
                    "table-wrap {} has no <table>, skipped",
                    c.attribute("id").unwrap_or("?")
                ),
            },
            _ => walk(c, level, out),
        }
    }
}

fn walk_floats(node: Node, out: &mut Vec<BodyBlock>) {
    for c in node.children().filter(Node::is_element) {
        match c.tag_name().name() {
            "fig" => out.push(BodyBlock::Figure(parse_fig(c))),
            "table-wrap" => {
                if let Some(table) = parse_table_wrap(c) {
                    out.push(BodyBlock::Table(table));
                }
            }
            _ => walk_floats(c, out),
        }
    }
}

fn label_and_caption(node: Node) -> (String, String) {
    let label = child(node, "label").map(node_text).unwrap_or_default();
    let caption = child(node, "caption")
        .map(|cap| {
            cap.children()
                .filter(|n| is(*n, "title") || is(*n, "p"))
                .map(node_text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    (label, caption)
}

fn layout_hint(node: Node) -> Option<Layout> {
    node.attribute("specific-use").and_then(Layout::parse)
}

pub fn parse_fig(fig: Node) -> FigureSpec {
    let (label, caption) = label_and_caption(fig);
    let graphic = find(fig, "graphic");
    let image_ref = graphic
        .and_then(|g| g.attribute((XLINK_NS, "href")).or_else(|| g.attribute("href")))
        .unwrap_or("")
        .to_string();
    let alt_text = graphic
        .and_then(|g| child(g, "alt-text"))
        .or_else(|| child(fig, "alt-text"))
        .map(node_text)
        .unwrap_or_default();
    FigureSpec {
        id: fig.attribute("id").map(str::to_string),
        label,
        caption,
        image_ref,
        alt_text,
        layout: layout_hint(fig),
        threshold: None,
    }
}

pub fn parse_table_wrap(wrap: Node) -> Option<TableSpec> {
    let table = child(wrap, "table")
        .or_else(|| child(wrap, "alternatives").and_then(|alt| child(alt, "table")))?;
    let (label, title) = label_and_caption(wrap);

    let mut header_trs = Vec::new();
    let mut body_trs = Vec::new();
    for c in table.children().filter(Node::is_element) {
        match c.tag_name().name() {
            "thead" => header_trs.extend(c.children().filter(|n| is(*n, "tr"))),
            "tbody" | "tfoot" => body_trs.extend(c.children().filter(|n| is(*n, "tr"))),
            "tr" => body_trs.push(c),
            _ => {}
        }
    }

    let (headers, header_spans) = place_rows(&header_trs);
    let (rows, body_spans) = place_rows(&body_trs);

    Some(TableSpec {
        id: wrap.attribute("id").map(str::to_string),
        label,
        title,
        headers,
        rows,
        header_spans,
        body_spans,
        layout: layout_hint(wrap),
        wrap_distance: None,
    })
}

/// Positive integer attribute, defaulting to 1 and capped at `max`.
fn span_attr(cell: Node, name: &str, max: usize) -> usize {
    let value = cell
        .attribute(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    if value > max {
        log::warn!("{name}=\"{value}\" clamped to {max}");
        return max;
    }
    value
}

/// Lays `<tr>` rows out on a grid: cells skip positions already taken by a
/// rowspan from above; spanning cells become span entries and the cells
/// they cover stay blank. A rowspan never reaches past the last row of the
/// group.
fn place_rows(trs: &[Node]) -> (Vec<Vec<String>>, Vec<SpanEntry>) {
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(trs.len());
    let mut spans = Vec::new();
    let mut taken: HashSet<(usize, usize)> = HashSet::new();

    for (r, tr) in trs.iter().enumerate() {
        let mut row: Vec<String> = Vec::new();
        let mut col = 0usize;
        for cell in tr.children().filter(|n| is(*n, "td") || is(*n, "th")) {
            while taken.contains(&(r, col)) {
                col += 1;
            }
            let colspan = span_attr(cell, "colspan", MAX_COLSPAN);
            let rowspan = span_attr(cell, "rowspan", trs.len() - r);
            if row.len() < col + colspan {
                row.resize(col + colspan, String::new());
            }
            row[col] = node_text(cell);
            if colspan > 1 || rowspan > 1 {
                spans.push(SpanEntry::new(r, col, colspan, rowspan));
            }
            for dr in 1..rowspan {
                for dc in 0..colspan {
                    taken.insert((r + dr, col + dc));
                }
            }
            col += colspan;
        }
        grid.push(row);
    }
    (grid, spans)
}
