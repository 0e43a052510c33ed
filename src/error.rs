use std::fmt;

use thiserror::Error;

use crate::backend::BackendError;
use crate::spec::SpanEntry;

/// Fatal errors. Anything that only affects a single table or figure is
/// reported as a [`Warning`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document backend failed: {0}")]
    Backend(#[from] BackendError),
}

/// A table whose shape cannot be rendered. The table is skipped, the
/// document continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentShapeError {
    #[error("table has no determinable column count")]
    NoColumns,

    #[error("table has no header or body rows")]
    NoRows,

    #[error("span {second:?} overlaps span {first:?}")]
    OverlappingSpans { first: SpanEntry, second: SpanEntry },

    #[error("span {0:?} has a zero colspan or rowspan")]
    ZeroSpan(SpanEntry),
}

/// A degradation that was absorbed while rendering one item.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    MergeClamped {
        table: String,
        requested: SpanEntry,
        end_row: usize,
        end_col: usize,
    },
    SpanSkipped {
        table: String,
        span: SpanEntry,
        reason: String,
    },
    TableSkipped {
        table: String,
        reason: ContentShapeError,
    },
    AssetUnresolved {
        href: String,
    },
    MetricsUnavailable {
        path: String,
        reason: String,
    },
    PlaceholderInserted {
        figure: String,
    },
    PictureClamped {
        figure: String,
    },
    Backend {
        op: &'static str,
        error: BackendError,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MergeClamped {
                table,
                requested,
                end_row,
                end_col,
            } => write!(
                f,
                "{table}: span {requested:?} truncated to end at ({end_row}, {end_col})"
            ),
            Warning::SpanSkipped {
                table,
                span,
                reason,
            } => write!(f, "{table}: span {span:?} skipped: {reason}"),
            Warning::TableSkipped { table, reason } => write!(f, "{table}: skipped: {reason}"),
            Warning::AssetUnresolved { href } => write!(f, "asset '{href}' could not be resolved"),
            Warning::MetricsUnavailable { path, reason } => {
                write!(f, "no image metrics for {path}: {reason}")
            }
            Warning::PlaceholderInserted { figure } => {
                write!(f, "{figure}: picture replaced by alt-text placeholder")
            }
            Warning::PictureClamped { figure } => {
                write!(f, "{figure}: picture clamped to column width only")
            }
            Warning::Backend { op, error } => write!(f, "backend {op} failed: {error}"),
        }
    }
}

/// Collects warnings in the order they happened and logs each one.
#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.items.push(warning);
    }

    pub fn backend(&mut self, op: &'static str, error: BackendError) {
        self.push(Warning::Backend { op, error });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}
