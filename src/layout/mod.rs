//! Placement and geometry: column widths, picture scaling, span merging,
//! figure placement and section bracketing.

pub mod columns;
pub mod figure;
pub mod scale;
pub mod sections;
pub mod spans;

pub use columns::{ColumnWidthPlan, PageGeometry, allocate_column_widths};
pub use figure::{FigureLayoutResolver, LayoutCache, infer_dpi, natural_width};
pub use scale::{FitMode, PictureFit, fit_picture, picture_bounds};
pub use sections::{PageLayoutManager, WideBracket};
pub use spans::{GridShape, SpanMerger};
