use crate::config::{Layout, LayoutConfig, PageAttributes};
use crate::units::{Twips, twips_to_cm};

/// Page-level lengths every placement decision derives from, in cm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub content_width: f64,
    pub content_height: f64,
    pub column_spacing: f64,
    pub body_columns: u32,
}

impl PageGeometry {
    pub fn new(attrs: &PageAttributes, config: &LayoutConfig) -> Self {
        Self {
            content_width: attrs.content_width(),
            content_height: attrs.content_height(),
            column_spacing: twips_to_cm(config.column_spacing.0 as f64),
            body_columns: config.body_columns.max(1),
        }
    }

    /// Width of one body column. With the usual two columns this is
    /// `(content_width - spacing) / 2`.
    pub fn narrow_width(&self) -> f64 {
        let n = self.body_columns as f64;
        (self.content_width - (n - 1.0) * self.column_spacing) / n
    }

    pub fn width_for(&self, layout: Layout) -> f64 {
        match layout {
            Layout::Wide => self.content_width,
            Layout::Narrow => self.narrow_width(),
        }
    }

    pub fn table_width(&self, layout: Layout) -> Twips {
        Twips::from_cm(self.width_for(layout))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnWidthPlan {
    pub widths: Vec<Twips>,
}

impl ColumnWidthPlan {
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.widths.iter().map(|w| w.0 as u64).sum()
    }
}

/// Splits `table_width` over `empty.len()` columns. Empty columns get
/// exactly `min_empty` (at least one twip) when that leaves room for the
/// rest; otherwise every column gets an equal share. Integer remainders go
/// to the leftmost receiving columns, so the plan always sums to
/// `table_width` unless the one-twip floor kicks in on a table narrower
/// than its column count.
pub fn allocate_column_widths(
    table_width: Twips,
    empty: &[bool],
    min_empty: Twips,
) -> ColumnWidthPlan {
    let ncols = empty.len();
    if ncols == 0 {
        return ColumnWidthPlan::default();
    }
    let min_empty = Twips(min_empty.0.max(1));
    let total = table_width.0 as u64;
    let n_empty = empty.iter().filter(|&&e| e).count();
    let remaining = total as i64 - min_empty.0 as i64 * n_empty as i64;

    let widths = if n_empty == ncols || remaining <= 0 {
        log::debug!(
            "column widths: equal split of {total} over {ncols} columns ({n_empty} empty)"
        );
        share(total, ncols)
    } else {
        let n_full = ncols - n_empty;
        let mut shares = share(remaining as u64, n_full).into_iter();
        empty
            .iter()
            .map(|&e| {
                if e {
                    min_empty
                } else {
                    shares.next().unwrap_or(Twips(1))
                }
            })
            .collect()
    };

    ColumnWidthPlan { widths }
}

/// `total` split into `n` near-equal parts, each at least one twip.
fn share(total: u64, n: usize) -> Vec<Twips> {
    let n64 = n as u64;
    let base = total / n64;
    let extra = (total % n64) as usize;
    (0..n)
        .map(|i| {
            let w = base + u64::from(i < extra);
            Twips(w.clamp(1, u32::MAX as u64) as u32)
        })
        .collect()
}
