use serde::{Deserialize, Deserializer};

use crate::error::Error;
use crate::units::Twips;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Full content width, one column.
    Wide,
    /// One body column.
    Narrow,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Wide => "wide",
            Layout::Narrow => "narrow",
        }
    }

    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "wide" => Some(Layout::Wide),
            "narrow" => Some(Layout::Narrow),
            _ => None,
        }
    }
}

/// Accepts `"wide"`/`"narrow"` in any case; anything else (including
/// `"auto"`) means "not set".
pub(crate) fn deserialize_layout<'de, D>(deserializer: D) -> Result<Option<Layout>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Layout::parse))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBreakType {
    Continuous,
    NewColumn,
    NewPage,
    EvenPage,
    OddPage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page geometry for the whole document, in centimetres. Supplied once by
/// the caller and never mutated.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageAttributes {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub header_distance: f64,
    pub footer_distance: f64,
    pub gutter: f64,
    pub orientation: Orientation,
    pub different_first_page: bool,
    pub start_type: SectionBreakType,
}

impl Default for PageAttributes {
    /// A4 portrait with 2 cm margins.
    fn default() -> Self {
        Self {
            page_width: 21.0,
            page_height: 29.7,
            margin_top: 2.0,
            margin_bottom: 2.0,
            margin_left: 2.0,
            margin_right: 2.0,
            header_distance: 1.25,
            footer_distance: 1.25,
            gutter: 0.0,
            orientation: Orientation::Portrait,
            different_first_page: true,
            start_type: SectionBreakType::NewPage,
        }
    }
}

impl PageAttributes {
    pub fn content_width(&self) -> f64 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f64 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    pub fn validate(&self) -> Result<(), Error> {
        let lengths = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
            ("header_distance", self.header_distance),
            ("footer_distance", self.footer_distance),
            ("gutter", self.gutter),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Configuration(format!(
                    "{name} must be a non-negative length, got {value}"
                )));
            }
        }
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(Error::Configuration(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        if self.content_width() <= 0.0 {
            return Err(Error::Configuration(format!(
                "left and right margins ({} + {}) leave no content width on a {} cm page",
                self.margin_left, self.margin_right, self.page_width
            )));
        }
        if self.content_height() <= 0.0 {
            return Err(Error::Configuration(format!(
                "top and bottom margins ({} + {}) leave no content height on a {} cm page",
                self.margin_top, self.margin_bottom, self.page_height
            )));
        }
        Ok(())
    }
}

/// Tunables for the layout engine. Passed explicitly to every component
/// that needs them.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Column count of the normal body flow.
    pub body_columns: u32,
    /// Gap between body columns.
    pub column_spacing: Twips,
    /// Width given to a table column that holds no text at all.
    pub min_empty_column_width: Twips,
    /// Resolution assumed for images that carry no density metadata.
    ///
    /// Defaults to `96.0`.
    pub default_dpi: f64,
    /// A figure goes wide once its natural width reaches
    /// `wide_threshold × narrow column width`.
    ///
    /// Defaults to `1.0`.
    pub wide_threshold: f64,
    /// Height kept free below a picture for its caption, in centimetres.
    pub caption_reserve_cm: f64,
    /// Tables without an explicit layout go wide above this many columns.
    pub narrow_table_max_columns: usize,
    /// Reject tables whose span matrices overlap. When off, the first span
    /// applied wins and later overlapping spans are skipped.
    pub strict_spans: bool,
    pub caption_style: String,
    pub table_style: String,
    pub placeholder_style: String,
    pub body_style: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            body_columns: 2,
            column_spacing: Twips(300),
            min_empty_column_width: Twips(400),
            default_dpi: 96.0,
            wide_threshold: 1.0,
            caption_reserve_cm: 3.0,
            narrow_table_max_columns: 4,
            strict_spans: true,
            caption_style: "Caption".to_string(),
            table_style: "Table Grid".to_string(),
            placeholder_style: "Placeholder".to_string(),
            body_style: "Body Text".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.body_columns == 0 {
            return Err(Error::Configuration("body_columns must be at least 1".into()));
        }
        if self.min_empty_column_width.0 == 0 {
            return Err(Error::Configuration(
                "min_empty_column_width must be at least one twip".into(),
            ));
        }
        if !self.default_dpi.is_finite() || self.default_dpi <= 0.0 {
            return Err(Error::Configuration(format!(
                "default_dpi must be positive, got {}",
                self.default_dpi
            )));
        }
        if !self.wide_threshold.is_finite() || self.wide_threshold <= 0.0 {
            return Err(Error::Configuration(format!(
                "wide_threshold must be positive, got {}",
                self.wide_threshold
            )));
        }
        if !self.caption_reserve_cm.is_finite() || self.caption_reserve_cm < 0.0 {
            return Err(Error::Configuration(format!(
                "caption_reserve_cm must be non-negative, got {}",
                self.caption_reserve_cm
            )));
        }
        Ok(())
    }
}
