//! Normalized catalog record
//!
//! A `CatalogItem` is the fixed-schema view of one spreadsheet row. Numeric
//! fields are `Option<f64>` so that a blank cell stays distinguishable from a
//! literal zero all the way to the view layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header label → trimmed cell text for one decoded source row
pub type RawRow = BTreeMap<String, String>;

/// Ordered source header aliases per target field
///
/// The first alias present in a row with a non-blank value wins.
pub mod aliases {
    pub const STOCK: &[&str] = &["Stock#", "Stock No", "Stock", "Stock Number"];
    pub const REPORT: &[&str] = &["Report#", "Report No", "Report", "Report Number"];
    pub const SHAPE: &[&str] = &["Shape"];
    pub const WEIGHT: &[&str] = &["Weight", "Carat", "Cts"];
    pub const COLOR: &[&str] = &["Color"];
    pub const CLARITY: &[&str] = &["Clarity"];
    pub const CUT: &[&str] = &["Cut"];
    pub const POLISH: &[&str] = &["Polish", "Poli", "Poli."];
    pub const SYMMETRY: &[&str] = &["Sym", "Symmetry"];
    pub const FLUORESCENCE: &[&str] = &["Fluro", "Fluor", "Fluorescence", "Fluo"];
    pub const FANCY_COLOR: &[&str] = &["Fancy Color", "Fancy colour"];
    pub const FANCY_INTENSITY: &[&str] = &["Fancy Color Int", "Fancy Color Intensity"];
    pub const MEASUREMENT: &[&str] = &["Measurement", "Measurements"];
    pub const TABLE: &[&str] = &["Table"];
    pub const DEPTH: &[&str] = &["Depth"];
    pub const DIAMOND_TYPE: &[&str] = &["Diam", "Diamond Type"];
    pub const LAB: &[&str] = &["Lab"];
    pub const PRICE_PER_CT: &[&str] = &["$/Ct", "Price/Ct", "Price per Ct"];
    pub const VIDEO: &[&str] = &["Video", "Video Link", "360", "360°"];
    pub const IMAGE: &[&str] = &["Image", "Image URL", "Image Url", "Image Link", "Still"];
    pub const CERTIFICATE: &[&str] = &["Certificate", "Cert", "Certificate Link"];

    /// Every alias list, used to tell recognized columns from extra ones
    pub const ALL: &[&[&str]] = &[
        STOCK,
        REPORT,
        SHAPE,
        WEIGHT,
        COLOR,
        CLARITY,
        CUT,
        POLISH,
        SYMMETRY,
        FLUORESCENCE,
        FANCY_COLOR,
        FANCY_INTENSITY,
        MEASUREMENT,
        TABLE,
        DEPTH,
        DIAMOND_TYPE,
        LAB,
        PRICE_PER_CT,
        VIDEO,
        IMAGE,
        CERTIFICATE,
    ];

    /// True if `label` is mapped onto a schema field by some alias list
    pub fn is_known(label: &str) -> bool {
        ALL.iter().any(|list| list.contains(&label))
    }
}

/// Normalized catalog record served by the catalog API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub stock: String,
    pub report: String,
    pub shape: String,
    /// Carat weight
    pub weight: Option<f64>,
    pub color: String,
    pub clarity: String,
    pub cut: String,
    pub polish: String,
    pub symmetry: String,
    /// Fluorescence grade
    pub fluro: String,
    pub fancy_color: String,
    pub fancy_intensity: String,
    /// Free-text dimensions, e.g. "6.45 x 6.48 x 3.99"
    pub measurement: String,
    /// Table percentage
    pub table: Option<f64>,
    /// Depth percentage
    pub depth: Option<f64>,
    /// Growth type (natural, CVD, HPHT, ...)
    pub diamond_type: String,
    /// Grading laboratory
    pub lab: String,
    pub price_per_ct: Option<f64>,
    /// 360° viewer link
    pub video_url: String,
    /// Still image link
    pub image_url: String,
    pub certificate_url: String,
    /// Opaque copy of the source row
    #[serde(rename = "_raw", default)]
    pub raw: RawRow,
}

impl CatalogItem {
    /// List-rendering key: (stock id, report id)
    ///
    /// Not unique; duplicate rows share a key.
    pub fn key(&self) -> (&str, &str) {
        (&self.stock, &self.report)
    }

    /// Source columns not mapped onto any schema field
    pub fn extra_attributes(&self) -> BTreeMap<&str, &str> {
        self.raw
            .iter()
            .filter(|(label, value)| !aliases::is_known(label) && !value.is_empty())
            .map(|(label, value)| (label.as_str(), value.as_str()))
            .collect()
    }

    /// True when the record carries a still image or a 360° link
    pub fn has_media(&self) -> bool {
        !self.image_url.is_empty() || !self.video_url.is_empty()
    }
}
