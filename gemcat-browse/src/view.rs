//! Plain-text rendering of cards, details and list status

use chrono::Local;
use gemcat_common::CatalogItem;
use std::collections::HashSet;
use std::fmt::Write;
use thiserror::Error;

use crate::state::{CatalogState, LoadPhase};

/// Shown in place of any blank text field or missing number
pub const DASH: &str = "—";

/// Image shown once a record's still image failed to load
pub const PLACEHOLDER_IMAGE: &str =
    "/placeholder.svg?height=320&width=480&query=diamond%20still%20image";

pub const LOADING_MESSAGE: &str = "Loading diamonds...";
pub const ERROR_MESSAGE: &str = "Could not load data. Please check your sheet.";
pub const NO_MATCHES_MESSAGE: &str = "No diamonds match your filters.";

/// A record's still image could not be loaded
///
/// Never surfaced to the user; [`MediaState`] swaps in the placeholder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("image for {stock} unavailable: {reason}")]
pub struct ImageLoadError {
    pub stock: String,
    pub report: String,
    pub reason: String,
}

impl ImageLoadError {
    pub fn new(item: &CatalogItem, reason: impl Into<String>) -> Self {
        Self {
            stock: item.stock.clone(),
            report: item.report.clone(),
            reason: reason.into(),
        }
    }
}

/// Per-record image failures, keyed like the rendered list
#[derive(Debug, Default)]
pub struct MediaState {
    failed: HashSet<(String, String)>,
}

impl MediaState {
    pub fn record_failure(&mut self, err: &ImageLoadError) {
        tracing::debug!(error = %err, "Falling back to placeholder image");
        self.failed.insert((err.stock.clone(), err.report.clone()));
    }

    pub fn has_failed(&self, item: &CatalogItem) -> bool {
        let (stock, report) = item.key();
        self.failed.contains(&(stock.to_string(), report.to_string()))
    }

    /// Image to display for `item`
    pub fn image_src<'a>(&self, item: &'a CatalogItem) -> &'a str {
        if item.image_url.is_empty() || self.has_failed(item) {
            PLACEHOLDER_IMAGE
        } else {
            &item.image_url
        }
    }
}

/// Group thousands and keep at most three fraction digits: `1234.5` → `1,234.5`
pub fn format_grouped(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// Price badge: `$1,234/ct`, or `Price/ct —` when unpriced
pub fn format_price_per_ct(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${}/ct", format_grouped(p)),
        None => format!("Price/ct {}", DASH),
    }
}

pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => DASH.to_string(),
    }
}

pub fn text_or_dash(value: &str) -> &str {
    if value.is_empty() {
        DASH
    } else {
        value
    }
}

/// One-card summary as shown in the grid
pub fn render_card(item: &CatalogItem, media: &MediaState) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} • {} ct    [{}]",
        text_or_dash(&item.shape),
        format_number(item.weight),
        format_price_per_ct(item.price_per_ct)
    );

    let mut badges = vec![
        format!("[{}]", text_or_dash(&item.color)),
        format!("[{}]", text_or_dash(&item.clarity)),
    ];
    if !item.cut.is_empty() {
        badges.push(format!("[Cut {}]", item.cut));
    }
    if !item.lab.is_empty() {
        badges.push(format!("[{}]", item.lab));
    }
    let _ = writeln!(out, "  {}", badges.join(" "));

    let mut id_line = text_or_dash(&item.stock).to_string();
    if !item.report.is_empty() {
        let _ = write!(id_line, " • Report {}", item.report);
    }
    let _ = writeln!(out, "  {}", id_line);

    let _ = writeln!(out, "  image: {}", media.image_src(item));
    if !item.video_url.is_empty() {
        let _ = writeln!(out, "  360° View: {}", item.video_url);
    }
    if !item.certificate_url.is_empty() {
        let _ = writeln!(out, "  Certificate: {}", item.certificate_url);
    }

    out
}

/// Every descriptive field, media links and unmapped source columns
pub fn render_detail(item: &CatalogItem, media: &MediaState) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} • {} ct",
        text_or_dash(&item.shape),
        format_number(item.weight)
    );
    let _ = writeln!(out);

    let fields: [(&str, String); 16] = [
        ("Stock", text_or_dash(&item.stock).to_string()),
        ("Report", text_or_dash(&item.report).to_string()),
        ("Price", format_price_per_ct(item.price_per_ct)),
        ("Color", text_or_dash(&item.color).to_string()),
        ("Clarity", text_or_dash(&item.clarity).to_string()),
        ("Cut", text_or_dash(&item.cut).to_string()),
        ("Symmetry", text_or_dash(&item.symmetry).to_string()),
        ("Polish", text_or_dash(&item.polish).to_string()),
        ("Fluor", text_or_dash(&item.fluro).to_string()),
        ("Fancy Color", text_or_dash(&item.fancy_color).to_string()),
        ("Intensity", text_or_dash(&item.fancy_intensity).to_string()),
        ("Table", format_number(item.table)),
        ("Depth", format_number(item.depth)),
        ("Measurement", text_or_dash(&item.measurement).to_string()),
        ("Type", text_or_dash(&item.diamond_type).to_string()),
        ("Lab", text_or_dash(&item.lab).to_string()),
    ];
    for (label, value) in &fields {
        let _ = writeln!(out, "  {:<12} {}", label, value);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {:<12} {}", "Image", media.image_src(item));
    let _ = writeln!(out, "  {:<12} {}", "360° View", text_or_dash(&item.video_url));
    let _ = writeln!(out, "  {:<12} {}", "Certificate", text_or_dash(&item.certificate_url));

    let extra = item.extra_attributes();
    if !extra.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Other attributes");
        for (label, value) in extra {
            let _ = writeln!(out, "  {:<12} {}", label, value);
        }
    }

    out
}

/// Message for the list area, if the list has nothing useful to show
pub fn empty_state(state: &CatalogState, visible: usize) -> Option<&'static str> {
    let nothing_loaded = state.loaded_pages() == 0;
    match state.phase() {
        LoadPhase::Idle | LoadPhase::Loading { .. } if nothing_loaded => Some(LOADING_MESSAGE),
        LoadPhase::Error { .. } => Some(ERROR_MESSAGE),
        _ if visible == 0 => Some(NO_MATCHES_MESSAGE),
        _ => None,
    }
}

/// Toolbar line: counts, paging progress and last update time
pub fn status_line(state: &CatalogState, visible: usize) -> String {
    let mut line = format!("Showing {} of {} loaded", visible, state.item_count());

    match state.total_pages() {
        Some(total) => {
            let _ = write!(line, " • page {}/{}", state.loaded_pages(), total);
        }
        None => line.push_str(" • page 0/?"),
    }
    if state.is_exhausted() {
        line.push_str(" (all loaded)");
    }
    if let Some(updated) = state.updated_at() {
        let _ = write!(
            line,
            " • Updated {}",
            updated.with_timezone(&Local).format("%H:%M:%S")
        );
    }

    line
}
