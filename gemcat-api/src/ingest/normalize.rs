//! Row normalization
//!
//! Maps a [`RawRow`] with whatever headers the sheet maintainers used onto the
//! fixed [`CatalogItem`] schema. Rows without any visual media are dropped
//! here; that is a data-quality filter, not an error.

use gemcat_common::item::aliases;
use gemcat_common::{CatalogItem, RawRow};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

/// Absolute HTTP(S) URL inside free text
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("URL pattern is valid"));

/// Host of the 360° viewer whose links can be turned into still images
const S360_HOST_MARKER: &str = "view.S360.services";

/// Still image template for the 360° viewer, `{}` is the `d` parameter
const S360_STILL_TEMPLATE: &str = "https://view.S360.services/imaged/{}/still.jpg";

/// First alias with a non-blank value, trimmed; empty if none match
pub fn pick<'a>(raw: &'a RawRow, aliases: &[&str]) -> &'a str {
    aliases
        .iter()
        .filter_map(|alias| raw.get(*alias))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// Lenient numeric coercion
///
/// Drops everything except digits, `.` and `-`, then reads the longest
/// numeric prefix. `None` when no number remains; never silently zero.
pub fn parse_number(input: &str) -> Option<f64> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let bytes = cleaned.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    let mut literal = cleaned[..end].trim_end_matches('.').to_string();
    if literal.starts_with('.') {
        literal.insert(0, '0');
    } else if literal.starts_with("-.") {
        literal.insert(1, '0');
    }

    literal.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// First URL in free text, or empty
pub fn first_url(input: &str) -> &str {
    URL_PATTERN.find(input).map(|m| m.as_str()).unwrap_or("")
}

/// Last URL in free text, or empty
pub fn last_url(input: &str) -> &str {
    URL_PATTERN
        .find_iter(input)
        .last()
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// Still image for a 360° viewer link
///
/// Only links on the S360 viewer host are recognized; the still is addressed
/// by the link's `d` query parameter.
pub fn derive_still_image(video_url: &str) -> Option<String> {
    if !video_url.contains(S360_HOST_MARKER) {
        return None;
    }
    let url = Url::parse(video_url).ok()?;
    let id = url
        .query_pairs()
        .find(|(key, _)| key == "d")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())?;
    Some(S360_STILL_TEMPLATE.replace("{}", &id))
}

/// Normalize one row; `None` when the row has neither image nor video
pub fn normalize_row(raw: RawRow) -> Option<CatalogItem> {
    let video_raw = pick(&raw, aliases::VIDEO);
    let image_raw = pick(&raw, aliases::IMAGE);
    let cert_raw = pick(&raw, aliases::CERTIFICATE);

    let video_url = first_url(video_raw).to_string();
    let mut image_url = first_url(image_raw).to_string();
    if image_url.is_empty() {
        if let Some(still) = derive_still_image(&video_url) {
            image_url = still;
        }
    }

    // No dedicated certificate column: the image cell often holds
    // "<image link> <certificate link>"
    let certificate_url = if cert_raw.is_empty() {
        last_url(image_raw).to_string()
    } else {
        first_url(cert_raw).to_string()
    };

    let text = |list: &[&str]| pick(&raw, list).to_string();
    let number = |list: &[&str]| parse_number(pick(&raw, list));

    let item = CatalogItem {
        stock: text(aliases::STOCK),
        report: text(aliases::REPORT),
        shape: text(aliases::SHAPE),
        weight: number(aliases::WEIGHT),
        color: text(aliases::COLOR),
        clarity: text(aliases::CLARITY),
        cut: text(aliases::CUT),
        polish: text(aliases::POLISH),
        symmetry: text(aliases::SYMMETRY),
        fluro: text(aliases::FLUORESCENCE),
        fancy_color: text(aliases::FANCY_COLOR),
        fancy_intensity: text(aliases::FANCY_INTENSITY),
        measurement: text(aliases::MEASUREMENT),
        table: number(aliases::TABLE),
        depth: number(aliases::DEPTH),
        diamond_type: text(aliases::DIAMOND_TYPE),
        lab: text(aliases::LAB),
        price_per_ct: number(aliases::PRICE_PER_CT),
        video_url,
        image_url,
        certificate_url,
        raw,
    };

    item.has_media().then_some(item)
}

/// Drop blank rows, normalize the rest, keep accepted records in order
pub fn normalize_rows(rows: Vec<RawRow>) -> Vec<CatalogItem> {
    rows.into_iter()
        .filter(|row| row.values().any(|v| !v.trim().is_empty()))
        .filter_map(normalize_row)
        .collect()
}
