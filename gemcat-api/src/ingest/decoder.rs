//! GViz response decoding
//!
//! The sheet export wraps its JSON payload in a JavaScript callback:
//! `google.visualization.Query.setResponse({...});`. The decoder strips the
//! envelope, reads `table.cols[].label` as headers and turns each entry of
//! `table.rows[].c[]` into a [`RawRow`].

use gemcat_common::RawRow;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::IngestError;

/// Parsed GViz payload (only the parts the catalog reads)
#[derive(Debug, Default, Deserialize)]
pub struct GvizPayload {
    #[serde(default)]
    pub table: Option<GvizTable>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GvizTable {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cols: Vec<Option<GvizColumn>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rows: Vec<Option<GvizRow>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GvizColumn {
    #[serde(default)]
    pub label: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GvizRow {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub c: Vec<Option<GvizCell>>,
}

/// Accept an explicit `null` wherever a list is expected
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One cell: `f` is the formatted display value, `v` the raw value
#[derive(Debug, Default, Deserialize)]
pub struct GvizCell {
    #[serde(default)]
    pub f: Option<Value>,
    #[serde(default)]
    pub v: Option<Value>,
}

/// Strip the callback envelope and parse the JSON body
///
/// Takes the text between the first `(` and the last `)` of the trimmed
/// input.
pub fn parse_envelope(text: &str) -> Result<GvizPayload, IngestError> {
    let trimmed = text.trim();
    let start = trimmed.find('(');
    let end = trimmed.rfind(')');

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) if end > start + 1 => (start, end),
        _ => {
            return Err(IngestError::Format(
                "Unexpected GViz response format".to_string(),
            ))
        }
    };

    serde_json::from_str(&trimmed[start + 1..end])
        .map_err(|e| IngestError::Format(format!("Invalid GViz payload: {}", e)))
}

/// Header labels, with `col_<index>` standing in for blank ones
pub fn header_labels(cols: &[Option<GvizColumn>]) -> Vec<String> {
    cols.iter()
        .enumerate()
        .map(|(idx, col)| {
            let label = col
                .as_ref()
                .and_then(|c| c.label.as_ref())
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or("");
            if label.is_empty() {
                format!("col_{}", idx)
            } else {
                label.to_string()
            }
        })
        .collect()
}

/// Map each row onto its header labels
///
/// Prefers the formatted value, then the raw value, then empty string.
/// A later column with a duplicate label overwrites the earlier one.
pub fn rows_to_raw(rows: &[Option<GvizRow>], headers: &[String]) -> Vec<RawRow> {
    rows.iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = row
                        .as_ref()
                        .and_then(|r| r.c.get(i))
                        .and_then(Option::as_ref);
                    let value = cell
                        .and_then(|c| non_null(&c.f).or_else(|| non_null(&c.v)))
                        .map(display_value)
                        .unwrap_or_default();
                    (header.clone(), value.trim().to_string())
                })
                .collect()
        })
        .collect()
}

/// Decode a full GViz response into raw rows
pub fn decode(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let payload = parse_envelope(text)?;
    let table = payload.table.unwrap_or_default();
    let headers = header_labels(&table.cols);
    Ok(rows_to_raw(&table.rows, &headers))
}

fn non_null(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

/// Render a cell value the way the sheet displays it
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            // f64 Display drops a zero fraction: 2.0 -> "2"
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_envelope() {
        let text = r#"foo({"table":{"cols":[{"label":"Shape"}],"rows":[{"c":[{"v":"Round"}]}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["Shape"], "Round");
    }

    #[test]
    fn test_decode_real_style_envelope() {
        let text = "/*O_o*/\ngoogle.visualization.Query.setResponse({\"version\":\"0.6\",\"status\":\"ok\",\"table\":{\"cols\":[{\"id\":\"A\",\"label\":\"Stock#\",\"type\":\"string\"},{\"id\":\"B\",\"label\":\"Weight\",\"type\":\"number\"}],\"rows\":[{\"c\":[{\"v\":\"A-1\"},{\"v\":1.01,\"f\":\"1.01\"}]}]}});";
        let rows = decode(text).unwrap();
        assert_eq!(rows[0]["Stock#"], "A-1");
        assert_eq!(rows[0]["Weight"], "1.01");
    }

    #[test]
    fn test_no_parentheses_is_format_error() {
        let err = decode("not a gviz response").unwrap_err();
        assert!(matches!(err, IngestError::Format(_)));
    }

    #[test]
    fn test_close_before_open_is_format_error() {
        let err = decode(")(").unwrap_err();
        assert!(matches!(err, IngestError::Format(_)));
    }

    #[test]
    fn test_empty_body_is_format_error() {
        let err = decode("cb()").unwrap_err();
        assert!(matches!(err, IngestError::Format(_)));
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let err = decode("cb({table: nope})").unwrap_err();
        assert!(matches!(err, IngestError::Format(_)));
    }

    #[test]
    fn test_missing_table_yields_no_rows() {
        let rows = decode(r#"cb({"status":"ok"})"#).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_blank_labels_get_positional_names() {
        let text = r#"cb({"table":{"cols":[{"label":"  "},{"label":"Color"},{}],"rows":[{"c":[{"v":"x"},{"v":"D"},{"v":"y"}]}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows[0]["col_0"], "x");
        assert_eq!(rows[0]["Color"], "D");
        assert_eq!(rows[0]["col_2"], "y");
    }

    #[test]
    fn test_formatted_value_preferred_and_trimmed() {
        let text = r#"cb({"table":{"cols":[{"label":"$/Ct"}],"rows":[{"c":[{"v":1500,"f":" $1,500 "}]}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows[0]["$/Ct"], "$1,500");
    }

    #[test]
    fn test_null_and_short_cells_are_empty() {
        let text = r#"cb({"table":{"cols":[{"label":"A"},{"label":"B"},{"label":"C"}],"rows":[{"c":[null,{"v":null}]},{}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["A"], "");
        assert_eq!(rows[0]["B"], "");
        assert_eq!(rows[0]["C"], "");
        assert_eq!(rows[1]["A"], "");
    }

    #[test]
    fn test_numbers_render_like_the_sheet() {
        let text = r#"cb({"table":{"cols":[{"label":"N"},{"label":"F"},{"label":"B"}],"rows":[{"c":[{"v":2.0},{"v":0.5},{"v":true}]}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows[0]["N"], "2");
        assert_eq!(rows[0]["F"], "0.5");
        assert_eq!(rows[0]["B"], "true");
    }

    #[test]
    fn test_duplicate_labels_last_wins() {
        let text = r#"cb({"table":{"cols":[{"label":"Cut"},{"label":"Cut"}],"rows":[{"c":[{"v":"EX"},{"v":"VG"}]}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows[0]["Cut"], "VG");
    }

    #[test]
    fn test_null_cell_list_becomes_blank_row() {
        let text = r#"cb({"table":{"cols":[{"label":"Image"}],"rows":[{"c":null},{"c":[{"v":"https://a.example/x.jpg"}]}]}})"#;
        let rows = decode(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Image"], "");
        assert_eq!(rows[1]["Image"], "https://a.example/x.jpg");
    }

    #[test]
    fn test_null_cols_and_rows_are_empty() {
        let rows = decode(r#"cb({"table":{"cols":null,"rows":null}})"#).unwrap();
        assert!(rows.is_empty());

        let rows = decode(r#"cb({"table":{"cols":null,"rows":[{"c":[{"v":"x"}]}]}})"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_empty());
    }
}
