//! Static table to data/style extraction.
//!
//! The inverse of [`render`](crate::render): walks `<thead>`/`<tbody>`
//! rows of a rendered wiki table, records header and body cells by
//! position, parses inline `style` attributes back into camelCase
//! property maps, and classifies the overall look into its nearest
//! preset. Only markup this crate emitted needs to round-trip.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::{TableCell, TableData};
use crate::style::{TableStyle, camel_case, classify_preset};

/// Error returned when table markup cannot be extracted.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Markup is not well-formed.
    #[error("Malformed table markup: {0}")]
    Xml(#[from] quick_xml::Error),
    /// The `<table>` element carries no `data-table-id` attribute.
    #[error("Not a wiki table: data-table-id attribute missing")]
    MissingTableId,
}

/// Extract a `TableData`/`TableStyle` pair from rendered table markup.
///
/// Cell styles are taken from the first header and first body cell seen;
/// empty cells are not recorded, preserving sparse storage. The style
/// preset is reconstructed heuristically via
/// [`classify_preset`](crate::classify_preset), so round-tripping a
/// hand-edited table normalizes it to its nearest preset.
///
/// # Errors
///
/// Returns [`ExtractError::MissingTableId`] when the markup is not a wiki
/// table, or [`ExtractError::Xml`] when it is not well-formed.
pub fn extract(html: &str) -> Result<(TableData, TableStyle), ExtractError> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().trim_text(false);

    let mut id: Option<String> = None;
    let mut table_styles = BTreeMap::new();
    let mut header_styles = BTreeMap::new();
    let mut cell_styles = BTreeMap::new();
    let mut cells: Vec<TableCell> = Vec::new();

    let mut has_header = false;
    let mut in_header_section = false;
    let mut in_cell = false;
    let mut cell_is_header = false;
    let mut row: u32 = 0;
    let mut col: u32 = 0;
    let mut columns: u32 = 0;
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"table" => {
                    id = attr_value(&e, "data-table-id");
                    table_styles = parse_style_attr(attr_value(&e, "style").as_deref());
                }
                b"thead" => {
                    has_header = true;
                    in_header_section = true;
                }
                b"tbody" => in_header_section = false,
                b"tr" => col = 0,
                b"th" | b"td" => {
                    in_cell = true;
                    cell_is_header = in_header_section || e.local_name().as_ref() == b"th";
                    let styles = parse_style_attr(attr_value(&e, "style").as_deref());
                    // First cell of each kind defines the shared style map
                    if cell_is_header {
                        if header_styles.is_empty() {
                            header_styles = styles;
                        }
                    } else if cell_styles.is_empty() {
                        cell_styles = styles;
                    }
                    text.clear();
                }
                _ => {}
            },
            Event::Text(e) => {
                if in_cell {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if in_cell {
                    text.push_str(&decode_entity(&String::from_utf8_lossy(&e)));
                }
            }
            Event::CData(e) => {
                if in_cell {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"th" | b"td" => {
                    if !text.is_empty() {
                        cells.push(TableCell {
                            row,
                            col,
                            content: std::mem::take(&mut text),
                            is_header: cell_is_header,
                        });
                    }
                    text.clear();
                    in_cell = false;
                    col += 1;
                    columns = columns.max(col);
                }
                b"tr" => row += 1,
                b"thead" => in_header_section = false,
                b"table" => break,
                _ => {}
            },
            Event::Eof => break,
            Event::Empty(_) | Event::Comment(_) | Event::Decl(_) | Event::PI(_)
            | Event::DocType(_) => {}
        }
        buf.clear();
    }

    let id = id.ok_or(ExtractError::MissingTableId)?;
    let preset = classify_preset(&table_styles, &header_styles, &cell_styles);

    let data = TableData {
        id: id.clone(),
        rows: row,
        columns,
        has_header,
        cells,
    };
    let style = TableStyle {
        id,
        preset,
        table_styles,
        header_styles,
        cell_styles,
    };
    Ok((data, style))
}

/// Read a single attribute value, unescaped.
fn attr_value(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(Cow::into_owned))
}

/// Parse an inline `style` attribute into a camelCase property map.
fn parse_style_attr(value: Option<&str>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let Some(value) = value else {
        return map;
    };
    for decl in value.split(';') {
        let Some((key, val)) = decl.split_once(':') else {
            continue;
        };
        let (key, val) = (key.trim(), val.trim());
        if key.is_empty() || val.is_empty() {
            continue;
        }
        map.insert(camel_case(key), val.to_owned());
    }
    map
}

/// Decode a general entity reference name into text.
fn decode_entity(name: &str) -> String {
    match name {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "quot" => "\"".to_owned(),
        "apos" => "'".to_owned(),
        _ => {
            // Numeric references: &#39; and &#x27;
            let code = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()));
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{name};"), |c| c.to_string())
        }
    }
}
