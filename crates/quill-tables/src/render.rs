//! Static table rendering.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::data::TableData;
use crate::style::{TableStyle, kebab_case};

/// Escape text for HTML element and attribute positions.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a camelCase property map as an inline `key: value; ...` string.
fn style_attr(styles: &BTreeMap<String, String>) -> String {
    styles
        .iter()
        .map(|(k, v)| format!("{}: {}", kebab_case(k), v))
        .collect::<Vec<_>>()
        .join("; ")
}

fn write_style(out: &mut String, styles: &BTreeMap<String, String>) {
    let attr = style_attr(styles);
    if !attr.is_empty() {
        write!(out, r#" style="{}""#, escape_html(&attr)).unwrap();
    }
}

/// Render a data/style pair as static `<table>` markup.
///
/// The table is tagged with `data-table-id`. `<thead>` is built only when
/// the table has a header; row 0 is then the header row and body rows
/// start at index 1. Every `rows x columns` position is emitted, with
/// absent cells rendering as empty.
#[must_use]
pub fn render(data: &TableData, style: &TableStyle) -> String {
    let index = data.cell_index();
    let mut out = String::new();

    write!(
        out,
        r#"<table class="wiki-table" data-table-id="{}""#,
        escape_html(&data.id)
    )
    .unwrap();
    write_style(&mut out, &style.table_styles);
    out.push_str(">\n");

    let body_start = if data.has_header && data.rows > 0 {
        out.push_str("<thead>\n<tr>");
        for col in 0..data.columns {
            let content = index.get(&(0, col)).map_or("", |c| c.content.as_str());
            out.push_str("<th");
            write_style(&mut out, &style.header_styles);
            write!(out, ">{}</th>", escape_html(content)).unwrap();
        }
        out.push_str("</tr>\n</thead>\n");
        1
    } else {
        0
    };

    out.push_str("<tbody>\n");
    for row in body_start..data.rows {
        out.push_str("<tr>");
        for col in 0..data.columns {
            let content = index.get(&(row, col)).map_or("", |c| c.content.as_str());
            out.push_str("<td");
            write_style(&mut out, &style.cell_styles);
            write!(out, ">{}</td>", escape_html(content)).unwrap();
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>");

    out
}

/// Render a table as a minimal standalone page.
///
/// Used as an isolated live-preview surface: the page posts a resize
/// notification to its host context on load and on every resize so the
/// embedding frame can match its height.
#[must_use]
pub fn render_embeddable(data: &TableData, style: &TableStyle) -> String {
    let table = render(data, style);
    let table_id = data.id.replace('\\', "\\\\").replace('\'', "\\'");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body {{ margin: 0; padding: 4px; font-family: sans-serif; }}
table {{ border-collapse: collapse; }}
</style>
</head>
<body>
{table}
<script>
(function () {{
  function notify() {{
    window.parent.postMessage({{
      type: 'wiki-table-resize',
      tableId: '{table_id}',
      height: document.body.scrollHeight
    }}, '*');
  }}
  window.addEventListener('load', notify);
  window.addEventListener('resize', notify);
}})();
</script>
</body>
</html>
"#
    )
}
