//! Table style presets and classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named bundle of inline CSS rules for a table.
///
/// Presets are fixed, not freely composable; a hand-edited table is
/// normalized to its nearest preset by [`classify_preset`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    /// Plain table with a tinted header row.
    #[default]
    Default,
    /// Rows separated by bottom borders.
    Striped,
    /// Full borders on the table and every cell.
    Bordered,
    /// Borderless body with an underlined header.
    Clean,
}

impl StylePreset {
    /// Preset name as serialized on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Striped => "striped",
            Self::Bordered => "bordered",
            Self::Clean => "clean",
        }
    }
}

/// Inline style rules for a table, keyed by camelCase CSS property name.
///
/// `id` always equals the owning table's id: a data/style pair is
/// persisted and loaded together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStyle {
    /// Owning table id.
    pub id: String,
    /// Preset this style was derived from.
    #[serde(rename = "type")]
    pub preset: StylePreset,
    /// Rules applied to the `<table>` element.
    #[serde(default)]
    pub table_styles: BTreeMap<String, String>,
    /// Rules applied to `<th>` cells.
    #[serde(default)]
    pub header_styles: BTreeMap<String, String>,
    /// Rules applied to `<td>` cells.
    #[serde(default)]
    pub cell_styles: BTreeMap<String, String>,
}

impl TableStyle {
    /// Canonical style maps for a preset.
    #[must_use]
    pub fn preset(id: impl Into<String>, preset: StylePreset) -> Self {
        let mut style = Self {
            id: id.into(),
            preset,
            table_styles: rules(&[("borderCollapse", "collapse"), ("width", "100%")]),
            header_styles: rules(&[
                ("fontWeight", "bold"),
                ("padding", "8px 12px"),
                ("textAlign", "left"),
            ]),
            cell_styles: rules(&[("padding", "8px 12px")]),
        };

        match preset {
            StylePreset::Default => {
                style
                    .header_styles
                    .insert("backgroundColor".to_owned(), "#f5f5f5".to_owned());
            }
            StylePreset::Striped => {
                style
                    .header_styles
                    .insert("backgroundColor".to_owned(), "#f0f0f0".to_owned());
                style
                    .cell_styles
                    .insert("borderBottom".to_owned(), "1px solid #ddd".to_owned());
            }
            StylePreset::Bordered => {
                style
                    .header_styles
                    .insert("backgroundColor".to_owned(), "#f5f5f5".to_owned());
                style
                    .table_styles
                    .insert("border".to_owned(), "1px solid #ccc".to_owned());
                style
                    .cell_styles
                    .insert("border".to_owned(), "1px solid #ccc".to_owned());
            }
            StylePreset::Clean => {
                style
                    .header_styles
                    .insert("borderBottom".to_owned(), "2px solid #333".to_owned());
                style.header_styles.insert("fontWeight".to_owned(), "600".to_owned());
            }
        }
        style
    }
}

fn rules(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

/// Classify extracted style maps into the nearest preset.
///
/// Checked in a fixed tie-break order; tests pin these boundaries:
///
/// 1. `bordered` - `border` present on both the table and the cells
/// 2. `striped`  - `borderBottom` on cells without rule 1 matching
/// 3. `clean`    - header has `borderBottom` but no background
/// 4. `default`  - anything else
#[must_use]
pub fn classify_preset(
    table_styles: &BTreeMap<String, String>,
    header_styles: &BTreeMap<String, String>,
    cell_styles: &BTreeMap<String, String>,
) -> StylePreset {
    if table_styles.contains_key("border") && cell_styles.contains_key("border") {
        return StylePreset::Bordered;
    }
    if cell_styles.contains_key("borderBottom") {
        return StylePreset::Striped;
    }
    let header_has_background =
        header_styles.contains_key("background") || header_styles.contains_key("backgroundColor");
    if header_styles.contains_key("borderBottom") && !header_has_background {
        return StylePreset::Clean;
    }
    StylePreset::Default
}

/// Convert a camelCase CSS property name to kebab-case.
pub(crate) fn kebab_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 2);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a kebab-case CSS property name to camelCase.
pub(crate) fn camel_case(kebab: &str) -> String {
    let mut out = String::with_capacity(kebab.len());
    let mut upper_next = false;
    for c in kebab.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
