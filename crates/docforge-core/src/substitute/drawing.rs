//! Replace an embedded drawing with a generated table.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{DocforgeError, Result};
use crate::markup::{self, RegionKind, RegionSelector, Structure};
use crate::templates::renderer::TemplateRenderer;

use super::Applied;

/// One column of a generated table. Widths are in twentieths of a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    pub width: u32,
}

/// Visual layout of a generated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub columns: Vec<Column>,
    #[serde(default = "default_header_fill")]
    pub header_fill: String,
    /// Border width in eighths of a point.
    #[serde(default = "default_border_size")]
    pub border_size: u32,
    #[serde(default = "default_border_color")]
    pub border_color: String,
}

fn default_header_fill() -> String {
    "D9E2F3".into()
}

fn default_border_size() -> u32 {
    4
}

fn default_border_color() -> String {
    "000000".into()
}

impl TableLayout {
    pub fn new(columns: &[(&str, u32)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(title, width)| Column {
                    title: title.to_string(),
                    width: *width,
                })
                .collect(),
            header_fill: default_header_fill(),
            border_size: default_border_size(),
            border_color: default_border_color(),
        }
    }

    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    fn context(&self, rows: &[Vec<String>]) -> serde_json::Value {
        let rows: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|values| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        json!({
                            "width": column.width,
                            "text": values.get(i).map(String::as_str).unwrap_or(""),
                        })
                    })
                    .collect()
            })
            .collect();
        json!({
            "columns": self.columns,
            "rows": rows,
            "total_width": self.total_width(),
            "header_fill": self.header_fill,
            "border_size": self.border_size,
            "border_color": self.border_color,
        })
    }
}

/// Replace the selected drawing by a table with one header row and one row
/// per record.
///
/// A table cannot live inside a paragraph. When the drawing is the only run
/// of a body-level paragraph the whole paragraph goes. Otherwise the table is
/// placed before the paragraph and only the drawing's run is removed, so
/// sibling runs survive and a cell still ends with a paragraph. A drawing
/// outside any paragraph is replaced on its own.
pub fn drawing_to_table(
    text: &str,
    selector: &RegionSelector,
    rows: &[Vec<String>],
    layout: &TableLayout,
    renderer: &TemplateRenderer,
) -> Result<Applied> {
    if rows.is_empty() {
        return Ok(Applied::unchanged(text));
    }

    let structure = Structure::scan(text);
    let drawings = structure.of_kind(RegionKind::Drawing);
    let drawing = selector.select(&drawings, text).ok_or_else(|| {
        DocforgeError::PatternNotMatched(format!(
            "{} drawing ({} present)",
            selector.describe(),
            drawings.len()
        ))
    })?;

    let table = renderer.render("generated_table", &layout.context(rows))?;
    let edits = match structure.enclosing(drawing.index, RegionKind::Paragraph) {
        None => vec![(drawing.span.clone(), table)],
        Some(paragraph) => {
            let run = structure
                .enclosing(drawing.index, RegionKind::Run)
                .filter(|run| paragraph.contains(run))
                .unwrap_or(drawing);
            let alone = structure
                .owned(paragraph.index, RegionKind::Run, RegionKind::Paragraph)
                .iter()
                .all(|r| r.index == run.index);
            let in_cell = paragraph
                .parent
                .and_then(|i| structure.get(i))
                .is_some_and(|parent| parent.kind == RegionKind::Cell);
            if alone && !in_cell {
                vec![(paragraph.span.clone(), table)]
            } else {
                let before = paragraph.span.start;
                vec![(before..before, table), (run.span.clone(), String::new())]
            }
        }
    };

    tracing::debug!(
        drawing_offset = drawing.span.start,
        rows = rows.len(),
        "drawing replaced by table"
    );
    Ok(Applied {
        text: markup::splice_all(text, edits),
        count: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_PARAGRAPH: &str =
        r#"<w:p><w:r><w:drawing><wp:inline><a:graphic/></wp:inline></w:drawing></w:r></w:p>"#;

    fn layout() -> TableLayout {
        TableLayout::new(&[("Facility", 3600), ("Group", 3000), ("Beds", 2760)])
    }

    fn rows() -> Vec<Vec<String>> {
        vec![
            vec!["Maple & Oak".into(), "North".into(), "40".into()],
            vec!["Cedar".into(), String::new(), "12".into()],
        ]
    }

    #[test]
    fn test_last_drawing_paragraph_replaced() {
        let doc = format!("<w:body>{IMAGE_PARAGRAPH}<w:p/>{IMAGE_PARAGRAPH}<w:sectPr/></w:body>");
        let r = TemplateRenderer::new().unwrap();
        let out = drawing_to_table(&doc, &RegionSelector::Last, &rows(), &layout(), &r).unwrap();

        assert_eq!(out.count, 2);
        let prefix = format!("<w:body>{IMAGE_PARAGRAPH}<w:p/>");
        assert!(out.text.starts_with(&prefix));
        assert!(out.text.ends_with("</w:tbl><w:sectPr/></w:body>"));
        assert_eq!(out.text.matches("<w:drawing>").count(), 1);

        let s = Structure::scan(&out.text);
        let tables = s.tables();
        assert_eq!(tables.len(), 1);
        let table_rows = s.owned(tables[0].index, RegionKind::Row, RegionKind::Table);
        assert_eq!(table_rows.len(), 3);
        assert_eq!(s.text_of(&out.text, table_rows[0].index), "FacilityGroupBeds");
        assert_eq!(s.text_of(&out.text, table_rows[1].index), "Maple & OakNorth40");
        assert!(out.text.contains("Maple &amp; Oak"));
        assert!(out.text.contains(r#"<w:tblW w:w="9360" w:type="dxa"/>"#));
    }

    #[test]
    fn test_no_drawing() {
        let r = TemplateRenderer::new().unwrap();
        let err = drawing_to_table("<w:p/>", &RegionSelector::Last, &rows(), &layout(), &r)
            .unwrap_err();
        assert!(matches!(err, DocforgeError::PatternNotMatched(_)));
    }

    #[test]
    fn test_empty_rows_keep_drawing() {
        let r = TemplateRenderer::new().unwrap();
        let out = drawing_to_table(IMAGE_PARAGRAPH, &RegionSelector::Last, &[], &layout(), &r).unwrap();
        assert_eq!(out.text, IMAGE_PARAGRAPH);
    }

    #[test]
    fn test_layout_defaults_from_json() {
        let layout: TableLayout = serde_json::from_str(
            r#"{"columns":[{"title":"Facility","width":5000}]}"#,
        )
        .unwrap();
        assert_eq!(layout.header_fill, "D9E2F3");
        assert_eq!(layout.border_size, 4);
        assert_eq!(layout.total_width(), 5000);
    }

    #[test]
    fn test_drawing_in_cell_keeps_label_and_paragraph() {
        let doc = concat!(
            "<w:tbl><w:tr><w:tc><w:p><w:pPr/>",
            "<w:r><w:t>Facilities:</w:t></w:r>",
            "<w:r><w:drawing><wp:inline/></w:drawing></w:r>",
            "</w:p></w:tc></w:tr></w:tbl>"
        );
        let r = TemplateRenderer::new().unwrap();
        let out = drawing_to_table(doc, &RegionSelector::Last, &rows(), &layout(), &r).unwrap();

        assert!(!out.text.contains("<w:drawing>"));
        assert!(out.text.ends_with(
            "</w:tbl><w:p><w:pPr/><w:r><w:t>Facilities:</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"
        ));
        assert!(markup::is_balanced(&out.text));
        assert_eq!(Structure::scan(&out.text).of_kind(RegionKind::Table).len(), 2);
    }

    #[test]
    fn test_drawing_alone_in_cell_leaves_empty_paragraph() {
        let doc = "<w:tc><w:p><w:r><w:drawing><wp:inline/></w:drawing></w:r></w:p></w:tc>";
        let r = TemplateRenderer::new().unwrap();
        let out = drawing_to_table(doc, &RegionSelector::First, &rows(), &layout(), &r).unwrap();

        assert!(out.text.starts_with("<w:tc><w:tbl>"));
        assert!(out.text.ends_with("</w:tbl><w:p></w:p></w:tc>"));
    }

    #[test]
    fn test_sibling_runs_survive_at_body_level() {
        let doc = concat!(
            "<w:body><w:p><w:r><w:t>See below</w:t></w:r>",
            "<w:r><w:drawing><wp:inline/></w:drawing></w:r></w:p></w:body>"
        );
        let r = TemplateRenderer::new().unwrap();
        let out = drawing_to_table(doc, &RegionSelector::First, &rows(), &layout(), &r).unwrap();

        assert!(out.text.starts_with("<w:body><w:tbl>"));
        assert!(out.text.ends_with("</w:tbl><w:p><w:r><w:t>See below</w:t></w:r></w:p></w:body>"));
    }
}
