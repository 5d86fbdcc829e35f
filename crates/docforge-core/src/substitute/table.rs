//! Structural table replacement.
//!
//! A table region is rebuilt from its own rows: the header row is kept
//! verbatim, the second row is cloned once per record with its cell text
//! swapped out, and the rebuilt table is spliced back at the exact offsets of
//! the selected occurrence. Other tables, even structurally identical ones,
//! are never touched.

use crate::error::{DocforgeError, Result};
use crate::markup::{self, Region, RegionKind, RegionSelector, Structure};
use crate::templates::renderer::TemplateRenderer;

use super::Applied;

/// Replace the data rows of the selected table with one cloned row per record.
///
/// `rows` are already filtered and projected onto the schema's field order;
/// field `i` fills cell `i`. With no rows the document is returned unchanged.
pub fn replace_table_rows(
    text: &str,
    selector: &RegionSelector,
    rows: &[Vec<String>],
    renderer: &TemplateRenderer,
) -> Result<Applied> {
    if rows.is_empty() {
        return Ok(Applied::unchanged(text));
    }

    let structure = Structure::scan(text);
    let tables = structure.tables();
    let table = selector.select(&tables, text).ok_or_else(|| {
        DocforgeError::PatternNotMatched(format!(
            "{} table ({} present)",
            selector.describe(),
            tables.len()
        ))
    })?;

    let table_rows = structure.owned(table.index, RegionKind::Row, RegionKind::Table);
    if table_rows.len() < 2 {
        return Err(DocforgeError::PatternNotMatched(format!(
            "table at offset {} has {} row(s), need a header and a template row",
            table.span.start,
            table_rows.len()
        )));
    }

    let header = &text[table_rows[0].span.clone()];
    let template_row = &text[table_rows[1].span.clone()];

    let mut rendered = String::from(header);
    for values in rows {
        rendered.push_str(&fill_row(template_row, values, renderer)?);
    }

    let rebuilt = rebuild_table(text, table, &table_rows, &rendered);
    tracing::debug!(
        table_offset = table.span.start,
        rows = rows.len(),
        "table rows replaced"
    );

    Ok(Applied {
        text: markup::splice(text, table.span.clone(), &rebuilt),
        count: rows.len(),
    })
}

/// The table markup with every row removed and `rows_markup` inserted
/// immediately before the end marker.
fn rebuild_table(text: &str, table: &Region, rows: &[&Region], rows_markup: &str) -> String {
    let mut out = String::with_capacity(table.span.len() + rows_markup.len());
    let mut cursor = table.span.start;
    for row in rows {
        out.push_str(&text[cursor..row.span.start]);
        cursor = row.span.end;
    }
    out.push_str(&text[cursor..table.inner.end]);
    out.push_str(rows_markup);
    out.push_str(&text[table.inner.end..table.span.end]);
    out
}

/// Clone a template row, writing `values[i]` into its `i`-th cell.
pub fn fill_row(row: &str, values: &[String], renderer: &TemplateRenderer) -> Result<String> {
    let structure = Structure::scan(row);
    let Some(row_region) = structure.of_kind(RegionKind::Row).first().copied() else {
        return Err(DocforgeError::PatternNotMatched("template row markup".into()));
    };
    let cells = structure.owned(row_region.index, RegionKind::Cell, RegionKind::Row);
    if cells.len() < values.len() {
        tracing::warn!(
            cells = cells.len(),
            fields = values.len(),
            "template row has fewer cells than fields; extra fields dropped"
        );
    }

    let mut edits = Vec::new();
    for (cell, value) in cells.iter().zip(values) {
        edits.extend(fill_cell(&structure, row, cell, value, renderer)?);
    }
    Ok(markup::splice_all(row, edits))
}

/// Edits that make `cell` show exactly `value`.
fn fill_cell(
    structure: &Structure,
    text: &str,
    cell: &Region,
    value: &str,
    renderer: &TemplateRenderer,
) -> Result<Vec<(std::ops::Range<usize>, String)>> {
    let escaped = markup::escape(value).into_owned();
    let texts = structure.owned(cell.index, RegionKind::Text, RegionKind::Cell);

    if let Some((first, rest)) = texts.split_first() {
        let mut edits = Vec::with_capacity(texts.len());
        if first.self_closing {
            edits.push((
                first.span.clone(),
                format!(r#"<w:t xml:space="preserve">{escaped}</w:t>"#),
            ));
        } else {
            edits.push((first.inner.clone(), escaped));
        }
        for other in rest.iter().filter(|t| !t.self_closing) {
            edits.push((other.inner.clone(), String::new()));
        }
        return Ok(edits);
    }

    // No text element yet: add a run to the cell's first paragraph.
    let run = renderer.render("text_run", &serde_json::json!({ "text": value }))?;
    let paragraphs = structure.owned(cell.index, RegionKind::Paragraph, RegionKind::Cell);
    let edit = match paragraphs.first() {
        Some(p) if p.self_closing => {
            let open = text[p.span.clone()].trim_end_matches("/>").trim_end();
            (p.span.clone(), format!("{open}>{run}</w:p>"))
        }
        Some(p) => (p.inner.end..p.inner.end, run),
        None => (cell.inner.end..cell.inner.end, format!("<w:p>{run}</w:p>")),
    };
    Ok(vec![edit])
}
