//! Region-by-content replacement of numbered narrative sections.

use std::ops::Range;

use serde_json::json;

use crate::error::{DocforgeError, Result};
use crate::markup::{self, Region, RegionKind, Structure};
use crate::templates::renderer::TemplateRenderer;

use super::Applied;

/// Replace the paragraphs from the one opening with `start` up to (not
/// including) the next one opening with `end` by a single paragraph holding
/// `value`.
///
/// The new paragraph reuses the paragraph properties of the first replaced
/// paragraph and the run properties of its first run.
pub fn replace_section(
    text: &str,
    start: &str,
    end: &str,
    value: &str,
    renderer: &TemplateRenderer,
) -> Result<Applied> {
    let structure = Structure::scan(text);
    let paragraphs: Vec<&Region> = structure
        .of_kind(RegionKind::Paragraph)
        .into_iter()
        .filter(|p| structure.enclosing(p.index, RegionKind::Paragraph).is_none())
        .collect();

    let opens_with = |p: &Region, fragment: &str| {
        structure
            .text_of(text, p.index)
            .trim_start()
            .starts_with(fragment)
    };

    let first = paragraphs
        .iter()
        .position(|p| opens_with(p, start))
        .ok_or_else(|| DocforgeError::PatternNotMatched(format!("section opening {start:?}")))?;
    let head = paragraphs[first];
    // The boundary must be a sibling of the opening paragraph, otherwise the
    // splice would cut through a table or cell.
    let last = paragraphs[first + 1..]
        .iter()
        .position(|p| p.parent == head.parent && opens_with(p, end))
        .map(|offset| first + 1 + offset)
        .ok_or_else(|| DocforgeError::PatternNotMatched(format!("section boundary {end:?}")))?;
    let span = head.span.start..paragraphs[last].span.start;
    if !markup::is_balanced(&text[span.clone()]) {
        return Err(DocforgeError::PatternNotMatched(format!(
            "section {start:?} to {end:?} crosses a container boundary"
        )));
    }
    let count = paragraphs[first..last]
        .iter()
        .filter(|p| p.parent == head.parent)
        .count();

    let (paragraph_open, run_open) = wrappers(&structure, text, head);
    let replacement = renderer.render(
        "section_paragraph",
        &json!({
            "paragraph_open": paragraph_open,
            "run_open": run_open,
            "text": value,
        }),
    )?;

    tracing::debug!(start, end, paragraphs = count, "section replaced");
    Ok(Applied {
        text: markup::splice(text, span, &replacement),
        count,
    })
}

/// Opening markup of `paragraph` and of its first run, each with its
/// leading property element (`w:pPr` / `w:rPr`) when present.
fn wrappers(structure: &Structure, text: &str, paragraph: &Region) -> (String, String) {
    if paragraph.self_closing {
        return ("<w:p>".into(), "<w:r>".into());
    }
    let paragraph_open = with_leading(text, paragraph, "w:pPr");
    let run_open = structure
        .owned(paragraph.index, RegionKind::Run, RegionKind::Paragraph)
        .into_iter()
        .find(|r| !r.self_closing)
        .map(|run| with_leading(text, run, "w:rPr"))
        .unwrap_or_else(|| "<w:r>".into());
    (paragraph_open, run_open)
}

/// Start marker of `region` followed by its first child when that child is `<name>`.
fn with_leading(text: &str, region: &Region, name: &str) -> String {
    let open = &text[region.span.start..region.inner.start];
    let inner = &text[region.inner.clone()];
    let leading = leading_element(inner, name).map_or("", |range| &inner[range]);
    format!("{open}{leading}")
}

fn leading_element(inner: &str, name: &str) -> Option<Range<usize>> {
    let open = format!("<{name}");
    let rest = inner.strip_prefix(open.as_str())?;
    // Reject longer names sharing the prefix (`<w:pPrChange`).
    match rest.chars().next()? {
        '>' | ' ' | '/' => {}
        _ => return None,
    }
    let tag_end = inner.find('>')? + 1;
    if inner[..tag_end].ends_with("/>") {
        return Some(0..tag_end);
    }
    let close = format!("</{name}>");
    let end = inner.find(close.as_str())? + close.len();
    Some(0..end)
}
