//! Compile-time embedded markup snippets.
//!
//! Each constant loads a snippet from `templates/markup/` via [`include_str!`]. The paths
//! are relative to this source file (`crates/docforge-core/src/templates/embedded.rs`).
//!
//! Do NOT rename or move snippet files without updating the `include_str!` path here.

pub const GENERATED_TABLE: &str = include_str!("../../../../templates/markup/generated_table.xml.hbs");
pub const SECTION_PARAGRAPH: &str = include_str!("../../../../templates/markup/section_paragraph.xml.hbs");
pub const TEXT_RUN: &str = include_str!("../../../../templates/markup/text_run.xml.hbs");

/// Registration names and sources, registered by the renderer on construction.
pub const ALL: &[(&str, &str)] = &[
    ("generated_table", GENERATED_TABLE),
    ("section_paragraph", SECTION_PARAGRAPH),
    ("text_run", TEXT_RUN),
];
