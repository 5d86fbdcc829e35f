//! Markup snippets used when a pass has to build structure from scratch.
//!
//! Snippets are embedded into the binary at compile-time via [`include_str!`] in the
//! [`embedded`] module, then rendered at runtime with [Handlebars](https://handlebarsjs.com/)
//! via the [`renderer::TemplateRenderer`].
//!
//! ## Snippet variables
//!
//! - `generated_table`: `columns` (`title`, `width`), `rows` (list of cell lists with
//!   `text`, `width`), `total_width`, `header_fill`, `border_size`, `border_color`
//! - `section_paragraph`: `paragraph_open`, `run_open` (raw markup), `text`
//! - `text_run`: `text`
//!
//! `{{value}}` is XML-escaped; `{{{value}}}` inserts markup verbatim and is only used
//! for markup copied from the document itself.
//!
//! ## Adding a new snippet
//!
//! 1. Create the `.xml.hbs` file under `templates/markup/`
//! 2. Add a `pub const` with `include_str!` in [`embedded`] and list it in `embedded::ALL`
//! 3. Run `cargo build` to verify the path resolves
//!
//! Line breaks and indentation in snippet files are for readability only; the renderer
//! strips them before registration so no stray whitespace lands between elements.

pub mod embedded;
pub mod renderer;
