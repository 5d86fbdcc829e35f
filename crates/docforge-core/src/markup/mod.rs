//! Markup document model.
//!
//! The engine's working state is a single WordprocessingML string. The
//! [`scanner`] turns it into typed regions with byte spans, [`select`] picks
//! one region out of a scan, and the helpers here rewrite the string at
//! exact offsets.
//!
//! ## Invariant
//!
//! Every rewrite replaces whole regions or the inner content of a text
//! element, so start/end markers stay paired after each pass.

pub mod scanner;
pub mod select;

use std::borrow::Cow;
use std::ops::Range;

use quick_xml::events::Event;
use quick_xml::Reader;

pub use scanner::{Region, RegionKind, Structure};
pub use select::RegionSelector;

/// Escape `&`, `<`, `>`, `"` and `'` for insertion into markup.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Replace several non-overlapping ranges of `text` in one go.
///
/// Edits may be given in any order; they are applied back to front so the
/// offsets of earlier edits stay valid.
pub fn splice_all(text: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));
    let mut out = text.to_string();
    for (range, replacement) in edits {
        out.replace_range(range, &replacement);
    }
    out
}

/// Replace exactly one span, leaving every other byte untouched.
pub fn splice(text: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() - range.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}

/// Whether every start marker in `fragment` is closed inside it and no end
/// marker closes an element opened before it.
pub fn is_balanced(fragment: &str) -> bool {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().check_end_names = false;
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Ok(Event::Eof) => return depth == 0,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}
