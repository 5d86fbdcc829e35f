//! Choosing one table or drawing among several.

use serde::{Deserialize, Serialize};

use super::Region;

/// Ordinal choice of one region among the candidates of a scan.
///
/// Positional selection has no semantic anchor; `AfterText` anchors the choice
/// to visible text that precedes the target instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSelector {
    First,
    Last,
    /// Zero-based position in document order.
    Nth(usize),
    /// First candidate that starts after the first occurrence of this text.
    AfterText(String),
}

impl RegionSelector {
    /// Pick one of `candidates` (in document order) from `text`.
    pub fn select<'a>(&self, candidates: &[&'a Region], text: &str) -> Option<&'a Region> {
        match self {
            Self::First => candidates.first().copied(),
            Self::Last => candidates.last().copied(),
            Self::Nth(n) => candidates.get(*n).copied(),
            Self::AfterText(anchor) => {
                let at = text.find(anchor.as_str())?;
                candidates.iter().copied().find(|r| r.span.start >= at + anchor.len())
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::First => "first".into(),
            Self::Last => "last".into(),
            Self::Nth(n) => format!("#{n}"),
            Self::AfterText(anchor) => format!("after {anchor:?}"),
        }
    }
}
