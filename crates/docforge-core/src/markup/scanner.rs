//! Tolerant structural scanner over WordprocessingML markup.
//!
//! Walks the markup once with [`quick_xml`] and records every region of interest
//! (paragraph, run, text, table, row, cell, drawing) as a byte span into the
//! original string together with its nearest tracked ancestor. Passes select
//! regions from this flat list instead of matching nested patterns, so the
//! exact offsets of a selected occurrence are always known.
//!
//! Scanning never fails: if the parser gives up part-way (ill-formed input),
//! the regions closed so far are kept and the rest of the document is ignored.

use std::ops::Range;

use quick_xml::events::Event;
use quick_xml::Reader;

/// The kinds of markup region the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// `<w:p>`
    Paragraph,
    /// `<w:r>`
    Run,
    /// `<w:t>`
    Text,
    /// `<w:tbl>`
    Table,
    /// `<w:tr>`
    Row,
    /// `<w:tc>`
    Cell,
    /// `<w:drawing>`
    Drawing,
}

impl RegionKind {
    /// Map a qualified element name to a region kind.
    pub fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"w:p" => Some(Self::Paragraph),
            b"w:r" => Some(Self::Run),
            b"w:t" => Some(Self::Text),
            b"w:tbl" => Some(Self::Table),
            b"w:tr" => Some(Self::Row),
            b"w:tc" => Some(Self::Cell),
            b"w:drawing" => Some(Self::Drawing),
            _ => None,
        }
    }
}

/// One located region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Position in [`Structure::regions`] (document order of the start marker).
    pub index: usize,
    pub kind: RegionKind,
    /// From the first byte of the start marker to one past the end marker.
    pub span: Range<usize>,
    /// Content between the start and end markers. Empty for `<x/>` elements.
    pub inner: Range<usize>,
    /// Nearest enclosing tracked region.
    pub parent: Option<usize>,
    /// Written as a single `<x/>` element.
    pub self_closing: bool,
}

impl Region {
    pub fn contains(&self, other: &Region) -> bool {
        self.span.start <= other.span.start && other.span.end <= self.span.end
    }
}

/// The typed regions of one markup string.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    regions: Vec<Region>,
}

impl Structure {
    /// Scan `text` and record all tracked regions.
    pub fn scan(text: &str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.config_mut().check_end_names = false;

        let mut regions: Vec<Region> = Vec::new();
        // Indices into `regions` whose end marker has not been seen yet.
        let mut open: Vec<usize> = Vec::new();

        loop {
            let start = reader.buffer_position() as usize;
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(offset = start, error = %e, "markup scan stopped early");
                    break;
                }
            };
            let end = reader.buffer_position() as usize;

            match event {
                Event::Start(tag) => {
                    if let Some(kind) = RegionKind::from_tag(tag.name().as_ref()) {
                        let index = regions.len();
                        regions.push(Region {
                            index,
                            kind,
                            span: start..end,
                            inner: end..end,
                            parent: open.last().copied(),
                            self_closing: false,
                        });
                        open.push(index);
                    }
                }
                Event::Empty(tag) => {
                    if let Some(kind) = RegionKind::from_tag(tag.name().as_ref()) {
                        let index = regions.len();
                        regions.push(Region {
                            index,
                            kind,
                            span: start..end,
                            inner: end..end,
                            parent: open.last().copied(),
                            self_closing: true,
                        });
                    }
                }
                Event::End(tag) => {
                    if let Some(kind) = RegionKind::from_tag(tag.name().as_ref()) {
                        // Close the innermost open region of this kind; anything
                        // opened after it was never closed and ends here too.
                        if let Some(pos) = open.iter().rposition(|&i| regions[i].kind == kind) {
                            for &unclosed in &open[pos + 1..] {
                                regions[unclosed].span.end = start;
                                regions[unclosed].inner.end = start;
                            }
                            let idx = open[pos];
                            open.truncate(pos);
                            regions[idx].inner.end = start;
                            regions[idx].span.end = end;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        // Regions still open at EOF cannot be spliced safely.
        if !open.is_empty() {
            tracing::warn!(unclosed = open.len(), "markup contains unclosed regions");
            let dropped: Vec<usize> = open;
            let keep: Vec<bool> = (0..regions.len()).map(|i| !dropped.contains(&i)).collect();
            regions = reindex(regions, &keep);
        }

        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<&Region> {
        self.regions.get(index)
    }

    /// All regions of one kind, in document order.
    pub fn of_kind(&self, kind: RegionKind) -> Vec<&Region> {
        self.regions.iter().filter(|r| r.kind == kind).collect()
    }

    /// Tables that are not nested inside another table.
    pub fn tables(&self) -> Vec<&Region> {
        self.regions
            .iter()
            .filter(|r| r.kind == RegionKind::Table)
            .filter(|r| self.enclosing(r.index, RegionKind::Table).is_none())
            .collect()
    }

    /// Nearest ancestor of `kind` for the region at `index`.
    pub fn enclosing(&self, index: usize, kind: RegionKind) -> Option<&Region> {
        let mut current = self.regions.get(index)?.parent;
        while let Some(i) = current {
            let region = &self.regions[i];
            if region.kind == kind {
                return Some(region);
            }
            current = region.parent;
        }
        None
    }

    /// Regions of `kind` whose nearest `owner_kind` ancestor is `owner`.
    ///
    /// `owned(table, Row, Table)` yields the rows of `table` but not the rows
    /// of a table nested in one of its cells.
    pub fn owned(&self, owner: usize, kind: RegionKind, owner_kind: RegionKind) -> Vec<&Region> {
        self.regions
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| self.enclosing(r.index, owner_kind).map(|o| o.index) == Some(owner))
            .collect()
    }

    /// Visible text of a region: the concatenated, unescaped content of its text elements.
    pub fn text_of(&self, text: &str, index: usize) -> String {
        let Some(region) = self.regions.get(index) else {
            return String::new();
        };
        self.regions
            .iter()
            .filter(|r| r.kind == RegionKind::Text && region.contains(r))
            .map(|r| unescape_lossy(&text[r.inner.clone()]))
            .collect()
    }
}

fn unescape_lossy(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Drop regions and renumber indices and parent links.
fn reindex(regions: Vec<Region>, keep: &[bool]) -> Vec<Region> {
    let mut mapping = vec![None; regions.len()];
    let mut next = 0;
    for (i, kept) in keep.iter().enumerate() {
        if *kept {
            mapping[i] = Some(next);
            next += 1;
        }
    }

    let parents: Vec<Option<usize>> = regions.iter().map(|r| r.parent).collect();
    let resolve = |mut parent: Option<usize>| {
        while let Some(p) = parent {
            if let Some(mapped) = mapping[p] {
                return Some(mapped);
            }
            parent = parents[p];
        }
        None
    };

    regions
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .map(|(i, mut region)| {
            region.index = mapping[i].unwrap_or(region.index);
            region.parent = resolve(parents[i]);
            region
        })
        .collect()
}
