//! The `.docx` container: a ZIP archive whose main markup part is
//! `word/document.xml`.
//!
//! The archive is read fully into memory, parts are replaced by name, and the
//! container is re-serialised with entries in their original order.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{DocforgeError, Result};

/// Name of the main markup part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// MIME type of a WordprocessingML document.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Entry compression used when serialising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(c: Compression) -> Self {
        match c {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// An opened document container.
#[derive(Debug, Clone, Default)]
pub struct DocxArchive {
    entries: Vec<Entry>,
}

impl DocxArchive {
    /// Read every entry of the container at `bytes`.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                data,
            });
        }
        tracing::trace!(entries = entries.len(), "container opened");
        Ok(Self { entries })
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// The text of a part.
    pub fn read_part(&self, name: &str) -> Result<String> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name && !e.is_dir)
            .ok_or_else(|| DocforgeError::MissingPart(name.to_string()))?;
        String::from_utf8(entry.data.clone())
            .map_err(|e| DocforgeError::Other(anyhow::anyhow!("part {name} is not UTF-8: {e}")))
    }

    /// Replace the text of a part, adding it at the end if absent.
    pub fn write_part(&mut self, name: &str, text: &str) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = text.as_bytes().to_vec(),
            None => self.entries.push(Entry {
                name: name.to_string(),
                data: text.as_bytes().to_vec(),
                is_dir: false,
            }),
        }
    }

    /// Write the container back out.
    pub fn serialize(&self, compression: Compression) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(compression.into());
        for entry in &self.entries {
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}
