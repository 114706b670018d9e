//! Whole-document assembly and file round-trip.
//!
//! # Responsibility
//! - Split text into one item per line and keep them in document order.
//! - Read a document from disk and write it back atomically.
//!
//! # Invariants
//! - Item order is line order; indentation is never turned into nesting.
//! - Writes go to a sibling temp file that is renamed over the target.

use crate::item::{Item, DEFAULT_TAB_SIZE};
use crate::outline::{ItemId, Outline, OutlineError, OutlineResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = ".tmp";

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors from document I/O and assembly.
#[derive(Debug)]
pub enum DocumentError {
    /// Underlying file could not be read.
    ReadFailure { path: PathBuf, source: io::Error },
    /// Document could not be written or moved into place.
    WriteFailure { path: PathBuf, source: io::Error },
    /// `write` was called on a document that was never bound to a path.
    MissingPath,
    /// Outline-level failure.
    Outline(OutlineError),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailure { path, source } => {
                write!(f, "unable to read document `{}`: {source}", path.display())
            }
            Self::WriteFailure { path, source } => {
                write!(f, "unable to write document `{}`: {source}", path.display())
            }
            Self::MissingPath => write!(f, "document has no path to write to"),
            Self::Outline(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFailure { source, .. } | Self::WriteFailure { source, .. } => Some(source),
            Self::Outline(err) => Some(err),
            Self::MissingPath => None,
        }
    }
}

impl From<OutlineError> for DocumentError {
    fn from(value: OutlineError) -> Self {
        Self::Outline(value)
    }
}

/// Ordered list of items backed by an outline.
#[derive(Debug, Clone, Default)]
pub struct Document {
    path: Option<PathBuf>,
    outline: Outline,
    order: Vec<ItemId>,
}

impl Document {
    /// Builds a document with one item per line of `text`.
    pub fn parse(text: &str) -> Self {
        Self::parse_with_tab_size(text, DEFAULT_TAB_SIZE)
    }

    pub fn parse_with_tab_size(text: &str, tab_size: usize) -> Self {
        let mut document = Self::default();
        for line in text.lines() {
            document.push_root(Item::with_tab_size(line, tab_size));
        }
        document
    }

    /// Reads and parses the file at `path`, remembering it for [`Document::write`].
    ///
    /// # Errors
    /// - `ReadFailure` when the file cannot be read as UTF-8 text.
    pub fn open(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            warn!(
                "event=document_read module=document status=error path={} error={}",
                path.display(),
                source
            );
            DocumentError::ReadFailure {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut document = Self::parse(&text);
        document.path = Some(path.to_path_buf());
        info!(
            "event=document_read module=document status=ok path={} items={}",
            path.display(),
            document.len()
        );
        Ok(document)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Item handles in document order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Items in document order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.outline.item(*id).ok())
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Mutable outline access, for reparenting and editing items.
    pub fn outline_mut(&mut self) -> &mut Outline {
        &mut self.outline
    }

    /// Appends an unattached item at the end of the document.
    pub fn push_root(&mut self, item: Item) -> ItemId {
        let id = self.outline.insert_root(item);
        self.order.push(id);
        id
    }

    /// Appends an item at the end of the document, attached to `parent`.
    ///
    /// # Errors
    /// - `ItemNotFound` when `parent` is unknown.
    pub fn push(&mut self, item: Item, parent: Option<ItemId>) -> OutlineResult<ItemId> {
        let id = self.outline.insert(item, parent)?;
        self.order.push(id);
        Ok(id)
    }

    /// HTML of every item in document order, one per line.
    pub fn to_html(&self) -> DocumentResult<String> {
        let rendered = self
            .order
            .iter()
            .map(|id| self.outline.to_html(*id))
            .collect::<OutlineResult<Vec<_>>>()?;
        Ok(rendered.join("\n"))
    }

    /// Writes the document back to the path it was opened from.
    ///
    /// # Errors
    /// - `MissingPath` for documents built with [`Document::parse`].
    /// - `WriteFailure` on I/O errors; the original file is left in place.
    pub fn write(&self) -> DocumentResult<()> {
        let path = self.path.as_deref().ok_or(DocumentError::MissingPath)?;
        self.write_to(path)
    }

    /// Atomically writes the document to `path`.
    ///
    /// # Errors
    /// - `WriteFailure` on I/O errors.
    pub fn write_to(&self, path: impl AsRef<Path>) -> DocumentResult<()> {
        let path = path.as_ref();
        let temp_path = temp_path_for(path);
        let write_failure = |source: io::Error| {
            warn!(
                "event=document_write module=document status=error path={} error={}",
                path.display(),
                source
            );
            DocumentError::WriteFailure {
                path: path.to_path_buf(),
                source,
            }
        };

        fs::write(&temp_path, self.to_string()).map_err(write_failure)?;
        if let Err(source) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_failure(source));
        }

        info!(
            "event=document_write module=document status=ok path={} items={}",
            path.display(),
            self.len()
        );
        Ok(())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, item) in self.items().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::{temp_path_for, Document};
    use std::path::Path;

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path_for(Path::new("/tmp/todo.taskpaper")),
            Path::new("/tmp/todo.taskpaper.tmp")
        );
    }

    #[test]
    fn indentation_does_not_nest() {
        let document = Document::parse("Project:\n\t- child");
        let outline = document.outline();
        assert_eq!(outline.roots().len(), 2);
        assert_eq!(document.to_string(), "Project:\n\t- child");
    }
}
