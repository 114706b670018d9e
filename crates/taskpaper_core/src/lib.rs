//! TaskPaper outline model.
//! Parses `@tag(value)` annotations and inline links out of item text and
//! keeps them in sync with the text as it is edited.

pub mod document;
pub mod item;
pub mod links;
pub mod logging;
pub mod outline;
pub mod render;
mod splice;
pub mod tags;

pub use document::{Document, DocumentError, DocumentResult};
pub use item::{Item, ItemError, ItemResult, ItemType, DEFAULT_TAB_SIZE};
pub use links::{Link, LinkCollection, LinkError, LinkResult, LinkType};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use outline::{ItemId, Outline, OutlineError, OutlineResult};
pub use render::item_to_html;
pub use tags::{same_tags, Tag, TagCollection, TagError, TagResult, DONE_TAG};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
