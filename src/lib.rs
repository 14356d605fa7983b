//! Safe bindings for a MuPDF document engine living in foreign linear memory.
//!
//! The engine is reached only through numeric handles and byte offsets (see
//! [`Engine`]). This crate owns the bridge around it: handle lifetimes, string
//! and struct marshaling, scratch allocations and traversal of foreign linked
//! lists and trees, exposed as [`Document`], [`Page`], [`Pixmap`] and friends.
//!
//! # Getting Started
//!
//! ```ignore
//! let module = Module::ready(|| async { load_engine().await }).await?;
//! let doc = Document::open(&module, &bytes, "application/pdf")?;
//! let page = doc.load_page(1)?;
//! let hits = page.search("needle")?;
//! ```
//!
//! # Thread Safety
//!
//! Nothing here is `Send` or `Sync`. The engine is single-threaded and not
//! re-entrant; every object must be used on the thread that made the
//! [`Module`] ready.
//!
//! # Memory Management
//!
//! - Owned objects release their handle when dropped, or earlier through
//!   `dispose()`. Dispose documents, pixmaps and buffers explicitly: each pins
//!   a large foreign allocation.
//! - Using an object after `dispose()` panics. Disposing twice panics in debug
//!   builds.
//! - Links, annotations and outline items borrow their parent and are never
//!   released on their own.
//! - Strings returned by the engine are copied into host `String`s.

mod alloc;
mod annotation;
mod buffer;
mod document;
mod engine;
mod error;
mod geometry;
mod handle;
mod lifecycle;
mod link;
mod outline;
mod page;
mod pixmap;
mod search;
mod stext;
mod traverse;
mod util;

#[cfg(test)]
mod mock;

pub use alloc::Scratch;
pub use annotation::Annotation;
pub use buffer::{Buffer, Output};
pub use document::Document;
pub use engine::{Engine, Offset, RawHandle};
pub use error::{EngineError, EngineErrorKind, EngineResult, Error, ErrorCode, Result};
pub use geometry::{IRect, Matrix, Quad, Rect};
pub use handle::{Owned, Release};
pub use lifecycle::{ColorSpace, ColorSpaceKind, ColorSpaces, Module};
pub use link::{Link, Links, Location};
pub use outline::{Outline, OutlineEntry, OutlineItem};
pub use page::{Page, PdfPage};
pub use pixmap::{Pixmap, RenderOptions};
pub use search::SearchOptions;
pub use stext::{BBox, Block, Font, Line, StructuredText, TextOptions, TextPage};
pub use util::{encoded_len, write_cstr};

/// Library version string (e.g. "0.1.0").
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
