//! Documents opened from in-memory bytes.

use tracing::debug;

use crate::alloc::Scratch;
use crate::engine::RawHandle;
use crate::error::{Error, Result};
use crate::handle::Owned;
use crate::lifecycle::Module;
use crate::link::Location;
use crate::outline::Outline;
use crate::page::Page;
use crate::util::{read_opt_cstr, write_cstr};

/// An open document.
///
/// Dispose documents explicitly once done with them: the engine keeps the
/// full source bytes alive until the document is released.
#[derive(Debug)]
pub struct Document {
    owned: Owned,
}

impl Document {
    /// Open a document from `data`, using `magic` (a MIME type such as
    /// `"application/pdf"`) to pick the format handler.
    pub fn open(module: &Module, data: &[u8], magic: &str) -> Result<Document> {
        let buffer = Scratch::from_bytes(module, data)?;
        let magic_str = write_cstr(module, magic, "format hint")?;
        let len = buffer.len() as u32;

        let raw = module.call(|e| {
            e.open_document_with_buffer(buffer.offset(), len, magic_str.offset())
        })?;
        // The engine owns the source bytes from here on.
        buffer.into_raw();

        debug!(handle = raw, bytes = data.len(), magic, "opened document");
        Ok(Document {
            owned: Owned::bind(module, raw, "document", |e, h| e.drop_document(h)),
        })
    }

    /// Number of pages. Fails with [`Error::TryLater`] while the document is
    /// still loading.
    pub fn page_count(&self) -> Result<usize> {
        let raw = self.raw();
        let count = self.module().call(|e| e.count_pages(raw))?;
        Ok(count.max(0) as usize)
    }

    /// Load a page by its 1-based page number.
    pub fn load_page(&self, number: usize) -> Result<Page> {
        let index = number
            .checked_sub(1)
            .and_then(|i| i32::try_from(i).ok())
            .ok_or(Error::InvalidPageNumber { number })?;
        let raw = self.raw();
        let page = self.module().call(|e| e.load_page(raw, index))?;
        Ok(Page::bind(self.module(), page))
    }

    /// The document title, if the format records one.
    pub fn title(&self) -> Result<Option<String>> {
        let raw = self.raw();
        let module = self.module();
        let offset = module.call(|e| e.document_title(raw))?;
        module.read(|mem| read_opt_cstr(mem, offset, "document title"))
    }

    /// Load the outline tree. Returns `None` when the document has no outline.
    pub fn load_outline(&self) -> Result<Option<Outline>> {
        let raw = self.raw();
        let root = self.module().call(|e| e.load_outline(raw))?;
        Ok((root != 0).then(|| Outline::bind(self.module(), root)))
    }

    /// Resolve a document-internal URI such as `"#page=3"`.
    ///
    /// Returns `None` when the URI does not point into this document.
    pub fn resolve_uri(&self, uri: &str) -> Result<Option<Location>> {
        let uri = write_cstr(self.module(), uri, "link uri")?;
        Location::resolve(self, uri.offset())
    }

    /// Release the document now instead of waiting for it to be dropped.
    pub fn dispose(&mut self) {
        self.owned.dispose();
    }

    /// The engine handle. Panics after [`Document::dispose`].
    pub fn raw(&self) -> RawHandle {
        self.owned.raw()
    }

    /// The module this document was opened on.
    pub fn module(&self) -> &Module {
        self.owned.module()
    }
}
