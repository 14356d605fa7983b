//! The foreign engine contract.
//!
//! The document engine lives in its own linear memory and is reachable only
//! through numeric handles and byte offsets. [`Engine`] is the flat set of
//! entry points the bridge relies on. Implementations typically forward to a
//! WebAssembly instance; the bridge never looks inside a handle.
//!
//! Conventions:
//!
//! - `0` is the null handle and the null offset.
//! - Offsets returned by `bound_*`, `*_rect`, `*_bbox` point at scratch
//!   records owned by the engine and are only valid until the next call.
//! - Strings returned by `document_title`, `outline_title`,
//!   `pdf_annot_type_string` and `link_uri` are owned by the engine; the bridge
//!   never frees them.
//! - Entry points are called strictly one at a time.

use crate::error::EngineResult;

/// Opaque identity of an object in foreign memory.
pub type RawHandle = u32;

/// Byte offset into the engine's linear memory.
pub type Offset = u32;

/// Entry points of the foreign document engine.
pub trait Engine {
    /// The whole linear memory region.
    fn memory(&self) -> &[u8];
    /// Mutable access to the linear memory region, for copying bytes in.
    fn memory_mut(&mut self) -> &mut [u8];

    /// Allocate `size` bytes. Returns `0` when the allocator is exhausted.
    fn malloc(&mut self, size: u32) -> Offset;
    /// Release an allocation made with [`Engine::malloc`].
    fn free(&mut self, offset: Offset);

    /// One-time global context initialization.
    fn init_context(&mut self) -> EngineResult<()>;

    /// Standard device color spaces. Owned by the engine for the process lifetime;
    /// never released.
    fn device_gray(&mut self) -> RawHandle;
    fn device_rgb(&mut self) -> RawHandle;
    fn device_bgr(&mut self) -> RawHandle;
    fn device_cmyk(&mut self) -> RawHandle;

    /// Open a document from `len` bytes at `data`. On success the engine takes
    /// ownership of the `data` allocation and frees it with the document.
    fn open_document_with_buffer(
        &mut self,
        data: Offset,
        len: u32,
        magic: Offset,
    ) -> EngineResult<RawHandle>;
    /// Release a document and the source bytes it took over.
    fn drop_document(&mut self, doc: RawHandle);
    /// Number of pages. Fails with `TryLater` while the data is still arriving.
    fn count_pages(&mut self, doc: RawHandle) -> EngineResult<i32>;
    /// Load the page at 0-based `index`.
    ///
    /// # Ownership
    ///
    /// The caller owns the returned page and releases it with [`Engine::drop_page`].
    fn load_page(&mut self, doc: RawHandle, index: i32) -> EngineResult<RawHandle>;
    /// NUL-terminated title in static engine memory, or `0` when untitled.
    fn document_title(&mut self, doc: RawHandle) -> EngineResult<Offset>;
    /// Root of the outline tree, or `0` when the document has none.
    ///
    /// # Ownership
    ///
    /// The caller owns the root only; [`Engine::drop_outline`] on it frees the tree.
    fn load_outline(&mut self, doc: RawHandle) -> EngineResult<RawHandle>;

    /// Release a page, together with its paginated-format view and annotations.
    fn drop_page(&mut self, page: RawHandle);
    /// Offset of a 16-byte `[x0 y0 x1 y1]` record in engine scratch.
    fn bound_page(&mut self, page: RawHandle) -> EngineResult<Offset>;
    /// Render under the 6-float `ctm` into `colorspace`. The caller owns the
    /// returned pixmap.
    fn new_pixmap_from_page(
        &mut self,
        page: RawHandle,
        ctm: [f32; 6],
        colorspace: RawHandle,
        alpha: bool,
    ) -> EngineResult<RawHandle>;
    /// Extract structured text. The caller owns the returned text page.
    fn new_stext_page_from_page(&mut self, page: RawHandle) -> EngineResult<RawHandle>;
    /// Head of the page's link chain, or `0`.
    ///
    /// # Ownership
    ///
    /// The caller owns the head; [`Engine::drop_link`] on it frees the chain.
    fn load_links(&mut self, page: RawHandle) -> EngineResult<RawHandle>;
    /// Writes up to `max_hits` quads at `hits` and returns how many were found.
    fn search_page(
        &mut self,
        page: RawHandle,
        needle: Offset,
        hits: Offset,
        max_hits: i32,
    ) -> EngineResult<i32>;

    /// The paginated-format view of a page, or `0` for other formats. The
    /// returned handle shares the page's lifetime.
    fn pdf_page_from_fz_page(&mut self, page: RawHandle) -> RawHandle;
    /// First annotation of a paginated-format page, or `0`. Annotations are
    /// owned by the page.
    fn pdf_first_annot(&mut self, pdf_page: RawHandle) -> RawHandle;
    /// Next annotation in the chain, or `0`.
    fn pdf_next_annot(&mut self, annot: RawHandle) -> RawHandle;
    /// Offset of the annotation's rect record in engine scratch.
    fn pdf_bound_annot(&mut self, annot: RawHandle) -> EngineResult<Offset>;
    /// NUL-terminated subtype name in static engine memory.
    fn pdf_annot_type_string(&mut self, annot: RawHandle) -> EngineResult<Offset>;

    /// Next link in the chain, or `0`.
    fn next_link(&mut self, link: RawHandle) -> RawHandle;
    /// Drops the link and every link chained after it.
    fn drop_link(&mut self, link: RawHandle);
    /// Offset of the link's rect record in engine scratch.
    fn link_rect(&mut self, link: RawHandle) -> Offset;
    /// True when the URI has a scheme, i.e. points outside the document.
    fn is_external_link(&mut self, link: RawHandle) -> bool;
    /// NUL-terminated URI, owned by the link.
    fn link_uri(&mut self, link: RawHandle) -> Offset;
    /// Target chapter and page of a document-internal URI; negative when it
    /// does not resolve.
    fn resolve_link_chapter(&mut self, doc: RawHandle, uri: Offset) -> EngineResult<i32>;
    fn resolve_link_page(&mut self, doc: RawHandle, uri: Offset) -> EngineResult<i32>;

    /// 0-based target page of an outline node; negative when it has none.
    fn outline_page(&mut self, doc: RawHandle, outline: RawHandle) -> EngineResult<i32>;
    /// NUL-terminated title owned by the node, or `0`.
    fn outline_title(&mut self, outline: RawHandle) -> Offset;
    /// First child, or `0`.
    fn outline_down(&mut self, outline: RawHandle) -> RawHandle;
    /// Next sibling, or `0`.
    fn outline_next(&mut self, outline: RawHandle) -> RawHandle;
    /// Drops the node, its children and its following siblings.
    fn drop_outline(&mut self, outline: RawHandle);

    /// Release a pixmap and its samples.
    fn drop_pixmap(&mut self, pixmap: RawHandle);
    /// Offset of a 16-byte `i32` bbox record in engine scratch.
    fn pixmap_bbox(&mut self, pixmap: RawHandle) -> Offset;
    fn pixmap_stride(&mut self, pixmap: RawHandle) -> i32;
    /// Start of `stride * height` sample bytes, owned by the pixmap.
    fn pixmap_samples(&mut self, pixmap: RawHandle) -> Offset;
    /// Encode as PNG into a new buffer the caller owns.
    fn new_buffer_from_pixmap_as_png(&mut self, pixmap: RawHandle) -> EngineResult<RawHandle>;

    /// New empty buffer. The caller owns it and releases it with
    /// [`Engine::drop_buffer`].
    fn new_buffer(&mut self, capacity: u32) -> EngineResult<RawHandle>;
    /// New buffer holding a copy of `len` bytes at `data`.
    fn new_buffer_from_data(&mut self, data: Offset, len: u32) -> EngineResult<RawHandle>;
    fn drop_buffer(&mut self, buffer: RawHandle);
    /// Start of the buffer contents. Invalidated by any resize.
    fn buffer_data(&mut self, buffer: RawHandle) -> Offset;
    fn buffer_size(&mut self, buffer: RawHandle) -> u32;
    fn buffer_capacity(&mut self, buffer: RawHandle) -> u32;
    /// Reallocate to exactly `capacity`, truncating the contents if needed.
    fn resize_buffer(&mut self, buffer: RawHandle, capacity: u32) -> EngineResult<()>;
    fn grow_buffer(&mut self, buffer: RawHandle) -> EngineResult<()>;
    fn trim_buffer(&mut self, buffer: RawHandle) -> EngineResult<()>;
    fn clear_buffer(&mut self, buffer: RawHandle);

    /// New output appending to `buffer`. The caller owns it; close before
    /// reading the buffer and release with [`Engine::drop_output`].
    fn new_output_with_buffer(&mut self, buffer: RawHandle) -> EngineResult<RawHandle>;
    fn close_output(&mut self, output: RawHandle) -> EngineResult<()>;
    fn drop_output(&mut self, output: RawHandle);

    /// Release a structured text page.
    fn drop_stext_page(&mut self, stext: RawHandle);
    /// Print `stext` as JSON to `output`, with coordinates multiplied by `scale`.
    fn print_stext_page_as_json(
        &mut self,
        output: RawHandle,
        stext: RawHandle,
        scale: f32,
    ) -> EngineResult<()>;
}
