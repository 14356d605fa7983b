//! In-memory engine for tests.
//!
//! Documents are JSON descriptions of pages, words, links, annotations and an
//! outline. Objects live in a handle table, strings and buffers in a `Vec<u8>`
//! linear memory with a bump allocator. Releasing an unknown handle or freeing
//! an unknown offset panics, so double releases show up as test failures.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::json;

use crate::engine::{Engine, Offset, RawHandle};
use crate::error::{EngineError, EngineResult};

const MEMORY_SIZE: usize = 8 << 20;
/// Engine-owned record area returned by `bound_*`, `*_rect` and `*_bbox`.
const RECORD: Offset = 16;
const HEAP_START: Offset = 128;

const GRAY: RawHandle = 1;
const RGB: RawHandle = 2;
const BGR: RawHandle = 3;
const CMYK: RawHandle = 4;

#[derive(Debug, Clone, Deserialize)]
struct DocDef {
    #[serde(default)]
    title: Option<String>,
    pages: Vec<PageDef>,
    #[serde(default)]
    outline: Vec<OutlineDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct PageDef {
    width: f32,
    height: f32,
    #[serde(default)]
    words: Vec<WordDef>,
    #[serde(default)]
    links: Vec<LinkDef>,
    #[serde(default)]
    annots: Vec<AnnotDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct WordDef {
    text: String,
    rect: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
struct LinkDef {
    rect: [f32; 4],
    uri: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AnnotDef {
    #[serde(rename = "type")]
    kind: String,
    rect: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
struct OutlineDef {
    title: String,
    page: i32,
    #[serde(default)]
    children: Vec<OutlineDef>,
}

enum Obj {
    Document {
        pages: Vec<PageDef>,
        outline: Vec<OutlineDef>,
        title: Offset,
        data: Offset,
        pdf: bool,
    },
    Page {
        def: PageDef,
        pdf: RawHandle,
    },
    PdfPage {
        first_annot: RawHandle,
    },
    Annot {
        rect: [f32; 4],
        kind: Offset,
        next: RawHandle,
    },
    Link {
        rect: [f32; 4],
        uri: Offset,
        next: RawHandle,
    },
    Outline {
        title: Offset,
        page: i32,
        down: RawHandle,
        next: RawHandle,
    },
    Pixmap {
        bbox: [i32; 4],
        stride: i32,
        samples: Offset,
    },
    Buffer {
        data: Offset,
        len: u32,
        cap: u32,
    },
    Output {
        buffer: RawHandle,
        closed: bool,
    },
    StextPage {
        words: Vec<WordDef>,
    },
}

#[derive(Default)]
struct ProbeState {
    pending: Cell<bool>,
    fail_init: Cell<bool>,
    init_calls: Cell<u32>,
    releases: RefCell<HashMap<&'static str, u32>>,
    live_allocations: Cell<usize>,
    live_objects: Cell<usize>,
}

/// Test-side view of a [`MockEngine`]'s bookkeeping.
#[derive(Clone)]
pub(crate) struct Probe(Rc<ProbeState>);

impl Probe {
    pub fn init_calls(&self) -> u32 {
        self.0.init_calls.get()
    }

    /// Number of bridge-issued `drop_*` calls for `kind`.
    pub fn releases(&self, kind: &str) -> u32 {
        self.0.releases.borrow().get(kind).copied().unwrap_or(0)
    }

    /// Bridge allocations not yet freed (engine-owned memory excluded).
    pub fn live_allocations(&self) -> usize {
        self.0.live_allocations.get()
    }

    /// Objects in the handle table.
    pub fn live_objects(&self) -> usize {
        self.0.live_objects.get()
    }

    /// Simulate a progressively loading document whose data has not arrived.
    pub fn set_pending(&self, pending: bool) {
        self.0.pending.set(pending);
    }

    pub fn fail_init(&self) {
        self.0.fail_init.set(true);
    }
}

pub(crate) struct MockEngine {
    memory: Vec<u8>,
    top: Offset,
    bridge_allocs: HashMap<Offset, u32>,
    engine_allocs: HashMap<Offset, u32>,
    objects: HashMap<RawHandle, Obj>,
    next_handle: RawHandle,
    probe: Rc<ProbeState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            memory: vec![0; MEMORY_SIZE],
            top: HEAP_START,
            bridge_allocs: HashMap::new(),
            engine_allocs: HashMap::new(),
            objects: HashMap::new(),
            next_handle: 0x1000,
            probe: Rc::new(ProbeState::default()),
        }
    }

    pub fn probe(&self) -> Probe {
        Probe(Rc::clone(&self.probe))
    }

    fn bump(&mut self, size: u32) -> Offset {
        let offset = self.top;
        let end = offset as usize + size as usize;
        if end > MEMORY_SIZE {
            return 0;
        }
        self.top = ((end + 7) & !7) as Offset;
        offset
    }

    fn alloc_engine(&mut self, size: u32) -> Offset {
        let offset = self.bump(size.max(1));
        assert_ne!(offset, 0, "mock engine out of memory");
        self.engine_allocs.insert(offset, size);
        offset
    }

    fn free_engine(&mut self, offset: Offset) {
        if offset != 0 {
            assert!(
                self.engine_allocs.remove(&offset).is_some(),
                "engine memory {offset:#x} freed twice"
            );
        }
    }

    fn intern(&mut self, s: &str) -> Offset {
        let offset = self.alloc_engine(s.len() as u32 + 1);
        let at = offset as usize;
        self.memory[at..at + s.len()].copy_from_slice(s.as_bytes());
        self.memory[at + s.len()] = 0;
        offset
    }

    fn cstr(&self, offset: Offset) -> String {
        let at = offset as usize;
        let end = at + self.memory[at..].iter().position(|&b| b == 0).unwrap_or(0);
        String::from_utf8_lossy(&self.memory[at..end]).into_owned()
    }

    fn write_f32s(&mut self, at: Offset, values: &[f32]) {
        for (i, v) in values.iter().enumerate() {
            let p = at as usize + 4 * i;
            self.memory[p..p + 4].copy_from_slice(&v.to_le_bytes());
        }
    }

    fn write_record(&mut self, values: &[f32]) -> Offset {
        self.write_f32s(RECORD, values);
        RECORD
    }

    fn insert(&mut self, obj: Obj) -> RawHandle {
        let handle = self.next_handle;
        self.next_handle += 0x10;
        self.objects.insert(handle, obj);
        self.probe.live_objects.set(self.objects.len());
        handle
    }

    fn remove(&mut self, handle: RawHandle) -> Obj {
        let obj = self
            .objects
            .remove(&handle)
            .unwrap_or_else(|| panic!("handle {handle:#x} released twice or never allocated"));
        self.probe.live_objects.set(self.objects.len());
        obj
    }

    fn obj(&self, handle: RawHandle) -> &Obj {
        self.objects
            .get(&handle)
            .unwrap_or_else(|| panic!("use of invalid handle {handle:#x}"))
    }

    fn count_release(&self, kind: &'static str) {
        *self.probe.releases.borrow_mut().entry(kind).or_default() += 1;
    }

    fn pending(&self) -> EngineResult<()> {
        if self.probe.pending.get() {
            return Err(EngineError::try_later("document data not yet available"));
        }
        Ok(())
    }

    fn page_def(&self, page: RawHandle) -> &PageDef {
        match self.obj(page) {
            Obj::Page { def, .. } => def,
            _ => panic!("{page:#x} is not a page"),
        }
    }

    fn build_outline(&mut self, items: &[OutlineDef]) -> RawHandle {
        let mut next = 0;
        for item in items.iter().rev() {
            let down = self.build_outline(&item.children);
            let title = self.intern(&item.title);
            next = self.insert(Obj::Outline {
                title,
                page: item.page,
                down,
                next,
            });
        }
        next
    }

    fn free_outline(&mut self, mut node: RawHandle) {
        while node != 0 {
            let Obj::Outline { title, down, next, .. } = self.remove(node) else {
                panic!("{node:#x} is not an outline node");
            };
            self.free_engine(title);
            self.free_outline(down);
            node = next;
        }
    }

    fn append(&mut self, buffer: RawHandle, bytes: &[u8]) -> EngineResult<()> {
        let (len, cap) = match self.obj(buffer) {
            Obj::Buffer { len, cap, .. } => (*len, *cap),
            _ => return Err(EngineError::generic("not a buffer")),
        };
        let needed = len + bytes.len() as u32;
        if needed > cap {
            self.resize_buffer(buffer, needed.max(cap * 3 / 2))?;
        }
        if let Some(Obj::Buffer { data, len, .. }) = self.objects.get_mut(&buffer) {
            let at = (*data + *len) as usize;
            self.memory[at..at + bytes.len()].copy_from_slice(bytes);
            *len += bytes.len() as u32;
        }
        Ok(())
    }

    fn new_buffer_with(&mut self, bytes: &[u8]) -> RawHandle {
        let cap = bytes.len() as u32;
        let data = self.alloc_engine(cap);
        let at = data as usize;
        self.memory[at..at + bytes.len()].copy_from_slice(bytes);
        self.insert(Obj::Buffer {
            data,
            len: cap,
            cap,
        })
    }
}

fn is_external(uri: &str) -> bool {
    let mut chars = uri.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    for c in chars {
        if c == ':' {
            return true;
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
            return false;
        }
    }
    false
}

fn page_target(uri: &str) -> Option<i32> {
    uri.strip_prefix("#page=")?.parse::<i32>().ok().map(|n| n - 1)
}

impl Engine for MockEngine {
    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn malloc(&mut self, size: u32) -> Offset {
        let offset = self.bump(size);
        if offset != 0 {
            self.bridge_allocs.insert(offset, size);
            self.probe.live_allocations.set(self.bridge_allocs.len());
        }
        offset
    }

    fn free(&mut self, offset: Offset) {
        assert!(
            !self.engine_allocs.contains_key(&offset),
            "bridge freed engine-owned memory at {offset:#x}"
        );
        assert!(
            self.bridge_allocs.remove(&offset).is_some(),
            "memory {offset:#x} freed twice or never allocated"
        );
        self.probe.live_allocations.set(self.bridge_allocs.len());
    }

    fn init_context(&mut self) -> EngineResult<()> {
        self.probe.init_calls.set(self.probe.init_calls.get() + 1);
        if self.probe.fail_init.get() {
            return Err(EngineError::generic("cannot create context"));
        }
        Ok(())
    }

    fn device_gray(&mut self) -> RawHandle {
        GRAY
    }

    fn device_rgb(&mut self) -> RawHandle {
        RGB
    }

    fn device_bgr(&mut self) -> RawHandle {
        BGR
    }

    fn device_cmyk(&mut self) -> RawHandle {
        CMYK
    }

    fn open_document_with_buffer(
        &mut self,
        data: Offset,
        len: u32,
        magic: Offset,
    ) -> EngineResult<RawHandle> {
        let magic = self.cstr(magic);
        if !matches!(
            magic.as_str(),
            "application/pdf" | "application/epub+zip" | "application/x-cbz"
        ) {
            return Err(EngineError::generic(format!("unsupported format: {magic}")));
        }
        let at = data as usize;
        let def: DocDef = serde_json::from_slice(&self.memory[at..at + len as usize])
            .map_err(|e| EngineError::generic(format!("cannot open document: {e}")))?;

        let size = self
            .bridge_allocs
            .remove(&data)
            .expect("document data must be a bridge allocation");
        self.probe.live_allocations.set(self.bridge_allocs.len());
        self.engine_allocs.insert(data, size);

        let title = match &def.title {
            Some(t) => self.intern(t),
            None => 0,
        };
        let pdf = magic == "application/pdf";
        let pages = def
            .pages
            .into_iter()
            .map(|mut p| {
                if !pdf {
                    p.annots.clear();
                }
                p
            })
            .collect();
        let doc = self.insert(Obj::Document {
            pages,
            outline: def.outline,
            title,
            data,
            pdf,
        });
        Ok(doc)
    }

    fn drop_document(&mut self, doc: RawHandle) {
        self.count_release("document");
        let Obj::Document { title, data, .. } = self.remove(doc) else {
            panic!("{doc:#x} is not a document");
        };
        self.free_engine(title);
        self.free_engine(data);
    }

    fn count_pages(&mut self, doc: RawHandle) -> EngineResult<i32> {
        self.pending()?;
        match self.obj(doc) {
            Obj::Document { pages, .. } => Ok(pages.len() as i32),
            _ => Err(EngineError::generic("not a document")),
        }
    }

    fn load_page(&mut self, doc: RawHandle, index: i32) -> EngineResult<RawHandle> {
        self.pending()?;
        let (def, is_pdf) = match self.obj(doc) {
            Obj::Document { pages, pdf, .. } => (
                usize::try_from(index)
                    .ok()
                    .and_then(|i| pages.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        EngineError::generic(format!("invalid page number: {}", index + 1))
                    })?,
                *pdf,
            ),
            _ => return Err(EngineError::generic("not a document")),
        };
        let pdf = if is_pdf {
            let mut first_annot = 0;
            for annot in def.annots.iter().rev() {
                let kind = self.intern(&annot.kind);
                first_annot = self.insert(Obj::Annot {
                    rect: annot.rect,
                    kind,
                    next: first_annot,
                });
            }
            self.insert(Obj::PdfPage { first_annot })
        } else {
            0
        };
        Ok(self.insert(Obj::Page { def, pdf }))
    }

    fn document_title(&mut self, doc: RawHandle) -> EngineResult<Offset> {
        match self.obj(doc) {
            Obj::Document { title, .. } => Ok(*title),
            _ => Err(EngineError::generic("not a document")),
        }
    }

    fn load_outline(&mut self, doc: RawHandle) -> EngineResult<RawHandle> {
        self.pending()?;
        let outline = match self.obj(doc) {
            Obj::Document { outline, .. } => outline.clone(),
            _ => return Err(EngineError::generic("not a document")),
        };
        Ok(self.build_outline(&outline))
    }

    fn drop_page(&mut self, page: RawHandle) {
        self.count_release("page");
        let Obj::Page { pdf, .. } = self.remove(page) else {
            panic!("{page:#x} is not a page");
        };
        if pdf != 0 {
            let Obj::PdfPage { first_annot } = self.remove(pdf) else {
                panic!("{pdf:#x} is not a pdf page");
            };
            let mut annot = first_annot;
            while annot != 0 {
                let Obj::Annot { kind, next, .. } = self.remove(annot) else {
                    panic!("{annot:#x} is not an annotation");
                };
                self.free_engine(kind);
                annot = next;
            }
        }
    }

    fn bound_page(&mut self, page: RawHandle) -> EngineResult<Offset> {
        let def = self.page_def(page);
        let rect = [0.0, 0.0, def.width, def.height];
        Ok(self.write_record(&rect))
    }

    fn new_pixmap_from_page(
        &mut self,
        page: RawHandle,
        ctm: [f32; 6],
        colorspace: RawHandle,
        alpha: bool,
    ) -> EngineResult<RawHandle> {
        let components = match colorspace {
            GRAY => 1,
            RGB | BGR => 3,
            CMYK => 4,
            other => return Err(EngineError::generic(format!("unknown colorspace {other:#x}"))),
        };
        let def = self.page_def(page);
        let [a, b, c, d, e, f] = ctm;
        let corners = [(0.0, 0.0), (def.width, 0.0), (0.0, def.height), (def.width, def.height)];
        let xs = corners.map(|(x, y)| a * x + c * y + e);
        let ys = corners.map(|(x, y)| b * x + d * y + f);
        let bbox = [
            xs.iter().copied().fold(f32::INFINITY, f32::min).floor() as i32,
            ys.iter().copied().fold(f32::INFINITY, f32::min).floor() as i32,
            xs.iter().copied().fold(f32::NEG_INFINITY, f32::max).ceil() as i32,
            ys.iter().copied().fold(f32::NEG_INFINITY, f32::max).ceil() as i32,
        ];
        let n = components + i32::from(alpha);
        let stride = (bbox[2] - bbox[0]) * n;
        let size = (stride * (bbox[3] - bbox[1])) as u32;
        let samples = self.alloc_engine(size);
        let at = samples as usize;
        self.memory[at..at + size as usize].fill(0xff);
        Ok(self.insert(Obj::Pixmap {
            bbox,
            stride,
            samples,
        }))
    }

    fn new_stext_page_from_page(&mut self, page: RawHandle) -> EngineResult<RawHandle> {
        let words = self.page_def(page).words.clone();
        Ok(self.insert(Obj::StextPage { words }))
    }

    fn load_links(&mut self, page: RawHandle) -> EngineResult<RawHandle> {
        self.pending()?;
        let links = self.page_def(page).links.clone();
        let mut head = 0;
        for link in links.iter().rev() {
            let uri = self.intern(&link.uri);
            head = self.insert(Obj::Link {
                rect: link.rect,
                uri,
                next: head,
            });
        }
        Ok(head)
    }

    fn search_page(
        &mut self,
        page: RawHandle,
        needle: Offset,
        hits: Offset,
        max_hits: i32,
    ) -> EngineResult<i32> {
        self.pending()?;
        let needle = self.cstr(needle).to_lowercase();
        if needle.is_empty() {
            return Ok(0);
        }
        let rects: Vec<[f32; 4]> = self
            .page_def(page)
            .words
            .iter()
            .filter(|w| w.text.to_lowercase().contains(&needle))
            .map(|w| w.rect)
            .take(max_hits.max(0) as usize)
            .collect();
        for (i, [x0, y0, x1, y1]) in rects.iter().copied().enumerate() {
            self.write_f32s(hits + 32 * i as u32, &[x0, y0, x1, y0, x0, y1, x1, y1]);
        }
        Ok(rects.len() as i32)
    }

    fn pdf_page_from_fz_page(&mut self, page: RawHandle) -> RawHandle {
        match self.obj(page) {
            Obj::Page { pdf, .. } => *pdf,
            _ => 0,
        }
    }

    fn pdf_first_annot(&mut self, pdf_page: RawHandle) -> RawHandle {
        match self.obj(pdf_page) {
            Obj::PdfPage { first_annot } => *first_annot,
            _ => panic!("{pdf_page:#x} is not a pdf page"),
        }
    }

    fn pdf_next_annot(&mut self, annot: RawHandle) -> RawHandle {
        match self.obj(annot) {
            Obj::Annot { next, .. } => *next,
            _ => panic!("{annot:#x} is not an annotation"),
        }
    }

    fn pdf_bound_annot(&mut self, annot: RawHandle) -> EngineResult<Offset> {
        let rect = match self.obj(annot) {
            Obj::Annot { rect, .. } => *rect,
            _ => return Err(EngineError::generic("not an annotation")),
        };
        Ok(self.write_record(&rect))
    }

    fn pdf_annot_type_string(&mut self, annot: RawHandle) -> EngineResult<Offset> {
        match self.obj(annot) {
            Obj::Annot { kind, .. } => Ok(*kind),
            _ => Err(EngineError::generic("not an annotation")),
        }
    }

    fn next_link(&mut self, link: RawHandle) -> RawHandle {
        match self.obj(link) {
            Obj::Link { next, .. } => *next,
            _ => panic!("{link:#x} is not a link"),
        }
    }

    fn drop_link(&mut self, link: RawHandle) {
        self.count_release("link");
        let mut current = link;
        while current != 0 {
            let Obj::Link { uri, next, .. } = self.remove(current) else {
                panic!("{current:#x} is not a link");
            };
            self.free_engine(uri);
            current = next;
        }
    }

    fn link_rect(&mut self, link: RawHandle) -> Offset {
        let rect = match self.obj(link) {
            Obj::Link { rect, .. } => *rect,
            _ => panic!("{link:#x} is not a link"),
        };
        self.write_record(&rect)
    }

    fn is_external_link(&mut self, link: RawHandle) -> bool {
        let uri = match self.obj(link) {
            Obj::Link { uri, .. } => *uri,
            _ => panic!("{link:#x} is not a link"),
        };
        is_external(&self.cstr(uri))
    }

    fn link_uri(&mut self, link: RawHandle) -> Offset {
        match self.obj(link) {
            Obj::Link { uri, .. } => *uri,
            _ => panic!("{link:#x} is not a link"),
        }
    }

    fn resolve_link_chapter(&mut self, doc: RawHandle, uri: Offset) -> EngineResult<i32> {
        self.obj(doc);
        Ok(page_target(&self.cstr(uri)).map_or(-1, |_| 0))
    }

    fn resolve_link_page(&mut self, doc: RawHandle, uri: Offset) -> EngineResult<i32> {
        let count = match self.obj(doc) {
            Obj::Document { pages, .. } => pages.len() as i32,
            _ => return Err(EngineError::generic("not a document")),
        };
        Ok(page_target(&self.cstr(uri))
            .filter(|p| (0..count).contains(p))
            .unwrap_or(-1))
    }

    fn outline_page(&mut self, doc: RawHandle, outline: RawHandle) -> EngineResult<i32> {
        self.obj(doc);
        match self.obj(outline) {
            Obj::Outline { page, .. } => Ok(*page),
            _ => Err(EngineError::generic("not an outline node")),
        }
    }

    fn outline_title(&mut self, outline: RawHandle) -> Offset {
        match self.obj(outline) {
            Obj::Outline { title, .. } => *title,
            _ => panic!("{outline:#x} is not an outline node"),
        }
    }

    fn outline_down(&mut self, outline: RawHandle) -> RawHandle {
        match self.obj(outline) {
            Obj::Outline { down, .. } => *down,
            _ => panic!("{outline:#x} is not an outline node"),
        }
    }

    fn outline_next(&mut self, outline: RawHandle) -> RawHandle {
        match self.obj(outline) {
            Obj::Outline { next, .. } => *next,
            _ => panic!("{outline:#x} is not an outline node"),
        }
    }

    fn drop_outline(&mut self, outline: RawHandle) {
        self.count_release("outline");
        self.free_outline(outline);
    }

    fn drop_pixmap(&mut self, pixmap: RawHandle) {
        self.count_release("pixmap");
        let Obj::Pixmap { samples, .. } = self.remove(pixmap) else {
            panic!("{pixmap:#x} is not a pixmap");
        };
        self.free_engine(samples);
    }

    fn pixmap_bbox(&mut self, pixmap: RawHandle) -> Offset {
        let bbox = match self.obj(pixmap) {
            Obj::Pixmap { bbox, .. } => *bbox,
            _ => panic!("{pixmap:#x} is not a pixmap"),
        };
        for (i, v) in bbox.iter().enumerate() {
            let p = RECORD as usize + 4 * i;
            self.memory[p..p + 4].copy_from_slice(&v.to_le_bytes());
        }
        RECORD
    }

    fn pixmap_stride(&mut self, pixmap: RawHandle) -> i32 {
        match self.obj(pixmap) {
            Obj::Pixmap { stride, .. } => *stride,
            _ => panic!("{pixmap:#x} is not a pixmap"),
        }
    }

    fn pixmap_samples(&mut self, pixmap: RawHandle) -> Offset {
        match self.obj(pixmap) {
            Obj::Pixmap { samples, .. } => *samples,
            _ => panic!("{pixmap:#x} is not a pixmap"),
        }
    }

    fn new_buffer_from_pixmap_as_png(&mut self, pixmap: RawHandle) -> EngineResult<RawHandle> {
        let bbox = match self.obj(pixmap) {
            Obj::Pixmap { bbox, .. } => *bbox,
            _ => return Err(EngineError::generic("not a pixmap")),
        };
        let mut png = b"\x89PNG\r\n\x1a\n\0\0\0\x0dIHDR".to_vec();
        png.extend_from_slice(&((bbox[2] - bbox[0]) as u32).to_be_bytes());
        png.extend_from_slice(&((bbox[3] - bbox[1]) as u32).to_be_bytes());
        Ok(self.new_buffer_with(&png))
    }

    fn new_buffer(&mut self, capacity: u32) -> EngineResult<RawHandle> {
        let data = self.alloc_engine(capacity);
        Ok(self.insert(Obj::Buffer {
            data,
            len: 0,
            cap: capacity,
        }))
    }

    fn new_buffer_from_data(&mut self, data: Offset, len: u32) -> EngineResult<RawHandle> {
        let at = data as usize;
        let bytes = self.memory[at..at + len as usize].to_vec();
        Ok(self.new_buffer_with(&bytes))
    }

    fn drop_buffer(&mut self, buffer: RawHandle) {
        self.count_release("buffer");
        let Obj::Buffer { data, .. } = self.remove(buffer) else {
            panic!("{buffer:#x} is not a buffer");
        };
        self.free_engine(data);
    }

    fn buffer_data(&mut self, buffer: RawHandle) -> Offset {
        match self.obj(buffer) {
            Obj::Buffer { data, .. } => *data,
            _ => panic!("{buffer:#x} is not a buffer"),
        }
    }

    fn buffer_size(&mut self, buffer: RawHandle) -> u32 {
        match self.obj(buffer) {
            Obj::Buffer { len, .. } => *len,
            _ => panic!("{buffer:#x} is not a buffer"),
        }
    }

    fn buffer_capacity(&mut self, buffer: RawHandle) -> u32 {
        match self.obj(buffer) {
            Obj::Buffer { cap, .. } => *cap,
            _ => panic!("{buffer:#x} is not a buffer"),
        }
    }

    fn resize_buffer(&mut self, buffer: RawHandle, capacity: u32) -> EngineResult<()> {
        let (old, len) = match self.obj(buffer) {
            Obj::Buffer { data, len, .. } => (*data, *len),
            _ => return Err(EngineError::generic("not a buffer")),
        };
        let new = self.alloc_engine(capacity);
        let keep = len.min(capacity) as usize;
        self.memory
            .copy_within(old as usize..old as usize + keep, new as usize);
        self.free_engine(old);
        self.objects.insert(
            buffer,
            Obj::Buffer {
                data: new,
                len: keep as u32,
                cap: capacity,
            },
        );
        Ok(())
    }

    fn grow_buffer(&mut self, buffer: RawHandle) -> EngineResult<()> {
        let cap = self.buffer_capacity(buffer);
        self.resize_buffer(buffer, (cap * 3 / 2).max(16))
    }

    fn trim_buffer(&mut self, buffer: RawHandle) -> EngineResult<()> {
        let len = self.buffer_size(buffer);
        self.resize_buffer(buffer, len)
    }

    fn clear_buffer(&mut self, buffer: RawHandle) {
        if let Some(Obj::Buffer { len, .. }) = self.objects.get_mut(&buffer) {
            *len = 0;
        }
    }

    fn new_output_with_buffer(&mut self, buffer: RawHandle) -> EngineResult<RawHandle> {
        match self.obj(buffer) {
            Obj::Buffer { .. } => Ok(self.insert(Obj::Output {
                buffer,
                closed: false,
            })),
            _ => Err(EngineError::generic("not a buffer")),
        }
    }

    fn close_output(&mut self, output: RawHandle) -> EngineResult<()> {
        match self.objects.get_mut(&output) {
            Some(Obj::Output { closed, .. }) => {
                *closed = true;
                Ok(())
            }
            _ => Err(EngineError::generic("not an output")),
        }
    }

    fn drop_output(&mut self, output: RawHandle) {
        self.count_release("output");
        self.remove(output);
    }

    fn drop_stext_page(&mut self, stext: RawHandle) {
        self.count_release("stext");
        self.remove(stext);
    }

    fn print_stext_page_as_json(
        &mut self,
        output: RawHandle,
        stext: RawHandle,
        scale: f32,
    ) -> EngineResult<()> {
        let buffer = match self.obj(output) {
            Obj::Output { closed: true, .. } => {
                return Err(EngineError::generic("write to closed output"));
            }
            Obj::Output { buffer, .. } => *buffer,
            _ => return Err(EngineError::generic("not an output")),
        };
        let words = match self.obj(stext) {
            Obj::StextPage { words } => words.clone(),
            _ => return Err(EngineError::generic("not a structured text page")),
        };
        let bbox = |[x0, y0, x1, y1]: [f32; 4]| {
            json!({
                "x": x0 * scale,
                "y": y0 * scale,
                "w": (x1 - x0) * scale,
                "h": (y1 - y0) * scale,
            })
        };
        let blocks: Vec<_> = words
            .iter()
            .map(|w| {
                json!({
                    "type": "text",
                    "bbox": bbox(w.rect),
                    "lines": [{
                        "wmode": 0,
                        "bbox": bbox(w.rect),
                        "font": {
                            "name": "Times-Roman",
                            "family": "serif",
                            "weight": "normal",
                            "style": "normal",
                            "size": 12.0 * scale,
                        },
                        "x": w.rect[0] * scale,
                        "y": w.rect[3] * scale,
                        "text": w.text,
                    }],
                })
            })
            .collect();
        let bytes = serde_json::to_vec(&json!({ "blocks": blocks }))
            .map_err(|e| EngineError::generic(e.to_string()))?;
        self.append(buffer, &bytes)
    }
}

/// JSON bytes for a document of `pages` US-letter pages.
///
/// Every page carries the words "Lorem", "ipsum" and "page-N". Page 1 links to
/// page 3 and to an external site; PDF documents also get two annotations on
/// page 1.
pub(crate) fn sample_document(pages: usize) -> Vec<u8> {
    let pages: Vec<_> = (1..=pages)
        .map(|n| {
            let mut page = json!({
                "width": 612.0,
                "height": 792.0,
                "words": [
                    { "text": "Lorem", "rect": [72.0, 72.0, 110.0, 84.0] },
                    { "text": "ipsum", "rect": [114.0, 72.0, 150.0, 84.0] },
                    { "text": format!("page-{n}"), "rect": [72.0, 700.0, 120.0, 712.0] },
                ],
            });
            if n == 1 {
                page["links"] = json!([
                    { "rect": [72.0, 100.0, 200.0, 112.0], "uri": "#page=3" },
                    { "rect": [72.0, 120.0, 200.0, 132.0], "uri": "https://mupdf.com/" },
                ]);
                page["annots"] = json!([
                    { "type": "Highlight", "rect": [70.0, 70.0, 152.0, 86.0] },
                    { "type": "Text", "rect": [500.0, 40.0, 520.0, 60.0] },
                ]);
            }
            page
        })
        .collect();
    let doc = json!({
        "title": "Bridge Test Document",
        "pages": pages,
        "outline": [
            { "title": "Introduction", "page": 0, "children": [
                { "title": "Scope", "page": 1 },
                { "title": "Terms", "page": 2 },
            ]},
            { "title": "Appendix", "page": 9 },
        ],
    });
    serde_json::to_vec(&doc).expect("sample document serializes")
}
