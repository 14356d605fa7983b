//! Page links and their resolved targets.
//!
//! `load_links` hands back the head of a chain the caller owns; dropping the
//! head drops the whole chain. [`Links`] therefore owns exactly one handle and
//! every [`Link`] is a borrowed element of it.

use serde::Serialize;

use crate::document::Document;
use crate::engine::{Offset, RawHandle};
use crate::error::Result;
use crate::geometry::Rect;
use crate::handle::Owned;
use crate::lifecycle::Module;
use crate::page::Page;
use crate::traverse::collect_chain;
use crate::util::read_cstr;

/// A position inside a document: chapter and page index, both 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub chapter: usize,
    pub page: usize,
}

impl Location {
    /// Resolve the NUL-terminated URI at `uri` against `doc`.
    pub(crate) fn resolve(doc: &Document, uri: Offset) -> Result<Option<Location>> {
        let raw = doc.raw();
        let module = doc.module();
        let chapter = module.call(|e| e.resolve_link_chapter(raw, uri))?;
        let page = module.call(|e| e.resolve_link_page(raw, uri))?;
        if chapter < 0 || page < 0 {
            return Ok(None);
        }
        Ok(Some(Location {
            chapter: chapter as usize,
            page: page as usize,
        }))
    }

    /// The 1-based page number for [`Document::load_page`].
    pub fn page_number(&self) -> usize {
        self.page + 1
    }
}

/// The links of one page.
#[derive(Debug)]
pub struct Links {
    module: Module,
    head: Option<Owned>,
    items: Vec<RawHandle>,
}

impl Links {
    pub(crate) fn load(page: &Page) -> Result<Links> {
        let raw = page.raw();
        let module = page.module();
        let first = module.call(|e| e.load_links(raw))?;
        let items = collect_chain(first, |link| module.call(|e| e.next_link(link)));
        let head = (first != 0).then(|| Owned::bind(module, first, "link", |e, h| e.drop_link(h)));
        Ok(Links {
            module: module.clone(),
            head,
            items,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Link<'_>> {
        self.check_live();
        self.items.get(index).map(|&raw| Link { links: self, raw })
    }

    pub fn iter(&self) -> impl Iterator<Item = Link<'_>> {
        self.check_live();
        self.items.iter().map(move |&raw| Link { links: self, raw })
    }

    /// Release the whole chain now.
    pub fn dispose(&mut self) {
        if let Some(head) = self.head.as_mut() {
            head.dispose();
        }
    }

    fn check_live(&self) {
        if let Some(head) = &self.head {
            head.raw();
        }
    }
}

/// One link of a [`Links`] chain.
#[derive(Clone, Copy)]
pub struct Link<'a> {
    links: &'a Links,
    raw: RawHandle,
}

impl Link<'_> {
    pub fn bounds(&self) -> Rect {
        let raw = self.raw;
        let module = &self.links.module;
        let offset = module.call(|e| e.link_rect(raw));
        module.read(|mem| Rect::read(mem, offset))
    }

    pub fn is_external(&self) -> bool {
        let raw = self.raw;
        self.links.module.call(|e| e.is_external_link(raw))
    }

    pub fn uri(&self) -> Result<String> {
        let raw = self.raw;
        let module = &self.links.module;
        let offset = module.call(|e| e.link_uri(raw));
        module.read(|mem| read_cstr(mem, offset, "link uri"))
    }

    /// Resolve an internal link to its target location in `doc`.
    ///
    /// Returns `None` for external links and unresolvable targets.
    pub fn resolve(&self, doc: &Document) -> Result<Option<Location>> {
        let raw = self.raw;
        let uri = self.links.module.call(|e| e.link_uri(raw));
        Location::resolve(doc, uri)
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }
}

impl std::fmt::Debug for Link<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("raw", &format_args!("{:#x}", self.raw))
            .finish()
    }
}
