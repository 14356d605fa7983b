//! Document outline (table of contents).
//!
//! The engine hands back the root of a first-child/next-sibling tree. The
//! caller owns the root only; releasing it drops every node.

use serde::Serialize;

use crate::document::Document;
use crate::engine::RawHandle;
use crate::error::Result;
use crate::handle::Owned;
use crate::lifecycle::Module;
use crate::traverse::{TreeNode, collect_tree};
use crate::util::read_opt_cstr;

/// A loaded outline tree.
#[derive(Debug)]
pub struct Outline {
    owned: Owned,
    roots: Vec<TreeNode>,
}

impl Outline {
    pub(crate) fn bind(module: &Module, root: RawHandle) -> Outline {
        let roots = collect_tree(
            root,
            &mut |node: RawHandle| module.call(|e| e.outline_down(node)),
            &mut |node: RawHandle| module.call(|e| e.outline_next(node)),
        );
        Outline {
            owned: Owned::bind(module, root, "outline", |e, h| e.drop_outline(h)),
            roots,
        }
    }

    /// Top-level entries, in document order.
    pub fn items(&self) -> Vec<OutlineItem<'_>> {
        self.owned.raw();
        self.roots
            .iter()
            .map(|node| OutlineItem { outline: self, node })
            .collect()
    }

    /// Snapshot the whole tree into plain host values.
    pub fn entries(&self, doc: &Document) -> Result<Vec<OutlineEntry>> {
        self.items().iter().map(|item| item.entry(doc)).collect()
    }

    /// Release the whole tree now.
    pub fn dispose(&mut self) {
        self.owned.dispose();
    }

    fn module(&self) -> &Module {
        self.owned.module()
    }
}

/// One node of an [`Outline`], valid while the outline is alive.
#[derive(Clone, Copy)]
pub struct OutlineItem<'a> {
    outline: &'a Outline,
    node: &'a TreeNode,
}

impl<'a> OutlineItem<'a> {
    pub fn title(&self) -> Result<Option<String>> {
        let raw = self.node.raw;
        let module = self.outline.module();
        let offset = module.call(|e| e.outline_title(raw));
        module.read(|mem| read_opt_cstr(mem, offset, "outline title"))
    }

    /// The 0-based target page in `doc`, or `None` if the entry has no target.
    pub fn page(&self, doc: &Document) -> Result<Option<usize>> {
        let raw = self.node.raw;
        let doc_raw = doc.raw();
        let page = self.outline.module().call(|e| e.outline_page(doc_raw, raw))?;
        Ok(usize::try_from(page).ok())
    }

    pub fn children(&self) -> Vec<OutlineItem<'a>> {
        let outline = self.outline;
        self.node
            .children
            .iter()
            .map(|node| OutlineItem { outline, node })
            .collect()
    }

    pub fn raw(&self) -> RawHandle {
        self.node.raw
    }

    fn entry(&self, doc: &Document) -> Result<OutlineEntry> {
        Ok(OutlineEntry {
            title: self.title()?.unwrap_or_default(),
            page: self.page(doc)?,
            children: self
                .children()
                .iter()
                .map(|child| child.entry(doc))
                .collect::<Result<_>>()?,
        })
    }
}

impl std::fmt::Debug for OutlineItem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineItem")
            .field("raw", &format_args!("{:#x}", self.node.raw))
            .field("children", &self.node.children.len())
            .finish()
    }
}

/// An outline entry copied out of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub title: String,
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineEntry>,
}
