//! Annotations on pages of paginated formats.

use crate::engine::RawHandle;
use crate::error::Result;
use crate::geometry::Rect;
use crate::lifecycle::Module;
use crate::util::read_cstr;

/// An annotation owned by its page. The bridge never releases it.
#[derive(Clone, Copy)]
pub struct Annotation<'a> {
    module: &'a Module,
    raw: RawHandle,
}

impl<'a> Annotation<'a> {
    pub(crate) fn new(module: &'a Module, raw: RawHandle) -> Self {
        Self { module, raw }
    }

    pub fn bounds(&self) -> Result<Rect> {
        let raw = self.raw;
        let offset = self.module.call(|e| e.pdf_bound_annot(raw))?;
        Ok(self.module.read(|mem| Rect::read(mem, offset)))
    }

    /// The annotation subtype name, e.g. `"Highlight"`.
    pub fn kind(&self) -> Result<String> {
        let raw = self.raw;
        let offset = self.module.call(|e| e.pdf_annot_type_string(raw))?;
        self.module.read(|mem| read_cstr(mem, offset, "annotation type"))
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }
}

impl std::fmt::Debug for Annotation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotation")
            .field("raw", &format_args!("{:#x}", self.raw))
            .finish()
    }
}
